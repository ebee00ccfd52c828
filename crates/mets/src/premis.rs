//! PREMIS technical metadata.
//!
//! Works with both arrangements we see in the wild: Goobi puts a `techMD`
//! with the right ID straight under the METS root sections, Archivematica
//! wraps `techMD` and `rightsMD` in an `amdSec` carrying the ID. Parsing is
//! lazy; nothing is read from the document until a capability is asked for.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use xmltree::Element;

use stacks_common::AccessCondition;

use crate::metadata::{parse_duration, AssetMetadata, MediaDimensions, RightsStatement};
use crate::pronom::PronomData;
use crate::xml::{ElementExt, FITS_NS, MEDIAINFO_NS, METS_NS, PREMIS_NS};
use crate::{MetsError, MetsResult};

const TRANSFER_PREFIX: &str = "%transferDirectory%objects/";
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug)]
struct Parsed {
    object: Option<Element>,
    rights: Option<Element>,
    significant_properties: HashMap<String, String>,
}

pub struct PremisMetadata {
    mets_root: Arc<Element>,
    adm_id: String,
    pronom: Arc<PronomData>,
    parsed: OnceCell<Parsed>,
    resolved: OnceCell<(String, MediaDimensions)>,
}

/// First descendant value matched on local name alone. Tool outputs from
/// Exiftool and friends are namespaced inconsistently between producers.
fn local_descendant_value(element: &Element, name: &str) -> Option<String> {
    element
        .descendants()
        .into_iter()
        .find(|e| e.name == name)
        .and_then(|e| e.text_value())
}

impl PremisMetadata {
    pub fn new(mets_root: Arc<Element>, adm_id: &str, pronom: Arc<PronomData>) -> PremisMetadata {
        PremisMetadata {
            mets_root,
            adm_id: adm_id.to_string(),
            pronom,
            parsed: OnceCell::new(),
            resolved: OnceCell::new(),
        }
    }

    fn parsed(&self) -> MetsResult<&Parsed> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let built = self.locate_sections()?;
        Ok(self.parsed.get_or_init(|| built))
    }

    fn locate_sections(&self) -> MetsResult<Parsed> {
        let mut rights_md: Option<&Element> = None;

        // Goobi layout first, as it is the more common.
        let goobi_tech_mds =
            self.mets_root
                .descendants_with_attr(METS_NS, "techMD", "ID", &self.adm_id);
        let tech_md = if let Some(tech_md) = goobi_tech_mds.first() {
            // There is no rightsMD in Goobi METS.
            *tech_md
        } else {
            let amd_sec = self.mets_root.single_descendant_with_attr(
                METS_NS,
                "amdSec",
                "ID",
                &self.adm_id,
            )?;
            rights_md = amd_sec.ns_child(METS_NS, "rightsMD");
            amd_sec
                .ns_child(METS_NS, "techMD")
                .ok_or_else(|| MetsError::ElementNotFound {
                    element: "techMD",
                    context: format!("amdSec ID={}", self.adm_id),
                })?
        };

        let object = tech_md
            .ns_descendants(METS_NS, "xmlData")
            .first()
            .and_then(|data| data.ns_child(PREMIS_NS, "object"))
            .cloned();

        let mut significant_properties = HashMap::new();
        if let Some(object) = &object {
            for prop in object.ns_children(PREMIS_NS, "significantProperties") {
                let prop_type = prop.descendant_value(PREMIS_NS, "significantPropertiesType");
                let prop_value = prop.descendant_value(PREMIS_NS, "significantPropertiesValue");
                if let (Some(t), Some(v)) = (prop_type, prop_value) {
                    significant_properties.insert(t, v);
                }
            }
        }

        let rights = rights_md
            .and_then(|md| md.ns_descendants(METS_NS, "xmlData").first().cloned())
            .and_then(|data| data.ns_child(PREMIS_NS, "rightsStatement"))
            .cloned();

        Ok(Parsed {
            object,
            rights,
            significant_properties,
        })
    }

    fn object(&self) -> MetsResult<&Element> {
        self.parsed()?
            .object
            .as_ref()
            .ok_or_else(|| MetsError::ElementNotFound {
                element: "premis:object",
                context: format!("ID={}", self.adm_id),
            })
    }

    fn significant_property(&self, name: &str) -> MetsResult<Option<String>> {
        Ok(self.parsed()?.significant_properties.get(name).cloned())
    }

    /// Some producers write floating point values for integer properties.
    fn int_property(&self, name: &str) -> MetsResult<Option<i32>> {
        Ok(self
            .significant_property(name)?
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|v| v as i32))
    }

    fn resolved(&self) -> MetsResult<&(String, MediaDimensions)> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }
        let built = self.resolve_mime_and_dimensions()?;
        Ok(self.resolved.get_or_init(|| built))
    }

    fn resolve_mime_and_dimensions(&self) -> MetsResult<(String, MediaDimensions)> {
        let pronom_key = self.pronom_key()?;
        let mut mime = pronom_key
            .as_deref()
            .and_then(|key| self.pronom.mime_type(key))
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        let mut dims = MediaDimensions::default();
        let mut process_tool_outputs = false;

        if mime.starts_with("image/") || mime.starts_with("video/") || mime == DEFAULT_MIME_TYPE {
            // The most common case, with the most common (Goobi) metadata.
            dims.width = self.int_property("ImageWidth")?;
            dims.height = self.int_property("ImageHeight")?;
            if dims.width.unwrap_or(0) <= 0 {
                process_tool_outputs = true;
            }
        }

        if mime.starts_with("video/") || mime.starts_with("audio/") || mime == DEFAULT_MIME_TYPE {
            match self.significant_property("Duration")? {
                Some(raw) => {
                    let parsed = parse_duration(&raw);
                    if parsed > 0.0 {
                        dims.duration_display = Some(raw);
                        dims.duration = Some(parsed);
                    }
                }
                None => process_tool_outputs = true,
            }
        }

        if process_tool_outputs {
            self.dimensions_from_tool_outputs(&mut dims)?;
        }

        self.refine_mime_type(pronom_key.as_deref(), &dims, &mut mime)?;
        Ok((mime, dims))
    }

    /// Archivematica keeps characterisation tool output (MediaInfo, FITS
    /// Exiftool) under `objectCharacteristicsExtension`.
    fn dimensions_from_tool_outputs(&self, dims: &mut MediaDimensions) -> MetsResult<()> {
        let object = self.object()?;
        let Some(extension) = object
            .ns_descendants(PREMIS_NS, "objectCharacteristicsExtension")
            .first()
            .copied()
        else {
            return Ok(());
        };

        for track in extension.ns_descendants(MEDIAINFO_NS, "track") {
            match track.attr("type") {
                Some("Image") => self.track_width_height(track, dims),
                Some("Video") => {
                    self.track_width_height(track, dims);
                    self.track_duration(track, dims);
                }
                Some("Audio") => self.track_duration(track, dims),
                _ => {}
            }
        }

        let exif_output = extension
            .descendants_with_attr(FITS_NS, "tool", "name", "Exiftool")
            .first()
            .copied();
        if let Some(exif) = exif_output {
            // Different media types hold duration in different fields; take
            // the longest value found anywhere.
            let mut found: Vec<(String, f64)> = Vec::new();
            if let (Some(display), Some(duration)) = (&dims.duration_display, dims.duration) {
                if duration > 0.0 {
                    found.push((display.clone(), duration));
                }
            }
            for candidate in ["PlayDuration", "Duration", "LastTimeStamp"] {
                if let Some(raw) = local_descendant_value(exif, candidate) {
                    let parsed = parse_duration(&raw);
                    if parsed > 0.0 {
                        found.push((raw, parsed));
                    }
                }
            }
            if let Some((display, duration)) = found
                .into_iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
            {
                dims.duration_display = Some(display);
                dims.duration = Some(duration);
            }

            let width = local_descendant_value(exif, "ImageWidth");
            let height = local_descendant_value(exif, "ImageHeight");
            if let (Some(w), Some(h)) = (width, height) {
                if let Ok(parsed) = w.trim().parse() {
                    dims.width = Some(parsed);
                }
                if let Ok(parsed) = h.trim().parse() {
                    dims.height = Some(parsed);
                }
            }
        }
        Ok(())
    }

    fn track_width_height(&self, track: &Element, dims: &mut MediaDimensions) {
        if dims.width.unwrap_or(0) <= 0 {
            dims.width = track
                .descendant_value(MEDIAINFO_NS, "Width")
                .and_then(|v| v.trim().parse().ok());
        }
        if dims.height.unwrap_or(0) <= 0 {
            dims.height = track
                .descendant_value(MEDIAINFO_NS, "Height")
                .and_then(|v| v.trim().parse().ok());
        }
    }

    fn track_duration(&self, track: &Element, dims: &mut MediaDimensions) {
        if dims.duration.unwrap_or(0.0) <= 0.0 {
            if let Some(duration) = track
                .descendant_value(MEDIAINFO_NS, "Duration")
                .and_then(|v| v.trim().parse::<f64>().ok())
            {
                dims.duration_display = Some(format!("{duration}s"));
                dims.duration = Some(duration);
            }
        }
    }

    /// Some formats can be either audio or video, and the mime type picked
    /// from the PRONOM lookup may be wrong for this particular file.
    fn refine_mime_type(
        &self,
        pronom_key: Option<&str>,
        dims: &MediaDimensions,
        mime: &mut String,
    ) -> MetsResult<()> {
        match pronom_key {
            Some("fmt/199") => {
                // MP4 container with no picture is audio.
                if dims.width.unwrap_or(0) == 0 || dims.height.unwrap_or(0) == 0 {
                    *mime = "audio/mp4".to_string();
                }
            }
            Some("x-fmt/183") => {
                let size = self
                    .file_size()?
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .unwrap_or(0);
                // No length or suspiciously short; treat as a plain file.
                if size <= 512 {
                    *mime = DEFAULT_MIME_TYPE.to_string();
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl AssetMetadata for PremisMetadata {
    fn file_name(&self) -> MetsResult<Option<String>> {
        let object = self.object()?;
        // objectIdentifier of type "local" is how Goobi names the file.
        for oid in object.ns_children(PREMIS_NS, "objectIdentifier") {
            if oid.descendant_value(PREMIS_NS, "objectIdentifierType").as_deref() == Some("local") {
                return Ok(oid.descendant_value(PREMIS_NS, "objectIdentifierValue"));
            }
        }
        // Born-digital files have no local identifier; use the last segment
        // of the transfer path.
        let original = self.original_name()?;
        Ok(original
            .rsplit(['/', '\\'])
            .next()
            .map(|name| name.to_string()))
    }

    fn file_size(&self) -> MetsResult<Option<String>> {
        Ok(self.object()?.descendant_value(PREMIS_NS, "size"))
    }

    fn format_name(&self) -> MetsResult<Option<String>> {
        Ok(self.object()?.descendant_value(PREMIS_NS, "formatName"))
    }

    fn format_version(&self) -> MetsResult<Option<String>> {
        Ok(self.object()?.descendant_value(PREMIS_NS, "formatVersion"))
    }

    fn pronom_key(&self) -> MetsResult<Option<String>> {
        Ok(self
            .object()?
            .descendant_value(PREMIS_NS, "formatRegistryKey"))
    }

    fn asset_id(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("asset id"))
    }

    fn mime_type(&self) -> MetsResult<Option<String>> {
        Ok(Some(self.resolved()?.0.clone()))
    }

    fn image_width(&self) -> MetsResult<i32> {
        Ok(self.resolved()?.1.width.unwrap_or(0))
    }

    fn image_height(&self) -> MetsResult<i32> {
        Ok(self.resolved()?.1.height.unwrap_or(0))
    }

    fn duration(&self) -> MetsResult<f64> {
        Ok(self.resolved()?.1.duration.unwrap_or(0.0))
    }

    fn display_duration(&self) -> MetsResult<Option<String>> {
        Ok(self.resolved()?.1.duration_display.clone())
    }

    fn number_of_pages(&self) -> MetsResult<i32> {
        Ok(self.int_property("PageNumber")?.unwrap_or(0))
    }

    fn rights_statement(&self) -> MetsResult<RightsStatement> {
        let Some(rights) = self.parsed()?.rights.as_ref() else {
            // Goobi METS carries no rightsMD. Interim pseudo-statement so
            // downstream code has something uniform to look at.
            return Ok(RightsStatement {
                identifier: Some("no-rights".to_string()),
                basis: "No Rights Statement".to_string(),
                access_condition: "Missing".to_string(),
                statement: Some("No Rights".to_string()),
                status: None,
            });
        };

        let raw_condition = rights
            .descendant_value(PREMIS_NS, "rightsGrantedNote")
            .unwrap_or_default();
        let access_condition = match AccessCondition::parse(&raw_condition) {
            Some(condition) => condition.as_str().to_string(),
            None => "Unknown".to_string(),
        };
        let identifier = rights
            .descendant_value(PREMIS_NS, "rightsStatementIdentifierValue")
            .or_else(|| rights.descendant_value(PREMIS_NS, "rightsStatementIdentifier"));
        let basis = rights
            .descendant_value(PREMIS_NS, "rightsBasis")
            .unwrap_or_default();

        let (statement, status) = match basis.as_str() {
            "License" => (rights.descendant_value(PREMIS_NS, "licenseNote"), None),
            "Copyright" => (
                rights.descendant_value(PREMIS_NS, "copyrightNote"),
                rights.descendant_value(PREMIS_NS, "copyrightStatus"),
            ),
            other => {
                return Err(MetsError::InvalidValue {
                    what: "rights basis",
                    value: other.to_string(),
                })
            }
        };

        Ok(RightsStatement {
            identifier,
            basis,
            access_condition,
            statement,
            status,
        })
    }

    fn created_date(&self) -> MetsResult<Option<DateTime<Utc>>> {
        let raw = self
            .object()?
            .descendant_value(PREMIS_NS, "dateCreatedByApplication");
        let Some(raw) = raw else {
            return Ok(None);
        };
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(parsed.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, format) {
                return Ok(Some(naive.and_utc()));
            }
        }
        if let Ok(date) = chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            if let Some(start) = date.and_hms_opt(0, 0, 0) {
                return Ok(Some(start.and_utc()));
            }
        }
        Ok(None)
    }

    fn original_name(&self) -> MetsResult<String> {
        let value = self
            .object()?
            .descendant_value(PREMIS_NS, "originalName")
            .unwrap_or_default();
        match value.find(TRANSFER_PREFIX) {
            Some(pos) => {
                let stripped = &value[pos + TRANSFER_PREFIX.len()..];
                if stripped.is_empty() {
                    Err(MetsError::InvalidValue {
                        what: "premis originalName",
                        value,
                    })
                } else {
                    Ok(stripped.to_string())
                }
            }
            None => Err(MetsError::InvalidValue {
                what: "premis originalName (missing transfer prefix)",
                value,
            }),
        }
    }
}
