//! The logical structMap walker.
//!
//! A logical `div` is a section of a work: the whole monograph, a chapter,
//! a periodical volume or issue. The walker parses the div tree eagerly
//! (it is small) but loads section metadata and the physical file sequence
//! lazily, because aggregate operations over many works never need them.

use std::cell::OnceCell;
use std::sync::Arc;

use tracing::debug;
use xmltree::Element;

use crate::mods::SectionMetadata;
use crate::physical_file::{make_file_map, AssetFamily, FileUse, PhysicalFile, StoredFile};
use crate::work_store::WorkStore;
use crate::xml::{ElementExt, METS_NS, XLINK_NS};
use crate::MetsResult;

// Collections.
pub const MULTIPLE_MANIFESTATION: &str = "MultipleManifestation";
pub const PERIODICAL: &str = "Periodical";
pub const PERIODICAL_VOLUME: &str = "PeriodicalVolume";

// Manifestations, with caveats.
pub const PERIODICAL_ISSUE: &str = "PeriodicalIssue";
pub const ARCHIVE: &str = "Archive";
pub const MONOGRAPH: &str = "Monograph";
pub const MANUSCRIPT: &str = "Manuscript";
pub const VIDEO: &str = "Video";
pub const AUDIO: &str = "Audio";
pub const ARTWORK: &str = "Artwork";
pub const TRANSCRIPT: &str = "Transcript";
pub const MAP: &str = "Map";
pub const MULTIPLE_VOLUME: &str = "MultipleVolume";
pub const MULTIPLE_COPY: &str = "MultipleCopy";
pub const MULTIPLE_VOLUME_MULTIPLE_COPY: &str = "MultipleVolumeMultipleCopy";

const COLLECTION_TYPES: [&str; 3] = [MULTIPLE_MANIFESTATION, PERIODICAL, PERIODICAL_VOLUME];
const MANIFESTATION_TYPES: [&str; 12] = [
    MONOGRAPH,
    ARCHIVE,
    ARTWORK,
    MANUSCRIPT,
    PERIODICAL_ISSUE,
    VIDEO,
    TRANSCRIPT,
    MULTIPLE_VOLUME,
    MULTIPLE_COPY,
    MULTIPLE_VOLUME_MULTIPLE_COPY,
    AUDIO,
    MAP,
];

/// Orders arriving as six-digit run-sequence values ("167402") carry the
/// real order in their last two digits. Anything unparseable is treated as
/// no order at all.
fn sanitise_order(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.len() == 6 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed[4..].parse().ok();
    }
    match trimmed.parse() {
        Ok(order) => Some(order),
        Err(_) => {
            if !trimmed.is_empty() {
                debug!(value = %trimmed, "ignoring unparseable ORDER value");
            }
            None
        }
    }
}

pub struct LogicalStructDiv {
    mets_root: Arc<Element>,
    store: Arc<dyn WorkStore>,
    pub id: Option<String>,
    /// The identifier the outside world knows this section by. Set from
    /// the requested identifier at the root and corrected for children.
    pub external_id: Option<String>,
    pub adm_id: Option<String>,
    pub dmd_id: Option<String>,
    /// Path of a linked METS file named by an `mptr`, if any.
    pub relative_link_path: Option<String>,
    /// The link path without its .xml suffix; prefixes child identifiers.
    pub link_id: Option<String>,
    pub label: Option<String>,
    pub div_type: Option<String>,
    pub order: Option<i32>,
    pub children: Vec<LogicalStructDiv>,
    pub containing_file_path: String,
    section_metadata: OnceCell<Option<SectionMetadata>>,
    physical_files: OnceCell<Vec<PhysicalFile>>,
}

impl LogicalStructDiv {
    pub fn new(
        div: &Element,
        mets_root: Arc<Element>,
        containing_file_path: &str,
        external_id: Option<String>,
        store: Arc<dyn WorkStore>,
    ) -> MetsResult<LogicalStructDiv> {
        let mut link_id = None;
        let mut relative_link_path = None;
        if let Some(pointer) = div.ns_child(METS_NS, "mptr") {
            // Might be a pointer back to the anchor file if this is a
            // multiple manifestation.
            let path = pointer
                .required_ns_attr(XLINK_NS, "xlink", "href")?
                .to_string();
            link_id = Some(
                path.strip_suffix(".xml")
                    .unwrap_or(path.as_str())
                    .to_string(),
            );
            relative_link_path = Some(if path.ends_with(".xml") {
                path
            } else {
                format!("{path}.xml")
            });
        }

        let mut children = Vec::new();
        for child_div in div.ns_children(METS_NS, "div") {
            children.push(LogicalStructDiv::new(
                child_div,
                mets_root.clone(),
                containing_file_path,
                None,
                store.clone(),
            )?);
        }
        // Unordered children sort ahead of ordered ones.
        children.sort_by_key(|child| child.order);

        let mut this = LogicalStructDiv {
            mets_root,
            store,
            id: div.attr("ID").map(str::to_string),
            external_id,
            adm_id: div.attr("ADMID").map(str::to_string),
            dmd_id: div.attr("DMDID").map(str::to_string),
            relative_link_path,
            link_id,
            label: div.attr("LABEL").map(str::to_string),
            div_type: div.attr("TYPE").map(str::to_string),
            order: div.attr("ORDER").and_then(sanitise_order),
            children,
            containing_file_path: containing_file_path.to_string(),
            section_metadata: OnceCell::new(),
            physical_files: OnceCell::new(),
        };
        this.correct_child_external_ids();
        Ok(this)
    }

    /// Children inherit or derive their external identifiers from the
    /// parent: a child linking out to another METS file is known by that
    /// link, a manifestation-like child shares the parent identifier, and
    /// periodical issues concatenate their LOG id onto it.
    fn correct_child_external_ids(&mut self) {
        let external = self.external_id.clone();
        for child in &mut self.children {
            if child.has_child_link() {
                child.external_id = child.link_id.clone();
            } else if child.is_manifestation() || child.type_is(PERIODICAL_VOLUME) {
                child.external_id = external.clone();
            }
            if child.type_is(PERIODICAL_VOLUME) {
                for issue in &mut child.children {
                    let issue_part = issue
                        .id
                        .as_deref()
                        .map(|id| id.strip_prefix("LOG").unwrap_or(id).to_string())
                        .unwrap_or_default();
                    issue.external_id =
                        Some(format!("{}{}", external.as_deref().unwrap_or(""), issue_part));
                }
            }
        }
    }

    pub fn type_is(&self, div_type: &str) -> bool {
        self.div_type.as_deref() == Some(div_type)
    }

    pub fn is_collection(&self) -> bool {
        self.div_type
            .as_deref()
            .is_some_and(|t| COLLECTION_TYPES.contains(&t))
    }

    pub fn is_manifestation(&self) -> bool {
        self.div_type
            .as_deref()
            .is_some_and(|t| MANIFESTATION_TYPES.contains(&t))
    }

    /// Whether the `mptr` points onward to a child manifestation file
    /// rather than back at an anchor. The underscore test on the file name
    /// wants a better rule.
    pub fn has_child_link(&self) -> bool {
        let Some(path) = self.relative_link_path.as_deref() else {
            return false;
        };
        let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        file_name.contains('_')
    }

    pub fn store(&self) -> &Arc<dyn WorkStore> {
        &self.store
    }

    /// Section metadata from the dmdSec this div names, if it names one.
    /// Periodical sections with no license code default to CC-BY-NC.
    pub fn section_metadata(&self) -> MetsResult<Option<&SectionMetadata>> {
        if self.section_metadata.get().is_none() {
            let loaded = match self.dmd_id.as_deref() {
                Some(dmd_id) => {
                    let dmd_sec = self.mets_root.single_descendant_with_attr(
                        METS_NS, "dmdSec", "ID", dmd_id,
                    )?;
                    let mut metadata = SectionMetadata::from_dmd_sec(dmd_sec)?;
                    if metadata.dz_license_code.is_none()
                        && self
                            .div_type
                            .as_deref()
                            .is_some_and(|t| t.starts_with("Periodical"))
                    {
                        metadata.dz_license_code = Some("CC-BY-NC".to_string());
                    }
                    Some(metadata)
                }
                None => None,
            };
            let _ = self.section_metadata.set(loaded);
        }
        Ok(self
            .section_metadata
            .get()
            .and_then(Option::as_ref))
    }

    /// The physical files this div links to, via structLink edges for
    /// digitised works and directly from the physical structMap for
    /// born-digital packages.
    pub fn physical_files(&self) -> MetsResult<&[PhysicalFile]> {
        if self.physical_files.get().is_none() {
            let built = self.build_physical_files()?;
            let _ = self.physical_files.set(built);
        }
        Ok(self.physical_files.get().map(Vec::as_slice).unwrap_or(&[]))
    }

    fn build_physical_files(&self) -> MetsResult<Vec<PhysicalFile>> {
        let phys_sequence = self
            .mets_root
            .single_descendant_with_attr(METS_NS, "structMap", "TYPE", "PHYSICAL")?
            .single_descendant_with_attr(METS_NS, "div", "TYPE", "physSequence")?;

        let mut files = match self.mets_root.ns_child(METS_NS, "structLink") {
            Some(struct_link) => {
                let file_map = make_file_map(&self.mets_root)?;
                let own_id = self.id.as_deref().unwrap_or("");
                let mut files = Vec::new();
                for sm_link in struct_link.ns_children(METS_NS, "smLink") {
                    if sm_link.ns_attr(XLINK_NS, "xlink", "from") != Some(own_id) {
                        continue;
                    }
                    let to = sm_link.required_ns_attr(XLINK_NS, "xlink", "to")?;
                    let phys_div =
                        phys_sequence.single_descendant_with_attr(METS_NS, "div", "ID", to)?;
                    files.push(PhysicalFile::from_digitised(
                        phys_div,
                        &file_map,
                        &self.mets_root,
                        self.store.as_ref(),
                    )?);
                }
                files
            }
            None => {
                // Born-digital packages have no structLink; every item of
                // the physical sequence belongs to the single div.
                let mut files = Vec::new();
                for item_div in phys_sequence.ns_descendants(METS_NS, "div") {
                    if item_div.attr("TYPE") == Some("Item") {
                        files.push(PhysicalFile::from_born_digital(
                            item_div,
                            &self.mets_root,
                            self.store.as_ref(),
                        )?);
                    }
                }
                files
            }
        };

        files.sort_by_key(|file| file.order);
        for (index, file) in files.iter_mut().enumerate() {
            file.index = index;
        }
        Ok(files)
    }

    /// The poster image, looked for in the order the workflows introduced
    /// them: a legacy bagger poster section, then an image inside a video
    /// sequence, then a proper POSTER file pointer.
    pub fn poster_image(&self) -> MetsResult<Option<StoredFile>> {
        const POSTER_ADM_ID: &str = "AMD_POSTER";
        let poster_tech_mds =
            self.mets_root
                .descendants_with_attr(METS_NS, "techMD", "ID", POSTER_ADM_ID);
        if !poster_tech_mds.is_empty() {
            let metadata = self
                .store
                .make_asset_metadata(self.mets_root.clone(), POSTER_ADM_ID);
            let file_name = metadata.file_name()?.unwrap_or_default();
            // No physical file element tells us where this actually lives.
            return Ok(Some(StoredFile {
                id: POSTER_ADM_ID.to_string(),
                use_role: FileUse::Poster,
                physical_file_id: String::new(),
                asset_metadata: Some(metadata),
                storage_identifier: String::new(),
                mime_type: None,
                relative_path: Some(format!("posters/{file_name}")),
                family: AssetFamily::Image,
            }));
        }

        let files = self.physical_files()?;

        if self.type_is(VIDEO) {
            let an_image = files.iter().find(|pf| {
                pf.mime_type
                    .as_deref()
                    .is_some_and(|m| m.starts_with("image"))
            });
            if let Some(image) = an_image {
                return Ok(Some(StoredFile {
                    id: image.id.clone(),
                    use_role: FileUse::Poster,
                    physical_file_id: image.id.clone(),
                    asset_metadata: image.asset_metadata.clone(),
                    storage_identifier: image.storage_identifier.clone(),
                    mime_type: image.mime_type.clone(),
                    relative_path: image.relative_path.clone(),
                    family: image.family,
                }));
            }
        }

        Ok(files.first().and_then(|first| {
            first
                .files
                .iter()
                .find(|f| f.use_role == FileUse::Poster)
                .cloned()
        }))
    }
}

impl std::fmt::Debug for LogicalStructDiv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalStructDiv")
            .field("id", &self.id)
            .field("external_id", &self.external_id)
            .field("div_type", &self.div_type)
            .field("label", &self.label)
            .field("order", &self.order)
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_digit_orders_keep_their_last_two_digits() {
        assert_eq!(sanitise_order("167402"), Some(2));
        assert_eq!(sanitise_order("167415"), Some(15));
    }

    #[test]
    fn ordinary_orders_parse_as_integers() {
        assert_eq!(sanitise_order("12"), Some(12));
        assert_eq!(sanitise_order("0"), Some(0));
        assert_eq!(sanitise_order("1674021"), Some(1674021));
    }

    #[test]
    fn junk_orders_are_treated_as_absent() {
        assert_eq!(sanitise_order("volume two"), None);
        assert_eq!(sanitise_order(""), None);
    }
}
