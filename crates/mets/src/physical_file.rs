//! Physical files and their delivery variants.
//!
//! A physical file is one node of the physical structMap: a page image, a
//! video, a PDF. Each node points at one or more stored files playing
//! different roles (the access copy, a preservation master, ALTO text, a
//! poster image, a transcript). Whichever pointer is not one of the special
//! side roles is promoted to the node's canonical file.

use std::collections::HashMap;
use std::sync::Arc;

use xmltree::Element;

use stacks_common::AccessCondition;

use crate::metadata::AssetMetadata;
use crate::work_store::WorkStore;
use crate::xml::{ElementExt, METS_NS, XLINK_NS};
use crate::{MetsError, MetsResult};

/// How a delivery platform treats an asset, derived from its mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFamily {
    Image,
    TimeBased,
    File,
}

impl AssetFamily {
    pub fn from_mime_type(mime_type: &str) -> AssetFamily {
        if mime_type.starts_with("image/") {
            AssetFamily::Image
        } else if mime_type.starts_with("video/") || mime_type.starts_with("audio/") {
            AssetFamily::TimeBased
        } else {
            AssetFamily::File
        }
    }
}

/// The role a stored file plays for its physical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileUse {
    /// The deliverable copy. `OBJECTS` is the older workflows' spelling.
    Access,
    Alto,
    Poster,
    Preservation,
    Transcript,
    /// An unrecognised USE value; treated as the access copy when promoting
    /// a canonical file, but never synchronised.
    Other(String),
}

impl FileUse {
    pub fn parse(raw: &str) -> FileUse {
        match raw {
            "ACCESS" | "OBJECTS" => FileUse::Access,
            "ALTO" => FileUse::Alto,
            "POSTER" => FileUse::Poster,
            "PRESERVATION" => FileUse::Preservation,
            "TRANSCRIPT" => FileUse::Transcript,
            other => FileUse::Other(other.to_string()),
        }
    }

    pub fn is_synchronisable(&self) -> bool {
        matches!(self, FileUse::Access | FileUse::Transcript)
    }
}

/// One pointer from a physical file to an actual stored file.
#[derive(Clone)]
pub struct StoredFile {
    pub id: String,
    pub use_role: FileUse,
    /// Index reference back to the owning [`PhysicalFile`].
    pub physical_file_id: String,
    pub asset_metadata: Option<Arc<dyn AssetMetadata>>,
    pub storage_identifier: String,
    pub mime_type: Option<String>,
    pub relative_path: Option<String>,
    pub family: AssetFamily,
}

#[derive(Clone)]
pub struct PhysicalFile {
    pub id: String,
    pub file_type: Option<String>,
    pub order: Option<i32>,
    /// Position in the manifestation sequence, assigned after sorting.
    pub index: usize,
    pub order_label: Option<String>,
    pub storage_identifier: String,
    pub mime_type: Option<String>,
    pub asset_metadata: Option<Arc<dyn AssetMetadata>>,
    /// Propagated down from section metadata, most restrictive wins.
    pub access_condition: Option<AccessCondition>,
    pub dz_license_code: Option<String>,
    pub files: Vec<StoredFile>,
    pub relative_path: Option<String>,
    pub relative_alto_path: Option<String>,
    pub relative_poster_path: Option<String>,
    pub relative_transcript_path: Option<String>,
    pub relative_master_path: Option<String>,
    pub family: AssetFamily,
}

/// Storage identifier and mime type used for born-digital files until the
/// forthcoming metadata source supplies real values. A documented gap, not
/// a bug to silently fix.
pub const BORN_DIGITAL_PLACEHOLDER: &str = "born-digital-placeholder";

/// A mets:file element along with the USE of its owning fileGrp.
pub type FileMap<'a> = HashMap<String, (String, &'a Element)>;

/// Gathers all `mets:file` elements keyed by ID, remembering each group's
/// USE, to avoid repeated traversal.
pub fn make_file_map(mets_root: &Element) -> MetsResult<FileMap<'_>> {
    let file_sec =
        mets_root
            .ns_child(METS_NS, "fileSec")
            .ok_or_else(|| MetsError::ElementNotFound {
                element: "fileSec",
                context: "document root".to_string(),
            })?;
    let mut map = HashMap::new();
    for group in file_sec.ns_descendants(METS_NS, "fileGrp") {
        let group_use = group.required_attr("USE")?.to_string();
        for file in group.ns_descendants(METS_NS, "file") {
            let id = file.required_attr("ID")?.to_string();
            map.insert(id, (group_use.clone(), file));
        }
    }
    Ok(map)
}

/// Rewrites a package-relative path to the flat identifier the storage
/// platform uses. Idempotent: an already-prefixed identifier keeps its
/// prefix (compared case-insensitively).
fn safe_storage_identifier(full_path: &str, work_identifier: &str) -> String {
    const OBJECTS_PART: &str = "objects/";
    let storage = if let Some(stripped) = full_path.strip_prefix(OBJECTS_PART) {
        stripped.replace('/', "_")
    } else {
        let trimmed = full_path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
    };
    if storage
        .to_lowercase()
        .starts_with(&work_identifier.to_lowercase())
    {
        storage
    } else {
        format!("{work_identifier}_{storage}")
    }
}

impl PhysicalFile {
    /// Builds a physical file from a physical structMap `div` in a
    /// digitised METS document.
    pub fn from_digitised(
        phys_div: &Element,
        file_map: &FileMap<'_>,
        mets_root: &Arc<Element>,
        store: &dyn WorkStore,
    ) -> MetsResult<PhysicalFile> {
        let id = phys_div.required_attr("ID")?.to_string();

        // Technical metadata declared on the physical file element itself;
        // always the case before the newer AV workflow. AMDID is an
        // Intranda misspelling still in circulation.
        let div_adm = phys_div.attr("ADMID").or_else(|| phys_div.attr("AMDID"));
        let asset_metadata =
            div_adm.map(|adm_id| store.make_asset_metadata(mets_root.clone(), adm_id));

        let mut file = PhysicalFile {
            id: id.clone(),
            file_type: phys_div.attr("TYPE").map(str::to_string),
            order: phys_div.attr("ORDER").and_then(|o| o.trim().parse().ok()),
            index: 0,
            order_label: phys_div.attr("ORDERLABEL").map(str::to_string),
            storage_identifier: String::new(),
            mime_type: None,
            asset_metadata,
            access_condition: None,
            dz_license_code: None,
            files: Vec::new(),
            relative_path: None,
            relative_alto_path: None,
            relative_poster_path: None,
            relative_transcript_path: None,
            relative_master_path: None,
            family: AssetFamily::File,
        };

        for pointer in phys_div.ns_children(METS_NS, "fptr") {
            let file_id = pointer.required_attr("FILEID")?.to_string();
            let (group_use, file_element) =
                file_map
                    .get(&file_id)
                    .ok_or_else(|| MetsError::ElementNotFound {
                        element: "file",
                        context: format!("fptr FILEID={file_id}"),
                    })?;
            let use_role = FileUse::parse(group_use);

            let link_href = file_element
                .ns_child(METS_NS, "FLocat")
                .and_then(|locat| locat.ns_attr(XLINK_NS, "xlink", "href"))
                .filter(|href| !href.is_empty())
                .map(str::to_string);

            let file_metadata = file_element
                .attr("ADMID")
                .map(|adm_id| store.make_asset_metadata(mets_root.clone(), adm_id));

            let mime_type = file_element.attr("MIMETYPE").map(str::to_string);
            let family = mime_type
                .as_deref()
                .map(AssetFamily::from_mime_type)
                .unwrap_or(AssetFamily::File);
            let storage_identifier = link_href
                .as_deref()
                .map(|href| safe_storage_identifier(href, store.identifier()))
                .unwrap_or_default();

            let stored = StoredFile {
                id: file_id,
                use_role: use_role.clone(),
                physical_file_id: id.clone(),
                asset_metadata: file_metadata,
                storage_identifier,
                mime_type,
                relative_path: link_href.clone(),
                family,
            };

            match &use_role {
                FileUse::Alto => file.relative_alto_path = link_href,
                FileUse::Poster => file.relative_poster_path = link_href,
                FileUse::Preservation => file.relative_master_path = link_href,
                FileUse::Transcript => file.relative_transcript_path = link_href,
                FileUse::Access | FileUse::Other(_) => {
                    // The access copy is the source of the physical file's
                    // own properties. With several candidates the last one
                    // wins; current behaviour, not asserted correct.
                    if file.asset_metadata.is_none() {
                        file.asset_metadata = stored.asset_metadata.clone();
                    }
                    file.storage_identifier = stored.storage_identifier.clone();
                    file.mime_type = stored.mime_type.clone();
                    file.relative_path = stored.relative_path.clone();
                    file.family = stored.family;
                }
            }
            file.files.push(stored);
        }

        Ok(file)
    }

    /// Builds a born-digital physical file: a single stored file described
    /// by its PREMIS section, with placeholder storage details.
    pub fn from_born_digital(
        item_div: &Element,
        mets_root: &Arc<Element>,
        store: &dyn WorkStore,
    ) -> MetsResult<PhysicalFile> {
        let id = item_div.required_attr("ID")?.to_string();
        let adm_id = item_div.required_attr("ADMID")?;
        let metadata = store.make_asset_metadata(mets_root.clone(), adm_id);
        let relative_path = metadata.original_name().ok();

        let stored = StoredFile {
            id: format!("{id}-file"),
            use_role: FileUse::Access,
            physical_file_id: id.clone(),
            asset_metadata: Some(metadata.clone()),
            storage_identifier: BORN_DIGITAL_PLACEHOLDER.to_string(),
            mime_type: Some(BORN_DIGITAL_PLACEHOLDER.to_string()),
            relative_path: relative_path.clone(),
            family: AssetFamily::File,
        };

        Ok(PhysicalFile {
            id,
            file_type: item_div.attr("TYPE").map(str::to_string),
            order: item_div.attr("ORDER").and_then(|o| o.trim().parse().ok()),
            index: 0,
            order_label: item_div.attr("ORDERLABEL").map(str::to_string),
            storage_identifier: BORN_DIGITAL_PLACEHOLDER.to_string(),
            mime_type: stored.mime_type.clone(),
            asset_metadata: Some(metadata),
            access_condition: None,
            dz_license_code: None,
            files: vec![stored],
            relative_path,
            relative_alto_path: None,
            relative_poster_path: None,
            relative_transcript_path: None,
            relative_master_path: None,
            family: AssetFamily::File,
        })
    }

    pub fn has_alto(&self) -> bool {
        self.relative_alto_path.is_some()
    }
}

impl std::fmt::Debug for PhysicalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalFile")
            .field("id", &self.id)
            .field("storage_identifier", &self.storage_identifier)
            .field("order", &self.order)
            .field("order_label", &self.order_label)
            .field("mime_type", &self.mime_type)
            .field("access_condition", &self.access_condition)
            .field("files", &self.files.len())
            .finish()
    }
}

impl std::fmt::Debug for StoredFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredFile")
            .field("id", &self.id)
            .field("use_role", &self.use_role)
            .field("storage_identifier", &self.storage_identifier)
            .field("relative_path", &self.relative_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_identifier_strips_objects_prefix_and_flattens() {
        assert_eq!(
            safe_storage_identifier("objects/sub/foo.jpg", "b12345678"),
            "b12345678_sub_foo.jpg"
        );
    }

    #[test]
    fn storage_identifier_is_idempotent_case_insensitively() {
        assert_eq!(
            safe_storage_identifier("objects/B12345678_0001.jp2", "b12345678"),
            "B12345678_0001.jp2"
        );
    }

    #[test]
    fn non_objects_paths_use_the_simple_name() {
        assert_eq!(
            safe_storage_identifier("alto/b12345678_0001.xml", "b12345678"),
            "b12345678_0001.xml"
        );
    }

    #[test]
    fn use_role_parsing_folds_objects_into_access() {
        assert_eq!(FileUse::parse("OBJECTS"), FileUse::Access);
        assert_eq!(FileUse::parse("ACCESS"), FileUse::Access);
        assert_eq!(FileUse::parse("ALTO"), FileUse::Alto);
        assert_eq!(
            FileUse::parse("SOMETHING_NEW"),
            FileUse::Other("SOMETHING_NEW".to_string())
        );
    }

    #[test]
    fn synchronisable_roles() {
        assert!(FileUse::Access.is_synchronisable());
        assert!(FileUse::Transcript.is_synchronisable());
        assert!(!FileUse::Alto.is_synchronisable());
        assert!(!FileUse::Poster.is_synchronisable());
        assert!(!FileUse::Other("X".to_string()).is_synchronisable());
    }

    #[test]
    fn asset_family_from_mime() {
        assert_eq!(AssetFamily::from_mime_type("image/jp2"), AssetFamily::Image);
        assert_eq!(
            AssetFamily::from_mime_type("video/mp4"),
            AssetFamily::TimeBased
        );
        assert_eq!(
            AssetFamily::from_mime_type("audio/wav"),
            AssetFamily::TimeBased
        );
        assert_eq!(
            AssetFamily::from_mime_type("application/pdf"),
            AssetFamily::File
        );
    }
}
