use crate::model::{derive_label, Manifestation};
use crate::mods::SectionMetadata;
use crate::struct_div::LogicalStructDiv;
use crate::work_store::StoredFileInfo;
use crate::MetsResult;

/// An aggregate of manifestations: an anchor file for a multi-volume work,
/// a periodical, or a periodical volume. Unlike [`Manifestation`] there is
/// nothing lazy here; the repository fills the children in when it builds
/// the collection.
#[derive(Debug)]
pub struct Collection {
    pub id: Option<String>,
    pub label: String,
    pub collection_type: String,
    pub order: Option<i32>,
    pub section_metadata: Option<SectionMetadata>,
    pub source_file: StoredFileInfo,
    pub partial: bool,
    pub collections: Vec<Collection>,
    pub manifestations: Vec<Manifestation>,
}

impl Collection {
    pub fn new(div: &LogicalStructDiv) -> MetsResult<Collection> {
        let section_metadata = div.section_metadata()?.cloned();
        Ok(Collection {
            id: div.external_id.clone(),
            label: derive_label(div, section_metadata.as_ref()),
            collection_type: div.div_type.clone().unwrap_or_default(),
            order: div.order,
            section_metadata,
            source_file: div.store().file_info_for_path(&div.containing_file_path),
            partial: div.has_child_link(),
            collections: Vec::new(),
            manifestations: Vec::new(),
        })
    }
}
