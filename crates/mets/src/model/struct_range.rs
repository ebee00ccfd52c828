use std::fmt;

use crate::mods::SectionMetadata;

/// One node of a manifestation's internal structure, mirroring the logical
/// div tree. Ranges carry the ids of the physical files they span rather
/// than the files themselves; the manifestation's sequence is the single
/// authority for file state.
#[derive(Debug, Clone)]
pub struct StructRange {
    pub id: Option<String>,
    pub label: String,
    pub range_type: Option<String>,
    pub physical_file_ids: Vec<String>,
    pub children: Vec<StructRange>,
    pub section_metadata: Option<SectionMetadata>,
}

impl fmt::Display for StructRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} TYPE={}",
            self.id.as_deref().unwrap_or("-"),
            self.label,
            self.range_type.as_deref().unwrap_or("-")
        )
    }
}
