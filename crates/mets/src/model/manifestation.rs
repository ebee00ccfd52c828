use std::cell::OnceCell;
use std::collections::HashMap;

use stacks_common::{AccessCondition, LicenseOptions, PackageId, PlayerOptions};

use crate::ignore::IgnoreAssetFilter;
use crate::model::{derive_label, StructRange};
use crate::mods::SectionMetadata;
use crate::physical_file::{FileUse, PhysicalFile, StoredFile};
use crate::struct_div::{LogicalStructDiv, PERIODICAL_ISSUE};
use crate::work_store::StoredFileInfo;
use crate::{MetsError, MetsResult};

/// A deliverable work: the bridge between the METS structure and manifest
/// building. Wraps a manifestation-typed logical div and derives, on first
/// use, everything a manifest needs from its physical sequence.
pub struct Manifestation {
    div: LogicalStructDiv,
    pub id: PackageId,
    pub label: String,
    pub manifestation_type: String,
    pub order: Option<i32>,
    pub section_metadata: Option<SectionMetadata>,
    /// Section metadata of the containing volume, present for periodical
    /// issues constructed in their volume's context.
    pub parent_section_metadata: Option<SectionMetadata>,
    pub source_file: StoredFileInfo,
    /// A partial manifestation stands in for one described in a linked
    /// METS file; it has identity and labels but no sequence.
    pub partial: bool,
    bundle: OnceCell<Bundle>,
}

/// Everything derived from the physical sequence in one pass.
#[derive(Default)]
struct Bundle {
    sequence: Vec<PhysicalFile>,
    sequence_index_by_id: HashMap<String, usize>,
    poster_image: Option<StoredFile>,
    root_struct_range: Option<StructRange>,
    synchronisable_files: Vec<StoredFile>,
    ignored_storage_identifiers: Vec<String>,
    first_internet_type: Option<String>,
}

impl Manifestation {
    pub fn new(
        div: LogicalStructDiv,
        parent: Option<&LogicalStructDiv>,
    ) -> MetsResult<Manifestation> {
        let external_id = div.external_id.clone().ok_or_else(|| {
            MetsError::UnknownIdentifier(format!(
                "manifestation div {} has no external identifier",
                div.id.as_deref().unwrap_or("?")
            ))
        })?;
        let section_metadata = div.section_metadata()?.cloned();
        let parent_section_metadata = match parent {
            Some(parent_div) => parent_div.section_metadata()?.cloned(),
            None => None,
        };
        let label = derive_label(&div, section_metadata.as_ref());
        let manifestation_type = div.div_type.clone().unwrap_or_default();
        let order = div.order;
        let partial = div.has_child_link();
        let source_file = div.store().file_info_for_path(&div.containing_file_path);

        Ok(Manifestation {
            id: PackageId::new(external_id),
            label,
            manifestation_type,
            order,
            section_metadata,
            parent_section_metadata,
            source_file,
            partial,
            bundle: OnceCell::new(),
            div,
        })
    }

    /// The physical files of this manifestation in delivery order. Empty
    /// for a partial manifestation.
    pub fn sequence(&self) -> MetsResult<&[PhysicalFile]> {
        Ok(&self.bundle()?.sequence)
    }

    pub fn physical_file(&self, id: &str) -> MetsResult<Option<&PhysicalFile>> {
        let bundle = self.bundle()?;
        Ok(bundle
            .sequence_index_by_id
            .get(id)
            .map(|&index| &bundle.sequence[index]))
    }

    /// The sequence minus whatever the ignore policy excludes for this
    /// manifestation type, such as the poster image inside a video
    /// sequence. This is what canvases are built from.
    pub fn significant_sequence(
        &self,
        filter: &dyn IgnoreAssetFilter,
    ) -> MetsResult<Vec<&PhysicalFile>> {
        let sequence = self.sequence()?;
        let ignored =
            filter.storage_identifiers_to_ignore(&self.manifestation_type, sequence);
        Ok(sequence
            .iter()
            .filter(|file| !ignored.contains(&file.storage_identifier))
            .collect())
    }

    pub fn poster_image(&self) -> MetsResult<Option<&StoredFile>> {
        Ok(self.bundle()?.poster_image.as_ref())
    }

    pub fn root_struct_range(&self) -> MetsResult<Option<&StructRange>> {
        Ok(self.bundle()?.root_struct_range.as_ref())
    }

    /// Stored files that should be sent to the delivery platform. A
    /// physical file can carry several pointers but only the access copy
    /// and any transcript are deliverable.
    pub fn synchronisable_files(&self) -> MetsResult<&[StoredFile]> {
        Ok(&self.bundle()?.synchronisable_files)
    }

    /// Storage identifiers of side files (posters, ALTO, preservation
    /// masters) that must never reach the delivery platform.
    pub fn ignored_storage_identifiers(&self) -> MetsResult<&[String]> {
        Ok(&self.bundle()?.ignored_storage_identifiers)
    }

    /// The mime type of the first file in the sequence, lowercased; what
    /// the permitted-operations tables key asset behaviour on.
    pub fn first_internet_type(&self) -> MetsResult<Option<&str>> {
        Ok(self.bundle()?.first_internet_type.as_deref())
    }

    /// The operations a player may offer. A periodical issue defers to its
    /// volume's player options first; otherwise the section's own player
    /// options, then its legacy license code.
    pub fn permitted_operations(&self) -> MetsResult<Vec<&'static str>> {
        let asset_type = self
            .first_internet_type()?
            .unwrap_or_default()
            .to_string();

        if self.manifestation_type == PERIODICAL_ISSUE {
            if let Some(parent) = &self.parent_section_metadata {
                if parent.player_options > 0 {
                    return Ok(PlayerOptions::from_code(parent.player_options, &asset_type)
                        .permitted_operations());
                }
            }
        }
        if let Some(mods) = &self.section_metadata {
            if mods.player_options > 0 {
                return Ok(PlayerOptions::from_code(mods.player_options, &asset_type)
                    .permitted_operations());
            }
            if let Some(code) = mods
                .dz_license_code
                .as_deref()
                .filter(|code| !code.trim().is_empty())
            {
                return Ok(LicenseOptions::permitted_operations(
                    code,
                    &self.manifestation_type,
                    &asset_type,
                ));
            }
        }
        Ok(Vec::new())
    }

    fn bundle(&self) -> MetsResult<&Bundle> {
        if let Some(bundle) = self.bundle.get() {
            return Ok(bundle);
        }
        let built = self.build_bundle()?;
        Ok(self.bundle.get_or_init(|| built))
    }

    fn build_bundle(&self) -> MetsResult<Bundle> {
        if self.partial {
            return Ok(Bundle::default());
        }

        let mut sequence: Vec<PhysicalFile> = self.div.physical_files()?.to_vec();
        let poster_image = self.div.poster_image()?;
        let sequence_index_by_id: HashMap<String, usize> = sequence
            .iter()
            .enumerate()
            .map(|(index, file)| (file.id.clone(), index))
            .collect();

        let root_struct_range = Some(build_struct_range(
            &self.div,
            &sequence_index_by_id,
            &mut sequence,
        )?);

        let synchronisable_files: Vec<StoredFile> = sequence
            .iter()
            .flat_map(|file| file.files.iter())
            .filter(|stored| stored.use_role.is_synchronisable())
            .cloned()
            .collect();
        let ignored_storage_identifiers: Vec<String> = sequence
            .iter()
            .flat_map(|file| file.files.iter())
            .filter(|stored| {
                matches!(
                    stored.use_role,
                    FileUse::Poster | FileUse::Alto | FileUse::Preservation
                )
            })
            .map(|stored| stored.storage_identifier.clone())
            .collect();
        let first_internet_type = sequence
            .first()
            .and_then(|file| file.mime_type.as_deref())
            .map(|mime| mime.trim().to_lowercase());

        Ok(Bundle {
            sequence,
            sequence_index_by_id,
            poster_image,
            root_struct_range,
            synchronisable_files,
            ignored_storage_identifiers,
            first_internet_type,
        })
    }
}

/// Builds the range tree for a div while pushing each section's access
/// condition down onto the files it spans. A file reached by several
/// sections keeps the most restrictive condition.
fn build_struct_range(
    div: &LogicalStructDiv,
    index_by_id: &HashMap<String, usize>,
    sequence: &mut [PhysicalFile],
) -> MetsResult<StructRange> {
    let section_metadata = div.section_metadata()?.cloned();
    let physical_file_ids: Vec<String> = div
        .physical_files()?
        .iter()
        .map(|file| file.id.clone())
        .collect();

    if let Some(mods) = &section_metadata {
        for file_id in &physical_file_ids {
            if let Some(&index) = index_by_id.get(file_id) {
                let file = &mut sequence[index];
                file.access_condition = match file.access_condition {
                    None => Some(mods.access_condition),
                    Some(existing) => {
                        AccessCondition::most_secure([existing, mods.access_condition])
                    }
                };
                if file.dz_license_code.is_none() {
                    file.dz_license_code = mods.dz_license_code.clone();
                }
            }
        }
    }

    let mut children = Vec::new();
    for child in &div.children {
        children.push(build_struct_range(child, index_by_id, sequence)?);
    }

    Ok(StructRange {
        id: div.id.clone(),
        label: derive_label(div, section_metadata.as_ref()),
        range_type: div.div_type.clone(),
        physical_file_ids,
        children,
        section_metadata,
    })
}

impl std::fmt::Debug for Manifestation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manifestation")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("manifestation_type", &self.manifestation_type)
            .field("order", &self.order)
            .field("partial", &self.partial)
            .finish()
    }
}
