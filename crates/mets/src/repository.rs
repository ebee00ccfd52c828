//! Resolving identifiers to METS resources.
//!
//! The identifier's form decides everything here: a plain package
//! identifier loads that package's own METS file, a volume identifier
//! loads the linked file an anchor points at, an issue identifier finds
//! one child of a periodical volume, and the legacy `/n` form counts its
//! way to the nth manifestation.

use std::sync::Arc;

use tracing::{debug, info};

use stacks_common::{IdentifierForm, PackageId};

use crate::model::{Collection, Manifestation, MetsResource};
use crate::struct_div::{LogicalStructDiv, PERIODICAL};
use crate::work_store::{WorkStore, WorkStoreFactory, XmlSource};
use crate::xml::{ElementExt, METS_NS};
use crate::{MetsError, MetsResult};

/// A manifestation along with where it sits in its package, as the batch
/// builder wants to see it.
#[derive(Debug)]
pub struct ManifestationInContext {
    pub manifestation: Manifestation,
    pub package_identifier: String,
    pub sequence_index: usize,
    pub volume_identifier: Option<String>,
    pub issue_identifier: Option<String>,
}

pub struct MetsRepository {
    factory: Arc<dyn WorkStoreFactory>,
}

impl MetsRepository {
    pub fn new(factory: Arc<dyn WorkStoreFactory>) -> MetsRepository {
        MetsRepository { factory }
    }

    /// Resolves an identifier to the collection or manifestation it names.
    pub async fn get(&self, identifier: &str) -> MetsResult<MetsResource> {
        debug!(identifier, "resolving METS resource");
        let id = PackageId::new(identifier);
        let store = self.factory.work_store(&id.package_identifier()).await?;
        match id.form() {
            IdentifierForm::BNumber | IdentifierForm::NonBNumber => {
                let struct_map = Self::file_struct_map(&id, store.clone()).await?;
                resource_from_struct_map(struct_map)
            }
            IdentifierForm::Volume => {
                // The package identifier's own file is the anchor; the
                // volume lives in the file the anchor links to.
                let struct_map = Self::linked_struct_map(identifier, store).await?;
                resource_from_struct_map(struct_map)
            }
            IdentifierForm::BNumberAndSequenceIndex => {
                self.resource_by_index(&id, id.sequence_index().max(0) as usize, store)
                    .await
            }
            IdentifierForm::Issue => {
                let volume_part = id.volume_part().ok_or_else(|| {
                    MetsError::UnknownIdentifier(identifier.to_string())
                })?;
                let mut volume = Self::linked_struct_map(&volume_part, store).await?;
                let position = volume
                    .children
                    .iter()
                    .position(|child| child.external_id.as_deref() == Some(identifier))
                    .ok_or_else(|| MetsError::UnknownIdentifier(identifier.to_string()))?;
                let issue = volume.children.remove(position);
                Ok(MetsResource::Manifestation(Box::new(Manifestation::new(
                    issue,
                    Some(&volume),
                )?)))
            }
        }
    }

    /// Every manifestation reachable from an identifier, each with its
    /// volume and issue context and a running sequence index. Periodical
    /// volumes are re-fetched in full, since the anchor only names them.
    pub async fn get_all_manifestations_in_context(
        &self,
        identifier: &str,
    ) -> MetsResult<Vec<ManifestationInContext>> {
        info!(identifier, "enumerating manifestations in context");
        let root = self.get(identifier).await?;
        let id = PackageId::new(identifier);
        let mut contexts = Vec::new();

        match root {
            MetsResource::Manifestation(manifestation) => {
                let (volume_identifier, issue_identifier) = match id.form() {
                    IdentifierForm::Volume => (Some(identifier.to_string()), None),
                    IdentifierForm::Issue => (id.volume_part(), Some(identifier.to_string())),
                    _ => (None, None),
                };
                let sequence_index = match id.form() {
                    IdentifierForm::Volume | IdentifierForm::Issue => {
                        self.find_sequence_index(identifier).await?.unwrap_or(0)
                    }
                    _ => 0,
                };
                contexts.push(ManifestationInContext {
                    manifestation: *manifestation,
                    package_identifier: id.package_identifier(),
                    sequence_index,
                    volume_identifier,
                    issue_identifier,
                });
            }
            MetsResource::Collection(collection) => {
                let mut sequence_index = 0;
                if collection.collection_type == PERIODICAL {
                    for partial_volume in &collection.collections {
                        let volume_id = partial_volume.id.clone().ok_or_else(|| {
                            MetsError::UnknownIdentifier(format!(
                                "periodical volume of {identifier} has no identifier"
                            ))
                        })?;
                        let volume = match self.get(&volume_id).await? {
                            MetsResource::Collection(volume) => volume,
                            MetsResource::Manifestation(_) => {
                                return Err(MetsError::UnknownIdentifier(volume_id));
                            }
                        };
                        for manifestation in volume.manifestations {
                            let issue_identifier = Some(manifestation.id.as_str().to_string());
                            contexts.push(ManifestationInContext {
                                manifestation,
                                package_identifier: id.package_identifier(),
                                sequence_index,
                                volume_identifier: Some(volume_id.clone()),
                                issue_identifier,
                            });
                            sequence_index += 1;
                        }
                    }
                } else {
                    for manifestation in collection.manifestations {
                        let volume_identifier = Some(manifestation.id.as_str().to_string());
                        contexts.push(ManifestationInContext {
                            manifestation,
                            package_identifier: id.package_identifier(),
                            sequence_index,
                            volume_identifier,
                            issue_identifier: None,
                        });
                        sequence_index += 1;
                    }
                }
            }
        }
        Ok(contexts)
    }

    /// Position of a volume within its package's anchor. `None` when the
    /// volume is not found; issues are no longer located this way.
    pub async fn find_sequence_index(&self, identifier: &str) -> MetsResult<Option<usize>> {
        let id = PackageId::new(identifier);
        match id.form() {
            IdentifierForm::BNumber | IdentifierForm::NonBNumber => Ok(Some(0)),
            IdentifierForm::Volume => {
                let anchor = self.get(&id.package_identifier()).await?;
                let Some(collection) = anchor.as_collection() else {
                    return Ok(None);
                };
                Ok(collection
                    .manifestations
                    .iter()
                    .position(|m| m.id.as_str() == identifier))
            }
            IdentifierForm::Issue => Ok(None),
            IdentifierForm::BNumberAndSequenceIndex => Err(MetsError::InvalidValue {
                what: "sequence lookup identifier",
                value: identifier.to_string(),
            }),
        }
    }

    /// The legacy `package/n` form: the nth manifestation, counting
    /// through linked volumes. Slow by construction for periodicals.
    async fn resource_by_index(
        &self,
        id: &PackageId,
        index: usize,
        store: Arc<dyn WorkStore>,
    ) -> MetsResult<MetsResource> {
        let struct_map = Self::file_struct_map(id, store.clone()).await?;
        if struct_map.is_manifestation() {
            return resource_from_struct_map(struct_map);
        }

        if !struct_map.type_is(PERIODICAL) {
            let child = struct_map.children.get(index).ok_or_else(|| {
                MetsError::UnknownIdentifier(format!("{}/{index}", id.package_identifier()))
            })?;
            if !child.is_manifestation() {
                return Err(MetsError::UnknownIdentifier(format!(
                    "{}/{index}",
                    id.package_identifier()
                )));
            }
            let link = child.link_id.clone().ok_or_else(|| {
                MetsError::UnknownIdentifier(format!("{}/{index}", id.package_identifier()))
            })?;
            let linked = Self::linked_struct_map(&link, store).await?;
            return resource_from_struct_map(linked);
        }

        let mut counter = 0usize;
        for volume_div in &struct_map.children {
            let link = volume_div.link_id.clone().ok_or_else(|| {
                MetsError::UnknownIdentifier(format!("{}/{index}", id.package_identifier()))
            })?;
            let mut volume = Self::linked_struct_map(&link, store.clone()).await?;
            if index < counter + volume.children.len() {
                let issue = volume.children.remove(index - counter);
                return Ok(MetsResource::Manifestation(Box::new(Manifestation::new(
                    issue, None,
                )?)));
            }
            counter += volume.children.len();
        }
        Err(MetsError::UnknownIdentifier(format!(
            "{}/{index}",
            id.package_identifier()
        )))
    }

    async fn file_struct_map(
        id: &PackageId,
        store: Arc<dyn WorkStore>,
    ) -> MetsResult<LogicalStructDiv> {
        let source = store
            .load_xml_for_identifier(&id.path_element_safe())
            .await?;
        logical_struct_div(&source, &id.package_identifier(), store)
    }

    /// Loads the file an anchor links to and moves past its wrapper div;
    /// the root div of a linked file is the container, not the content.
    async fn linked_struct_map(
        identifier: &str,
        store: Arc<dyn WorkStore>,
    ) -> MetsResult<LogicalStructDiv> {
        let source = store.load_xml_for_identifier(identifier).await?;
        let mut root = logical_struct_div(&source, identifier, store)?;
        if root.children.is_empty() {
            return Err(MetsError::ElementNotFound {
                element: "div",
                context: format!("linked file {identifier} has an empty root div"),
            });
        }
        Ok(root.children.remove(0))
    }
}

fn logical_struct_div(
    source: &XmlSource,
    identifier: &str,
    store: Arc<dyn WorkStore>,
) -> MetsResult<LogicalStructDiv> {
    let logical = source
        .root
        .single_descendant_with_attr(METS_NS, "structMap", "TYPE", "LOGICAL")?;
    let divs = logical.ns_children(METS_NS, "div");
    if divs.len() != 1 {
        return Err(MetsError::NotSingle {
            element: "div",
            context: format!("logical structMap of {identifier}"),
            count: divs.len(),
        });
    }
    LogicalStructDiv::new(
        divs[0],
        source.root.clone(),
        &source.relative_path,
        Some(identifier.to_string()),
        store,
    )
}

/// A manifestation-typed root div becomes a manifestation; a
/// collection-typed one becomes a collection of its children. Periodical
/// children are named partial collections only, so callers come back for
/// the full volume. Anything else is a cataloguing error.
fn resource_from_struct_map(mut struct_map: LogicalStructDiv) -> MetsResult<MetsResource> {
    if struct_map.is_manifestation() {
        return Ok(MetsResource::Manifestation(Box::new(Manifestation::new(
            struct_map, None,
        )?)));
    }
    if struct_map.is_collection() {
        let mut collection = Collection::new(&struct_map)?;
        if struct_map.type_is(PERIODICAL) {
            for volume_div in &struct_map.children {
                collection.collections.push(Collection::new(volume_div)?);
            }
        } else {
            for child in std::mem::take(&mut struct_map.children) {
                collection
                    .manifestations
                    .push(Manifestation::new(child, None)?);
            }
        }
        return Ok(MetsResource::Collection(collection));
    }
    Err(MetsError::UnrecognisedDivType {
        id: struct_map.id.clone().unwrap_or_default(),
        div_type: struct_map.div_type.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pronom::PronomData;
    use crate::work_store::FileSystemWorkStoreFactory;
    use stacks_common::AccessCondition;
    use std::path::Path;

    const MONOGRAPH: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
        xmlns:mods="http://www.loc.gov/mods/v3"
        xmlns:xlink="http://www.w3.org/1999/xlink"
        xmlns:tessella="http://www.tessella.com/transfer">
      <mets:dmdSec ID="DMDLOG_0000">
        <mets:mdWrap MDTYPE="MODS"><mets:xmlData><mods:mods>
          <mods:titleInfo><mods:title>A short treatise</mods:title></mods:titleInfo>
          <mods:accessCondition type="status">Requires registration</mods:accessCondition>
          <mods:accessCondition type="dz">A</mods:accessCondition>
        </mods:mods></mets:xmlData></mets:mdWrap>
      </mets:dmdSec>
      <mets:amdSec ID="AMD">
        <mets:techMD ID="AMD_0001">
          <mets:mdWrap MDTYPE="OTHER"><mets:xmlData>
            <tessella:File>
              <tessella:FileName>b12345678_0001.jp2</tessella:FileName>
            </tessella:File>
          </mets:xmlData></mets:mdWrap>
        </mets:techMD>
      </mets:amdSec>
      <mets:fileSec>
        <mets:fileGrp USE="OBJECTS">
          <mets:file ID="FILE_0001_OBJECTS" MIMETYPE="image/jp2" ADMID="AMD_0001">
            <mets:FLocat xlink:href="objects/b12345678_0001.jp2"/>
          </mets:file>
        </mets:fileGrp>
        <mets:fileGrp USE="ALTO">
          <mets:file ID="FILE_0001_ALTO" MIMETYPE="text/xml">
            <mets:FLocat xlink:href="alto/b12345678_0001.xml"/>
          </mets:file>
        </mets:fileGrp>
      </mets:fileSec>
      <mets:structMap TYPE="LOGICAL">
        <mets:div ID="LOG_0000" TYPE="Monograph" DMDID="DMDLOG_0000"/>
      </mets:structMap>
      <mets:structMap TYPE="PHYSICAL">
        <mets:div ID="PHYS_ROOT" TYPE="physSequence">
          <mets:div ID="PHYS_0001" TYPE="page" ORDER="1">
            <mets:fptr FILEID="FILE_0001_OBJECTS"/>
            <mets:fptr FILEID="FILE_0001_ALTO"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
      <mets:structLink>
        <mets:smLink xlink:from="LOG_0000" xlink:to="PHYS_0001"/>
      </mets:structLink>
    </mets:mets>"#;

    const ANCHOR: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <mets:structMap TYPE="LOGICAL">
        <mets:div ID="LOG_0000" TYPE="MultipleManifestation">
          <mets:div ID="LOG_0001" TYPE="Monograph" ORDER="1" LABEL="Volume 1">
            <mets:mptr xlink:href="b19974760_1.xml"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
    </mets:mets>"#;

    const VOLUME: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
        xmlns:mods="http://www.loc.gov/mods/v3"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <mets:dmdSec ID="DMDLOG_0001">
        <mets:mdWrap MDTYPE="MODS"><mets:xmlData><mods:mods>
          <mods:titleInfo><mods:title>Volume one</mods:title></mods:titleInfo>
        </mods:mods></mets:xmlData></mets:mdWrap>
      </mets:dmdSec>
      <mets:fileSec>
        <mets:fileGrp USE="OBJECTS">
          <mets:file ID="F1" MIMETYPE="image/jp2">
            <mets:FLocat xlink:href="objects/b19974760_0001.jp2"/>
          </mets:file>
        </mets:fileGrp>
      </mets:fileSec>
      <mets:structMap TYPE="LOGICAL">
        <mets:div ID="LOG_0000" TYPE="MultipleManifestation">
          <mets:div ID="LOG_0001" TYPE="Monograph" DMDID="DMDLOG_0001"/>
        </mets:div>
      </mets:structMap>
      <mets:structMap TYPE="PHYSICAL">
        <mets:div ID="PHYS_ROOT" TYPE="physSequence">
          <mets:div ID="PHYS_0001" TYPE="page" ORDER="1">
            <mets:fptr FILEID="F1"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
      <mets:structLink>
        <mets:smLink xlink:from="LOG_0001" xlink:to="PHYS_0001"/>
      </mets:structLink>
    </mets:mets>"#;

    const PERIODICAL_ANCHOR: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <mets:structMap TYPE="LOGICAL">
        <mets:div ID="LOG_0000" TYPE="Periodical">
          <mets:div ID="LOG_0001" TYPE="PeriodicalVolume" ORDER="1">
            <mets:mptr xlink:href="b30000000_1.xml"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
    </mets:mets>"#;

    const PERIODICAL_VOLUME_FILE: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
        xmlns:mods="http://www.loc.gov/mods/v3"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <mets:dmdSec ID="DMDLOG_VOL">
        <mets:mdWrap MDTYPE="MODS"><mets:xmlData><mods:mods>
          <mods:titleInfo><mods:title>The Chemist</mods:title></mods:titleInfo>
          <mods:accessCondition type="player">9</mods:accessCondition>
        </mods:mods></mets:xmlData></mets:mdWrap>
      </mets:dmdSec>
      <mets:dmdSec ID="DMDLOG_0002">
        <mets:mdWrap MDTYPE="MODS"><mets:xmlData><mods:mods>
          <mods:titleInfo><mods:title>2</mods:title></mods:titleInfo>
          <mods:originInfo><mods:dateIssued>12 June 1897</mods:dateIssued></mods:originInfo>
        </mods:mods></mets:xmlData></mets:mdWrap>
      </mets:dmdSec>
      <mets:fileSec>
        <mets:fileGrp USE="OBJECTS">
          <mets:file ID="F1" MIMETYPE="image/jp2">
            <mets:FLocat xlink:href="objects/b30000000_0001.jp2"/>
          </mets:file>
        </mets:fileGrp>
      </mets:fileSec>
      <mets:structMap TYPE="LOGICAL">
        <mets:div ID="LOG_ROOT" TYPE="Periodical">
          <mets:div ID="LOG_VOL" TYPE="PeriodicalVolume" DMDID="DMDLOG_VOL">
            <mets:div ID="LOG_0002" TYPE="PeriodicalIssue" DMDID="DMDLOG_0002" ORDER="1"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
      <mets:structMap TYPE="PHYSICAL">
        <mets:div ID="PHYS_ROOT" TYPE="physSequence">
          <mets:div ID="PHYS_0001" TYPE="page" ORDER="1">
            <mets:fptr FILEID="F1"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
      <mets:structLink>
        <mets:smLink xlink:from="LOG_0002" xlink:to="PHYS_0001"/>
      </mets:structLink>
    </mets:mets>"#;

    fn repository(dir: &Path) -> MetsRepository {
        let factory =
            FileSystemWorkStoreFactory::new(dir, Arc::new(PronomData::default()));
        MetsRepository::new(Arc::new(factory))
    }

    #[tokio::test]
    async fn monograph_resolves_to_a_full_manifestation() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b12345678.xml"), MONOGRAPH).expect("fixture");
        let repo = repository(dir.path());

        let resource = repo.get("b12345678").await.expect("resolves");
        let manifestation = resource.as_manifestation().expect("is a manifestation");
        assert_eq!(manifestation.label, "A short treatise");
        assert_eq!(manifestation.manifestation_type, "Monograph");
        assert!(!manifestation.partial);

        let sequence = manifestation.sequence().expect("sequence");
        assert_eq!(sequence.len(), 1);
        let page = &sequence[0];
        assert_eq!(page.storage_identifier, "b12345678_0001.jp2");
        assert_eq!(page.mime_type.as_deref(), Some("image/jp2"));
        assert_eq!(
            page.access_condition,
            Some(AccessCondition::RequiresRegistration)
        );
        assert!(page.has_alto());

        let ignored = manifestation
            .ignored_storage_identifiers()
            .expect("ignored");
        assert_eq!(ignored, ["b12345678_0001.xml"]);
        assert_eq!(
            manifestation.synchronisable_files().expect("sync").len(),
            1
        );
        assert_eq!(
            manifestation.first_internet_type().expect("type"),
            Some("image/jp2")
        );
        assert_eq!(
            manifestation.permitted_operations().expect("ops"),
            vec![
                "currentViewAsJpg",
                "wholeImageHighResAsJpg",
                "wholeImageLowResAsJpg",
                "entireDocumentAsPdf"
            ]
        );

        let root_range = manifestation
            .root_struct_range()
            .expect("range")
            .expect("present");
        assert_eq!(root_range.physical_file_ids, ["PHYS_0001"]);
    }

    #[tokio::test]
    async fn anchor_resolves_to_a_collection_of_partial_manifestations() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b19974760.xml"), ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b19974760_1.xml"), VOLUME).expect("fixture");
        let repo = repository(dir.path());

        let resource = repo.get("b19974760").await.expect("resolves");
        let collection = resource.as_collection().expect("is a collection");
        assert_eq!(collection.collection_type, "MultipleManifestation");
        assert_eq!(collection.manifestations.len(), 1);
        let child = &collection.manifestations[0];
        assert_eq!(child.id.as_str(), "b19974760_1");
        assert!(child.partial);
        assert_eq!(child.label, "Volume 1");
    }

    #[tokio::test]
    async fn volume_identifier_loads_the_linked_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b19974760.xml"), ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b19974760_1.xml"), VOLUME).expect("fixture");
        let repo = repository(dir.path());

        let resource = repo.get("b19974760_1").await.expect("resolves");
        let manifestation = resource.as_manifestation().expect("is a manifestation");
        assert_eq!(manifestation.id.as_str(), "b19974760_1");
        assert_eq!(manifestation.label, "Volume one");
        assert!(!manifestation.partial);
        assert_eq!(manifestation.sequence().expect("sequence").len(), 1);
    }

    #[tokio::test]
    async fn sequence_index_form_counts_into_the_anchor() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b19974760.xml"), ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b19974760_1.xml"), VOLUME).expect("fixture");
        let repo = repository(dir.path());

        let resource = repo.get("b19974760/0").await.expect("resolves");
        let manifestation = resource.as_manifestation().expect("is a manifestation");
        assert_eq!(manifestation.label, "Volume one");

        let err = repo.get("b19974760/5").await.expect_err("out of range");
        assert!(matches!(err, MetsError::UnknownIdentifier(_)));
    }

    #[tokio::test]
    async fn find_sequence_index_locates_volumes() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b19974760.xml"), ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b19974760_1.xml"), VOLUME).expect("fixture");
        let repo = repository(dir.path());

        assert_eq!(
            repo.find_sequence_index("b19974760").await.expect("index"),
            Some(0)
        );
        assert_eq!(
            repo.find_sequence_index("b19974760_1").await.expect("index"),
            Some(0)
        );
        assert!(repo.find_sequence_index("b19974760/3").await.is_err());
    }

    #[tokio::test]
    async fn periodical_issue_inherits_volume_player_options() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b30000000.xml"), PERIODICAL_ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b30000000_1.xml"), PERIODICAL_VOLUME_FILE)
            .expect("fixture");
        let repo = repository(dir.path());

        let resource = repo.get("b30000000_1_0002").await.expect("resolves");
        let issue = resource.as_manifestation().expect("is a manifestation");
        assert_eq!(issue.id.as_str(), "b30000000_1_0002");
        assert_eq!(issue.label, "12 June 1897 (issue 2)");
        assert_eq!(
            issue.permitted_operations().expect("ops"),
            vec!["currentViewAsJpg", "entireDocumentAsPdf"]
        );
        assert_eq!(issue.sequence().expect("sequence").len(), 1);
    }

    #[tokio::test]
    async fn periodical_enumeration_walks_volumes_for_issues() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b30000000.xml"), PERIODICAL_ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b30000000_1.xml"), PERIODICAL_VOLUME_FILE)
            .expect("fixture");
        let repo = repository(dir.path());

        let contexts = repo
            .get_all_manifestations_in_context("b30000000")
            .await
            .expect("contexts");
        assert_eq!(contexts.len(), 1);
        let context = &contexts[0];
        assert_eq!(context.package_identifier, "b30000000");
        assert_eq!(context.sequence_index, 0);
        assert_eq!(context.volume_identifier.as_deref(), Some("b30000000_1"));
        assert_eq!(
            context.issue_identifier.as_deref(),
            Some("b30000000_1_0002")
        );
    }
}
