//! Turns METS resources into IIIF Presentation 3 resources.
//!
//! The batch entry point is [`IiifBuilder::build_all_manifestations`]: it
//! resolves a package identifier, builds every manifestation in it, and
//! runs the second passes that need package-wide state (AV collapsing and
//! multi-copy grouping). [`IiifBuilder::build`] builds a single resource
//! and refuses, rather than guesses, when that state would be needed.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use stacks_mets::ignore::{DefaultIgnoreFilter, IgnoreAssetFilter};
use stacks_mets::{Collection as MetsCollection, Manifestation, MetsRepository, MetsResource};

use crate::catalogue::{Catalogue, Work};
use crate::parts;
use crate::presentation::{
    Collection, CollectionItem, ExternalResource, IiifResource, LanguageMap, Manifest, Reference,
    ResourceReference,
};
use crate::state::{BuildResult, MultiCopyState, MultipleBuildResult, State};
use crate::structure;
use crate::uris::UriPatterns;
use crate::{IiifError, IiifResult};

pub struct IiifBuilder {
    repository: MetsRepository,
    catalogue: Arc<dyn Catalogue>,
    uris: UriPatterns,
    filter: Box<dyn IgnoreAssetFilter>,
}

impl IiifBuilder {
    pub fn new(
        repository: MetsRepository,
        catalogue: Arc<dyn Catalogue>,
        uris: UriPatterns,
    ) -> IiifBuilder {
        IiifBuilder {
            repository,
            catalogue,
            uris,
            filter: Box::new(DefaultIgnoreFilter),
        }
    }

    pub fn with_ignore_filter(mut self, filter: Box<dyn IgnoreAssetFilter>) -> IiifBuilder {
        self.filter = filter;
        self
    }

    /// Builds everything in a package: every manifestation, the collection
    /// that binds them when there is more than one, and the second-pass
    /// corrections. Per-manifestation failures are recorded in their
    /// [`BuildResult`]; only failure to resolve the package itself is an
    /// error.
    pub async fn build_all_manifestations(
        &self,
        identifier: &str,
    ) -> IiifResult<MultipleBuildResult> {
        let (work, root) = tokio::join!(
            self.lookup_work(identifier),
            self.repository.get(identifier)
        );
        let root = root?;

        let mut results = MultipleBuildResult::new(identifier);
        let mut state = State::default();

        let in_multiple_context = root.as_collection().is_some();
        if let Some(collection) = root.as_collection() {
            let resource = self.collection_resource(identifier, collection, work.as_ref());
            results.add(BuildResult::success(
                identifier,
                IiifResource::Collection(Box::new(resource)),
            ));
        }
        let manifestations = self.gather_manifestations(root).await?;

        for mets in &manifestations {
            debug!(id = mets.id.as_str(), "building manifestation");
            let result = match self.build_manifestation(
                mets,
                work.as_ref(),
                Some(&mut state),
                in_multiple_context,
            ) {
                Ok((manifest, counts)) => {
                    let mut result = BuildResult::success(
                        mets.id.as_str(),
                        IiifResource::Manifest(Box::new(manifest)),
                    );
                    result.image_count = counts.image;
                    result.time_based_count = counts.time_based;
                    result.file_count = counts.file;
                    result
                }
                Err(error) => {
                    warn!(id = mets.id.as_str(), %error, "manifestation build failed");
                    BuildResult::failure(mets.id.as_str(), error.to_string())
                }
            };
            results.add(result);
        }

        if in_multiple_context {
            self.propagate_thumbnails(&mut results);
        }
        if state.av.is_some() {
            parts::process_av_state(&mut results, &state, &self.uris);
        }
        if let Some(multi_copy) = &state.multi_copy {
            self.apply_multi_copy_structure(&mut results, multi_copy);
        }
        Ok(results)
    }

    /// Builds one resource in isolation. A manifestation that needs
    /// package-wide state comes back as a failure with
    /// `requires_multiple_build` set, telling the caller to go through
    /// [`IiifBuilder::build_all_manifestations`] instead.
    pub async fn build(&self, identifier: &str) -> IiifResult<BuildResult> {
        let resource = self.repository.get(identifier).await?;
        match resource {
            MetsResource::Collection(collection) => {
                let work = self.lookup_work(identifier).await;
                let built = self.collection_resource(identifier, &collection, work.as_ref());
                Ok(BuildResult::success(
                    identifier,
                    IiifResource::Collection(Box::new(built)),
                ))
            }
            MetsResource::Manifestation(mets) => {
                let mets = self.materialise(*mets).await?;
                let work = self.lookup_work(&mets.id.package_identifier()).await;
                match self.build_manifestation(&mets, work.as_ref(), None, false) {
                    Ok((manifest, counts)) => {
                        let mut result = BuildResult::success(
                            identifier,
                            IiifResource::Manifest(Box::new(manifest)),
                        );
                        result.image_count = counts.image;
                        result.time_based_count = counts.time_based;
                        result.file_count = counts.file;
                        Ok(result)
                    }
                    Err(IiifError::StateRequired(id)) => {
                        let mut result = BuildResult::failure(
                            identifier,
                            IiifError::StateRequired(id).to_string(),
                        );
                        result.requires_multiple_build = true;
                        Ok(result)
                    }
                    Err(error) => Ok(BuildResult::failure(identifier, error.to_string())),
                }
            }
        }
    }

    async fn lookup_work(&self, identifier: &str) -> Option<Work> {
        match self.catalogue.work_by_identifier(identifier).await {
            Ok(work) => work,
            Err(error) => {
                warn!(identifier, %error, "catalogue lookup failed; building without descriptive metadata");
                None
            }
        }
    }

    /// Loads a partial manifestation's own METS file.
    async fn materialise(&self, mets: Manifestation) -> IiifResult<Manifestation> {
        if !mets.partial {
            return Ok(mets);
        }
        let identifier = mets.id.as_str().to_string();
        let resource = self.repository.get(&identifier).await?;
        resource
            .into_manifestation()
            .ok_or_else(|| IiifError::Build(format!("{identifier} did not resolve to a manifestation")))
    }

    /// Flattens a package into its manifestations, in document order,
    /// loading linked METS files as it goes.
    async fn gather_manifestations(
        &self,
        root: MetsResource,
    ) -> IiifResult<Vec<Manifestation>> {
        let mut manifestations = Vec::new();
        let mut queue: VecDeque<MetsResource> = VecDeque::from([root]);
        while let Some(resource) = queue.pop_front() {
            match resource {
                MetsResource::Manifestation(mets) => {
                    manifestations.push(self.materialise(*mets).await?);
                }
                MetsResource::Collection(collection) => {
                    // Children go to the front so document order survives
                    // the queue.
                    let mut children: Vec<MetsResource> = Vec::new();
                    for child in collection.collections {
                        if child.partial {
                            if let Some(id) = child.id.clone() {
                                children.push(self.repository.get(&id).await?);
                                continue;
                            }
                        }
                        children.push(MetsResource::Collection(child));
                    }
                    for mets in collection.manifestations {
                        children.push(MetsResource::Manifestation(Box::new(mets)));
                    }
                    for child in children.into_iter().rev() {
                        queue.push_front(child);
                    }
                }
            }
        }
        Ok(manifestations)
    }

    fn build_manifestation(
        &self,
        mets: &Manifestation,
        work: Option<&Work>,
        mut state: Option<&mut State>,
        in_multiple_context: bool,
    ) -> IiifResult<(Manifest, parts::CanvasCounts)> {
        let identifier = mets.id.as_str();
        let label = work
            .and_then(|w| w.title.as_deref())
            .unwrap_or(&mets.label);
        let mut manifest = Manifest::new(self.uris.manifest(identifier), LanguageMap::en(label));

        if let Some(work) = work {
            if let Some(description) = work.description.as_deref() {
                manifest.summary = Some(LanguageMap::en(description));
            }
            manifest.metadata = work.metadata_pairs();
            if let Some(reference) = work.reference_number.as_deref() {
                manifest.metadata.push(crate::presentation::LabelValuePair {
                    label: LanguageMap::en("Reference"),
                    value: LanguageMap::none(reference),
                });
            }
        }

        parts::required_statement(&mut manifest, mets, work);
        parts::rights(&mut manifest, mets);
        parts::paged_behavior(&mut manifest, mets)?;
        parts::renderings(&mut manifest, mets, &self.uris)?;
        parts::search_services(&mut manifest, mets, &self.uris)?;
        let counts = parts::canvases(
            &mut manifest,
            mets,
            self.filter.as_ref(),
            &self.uris,
            state.as_deref_mut(),
        )?;
        parts::check_for_copy_and_volume_structure(mets, state)?;
        parts::structures(&mut manifest, mets, self.filter.as_ref(), &self.uris)?;
        structure::improve_paging_sequence(&mut manifest);
        parts::manifest_level_annotations(&mut manifest, mets, &self.uris, false)?;
        parts::access_hint(&mut manifest, mets)?;

        if in_multiple_context {
            manifest.part_of.push(Reference {
                id: self.uris.collection(&mets.id.package_identifier()),
                reference_type: "Collection".to_string(),
            });
        }
        Ok((manifest, counts))
    }

    fn collection_resource(
        &self,
        identifier: &str,
        mets: &MetsCollection,
        work: Option<&Work>,
    ) -> Collection {
        let label = work
            .and_then(|w| w.title.as_deref())
            .unwrap_or(&mets.label);
        let mut collection =
            Collection::new(self.uris.collection(identifier), LanguageMap::en(label));
        if let Some(description) = work.and_then(|w| w.description.as_deref()) {
            collection.summary = Some(LanguageMap::en(description));
        }
        if let Some(work) = work {
            collection.metadata = work.metadata_pairs();
        }
        self.append_collection_items(mets, &mut collection.items);
        collection
    }

    fn append_collection_items(&self, mets: &MetsCollection, items: &mut Vec<CollectionItem>) {
        for child in &mets.collections {
            if let Some(id) = child.id.as_deref() {
                items.push(CollectionItem::Reference(ResourceReference::collection(
                    self.uris.collection(id),
                    LanguageMap::en(&child.label),
                )));
            } else {
                // An unlinked grouping div; surface its manifestations
                // directly.
                self.append_collection_items(child, items);
            }
        }
        for manifestation in &mets.manifestations {
            items.push(CollectionItem::Reference(ResourceReference::manifest(
                self.uris.manifest(manifestation.id.as_str()),
                LanguageMap::en(&manifestation.label),
            )));
        }
    }

    /// Copies each manifest's thumbnail (or its first canvas's) onto the
    /// collection reference pointing at it.
    fn propagate_thumbnails(&self, results: &mut MultipleBuildResult) {
        let mut thumbnails: Vec<(String, Vec<ExternalResource>)> = Vec::new();
        for result in results.iter() {
            let Some(manifest) = result.resource.as_ref().and_then(IiifResource::as_manifest)
            else {
                continue;
            };
            let thumbnail = if manifest.thumbnail.is_empty() {
                manifest
                    .items
                    .iter()
                    .find(|canvas| !canvas.thumbnail.is_empty())
                    .map(|canvas| canvas.thumbnail.clone())
                    .unwrap_or_default()
            } else {
                manifest.thumbnail.clone()
            };
            if !thumbnail.is_empty() {
                thumbnails.push((manifest.id.clone(), thumbnail));
            }
        }

        let identifier = results.identifier.clone();
        if let Some(collection) = results
            .get_mut(&identifier)
            .and_then(|result| result.resource.as_mut())
            .and_then(IiifResource::as_collection_mut)
        {
            for item in &mut collection.items {
                if let CollectionItem::Reference(reference) = item {
                    if let Some((_, thumbnail)) =
                        thumbnails.iter().find(|(id, _)| *id == reference.id)
                    {
                        reference.thumbnail = thumbnail.clone();
                    }
                }
            }
        }
    }

    /// Regroups the package collection by copy: one manifest per copy is
    /// referenced as "Copy N"; copies with several volumes become embedded
    /// sub-collections whose manifests are "Copy N, Volume M".
    fn apply_multi_copy_structure(
        &self,
        results: &mut MultipleBuildResult,
        multi_copy: &MultiCopyState,
    ) {
        let mut copies: BTreeMap<i32, Vec<&crate::state::CopyAndVolume>> = BTreeMap::new();
        for cv in multi_copy.copy_and_volumes.values() {
            copies.entry(cv.copy_number).or_default().push(cv);
        }

        let mut items: Vec<CollectionItem> = Vec::new();
        for (copy_number, group) in &copies {
            let mut group = group.clone();
            group.sort_by_key(|cv| cv.volume_number.unwrap_or(0));
            if group.len() == 1 {
                items.push(CollectionItem::Reference(ResourceReference::manifest(
                    self.uris.manifest(&group[0].id),
                    LanguageMap::en(format!("Copy {copy_number}")),
                )));
                continue;
            }
            let collection_id = format!(
                "{}/copy/{copy_number}",
                self.uris.collection(&results.identifier)
            );
            let mut copy_collection = Collection::embedded(
                collection_id,
                LanguageMap::en(format!("Copy {copy_number}")),
            );
            for cv in group {
                let label = match cv.volume_number {
                    Some(volume) => format!("Copy {copy_number}, Volume {volume}"),
                    None => format!("Copy {copy_number}"),
                };
                copy_collection
                    .items
                    .push(CollectionItem::Reference(ResourceReference::manifest(
                        self.uris.manifest(&cv.id),
                        LanguageMap::en(label),
                    )));
            }
            items.push(CollectionItem::Collection(Box::new(copy_collection)));
        }

        let identifier = results.identifier.clone();
        if let Some(collection) = results
            .get_mut(&identifier)
            .and_then(|result| result.resource.as_mut())
            .and_then(IiifResource::as_collection_mut)
        {
            collection.items = items;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::NullCatalogue;
    use crate::presentation::AnnotationBody;
    use stacks_mets::{MetsRepository, PronomData};
    use stacks_mets::work_store::FileSystemWorkStoreFactory;
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
              <tessella:FileProperty>
                <tessella:FilePropertyName>Image Width</tessella:FilePropertyName>
                <tessella:Value>2481</tessella:Value>
              </tessella:FileProperty>
              <tessella:FileProperty>
                <tessella:FilePropertyName>Image Height</tessella:FilePropertyName>
                <tessella:Value>3508</tessella:Value>
              </tessella:FileProperty>
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
        <mets:div ID="LOG_0000" TYPE="Monograph" DMDID="DMDLOG_0000">
          <mets:div ID="LOG_0001" TYPE="TitlePage"/>
        </mets:div>
      </mets:structMap>
      <mets:structMap TYPE="PHYSICAL">
        <mets:div ID="PHYS_ROOT" TYPE="physSequence">
          <mets:div ID="PHYS_0001" TYPE="page" ORDER="1" ORDERLABEL="1">
            <mets:fptr FILEID="FILE_0001_OBJECTS"/>
            <mets:fptr FILEID="FILE_0001_ALTO"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
      <mets:structLink>
        <mets:smLink xlink:from="LOG_0000" xlink:to="PHYS_0001"/>
        <mets:smLink xlink:from="LOG_0001" xlink:to="PHYS_0001"/>
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

    const TRANSCRIPT_ANCHOR: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <mets:structMap TYPE="LOGICAL">
        <mets:div ID="LOG_0000" TYPE="MultipleManifestation">
          <mets:div ID="LOG_0001" TYPE="Transcript" ORDER="1" LABEL="PDF transcript">
            <mets:mptr xlink:href="b29999999_0002.xml"/>
          </mets:div>
        </mets:div>
      </mets:structMap>
    </mets:mets>"#;

    const TRANSCRIPT: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
        xmlns:mods="http://www.loc.gov/mods/v3"
        xmlns:xlink="http://www.w3.org/1999/xlink">
      <mets:dmdSec ID="DMDLOG_0001">
        <mets:mdWrap MDTYPE="MODS"><mets:xmlData><mods:mods>
          <mods:titleInfo><mods:title>PDF transcript</mods:title></mods:titleInfo>
        </mods:mods></mets:xmlData></mets:mdWrap>
      </mets:dmdSec>
      <mets:fileSec>
        <mets:fileGrp USE="OBJECTS">
          <mets:file ID="F1" MIMETYPE="application/pdf">
            <mets:FLocat xlink:href="objects/b29999999_0002_0001.pdf"/>
          </mets:file>
        </mets:fileGrp>
      </mets:fileSec>
      <mets:structMap TYPE="LOGICAL">
        <mets:div ID="LOG_0000" TYPE="MultipleManifestation">
          <mets:div ID="LOG_0001" TYPE="Transcript" DMDID="DMDLOG_0001"/>
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

    fn builder(dir: &Path) -> IiifBuilder {
        let factory = FileSystemWorkStoreFactory::new(dir, Arc::new(PronomData::default()));
        IiifBuilder::new(
            MetsRepository::new(Arc::new(factory)),
            Arc::new(NullCatalogue),
            UriPatterns::new("https://iiif.test"),
        )
    }

    #[tokio::test]
    async fn monograph_builds_a_complete_manifest() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b12345678.xml"), MONOGRAPH).expect("fixture");
        let builder = builder(dir.path());

        let result = builder.build("b12345678").await.expect("build");
        assert!(result.outcome.is_success());
        assert_eq!(result.image_count, 1);
        let manifest = result
            .resource
            .as_ref()
            .and_then(IiifResource::as_manifest)
            .expect("manifest");

        assert_eq!(manifest.id, "https://iiif.test/presentation/b12345678");
        assert_eq!(manifest.label.first(), Some("A short treatise"));
        assert_eq!(manifest.behavior, ["paged"]);
        assert_eq!(
            manifest.rights.as_deref(),
            Some("http://creativecommons.org/licenses/by-nc/4.0/")
        );
        let statement = manifest.required_statement.as_ref().expect("statement");
        assert_eq!(statement.label.first(), Some("Attribution and usage"));
        assert_eq!(statement.value.0["en"][0], "Wellcome Collection");

        // ALTO makes the work searchable: search service, raw-text
        // rendering, and the OCR annotation page reference.
        assert_eq!(manifest.service.len(), 1);
        assert!(manifest.service[0].service.is_some());
        assert!(manifest
            .rendering
            .iter()
            .any(|r| r.format.as_deref() == Some("text/plain")));
        assert!(manifest
            .rendering
            .iter()
            .any(|r| r.format.as_deref() == Some("application/pdf")));
        assert_eq!(manifest.annotations.len(), 1);

        // One image canvas with real dimensions and a painting annotation.
        assert_eq!(manifest.items.len(), 1);
        let canvas = &manifest.items[0];
        assert_eq!(canvas.width, Some(2481));
        assert_eq!(canvas.height, Some(3508));
        assert_eq!(canvas.label.as_ref().and_then(|l| l.first()), Some("1"));
        let annotation = &canvas.items[0].items[0];
        assert_eq!(annotation.motivation, "painting");
        match annotation.body.as_ref().expect("body") {
            AnnotationBody::Resource(body) => {
                assert_eq!(body.resource_type, "Image");
                assert_eq!(body.service.len(), 1);
            }
            AnnotationBody::Choice(_) => panic!("image canvases carry a single body"),
        }
        assert!(!canvas.see_also.is_empty());

        // Registration required maps to the clickthrough hint.
        assert_eq!(manifest.services.len(), 1);
        assert_eq!(
            manifest.services[0].label.as_ref().and_then(|l| l.first()),
            Some("clickthrough")
        );

        // The title page range survives as a structure.
        assert_eq!(manifest.structures.len(), 1);
        assert_eq!(
            manifest.structures[0].label.as_ref().and_then(|l| l.first()),
            Some("Title Page")
        );
    }

    #[tokio::test]
    async fn built_manifests_round_trip_through_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b12345678.xml"), MONOGRAPH).expect("fixture");
        let builder = builder(dir.path());

        let result = builder.build("b12345678").await.expect("build");
        let manifest = result
            .resource
            .as_ref()
            .and_then(IiifResource::as_manifest)
            .expect("manifest");
        let json = serde_json::to_string_pretty(manifest).expect("serialize");
        let back: Manifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(&back, manifest);
    }

    #[tokio::test]
    async fn multiple_manifestation_builds_collection_and_volumes() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b19974760.xml"), ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b19974760_1.xml"), VOLUME).expect("fixture");
        let builder = builder(dir.path());

        let results = builder
            .build_all_manifestations("b19974760")
            .await
            .expect("build");
        assert!(results.all_succeeded());
        assert_eq!(results.len(), 2);

        let collection = results
            .get("b19974760")
            .and_then(|r| r.resource.as_ref())
            .and_then(|r| match r {
                IiifResource::Collection(c) => Some(c.as_ref()),
                IiifResource::Manifest(_) => None,
            })
            .expect("collection");
        assert_eq!(collection.items.len(), 1);
        match &collection.items[0] {
            CollectionItem::Reference(reference) => {
                assert_eq!(reference.reference_type, "Manifest");
                assert_eq!(
                    reference.id,
                    "https://iiif.test/presentation/b19974760_1"
                );
            }
            CollectionItem::Collection(_) => panic!("expected a manifest reference"),
        }

        let volume = results
            .get("b19974760_1")
            .and_then(|r| r.resource.as_ref())
            .and_then(IiifResource::as_manifest)
            .expect("volume manifest");
        assert_eq!(volume.label.first(), Some("Volume one"));
        assert_eq!(volume.part_of.len(), 1);
        assert_eq!(
            volume.part_of[0].id,
            "https://iiif.test/presentation/b19974760"
        );
    }

    #[tokio::test]
    async fn sibling_transcript_files_get_no_canvas_of_their_own() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b29999999.xml"), TRANSCRIPT_ANCHOR).expect("fixture");
        std::fs::write(dir.path().join("b29999999_0002.xml"), TRANSCRIPT).expect("fixture");
        let builder = builder(dir.path());

        let results = builder
            .build_all_manifestations("b29999999")
            .await
            .expect("build");
        assert!(results.all_succeeded());

        // The PDF is counted and held back for the AV second pass; the
        // transcript manifest must not carry an empty canvas for it.
        let result = results.get("b29999999_0002").expect("transcript result");
        assert_eq!(result.file_count, 1);
        let manifest = result
            .resource
            .as_ref()
            .and_then(IiifResource::as_manifest)
            .expect("transcript manifest");
        assert!(manifest.items.is_empty());
    }

    #[tokio::test]
    async fn unknown_identifier_is_an_error_not_a_result() {
        let dir = tempfile::tempdir().expect("temp dir");
        let builder = builder(dir.path());
        let error = builder
            .build_all_manifestations("b00000000")
            .await
            .expect_err("missing package");
        assert!(matches!(error, IiifError::Mets(_)));
    }

    #[test]
    fn multi_copy_grouping_labels_copies_and_volumes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let builder = builder(dir.path());

        let mut results = MultipleBuildResult::new("b24923333");
        let collection = Collection::new(
            "https://iiif.test/presentation/b24923333",
            LanguageMap::en("A work in two copies"),
        );
        results.add(BuildResult::success(
            "b24923333",
            IiifResource::Collection(Box::new(collection)),
        ));

        let mut multi_copy = MultiCopyState::default();
        for (id, copy, volume) in [
            ("b24923333_0001", 1, None),
            ("b24923333_0002", 2, Some(1)),
            ("b24923333_0003", 2, Some(2)),
        ] {
            multi_copy.copy_and_volumes.insert(
                id.to_string(),
                crate::state::CopyAndVolume {
                    id: id.to_string(),
                    copy_number: copy,
                    volume_number: volume,
                },
            );
        }
        builder.apply_multi_copy_structure(&mut results, &multi_copy);

        let collection = results
            .get("b24923333")
            .and_then(|r| r.resource.as_ref())
            .and_then(|r| match r {
                IiifResource::Collection(c) => Some(c.as_ref()),
                IiifResource::Manifest(_) => None,
            })
            .expect("collection");
        assert_eq!(collection.items.len(), 2);
        match &collection.items[0] {
            CollectionItem::Reference(reference) => {
                assert_eq!(
                    reference.label.as_ref().and_then(|l| l.first()),
                    Some("Copy 1")
                );
            }
            CollectionItem::Collection(_) => panic!("single-volume copy is a plain reference"),
        }
        match &collection.items[1] {
            CollectionItem::Collection(copy) => {
                assert_eq!(copy.label.first(), Some("Copy 2"));
                assert!(copy.context.is_none());
                assert_eq!(copy.items.len(), 2);
                match &copy.items[1] {
                    CollectionItem::Reference(reference) => {
                        assert_eq!(
                            reference.label.as_ref().and_then(|l| l.first()),
                            Some("Copy 2, Volume 2")
                        );
                    }
                    CollectionItem::Collection(_) => panic!("volumes are references"),
                }
            }
            CollectionItem::Reference(_) => panic!("two volumes become a sub-collection"),
        }
    }

    #[tokio::test]
    async fn missing_linked_volume_fails_the_package_resolution() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("b19974760.xml"), ANCHOR).expect("fixture");
        let builder = builder(dir.path());
        let error = builder
            .build_all_manifestations("b19974760")
            .await
            .expect_err("gathering fails when a linked file is missing");
        assert!(matches!(error, IiifError::Mets(_)));
    }
}
