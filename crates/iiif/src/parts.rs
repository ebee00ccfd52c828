//! The pieces of a manifest.
//!
//! Each function here fills in one aspect of a manifest from the METS
//! model: the required statement, rights, behaviors, renderings, search
//! services, canvases, structural ranges, and the access hint service.
//! They are deliberately independent so the builder can order them and so
//! tests can exercise one aspect at a time.

use std::collections::HashMap;

use stacks_common::AccessCondition;
use stacks_mets::ignore::IgnoreAssetFilter;
use stacks_mets::mods::SectionMetadata;
use stacks_mets::{AssetFamily, FileUse, Manifestation, PhysicalFile, StoredFile, StructRange};

use crate::catalogue::Work;
use crate::licenses;
use crate::presentation::{
    Annotation, AnnotationBody, AnnotationPage, Canvas, Choice, ExternalResource, LabelValuePair,
    LanguageMap, Manifest, Range, RangeItem, Reference, SearchService, AUTOCOMPLETE_1_PROFILE,
    BEHAVIOR_PAGED, IMAGE_2_PROFILE, SEARCH_1_CONTEXT, SEARCH_1_PROFILE,
};
use crate::state::{AvState, CopyAndVolume, FileState, MultiCopyState, MultipleBuildResult, State};
use crate::structure::friendly_section_label;
use crate::uris::UriPatterns;
use crate::{IiifError, IiifResult};

pub const WELLCOME_COLLECTION: &str = "Wellcome Collection";
pub const ATTRIBUTION_AND_USAGE: &str = "Attribution and usage";
pub const ACCESS_CONTROL_HINTS_PROFILE: &str =
    "http://wellcomelibrary.org/ld/iiif-ext/access-control-hints";

/// How many canvases of each asset family a manifest ended up with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CanvasCounts {
    pub image: usize,
    pub time_based: usize,
    pub file: usize,
}

/// Whether any file in the sequence carries OCR text.
pub fn supports_search(mets: &Manifestation) -> IiifResult<bool> {
    Ok(mets.sequence()?.iter().any(PhysicalFile::has_alto))
}

/// The attribution-and-usage statement. The usage text comes from the
/// section's own usage field when present, decorated with license links;
/// otherwise from the conditions-of-use table for its license code. The
/// attribution names the holding repository when the catalogue supplies
/// one.
pub fn required_statement(manifest: &mut Manifest, mets: &Manifestation, work: Option<&Work>) {
    let mods = mets.section_metadata.as_ref();
    let mut usage: Option<String> = mods
        .and_then(|m| m.usage.as_deref())
        .map(licenses::usage_with_html_links)
        .filter(|text| !text.trim().is_empty());
    if usage.is_none() {
        let code = mods
            .and_then(|m| m.dz_license_code.as_deref())
            .map(licenses::map_license_code);
        usage = code
            .and_then(licenses::conditions_of_use)
            .map(|text| {
                if text.starts_with('<') {
                    text.to_string()
                } else {
                    licenses::wrap_span(text)
                }
            });
    }

    let attribution = match work.and_then(|w| w.location_of_original.as_deref()) {
        Some(location) => format!(
            "This material has been provided by {location} where the originals may be consulted."
        ),
        None => WELLCOME_COLLECTION.to_string(),
    };

    let mut value = LanguageMap::default();
    value.push("en", attribution);
    if let Some(usage) = usage {
        value.push("en", usage);
    }
    manifest.required_statement = Some(LabelValuePair {
        label: LanguageMap::en(ATTRIBUTION_AND_USAGE),
        value,
    });
}

pub fn rights(manifest: &mut Manifest, mets: &Manifestation) {
    manifest.rights = mets
        .section_metadata
        .as_ref()
        .and_then(|mods| mods.dz_license_code.as_deref())
        .and_then(licenses::rights_uri);
}

/// Monographs and manuscripts present as paged spreads.
pub fn paged_behavior(manifest: &mut Manifest, mets: &Manifestation) -> IiifResult<()> {
    let root_type = mets
        .root_struct_range()?
        .and_then(|root| root.range_type.as_deref());
    if matches!(root_type, Some("Monograph") | Some("Manuscript")) {
        manifest.behavior.push(BEHAVIOR_PAGED.to_string());
    }
    Ok(())
}

pub fn renderings(
    manifest: &mut Manifest,
    mets: &Manifestation,
    uris: &UriPatterns,
) -> IiifResult<()> {
    if mets.manifestation_type == "Video" || mets.manifestation_type == "Audio" {
        return Ok(());
    }
    let identifier = mets.id.as_str();
    if mets
        .permitted_operations()?
        .contains(&"entireDocumentAsPdf")
    {
        let mut pdf = ExternalResource::new("Text", uris.pdf(identifier));
        pdf.label = Some(LanguageMap::en("View as PDF"));
        pdf.format = Some("application/pdf".to_string());
        manifest.rendering.push(pdf);
    }
    if supports_search(mets)? {
        let mut text = ExternalResource::new("Text", uris.raw_text(identifier));
        text.label = Some(LanguageMap::en("View raw text"));
        text.format = Some("text/plain".to_string());
        manifest.rendering.push(text);
    }
    Ok(())
}

pub fn search_services(
    manifest: &mut Manifest,
    mets: &Manifestation,
    uris: &UriPatterns,
) -> IiifResult<()> {
    if !supports_search(mets)? {
        return Ok(());
    }
    let identifier = mets.id.as_str();
    manifest.service.push(SearchService {
        context: Some(SEARCH_1_CONTEXT.to_string()),
        id: uris.search_service(identifier),
        profile: SEARCH_1_PROFILE.to_string(),
        label: Some("Search within this manifest".to_string()),
        service: Some(Box::new(SearchService {
            context: None,
            id: uris.autocomplete_service(identifier),
            profile: AUTOCOMPLETE_1_PROFILE.to_string(),
            label: Some("Autocomplete words in this manifest".to_string()),
            service: None,
        })),
    });
    Ok(())
}

/// References to the OCR-derived annotation pages, present only when the
/// sequence carries text.
pub fn manifest_level_annotations(
    manifest: &mut Manifest,
    mets: &Manifestation,
    uris: &UriPatterns,
    add_all_content: bool,
) -> IiifResult<()> {
    if !supports_search(mets)? {
        return Ok(());
    }
    let identifier = mets.id.as_str();
    let mut images = AnnotationPage::new(uris.manifest_images_annotation_page(identifier));
    images.label = Some(LanguageMap::en(format!(
        "OCR-identified images and figures for {identifier}"
    )));
    manifest.annotations.push(images);
    if add_all_content {
        let mut all = AnnotationPage::new(uris.manifest_all_annotation_page(identifier));
        all.label = Some(LanguageMap::en(format!(
            "All OCR-derived annotations for {identifier}"
        )));
        manifest.annotations.push(all);
    }
    Ok(())
}

/// Builds one canvas per significant physical file, by asset family.
pub fn canvases(
    manifest: &mut Manifest,
    mets: &Manifestation,
    filter: &dyn IgnoreAssetFilter,
    uris: &UriPatterns,
    mut state: Option<&mut State>,
) -> IiifResult<CanvasCounts> {
    let identifier = mets.id.as_str().to_string();
    let mut counts = CanvasCounts::default();

    let significant: Vec<PhysicalFile> = mets
        .significant_sequence(filter)?
        .into_iter()
        .cloned()
        .collect();
    for physical_file in &significant {
        let asset_identifier = physical_file.storage_identifier.as_str();
        let mut canvas = Canvas::new(uris.canvas(&identifier, asset_identifier));
        if let Some(order_label) = physical_file
            .order_label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
        {
            canvas.label = Some(LanguageMap::none(order_label));
        }

        if physical_file.access_condition == Some(AccessCondition::Closed) {
            canvas.label = Some(LanguageMap::en("Closed"));
            canvas.summary = Some(LanguageMap::en("This image is not currently available online"));
            manifest.items.push(canvas);
            continue;
        }

        match physical_file.family {
            AssetFamily::Image => {
                image_canvas(&mut canvas, physical_file, &identifier, uris);
                counts.image += 1;
            }
            AssetFamily::TimeBased => {
                if state.is_none() {
                    // An old-workflow AV manifestation has no ACCESS file
                    // group; its transcript lives in a sibling METS file,
                    // so a lone build cannot proceed.
                    let has_access_file = physical_file
                        .files
                        .iter()
                        .any(|stored| stored.use_role == FileUse::Access);
                    if !has_access_file {
                        return Err(IiifError::StateRequired(identifier));
                    }
                }
                time_based_canvas(manifest, &mut canvas, mets, physical_file, &identifier, uris);
                if let Some(state) = state.as_deref_mut() {
                    state.av.get_or_insert_with(AvState::default).canvas_count += 1;
                }
                counts.time_based += 1;
            }
            AssetFamily::File => {
                if mets.manifestation_type == "Monograph" {
                    born_digital_pdf_canvas(manifest, &mut canvas, physical_file, &identifier, uris);
                } else {
                    // A sibling transcript for an AV manifestation; hold it
                    // in state for the second pass. No canvas of its own.
                    let Some(state) = state.as_deref_mut() else {
                        return Err(IiifError::StateRequired(identifier));
                    };
                    state
                        .file
                        .get_or_insert_with(FileState::default)
                        .found_files
                        .push(physical_file.clone());
                    counts.file += 1;
                    continue;
                }
                counts.file += 1;
            }
        }
        manifest.items.push(canvas);
    }
    Ok(counts)
}

fn image_canvas(
    canvas: &mut Canvas,
    physical_file: &PhysicalFile,
    identifier: &str,
    uris: &UriPatterns,
) {
    let asset_identifier = physical_file.storage_identifier.as_str();
    let width = physical_file
        .asset_metadata
        .as_ref()
        .and_then(|m| m.image_width().ok())
        .unwrap_or(0);
    let height = physical_file
        .asset_metadata
        .as_ref()
        .and_then(|m| m.image_height().ok())
        .unwrap_or(0);
    if width > 0 && height > 0 {
        canvas.width = Some(width);
        canvas.height = Some(height);
    }

    let mut service = ExternalResource::new("ImageService2", uris.image_service(asset_identifier));
    service.profile = Some(IMAGE_2_PROFILE.to_string());
    let mut body = ExternalResource::new("Image", uris.static_image(asset_identifier));
    body.format = Some("image/jpeg".to_string());
    if width > 0 && height > 0 {
        body.width = Some(width);
        body.height = Some(height);
    }
    body.service.push(service);

    let mut page =
        AnnotationPage::new(uris.canvas_painting_annotation_page(identifier, asset_identifier));
    page.items.push(Annotation::painting(
        uris.canvas_painting_annotation(identifier, asset_identifier),
        AnnotationBody::Resource(body),
        Reference::canvas(&canvas.id),
    ));
    canvas.items.push(page);

    let mut thumb = ExternalResource::new("Image", uris.thumb_service(asset_identifier));
    thumb.format = Some("image/jpeg".to_string());
    canvas.thumbnail.push(thumb);

    if physical_file.relative_alto_path.is_some() {
        let mut alto = ExternalResource::new("Dataset", uris.mets_alto(identifier, asset_identifier));
        alto.format = Some("text/xml".to_string());
        alto.profile = Some("http://www.loc.gov/standards/alto/v3/alto.xsd".to_string());
        alto.label = Some(LanguageMap::none("METS-ALTO XML"));
        canvas.see_also.push(alto);

        let mut text_page =
            AnnotationPage::new(uris.canvas_text_annotation_page(identifier, asset_identifier));
        text_page.label = Some(match physical_file.order_label.as_deref() {
            Some(order_label) if !order_label.trim().is_empty() => {
                LanguageMap::en(format!("Text of page {order_label}"))
            }
            _ => LanguageMap::en("Text of this page"),
        });
        canvas.annotations.push(text_page);
    }
}

fn time_based_canvas(
    manifest: &mut Manifest,
    canvas: &mut Canvas,
    mets: &Manifestation,
    physical_file: &PhysicalFile,
    identifier: &str,
    uris: &UriPatterns,
) {
    let asset_identifier = physical_file.storage_identifier.as_str();
    let is_video = physical_file.file_type.as_deref() == Some("Video")
        || mets.manifestation_type == "Video";
    let is_audio = physical_file.file_type.as_deref() == Some("Audio")
        || mets.manifestation_type == "Audio";

    let mut duration = physical_file
        .asset_metadata
        .as_ref()
        .and_then(|m| m.duration().ok())
        .unwrap_or(0.0);
    if duration <= 0.0 {
        // Older workflow data often carries no usable dimensions; obvious
        // fakes keep the manifest valid until the source is improved.
        duration = 999.99;
    }
    canvas.duration = Some(duration);

    let mut video_size: Option<(i32, i32)> = None;
    if is_video {
        let width = physical_file
            .asset_metadata
            .as_ref()
            .and_then(|m| m.image_width().ok())
            .unwrap_or(0);
        let height = physical_file
            .asset_metadata
            .as_ref()
            .and_then(|m| m.image_height().ok())
            .unwrap_or(0);
        let size = if width <= 0 || height <= 0 {
            (999, 999)
        } else {
            (width, height)
        };
        canvas.width = Some(size.0);
        canvas.height = Some(size.1);
        video_size = Some(size);
    }

    let mut choice_items = Vec::new();
    if let Some(size) = video_size {
        let (width, height) = confine(1280, 720, size.0, size.1);
        for (extension, format, label) in
            [("mp4", "video/mp4", "MP4"), ("webm", "video/webm", "WebM")]
        {
            let mut video = ExternalResource::new("Video", uris.av(asset_identifier, extension));
            video.format = Some(format.to_string());
            video.label = Some(LanguageMap::en(label));
            video.duration = Some(duration);
            video.width = Some(width);
            video.height = Some(height);
            choice_items.push(video);
        }
    } else if is_audio {
        let mut audio = ExternalResource::new("Sound", uris.av(asset_identifier, "mp3"));
        audio.format = Some("audio/mp3".to_string());
        audio.label = Some(LanguageMap::en("MP3"));
        audio.duration = Some(duration);
        choice_items.push(audio);
    }

    if !choice_items.is_empty() {
        let body = if choice_items.len() == 1 {
            AnnotationBody::Resource(choice_items.remove(0))
        } else {
            AnnotationBody::Choice(Choice::new(choice_items))
        };
        let mut page =
            AnnotationPage::new(uris.canvas_painting_annotation_page(identifier, asset_identifier));
        page.items.push(Annotation::painting(
            uris.canvas_painting_annotation(identifier, asset_identifier),
            body,
            Reference::canvas(&canvas.id),
        ));
        canvas.items.push(page);

        add_poster_canvas(manifest, identifier, asset_identifier, uris);

        let transcript = physical_file
            .files
            .iter()
            .find(|stored| stored.use_role == FileUse::Transcript);
        if let Some(transcript) = transcript {
            let metadata = page_count_metadata(physical_file);
            add_supplementing_pdf(
                canvas,
                identifier,
                transcript,
                "transcript",
                "PDF Transcript",
                metadata,
                uris,
            );
        }
    }
}

fn born_digital_pdf_canvas(
    manifest: &mut Manifest,
    canvas: &mut Canvas,
    physical_file: &PhysicalFile,
    identifier: &str,
    uris: &UriPatterns,
) {
    let Some(pdf) = physical_file.files.first() else {
        return;
    };
    let label = manifest.label.first().unwrap_or(identifier).to_string();
    let metadata = page_count_metadata(physical_file);
    if let Some(pair) = &metadata {
        manifest.metadata.push(pair.clone());
    }
    add_supplementing_pdf(canvas, identifier, pdf, "pdf", &label, metadata, uris);
    // The PDF is the whole work; paged behavior makes no sense for it.
    manifest.behavior.clear();
    let mut thumb = ExternalResource::new("Image", uris.pdf_thumbnail(identifier));
    thumb.format = Some("image/jpeg".to_string());
    manifest.thumbnail = vec![thumb];
}

fn page_count_metadata(physical_file: &PhysicalFile) -> Option<LabelValuePair> {
    let pages = physical_file
        .asset_metadata
        .as_ref()
        .and_then(|m| m.number_of_pages().ok())
        .filter(|pages| *pages > 0)?;
    Some(LabelValuePair {
        label: LanguageMap::en("Number of pages"),
        value: LanguageMap::none(pages.to_string()),
    })
}

fn add_supplementing_pdf(
    canvas: &mut Canvas,
    identifier: &str,
    pdf: &StoredFile,
    annotation_identifier: &str,
    label: &str,
    metadata: Option<LabelValuePair>,
    uris: &UriPatterns,
) {
    let mut body = ExternalResource::new("Text", uris.file(&pdf.storage_identifier));
    body.label = Some(LanguageMap::en(label));
    body.format = Some("application/pdf".to_string());
    if let Some(pair) = metadata {
        body.metadata.push(pair);
    }
    let mut page = AnnotationPage::new(
        uris.canvas_supplementing_annotation_page(identifier, &pdf.storage_identifier),
    );
    page.items.push(Annotation::supplementing(
        uris.canvas_supplementing_annotation(identifier, &pdf.storage_identifier, annotation_identifier),
        AnnotationBody::Resource(body),
        Reference::canvas(&canvas.id),
    ));
    canvas.annotations.push(page);
}

/// A placeholder canvas carrying the poster image shown before playback.
/// The served poster is 600 wide; the height is nominal.
fn add_poster_canvas(
    manifest: &mut Manifest,
    identifier: &str,
    asset_identifier: &str,
    uris: &UriPatterns,
) {
    let poster_asset = format!("poster-{asset_identifier}");
    let mut body = ExternalResource::new("Image", uris.poster_image(identifier));
    body.label = Some(LanguageMap::en("Poster Image"));
    body.format = Some("image/jpeg".to_string());

    let mut canvas = Canvas::new(uris.canvas(identifier, &poster_asset));
    canvas.label = Some(LanguageMap::en("Poster Image Canvas"));
    canvas.width = Some(600);
    canvas.height = Some(400);
    let mut page =
        AnnotationPage::new(uris.canvas_painting_annotation_page(identifier, &poster_asset));
    page.items.push(Annotation::painting(
        uris.canvas_painting_annotation(identifier, &poster_asset),
        AnnotationBody::Resource(body),
        Reference::canvas(&canvas.id),
    ));
    canvas.items.push(page);
    manifest.placeholder_canvas = Some(Box::new(canvas));
}

/// Builds the structural ranges. The root range is the manifest itself;
/// only its children appear as structures. An Archive wrapping a single
/// Manuscript over the same files collapses to the manuscript.
pub fn structures(
    manifest: &mut Manifest,
    mets: &Manifestation,
    filter: &dyn IgnoreAssetFilter,
    uris: &UriPatterns,
) -> IiifResult<()> {
    let identifier = mets.id.as_str().to_string();
    let phys_dict: HashMap<String, String> = mets
        .significant_sequence(filter)?
        .into_iter()
        .map(|file| (file.id.clone(), file.storage_identifier.clone()))
        .collect();
    let Some(root) = mets.root_struct_range()? else {
        return Ok(());
    };

    let parent_mods = mets.parent_section_metadata.as_ref();
    let mut built_root = range_from_struct(&identifier, &phys_dict, root, parent_mods, uris);
    if is_manuscript_structure(root) {
        built_root = convert_first_child_to_root(built_root);
    }

    manifest.structures = built_root
        .items
        .into_iter()
        .filter_map(|item| match item {
            RangeItem::Range(range) => Some(*range),
            RangeItem::Canvas(_) => None,
        })
        .collect();
    Ok(())
}

fn is_manuscript_structure(root: &StructRange) -> bool {
    root.range_type.as_deref() == Some("Archive")
        && root.children.len() == 1
        && root.children[0].range_type.as_deref() == Some("Manuscript")
        && root.children[0].physical_file_ids.len() == root.physical_file_ids.len()
}

fn convert_first_child_to_root(root: Range) -> Range {
    let label = root.label.clone();
    let first_child = root.items.into_iter().find_map(|item| match item {
        RangeItem::Range(range) => Some(*range),
        RangeItem::Canvas(_) => None,
    });
    match first_child {
        Some(mut child) => {
            child.label = label;
            child
        }
        None => Range {
            label,
            ..Range::new(String::new())
        },
    }
}

fn range_from_struct(
    identifier: &str,
    phys_dict: &HashMap<String, String>,
    struct_range: &StructRange,
    parent_mods: Option<&SectionMetadata>,
    uris: &UriPatterns,
) -> Range {
    let range_identifier = struct_range.id.as_deref().unwrap_or("root");
    let mut range = Range::new(uris.range(identifier, range_identifier));

    // Periodical issues keep some of their security metadata at the
    // volume level; fold it in before deriving anything from it.
    let mut effective_mods = struct_range.section_metadata.clone();
    if struct_range.range_type.as_deref() == Some("PeriodicalIssue") {
        if let (Some(section), Some(volume)) = (effective_mods.as_mut(), parent_mods) {
            merge_periodical_volume_data(section, volume);
        }
    }

    let raw_label = effective_mods
        .as_ref()
        .and_then(|mods| mods.title.as_deref())
        .or(struct_range.range_type.as_deref())
        .unwrap_or("-");
    range.label = Some(LanguageMap::none(friendly_section_label(raw_label)));

    // Only significant assets become canvas references.
    for physical_file_id in &struct_range.physical_file_ids {
        if let Some(storage_identifier) = phys_dict.get(physical_file_id) {
            range.items.push(RangeItem::Canvas(Reference::canvas(
                uris.canvas(identifier, storage_identifier),
            )));
        }
    }

    let mods_for_children = effective_mods.as_ref().or(parent_mods);
    for child in &struct_range.children {
        range.items.push(RangeItem::Range(Box::new(range_from_struct(
            identifier,
            phys_dict,
            child,
            mods_for_children,
            uris,
        ))));
    }
    range
}

/// Folds volume-level MODS into an issue's section metadata: access
/// condition when the issue's is open, license code (defaulting CC-BY-NC),
/// player options, record identifier.
pub fn merge_periodical_volume_data(section: &mut SectionMetadata, volume: &SectionMetadata) {
    if section.access_condition == AccessCondition::Open {
        section.access_condition = volume.access_condition;
    }
    if section
        .dz_license_code
        .as_deref()
        .is_none_or(|code| code.trim().is_empty())
    {
        section.dz_license_code = volume
            .dz_license_code
            .clone()
            .filter(|code| !code.trim().is_empty())
            .or_else(|| Some("CC-BY-NC".to_string()));
    }
    if section.player_options <= 0 {
        section.player_options = volume.player_options;
    }
    if section.record_identifier.is_none() {
        section.record_identifier = volume.record_identifier.clone();
    }
}

fn hint_for(condition: Option<AccessCondition>) -> &'static str {
    match condition {
        None | Some(AccessCondition::Open) => "open",
        Some(AccessCondition::RequiresRegistration) | Some(AccessCondition::OpenWithAdvisory) => {
            "clickthrough"
        }
        Some(_) => "credentials",
    }
}

/// A descriptor service telling clients what kind of access control to
/// expect, from the most secure condition anywhere in the sequence.
pub fn access_hint(manifest: &mut Manifest, mets: &Manifestation) -> IiifResult<()> {
    let most_secure = AccessCondition::most_secure(
        mets.sequence()?
            .iter()
            .filter_map(|file| file.access_condition),
    );
    let mut service = ExternalResource::new("Text", format!("{}#accesscontrolhints", manifest.id));
    service.profile = Some(ACCESS_CONTROL_HINTS_PROFILE.to_string());
    service.label = Some(LanguageMap::en(hint_for(most_secure)));
    manifest.services.push(service);
    Ok(())
}

/// Records copy/volume numbering so the second pass can group the package
/// into copy collections. A manifestation with a copy number cannot be
/// built alone.
pub fn check_for_copy_and_volume_structure(
    mets: &Manifestation,
    state: Option<&mut State>,
) -> IiifResult<()> {
    let Some(mods) = mets.section_metadata.as_ref() else {
        return Ok(());
    };
    let Some(copy_number) = mods.copy_number.value().filter(|n| *n > 0) else {
        return Ok(());
    };
    let Some(state) = state else {
        return Err(IiifError::StateRequired(mets.id.as_str().to_string()));
    };
    let id = mets.id.as_str().to_string();
    state
        .multi_copy
        .get_or_insert_with(MultiCopyState::default)
        .copy_and_volumes
        .insert(
            id.clone(),
            CopyAndVolume {
                id,
                copy_number,
                volume_number: mods.volume_number.value(),
            },
        );
    Ok(())
}

/// Collapses a multiple manifestation that is really one AV work (a video
/// plus a transcript in a sibling METS file) into a single manifest under
/// the package identifier.
pub fn process_av_state(
    results: &mut MultipleBuildResult,
    state: &State,
    uris: &UriPatterns,
) {
    if results.len() <= 1 {
        return;
    }
    let new_id = results.identifier.clone();
    let all = results.take_all();
    let mut kept = None;
    let mut av_canvases: Vec<Canvas> = Vec::new();

    for mut result in all {
        let is_av = result
            .resource
            .as_ref()
            .and_then(|r| r.as_manifest())
            .is_some_and(|m| m.items.iter().any(|c| c.duration.unwrap_or(0.0) > 0.0));
        if !is_av {
            continue;
        }
        let old_id = result.id.clone();
        result.id = new_id.clone();
        if let Some(manifest) = result.resource.as_mut().and_then(|r| r.as_manifest_mut()) {
            manifest.id = manifest.id.replace(&old_id, &new_id);
            manifest.part_of.clear();
            for canvas in &mut manifest.items {
                if canvas.duration.unwrap_or(0.0) > 0.0 {
                    change_canvas_ids(canvas, &old_id, &new_id, false);
                    av_canvases.push(canvas.clone());
                }
            }
            if let Some(placeholder) = manifest.placeholder_canvas.as_deref_mut() {
                change_canvas_ids(placeholder, &old_id, &new_id, true);
            }
        }
        if kept.is_none() {
            kept = Some(result);
        }
    }

    let Some(mut kept) = kept else {
        return;
    };

    // Allocate sibling transcripts to the AV canvases in order. Anything
    // more complex arrives through the new workflow in a single METS file.
    if let Some(file_state) = &state.file {
        let mut transcripts: Vec<&PhysicalFile> = file_state
            .found_files
            .iter()
            .filter(|file| file.file_type.as_deref() == Some("Transcript"))
            .collect();
        if transcripts.is_empty() {
            transcripts = file_state.found_files.iter().collect();
        }
        for (index, transcript) in transcripts.iter().enumerate() {
            let (Some(canvas), Some(stored)) =
                (av_canvases.get_mut(index), transcript.files.first())
            else {
                break;
            };
            let metadata = page_count_metadata(transcript);
            add_supplementing_pdf(
                canvas,
                &new_id,
                stored,
                "transcript",
                "PDF Transcript",
                metadata,
                uris,
            );
        }
    }

    if let Some(manifest) = kept.resource.as_mut().and_then(|r| r.as_manifest_mut()) {
        manifest.items = av_canvases;
    }
    results.replace_all(vec![kept]);
}

fn change_canvas_ids(canvas: &mut Canvas, old_id: &str, new_id: &str, change_image_body: bool) {
    let old_path = format!("/{old_id}/");
    let new_path = format!("/{new_id}/");
    let swap = |value: &mut String| *value = value.replace(&old_path, &new_path);
    swap(&mut canvas.id);
    for page in &mut canvas.items {
        swap(&mut page.id);
        for annotation in &mut page.items {
            swap(&mut annotation.id);
            if let Some(target) = annotation.target.as_mut() {
                swap(&mut target.id);
            }
            if change_image_body {
                if let Some(AnnotationBody::Resource(body)) = annotation.body.as_mut() {
                    body.id = body.id.replace(old_id, new_id);
                }
            }
        }
    }
}

fn confine(max_width: i32, max_height: i32, width: i32, height: i32) -> (i32, i32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    (
        (width as f64 * scale).round() as i32,
        (height as f64 * scale).round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacks_common::AccessCondition;
    use stacks_mets::mods::PartNumber;

    fn mods() -> SectionMetadata {
        SectionMetadata {
            title: None,
            sub_title: None,
            classification: None,
            language: None,
            origin_date_display: None,
            origin_place: None,
            origin_publisher: None,
            physical_description: None,
            display_form: None,
            record_identifier: None,
            identifier: None,
            repository_name: None,
            access_condition: AccessCondition::Open,
            dz_license_code: None,
            player_options: 0,
            usage: None,
            volume_number: PartNumber::Absent,
            copy_number: PartNumber::Absent,
        }
    }

    #[test]
    fn confine_preserves_aspect_ratio() {
        assert_eq!(confine(1280, 720, 640, 480), (640, 480));
        assert_eq!(confine(1280, 720, 1920, 1080), (1280, 720));
        assert_eq!(confine(1280, 720, 720, 1280), (405, 720));
    }

    #[test]
    fn access_hints_by_condition() {
        assert_eq!(hint_for(None), "open");
        assert_eq!(hint_for(Some(AccessCondition::Open)), "open");
        assert_eq!(
            hint_for(Some(AccessCondition::RequiresRegistration)),
            "clickthrough"
        );
        assert_eq!(
            hint_for(Some(AccessCondition::OpenWithAdvisory)),
            "clickthrough"
        );
        assert_eq!(hint_for(Some(AccessCondition::Closed)), "credentials");
        assert_eq!(hint_for(Some(AccessCondition::Restricted)), "credentials");
    }

    #[test]
    fn periodical_merge_fills_gaps_only() {
        let mut issue = mods();
        let mut volume = mods();
        volume.access_condition = AccessCondition::Restricted;
        volume.dz_license_code = Some("A".to_string());
        volume.player_options = 9;
        volume.record_identifier = Some("vol-record".to_string());

        merge_periodical_volume_data(&mut issue, &volume);
        assert_eq!(issue.access_condition, AccessCondition::Restricted);
        assert_eq!(issue.dz_license_code.as_deref(), Some("A"));
        assert_eq!(issue.player_options, 9);
        assert_eq!(issue.record_identifier.as_deref(), Some("vol-record"));

        // An issue with its own values keeps them.
        let mut secured = mods();
        secured.access_condition = AccessCondition::Closed;
        secured.dz_license_code = Some("S".to_string());
        secured.player_options = 5;
        merge_periodical_volume_data(&mut secured, &volume);
        assert_eq!(secured.access_condition, AccessCondition::Closed);
        assert_eq!(secured.dz_license_code.as_deref(), Some("S"));
        assert_eq!(secured.player_options, 5);
    }

    #[test]
    fn periodical_merge_defaults_the_license_when_both_are_silent() {
        let mut issue = mods();
        let volume = mods();
        merge_periodical_volume_data(&mut issue, &volume);
        assert_eq!(issue.dz_license_code.as_deref(), Some("CC-BY-NC"));
    }
}
