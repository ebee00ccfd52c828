//! Friendly section labels and reading-order correction.
//!
//! METS section types are production-workflow vocabulary; ranges get the
//! labels a reader expects. The paging pass nudges a paged manifest into
//! natural reading order: back covers move to the end, and if a known
//! recto canvas sits at a verso position the canvas before it is flagged
//! non-paged so viewers offset the spread parity.

use crate::presentation::{Manifest, BEHAVIOR_NON_PAGED, BEHAVIOR_PAGED};

pub const FRONT_COVER: &str = "Front Cover";
pub const BACK_COVER: &str = "Back Cover";
pub const TITLE_PAGE: &str = "Title Page";
pub const TABLE_OF_CONTENTS: &str = "Table of Contents";
pub const PART_OF_WORK: &str = "Part of Work";

/// The reader-facing label for a METS section type. Unmapped types pass
/// through unchanged.
pub fn friendly_section_label(mets_label: &str) -> &str {
    match mets_label {
        "CoverFrontOutside" => FRONT_COVER,
        "CoverBackOutside" => BACK_COVER,
        "TitlePage" => TITLE_PAGE,
        "TableOfContents" => TABLE_OF_CONTENTS,
        "PartOfWork" => PART_OF_WORK,
        other => other,
    }
}

fn shift_element<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

fn range_position(manifest: &Manifest, range_id: &str) -> Option<usize> {
    manifest.structures.iter().position(|r| r.id == range_id)
}

fn canvas_position(manifest: &Manifest, canvas_id: &str) -> Option<usize> {
    manifest.items.iter().position(|c| c.id == canvas_id)
}

fn has_label(label: &Option<crate::presentation::LanguageMap>, expected: &str) -> bool {
    label
        .as_ref()
        .and_then(|map| map.first())
        .is_some_and(|value| value.trim() == expected)
}

/// Corrects the reading order of a paged manifest. Applies only when the
/// manifest declares the paged behavior and has structural ranges; running
/// it on its own output is a no-op.
pub fn improve_paging_sequence(manifest: &mut Manifest) {
    if !manifest.behavior.iter().any(|b| b == BEHAVIOR_PAGED) {
        return;
    }
    if manifest.structures.is_empty() {
        return;
    }

    // More than one back-cover range is possible; within each, canvases
    // are assumed to be in reading order already. Work from the end
    // backward so the last back cover lands last.
    let back_cover_ids: Vec<String> = manifest
        .structures
        .iter()
        .filter(|range| has_label(&range.label, BACK_COVER))
        .map(|range| range.id.clone())
        .collect();

    let mut required_range_pos = manifest.structures.len() - 1;
    let mut required_canvas_pos = manifest.items.len().saturating_sub(1);
    for range_id in back_cover_ids.iter().rev() {
        if let Some(current) = range_position(manifest, range_id) {
            if current != required_range_pos {
                shift_element(&mut manifest.structures, current, required_range_pos);
            }
            let canvas_ids: Vec<String> = manifest.structures[required_range_pos]
                .canvas_ids()
                .iter()
                .map(|id| id.to_string())
                .collect();
            for canvas_id in canvas_ids.iter().rev() {
                if let Some(current) = canvas_position(manifest, canvas_id) {
                    if current != required_canvas_pos {
                        shift_element(&mut manifest.items, current, required_canvas_pos);
                    }
                    required_canvas_pos = required_canvas_pos.saturating_sub(1);
                }
            }
            required_range_pos = required_range_pos.saturating_sub(1);
        }
    }

    // A recto anchor: the first canvas of a title-page range, else a
    // canvas literally labeled "1r".
    let mut known_recto: Option<String> = manifest
        .structures
        .iter()
        .find(|range| has_label(&range.label, TITLE_PAGE))
        .and_then(|range| range.canvas_ids().first().map(|id| id.to_string()));
    if known_recto.is_none() {
        known_recto = manifest
            .items
            .iter()
            .find(|canvas| has_label(&canvas.label, "1r"))
            .map(|canvas| canvas.id.clone());
    }
    let Some(known_recto) = known_recto else {
        return;
    };

    // Parity must be judged within the paged subsequence only.
    let paged_ids: Vec<&str> = manifest
        .items
        .iter()
        .filter(|canvas| !canvas.is_non_paged())
        .map(|canvas| canvas.id.as_str())
        .collect();
    let Some(recto_pos) = paged_ids.iter().position(|id| *id == known_recto) else {
        return;
    };
    if recto_pos % 2 == 0 {
        // Already at a recto offset.
        return;
    }
    if recto_pos > 0 {
        // We cannot safely move content between the cover and the title
        // page, so flag the preceding canvas and let the viewer offset
        // everything after it.
        let preceding = paged_ids[recto_pos - 1].to_string();
        if let Some(index) = canvas_position(manifest, &preceding) {
            manifest.items[index]
                .behavior
                .push(BEHAVIOR_NON_PAGED.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{
        Canvas, LanguageMap, Range, RangeItem, Reference, BEHAVIOR_PAGED,
    };

    fn canvas(id: &str, label: &str) -> Canvas {
        let mut canvas = Canvas::new(format!("https://iiif.test/presentation/b1/canvases/{id}"));
        canvas.label = Some(LanguageMap::none(label));
        canvas
    }

    fn range(id: &str, label: &str, canvas_ids: &[&str]) -> Range {
        let mut range = Range::new(format!("https://iiif.test/presentation/b1/ranges/{id}"));
        range.label = Some(LanguageMap::none(label));
        for canvas_id in canvas_ids {
            range.items.push(RangeItem::Canvas(Reference::canvas(
                format!("https://iiif.test/presentation/b1/canvases/{canvas_id}"),
            )));
        }
        range
    }

    fn paged_manifest() -> Manifest {
        // Back cover filed in the middle; title page starts at an odd
        // paged offset.
        let mut manifest = Manifest::new(
            "https://iiif.test/presentation/b1",
            LanguageMap::en("A paged work"),
        );
        manifest.behavior.push(BEHAVIOR_PAGED.to_string());
        manifest.items = vec![
            canvas("c0", "front cover"),
            canvas("c1", "i"),
            canvas("c4", "back cover"),
            canvas("c2", "title"),
            canvas("c3", "1"),
        ];
        manifest.structures = vec![
            range("r0", "Front Cover", &["c0"]),
            range("r1", "Back Cover", &["c4"]),
            range("r2", "Title Page", &["c2"]),
        ];
        manifest
    }

    #[test]
    fn friendly_labels_map_known_types_and_pass_through_the_rest() {
        assert_eq!(friendly_section_label("CoverBackOutside"), "Back Cover");
        assert_eq!(friendly_section_label("TitlePage"), "Title Page");
        assert_eq!(friendly_section_label("Chapter"), "Chapter");
    }

    #[test]
    fn back_cover_moves_to_the_end_of_ranges_and_canvases() {
        let mut manifest = paged_manifest();
        improve_paging_sequence(&mut manifest);

        let last_range = manifest.structures.last().expect("ranges");
        assert!(has_label(&last_range.label, BACK_COVER));
        let last_canvas = manifest.items.last().expect("canvases");
        assert!(last_canvas.id.ends_with("/c4"));
    }

    #[test]
    fn odd_positioned_title_page_flags_the_preceding_canvas() {
        let mut manifest = paged_manifest();
        improve_paging_sequence(&mut manifest);

        // After the back cover moved, the title page canvas sits at paged
        // position 2 among c0,c1,c2,c3 minus none; but positions 0..: c0
        // front, c1, c2 title. Title is at index 2, even, so nothing is
        // flagged here; force the odd case with an extra leaf.
        assert!(manifest.items.iter().all(|c| !c.is_non_paged()));

        let mut odd = paged_manifest();
        odd.items.insert(1, canvas("cx", "pastedown"));
        improve_paging_sequence(&mut odd);
        let flagged: Vec<&str> = odd
            .items
            .iter()
            .filter(|c| c.is_non_paged())
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0].ends_with("/c1"));
    }

    #[test]
    fn pass_is_idempotent() {
        let mut once = paged_manifest();
        once.items.insert(1, canvas("cx", "pastedown"));
        improve_paging_sequence(&mut once);
        let mut twice = once.clone();
        improve_paging_sequence(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn unpaged_manifests_are_untouched() {
        let mut manifest = paged_manifest();
        manifest.behavior.clear();
        let before = manifest.clone();
        improve_paging_sequence(&mut manifest);
        assert_eq!(manifest, before);
    }

    #[test]
    fn no_anchor_means_no_parity_correction() {
        let mut manifest = paged_manifest();
        manifest.structures.retain(|r| !has_label(&r.label, TITLE_PAGE));
        improve_paging_sequence(&mut manifest);
        assert!(manifest.items.iter().all(|c| !c.is_non_paged()));
    }
}
