//! The PRONOM format registry table.
//!
//! A JSON map of PRONOM keys ("fmt/43") to candidate mime types, loaded once
//! at process start and passed around as `Arc<PronomData>`. Some registry
//! entries list several comma-separated candidates; the table keeps the one
//! a viewer could actually paint, preferring image over video over audio
//! over text, and otherwise the first listed.

use std::collections::HashMap;
use std::path::Path;

use crate::{MetsError, MetsResult};

#[derive(Debug, Default)]
pub struct PronomData {
    format_map: HashMap<String, String>,
}

/// Picks the most paintable of a comma-separated candidate list.
fn best_candidate(raw: &str) -> Option<String> {
    let candidates: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    for prefix in ["image/", "video/", "audio/", "text/"] {
        if let Some(hit) = candidates.iter().find(|c| c.starts_with(prefix)) {
            return Some(hit.to_string());
        }
    }
    candidates.first().map(|c| c.to_string())
}

impl PronomData {
    pub fn load(path: &Path) -> MetsResult<PronomData> {
        let raw = std::fs::read_to_string(path)?;
        let de = &mut serde_json::Deserializer::from_str(&raw);
        let parsed: HashMap<String, String> =
            serde_path_to_error::deserialize(de).map_err(|e| MetsError::FormatTable {
                path: path.display().to_string(),
                message: format!("{} at {}", e.inner(), e.path()),
            })?;
        Ok(PronomData::from_map(parsed))
    }

    pub fn from_map(raw: HashMap<String, String>) -> PronomData {
        let format_map = raw
            .into_iter()
            .filter_map(|(key, value)| best_candidate(&value).map(|mime| (key, mime)))
            .collect();
        PronomData { format_map }
    }

    /// The mime type for a PRONOM key, if the registry knows the format.
    pub fn mime_type(&self, pronom_key: &str) -> Option<&str> {
        self.format_map.get(pronom_key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> PronomData {
        PronomData::from_map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn single_candidate_passes_through() {
        let data = table(&[("fmt/43", "image/jpeg")]);
        assert_eq!(data.mime_type("fmt/43"), Some("image/jpeg"));
    }

    #[test]
    fn paintable_candidate_beats_listed_order() {
        let data = table(&[("fmt/199", "application/mp4, video/mp4")]);
        assert_eq!(data.mime_type("fmt/199"), Some("video/mp4"));
    }

    #[test]
    fn image_outranks_other_paintables() {
        let data = table(&[("fmt/999", "video/x-test, image/tiff")]);
        assert_eq!(data.mime_type("fmt/999"), Some("image/tiff"));
    }

    #[test]
    fn unpaintable_lists_keep_the_first_entry() {
        let data = table(&[("x-fmt/111", "application/zip, application/x-tar")]);
        assert_eq!(data.mime_type("x-fmt/111"), Some("application/zip"));
    }

    #[test]
    fn blank_entries_are_dropped() {
        let data = table(&[("fmt/0", "  ")]);
        assert_eq!(data.mime_type("fmt/0"), None);
        assert_eq!(data.mime_type("fmt/unknown"), None);
    }

    #[test]
    fn load_reports_the_failing_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pronom_map.json");
        std::fs::write(&path, r#"{"fmt/43": 12}"#).expect("write table");
        let err = PronomData::load(&path).expect_err("bad value type");
        assert!(err.to_string().contains("fmt/43"));
    }
}
