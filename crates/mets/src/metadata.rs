//! The uniform surface over per-file technical metadata.
//!
//! A METS file points at technical metadata in one of several dialects
//! (PREMIS from Goobi or Archivematica, legacy Tessella, the born-digital
//! interim form). Each dialect implements [`AssetMetadata`]; a capability a
//! dialect cannot answer fails with [`MetsError::NotSupported`], which is a
//! different thing from the data being absent.

use chrono::{DateTime, Utc};

use crate::{MetsError, MetsResult};

/// A PREMIS rights statement attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RightsStatement {
    pub identifier: Option<String>,
    /// "License" or "Copyright"; anything else is rejected at parse time.
    pub basis: String,
    pub access_condition: String,
    pub statement: Option<String>,
    pub status: Option<String>,
}

/// Width, height and duration as far as the dialect can determine them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaDimensions {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<f64>,
    pub duration_display: Option<String>,
}

/// Technical metadata for one file, read from one XML subtree.
pub trait AssetMetadata {
    fn file_name(&self) -> MetsResult<Option<String>>;
    fn file_size(&self) -> MetsResult<Option<String>>;
    fn format_name(&self) -> MetsResult<Option<String>>;
    fn format_version(&self) -> MetsResult<Option<String>>;
    fn pronom_key(&self) -> MetsResult<Option<String>>;
    fn asset_id(&self) -> MetsResult<Option<String>>;
    fn mime_type(&self) -> MetsResult<Option<String>>;
    fn image_width(&self) -> MetsResult<i32>;
    fn image_height(&self) -> MetsResult<i32>;
    /// Duration in seconds, 0 when not determinable.
    fn duration(&self) -> MetsResult<f64>;
    fn display_duration(&self) -> MetsResult<Option<String>>;
    fn number_of_pages(&self) -> MetsResult<i32>;
    fn rights_statement(&self) -> MetsResult<RightsStatement>;
    fn created_date(&self) -> MetsResult<Option<DateTime<Utc>>>;
    /// The file's path within the transfer, with the transfer prefix
    /// stripped. Hard failure when the dialect requires the prefix and it
    /// is missing.
    fn original_name(&self) -> MetsResult<String>;

    fn not_supported(what: &'static str) -> MetsError
    where
        Self: Sized,
    {
        MetsError::NotSupported(what)
    }
}

fn digits_of(part: &str) -> String {
    part.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses a duration in seconds out of the assorted human-readable forms
/// found in EXIF-derived values: `22mn 49s`, `01:02:03`, `02:03`, `58s`,
/// or a plain number. Returns 0 when nothing parseable is found.
pub fn parse_duration(raw: &str) -> f64 {
    let test = raw.trim();
    if test.is_empty() {
        return 0.0;
    }

    if test.contains("mn") {
        // "22mn 49s" and friends; this format is very consistent.
        let mut parts = test.split_whitespace();
        let mins: f64 = parts
            .next()
            .map(|p| digits_of(p).parse().unwrap_or(0.0))
            .unwrap_or(0.0);
        let secs: f64 = parts
            .next()
            .map(|p| digits_of(p).parse().unwrap_or(0.0))
            .unwrap_or(0.0);
        return 60.0 * mins + secs;
    }

    if test.contains(':') {
        let parts: Vec<&str> = test.split(':').collect();
        if parts.len() == 2 || parts.len() == 3 {
            let parsed: Vec<Option<f64>> =
                parts.iter().map(|p| p.trim().parse::<f64>().ok()).collect();
            if parsed.iter().all(Option::is_some) {
                let mut total = 0.0;
                for value in parsed.into_iter().flatten() {
                    total = total * 60.0 + value;
                }
                if total > 0.0 {
                    return total;
                }
            }
        }
        return 0.0;
    }

    let test = test.strip_suffix('s').unwrap_or(test);
    test.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_and_seconds_form() {
        assert_eq!(parse_duration("22mn 49s"), 1369.0);
        assert_eq!(parse_duration("1mn 41s"), 101.0);
    }

    #[test]
    fn colon_forms() {
        assert_eq!(parse_duration("01:02:03"), 3723.0);
        assert_eq!(parse_duration("02:30"), 150.0);
        assert_eq!(parse_duration("not:a:time"), 0.0);
    }

    #[test]
    fn seconds_suffix_and_plain_numbers() {
        assert_eq!(parse_duration("58s"), 58.0);
        assert_eq!(parse_duration("12.5"), 12.5);
    }

    #[test]
    fn unparseable_values_are_zero() {
        assert_eq!(parse_duration(""), 0.0);
        assert_eq!(parse_duration("   "), 0.0);
        assert_eq!(parse_duration("soon"), 0.0);
    }
}
