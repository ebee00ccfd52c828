//! Descriptive (MODS) section metadata.
//!
//! Each `dmdSec` wraps a MODS document describing a logical section: the
//! whole work, a periodical issue, a chapter. Cardinality matters here: a
//! METS file with more than one `accessCondition` of a given type is
//! malformed and parsing fails hard rather than picking one.

use chrono::{Datelike, Utc};
use xmltree::Element;

use stacks_common::AccessCondition;

use crate::xml::{ElementExt, METS_NS, MODS_NS, WT_NS};
use crate::{MetsError, MetsResult};

/// A volume or copy number, distinguishing "not present in the METS" from
/// any present value, zero included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartNumber {
    Absent,
    Present(i32),
}

impl PartNumber {
    pub fn value(&self) -> Option<i32> {
        match self {
            PartNumber::Absent => None,
            PartNumber::Present(n) => Some(*n),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, PartNumber::Present(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionMetadata {
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub classification: Option<String>,
    pub language: Option<String>,
    pub origin_date_display: Option<String>,
    pub origin_place: Option<String>,
    pub origin_publisher: Option<String>,
    pub physical_description: Option<String>,
    pub display_form: Option<String>,
    pub record_identifier: Option<String>,
    pub identifier: Option<String>,
    pub repository_name: Option<String>,
    pub access_condition: AccessCondition,
    pub dz_license_code: Option<String>,
    pub player_options: i32,
    pub usage: Option<String>,
    pub volume_number: PartNumber,
    pub copy_number: PartNumber,
}

/// Strips markup that catalogue records sometimes carry in titles.
fn text_only(value: Option<String>) -> Option<String> {
    let value = value?;
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for c in value.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    let trimmed = out.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn single_typed_condition<'a>(
    conditions: &[&'a Element],
    condition_type: &'static str,
) -> MetsResult<Option<&'a Element>> {
    let matching: Vec<&&Element> = conditions
        .iter()
        .filter(|e| e.attr("type") == Some(condition_type))
        .collect();
    if matching.len() > 1 {
        return Err(MetsError::DuplicateAccessCondition { condition_type });
    }
    Ok(matching.first().map(|e| **e))
}

fn part_number(mods: &Element, name: &str) -> MetsResult<PartNumber> {
    match mods.descendant_value(WT_NS, name) {
        None => Ok(PartNumber::Absent),
        Some(raw) => raw
            .trim()
            .parse()
            .map(PartNumber::Present)
            .map_err(|_| MetsError::InvalidValue {
                what: "part number",
                value: raw,
            }),
    }
}

impl SectionMetadata {
    /// Parses the MODS document wrapped by a `dmdSec`.
    pub fn from_dmd_sec(dmd_sec: &Element) -> MetsResult<SectionMetadata> {
        let md_wrap = dmd_sec.single_descendant_with_attr(METS_NS, "mdWrap", "MDTYPE", "MODS")?;
        let mods = md_wrap
            .ns_child(METS_NS, "xmlData")
            .and_then(|data| {
                data.children
                    .iter()
                    .filter_map(xmltree::XMLNode::as_element)
                    .next()
            })
            .ok_or_else(|| MetsError::ElementNotFound {
                element: "mods",
                context: "dmdSec mdWrap has no xmlData content".to_string(),
            })?;

        let origin_publisher = mods
            .descendant_value(MODS_NS, "originPublisher")
            .or_else(|| mods.descendant_value(MODS_NS, "publisher"));

        let conditions = mods.ns_children(MODS_NS, "accessCondition");

        let access_condition = match single_typed_condition(&conditions, "status")? {
            Some(element) => {
                let raw = element.text_value().unwrap_or_default();
                match AccessCondition::parse(&raw) {
                    Some(condition) => condition,
                    None => {
                        if !raw.is_empty() {
                            tracing::warn!(value = %raw, "unrecognised access condition, treating as Open");
                        }
                        AccessCondition::Open
                    }
                }
            }
            None => AccessCondition::Open,
        };

        let dz_license_code =
            single_typed_condition(&conditions, "dz")?.and_then(|e| e.text_value());

        let player_options = match single_typed_condition(&conditions, "player")? {
            Some(element) => {
                let raw = element.text_value().unwrap_or_default();
                raw.trim().parse().map_err(|_| MetsError::InvalidValue {
                    what: "player options",
                    value: raw,
                })?
            }
            None => 0,
        };

        let usage = single_typed_condition(&conditions, "usage")?.and_then(|e| e.text_value());

        let repository_names: Vec<String> = {
            let mut seen = Vec::new();
            for note in mods.ns_descendants(MODS_NS, "note") {
                if note.attr("type") == Some("repository name") {
                    if let Some(value) = note.text_value() {
                        if !seen.contains(&value) {
                            seen.push(value);
                        }
                    }
                }
            }
            seen
        };
        let repository_name = if repository_names.is_empty() {
            None
        } else {
            Some(repository_names.join("; "))
        };

        Ok(SectionMetadata {
            title: text_only(mods.descendant_value(MODS_NS, "title")),
            sub_title: text_only(mods.descendant_value(MODS_NS, "subTitle")),
            classification: mods.descendant_value(MODS_NS, "classification"),
            language: mods.descendant_value(MODS_NS, "languageTerm"),
            origin_date_display: clean_display_date(mods),
            origin_place: mods.descendant_value(MODS_NS, "placeTerm"),
            origin_publisher,
            physical_description: mods.descendant_value(MODS_NS, "physicalDescription"),
            display_form: mods.descendant_value(MODS_NS, "displayForm"),
            record_identifier: mods.descendant_value(MODS_NS, "recordIdentifier"),
            identifier: mods.descendant_value(MODS_NS, "identifier"),
            repository_name,
            access_condition,
            dz_license_code,
            player_options,
            usage,
            volume_number: part_number(mods, "volumeNumber")?,
            copy_number: part_number(mods, "copyNumber")?,
        })
    }

    /// Title and subtitle run together, as catalogue display expects.
    pub fn display_title(&self) -> String {
        format!(
            "{}{}",
            self.title.as_deref().unwrap_or(""),
            self.sub_title.as_deref().unwrap_or("")
        )
    }
}

/// The first plausible `dateIssued`. Bare four-digit years more than a
/// decade in the future are catalogue placeholders, not dates.
fn clean_display_date(mods: &Element) -> Option<String> {
    let cutoff_year = Utc::now().year() + 10;
    for value in mods.descendant_values(MODS_NS, "dateIssued") {
        if value.len() == 4 {
            if let Ok(year) = value.parse::<i32>() {
                if year > cutoff_year {
                    continue;
                }
            }
        }
        return Some(value);
    }
    None
}
