//! The read-only catalogue boundary.
//!
//! Descriptive metadata for a package comes from a catalogue service keyed
//! by the package identifier. The builder treats it as optional enrichment:
//! a missing or failing catalogue yields a degraded but valid manifest.

use async_trait::async_trait;

use crate::presentation::{LabelValuePair, LanguageMap};
use crate::IiifResult;

/// A catalogue work record, flattened to what manifests display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Work {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub contributors: Vec<String>,
    pub production: Vec<String>,
    pub genres: Vec<String>,
    pub subjects: Vec<String>,
    pub notes: Vec<String>,
    /// A named physical repository holding the originals, when the work is
    /// not held by the library itself.
    pub location_of_original: Option<String>,
    pub reference_number: Option<String>,
}

impl Work {
    /// The display metadata entries for this work, in a fixed order.
    pub fn metadata_pairs(&self) -> Vec<LabelValuePair> {
        let groups: [(&str, &[String]); 5] = [
            ("Contributors", &self.contributors),
            ("Publication/creation", &self.production),
            ("Type/technique", &self.genres),
            ("Subjects", &self.subjects),
            ("Notes", &self.notes),
        ];
        let mut pairs = Vec::new();
        for (label, values) in groups {
            if values.is_empty() {
                continue;
            }
            let mut value = LanguageMap::default();
            for v in values {
                value.push("en", v);
            }
            pairs.push(LabelValuePair {
                label: LanguageMap::en(label),
                value,
            });
        }
        pairs
    }
}

/// Looks up works by a non-catalogue identifier such as a b number.
#[async_trait(?Send)]
pub trait Catalogue {
    async fn work_by_identifier(&self, identifier: &str) -> IiifResult<Option<Work>>;
}

/// A catalogue that knows nothing; builds proceed without descriptive
/// enrichment.
#[derive(Debug, Default)]
pub struct NullCatalogue;

#[async_trait(?Send)]
impl Catalogue for NullCatalogue {
    async fn work_by_identifier(&self, _identifier: &str) -> IiifResult<Option<Work>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_pairs_skip_empty_groups_and_keep_order() {
        let work = Work {
            contributors: vec!["Thompson, Silvanus P.".to_string()],
            subjects: vec!["Electricity".to_string(), "Magnetism".to_string()],
            ..Work::default()
        };
        let pairs = work.metadata_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].label.first(), Some("Contributors"));
        assert_eq!(pairs[1].label.first(), Some("Subjects"));
        assert_eq!(pairs[1].value.0["en"].len(), 2);
    }

    #[tokio::test]
    async fn null_catalogue_returns_nothing() {
        let catalogue = NullCatalogue;
        let work = catalogue
            .work_by_identifier("b12345678")
            .await
            .expect("lookup");
        assert!(work.is_none());
    }
}
