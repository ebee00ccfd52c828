//! The resource model built from a logical struct map.
//!
//! A package resolves to either a [`Manifestation`] (one deliverable work)
//! or a [`Collection`] of them. Both take their identity and labels from
//! the div tree eagerly; the expensive sequence work lives behind the
//! manifestation's lazy bundle.

mod collection;
mod manifestation;
mod struct_range;

pub use collection::Collection;
pub use manifestation::Manifestation;
pub use struct_range::StructRange;

use crate::mods::SectionMetadata;
use crate::struct_div::{LogicalStructDiv, PERIODICAL_ISSUE};

/// What a package identifier resolved to.
#[derive(Debug)]
pub enum MetsResource {
    Collection(Collection),
    Manifestation(Box<Manifestation>),
}

impl MetsResource {
    pub fn id(&self) -> Option<&str> {
        match self {
            MetsResource::Collection(collection) => collection.id.as_deref(),
            MetsResource::Manifestation(manifestation) => Some(manifestation.id.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MetsResource::Collection(collection) => &collection.label,
            MetsResource::Manifestation(manifestation) => &manifestation.label,
        }
    }

    pub fn resource_type(&self) -> &str {
        match self {
            MetsResource::Collection(collection) => &collection.collection_type,
            MetsResource::Manifestation(manifestation) => &manifestation.manifestation_type,
        }
    }

    pub fn partial(&self) -> bool {
        match self {
            MetsResource::Collection(collection) => collection.partial,
            MetsResource::Manifestation(manifestation) => manifestation.partial,
        }
    }

    pub fn as_manifestation(&self) -> Option<&Manifestation> {
        match self {
            MetsResource::Manifestation(manifestation) => Some(manifestation),
            MetsResource::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            MetsResource::Collection(collection) => Some(collection),
            MetsResource::Manifestation(_) => None,
        }
    }

    pub fn into_manifestation(self) -> Option<Manifestation> {
        match self {
            MetsResource::Manifestation(manifestation) => Some(*manifestation),
            MetsResource::Collection(_) => None,
        }
    }
}

/// The display label for a div, preferring its section metadata. A
/// periodical issue composes its date and issue title; everything else
/// uses the MODS title, falling back to the div's own LABEL and TYPE.
pub(crate) fn derive_label(
    div: &LogicalStructDiv,
    metadata: Option<&SectionMetadata>,
) -> String {
    label_from_parts(
        div.div_type.as_deref(),
        div.label.as_deref(),
        metadata,
    )
}

fn label_from_parts(
    div_type: Option<&str>,
    div_label: Option<&str>,
    metadata: Option<&SectionMetadata>,
) -> String {
    let from_metadata = metadata.and_then(|mods| {
        if div_type == Some(PERIODICAL_ISSUE) {
            let issue = mods.display_title();
            let issue_is_useful = issue.chars().any(char::is_alphanumeric);
            let composed = match (mods.origin_date_display.as_deref(), issue_is_useful) {
                (Some(date), true) => format!("{date} (issue {issue})"),
                (Some(date), false) => date.to_string(),
                (None, true) => issue,
                (None, false) => "-".to_string(),
            };
            Some(composed)
        } else {
            Some(mods.display_title())
        }
    });

    from_metadata
        .filter(|label| !label.trim().is_empty())
        .or_else(|| {
            div_label
                .filter(|label| !label.trim().is_empty())
                .map(str::to_string)
        })
        .or_else(|| div_type.map(str::to_string))
        .unwrap_or_default()
}
