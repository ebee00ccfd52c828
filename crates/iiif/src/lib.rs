//! IIIF Presentation building.
//!
//! This crate turns the resources the METS layer produces into IIIF
//! Presentation v3 documents: a [`builder::IiifBuilder`] walks a package,
//! builds one manifest per manifestation (each succeeding or failing on its
//! own), and runs the special-state second passes that multi-copy and
//! multi-manifestation AV works need.
//!
//! The wire model in [`presentation`] is deliberately narrower than the
//! full Presentation specification; it covers what this pipeline emits.

pub mod builder;
pub mod catalogue;
pub mod licenses;
pub mod parts;
pub mod presentation;
pub mod state;
pub mod structure;
pub mod uris;
pub mod v2;

pub use builder::IiifBuilder;
pub use catalogue::{Catalogue, NullCatalogue, Work};
pub use presentation::{Collection, IiifResource, Manifest};
pub use state::{BuildOutcome, BuildResult, MultipleBuildResult, State};
pub use uris::UriPatterns;

/// Errors arising while building IIIF resources.
#[derive(Debug, thiserror::Error)]
pub enum IiifError {
    #[error(transparent)]
    Mets(#[from] stacks_mets::MetsError),

    /// Building this resource needs package-wide state that a single
    /// manifestation's METS cannot supply; retry through the batch build.
    #[error("state is required to build {0}")]
    StateRequired(String),

    #[error("catalogue lookup failed for {identifier}: {message}")]
    Catalogue { identifier: String, message: String },

    #[error("serialising IIIF output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cannot build IIIF resource: {0}")]
    Build(String),
}

pub type IiifResult<T> = Result<T, IiifError>;
