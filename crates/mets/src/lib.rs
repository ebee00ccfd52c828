//! METS package ingestion.
//!
//! This crate reads the METS/MODS/PREMIS XML that digitisation workflows and
//! born-digital transfer processes produce, and models it as collections,
//! manifestations and physical files. The XML is held as a shared parsed
//! document; model nodes walk it lazily and never mutate it.
//!
//! The entry point is [`repository::MetsRepository`], which resolves a
//! package identifier to a [`model::MetsResource`] via a [`work_store`]
//! implementation.

pub mod born_digital;
pub mod ignore;
pub mod metadata;
pub mod model;
pub mod mods;
pub mod physical_file;
pub mod premis;
pub mod pronom;
pub mod repository;
pub mod struct_div;
pub mod tessella;
pub mod work_store;
pub mod xml;

pub use metadata::{AssetMetadata, RightsStatement};
pub use model::{Collection, Manifestation, MetsResource, StructRange};
pub use physical_file::{AssetFamily, FileUse, PhysicalFile, StoredFile};
pub use pronom::PronomData;
pub use repository::{ManifestationInContext, MetsRepository};
pub use work_store::{StoredFileInfo, WorkStore, WorkStoreFactory, XmlSource};

/// Errors arising while loading or interpreting a METS package.
#[derive(Debug, thiserror::Error)]
pub enum MetsError {
    #[error("I/O error reading package data: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML is not well formed: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("required element {element} not found ({context})")]
    ElementNotFound {
        element: &'static str,
        context: String,
    },

    #[error("expected exactly one {element} ({context}), found {count}")]
    NotSingle {
        element: &'static str,
        context: String,
        count: usize,
    },

    #[error("element {element} has no {attribute} attribute")]
    AttributeNotFound {
        element: String,
        attribute: &'static str,
    },

    #[error("document contains more than one accessCondition of type '{condition_type}'")]
    DuplicateAccessCondition { condition_type: &'static str },

    #[error("invalid value for {what}: {value}")]
    InvalidValue { what: &'static str, value: String },

    #[error("{0} is not available from this metadata dialect")]
    NotSupported(&'static str),

    #[error("div {id} has unrecognised TYPE '{div_type}'")]
    UnrecognisedDivType { id: String, div_type: String },

    #[error("cannot resolve identifier {0}")]
    UnknownIdentifier(String),

    #[error("no file found in this store for {0}")]
    FileNotFound(String),

    #[error("format table is unreadable at {path}: {message}")]
    FormatTable { path: String, message: String },
}

pub type MetsResult<T> = Result<T, MetsError>;
