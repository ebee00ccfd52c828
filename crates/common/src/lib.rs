//! Shared vocabulary for the stacks platform.
//!
//! Both the METS ingestion layer and the IIIF presentation layer need to
//! agree on what a package identifier looks like, what the access-condition
//! vocabulary is, and what a license code permits. Those types live here so
//! neither layer depends on the other.

pub mod access;
pub mod identifier;
pub mod player;

pub use access::AccessCondition;
pub use identifier::{IdentifierForm, PackageId, StorageType};
pub use player::{LicenseOptions, PlayerOptions};
