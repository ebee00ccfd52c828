//! Access to the stored files of a single work.
//!
//! A [`WorkStore`] hands out parsed METS documents and file information for
//! one package; a [`WorkStoreFactory`] resolves package identifiers to
//! stores. The filesystem implementation here backs the CLI and tests;
//! other backends implement the same traits.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use xmltree::Element;

use stacks_common::PackageId;

use crate::born_digital::BornDigitalMetadata;
use crate::metadata::AssetMetadata;
use crate::premis::PremisMetadata;
use crate::pronom::PronomData;
use crate::tessella::TessellaMetadata;
use crate::xml::{ElementExt, METS_NS, TESSELLA_NS};
use crate::{MetsError, MetsResult};

/// A parsed METS document and where it came from within the package.
#[derive(Debug, Clone)]
pub struct XmlSource {
    pub root: Arc<Element>,
    pub relative_path: String,
}

/// What a store knows about a file without opening it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFileInfo {
    pub relative_path: String,
    pub exists: bool,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: Option<u64>,
}

/// Data access for a single package.
#[async_trait(?Send)]
pub trait WorkStore {
    /// The package identifier this store serves.
    fn identifier(&self) -> &str;

    async fn load_xml_for_path(&self, relative_path: &str) -> MetsResult<XmlSource>;

    /// Loads the METS file conventionally named after an identifier.
    async fn load_xml_for_identifier(&self, identifier: &str) -> MetsResult<XmlSource> {
        self.load_xml_for_path(&format!("{identifier}.xml")).await
    }

    fn file_info_for_path(&self, relative_path: &str) -> StoredFileInfo;

    /// Builds the right metadata reader for an administrative metadata
    /// section. The dialect is decided once, here, from which substructure
    /// the document actually carries.
    fn make_asset_metadata(&self, mets_root: Arc<Element>, adm_id: &str)
        -> Arc<dyn AssetMetadata>;
}

/// Resolves package identifiers to their stores.
#[async_trait(?Send)]
pub trait WorkStoreFactory {
    async fn work_store(&self, package_identifier: &str) -> MetsResult<Arc<dyn WorkStore>>;
}

// ============================================================
// Filesystem implementation
// ============================================================

/// A package laid out as plain files in a directory, METS files named
/// `{identifier}.xml`.
pub struct FileSystemWorkStore {
    identifier: String,
    directory: PathBuf,
    pronom: Arc<PronomData>,
}

impl FileSystemWorkStore {
    pub fn new(
        identifier: impl Into<String>,
        directory: impl Into<PathBuf>,
        pronom: Arc<PronomData>,
    ) -> FileSystemWorkStore {
        FileSystemWorkStore {
            identifier: identifier.into(),
            directory: directory.into(),
            pronom,
        }
    }

    fn resolve(&self, relative_path: &str) -> PathBuf {
        self.directory.join(relative_path)
    }
}

#[async_trait(?Send)]
impl WorkStore for FileSystemWorkStore {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn load_xml_for_path(&self, relative_path: &str) -> MetsResult<XmlSource> {
        let path = self.resolve(relative_path);
        let raw = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MetsError::FileNotFound(relative_path.to_string())
            } else {
                MetsError::Io(e)
            }
        })?;
        let root = Element::parse(raw.as_slice())?;
        Ok(XmlSource {
            root: Arc::new(root),
            relative_path: relative_path.to_string(),
        })
    }

    fn file_info_for_path(&self, relative_path: &str) -> StoredFileInfo {
        match std::fs::metadata(self.resolve(relative_path)) {
            Ok(meta) => StoredFileInfo {
                relative_path: relative_path.to_string(),
                exists: true,
                last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                size: Some(meta.len()),
            },
            Err(_) => StoredFileInfo {
                relative_path: relative_path.to_string(),
                exists: false,
                last_modified: None,
                size: None,
            },
        }
    }

    fn make_asset_metadata(
        &self,
        mets_root: Arc<Element>,
        adm_id: &str,
    ) -> Arc<dyn AssetMetadata> {
        // Tessella sections are recognisable from the transfer-namespace
        // File element inside the matching techMD.
        let is_tessella = mets_root
            .descendants_with_attr(METS_NS, "techMD", "ID", adm_id)
            .iter()
            .any(|tech_md| !tech_md.ns_descendants(TESSELLA_NS, "File").is_empty());
        if is_tessella {
            return Arc::new(TessellaMetadata::new(mets_root, adm_id));
        }

        let package = PackageId::new(self.identifier.as_str());
        if package.has_b_number() {
            Arc::new(PremisMetadata::new(mets_root, adm_id, self.pronom.clone()))
        } else {
            Arc::new(BornDigitalMetadata::new(
                mets_root,
                adm_id,
                self.pronom.clone(),
            ))
        }
    }
}

/// Finds packages under a data directory: the package's own subdirectory
/// when one exists, the data directory itself otherwise.
pub struct FileSystemWorkStoreFactory {
    data_dir: PathBuf,
    pronom: Arc<PronomData>,
}

impl FileSystemWorkStoreFactory {
    pub fn new(data_dir: impl Into<PathBuf>, pronom: Arc<PronomData>) -> FileSystemWorkStoreFactory {
        FileSystemWorkStoreFactory {
            data_dir: data_dir.into(),
            pronom,
        }
    }

    fn package_dir(&self, package_identifier: &str) -> PathBuf {
        let safe = PackageId::new(package_identifier).path_element_safe();
        let subdir = self.data_dir.join(safe);
        if subdir.is_dir() {
            subdir
        } else {
            self.data_dir.clone()
        }
    }
}

#[async_trait(?Send)]
impl WorkStoreFactory for FileSystemWorkStoreFactory {
    async fn work_store(&self, package_identifier: &str) -> MetsResult<Arc<dyn WorkStore>> {
        let directory = self.package_dir(package_identifier);
        Ok(Arc::new(FileSystemWorkStore::new(
            package_identifier,
            directory,
            self.pronom.clone(),
        )))
    }
}
