//! The interim born-digital metadata reader.
//!
//! Born-digital transfers are described with Archivematica PREMIS, but the
//! workflow around them is still settling; until it does, this reader only
//! commits to the transfer path and the mime type, both delegated to the
//! PREMIS reader. Everything else is an explicit capability gap rather than
//! a guessed answer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use xmltree::Element;

use crate::metadata::{AssetMetadata, RightsStatement};
use crate::premis::PremisMetadata;
use crate::pronom::PronomData;
use crate::{MetsError, MetsResult};

pub struct BornDigitalMetadata {
    premis: PremisMetadata,
}

impl BornDigitalMetadata {
    pub fn new(mets_root: Arc<Element>, adm_id: &str, pronom: Arc<PronomData>) -> BornDigitalMetadata {
        BornDigitalMetadata {
            premis: PremisMetadata::new(mets_root, adm_id, pronom),
        }
    }
}

impl AssetMetadata for BornDigitalMetadata {
    fn file_name(&self) -> MetsResult<Option<String>> {
        let original = self.premis.original_name()?;
        Ok(original
            .rsplit(['/', '\\'])
            .next()
            .map(|name| name.to_string()))
    }

    fn file_size(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("file size"))
    }

    fn format_name(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("format name"))
    }

    fn format_version(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("format version"))
    }

    fn pronom_key(&self) -> MetsResult<Option<String>> {
        self.premis.pronom_key()
    }

    fn asset_id(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("asset id"))
    }

    fn mime_type(&self) -> MetsResult<Option<String>> {
        self.premis.mime_type()
    }

    fn image_width(&self) -> MetsResult<i32> {
        Err(MetsError::NotSupported("image width"))
    }

    fn image_height(&self) -> MetsResult<i32> {
        Err(MetsError::NotSupported("image height"))
    }

    fn duration(&self) -> MetsResult<f64> {
        Err(MetsError::NotSupported("duration"))
    }

    fn display_duration(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("display duration"))
    }

    fn number_of_pages(&self) -> MetsResult<i32> {
        Err(MetsError::NotSupported("number of pages"))
    }

    fn rights_statement(&self) -> MetsResult<RightsStatement> {
        self.premis.rights_statement()
    }

    fn created_date(&self) -> MetsResult<Option<DateTime<Utc>>> {
        Err(MetsError::NotSupported("created date"))
    }

    fn original_name(&self) -> MetsResult<String> {
        self.premis.original_name()
    }
}
