//! Legacy Tessella preservation metadata.
//!
//! A light wrapper over the Tessella transfer XML embedded in older METS
//! files. Only a subset of the capability surface exists in this dialect;
//! the rest answer with [`MetsError::NotSupported`].

use std::cell::OnceCell;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use xmltree::Element;

use crate::metadata::{AssetMetadata, RightsStatement};
use crate::xml::{ElementExt, METS_NS, TESSELLA_NS};
use crate::{MetsError, MetsResult};

pub struct TessellaMetadata {
    mets_root: Arc<Element>,
    adm_id: String,
    file_element: OnceCell<Option<Element>>,
}

impl TessellaMetadata {
    pub fn new(mets_root: Arc<Element>, adm_id: &str) -> TessellaMetadata {
        TessellaMetadata {
            mets_root,
            adm_id: adm_id.to_string(),
            file_element: OnceCell::new(),
        }
    }

    fn file_element(&self) -> MetsResult<&Element> {
        if self.file_element.get().is_none() {
            let tech_md = self.mets_root.single_descendant_with_attr(
                METS_NS,
                "techMD",
                "ID",
                &self.adm_id,
            )?;
            let file = tech_md
                .ns_descendants(METS_NS, "xmlData")
                .first()
                .and_then(|data| data.ns_child(TESSELLA_NS, "File"))
                .cloned();
            let _ = self.file_element.set(file);
        }
        self.file_element
            .get()
            .and_then(Option::as_ref)
            .ok_or_else(|| MetsError::ElementNotFound {
                element: "tessella:File",
                context: format!("techMD ID={}", self.adm_id),
            })
    }

    fn element_value(&self, name: &str) -> MetsResult<Option<String>> {
        Ok(self.file_element()?.descendant_value(TESSELLA_NS, name))
    }

    /// File properties are name/value element pairs under a shared parent.
    fn file_property(&self, property_name: &str) -> MetsResult<Option<String>> {
        let file = self.file_element()?;
        let mut holders = vec![file];
        holders.extend(file.descendants());
        for holder in holders {
            let name_matches = holder
                .ns_child(TESSELLA_NS, "FilePropertyName")
                .and_then(|e| e.text_value())
                .is_some_and(|v| v == property_name);
            if name_matches {
                return Ok(holder
                    .ns_child(TESSELLA_NS, "Value")
                    .and_then(|e| e.text_value()));
            }
        }
        Ok(None)
    }

    fn int_file_property(&self, property_name: &str) -> MetsResult<Option<i32>> {
        Ok(self
            .file_property(property_name)?
            .and_then(|v| v.trim().parse().ok()))
    }
}

impl AssetMetadata for TessellaMetadata {
    fn file_name(&self) -> MetsResult<Option<String>> {
        self.element_value("FileName")
    }

    fn file_size(&self) -> MetsResult<Option<String>> {
        self.element_value("FileSize")
    }

    fn format_name(&self) -> MetsResult<Option<String>> {
        self.element_value("FormatName")
    }

    fn format_version(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("format version"))
    }

    fn pronom_key(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("pronom key"))
    }

    fn asset_id(&self) -> MetsResult<Option<String>> {
        self.element_value("ID")
    }

    fn mime_type(&self) -> MetsResult<Option<String>> {
        Err(MetsError::NotSupported("mime type"))
    }

    fn image_width(&self) -> MetsResult<i32> {
        Ok(self.int_file_property("Image Width")?.unwrap_or(0))
    }

    fn image_height(&self) -> MetsResult<i32> {
        Ok(self.int_file_property("Image Height")?.unwrap_or(0))
    }

    fn duration(&self) -> MetsResult<f64> {
        Err(MetsError::NotSupported("duration"))
    }

    fn display_duration(&self) -> MetsResult<Option<String>> {
        self.file_property("Length In Seconds")
    }

    fn number_of_pages(&self) -> MetsResult<i32> {
        Ok(self.int_file_property("Number of Pages")?.unwrap_or(0))
    }

    fn rights_statement(&self) -> MetsResult<RightsStatement> {
        Err(MetsError::NotSupported("rights statement"))
    }

    fn created_date(&self) -> MetsResult<Option<DateTime<Utc>>> {
        Err(MetsError::NotSupported("created date"))
    }

    fn original_name(&self) -> MetsResult<String> {
        Err(MetsError::NotSupported("original name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tessella_mets() -> Arc<Element> {
        let doc = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"
                                xmlns:tessella="http://www.tessella.com/transfer">
          <mets:amdSec>
            <mets:techMD ID="AMD_0001">
              <mets:mdWrap MDTYPE="OTHER">
                <mets:xmlData>
                  <tessella:File>
                    <tessella:ID>1234</tessella:ID>
                    <tessella:FileName>0001.jp2</tessella:FileName>
                    <tessella:FileSize>204800</tessella:FileSize>
                    <tessella:FormatName>JPEG2000</tessella:FormatName>
                    <tessella:FileProperty>
                      <tessella:FilePropertyName>Image Width</tessella:FilePropertyName>
                      <tessella:Value>1850</tessella:Value>
                    </tessella:FileProperty>
                    <tessella:FileProperty>
                      <tessella:FilePropertyName>Image Height</tessella:FilePropertyName>
                      <tessella:Value>2480</tessella:Value>
                    </tessella:FileProperty>
                  </tessella:File>
                </mets:xmlData>
              </mets:mdWrap>
            </mets:techMD>
          </mets:amdSec>
        </mets:mets>"#;
        Arc::new(Element::parse(doc.as_bytes()).expect("well formed"))
    }

    #[test]
    fn reads_file_details_lazily() {
        let metadata = TessellaMetadata::new(tessella_mets(), "AMD_0001");
        assert_eq!(metadata.file_name().expect("ok").as_deref(), Some("0001.jp2"));
        assert_eq!(metadata.format_name().expect("ok").as_deref(), Some("JPEG2000"));
        assert_eq!(metadata.image_width().expect("ok"), 1850);
        assert_eq!(metadata.image_height().expect("ok"), 2480);
    }

    #[test]
    fn capability_gaps_fail_loudly() {
        let metadata = TessellaMetadata::new(tessella_mets(), "AMD_0001");
        assert!(matches!(
            metadata.mime_type(),
            Err(MetsError::NotSupported("mime type"))
        ));
        assert!(matches!(
            metadata.rights_statement(),
            Err(MetsError::NotSupported(_))
        ));
    }

    #[test]
    fn missing_tech_md_is_an_error() {
        let metadata = TessellaMetadata::new(tessella_mets(), "AMD_MISSING");
        assert!(metadata.file_name().is_err());
    }
}
