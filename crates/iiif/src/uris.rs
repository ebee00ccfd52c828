//! The identifier patterns of every emitted resource.
//!
//! All ids are minted here so that tests and the second-pass rewrites have
//! a single place describing the URL space. Paths follow the public
//! presentation service layout; the scheme and host are configuration.

#[derive(Debug, Clone)]
pub struct UriPatterns {
    scheme_and_host: String,
}

impl UriPatterns {
    pub fn new(scheme_and_host: impl Into<String>) -> UriPatterns {
        let mut scheme_and_host = scheme_and_host.into();
        while scheme_and_host.ends_with('/') {
            scheme_and_host.pop();
        }
        UriPatterns { scheme_and_host }
    }

    fn at(&self, path: String) -> String {
        format!("{}{}", self.scheme_and_host, path)
    }

    pub fn manifest(&self, identifier: &str) -> String {
        self.at(format!("/presentation/{identifier}"))
    }

    pub fn collection(&self, identifier: &str) -> String {
        // Same URL space as manifests; the resource type disambiguates.
        self.manifest(identifier)
    }

    pub fn canvas(&self, identifier: &str, asset_identifier: &str) -> String {
        self.at(format!(
            "/presentation/{identifier}/canvases/{asset_identifier}"
        ))
    }

    pub fn canvas_painting_annotation_page(
        &self,
        identifier: &str,
        asset_identifier: &str,
    ) -> String {
        self.at(format!(
            "/presentation/{identifier}/canvases/{asset_identifier}/painting"
        ))
    }

    pub fn canvas_painting_annotation(&self, identifier: &str, asset_identifier: &str) -> String {
        self.at(format!(
            "/presentation/{identifier}/canvases/{asset_identifier}/painting/anno"
        ))
    }

    pub fn canvas_supplementing_annotation_page(
        &self,
        identifier: &str,
        asset_identifier: &str,
    ) -> String {
        self.at(format!(
            "/presentation/{identifier}/canvases/{asset_identifier}/supplementing"
        ))
    }

    pub fn canvas_supplementing_annotation(
        &self,
        identifier: &str,
        asset_identifier: &str,
        annotation_identifier: &str,
    ) -> String {
        self.at(format!(
            "/presentation/{identifier}/canvases/{asset_identifier}/supplementing/{annotation_identifier}"
        ))
    }

    pub fn range(&self, identifier: &str, range_identifier: &str) -> String {
        self.at(format!(
            "/presentation/{identifier}/ranges/{range_identifier}"
        ))
    }

    pub fn canvas_text_annotation_page(&self, identifier: &str, asset_identifier: &str) -> String {
        self.at(format!("/annotations/v3/{identifier}/{asset_identifier}/line"))
    }

    pub fn manifest_images_annotation_page(&self, identifier: &str) -> String {
        self.at(format!("/annotations/v3/{identifier}/images"))
    }

    pub fn manifest_all_annotation_page(&self, identifier: &str) -> String {
        self.at(format!("/annotations/v3/{identifier}/all/line"))
    }

    pub fn search_service(&self, identifier: &str) -> String {
        self.at(format!("/search/v1/{identifier}"))
    }

    pub fn autocomplete_service(&self, identifier: &str) -> String {
        self.at(format!("/autocomplete/v1/{identifier}"))
    }

    pub fn raw_text(&self, identifier: &str) -> String {
        self.at(format!("/text/v1/{identifier}"))
    }

    pub fn mets_alto(&self, identifier: &str, asset_identifier: &str) -> String {
        self.at(format!("/text/alto/{identifier}/{asset_identifier}"))
    }

    pub fn poster_image(&self, identifier: &str) -> String {
        self.at(format!("/thumbs/{identifier}"))
    }

    pub fn pdf(&self, identifier: &str) -> String {
        self.at(format!("/pdf/{identifier}"))
    }

    pub fn pdf_thumbnail(&self, identifier: &str) -> String {
        self.at(format!("/thumb/{identifier}"))
    }

    pub fn image_service(&self, asset_identifier: &str) -> String {
        self.at(format!("/image/{asset_identifier}"))
    }

    pub fn static_image(&self, asset_identifier: &str) -> String {
        format!(
            "{}/full/full/0/default.jpg",
            self.image_service(asset_identifier)
        )
    }

    pub fn thumb_service(&self, asset_identifier: &str) -> String {
        self.at(format!("/thumbs/{asset_identifier}"))
    }

    pub fn file(&self, asset_identifier: &str) -> String {
        self.at(format!("/file/{asset_identifier}"))
    }

    pub fn av(&self, asset_identifier: &str, extension: &str) -> String {
        self.at(format!("/av/{asset_identifier}.{extension}"))
    }
}
