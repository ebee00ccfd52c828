//! Presentation 2 compatibility.
//!
//! Some consumers still speak the older API. Rather than maintaining a
//! second wire model, built version 3 resources are converted down to a
//! version 2 JSON rendition: label maps flatten to strings, canvases move
//! into a single sequence, and the required statement becomes the
//! attribution. The conversion is lossy on purpose; version 3 is the
//! source of truth.

use serde_json::{json, Value};

use crate::presentation::{AnnotationBody, Canvas, Collection, CollectionItem, Manifest};

pub const PRESENTATION_2_CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";

/// Version 2 resources live under their own path.
pub fn v2_id(v3_id: &str) -> String {
    v3_id.replacen("/presentation/", "/presentation/v2/", 1)
}

fn flat_label(label: &crate::presentation::LanguageMap) -> Value {
    match label.first() {
        Some(value) => json!(value),
        None => Value::Null,
    }
}

pub fn manifest_to_v2(manifest: &Manifest) -> Value {
    let mut out = json!({
        "@context": PRESENTATION_2_CONTEXT,
        "@id": v2_id(&manifest.id),
        "@type": "sc:Manifest",
        "label": flat_label(&manifest.label),
    });

    if let Some(statement) = &manifest.required_statement {
        out["attribution"] = flat_label(&statement.value);
    }
    if let Some(rights) = &manifest.rights {
        out["license"] = json!(rights);
    }
    if !manifest.metadata.is_empty() {
        out["metadata"] = Value::Array(
            manifest
                .metadata
                .iter()
                .map(|pair| {
                    json!({
                        "label": flat_label(&pair.label),
                        "value": flat_label(&pair.value),
                    })
                })
                .collect(),
        );
    }

    out["sequences"] = json!([{
        "@id": format!("{}/sequence/s0", v2_id(&manifest.id)),
        "@type": "sc:Sequence",
        "canvases": manifest.items.iter().map(canvas_to_v2).collect::<Vec<_>>(),
    }]);
    out
}

fn canvas_to_v2(canvas: &Canvas) -> Value {
    let mut out = json!({
        "@id": v2_id(&canvas.id),
        "@type": "sc:Canvas",
    });
    if let Some(label) = &canvas.label {
        out["label"] = flat_label(label);
    }
    if let Some(width) = canvas.width {
        out["width"] = json!(width);
    }
    if let Some(height) = canvas.height {
        out["height"] = json!(height);
    }

    let mut images = Vec::new();
    for page in &canvas.items {
        for annotation in &page.items {
            let Some(AnnotationBody::Resource(body)) = &annotation.body else {
                continue;
            };
            if body.resource_type != "Image" {
                continue;
            }
            let mut resource = json!({
                "@id": body.id,
                "@type": "dctypes:Image",
            });
            if let Some(format) = &body.format {
                resource["format"] = json!(format);
            }
            if let Some(width) = body.width {
                resource["width"] = json!(width);
            }
            if let Some(height) = body.height {
                resource["height"] = json!(height);
            }
            if let Some(service) = body.service.first() {
                resource["service"] = json!({
                    "@context": "http://iiif.io/api/image/2/context.json",
                    "@id": service.id,
                    "profile": service.profile,
                });
            }
            images.push(json!({
                "@id": v2_id(&annotation.id),
                "@type": "oa:Annotation",
                "motivation": "sc:painting",
                "resource": resource,
                "on": v2_id(&canvas.id),
            }));
        }
    }
    if !images.is_empty() {
        out["images"] = Value::Array(images);
    }
    out
}

pub fn collection_to_v2(collection: &Collection) -> Value {
    let mut out = json!({
        "@context": PRESENTATION_2_CONTEXT,
        "@id": v2_id(&collection.id),
        "@type": "sc:Collection",
        "label": flat_label(&collection.label),
    });
    let mut manifests = Vec::new();
    let mut collections = Vec::new();
    for item in &collection.items {
        match item {
            CollectionItem::Reference(reference) => {
                let entry = json!({
                    "@id": v2_id(&reference.id),
                    "@type": if reference.reference_type == "Collection" {
                        "sc:Collection"
                    } else {
                        "sc:Manifest"
                    },
                    "label": reference
                        .label
                        .as_ref()
                        .map(flat_label)
                        .unwrap_or(Value::Null),
                });
                if reference.reference_type == "Collection" {
                    collections.push(entry);
                } else {
                    manifests.push(entry);
                }
            }
            CollectionItem::Collection(embedded) => {
                collections.push(collection_to_v2(embedded));
            }
        }
    }
    if !collections.is_empty() {
        out["collections"] = Value::Array(collections);
    }
    if !manifests.is_empty() {
        out["manifests"] = Value::Array(manifests);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{
        Annotation, AnnotationPage, ExternalResource, LabelValuePair, LanguageMap, Reference,
    };

    fn v3_manifest() -> Manifest {
        let mut manifest = Manifest::new(
            "https://iiif.test/presentation/b12345678",
            LanguageMap::en("A short treatise"),
        );
        manifest.rights = Some("http://creativecommons.org/licenses/by-nc/4.0/".to_string());
        manifest.required_statement = Some(LabelValuePair {
            label: LanguageMap::en("Attribution and usage"),
            value: LanguageMap::en("Wellcome Collection"),
        });
        let mut canvas = Canvas::new("https://iiif.test/presentation/b12345678/canvases/c0");
        canvas.width = Some(1000);
        canvas.height = Some(1600);
        let mut body = ExternalResource::new(
            "Image",
            "https://iiif.test/image/c0/full/full/0/default.jpg",
        );
        body.format = Some("image/jpeg".to_string());
        let mut page =
            AnnotationPage::new("https://iiif.test/presentation/b12345678/canvases/c0/painting");
        page.items.push(Annotation::painting(
            "https://iiif.test/presentation/b12345678/canvases/c0/painting/anno",
            AnnotationBody::Resource(body),
            Reference::canvas(&canvas.id),
        ));
        canvas.items.push(page);
        manifest.items.push(canvas);
        manifest
    }

    #[test]
    fn v2_manifest_flattens_labels_and_rewrites_ids() {
        let v2 = manifest_to_v2(&v3_manifest());
        assert_eq!(
            v2["@id"],
            "https://iiif.test/presentation/v2/b12345678"
        );
        assert_eq!(v2["@type"], "sc:Manifest");
        assert_eq!(v2["label"], "A short treatise");
        assert_eq!(v2["attribution"], "Wellcome Collection");
        assert_eq!(
            v2["license"],
            "http://creativecommons.org/licenses/by-nc/4.0/"
        );

        let canvases = v2["sequences"][0]["canvases"].as_array().expect("canvases");
        assert_eq!(canvases.len(), 1);
        assert_eq!(canvases[0]["width"], 1000);
        let image = &canvases[0]["images"][0];
        assert_eq!(image["motivation"], "sc:painting");
        assert_eq!(
            image["on"],
            "https://iiif.test/presentation/v2/b12345678/canvases/c0"
        );
    }

    #[test]
    fn v2_collection_splits_manifests_from_collections() {
        let mut collection = Collection::new(
            "https://iiif.test/presentation/b19974760",
            LanguageMap::en("A work in volumes"),
        );
        collection.items.push(CollectionItem::Reference(
            crate::presentation::ResourceReference::manifest(
                "https://iiif.test/presentation/b19974760_1",
                LanguageMap::en("Volume 1"),
            ),
        ));
        let v2 = collection_to_v2(&collection);
        assert_eq!(v2["@type"], "sc:Collection");
        assert_eq!(v2["manifests"][0]["label"], "Volume 1");
        assert!(v2.get("collections").is_none());
    }
}
