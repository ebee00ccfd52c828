//! IIIF Presentation v3 wire model.
//!
//! Serde structs for the subset of the Presentation API this pipeline
//! emits. Absent optional fields are omitted from the JSON, never written
//! as null; empty lists are likewise omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const PRESENTATION_3_CONTEXT: &str = "http://iiif.io/api/presentation/3/context.json";
pub const SEARCH_1_CONTEXT: &str = "http://iiif.io/api/search/1/context.json";
pub const SEARCH_1_PROFILE: &str = "http://iiif.io/api/search/1/search";
pub const AUTOCOMPLETE_1_PROFILE: &str = "http://iiif.io/api/search/1/autocomplete";
pub const IMAGE_2_PROFILE: &str = "http://iiif.io/api/image/2/level1.json";

pub const BEHAVIOR_PAGED: &str = "paged";
pub const BEHAVIOR_NON_PAGED: &str = "non-paged";

/// A language-keyed value map, the v3 form of every display string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageMap(pub BTreeMap<String, Vec<String>>);

impl LanguageMap {
    pub fn single(language: &str, value: impl Into<String>) -> LanguageMap {
        let mut map = BTreeMap::new();
        map.insert(language.to_string(), vec![value.into()]);
        LanguageMap(map)
    }

    pub fn en(value: impl Into<String>) -> LanguageMap {
        LanguageMap::single("en", value)
    }

    /// A value with no linguistic content, such as a page label.
    pub fn none(value: impl Into<String>) -> LanguageMap {
        LanguageMap::single("none", value)
    }

    pub fn push(&mut self, language: &str, value: impl Into<String>) {
        self.0
            .entry(language.to_string())
            .or_default()
            .push(value.into());
    }

    /// The first value in language order; what label comparisons key on.
    pub fn first(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|values| values.iter())
            .map(String::as_str)
            .next()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// A metadata entry: label and value, both language maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelValuePair {
    pub label: LanguageMap,
    pub value: LanguageMap,
}

impl LabelValuePair {
    pub fn en(label: &str, values: &[&str]) -> LabelValuePair {
        let mut value = LanguageMap::default();
        for v in values {
            value.push("en", *v);
        }
        LabelValuePair {
            label: LanguageMap::en(label),
            value,
        }
    }
}

/// A bare id/type reference to another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    pub id: String,
    #[serde(rename = "type")]
    pub reference_type: String,
}

impl Reference {
    pub fn canvas(id: impl Into<String>) -> Reference {
        Reference {
            id: id.into(),
            reference_type: "Canvas".to_string(),
        }
    }
}

/// A linked or embedded content resource: image bodies, renderings,
/// seeAlso datasets, profile-tagged descriptor services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<LabelValuePair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ExternalResource>,
}

impl ExternalResource {
    pub fn new(resource_type: &str, id: impl Into<String>) -> ExternalResource {
        ExternalResource {
            id: id.into(),
            resource_type: resource_type.to_string(),
            ..ExternalResource::default()
        }
    }
}

/// The Search 1 service block attached to searchable manifests, with its
/// nested autocomplete service. Search 1 keeps the v2-style `@id` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchService {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(rename = "@id")]
    pub id: String,
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Box<SearchService>>,
}

/// The body of a painting annotation: one resource, or a choice between
/// equivalent encodings of the same content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationBody {
    Choice(Choice),
    Resource(ExternalResource),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "type")]
    pub body_type: String,
    pub items: Vec<ExternalResource>,
}

impl Choice {
    pub fn new(items: Vec<ExternalResource>) -> Choice {
        Choice {
            body_type: "Choice".to_string(),
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    #[serde(rename = "type")]
    pub annotation_type: String,
    pub motivation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<AnnotationBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Reference>,
}

impl Annotation {
    pub fn painting(id: impl Into<String>, body: AnnotationBody, target: Reference) -> Annotation {
        Annotation {
            id: id.into(),
            annotation_type: "Annotation".to_string(),
            motivation: "painting".to_string(),
            body: Some(body),
            target: Some(target),
        }
    }

    pub fn supplementing(
        id: impl Into<String>,
        body: AnnotationBody,
        target: Reference,
    ) -> Annotation {
        Annotation {
            id: id.into(),
            annotation_type: "Annotation".to_string(),
            motivation: "supplementing".to_string(),
            body: Some(body),
            target: Some(target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPage {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Annotation>,
}

impl AnnotationPage {
    pub fn new(id: impl Into<String>) -> AnnotationPage {
        AnnotationPage {
            id: id.into(),
            page_type: "AnnotationPage".to_string(),
            label: None,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub id: String,
    #[serde(rename = "type")]
    pub canvas_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behavior: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<ExternalResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub see_also: Vec<ExternalResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<AnnotationPage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationPage>,
}

impl Canvas {
    pub fn new(id: impl Into<String>) -> Canvas {
        Canvas {
            id: id.into(),
            canvas_type: "Canvas".to_string(),
            label: None,
            summary: None,
            width: None,
            height: None,
            duration: None,
            behavior: Vec::new(),
            thumbnail: Vec::new(),
            see_also: Vec::new(),
            items: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn is_non_paged(&self) -> bool {
        self.behavior.iter().any(|b| b == BEHAVIOR_NON_PAGED)
    }
}

/// A structural range. Items are canvas references or nested ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub id: String,
    #[serde(rename = "type")]
    pub range_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<RangeItem>,
}

impl Range {
    pub fn new(id: impl Into<String>) -> Range {
        Range {
            id: id.into(),
            range_type: "Range".to_string(),
            label: None,
            items: Vec::new(),
        }
    }

    /// The canvas references directly inside this range, in order.
    pub fn canvas_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                RangeItem::Canvas(reference) => Some(reference.id.as_str()),
                RangeItem::Range(_) => None,
            })
            .collect()
    }
}

// Canvas must be tried first: a reference has only id and type, so a
// nested range (which carries label or items) never matches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeItem {
    Canvas(Reference),
    Range(Box<Range>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub manifest_type: String,
    pub label: LanguageMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<LabelValuePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_statement: Option<LabelValuePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behavior: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<ExternalResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rendering: Vec<ExternalResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub see_also: Vec<ExternalResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<SearchService>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ExternalResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_canvas: Option<Box<Canvas>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Canvas>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structures: Vec<Range>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationPage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub part_of: Vec<Reference>,
}

impl Manifest {
    pub fn new(id: impl Into<String>, label: LanguageMap) -> Manifest {
        Manifest {
            context: Some(PRESENTATION_3_CONTEXT.to_string()),
            id: id.into(),
            manifest_type: "Manifest".to_string(),
            label,
            summary: None,
            metadata: Vec::new(),
            required_statement: None,
            rights: None,
            behavior: Vec::new(),
            thumbnail: Vec::new(),
            rendering: Vec::new(),
            see_also: Vec::new(),
            service: Vec::new(),
            services: Vec::new(),
            placeholder_canvas: None,
            items: Vec::new(),
            structures: Vec::new(),
            annotations: Vec::new(),
            part_of: Vec::new(),
        }
    }
}

/// A collection entry: a reference to a child manifest or collection,
/// optionally labeled and thumbnailed, or a fully embedded sub-collection
/// (the multi-copy grouping emits those).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionItem {
    Reference(ResourceReference),
    Collection(Box<Collection>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ResourceReference {
    pub id: String,
    #[serde(rename = "type")]
    pub reference_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<ExternalResource>,
}

impl ResourceReference {
    pub fn manifest(id: impl Into<String>, label: LanguageMap) -> ResourceReference {
        ResourceReference {
            id: id.into(),
            reference_type: "Manifest".to_string(),
            label: Some(label),
            thumbnail: Vec::new(),
        }
    }

    pub fn collection(id: impl Into<String>, label: LanguageMap) -> ResourceReference {
        ResourceReference {
            id: id.into(),
            reference_type: "Collection".to_string(),
            label: Some(label),
            thumbnail: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub collection_type: String,
    pub label: LanguageMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<LabelValuePair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<CollectionItem>,
}

impl Collection {
    pub fn new(id: impl Into<String>, label: LanguageMap) -> Collection {
        Collection {
            context: Some(PRESENTATION_3_CONTEXT.to_string()),
            id: id.into(),
            collection_type: "Collection".to_string(),
            label,
            summary: None,
            metadata: Vec::new(),
            items: Vec::new(),
        }
    }

    /// A sub-collection carries no context of its own.
    pub fn embedded(id: impl Into<String>, label: LanguageMap) -> Collection {
        Collection {
            context: None,
            ..Collection::new(id, label)
        }
    }
}

/// What a build produced: a manifest or a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IiifResource {
    Manifest(Box<Manifest>),
    Collection(Box<Collection>),
}

impl IiifResource {
    pub fn id(&self) -> &str {
        match self {
            IiifResource::Manifest(manifest) => &manifest.id,
            IiifResource::Collection(collection) => &collection.id,
        }
    }

    pub fn as_manifest(&self) -> Option<&Manifest> {
        match self {
            IiifResource::Manifest(manifest) => Some(manifest),
            IiifResource::Collection(_) => None,
        }
    }

    pub fn as_manifest_mut(&mut self) -> Option<&mut Manifest> {
        match self {
            IiifResource::Manifest(manifest) => Some(manifest),
            IiifResource::Collection(_) => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            IiifResource::Collection(collection) => Some(collection),
            IiifResource::Manifest(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted_not_null() {
        let manifest = Manifest::new("https://iiif.example/presentation/b1", LanguageMap::en("A"));
        let json = serde_json::to_string(&manifest).expect("serialises");
        assert!(!json.contains("null"));
        assert!(!json.contains("rights"));
        assert!(json.contains("\"@context\""));
        assert!(json.contains("\"type\":\"Manifest\""));
    }

    #[test]
    fn language_map_first_value() {
        let mut label = LanguageMap::en("first");
        label.push("en", "second");
        assert_eq!(label.first(), Some("first"));
        assert!(LanguageMap::default().first().is_none());
    }

    #[test]
    fn range_items_round_trip_by_shape() {
        let mut range = Range::new("https://iiif.example/presentation/b1/ranges/r0");
        range.label = Some(LanguageMap::none("Front Cover"));
        range.items.push(RangeItem::Canvas(Reference::canvas(
            "https://iiif.example/presentation/b1/canvases/b1_0001.jp2",
        )));
        let mut child = Range::new("https://iiif.example/presentation/b1/ranges/r1");
        child.label = Some(LanguageMap::none("Chapter 1"));
        range.items.push(RangeItem::Range(Box::new(child)));

        let json = serde_json::to_string(&range).expect("serialises");
        let back: Range = serde_json::from_str(&json).expect("deserialises");
        assert_eq!(back, range);
        assert_eq!(back.canvas_ids().len(), 1);
    }

    #[test]
    fn collection_items_distinguish_references_from_embedded_collections() {
        let mut collection = Collection::new("https://iiif.example/presentation/b2", LanguageMap::en("Top"));
        collection.items.push(CollectionItem::Reference(
            ResourceReference::manifest("https://iiif.example/presentation/b2_0001", LanguageMap::en("Volume 1")),
        ));
        let mut copy = Collection::embedded(
            "https://iiif.example/presentation/b2/copy/2",
            LanguageMap::en("Copy 2"),
        );
        copy.items.push(CollectionItem::Reference(
            ResourceReference::manifest("https://iiif.example/presentation/b2_0002", LanguageMap::en("Volume 2")),
        ));
        collection.items.push(CollectionItem::Collection(Box::new(copy)));

        let json = serde_json::to_string(&collection).expect("serialises");
        let back: Collection = serde_json::from_str(&json).expect("deserialises");
        assert_eq!(back, collection);
        assert!(matches!(back.items[0], CollectionItem::Reference(_)));
        assert!(matches!(back.items[1], CollectionItem::Collection(_)));
    }
}
