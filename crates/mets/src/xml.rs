//! The METS vocabulary and low-level access to parsed documents.
//!
//! Everything here works in terms of namespace URIs, not prefixes, so it is
//! indifferent to how a producing workflow chose to prefix its elements.
//! Accessors come in two flavours: `opt_*` return `Option` for data that is
//! genuinely allowed to be absent, `required_*` fail with an error naming
//! the element and attribute involved.

use xmltree::{Element, XMLNode};

use crate::{MetsError, MetsResult};

pub const METS_NS: &str = "http://www.loc.gov/METS/";
pub const MODS_NS: &str = "http://www.loc.gov/mods/v3";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const PREMIS_NS: &str = "http://www.loc.gov/premis/v3";
pub const TESSELLA_NS: &str = "http://www.tessella.com/transfer";
pub const FITS_NS: &str = "http://hul.harvard.edu/ois/xml/ns/fits/fits_output";
pub const MEDIAINFO_NS: &str = "https://mediaarea.net/mediainfo";
/// Copy and volume number extension elements.
pub const WT_NS: &str = "http://wellcome.ac.uk/";

/// Namespace-aware helpers over [`xmltree::Element`].
pub trait ElementExt {
    /// Direct child elements in a namespace with a local name.
    fn ns_children(&self, ns: &str, name: &str) -> Vec<&Element>;

    /// First direct child in a namespace with a local name.
    fn ns_child(&self, ns: &str, name: &str) -> Option<&Element>;

    /// All nested elements, depth first, self excluded.
    fn descendants(&self) -> Vec<&Element>;

    /// Nested elements in a namespace with a local name.
    fn ns_descendants(&self, ns: &str, name: &str) -> Vec<&Element>;

    /// Concatenated text content of the first matching descendant,
    /// `None` if no such element or it is empty.
    fn descendant_value(&self, ns: &str, name: &str) -> Option<String>;

    /// Text values of every matching descendant, in document order.
    fn descendant_values(&self, ns: &str, name: &str) -> Vec<String>;

    /// An unprefixed attribute such as `ID` or `TYPE`.
    fn attr(&self, name: &str) -> Option<&str>;

    /// A namespaced attribute such as `xlink:href`, matched by URI with a
    /// prefix fallback for documents that never declare the namespace.
    fn ns_attr(&self, ns: &str, prefix: &str, name: &str) -> Option<&str>;

    fn required_attr(&self, name: &'static str) -> MetsResult<&str>;

    fn required_ns_attr(&self, ns: &str, prefix: &str, name: &'static str) -> MetsResult<&str>;

    /// Text of the element itself, trimmed, `None` when blank.
    fn text_value(&self) -> Option<String>;

    /// The single descendant with `attribute=value`; an error names the
    /// element if there are none or several.
    fn single_descendant_with_attr<'a>(
        &'a self,
        ns: &str,
        name: &'static str,
        attribute: &str,
        value: &str,
    ) -> MetsResult<&'a Element>;

    /// Every descendant with `attribute=value`, in document order.
    fn descendants_with_attr<'a>(
        &'a self,
        ns: &str,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> Vec<&'a Element>;
}

fn in_ns(element: &Element, ns: &str, name: &str) -> bool {
    element.name == name && element.namespace.as_deref() == Some(ns)
}

fn collect_descendants<'a>(element: &'a Element, into: &mut Vec<&'a Element>) {
    for node in &element.children {
        if let XMLNode::Element(child) = node {
            into.push(child);
            collect_descendants(child, into);
        }
    }
}

impl ElementExt for Element {
    fn ns_children(&self, ns: &str, name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter_map(XMLNode::as_element)
            .filter(|c| in_ns(c, ns, name))
            .collect()
    }

    fn ns_child(&self, ns: &str, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(XMLNode::as_element)
            .find(|c| in_ns(c, ns, name))
    }

    fn descendants(&self) -> Vec<&Element> {
        let mut all = Vec::new();
        collect_descendants(self, &mut all);
        all
    }

    fn ns_descendants(&self, ns: &str, name: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|e| in_ns(e, ns, name))
            .collect()
    }

    fn descendant_value(&self, ns: &str, name: &str) -> Option<String> {
        self.ns_descendants(ns, name)
            .first()
            .and_then(|e| e.text_value())
    }

    fn descendant_values(&self, ns: &str, name: &str) -> Vec<String> {
        self.ns_descendants(ns, name)
            .iter()
            .filter_map(|e| e.text_value())
            .collect()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.local_name == name && key.prefix.is_none())
            .map(|(_, value)| value.as_str())
    }

    fn ns_attr(&self, ns: &str, prefix: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| {
                key.local_name == name
                    && (key.namespace.as_deref() == Some(ns)
                        || key.prefix.as_deref() == Some(prefix))
            })
            .map(|(_, value)| value.as_str())
    }

    fn required_attr(&self, name: &'static str) -> MetsResult<&str> {
        self.attr(name).ok_or_else(|| MetsError::AttributeNotFound {
            element: self.name.clone(),
            attribute: name,
        })
    }

    fn required_ns_attr(&self, ns: &str, prefix: &str, name: &'static str) -> MetsResult<&str> {
        self.ns_attr(ns, prefix, name)
            .ok_or_else(|| MetsError::AttributeNotFound {
                element: self.name.clone(),
                attribute: name,
            })
    }

    fn text_value(&self) -> Option<String> {
        let text = self
            .children
            .iter()
            .filter_map(XMLNode::as_text)
            .collect::<String>();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn single_descendant_with_attr<'a>(
        &'a self,
        ns: &str,
        name: &'static str,
        attribute: &str,
        value: &str,
    ) -> MetsResult<&'a Element> {
        let matches = self.descendants_with_attr(ns, name, attribute, value);
        match matches.len() {
            1 => Ok(matches[0]),
            0 => Err(MetsError::ElementNotFound {
                element: name,
                context: format!("{attribute}={value}"),
            }),
            n => Err(MetsError::NotSingle {
                element: name,
                context: format!("{attribute}={value}"),
                count: n,
            }),
        }
    }

    fn descendants_with_attr<'a>(
        &'a self,
        ns: &str,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> Vec<&'a Element> {
        self.ns_descendants(ns, name)
            .into_iter()
            .filter(|e| e.attr(attribute) == Some(value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <mets:mets xmlns:mets="http://www.loc.gov/METS/"
                   xmlns:xlink="http://www.w3.org/1999/xlink">
          <mets:structMap TYPE="LOGICAL">
            <mets:div ID="LOG_0000" TYPE="Monograph" LABEL="A book">
              <mets:mptr xlink:href="b12345678_0001.xml"/>
            </mets:div>
          </mets:structMap>
          <mets:structMap TYPE="PHYSICAL">
            <mets:div ID="PHYS" TYPE="physSequence"/>
          </mets:structMap>
        </mets:mets>"#;

    fn parse() -> Element {
        Element::parse(DOC.as_bytes()).expect("well formed document")
    }

    #[test]
    fn finds_namespaced_descendants() {
        let root = parse();
        assert_eq!(root.ns_descendants(METS_NS, "structMap").len(), 2);
        assert_eq!(root.ns_descendants(METS_NS, "div").len(), 2);
        assert!(root.ns_descendants(MODS_NS, "div").is_empty());
    }

    #[test]
    fn single_descendant_with_attr_requires_exactly_one() {
        let root = parse();
        let logical = root
            .single_descendant_with_attr(METS_NS, "structMap", "TYPE", "LOGICAL")
            .expect("one logical structMap");
        assert_eq!(logical.ns_children(METS_NS, "div").len(), 1);

        let err = root
            .single_descendant_with_attr(METS_NS, "structMap", "TYPE", "MISSING")
            .expect_err("no such structMap");
        assert!(matches!(err, MetsError::ElementNotFound { .. }));
    }

    #[test]
    fn xlink_attributes_resolve_by_namespace() {
        let root = parse();
        let mptr = root.ns_descendants(METS_NS, "mptr")[0];
        assert_eq!(
            mptr.ns_attr(XLINK_NS, "xlink", "href"),
            Some("b12345678_0001.xml")
        );
        assert_eq!(mptr.attr("href"), None);
    }

    #[test]
    fn required_attr_names_the_element() {
        let root = parse();
        let div = root.ns_descendants(METS_NS, "div")[0];
        assert_eq!(div.required_attr("ID").expect("has ID"), "LOG_0000");
        let err = div.required_attr("ORDER").expect_err("no ORDER");
        assert!(err.to_string().contains("ORDER"));
    }
}
