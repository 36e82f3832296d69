//! Synchronous scripting bridge
//!
//! Query and mutation operations over the pipeline-owned DOM, addressed by
//! element id or a simple selector (`#id`, `.class`, `tag`). Mutations are
//! plain data edits; the caller decides when to re-render.

pub mod events;

pub use events::{DomEvent, EventHandler, EventRegistry, EventType};

use crate::renderer::dom::{Document, Node};

/// Snapshot of an element handed across the bridge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeElement {
    pub found: bool,
    pub tag_name: String,
    pub text_content: String,
    pub attributes: Vec<(String, String)>,
    pub child_count: usize,
}

impl BridgeElement {
    fn from_node(node: &Node) -> Self {
        let data = node.as_element();
        Self {
            found: true,
            tag_name: node.tag_name().to_string(),
            text_content: node.inner_text(),
            attributes: data.map(|d| d.attributes().to_vec()).unwrap_or_default(),
            child_count: node.children.len(),
        }
    }
}

/// Result of a bridge query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ok: bool,
    pub message: String,
    pub elements: Vec<BridgeElement>,
}

/// Result of a bridge mutation or event dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub ok: bool,
    pub message: String,
}

impl MutationResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: "OK".to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Find an element by id
pub fn query_by_id(document: &Document, id: &str) -> QueryResult {
    if id.is_empty() {
        return QueryResult {
            ok: false,
            message: "Empty id".to_string(),
            elements: Vec::new(),
        };
    }

    match document.root.find_by_id(id) {
        Some(node) => QueryResult {
            ok: true,
            message: "OK".to_string(),
            elements: vec![BridgeElement::from_node(node)],
        },
        None => QueryResult {
            ok: true,
            message: "Not found".to_string(),
            elements: Vec::new(),
        },
    }
}

/// Find the first element matching a simple selector
pub fn query_selector(document: &Document, selector: &str) -> QueryResult {
    if selector.is_empty() {
        return QueryResult {
            ok: false,
            message: "Empty selector".to_string(),
            elements: Vec::new(),
        };
    }

    let node = if let Some(id) = selector.strip_prefix('#') {
        document.root.find_by_id(id)
    } else if let Some(class_name) = selector.strip_prefix('.') {
        let mut matches = Vec::new();
        document.root.find_all_by_class(class_name, &mut matches);
        matches.first().copied()
    } else {
        document.root.find_first_by_tag(&selector.to_ascii_lowercase())
    };

    match node {
        Some(node) => QueryResult {
            ok: true,
            message: "OK".to_string(),
            elements: vec![BridgeElement::from_node(node)],
        },
        None => QueryResult {
            ok: true,
            message: "Not found".to_string(),
            elements: Vec::new(),
        },
    }
}

/// Find every element matching a simple selector, in document order
pub fn query_selector_all(document: &Document, selector: &str) -> QueryResult {
    if selector.is_empty() {
        return QueryResult {
            ok: false,
            message: "Empty selector".to_string(),
            elements: Vec::new(),
        };
    }

    let mut nodes: Vec<&Node> = Vec::new();
    if let Some(id) = selector.strip_prefix('#') {
        if let Some(node) = document.root.find_by_id(id) {
            nodes.push(node);
        }
    } else if let Some(class_name) = selector.strip_prefix('.') {
        document.root.find_all_by_class(class_name, &mut nodes);
    } else {
        document
            .root
            .find_all_by_tag(&selector.to_ascii_lowercase(), &mut nodes);
    }

    QueryResult {
        ok: true,
        message: "OK".to_string(),
        elements: nodes.iter().map(|n| BridgeElement::from_node(n)).collect(),
    }
}

/// Set an attribute on the element with the given id
pub fn set_attribute_by_id(
    document: &mut Document,
    id: &str,
    attribute: &str,
    value: &str,
) -> MutationResult {
    if id.is_empty() {
        return MutationResult::failed("Empty id");
    }
    if attribute.is_empty() {
        return MutationResult::failed("Empty attribute name");
    }

    match document.root.find_by_id_mut(id) {
        Some(node) => {
            if let Some(data) = node.as_element_mut() {
                data.set_attribute(attribute.to_ascii_lowercase(), value);
            }
            MutationResult::ok()
        }
        None => MutationResult::failed(format!("Element not found: {}", id)),
    }
}

/// Remove an attribute from the element with the given id
pub fn remove_attribute_by_id(document: &mut Document, id: &str, attribute: &str) -> MutationResult {
    if id.is_empty() {
        return MutationResult::failed("Empty id");
    }
    if attribute.is_empty() {
        return MutationResult::failed("Empty attribute name");
    }

    match document.root.find_by_id_mut(id) {
        Some(node) => {
            if let Some(data) = node.as_element_mut() {
                data.remove_attribute(&attribute.to_ascii_lowercase());
            }
            MutationResult::ok()
        }
        None => MutationResult::failed(format!("Element not found: {}", id)),
    }
}

/// Set one inline style property on the element with the given id. The
/// property may arrive camelCased (`backgroundColor`) or in CSS form
/// (`background-color`); it is merged into the `style` attribute.
pub fn set_style_by_id(
    document: &mut Document,
    id: &str,
    property: &str,
    value: &str,
) -> MutationResult {
    if id.is_empty() {
        return MutationResult::failed("Empty id");
    }
    if property.is_empty() {
        return MutationResult::failed("Empty style property");
    }

    let css_property = match normalize_style_property(property) {
        Some(p) => p,
        None => return MutationResult::failed(format!("Unsupported style property: {}", property)),
    };

    match document.root.find_by_id_mut(id) {
        Some(node) => {
            if let Some(data) = node.as_element_mut() {
                let existing = data.get_attribute("style").unwrap_or("").to_string();
                let merged = merge_inline_style(&existing, &css_property, value);
                data.set_attribute("style", merged);
            }
            MutationResult::ok()
        }
        None => MutationResult::failed(format!("Element not found: {}", id)),
    }
}

/// Replace the element's children with a single text node
pub fn set_text_by_id(document: &mut Document, id: &str, text: &str) -> MutationResult {
    if id.is_empty() {
        return MutationResult::failed("Empty id");
    }

    match document.root.find_by_id_mut(id) {
        Some(node) => {
            node.children.clear();
            node.children.push(Node::text(text));
            MutationResult::ok()
        }
        None => MutationResult::failed(format!("Element not found: {}", id)),
    }
}

/// Convert a camelCase or kebab-case property name to its CSS form.
/// Returns `None` for names with characters CSS identifiers cannot carry.
fn normalize_style_property(property: &str) -> Option<String> {
    if property.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        match ch {
            'A'..='Z' => {
                out.push('-');
                out.push(ch.to_ascii_lowercase());
            }
            'a'..='z' | '0'..='9' | '-' => out.push(ch),
            _ => return None,
        }
    }
    if out.starts_with('-') || out.contains("--") {
        return None;
    }
    Some(out)
}

/// Merge one property into an inline style string, replacing an existing
/// declaration in place and appending otherwise.
fn merge_inline_style(existing: &str, property: &str, value: &str) -> String {
    let mut parts: Vec<(String, String)> = existing
        .split(';')
        .filter_map(|part| {
            let (name, val) = part.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            Some((name, val.trim().to_string()))
        })
        .collect();

    match parts.iter_mut().find(|(name, _)| name == property) {
        Some(slot) => slot.1 = value.trim().to_string(),
        None => parts.push((property.to_string(), value.trim().to_string())),
    }

    parts
        .iter()
        .map(|(name, val)| format!("{}: {}", name, val))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::html::HtmlParser;

    fn document(html: &str) -> Document {
        HtmlParser::new().parse(html).unwrap()
    }

    #[test]
    fn test_query_by_id() {
        let doc = document(r#"<div id="main"><p>Hello</p></div>"#);
        let result = query_by_id(&doc, "main");
        assert!(result.ok);
        assert_eq!(result.elements.len(), 1);
        assert_eq!(result.elements[0].tag_name, "div");
        assert_eq!(result.elements[0].text_content, "Hello");
        assert_eq!(result.elements[0].child_count, 1);
    }

    #[test]
    fn test_query_by_id_not_found_is_ok() {
        let doc = document("<div></div>");
        let result = query_by_id(&doc, "missing");
        assert!(result.ok);
        assert_eq!(result.message, "Not found");
        assert!(result.elements.is_empty());
    }

    #[test]
    fn test_query_by_empty_id_fails() {
        let doc = document("<div></div>");
        let result = query_by_id(&doc, "");
        assert!(!result.ok);
    }

    #[test]
    fn test_query_selector_variants() {
        let doc = document(
            r#"<div id="a" class="box"><span class="box">x</span><p>y</p></div>"#,
        );

        assert_eq!(query_selector(&doc, "#a").elements[0].tag_name, "div");
        assert_eq!(query_selector(&doc, ".box").elements[0].tag_name, "div");
        assert_eq!(query_selector(&doc, "p").elements[0].tag_name, "p");
        assert_eq!(query_selector(&doc, "SPAN").elements[0].tag_name, "span");
    }

    #[test]
    fn test_query_selector_all_document_order() {
        let doc = document(
            r#"<div class="x">1</div><p class="x">2</p><span class="x">3</span>"#,
        );
        let result = query_selector_all(&doc, ".x");
        let tags: Vec<&str> = result.elements.iter().map(|e| e.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["div", "p", "span"]);
    }

    #[test]
    fn test_set_attribute_by_id() {
        let mut doc = document(r#"<div id="main"></div>"#);
        let result = set_attribute_by_id(&mut doc, "main", "Data-State", "ready");
        assert!(result.ok);

        let element = doc.root.find_by_id("main").unwrap().as_element().unwrap();
        assert_eq!(element.get_attribute("data-state"), Some("ready"));
    }

    #[test]
    fn test_remove_attribute_by_id() {
        let mut doc = document(r#"<div id="main" hidden="hidden"></div>"#);
        assert!(remove_attribute_by_id(&mut doc, "main", "hidden").ok);
        let element = doc.root.find_by_id("main").unwrap().as_element().unwrap();
        assert!(element.get_attribute("hidden").is_none());
    }

    #[test]
    fn test_mutations_fail_on_missing_element() {
        let mut doc = document("<div></div>");
        assert!(!set_attribute_by_id(&mut doc, "nope", "a", "b").ok);
        assert!(!set_style_by_id(&mut doc, "nope", "color", "red").ok);
        assert!(!set_text_by_id(&mut doc, "nope", "x").ok);
    }

    #[test]
    fn test_set_style_by_id_camel_case() {
        let mut doc = document(r#"<div id="main"></div>"#);
        assert!(set_style_by_id(&mut doc, "main", "backgroundColor", "red").ok);

        let element = doc.root.find_by_id("main").unwrap().as_element().unwrap();
        assert_eq!(element.get_attribute("style"), Some("background-color: red"));
    }

    #[test]
    fn test_set_style_by_id_merges_existing() {
        let mut doc = document(r#"<div id="main" style="color: blue; margin: 4px"></div>"#);
        assert!(set_style_by_id(&mut doc, "main", "color", "red").ok);

        let element = doc.root.find_by_id("main").unwrap().as_element().unwrap();
        assert_eq!(
            element.get_attribute("style"),
            Some("color: red; margin: 4px")
        );
    }

    #[test]
    fn test_set_style_rejects_bad_property() {
        let mut doc = document(r#"<div id="main"></div>"#);
        assert!(!set_style_by_id(&mut doc, "main", "color;injection", "red").ok);
        assert!(!set_style_by_id(&mut doc, "main", "", "red").ok);
    }

    #[test]
    fn test_set_text_by_id_replaces_children() {
        let mut doc = document(r#"<div id="main"><p>old</p><span>nodes</span></div>"#);
        assert!(set_text_by_id(&mut doc, "main", "new text").ok);

        let node = doc.root.find_by_id("main").unwrap();
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.inner_text(), "new text");
    }

    #[test]
    fn test_normalize_style_property() {
        assert_eq!(
            normalize_style_property("backgroundColor").as_deref(),
            Some("background-color")
        );
        assert_eq!(
            normalize_style_property("font-size").as_deref(),
            Some("font-size")
        );
        assert_eq!(normalize_style_property("color").as_deref(), Some("color"));
        assert_eq!(normalize_style_property("Color"), None);
        assert_eq!(normalize_style_property("background color"), None);
    }
}
