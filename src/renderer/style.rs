//! Style computation and cascade
//!
//! For each element: collect matching rules from the merged sheet, order
//! winners per property by (specificity, source order), then apply the
//! element's inline `style` attribute on top. Inline declarations beat
//! every sheet rule, id selectors included. A fixed list of properties
//! inherits from the parent.

use super::css::{CssParser, Declaration, Selector, Stylesheet, Value};
use super::dom::ElementData;
use std::collections::HashMap;

/// Properties that inherit from the parent element
const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "font-size",
    "font-family",
    "line-height",
    "text-align",
    "text-transform",
];

/// Computed styles for an element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    properties: HashMap<String, Value>,
}

impl ComputedStyle {
    /// Get a property value
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    /// Set a property value
    pub fn set(&mut self, property: impl Into<String>, value: Value) {
        self.properties.insert(property.into(), value);
    }

    /// Pixel value of a property, with a fallback
    pub fn px(&self, property: &str, fallback: i32) -> i32 {
        self.get(property)
            .and_then(|v| v.to_px())
            .unwrap_or(fallback)
    }

    /// Keyword value of a property, lowercased, or empty
    pub fn keyword(&self, property: &str) -> String {
        self.get(property)
            .and_then(|v| v.as_keyword())
            .map(|k| k.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Whether this style hides the element entirely
    pub fn is_display_none(&self) -> bool {
        self.keyword("display") == "none"
    }

    /// The subset of properties a child inherits
    pub fn inheritable(&self) -> ComputedStyle {
        let mut inherited = ComputedStyle::default();
        for property in INHERITED_PROPERTIES {
            if let Some(value) = self.get(property) {
                inherited.set(*property, value.clone());
            }
        }
        inherited
    }
}

/// Whether a selector matches an element, using only the element's own
/// data (the supported subset has no combinators).
pub fn selector_matches(selector: &Selector, element: &ElementData) -> bool {
    if let Some(tag) = &selector.tag_name {
        if tag != &element.tag_name {
            return false;
        }
    }
    if let Some(id) = &selector.id {
        if element.id() != Some(id.as_str()) {
            return false;
        }
    }
    for class in &selector.classes {
        if !element.has_class(class) {
            return false;
        }
    }
    true
}

/// Style engine computing the cascade for single elements
pub struct StyleEngine {
    css_parser: CssParser,
}

/// Winner bookkeeping for one property
struct Winner {
    inline: bool,
    specificity: (u32, u32, u32),
    source_order: usize,
    value: Value,
}

impl Winner {
    fn outranked_by(&self, inline: bool, specificity: (u32, u32, u32), source_order: usize) -> bool {
        (inline, specificity, source_order) >= (self.inline, self.specificity, self.source_order)
    }
}

impl StyleEngine {
    /// Create a new style engine
    pub fn new() -> Self {
        Self {
            css_parser: CssParser::new(),
        }
    }

    /// Compute the style for one element given the merged sheet and the
    /// parent's computed style.
    pub fn compute_style(
        &self,
        element: &ElementData,
        stylesheet: &Stylesheet,
        inherited: &ComputedStyle,
    ) -> ComputedStyle {
        let mut winners: HashMap<String, Winner> = HashMap::new();
        let mut source_order = 0usize;

        for rule in &stylesheet.rules {
            // A rule applies once, with the specificity of its most
            // specific matching selector.
            let specificity = rule
                .selectors
                .iter()
                .filter(|s| selector_matches(s, element))
                .map(|s| s.specificity())
                .max();
            let specificity = match specificity {
                Some(s) => s,
                None => continue,
            };

            for declaration in &rule.declarations {
                apply_declaration(
                    &mut winners,
                    declaration,
                    false,
                    specificity,
                    source_order,
                );
                source_order += 1;
            }
        }

        if let Some(style_attr) = element.get_attribute("style") {
            for declaration in self.css_parser.parse_inline_style(style_attr) {
                apply_declaration(&mut winners, &declaration, true, (0, 0, 0), source_order);
                source_order += 1;
            }
        }

        let mut computed = inherited.clone();
        for (property, winner) in winners {
            computed.set(property, winner.value);
        }
        computed
    }
}

fn apply_declaration(
    winners: &mut HashMap<String, Winner>,
    declaration: &Declaration,
    inline: bool,
    specificity: (u32, u32, u32),
    source_order: usize,
) {
    if declaration.property.is_empty() {
        return;
    }
    let replace = match winners.get(&declaration.property) {
        Some(current) => current.outranked_by(inline, specificity, source_order),
        None => true,
    };
    if replace {
        winners.insert(
            declaration.property.clone(),
            Winner {
                inline,
                specificity,
                source_order,
                value: declaration.value.clone(),
            },
        );
    }
}

impl Default for StyleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::css::{Color, CssParser};

    fn element(tag: &str, attrs: &[(&str, &str)]) -> ElementData {
        let mut data = ElementData::new(tag);
        for (name, value) in attrs {
            data.set_attribute(*name, *value);
        }
        data
    }

    fn sheet(css: &str) -> Stylesheet {
        CssParser::new().parse(css).unwrap()
    }

    #[test]
    fn test_selector_matching() {
        let el = element("div", &[("id", "main"), ("class", "note active")]);

        let tag = crate::renderer::css::parse_selector("div").unwrap();
        assert!(selector_matches(&tag, &el));

        let wrong_tag = crate::renderer::css::parse_selector("span").unwrap();
        assert!(!selector_matches(&wrong_tag, &el));

        let compound = crate::renderer::css::parse_selector("div#main.note").unwrap();
        assert!(selector_matches(&compound, &el));

        let wrong_class = crate::renderer::css::parse_selector("div.missing").unwrap();
        assert!(!selector_matches(&wrong_class, &el));

        let universal = crate::renderer::css::parse_selector("*").unwrap();
        assert!(selector_matches(&universal, &el));
    }

    #[test]
    fn test_later_rule_wins_at_equal_specificity() {
        let engine = StyleEngine::new();
        let styles = sheet("p { color: red; } p { color: blue; }");
        let computed = engine.compute_style(
            &element("p", &[]),
            &styles,
            &ComputedStyle::default(),
        );
        assert_eq!(
            computed.get("color").unwrap().to_color(),
            Some(Color::rgb(0, 0, 255))
        );
    }

    #[test]
    fn test_higher_specificity_wins_over_order() {
        let engine = StyleEngine::new();
        let styles = sheet("#main { color: red; } p { color: blue; }");
        let computed = engine.compute_style(
            &element("p", &[("id", "main")]),
            &styles,
            &ComputedStyle::default(),
        );
        assert_eq!(
            computed.get("color").unwrap().to_color(),
            Some(Color::rgb(255, 0, 0))
        );
    }

    #[test]
    fn test_class_beats_type() {
        let engine = StyleEngine::new();
        let styles = sheet(".note { color: green; } p { color: blue; }");
        let computed = engine.compute_style(
            &element("p", &[("class", "note")]),
            &styles,
            &ComputedStyle::default(),
        );
        assert_eq!(
            computed.get("color").unwrap().to_color(),
            Some(Color::rgb(0, 128, 0))
        );
    }

    #[test]
    fn test_inline_style_wins_over_id_selector() {
        let engine = StyleEngine::new();
        let styles = sheet("#main { color: red; }");
        let computed = engine.compute_style(
            &element("p", &[("id", "main"), ("style", "color: blue")]),
            &styles,
            &ComputedStyle::default(),
        );
        assert_eq!(
            computed.get("color").unwrap().to_color(),
            Some(Color::rgb(0, 0, 255))
        );
    }

    #[test]
    fn test_inheritance_of_fixed_properties() {
        let engine = StyleEngine::new();
        let styles = sheet("div { color: red; font-size: 20px; margin: 8px; }");
        let parent = engine.compute_style(
            &element("div", &[]),
            &styles,
            &ComputedStyle::default(),
        );

        let inherited = parent.inheritable();
        let child = engine.compute_style(&element("span", &[]), &sheet(""), &inherited);

        // color and font-size inherit; margin does not
        assert_eq!(
            child.get("color").unwrap().to_color(),
            Some(Color::rgb(255, 0, 0))
        );
        assert_eq!(child.px("font-size", 16), 20);
        assert!(child.get("margin").is_none());
    }

    #[test]
    fn test_child_own_rule_overrides_inherited() {
        let engine = StyleEngine::new();
        let parent_style = {
            let mut style = ComputedStyle::default();
            style.set("color", Value::Color(Color::rgb(255, 0, 0)));
            style
        };
        let child = engine.compute_style(
            &element("span", &[]),
            &sheet("span { color: blue; }"),
            &parent_style.inheritable(),
        );
        assert_eq!(
            child.get("color").unwrap().to_color(),
            Some(Color::rgb(0, 0, 255))
        );
    }

    #[test]
    fn test_display_none_keyword() {
        let engine = StyleEngine::new();
        let computed = engine.compute_style(
            &element("div", &[("style", "display: none")]),
            &sheet(""),
            &ComputedStyle::default(),
        );
        assert!(computed.is_display_none());
    }

    #[test]
    fn test_px_helper_fallback() {
        let style = ComputedStyle::default();
        assert_eq!(style.px("width", 42), 42);
    }
}
