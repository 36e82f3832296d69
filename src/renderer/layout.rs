//! Layout engine: block stacking with wrapped text runs
//!
//! Geometry is integer CSS pixels. `display:none` subtrees are pruned
//! before layout, so they never appear in the tree. Given identical DOM,
//! stylesheet, and viewport width, the layout tree is bit-exact.

use super::css::Stylesheet;
use super::dom::{Document, Node, NodeType};
use super::style::{ComputedStyle, StyleEngine};

/// Rectangle in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Edge sizes for padding, border, margin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeSizes {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl EdgeSizes {
    pub fn horizontal(&self) -> i32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

/// Box categories in the layout tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxType {
    Block,
    Inline,
    /// Box generated for bare text content, with no owning element
    Anonymous,
}

/// A wrapped line of text positioned within its box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub rect: Rect,
}

/// Layout box in the render tree
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub box_type: BoxType,
    /// Content rectangle
    pub rect: Rect,
    pub padding: EdgeSizes,
    pub border: EdgeSizes,
    pub margin: EdgeSizes,
    /// Owning element's tag name; `#text` for anonymous text boxes
    pub tag_name: String,
    pub text_runs: Vec<TextRun>,
    pub style: ComputedStyle,
    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    fn new(box_type: BoxType, tag_name: impl Into<String>, style: ComputedStyle) -> Self {
        Self {
            box_type,
            rect: Rect::default(),
            padding: EdgeSizes::default(),
            border: EdgeSizes::default(),
            margin: EdgeSizes::default(),
            tag_name: tag_name.into(),
            text_runs: Vec::new(),
            style,
            children: Vec::new(),
        }
    }

    /// Content plus padding
    pub fn padding_box(&self) -> Rect {
        Rect {
            x: self.rect.x - self.padding.left,
            y: self.rect.y - self.padding.top,
            width: self.rect.width + self.padding.horizontal(),
            height: self.rect.height + self.padding.vertical(),
        }
    }

    /// Content plus padding plus border
    pub fn border_box(&self) -> Rect {
        let padding = self.padding_box();
        Rect {
            x: padding.x - self.border.left,
            y: padding.y - self.border.top,
            width: padding.width + self.border.horizontal(),
            height: padding.height + self.border.vertical(),
        }
    }

    /// Full outer extent including margins
    pub fn margin_box(&self) -> Rect {
        let border = self.border_box();
        Rect {
            x: border.x - self.margin.left,
            y: border.y - self.margin.top,
            width: border.width + self.margin.horizontal(),
            height: border.height + self.margin.vertical(),
        }
    }
}

/// Layout engine for computing the layout tree
pub struct LayoutEngine {
    style_engine: StyleEngine,
}

impl LayoutEngine {
    /// Create a new layout engine
    pub fn new() -> Self {
        Self {
            style_engine: StyleEngine::new(),
        }
    }

    /// Lay out a document against a merged stylesheet at the given
    /// viewport width.
    pub fn layout_document(
        &self,
        document: &Document,
        stylesheet: &Stylesheet,
        viewport_width: i32,
    ) -> LayoutBox {
        let safe_width = viewport_width.max(0);
        let styled = self.build_styled_tree(&document.root, stylesheet, &ComputedStyle::default());

        let root = match styled {
            Some(node) => layout_node(&node, 0, 0, safe_width),
            None => LayoutBox::new(BoxType::Block, "#document", ComputedStyle::default()),
        };
        root
    }

    /// Build the pruned styled tree: `display:none` subtrees, comments,
    /// doctypes, and whitespace-only text vanish here.
    fn build_styled_tree(
        &self,
        node: &Node,
        stylesheet: &Stylesheet,
        inherited: &ComputedStyle,
    ) -> Option<StyledNode> {
        match &node.node_type {
            NodeType::Document => {
                let style = ComputedStyle::default();
                let children = self.build_children(node, stylesheet, &style);
                Some(StyledNode {
                    is_text: false,
                    tag: "#document".to_string(),
                    text: String::new(),
                    display: Display::Block,
                    style,
                    children,
                })
            }
            NodeType::Element(data) => {
                let style = self.style_engine.compute_style(data, stylesheet, inherited);
                let display = effective_display(&style, &data.tag_name);
                if display == Display::None {
                    return None;
                }
                let children = self.build_children(node, stylesheet, &style);
                Some(StyledNode {
                    is_text: false,
                    tag: data.tag_name.clone(),
                    text: String::new(),
                    display,
                    style,
                    children,
                })
            }
            NodeType::Text(text) => {
                if text.trim().is_empty() {
                    return None;
                }
                Some(StyledNode {
                    is_text: true,
                    tag: "#text".to_string(),
                    text: text.clone(),
                    display: Display::Inline,
                    style: inherited.clone(),
                    children: Vec::new(),
                })
            }
            NodeType::Comment(_) | NodeType::Doctype => None,
        }
    }

    fn build_children(
        &self,
        node: &Node,
        stylesheet: &Stylesheet,
        parent_style: &ComputedStyle,
    ) -> Vec<StyledNode> {
        let inherited = parent_style.inheritable();
        node.children
            .iter()
            .filter_map(|child| self.build_styled_tree(child, stylesheet, &inherited))
            .collect()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Display {
    Block,
    Inline,
    None,
}

struct StyledNode {
    is_text: bool,
    tag: String,
    text: String,
    display: Display,
    style: ComputedStyle,
    children: Vec<StyledNode>,
}

/// Resolve the display type: an explicit `display` property wins, else the
/// tag's default.
fn effective_display(style: &ComputedStyle, tag: &str) -> Display {
    match style.keyword("display").as_str() {
        "none" => return Display::None,
        "block" => return Display::Block,
        "inline" | "inline-block" => return Display::Inline,
        _ => {}
    }
    default_display(tag)
}

fn default_display(tag: &str) -> Display {
    match tag {
        "html" | "body" | "div" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol"
        | "li" | "form" | "header" | "footer" | "main" | "nav" | "section" | "article"
        | "aside" | "blockquote" | "pre" | "hr" | "address" | "figure" | "figcaption" => {
            Display::Block
        }
        "span" | "a" | "strong" | "em" | "b" | "i" | "u" | "code" | "small" | "sub" | "sup"
        | "label" | "abbr" | "cite" | "q" | "img" | "button" | "input" | "br" => Display::Inline,
        "head" | "meta" | "title" | "link" | "style" | "script" | "noscript" | "base" => {
            Display::None
        }
        _ => Display::Block,
    }
}

fn layout_node(node: &StyledNode, x: i32, y: i32, width: i32) -> LayoutBox {
    if node.is_text {
        layout_text_box(node, x, y, width)
    } else {
        layout_block_box(node, x, y, width)
    }
}

/// Lay out an element box: children stack vertically at the content edge.
/// `x`, `y`, `width` describe the border box handed down by the parent.
fn layout_block_box(node: &StyledNode, x: i32, y: i32, width: i32) -> LayoutBox {
    let box_type = if node.display == Display::Inline {
        BoxType::Inline
    } else {
        BoxType::Block
    };
    let mut layout_box = LayoutBox::new(box_type, node.tag.clone(), node.style.clone());
    layout_box.padding = edges_from_style(&node.style, "padding");
    layout_box.border = border_edges(&node.style);
    layout_box.margin = edges_from_style(&node.style, "margin");

    let mut content_width =
        width - layout_box.padding.horizontal() - layout_box.border.horizontal();
    content_width = apply_width_constraints(&node.style, content_width);

    let content_x = x + layout_box.border.left + layout_box.padding.left;
    let content_y = y + layout_box.border.top + layout_box.padding.top;

    let mut cursor_y = content_y;
    for child in &node.children {
        let child_margin = edges_from_style(&child.style, "margin");
        let child_x = content_x + child_margin.left;
        let child_y = cursor_y + child_margin.top;
        let child_width = (content_width - child_margin.horizontal()).max(0);

        let child_box = layout_node(child, child_x, child_y, child_width);
        cursor_y = child_y + child_box.border_box().height + child_margin.bottom;
        layout_box.children.push(child_box);
    }

    let mut content_height = (cursor_y - content_y).max(0);
    content_height = apply_height_constraints(&node.style, content_height);

    layout_box.rect = Rect {
        x: content_x,
        y: content_y,
        width: content_width.max(0),
        height: content_height,
    };
    layout_box
}

/// Lay out a text node: wrap into runs at word boundaries using the fixed
/// character-width approximation.
fn layout_text_box(node: &StyledNode, x: i32, y: i32, width: i32) -> LayoutBox {
    let mut layout_box = LayoutBox::new(BoxType::Anonymous, "#text", node.style.clone());

    let content_width = width.max(0);
    let metrics = TextMetrics::from_style(&node.style, content_width.max(1));
    let transformed = apply_text_transform(&node.text, &node.style);
    let lines = wrap_text_lines(&transformed, metrics.max_chars);
    let text_align = node.style.keyword("text-align");

    let mut cursor_y = y;
    for line in &lines {
        let line_width = (line.len() as i32 * metrics.char_width).min(content_width);
        let offset_x = match text_align.as_str() {
            "center" => ((content_width - line_width) / 2).max(0),
            "right" | "end" => (content_width - line_width).max(0),
            _ => 0,
        };
        layout_box.text_runs.push(TextRun {
            text: line.clone(),
            rect: Rect {
                x: x + offset_x,
                y: cursor_y,
                width: line_width,
                height: metrics.line_height,
            },
        });
        cursor_y += metrics.line_height;
    }

    let mut content_height = lines.len() as i32 * metrics.line_height;
    content_height = apply_height_constraints(&node.style, content_height);

    layout_box.rect = Rect {
        x,
        y,
        width: content_width,
        height: content_height,
    };
    layout_box
}

struct TextMetrics {
    char_width: i32,
    line_height: i32,
    max_chars: i32,
}

impl TextMetrics {
    fn from_style(style: &ComputedStyle, content_width: i32) -> Self {
        let font_size = style.px("font-size", 16).max(1);
        let line_height = style
            .px("line-height", ((font_size as f32) * 1.2).round() as i32)
            .max(1);
        let char_width = (font_size / 2).max(1);
        let max_chars = (content_width / char_width).max(1);
        Self {
            char_width,
            line_height,
            max_chars,
        }
    }
}

fn apply_text_transform(text: &str, style: &ComputedStyle) -> String {
    match style.keyword("text-transform").as_str() {
        "uppercase" => text.to_uppercase(),
        "lowercase" => text.to_lowercase(),
        "capitalize" => {
            let mut out = String::with_capacity(text.len());
            let mut at_word_start = true;
            for ch in text.chars() {
                if ch.is_alphanumeric() {
                    if at_word_start {
                        out.extend(ch.to_uppercase());
                    } else {
                        out.push(ch);
                    }
                    at_word_start = false;
                } else {
                    out.push(ch);
                    at_word_start = true;
                }
            }
            out
        }
        _ => text.to_string(),
    }
}

/// Wrap text at word boundaries; words longer than the line are split hard.
fn wrap_text_lines(text: &str, max_chars: i32) -> Vec<String> {
    let max_chars = max_chars.max(1) as usize;
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word[..max_chars].to_string());
                word = &word[max_chars..];
            }

            if current.is_empty() {
                current = word.to_string();
            } else if current.len() + 1 + word.len() <= max_chars {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn shorthand_edges(style: &ComputedStyle, property: &str) -> EdgeSizes {
    let values: Vec<i32> = match style.get(property) {
        Some(super::css::Value::List(items)) => {
            items.iter().map(|v| v.to_px().unwrap_or(0)).collect()
        }
        Some(value) => vec![value.to_px().unwrap_or(0)],
        None => Vec::new(),
    };

    match values.len() {
        1 => EdgeSizes {
            top: values[0],
            right: values[0],
            bottom: values[0],
            left: values[0],
        },
        2 => EdgeSizes {
            top: values[0],
            bottom: values[0],
            left: values[1],
            right: values[1],
        },
        3 => EdgeSizes {
            top: values[0],
            left: values[1],
            right: values[1],
            bottom: values[2],
        },
        n if n >= 4 => EdgeSizes {
            top: values[0],
            right: values[1],
            bottom: values[2],
            left: values[3],
        },
        _ => EdgeSizes::default(),
    }
}

fn edges_from_style(style: &ComputedStyle, property: &str) -> EdgeSizes {
    let mut edges = shorthand_edges(style, property);
    edges.top = style.px(&format!("{}-top", property), edges.top);
    edges.right = style.px(&format!("{}-right", property), edges.right);
    edges.bottom = style.px(&format!("{}-bottom", property), edges.bottom);
    edges.left = style.px(&format!("{}-left", property), edges.left);
    edges
}

fn border_edges(style: &ComputedStyle) -> EdgeSizes {
    // `border: 1px solid red` contributes a uniform width; `border-width`
    // and the per-side widths refine it.
    let base = style
        .get("border")
        .and_then(|v| v.to_px().or_else(|| match v {
            super::css::Value::List(items) => items.iter().find_map(|i| i.to_px()),
            _ => None,
        }))
        .unwrap_or(0);

    let mut edges = if style.get("border-width").is_some() {
        shorthand_edges(style, "border-width")
    } else {
        EdgeSizes {
            top: base,
            right: base,
            bottom: base,
            left: base,
        }
    };

    edges.top = style.px("border-top-width", edges.top);
    edges.right = style.px("border-right-width", edges.right);
    edges.bottom = style.px("border-bottom-width", edges.bottom);
    edges.left = style.px("border-left-width", edges.left);
    edges
}

fn apply_width_constraints(style: &ComputedStyle, available: i32) -> i32 {
    let mut width = style.px("width", available.max(0));
    let max_width = style.px("max-width", -1);
    if max_width >= 0 {
        width = width.min(max_width);
    }
    let min_width = style.px("min-width", -1);
    if min_width >= 0 {
        width = width.max(min_width);
    }
    width.max(0)
}

fn apply_height_constraints(style: &ComputedStyle, computed: i32) -> i32 {
    let mut height = style.px("height", computed);
    let min_height = style.px("min-height", -1);
    if min_height >= 0 {
        height = height.max(min_height);
    }
    let max_height = style.px("max-height", -1);
    if max_height >= 0 {
        height = height.min(max_height);
    }
    height.max(0)
}

/// Canonical textual dump of a layout tree. Any geometric change shows up
/// here, which is what the regression tests compare.
pub fn serialize_layout(layout_box: &LayoutBox) -> String {
    let mut out = String::new();
    out.push('{');
    out.push_str(&format!(
        "tag:{} x:{} y:{} w:{} h:{}",
        layout_box.tag_name,
        layout_box.rect.x,
        layout_box.rect.y,
        layout_box.rect.width,
        layout_box.rect.height
    ));
    for run in &layout_box.text_runs {
        out.push_str(&format!(
            "{{run:\"{}\" x:{} y:{} w:{} h:{}}}",
            run.text, run.rect.x, run.rect.y, run.rect.width, run.rect.height
        ));
    }
    for child in &layout_box.children {
        out.push_str(&serialize_layout(child));
    }
    out.push('}');
    out
}
