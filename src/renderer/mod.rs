//! Rendering engine: HTML/CSS parsing, cascade, layout, and paint
//!
//! Parsing, styling, layout, and painting are pure functions of their
//! inputs; the same bytes produce the same DOM, warnings, layout tree, and
//! pixels on every run.

pub mod css;
pub mod dom;
pub mod html;
pub mod layout;
pub mod paint;
pub mod style;

pub use css::{CssParser, LinkedCssLoadResult, LinkedCssRef, Stylesheet};
pub use dom::{serialize_dom, Document, ElementData, Node, NodeType};
pub use html::{HtmlParser, ParseResult, ParseWarning};
pub use layout::{serialize_layout, BoxType, LayoutBox, LayoutEngine};
pub use paint::{
    render_to_canvas, render_to_canvas_traced, render_to_text, write_render_trace, Canvas,
    RenderMetadata, RenderStage, RenderTrace,
};
pub use style::{ComputedStyle, StyleEngine};
