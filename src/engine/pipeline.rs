//! Render pipeline: owns the DOM, stylesheet, and framebuffer
//!
//! Construction performs one full cascade, layout, and paint pass. Bridge
//! mutations edit the owned DOM; `rerender` re-drives the style, layout,
//! and paint tail and bumps the frame counter by exactly one, however many
//! mutations happened in between. All per-frame state is rebuilt fresh.

use crate::bridge::{self, DomEvent, EventRegistry, MutationResult, QueryResult};
use crate::renderer::css::Stylesheet;
use crate::renderer::dom::Document;
use crate::renderer::layout::{LayoutBox, LayoutEngine};
use crate::renderer::paint::{render_to_canvas, Canvas};

/// Outcome of a re-render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerenderResult {
    pub ok: bool,
    pub message: String,
    pub render_count: u32,
}

/// The deterministic document-to-pixels pipeline
pub struct RenderPipeline {
    document: Document,
    stylesheet: Stylesheet,
    viewport_width: i32,
    viewport_height: i32,
    layout_engine: LayoutEngine,
    layout: LayoutBox,
    canvas: Canvas,
    render_count: u32,
}

impl RenderPipeline {
    /// Build the pipeline and render the first frame
    pub fn new(
        document: Document,
        stylesheet: Stylesheet,
        viewport_width: i32,
        viewport_height: i32,
    ) -> Self {
        let layout_engine = LayoutEngine::new();
        let layout = layout_engine.layout_document(&document, &stylesheet, viewport_width);
        let canvas = render_to_canvas(&layout, viewport_width, viewport_height);

        Self {
            document,
            stylesheet,
            viewport_width,
            viewport_height,
            layout_engine,
            layout,
            canvas,
            render_count: 1,
        }
    }

    /// Recompute cascade, layout, and paint from the current DOM and
    /// stylesheet. Increments the frame counter by exactly one.
    pub fn rerender(&mut self) -> RerenderResult {
        self.layout = self.layout_engine.layout_document(
            &self.document,
            &self.stylesheet,
            self.viewport_width,
        );
        self.canvas = render_to_canvas(&self.layout, self.viewport_width, self.viewport_height);
        self.render_count += 1;

        RerenderResult {
            ok: true,
            message: "OK".to_string(),
            render_count: self.render_count,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn layout(&self) -> &LayoutBox {
        &self.layout
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn render_count(&self) -> u32 {
        self.render_count
    }

    pub fn viewport(&self) -> (i32, i32) {
        (self.viewport_width, self.viewport_height)
    }

    // Bridge surface: queries read the owned DOM, mutations edit it. The
    // caller decides when to `rerender`.

    pub fn query_by_id(&self, id: &str) -> QueryResult {
        bridge::query_by_id(&self.document, id)
    }

    pub fn query_selector(&self, selector: &str) -> QueryResult {
        bridge::query_selector(&self.document, selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> QueryResult {
        bridge::query_selector_all(&self.document, selector)
    }

    pub fn set_style_by_id(&mut self, id: &str, property: &str, value: &str) -> MutationResult {
        bridge::set_style_by_id(&mut self.document, id, property, value)
    }

    pub fn set_text_by_id(&mut self, id: &str, text: &str) -> MutationResult {
        bridge::set_text_by_id(&mut self.document, id, text)
    }

    pub fn set_attribute_by_id(&mut self, id: &str, attribute: &str, value: &str) -> MutationResult {
        bridge::set_attribute_by_id(&mut self.document, id, attribute, value)
    }

    pub fn remove_attribute_by_id(&mut self, id: &str, attribute: &str) -> MutationResult {
        bridge::remove_attribute_by_id(&mut self.document, id, attribute)
    }

    /// Dispatch an event through a registry against the owned DOM.
    /// Handlers may mutate the document; they must not re-enter the
    /// pipeline.
    pub fn dispatch_event(&mut self, registry: &EventRegistry, event: &DomEvent) -> MutationResult {
        registry.dispatch(&mut self.document, event)
    }
}
