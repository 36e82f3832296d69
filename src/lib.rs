//! # Vellum - Deterministic Browser Engine Core
//!
//! A minimal web-browser engine core: a pipeline that turns a source URL
//! plus optional HTML/CSS bytes into a rendered pixel canvas, with
//! structured diagnostics, failure-trace capture, and a small synchronous
//! scripting bridge.
//!
//! ## Architecture
//!
//! - **engine**: navigation lifecycle facade and the render pipeline
//! - **renderer**: tolerant HTML parsing, CSS cascade, layout, and paint
//! - **network**: URL/origin canonicalization, transactions, response cache
//! - **security**: request policy, CSP connect-src, CORS response gate
//! - **bridge**: synchronous DOM queries, mutations, and event dispatch
//! - **core**: diagnostics, failure traces, recovery planning, privacy
//! - **utils**: shared error types
//!
//! The core is single-threaded with no suspension points: parsing,
//! styling, layout, and painting are pure functions of their inputs.

pub mod bridge;
pub mod core;
pub mod engine;
pub mod network;
pub mod renderer;
pub mod security;
pub mod utils;

// Re-export main types for convenience
pub use engine::{BrowserEngine, EngineResult, RenderOptions, RenderPipeline};
pub use utils::error::{Result, VellumError};

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Vellum";
