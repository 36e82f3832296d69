//! Engine-wide configuration defaults

/// Default viewport width in CSS pixels
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// Default viewport height in CSS pixels
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;

/// User agent string advertised by the engine
pub const DEFAULT_USER_AGENT: &str = "vellum/0.1 (StaticHTMLCSS)";
