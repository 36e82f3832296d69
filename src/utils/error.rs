//! Error types for the vellum engine

use std::fmt;

/// Main error type for engine operations
#[derive(Debug)]
pub enum VellumError {
    /// Network-related errors
    Network(NetworkError),
    /// Rendering/parsing errors
    Render(RenderError),
    /// I/O errors
    Io(std::io::Error),
    /// Generic error with message
    Other(String),
}

/// Network-specific errors
#[derive(Debug)]
pub enum NetworkError {
    /// Invalid URL
    InvalidUrl(String),
    /// Request blocked by policy
    PolicyBlocked(String),
    /// Transport failure reported by the fetch collaborator
    Transport(String),
}

/// Rendering-specific errors
#[derive(Debug)]
pub enum RenderError {
    /// HTML parsing error
    HtmlParse(String),
    /// CSS parsing error
    CssParse(String),
    /// Layout computation error
    Layout(String),
    /// Paint error
    Paint(String),
}

impl fmt::Display for VellumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {:?}", e),
            Self::Render(e) => write!(f, "Render error: {:?}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for VellumError {}

impl From<std::io::Error> for VellumError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<NetworkError> for VellumError {
    fn from(err: NetworkError) -> Self {
        Self::Network(err)
    }
}

impl From<RenderError> for VellumError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

/// Convenience Result type for engine operations
pub type Result<T> = std::result::Result<T, VellumError>;
