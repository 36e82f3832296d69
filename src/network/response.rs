//! HTTP response types
//!
//! Headers are a case-insensitive multi-map that preserves the exact case
//! and order they arrived in, so policy checks can detect duplicate
//! case-variant headers.

/// HTTP response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status_code: u16,
    headers: Vec<(String, String)>,
    pub body: String,
    /// Transport or policy error; a response is an error response iff this
    /// is non-empty or the status code is 0.
    pub error: String,
    /// URL the response was ultimately served from, when known
    pub final_url: String,
}

impl Response {
    /// Create a new response
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            ..Default::default()
        }
    }

    /// Create an error response carrying a transport/policy failure
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            ..Default::default()
        }
    }

    /// Whether this is an error response
    pub fn is_error(&self) -> bool {
        !self.error.is_empty() || self.status_code == 0
    }

    /// Check if the response was successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Check if the response is a redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    /// Check if the response is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// Check if the response is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Append a header; repeated names accumulate
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// All headers in arrival order, exact case preserved
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value matching the name case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every header value matching the name case-insensitively, in order.
    /// Case-variant duplicates all show up here.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Content type, if present
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
