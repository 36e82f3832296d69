//! Navigation input classification and normalization
//!
//! Raw user input becomes a canonical URL before any policy or fetch work
//! happens. The core never touches the filesystem; local paths are
//! classified by shape alone.

use crate::network::url::{is_absolute_url, parse_url};

/// What kind of input the user handed us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Unknown,
    HttpUrl,
    FileUrl,
    LocalPath,
    DataUrl,
}

impl InputType {
    /// Input type name, for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            InputType::Unknown => "unknown",
            InputType::HttpUrl => "http_url",
            InputType::FileUrl => "file_url",
            InputType::LocalPath => "local_path",
            InputType::DataUrl => "data_url",
        }
    }
}

/// A normalized navigation target
#[derive(Debug, Clone, Default)]
pub struct NavigationInput {
    pub raw_input: String,
    pub input_type: InputType,
    pub canonical_url: String,
}

/// Classify raw input by shape
pub fn classify_input(input: &str) -> InputType {
    if input.is_empty() {
        return InputType::Unknown;
    }

    let lowered = input.to_ascii_lowercase();
    if lowered.starts_with("file:") {
        return InputType::FileUrl;
    }
    if lowered.starts_with("data:") {
        return InputType::DataUrl;
    }

    if is_absolute_url(input) {
        if let Ok(parsed) = parse_url(input) {
            if !parsed.opaque {
                return InputType::HttpUrl;
            }
        }
        return InputType::Unknown;
    }

    if input.starts_with('/') || input.starts_with("./") || input.starts_with("../") {
        return InputType::LocalPath;
    }

    InputType::Unknown
}

/// Normalize raw input into a canonical URL. Fails with a message for
/// inputs that cannot resolve to one.
pub fn normalize_input(raw_input: &str) -> Result<NavigationInput, String> {
    let input_type = classify_input(raw_input);
    let mut result = NavigationInput {
        raw_input: raw_input.to_string(),
        input_type,
        canonical_url: String::new(),
    };

    match input_type {
        InputType::FileUrl | InputType::DataUrl => {
            result.canonical_url = raw_input.to_string();
            Ok(result)
        }
        InputType::HttpUrl => {
            let parsed = parse_url(raw_input).map_err(|e| e.to_string())?;
            result.canonical_url = parsed.to_url_string();
            Ok(result)
        }
        InputType::LocalPath => {
            result.canonical_url = format!("file://{}", raw_input);
            Ok(result)
        }
        InputType::Unknown => Err(format!("Unable to resolve input: {}", raw_input)),
    }
}

/// Extract the document body of a `data:` URL, percent-decoded. Only the
/// plain (non-base64) form is supported.
pub fn data_url_body(url: &str) -> Option<String> {
    let rest = url.strip_prefix("data:").or_else(|| {
        if url.len() >= 5 && url[..5].eq_ignore_ascii_case("data:") {
            Some(&url[5..])
        } else {
            None
        }
    })?;
    let comma = rest.find(',')?;
    let metadata = &rest[..comma];
    if metadata.to_ascii_lowercase().contains(";base64") {
        return None;
    }
    Some(percent_decode(&rest[comma + 1..]))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = |b: u8| -> Option<u8> {
                match b {
                    b'0'..=b'9' => Some(b - b'0'),
                    b'a'..=b'f' => Some(10 + b - b'a'),
                    b'A'..=b'F' => Some(10 + b - b'A'),
                    _ => None,
                }
            };
            if let (Some(high), Some(low)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push((high << 4) | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_names() {
        assert_eq!(InputType::Unknown.name(), "unknown");
        assert_eq!(InputType::HttpUrl.name(), "http_url");
        assert_eq!(InputType::FileUrl.name(), "file_url");
        assert_eq!(InputType::LocalPath.name(), "local_path");
        assert_eq!(InputType::DataUrl.name(), "data_url");
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify_input("http://example.com/"), InputType::HttpUrl);
        assert_eq!(classify_input("HTTPS://example.com"), InputType::HttpUrl);
        assert_eq!(classify_input("file:///tmp/x.html"), InputType::FileUrl);
        assert_eq!(classify_input("data:text/html,<p>x</p>"), InputType::DataUrl);
        assert_eq!(classify_input("/var/www/index.html"), InputType::LocalPath);
        assert_eq!(classify_input("./page.html"), InputType::LocalPath);
        assert_eq!(classify_input(""), InputType::Unknown);
        assert_eq!(classify_input("no scheme here"), InputType::Unknown);
    }

    #[test]
    fn test_http_input_canonicalized() {
        let result = normalize_input("HTTP://Example.COM:80").unwrap();
        assert_eq!(result.input_type, InputType::HttpUrl);
        assert_eq!(result.canonical_url, "http://example.com/");
    }

    #[test]
    fn test_local_path_becomes_file_url() {
        let result = normalize_input("/srv/pages/index.html").unwrap();
        assert_eq!(result.input_type, InputType::LocalPath);
        assert_eq!(result.canonical_url, "file:///srv/pages/index.html");
    }

    #[test]
    fn test_file_and_data_urls_pass_through() {
        assert_eq!(
            normalize_input("file:///tmp/a.html").unwrap().canonical_url,
            "file:///tmp/a.html"
        );
        assert_eq!(
            normalize_input("data:text/html,<i>x</i>").unwrap().canonical_url,
            "data:text/html,<i>x</i>"
        );
    }

    #[test]
    fn test_unknown_input_rejected() {
        let err = normalize_input("???").unwrap_err();
        assert!(err.contains("Unable to resolve input"));
    }

    #[test]
    fn test_data_url_body_extraction() {
        assert_eq!(
            data_url_body("data:text/html,<p>hi</p>").as_deref(),
            Some("<p>hi</p>")
        );
        assert_eq!(
            data_url_body("data:text/html,%3Cb%3Ex%3C%2Fb%3E").as_deref(),
            Some("<b>x</b>")
        );
        assert_eq!(data_url_body("data:text/html;base64,PGI+"), None);
        assert_eq!(data_url_body("data:no-comma"), None);
        assert_eq!(data_url_body("http://example.com/"), None);
    }
}
