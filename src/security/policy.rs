//! Request policy: scheme allow-list, cross-origin gate, CSP connect-src
//!
//! Gates run in a fixed order and the first failure wins. Parse failures
//! and malformed policy origins deny the request rather than letting it
//! through unchecked.

use super::csp::{parse_csp_source, source_matches_url, CspSource};
use crate::network::url::{canonical_origin, http_origin, parse_url, Url};

/// Why a request or response was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    None,
    TooManyRedirects,
    CrossOriginBlocked,
    CorsResponseBlocked,
    CspConnectSrcBlocked,
    UnsupportedScheme,
    EmptyUrl,
}

impl PolicyViolation {
    /// Violation name (part of the public string contract)
    pub fn name(&self) -> &'static str {
        match self {
            PolicyViolation::None => "None",
            PolicyViolation::TooManyRedirects => "TooManyRedirects",
            PolicyViolation::CrossOriginBlocked => "CrossOriginBlocked",
            PolicyViolation::CorsResponseBlocked => "CorsResponseBlocked",
            PolicyViolation::CspConnectSrcBlocked => "CspConnectSrcBlocked",
            PolicyViolation::UnsupportedScheme => "UnsupportedScheme",
            PolicyViolation::EmptyUrl => "EmptyUrl",
        }
    }
}

/// Per-request security policy
#[derive(Debug, Clone)]
pub struct RequestPolicy {
    pub max_redirects: u32,
    pub allow_cross_origin: bool,
    pub credentials_mode_include: bool,
    pub require_acac_for_credentialed_cors: bool,
    pub enforce_connect_src: bool,
    pub allowed_schemes: Vec<String>,
    pub connect_src_sources: Vec<String>,
    pub default_src_sources: Vec<String>,
    /// Requesting document origin; empty disables origin-based gates.
    /// The sentinel `"null"` is the distinct null origin.
    pub origin: String,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            max_redirects: 5,
            allow_cross_origin: true,
            credentials_mode_include: false,
            require_acac_for_credentialed_cors: true,
            enforce_connect_src: false,
            allowed_schemes: vec![
                "http".to_string(),
                "https".to_string(),
                "file".to_string(),
            ],
            connect_src_sources: Vec::new(),
            default_src_sources: Vec::new(),
            origin: String::new(),
        }
    }
}

/// Outcome of a policy check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyCheckResult {
    pub allowed: bool,
    pub violation: PolicyViolation,
    pub message: String,
}

impl PolicyCheckResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            violation: PolicyViolation::None,
            message: String::new(),
        }
    }

    pub fn blocked(violation: PolicyViolation, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            violation,
            message: message.into(),
        }
    }
}

/// Evaluate the request-side gates for a URL, in order: empty URL, URL
/// grammar, scheme allow-list, cross-origin, CSP connect-src.
pub fn check_request_policy(url: &str, policy: &RequestPolicy) -> PolicyCheckResult {
    if url.is_empty() {
        return PolicyCheckResult::blocked(PolicyViolation::EmptyUrl, "URL is empty");
    }

    let parsed = match parse_url(url) {
        Ok(parsed) => parsed,
        Err(err) => {
            return PolicyCheckResult::blocked(
                PolicyViolation::UnsupportedScheme,
                format!("Failed to parse URL: {}", err),
            )
        }
    };

    if !policy.allowed_schemes.iter().any(|s| *s == parsed.scheme) {
        return PolicyCheckResult::blocked(
            PolicyViolation::UnsupportedScheme,
            format!("Scheme '{}' not allowed", parsed.scheme),
        );
    }

    if !policy.allow_cross_origin && !policy.origin.is_empty() {
        let policy_origin = match canonical_origin(&policy.origin) {
            Some(origin) => origin,
            None => {
                return PolicyCheckResult::blocked(
                    PolicyViolation::CrossOriginBlocked,
                    format!("Malformed policy origin: {}", policy.origin),
                )
            }
        };
        let request_origin = parsed.origin();
        if request_origin.as_deref() != Some(policy_origin.as_str()) {
            return PolicyCheckResult::blocked(
                PolicyViolation::CrossOriginBlocked,
                format!(
                    "Cross-origin request blocked: {} != {}",
                    request_origin.unwrap_or_else(|| "<no origin>".to_string()),
                    policy_origin
                ),
            );
        }
    }

    if !csp_connect_src_allows(&parsed, policy) {
        return PolicyCheckResult::blocked(
            PolicyViolation::CspConnectSrcBlocked,
            format!("CSP connect-src blocked request: {}", url),
        );
    }

    PolicyCheckResult::allowed()
}

/// CSP gate: the effective source list is `connect_src_sources` when
/// non-empty, else `default_src_sources`. An empty effective list allows
/// everything; `'none'` anywhere makes the list match nothing.
fn csp_connect_src_allows(url: &Url, policy: &RequestPolicy) -> bool {
    if !policy.enforce_connect_src {
        return true;
    }

    let effective_sources = if !policy.connect_src_sources.is_empty() {
        &policy.connect_src_sources
    } else {
        &policy.default_src_sources
    };
    if effective_sources.is_empty() {
        return true;
    }

    let parsed_sources: Vec<Option<CspSource>> = effective_sources
        .iter()
        .map(|token| parse_csp_source(token))
        .collect();

    if parsed_sources
        .iter()
        .any(|s| matches!(s, Some(CspSource::None)))
    {
        return false;
    }

    let policy_origin = if policy.origin.is_empty() {
        None
    } else {
        canonical_origin(&policy.origin)
    };
    let policy_scheme = policy_origin
        .as_deref()
        .and_then(|origin| origin.split("://").next())
        .filter(|scheme| !scheme.is_empty() && *scheme != "null");

    parsed_sources.iter().flatten().any(|source| {
        source_matches_url(source, url, policy_origin.as_deref(), policy_scheme)
    })
}

/// Build the request headers the policy calls for. An `Origin` header is
/// attached only for cross-origin requests from a valid HTTP(S) origin to
/// a URL that itself has an origin.
pub fn build_request_headers_for_policy(
    url: &str,
    policy: &RequestPolicy,
) -> Vec<(String, String)> {
    let mut headers = Vec::new();

    let policy_origin = match http_origin(&policy.origin) {
        Some(origin) => origin,
        None => return headers,
    };
    let request_origin = match parse_url(url).ok().and_then(|u| u.origin()) {
        Some(origin) => origin,
        None => return headers,
    };
    if policy_origin == request_origin {
        return headers;
    }

    headers.push(("Origin".to_string(), policy_origin));
    headers
}
