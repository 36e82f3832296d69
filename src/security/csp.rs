//! CSP source-expression parsing and matching
//!
//! Each source token is parsed once into a small AST and matched against
//! the request URL. Malformed source tokens match nothing; ambiguity
//! always resolves to deny.

use crate::network::url::{default_port, normalize_path, Url};

/// A parsed CSP source expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CspSource {
    /// `'none'`: matches nothing, and poisons the whole list
    None,
    /// `'self'`: the policy origin itself
    SelfOrigin,
    /// `*`: any non-opaque URL
    Wildcard,
    /// `<scheme>:` matches any URL with that scheme
    Scheme(String),
    /// A host source, optionally scheme-qualified
    Host(HostSource),
}

/// Port requirement of a host source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRule {
    /// No explicit port: the URL must be on the scheme's default port
    Default,
    /// `:<n>` requires an exact match
    Exact(u16),
    /// `:*` accepts any port
    Any,
}

/// `scheme://host[:port][/path]` with optional `*.` host wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSource {
    pub scheme: Option<String>,
    /// Lowercase host; for wildcards this is the suffix after `*.`
    pub host: String,
    pub wildcard_host: bool,
    pub port: PortRule,
    /// Normalized path; empty means any path
    pub path: String,
}

/// Parse one source token. Returns `None` for tokens that are malformed,
/// which the caller treats as matching nothing.
pub fn parse_csp_source(token: &str) -> Option<CspSource> {
    let trimmed = token.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(trimmed);
    let lowered = unquoted.to_ascii_lowercase();

    match lowered.as_str() {
        "" => return None,
        "none" => return Some(CspSource::None),
        "self" => return Some(CspSource::SelfOrigin),
        "*" => return Some(CspSource::Wildcard),
        _ => {}
    }

    // `<scheme>:` with no authority or path
    if let Some(scheme) = lowered.strip_suffix(':') {
        if !scheme.is_empty()
            && !scheme.contains('/')
            && scheme.as_bytes()[0].is_ascii_alphabetic()
            && scheme
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
        {
            return Some(CspSource::Scheme(scheme.to_string()));
        }
        return None;
    }

    parse_host_source(&lowered).map(CspSource::Host)
}

fn parse_host_source(token: &str) -> Option<HostSource> {
    let (scheme, rest) = match token.find("://") {
        Some(pos) => {
            let scheme = &token[..pos];
            if scheme.is_empty() {
                return None;
            }
            (Some(scheme.to_string()), &token[pos + 3..])
        }
        None => (None, token),
    };

    let (authority, raw_path) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };
    if authority.is_empty() {
        return None;
    }

    // Query and fragment have no place in a source expression path.
    let raw_path = match raw_path.find(|c| c == '?' || c == '#') {
        Some(pos) => &raw_path[..pos],
        None => raw_path,
    };

    let (host_part, port) = split_authority_port(authority)?;

    let (host, wildcard_host) = match host_part.strip_prefix("*.") {
        Some(suffix) => {
            if suffix.is_empty() || suffix.starts_with('.') {
                return None;
            }
            (suffix.to_string(), true)
        }
        None => (host_part.to_string(), false),
    };
    if host.is_empty() {
        return None;
    }

    let path = if raw_path.is_empty() {
        String::new()
    } else {
        normalize_path(raw_path)
    };

    Some(HostSource {
        scheme,
        host,
        wildcard_host,
        port,
        path,
    })
}

fn split_authority_port(authority: &str) -> Option<(&str, PortRule)> {
    if let Some(inner_start) = authority.strip_prefix('[') {
        // Bracketed IPv6 literal, optionally with a port
        let close = inner_start.find(']')?;
        let host = &authority[..close + 2];
        let tail = &inner_start[close + 1..];
        if tail.is_empty() {
            return Some((host, PortRule::Default));
        }
        let port_part = tail.strip_prefix(':')?;
        return Some((host, parse_port_rule(port_part)?));
    }

    match authority.rfind(':') {
        Some(pos) => {
            let host = &authority[..pos];
            let port_part = &authority[pos + 1..];
            Some((host, parse_port_rule(port_part)?))
        }
        None => Some((authority, PortRule::Default)),
    }
}

fn parse_port_rule(raw: &str) -> Option<PortRule> {
    if raw == "*" {
        return Some(PortRule::Any);
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = raw.parse().ok()?;
    if value == 0 || value > 65535 {
        // An out-of-range port invalidates the whole source.
        return None;
    }
    Some(PortRule::Exact(value as u16))
}

/// Match a parsed source against a request URL.
///
/// `policy_origin` is the canonical policy origin (for `'self'`);
/// `policy_scheme` is its scheme (inherited by scheme-less host sources).
/// Both being absent makes `'self'` and scheme-less sources match nothing.
pub fn source_matches_url(
    source: &CspSource,
    url: &Url,
    policy_origin: Option<&str>,
    policy_scheme: Option<&str>,
) -> bool {
    match source {
        CspSource::None => false,
        CspSource::Wildcard => !url.opaque,
        CspSource::SelfOrigin => match (policy_origin, url.origin()) {
            (Some(policy), Some(request)) => policy == request,
            _ => false,
        },
        CspSource::Scheme(scheme) => url.scheme == *scheme,
        CspSource::Host(host_source) => host_source_matches(host_source, url, policy_scheme),
    }
}

fn host_source_matches(source: &HostSource, url: &Url, policy_scheme: Option<&str>) -> bool {
    if url.opaque {
        return false;
    }

    let effective_scheme = match source.scheme.as_deref().or(policy_scheme) {
        Some(scheme) => scheme,
        // Scheme-less source with no usable policy origin: deny.
        None => return false,
    };
    if url.scheme != effective_scheme {
        return false;
    }

    if !host_matches(&source.host, source.wildcard_host, &url.host) {
        return false;
    }

    match source.port {
        PortRule::Any => {}
        PortRule::Exact(port) => {
            if url.effective_port() != Some(port) {
                return false;
            }
        }
        PortRule::Default => match default_port(effective_scheme) {
            Some(default) => {
                if url.effective_port() != Some(default) {
                    return false;
                }
            }
            None => {
                if url.port.is_some() {
                    return false;
                }
            }
        },
    }

    if source.path.is_empty() || source.path == "/" {
        return true;
    }
    let request_path = url.normalized_path();
    if source.path.ends_with('/') {
        request_path.starts_with(&source.path)
    } else {
        request_path == source.path
    }
}

fn host_matches(source_host: &str, wildcard: bool, request_host: &str) -> bool {
    if request_host.is_empty() {
        return false;
    }
    if wildcard {
        // `*.example.com` matches strict subdomains only, never the apex.
        request_host.len() > source_host.len() + 1
            && request_host.ends_with(source_host)
            && request_host.as_bytes()[request_host.len() - source_host.len() - 1] == b'.'
    } else {
        request_host == source_host
    }
}
