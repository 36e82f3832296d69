//! CORS response gate
//!
//! Applied after the fetch collaborator returns. Same-origin responses
//! pass untouched; cross-origin responses must carry a single, strictly
//! well-formed `Access-Control-Allow-Origin` header, with extra rules in
//! credentialed mode. Anything ambiguous is denied.

use super::policy::{PolicyCheckResult, PolicyViolation, RequestPolicy};
use crate::network::response::Response;
use crate::network::url::{http_origin, parse_url};

const ACAO: &str = "access-control-allow-origin";
const ACAC: &str = "access-control-allow-credentials";

/// Gate a response received for `effective_url` under the policy
pub fn check_cors_response_policy(
    effective_url: &str,
    response: &Response,
    policy: &RequestPolicy,
) -> PolicyCheckResult {
    if policy.origin.is_empty() {
        // No requesting origin, no CORS context.
        return PolicyCheckResult::allowed();
    }

    let parsed = match parse_url(effective_url) {
        Ok(parsed) => parsed,
        Err(_) => {
            return PolicyCheckResult::blocked(
                PolicyViolation::CorsResponseBlocked,
                format!("Cross-origin response blocked: unparsable URL {}", effective_url),
            )
        }
    };

    let is_null_origin = policy.origin == "null";
    let policy_origin = if is_null_origin {
        None
    } else {
        match http_origin(&policy.origin) {
            Some(origin) => Some(origin),
            None => {
                return PolicyCheckResult::blocked(
                    PolicyViolation::CorsResponseBlocked,
                    format!(
                        "Cross-origin response blocked: malformed policy origin {}",
                        policy.origin
                    ),
                )
            }
        }
    };

    if let Some(policy_origin) = &policy_origin {
        if parsed.origin().as_deref() == Some(policy_origin.as_str()) {
            return PolicyCheckResult::allowed();
        }
    }

    let acao_values = response.header_values(ACAO);
    if acao_values.is_empty() {
        return PolicyCheckResult::blocked(
            PolicyViolation::CorsResponseBlocked,
            "Cross-origin response blocked: missing Access-Control-Allow-Origin",
        );
    }
    if acao_values.len() > 1 {
        return PolicyCheckResult::blocked(
            PolicyViolation::CorsResponseBlocked,
            "Cross-origin response blocked: duplicate Access-Control-Allow-Origin",
        );
    }

    let acao = acao_values[0];
    if !is_strict_header_value(acao) {
        return PolicyCheckResult::blocked(
            PolicyViolation::CorsResponseBlocked,
            "Cross-origin response blocked: malformed Access-Control-Allow-Origin value",
        );
    }
    if acao.contains(',') {
        return PolicyCheckResult::blocked(
            PolicyViolation::CorsResponseBlocked,
            "Cross-origin response blocked: multi-valued Access-Control-Allow-Origin",
        );
    }

    let origin_allowed = match acao {
        "*" => {
            if policy.credentials_mode_include {
                return PolicyCheckResult::blocked(
                    PolicyViolation::CorsResponseBlocked,
                    "Cross-origin response blocked: ACAO '*' disallowed for credentialed CORS",
                );
            }
            true
        }
        "null" => is_null_origin,
        value => {
            // The value must be a strictly valid serialized origin AND
            // byte-equal to the canonical policy origin.
            http_origin(value).is_some()
                && policy_origin.as_deref() == Some(value)
        }
    };

    if !origin_allowed {
        return PolicyCheckResult::blocked(
            PolicyViolation::CorsResponseBlocked,
            format!(
                "Cross-origin response blocked: ACAO does not allow origin {}",
                policy.origin
            ),
        );
    }

    if policy.credentials_mode_include {
        if let Some(result) = check_credentials_header(response, policy) {
            return result;
        }
    }

    PolicyCheckResult::allowed()
}

/// Credentialed-mode ACAC rules. Returns a blocking result, or `None` when
/// the header situation is acceptable.
fn check_credentials_header(
    response: &Response,
    policy: &RequestPolicy,
) -> Option<PolicyCheckResult> {
    let acac_values = response.header_values(ACAC);

    if acac_values.len() > 1 {
        return Some(PolicyCheckResult::blocked(
            PolicyViolation::CorsResponseBlocked,
            "Cross-origin response blocked: duplicate Access-Control-Allow-Credentials",
        ));
    }

    match acac_values.first() {
        None => {
            if policy.require_acac_for_credentialed_cors {
                Some(PolicyCheckResult::blocked(
                    PolicyViolation::CorsResponseBlocked,
                    "Cross-origin response blocked: missing Access-Control-Allow-Credentials=true",
                ))
            } else {
                None
            }
        }
        Some(value) => {
            // The literal lowercase ASCII token, nothing else.
            if *value != "true" {
                Some(PolicyCheckResult::blocked(
                    PolicyViolation::CorsResponseBlocked,
                    "Cross-origin response blocked: Access-Control-Allow-Credentials must be 'true'",
                ))
            } else {
                None
            }
        }
    }
}

/// Header values must carry no surrounding whitespace, control characters,
/// or non-ASCII bytes.
fn is_strict_header_value(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if value != value.trim() {
        return false;
    }
    value
        .bytes()
        .all(|b| b.is_ascii() && b >= 0x20 && b != 0x7f)
}
