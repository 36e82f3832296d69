//! Request policy enforcement
//!
//! Scheme allow-lists, the cross-origin gate, the CSP connect-src subset,
//! and the CORS response gate. All checks are pure functions that fail
//! closed on malformed input.

pub mod cors;
pub mod csp;
pub mod policy;

pub use cors::check_cors_response_policy;
pub use csp::{parse_csp_source, CspSource};
pub use policy::{
    build_request_headers_for_policy, check_request_policy, PolicyCheckResult, PolicyViolation,
    RequestPolicy,
};
