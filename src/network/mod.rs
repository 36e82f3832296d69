//! Networking support: URL grammar, responses, transactions, and caching
//!
//! The transport itself is a collaborator behind the `Fetcher` trait; this
//! module owns everything deterministic around it.

pub mod cache;
pub mod request;
pub mod response;
pub mod url;

pub use cache::{CachePolicy, ResponseCache};
pub use request::{
    fetch_with_policy, Fetcher, Request, RequestMethod, RequestStage, RequestTransaction,
};
pub use response::Response;
pub use url::{canonical_origin, http_origin, parse_url, same_origin, Url, UrlParseError};
