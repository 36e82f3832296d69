//! Response cache with pluggable policy
//!
//! Keyed by URL string; URLs reaching the cache have already been
//! canonicalized by the policy engine's URL parser. Error responses are
//! never stored, and `NoCache` hides entries without evicting them.

use super::response::Response;
use std::collections::HashMap;

/// Cache behavior modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    NoCache,
    CacheAll,
}

impl CachePolicy {
    /// Policy name (part of the public string contract)
    pub fn name(&self) -> &'static str {
        match self {
            CachePolicy::NoCache => "NoCache",
            CachePolicy::CacheAll => "CacheAll",
        }
    }
}

/// In-memory response cache
pub struct ResponseCache {
    policy: CachePolicy,
    entries: HashMap<String, Response>,
}

impl ResponseCache {
    /// Create a cache with the given policy
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    /// Change the policy. Entries are not evicted; `NoCache` hides them
    /// until the policy is swapped back.
    pub fn set_policy(&mut self, policy: CachePolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Store a response. No-op under `NoCache` and for error responses.
    pub fn store(&mut self, url: &str, response: &Response) {
        if self.policy == CachePolicy::NoCache {
            return;
        }
        if response.is_error() {
            return;
        }
        self.entries.insert(url.to_string(), response.clone());
    }

    /// Look up a cached response, copying it into `out` on a hit
    pub fn lookup(&self, url: &str, out: &mut Response) -> bool {
        if self.policy == CachePolicy::NoCache {
            return false;
        }
        match self.entries.get(url) {
            Some(response) => {
                *out = response.clone();
                true
            }
            None => false,
        }
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CachePolicy::NoCache)
    }
}
