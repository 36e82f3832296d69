//! Request types and the policy-checked fetch transaction
//!
//! The actual transport is a collaborator behind the `Fetcher` trait;
//! this module wires the policy gates and transaction bookkeeping around
//! it: policy check, Origin header build, dispatch, CORS response gate.

use super::response::Response;
use crate::security::{
    build_request_headers_for_policy, check_cors_response_policy, check_request_policy,
    RequestPolicy,
};
use std::time::Instant;

/// Request methods the engine issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Head,
}

impl RequestMethod {
    /// Method name (part of the public string contract)
    pub fn name(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Head => "HEAD",
        }
    }
}

/// Stages a request transaction passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Created,
    Dispatched,
    Received,
    Complete,
    Error,
}

impl RequestStage {
    /// Stage name (part of the public string contract)
    pub fn name(&self) -> &'static str {
        match self {
            RequestStage::Created => "Created",
            RequestStage::Dispatched => "Dispatched",
            RequestStage::Received => "Received",
            RequestStage::Complete => "Complete",
            RequestStage::Error => "Error",
        }
    }
}

/// An outgoing request
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: RequestMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// One recorded transaction event
#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub stage: RequestStage,
    pub timestamp: Instant,
    pub detail: String,
}

/// A request paired with its response and the ordered stage events
#[derive(Debug, Clone, Default)]
pub struct RequestTransaction {
    pub request: Request,
    pub response: Response,
    pub events: Vec<RequestEvent>,
}

impl RequestTransaction {
    /// Record entering a stage
    pub fn record(&mut self, stage: RequestStage, detail: impl Into<String>) {
        self.events.push(RequestEvent {
            stage,
            timestamp: Instant::now(),
            detail: detail.into(),
        });
    }

    /// Whether the transaction recorded the given stage
    pub fn has_stage(&self, stage: RequestStage) -> bool {
        self.events.iter().any(|e| e.stage == stage)
    }
}

/// The byte-fetching collaborator. Synchronous; the policy engine runs
/// before `fetch` and the CORS gate after it.
pub trait Fetcher {
    fn fetch(&mut self, url: &str, headers: &[(String, String)]) -> Response;
}

/// Observer invoked after each recorded transaction stage
pub type TransactionObserver<'a> = &'a mut dyn FnMut(&RequestTransaction, RequestStage);

/// Run a full policy-checked fetch transaction: Created, policy gates,
/// Dispatched, fetch, Received, CORS gate, then Complete or Error.
pub fn fetch_with_policy(
    url: &str,
    policy: &RequestPolicy,
    fetcher: &mut dyn Fetcher,
    mut observer: Option<TransactionObserver<'_>>,
) -> RequestTransaction {
    let mut txn = RequestTransaction {
        request: Request {
            method: RequestMethod::Get,
            url: url.to_string(),
            headers: Vec::new(),
        },
        ..Default::default()
    };

    txn.record(RequestStage::Created, "");
    notify(&mut observer, &txn, RequestStage::Created);

    let request_check = check_request_policy(url, policy);
    if !request_check.allowed {
        txn.response.error = request_check.message.clone();
        txn.record(RequestStage::Error, request_check.message);
        notify(&mut observer, &txn, RequestStage::Error);
        return txn;
    }

    txn.request.headers = build_request_headers_for_policy(url, policy);

    txn.record(RequestStage::Dispatched, "");
    notify(&mut observer, &txn, RequestStage::Dispatched);

    txn.response = fetcher.fetch(url, &txn.request.headers);

    txn.record(RequestStage::Received, "");
    notify(&mut observer, &txn, RequestStage::Received);

    if txn.response.error.is_empty() {
        let effective_url = if txn.response.final_url.is_empty() {
            url
        } else {
            txn.response.final_url.as_str()
        };
        let response_check = check_cors_response_policy(effective_url, &txn.response, policy);
        if !response_check.allowed {
            txn.response.error = response_check.message;
        }
    }

    if !txn.response.error.is_empty() {
        let detail = txn.response.error.clone();
        txn.record(RequestStage::Error, detail);
        notify(&mut observer, &txn, RequestStage::Error);
    } else {
        let detail = format!("status={}", txn.response.status_code);
        txn.record(RequestStage::Complete, detail);
        notify(&mut observer, &txn, RequestStage::Complete);
    }

    txn
}

fn notify(
    observer: &mut Option<TransactionObserver<'_>>,
    txn: &RequestTransaction,
    stage: RequestStage,
) {
    if let Some(callback) = observer {
        callback(txn, stage);
    }
}
