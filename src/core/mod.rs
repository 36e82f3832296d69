//! Lifecycle, diagnostic, and recovery substrate
//!
//! Severity-tagged events with correlation IDs, reproducible failure
//! traces, a recovery-action planner, the navigation lifecycle machine,
//! and privacy controls.

pub mod config;
pub mod diagnostics;
pub mod lifecycle;
pub mod privacy;
pub mod recovery;
pub mod trace;

pub use diagnostics::{format_diagnostic, DiagnosticEmitter, DiagnosticEvent, Severity};
pub use lifecycle::LifecycleStage;
pub use privacy::{PrivacyAuditEntry, PrivacyGuard, PrivacySettings};
pub use recovery::{RecoveryAction, RecoveryController, RecoveryPlan, RecoveryStep};
pub use trace::{FailureTrace, FailureTraceCollector};
