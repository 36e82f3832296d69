//! Failure traces: reproducible snapshots of error context
//!
//! A trace captures where a failure happened (module/stage), what it said,
//! key/value snapshots added by the caller, and the diagnostic events that
//! preceded it. Two traces reproduce each other when module, stage, error
//! message, and snapshots agree; correlation ids and context events may
//! differ between runs.

use super::diagnostics::{DiagnosticEmitter, DiagnosticEvent};

/// Captured context for a single failure
#[derive(Debug, Clone, Default)]
pub struct FailureTrace {
    pub correlation_id: u64,
    pub module: String,
    pub stage: String,
    pub error_message: String,
    /// Ordered key/value snapshots added by the caller
    pub snapshots: Vec<(String, String)>,
    /// Diagnostic events recorded before the capture, in order
    pub context_events: Vec<DiagnosticEvent>,
}

impl FailureTrace {
    /// Append a key/value snapshot; order is preserved and significant
    pub fn add_snapshot(&mut self, key: &str, value: &str) {
        self.snapshots.push((key.to_string(), value.to_string()));
    }

    /// True iff `other` describes the same failure: module, stage, error
    /// message, and snapshots (as ordered pairs) all match.
    pub fn is_reproducible_with(&self, other: &FailureTrace) -> bool {
        self.module == other.module
            && self.stage == other.stage
            && self.error_message == other.error_message
            && self.snapshots == other.snapshots
    }

    /// Human-readable block for failure reporting
    pub fn format(&self) -> String {
        let mut out = String::from("FailureTrace");
        if self.correlation_id != 0 {
            out.push_str(&format!(" (cid:{})", self.correlation_id));
        }
        out.push('\n');
        out.push_str(&format!("  module: {}\n", self.module));
        out.push_str(&format!("  stage: {}\n", self.stage));
        out.push_str(&format!("  error: {}\n", self.error_message));
        if !self.snapshots.is_empty() {
            out.push_str("  snapshots:\n");
            for (key, value) in &self.snapshots {
                out.push_str(&format!("    {}={}\n", key, value));
            }
        }
        if !self.context_events.is_empty() {
            out.push_str(&format!("  context_events: {}\n", self.context_events.len()));
        }
        out
    }
}

/// Stores every captured trace for later inspection
#[derive(Default)]
pub struct FailureTraceCollector {
    traces: Vec<FailureTrace>,
}

impl FailureTraceCollector {
    pub fn new() -> Self {
        Self { traces: Vec::new() }
    }

    /// Capture a trace from the emitter's current state. The emitter's
    /// correlation id and full event log are copied in; snapshots are added
    /// by the caller on the returned trace.
    pub fn capture(
        &mut self,
        emitter: &DiagnosticEmitter,
        module: &str,
        stage: &str,
        error_message: &str,
    ) -> FailureTrace {
        let trace = FailureTrace {
            correlation_id: emitter.correlation_id(),
            module: module.to_string(),
            stage: stage.to_string(),
            error_message: error_message.to_string(),
            snapshots: Vec::new(),
            context_events: emitter.events().to_vec(),
        };
        self.traces.push(trace.clone());
        trace
    }

    pub fn traces(&self) -> &[FailureTrace] {
        &self.traces
    }

    pub fn clear(&mut self) {
        self.traces.clear();
    }

    pub fn size(&self) -> usize {
        self.traces.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::Severity;

    #[test]
    fn test_capture_copies_correlation_id_and_events() {
        let mut emitter = DiagnosticEmitter::new();
        emitter.set_correlation_id(9);
        emitter.emit(Severity::Info, "net", "fetch", "dispatching");
        emitter.emit(Severity::Error, "net", "fetch", "connection refused");

        let mut collector = FailureTraceCollector::new();
        let trace = collector.capture(&emitter, "net", "fetch", "connection refused");

        assert_eq!(trace.correlation_id, 9);
        assert_eq!(trace.context_events.len(), 2);
        assert_eq!(collector.size(), 1);
    }

    #[test]
    fn test_trace_reproducible_with_itself() {
        let mut trace = FailureTrace {
            module: "css".to_string(),
            stage: "parse".to_string(),
            error_message: "bad selector".to_string(),
            ..Default::default()
        };
        trace.add_snapshot("selector", "div..x");
        assert!(trace.is_reproducible_with(&trace));
    }

    #[test]
    fn test_reproducibility_ignores_correlation_and_context() {
        let mut emitter = DiagnosticEmitter::new();
        emitter.emit(Severity::Info, "net", "fetch", "noise");

        let mut collector = FailureTraceCollector::new();
        let mut first = collector.capture(&emitter, "net", "fetch", "timeout");
        first.add_snapshot("url", "http://example.com/");

        emitter.set_correlation_id(77);
        emitter.emit(Severity::Info, "net", "fetch", "more noise");
        let mut second = collector.capture(&emitter, "net", "fetch", "timeout");
        second.add_snapshot("url", "http://example.com/");

        assert_ne!(first.correlation_id, second.correlation_id);
        assert_ne!(first.context_events.len(), second.context_events.len());
        assert!(first.is_reproducible_with(&second));
    }

    #[test]
    fn test_snapshot_order_matters() {
        let mut a = FailureTrace::default();
        a.add_snapshot("k1", "v1");
        a.add_snapshot("k2", "v2");

        let mut b = FailureTrace::default();
        b.add_snapshot("k2", "v2");
        b.add_snapshot("k1", "v1");

        assert!(!a.is_reproducible_with(&b));
    }

    #[test]
    fn test_different_error_message_not_reproducible() {
        let a = FailureTrace {
            module: "net".to_string(),
            stage: "fetch".to_string(),
            error_message: "timeout".to_string(),
            ..Default::default()
        };
        let b = FailureTrace {
            error_message: "refused".to_string(),
            ..a.clone()
        };
        assert!(!a.is_reproducible_with(&b));
    }

    #[test]
    fn test_format_contains_fields() {
        let mut trace = FailureTrace {
            correlation_id: 3,
            module: "net".to_string(),
            stage: "fetch".to_string(),
            error_message: "timeout".to_string(),
            ..Default::default()
        };
        trace.add_snapshot("url", "http://example.com/");

        let text = trace.format();
        assert!(text.contains("FailureTrace"));
        assert!(text.contains("cid:3"));
        assert!(text.contains("module: net"));
        assert!(text.contains("url=http://example.com/"));
    }

    #[test]
    fn test_collector_clear() {
        let emitter = DiagnosticEmitter::new();
        let mut collector = FailureTraceCollector::new();
        collector.capture(&emitter, "net", "fetch", "x");
        collector.clear();
        assert_eq!(collector.size(), 0);
        assert!(collector.traces().is_empty());
    }
}
