//! Structured diagnostics: severity-tagged events with correlation IDs
//!
//! The emitter keeps an ordered event log and fans each event out to
//! registered observers. Timestamps are monotonic per emitter. This is the
//! structured product surface; operational logging goes through `log`.

use std::time::Instant;

/// Diagnostic severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Lowercase severity name (part of the public string contract)
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single diagnostic event
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    pub timestamp: Instant,
    pub severity: Severity,
    pub module: String,
    pub stage: String,
    pub message: String,
    pub correlation_id: u64,
}

/// Render an event as `[severity] module/stage: message`, with ` cid:<n>`
/// appended when a correlation id is set.
pub fn format_diagnostic(event: &DiagnosticEvent) -> String {
    let mut out = format!(
        "[{}] {}/{}: {}",
        event.severity.name(),
        event.module,
        event.stage,
        event.message
    );
    if event.correlation_id != 0 {
        out.push_str(&format!(" cid:{}", event.correlation_id));
    }
    out
}

/// Callback invoked for each emitted event. Observers receive events by
/// reference and must not re-enter `emit` on the same emitter.
pub type DiagnosticObserver = Box<dyn Fn(&DiagnosticEvent)>;

/// Ordered event log with severity filtering and observer fan-out
pub struct DiagnosticEmitter {
    events: Vec<DiagnosticEvent>,
    observers: Vec<DiagnosticObserver>,
    correlation_id: u64,
    min_severity: Severity,
}

impl DiagnosticEmitter {
    /// Create an emitter that records everything from `Info` up
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            observers: Vec::new(),
            correlation_id: 0,
            min_severity: Severity::Info,
        }
    }

    /// Record an event if it meets the severity floor, then notify observers
    /// in registration order.
    pub fn emit(&mut self, severity: Severity, module: &str, stage: &str, message: &str) {
        if severity < self.min_severity {
            return;
        }

        let event = DiagnosticEvent {
            timestamp: Instant::now(),
            severity,
            module: module.to_string(),
            stage: stage.to_string(),
            message: message.to_string(),
            correlation_id: self.correlation_id,
        };

        self.events.push(event);
        if let Some(event) = self.events.last() {
            for observer in &self.observers {
                observer(event);
            }
        }
    }

    /// Set the correlation id for future events; already-recorded events
    /// keep the id they were emitted with.
    pub fn set_correlation_id(&mut self, id: u64) {
        self.correlation_id = id;
    }

    pub fn correlation_id(&self) -> u64 {
        self.correlation_id
    }

    /// Set the minimum severity recorded by this emitter
    pub fn set_min_severity(&mut self, min: Severity) {
        self.min_severity = min;
    }

    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// Register an observer; observers survive `clear()`
    pub fn add_observer(&mut self, observer: DiagnosticObserver) {
        self.observers.push(observer);
    }

    /// All recorded events, in emission order
    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    /// Stable-order view of events with the given severity
    pub fn events_by_severity(&self, severity: Severity) -> Vec<&DiagnosticEvent> {
        self.events
            .iter()
            .filter(|e| e.severity == severity)
            .collect()
    }

    /// Stable-order view of events from the given module
    pub fn events_by_module(&self, module: &str) -> Vec<&DiagnosticEvent> {
        self.events.iter().filter(|e| e.module == module).collect()
    }

    /// Drop all recorded events; observers are retained
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn size(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for DiagnosticEmitter {
    fn default() -> Self {
        Self::new()
    }
}
