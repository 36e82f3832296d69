//! Browser engine facade orchestrating the navigation lifecycle
//!
//! `navigate` drives idle → fetching → parsing → styling → layout →
//! rendering → complete, emitting an Info diagnostic per transition.
//! Failures land in the terminal `Failed` state with an Error diagnostic,
//! a captured failure trace, and a recovery plan.

pub mod navigation;
pub mod pipeline;

pub use navigation::{classify_input, normalize_input, InputType, NavigationInput};
pub use pipeline::{RenderPipeline, RerenderResult};

use crate::core::config;
use crate::core::diagnostics::{DiagnosticEmitter, DiagnosticEvent, DiagnosticObserver, Severity};
use crate::core::lifecycle::LifecycleStage;
use crate::core::recovery::{RecoveryController, RecoveryPlan};
use crate::core::trace::FailureTraceCollector;
use crate::network::cache::{CachePolicy, ResponseCache};
use crate::network::request::{fetch_with_policy, Fetcher};
use crate::network::response::Response;
use crate::network::url::resolve_url;
use crate::renderer::css::load_linked_css;
use crate::renderer::html::HtmlParser;
use crate::security::RequestPolicy;
use std::time::Instant;

/// Options for a navigation
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub viewport_width: i32,
    pub viewport_height: i32,
    /// Document bytes supplied directly, bypassing the fetch collaborator
    pub html: Option<String>,
    /// Caller CSS applied before any `<style>` or `<link>` sheet
    pub inline_css: String,
    pub policy: RequestPolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            viewport_width: config::DEFAULT_VIEWPORT_WIDTH as i32,
            viewport_height: config::DEFAULT_VIEWPORT_HEIGHT as i32,
            html: None,
            inline_css: String::new(),
            policy: RequestPolicy::default(),
        }
    }
}

/// Everything recorded about one navigation
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub stage: LifecycleStage,
    pub navigation: NavigationInput,
    pub diagnostics: Vec<DiagnosticEvent>,
}

impl SessionInfo {
    fn new() -> Self {
        Self {
            stage: LifecycleStage::Idle,
            navigation: NavigationInput::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn current_stage(&self) -> LifecycleStage {
        self.stage
    }
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a navigation
#[derive(Debug, Clone)]
pub struct EngineResult {
    pub ok: bool,
    pub message: String,
    pub session: SessionInfo,
}

/// Fetcher used until a collaborator is plugged in
struct NullFetcher;

impl Fetcher for NullFetcher {
    fn fetch(&mut self, _url: &str, _headers: &[(String, String)]) -> Response {
        Response::from_error("No fetch collaborator configured")
    }
}

/// The browser engine facade
pub struct BrowserEngine {
    fetcher: Box<dyn Fetcher>,
    cache: ResponseCache,
    emitter: DiagnosticEmitter,
    traces: FailureTraceCollector,
    recovery: RecoveryController,
    session: SessionInfo,
    pipeline: Option<RenderPipeline>,
    last_input: String,
    last_options: Option<RenderOptions>,
}

impl BrowserEngine {
    /// Create an engine with no fetch collaborator; only direct-HTML and
    /// data-URL navigations will succeed.
    pub fn new() -> Self {
        Self::with_fetcher(Box::new(NullFetcher))
    }

    /// Create an engine around a fetch collaborator
    pub fn with_fetcher(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            cache: ResponseCache::new(CachePolicy::NoCache),
            emitter: DiagnosticEmitter::new(),
            traces: FailureTraceCollector::new(),
            recovery: RecoveryController::new(),
            session: SessionInfo::new(),
            pipeline: None,
            last_input: String::new(),
            last_options: None,
        }
    }

    /// Drive a full navigation for the given input
    pub fn navigate(&mut self, input: &str, options: &RenderOptions) -> EngineResult {
        self.last_input = input.to_string();
        self.last_options = Some(options.clone());

        self.emitter.clear();
        self.pipeline = None;
        self.session = SessionInfo::new();
        self.emit_stage_transition(LifecycleStage::Idle);

        let navigation = match normalize_input(input) {
            Ok(navigation) => navigation,
            Err(message) => return self.fail("engine", &message),
        };
        self.emitter.emit(
            Severity::Info,
            "engine",
            self.session.current_stage().name(),
            &format!(
                "Navigation target: {} (type: {})",
                navigation.canonical_url,
                navigation.input_type.name()
            ),
        );
        self.session.navigation = navigation;

        self.transition(LifecycleStage::Fetching);
        let html_source = match self.obtain_document_source(options) {
            Ok(source) => source,
            Err(message) => return self.fail("network", &message),
        };

        self.transition(LifecycleStage::Parsing);
        let parse_result = HtmlParser::new().parse_with_diagnostics(&html_source);
        for warning in &parse_result.warnings {
            self.emitter
                .emit(Severity::Warning, "html", "parsing", &warning.message);
        }

        self.transition(LifecycleStage::Styling);
        let css_result = {
            let base_url = self.session.navigation.canonical_url.clone();
            let policy = options.policy.clone();
            let fetcher = self.fetcher.as_mut();
            let mut fetch_css = |href: &str| -> Option<String> {
                let resolved = resolve_url(&base_url, href)?;
                let txn = fetch_with_policy(&resolved, &policy, &mut *fetcher, None);
                if txn.response.is_error() {
                    None
                } else {
                    Some(txn.response.body)
                }
            };
            load_linked_css(
                &parse_result.document.root,
                &options.inline_css,
                Some(&mut fetch_css),
            )
        };
        for warning in &css_result.warnings {
            self.emitter.emit(Severity::Warning, "css", "styling", warning);
        }

        self.transition(LifecycleStage::Layout);
        self.transition(LifecycleStage::Rendering);
        let pipeline = RenderPipeline::new(
            parse_result.document,
            css_result.merged,
            options.viewport_width,
            options.viewport_height,
        );
        self.pipeline = Some(pipeline);

        self.transition(LifecycleStage::Complete);
        self.finish(true, "OK")
    }

    /// Re-run the previous navigation, preserving its diagnostics with a
    /// retry marker in between.
    pub fn retry(&mut self) -> EngineResult {
        if self.last_input.is_empty() {
            return EngineResult {
                ok: false,
                message: "No previous navigation to retry".to_string(),
                session: self.session.clone(),
            };
        }

        let mut prior = std::mem::take(&mut self.session.diagnostics);
        prior.push(DiagnosticEvent {
            timestamp: Instant::now(),
            severity: Severity::Info,
            module: "engine".to_string(),
            stage: self.session.current_stage().name().to_string(),
            message: format!(
                "Retry requested from stage: {}",
                self.session.current_stage().name()
            ),
            correlation_id: self.emitter.correlation_id(),
        });

        let input = self.last_input.clone();
        let options = self.last_options.clone().unwrap_or_default();
        let mut result = self.navigate(&input, &options);

        prior.extend(self.session.diagnostics.drain(..));
        self.session.diagnostics = prior;
        result.session = self.session.clone();
        result
    }

    fn obtain_document_source(&mut self, options: &RenderOptions) -> Result<String, String> {
        if let Some(html) = &options.html {
            return Ok(html.clone());
        }

        let url = self.session.navigation.canonical_url.clone();

        if self.session.navigation.input_type == InputType::DataUrl {
            return navigation::data_url_body(&url)
                .ok_or_else(|| format!("Malformed data URL: {}", url));
        }

        let mut cached = Response::default();
        if self.cache.lookup(&url, &mut cached) {
            self.emitter.emit(
                Severity::Info,
                "network",
                self.session.current_stage().name(),
                &format!("Cache hit: {}", url),
            );
            return Ok(cached.body);
        }

        let txn = fetch_with_policy(&url, &options.policy, self.fetcher.as_mut(), None);
        if txn.response.is_error() {
            return Err(txn.response.error);
        }
        self.cache.store(&url, &txn.response);
        Ok(txn.response.body)
    }

    /// Emit the per-transition Info diagnostic and advance the machine
    fn transition(&mut self, next: LifecycleStage) {
        let current = self.session.current_stage();
        if !current.can_transition_to(next) {
            // A backwards or out-of-terminal transition is an internal
            // invariant violation: surface it and fail the session.
            self.emitter.emit(
                Severity::Error,
                "engine",
                current.name(),
                &format!(
                    "Illegal lifecycle transition: {} -> {}",
                    current.name(),
                    next.name()
                ),
            );
            self.session.stage = LifecycleStage::Failed;
            return;
        }
        self.emit_stage_transition(next);
    }

    fn emit_stage_transition(&mut self, stage: LifecycleStage) {
        self.session.stage = stage;
        self.emitter.emit(
            Severity::Info,
            "engine",
            stage.name(),
            &format!("Stage transition: {}", stage.name()),
        );
    }

    fn fail(&mut self, module: &str, message: &str) -> EngineResult {
        let stage_name = self.session.current_stage().name().to_string();
        self.emitter
            .emit(Severity::Error, module, &stage_name, message);

        let trace = self
            .traces
            .capture(&self.emitter, module, &stage_name, message);
        let plan = self.recovery.plan_from_trace(&trace);
        log::warn!("navigation failed: {}\n{}", message, plan.format());

        self.transition(LifecycleStage::Failed);
        self.finish(false, message)
    }

    fn finish(&mut self, ok: bool, message: &str) -> EngineResult {
        self.session.diagnostics = self.emitter.events().to_vec();
        EngineResult {
            ok,
            message: message.to_string(),
            session: self.session.clone(),
        }
    }

    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    pub fn current_stage(&self) -> LifecycleStage {
        self.session.current_stage()
    }

    pub fn pipeline(&self) -> Option<&RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn pipeline_mut(&mut self) -> Option<&mut RenderPipeline> {
        self.pipeline.as_mut()
    }

    /// Traces captured for failed navigations
    pub fn failure_traces(&self) -> &FailureTraceCollector {
        &self.traces
    }

    /// Recovery plans produced for failed navigations
    pub fn recovery_history(&self) -> &[RecoveryPlan] {
        self.recovery.history()
    }

    /// Change the response cache policy
    pub fn set_cache_policy(&mut self, policy: CachePolicy) {
        self.cache.set_policy(policy);
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Register a diagnostic observer for future navigations
    pub fn add_diagnostic_observer(&mut self, observer: DiagnosticObserver) {
        self.emitter.add_observer(observer);
    }

    /// Set the correlation id stamped onto future diagnostics
    pub fn set_correlation_id(&mut self, id: u64) {
        self.emitter.set_correlation_id(id);
    }
}

impl Default for BrowserEngine {
    fn default() -> Self {
        Self::new()
    }
}
