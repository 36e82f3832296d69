//! Integration tests for the vellum engine
//!
//! These tests verify the components work together correctly across the
//! full pipeline: parsing, styling, layout, paint, policy enforcement,
//! caching, diagnostics, and the scripting bridge.
//! Run with: cargo test --test integration_tests

use proptest::prelude::*;
use vellum::bridge::{DomEvent, EventRegistry, EventType};
use vellum::core::diagnostics::Severity;
use vellum::core::lifecycle::LifecycleStage;
use vellum::core::recovery::{RecoveryAction, RecoveryController};
use vellum::engine::{BrowserEngine, RenderOptions, RenderPipeline};
use vellum::network::cache::{CachePolicy, ResponseCache};
use vellum::network::response::Response;
use vellum::network::url::canonical_origin;
use vellum::renderer::css::CssParser;
use vellum::renderer::dom::serialize_dom;
use vellum::renderer::html::HtmlParser;
use vellum::renderer::layout::{serialize_layout, LayoutEngine};
use vellum::renderer::paint::{render_to_canvas, render_to_canvas_traced, RenderTrace};
use vellum::security::{
    check_cors_response_policy, check_request_policy, PolicyViolation, RequestPolicy,
};

/// Test fixtures - HTML pages for testing
mod fixtures {
    pub const SIMPLE_PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Test Page</title>
            <style>
                h1 { color: red; font-size: 32px; }
                .highlight { background-color: yellow; }
                #main { padding: 20px; }
            </style>
        </head>
        <body>
            <div id="main">
                <h1>Welcome</h1>
                <p class="highlight">This is a test paragraph.</p>
                <a href="/link">Click here</a>
                <ul>
                    <li>Item 1</li>
                    <li>Item 2</li>
                </ul>
            </div>
        </body>
        </html>
    "#;

    pub const MALFORMED_PAGE: &str = "<div><p>Hi<span>Bye</div>";

    pub const MUTATION_PAGE: &str = r#"
        <html><body>
            <div id="status">idle</div>
            <button id="go">Start</button>
        </body></html>
    "#;
}

// ============================================================================
// FULL PIPELINE TESTS
// ============================================================================

mod pipeline_tests {
    use super::*;

    fn build_pipeline(html: &str, css: &str, width: i32, height: i32) -> RenderPipeline {
        let document = HtmlParser::new().parse(html).unwrap();
        let stylesheet = CssParser::new().parse(css).unwrap();
        RenderPipeline::new(document, stylesheet, width, height)
    }

    #[test]
    fn test_simple_page_renders() {
        let pipeline = build_pipeline(fixtures::SIMPLE_PAGE, "", 800, 600);
        assert_eq!(pipeline.render_count(), 1);
        assert_eq!(pipeline.canvas().width(), 800);
        assert!(!pipeline.canvas().pixels().is_empty());
    }

    #[test]
    fn test_style_blocks_feed_the_cascade() {
        let mut engine = BrowserEngine::new();
        let result = engine.navigate(
            "http://example.com/",
            &RenderOptions {
                viewport_width: 800,
                viewport_height: 600,
                html: Some(fixtures::SIMPLE_PAGE.to_string()),
                ..Default::default()
            },
        );
        assert!(result.ok);

        // The <style> sheet reached layout: #main carries 20px padding.
        let pipeline = engine.pipeline().unwrap();
        let layout_dump = serialize_layout(pipeline.layout());
        assert!(layout_dump.contains("tag:div"));

        let query = pipeline.query_by_id("main");
        assert!(query.ok);
        assert_eq!(query.elements[0].tag_name, "div");
    }

    #[test]
    fn test_rerender_after_mutations_is_deterministic() {
        let run = || {
            let mut pipeline = build_pipeline(fixtures::MUTATION_PAGE, "", 320, 240);
            pipeline.set_text_by_id("status", "running");
            pipeline.set_style_by_id("status", "backgroundColor", "yellow");
            pipeline.rerender();
            pipeline.set_text_by_id("status", "done");
            pipeline.rerender();
            (
                pipeline.render_count(),
                pipeline.canvas().pixels().to_vec(),
            )
        };

        let (count_a, pixels_a) = run();
        let (count_b, pixels_b) = run();
        assert_eq!(count_a, 3);
        assert_eq!(count_a, count_b);
        assert_eq!(pixels_a, pixels_b);
    }

    #[test]
    fn test_event_dispatch_then_rerender() {
        let mut pipeline = build_pipeline(fixtures::MUTATION_PAGE, "", 320, 240);
        let mut registry = EventRegistry::new();
        registry.add_listener(
            "go",
            EventType::Click,
            Box::new(|doc, _| {
                vellum::bridge::set_text_by_id(doc, "status", "clicked");
            }),
        );

        let result = pipeline.dispatch_event(&registry, &DomEvent::new(EventType::Click, "go"));
        assert!(result.ok);
        pipeline.rerender();

        assert_eq!(
            pipeline.query_by_id("status").elements[0].text_content,
            "clicked"
        );
        assert_eq!(pipeline.render_count(), 2);
    }

    #[test]
    fn test_dispatch_without_handler() {
        let mut pipeline = build_pipeline(fixtures::MUTATION_PAGE, "", 320, 240);
        let registry = EventRegistry::new();
        let result =
            pipeline.dispatch_event(&registry, &DomEvent::new(EventType::Change, "status"));
        assert!(result.ok);
        assert_eq!(result.message, "No handler for event");
    }
}

// ============================================================================
// DETERMINISM TESTS
// ============================================================================

mod determinism_tests {
    use super::*;

    #[test]
    fn test_parse_deterministic_for_malformed_input() {
        let parser = HtmlParser::new();
        let first = parser.parse_with_diagnostics(fixtures::MALFORMED_PAGE);
        let second = parser.parse_with_diagnostics(fixtures::MALFORMED_PAGE);

        assert_eq!(
            serialize_dom(&first.document.root),
            serialize_dom(&second.document.root)
        );
        assert_eq!(first.warnings, second.warnings);
        assert!(first
            .warnings
            .iter()
            .any(|w| w.message.contains("implicitly closed")));
    }

    #[test]
    fn test_layout_identical_over_100_runs() {
        let document = HtmlParser::new()
            .parse("<div><span>text</span></div>")
            .unwrap();
        let stylesheet = CssParser::new()
            .parse("div{padding:5px;}span{font-size:14px;}")
            .unwrap();
        let engine = LayoutEngine::new();

        let reference = serialize_layout(&engine.layout_document(&document, &stylesheet, 800));
        for _ in 0..100 {
            let layout = engine.layout_document(&document, &stylesheet, 800);
            assert_eq!(serialize_layout(&layout), reference);
        }
    }

    #[test]
    fn test_100_renders_produce_identical_pixels() {
        let document = HtmlParser::new()
            .parse("<div><span>text</span></div>")
            .unwrap();
        let stylesheet = CssParser::new()
            .parse("div{padding:5px;}span{font-size:14px;}")
            .unwrap();
        let layout = LayoutEngine::new().layout_document(&document, &stylesheet, 800);

        let reference = render_to_canvas(&layout, 800, 600);
        for _ in 0..100 {
            assert_eq!(
                render_to_canvas(&layout, 800, 600).pixels(),
                reference.pixels()
            );
        }
    }

    #[test]
    fn test_traced_and_untraced_renders_bit_identical() {
        let document = HtmlParser::new().parse(fixtures::SIMPLE_PAGE).unwrap();
        let stylesheet = CssParser::new().parse("body { background: gray; }").unwrap();
        let layout = LayoutEngine::new().layout_document(&document, &stylesheet, 640);

        let plain = render_to_canvas(&layout, 640, 480);
        let mut trace = RenderTrace::new();
        let traced = render_to_canvas_traced(&layout, 640, 480, &mut trace);

        assert_eq!(plain.pixels(), traced.pixels());
        assert_eq!(trace.entries.len(), 4);
    }

    #[test]
    fn test_two_engines_same_mutations_byte_identical_canvases() {
        let run = || {
            let mut engine = BrowserEngine::new();
            engine.navigate(
                "http://example.com/",
                &RenderOptions {
                    viewport_width: 400,
                    viewport_height: 300,
                    html: Some(fixtures::MUTATION_PAGE.to_string()),
                    ..Default::default()
                },
            );
            let pipeline = engine.pipeline_mut().unwrap();
            pipeline.set_style_by_id("status", "color", "red");
            pipeline.set_text_by_id("status", "again");
            pipeline.rerender();
            pipeline.canvas().pixels().to_vec()
        };

        assert_eq!(run(), run());
    }
}

// ============================================================================
// REQUEST POLICY TESTS
// ============================================================================

mod policy_tests {
    use super::*;

    #[test]
    fn test_boundary_csp_path_traversal() {
        let policy = RequestPolicy {
            enforce_connect_src: true,
            connect_src_sources: vec!["https://api.example.com/v1/".to_string()],
            ..Default::default()
        };

        let result = check_request_policy("https://api.example.com/v1/../admin", &policy);
        assert_eq!(result.violation, PolicyViolation::CspConnectSrcBlocked);

        let result = check_request_policy("https://api.example.com/v1/%2e%2e/admin", &policy);
        assert_eq!(result.violation, PolicyViolation::CspConnectSrcBlocked);
    }

    #[test]
    fn test_boundary_csp_wildcard_apex() {
        let policy = RequestPolicy {
            enforce_connect_src: true,
            connect_src_sources: vec!["https://*.example.com".to_string()],
            ..Default::default()
        };

        assert_eq!(
            check_request_policy("https://example.com/", &policy).violation,
            PolicyViolation::CspConnectSrcBlocked
        );
        assert!(check_request_policy("https://cdn.example.com/", &policy).allowed);
    }

    #[test]
    fn test_boundary_credentialed_cors_wildcard() {
        let policy = RequestPolicy {
            origin: "https://app.example.com".to_string(),
            credentials_mode_include: true,
            ..Default::default()
        };
        let mut response = Response::new(200, "");
        response.add_header("Access-Control-Allow-Origin", "*");
        response.add_header("Access-Control-Allow-Credentials", "true");

        let result =
            check_cors_response_policy("https://api.example.com/data", &response, &policy);
        assert!(!result.allowed);
        assert_eq!(result.violation, PolicyViolation::CorsResponseBlocked);
    }

    #[test]
    fn test_boundary_cors_null_origin() {
        let mut response = Response::new(200, "");
        response.add_header("Access-Control-Allow-Origin", "null");

        let null_policy = RequestPolicy {
            origin: "null".to_string(),
            ..Default::default()
        };
        assert!(
            check_cors_response_policy("https://api.example.com/", &response, &null_policy)
                .allowed
        );

        let concrete_policy = RequestPolicy {
            origin: "https://app.example.com".to_string(),
            ..Default::default()
        };
        assert!(
            !check_cors_response_policy("https://api.example.com/", &response, &concrete_policy)
                .allowed
        );
    }

    #[test]
    fn test_same_origin_implies_cross_origin_gate_passes() {
        let urls = [
            "http://example.com/a",
            "https://api.example.com:8443/x?q=1",
            "http://sub.example.org/deep/path",
        ];
        for url in urls {
            let origin = canonical_origin(url).unwrap();
            let policy = RequestPolicy {
                allow_cross_origin: false,
                origin,
                ..Default::default()
            };
            assert!(
                check_request_policy(url, &policy).allowed,
                "same-origin gate should pass for {}",
                url
            );
        }
    }

    #[test]
    fn test_policy_check_purity() {
        let policy = RequestPolicy {
            enforce_connect_src: true,
            connect_src_sources: vec!["'self'".to_string(), "https://cdn.example.com".to_string()],
            origin: "https://app.example.com".to_string(),
            allow_cross_origin: false,
            ..Default::default()
        };
        for url in [
            "https://app.example.com/a",
            "https://cdn.example.com/lib.js",
            "",
            "ftp://example.com/x",
        ] {
            let first = check_request_policy(url, &policy);
            for _ in 0..5 {
                assert_eq!(check_request_policy(url, &policy), first);
            }
        }
    }
}

// ============================================================================
// CACHE TESTS
// ============================================================================

mod cache_tests {
    use super::*;

    #[test]
    fn test_boundary_cache_policy_swap() {
        let mut cache = ResponseCache::new(CachePolicy::CacheAll);
        cache.store("http://example.com/", &Response::new(200, "body"));

        cache.set_policy(CachePolicy::NoCache);
        let mut out = Response::default();
        assert!(!cache.lookup("http://example.com/", &mut out));
    }

    #[test]
    fn test_error_responses_never_served() {
        let mut cache = ResponseCache::new(CachePolicy::CacheAll);
        cache.store("http://example.com/", &Response::from_error("boom"));

        let mut out = Response::default();
        assert!(!cache.lookup("http://example.com/", &mut out));
        assert_eq!(cache.size(), 0);
    }
}

// ============================================================================
// LIFECYCLE & DIAGNOSTICS TESTS
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_navigation_emits_every_stage_transition() {
        let mut engine = BrowserEngine::new();
        engine.navigate(
            "http://example.com/",
            &RenderOptions {
                html: Some("<p>x</p>".to_string()),
                ..Default::default()
            },
        );

        let stages: Vec<&str> = engine
            .session()
            .diagnostics
            .iter()
            .filter(|e| e.message.starts_with("Stage transition:"))
            .map(|e| e.stage.as_str())
            .collect();
        assert_eq!(
            stages,
            vec![
                "idle",
                "fetching",
                "parsing",
                "styling",
                "layout",
                "rendering",
                "complete"
            ]
        );
        assert_eq!(engine.current_stage(), LifecycleStage::Complete);
    }

    #[test]
    fn test_failed_navigation_produces_trace_and_plan() {
        let mut engine = BrowserEngine::new();
        let result = engine.navigate("http://unfetchable.example/", &RenderOptions::default());

        assert!(!result.ok);
        assert_eq!(engine.current_stage(), LifecycleStage::Failed);

        assert_eq!(engine.failure_traces().size(), 1);
        let trace = &engine.failure_traces().traces()[0];
        assert!(trace.is_reproducible_with(trace));

        let plan = &engine.recovery_history()[0];
        assert!(plan.has_action(RecoveryAction::Cancel));
        assert!(plan.format().contains("Recovery Plan"));
    }

    #[test]
    fn test_failed_navigations_reproduce_each_other() {
        let navigate_once = || {
            let mut engine = BrowserEngine::new();
            engine.navigate("http://unfetchable.example/", &RenderOptions::default());
            engine.failure_traces().traces()[0].clone()
        };

        let first = navigate_once();
        let second = navigate_once();
        assert!(first.is_reproducible_with(&second));
    }

    #[test]
    fn test_session_diagnostics_ordered() {
        let mut engine = BrowserEngine::new();
        engine.navigate(
            "http://example.com/",
            &RenderOptions {
                html: Some(fixtures::MALFORMED_PAGE.to_string()),
                ..Default::default()
            },
        );

        let diagnostics = &engine.session().diagnostics;
        assert!(diagnostics.len() > 7);
        for pair in diagnostics.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        // Parser recovery surfaced as warnings
        assert!(diagnostics
            .iter()
            .any(|e| e.severity == Severity::Warning && e.module == "html"));
    }

    #[test]
    fn test_recovery_planner_always_ends_with_cancel() {
        let mut controller = RecoveryController::new();
        for (module, stage) in [
            ("network", "fetch"),
            ("html", "parse"),
            ("renderer", "paint"),
            ("anything", "else"),
        ] {
            let plan = controller.plan_from_stage(module, stage, "failure");
            assert_eq!(
                plan.steps.last().unwrap().action,
                RecoveryAction::Cancel,
                "{}/{} must end with Cancel",
                module,
                stage
            );
        }
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #[test]
    fn test_html_parsing_never_panics(html in ".*") {
        let parser = HtmlParser::new();
        let _ = parser.parse_with_diagnostics(&html);
    }

    #[test]
    fn test_html_parsing_deterministic(html in ".*") {
        let parser = HtmlParser::new();
        let first = parser.parse_with_diagnostics(&html);
        let second = parser.parse_with_diagnostics(&html);
        prop_assert_eq!(
            serialize_dom(&first.document.root),
            serialize_dom(&second.document.root)
        );
        prop_assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn test_css_parsing_never_panics(css in ".*") {
        let parser = CssParser::new();
        let _ = parser.parse(&css);
    }

    #[test]
    fn test_url_parsing_never_panics(url in ".*") {
        let _ = vellum::network::url::parse_url(&url);
    }

    #[test]
    fn test_policy_check_never_panics(url in ".*") {
        let policy = RequestPolicy::default();
        let _ = check_request_policy(&url, &policy);
    }

    #[test]
    fn test_canonical_origin_idempotent(url in "[a-z]{1,6}://[a-z0-9.]{1,20}(:[0-9]{1,5})?(/[a-z]{0,10})?") {
        if let Some(origin) = canonical_origin(&url) {
            prop_assert_eq!(canonical_origin(&origin), Some(origin.clone()));
        }
    }
}
