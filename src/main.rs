//! Vellum CLI - render a page to a PPM image
//!
//! The process surface around the engine core: argument handling, the
//! file-serving fetch collaborator, the PPM writer, and the exit-code
//! contract (non-zero on any failed navigation). Diagnostics go to stderr.

use std::io::Write;

use vellum::core::diagnostics::format_diagnostic;
use vellum::engine::RenderOptions;
use vellum::network::request::Fetcher;
use vellum::network::response::Response;
use vellum::renderer::paint::{
    render_to_canvas_traced, render_to_text, write_render_trace, RenderTrace,
};
use vellum::{BrowserEngine, NAME, VERSION};

/// Serves `file://` URLs from the local filesystem. Network schemes need a
/// real transport; this collaborator refuses them.
struct FileFetcher;

impl Fetcher for FileFetcher {
    fn fetch(&mut self, url: &str, _headers: &[(String, String)]) -> Response {
        let path = match url.strip_prefix("file://") {
            Some(path) => path,
            None => {
                return Response::from_error(format!(
                    "No network transport available for {}",
                    url
                ))
            }
        };
        match std::fs::read_to_string(path) {
            Ok(body) => Response::new(200, body),
            Err(err) => Response::from_error(format!("Failed to read {}: {}", path, err)),
        }
    }
}

struct CliArgs {
    input: String,
    width: i32,
    height: i32,
    output: Option<String>,
    trace_path: Option<String>,
    text_mode: bool,
}

fn parse_args() -> Option<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut parsed = CliArgs {
        input: String::new(),
        width: 1280,
        height: 720,
        output: None,
        trace_path: None,
        text_mode: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--width" => parsed.width = args.next()?.parse().ok()?,
            "--height" => parsed.height = args.next()?.parse().ok()?,
            "--output" | "-o" => parsed.output = Some(args.next()?),
            "--trace" => parsed.trace_path = Some(args.next()?),
            "--text" => parsed.text_mode = true,
            "--help" | "-h" => return None,
            other if parsed.input.is_empty() => parsed.input = other.to_string(),
            _ => return None,
        }
    }

    if parsed.input.is_empty() {
        return None;
    }
    Some(parsed)
}

fn print_usage() {
    eprintln!("{} v{}", NAME, VERSION);
    eprintln!("Usage: vellum <url|path> [--width N] [--height N] [--output FILE.ppm] [--trace FILE] [--text]");
}

fn write_ppm(canvas: &vellum::renderer::paint::Canvas, path: &str) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write!(file, "P6\n{} {}\n255\n", canvas.width(), canvas.height())?;
    file.write_all(canvas.pixels())?;
    Ok(())
}

fn main() {
    env_logger::init();

    let args = match parse_args() {
        Some(args) => args,
        None => {
            print_usage();
            std::process::exit(2);
        }
    };

    let mut engine = BrowserEngine::with_fetcher(Box::new(FileFetcher));
    let options = RenderOptions {
        viewport_width: args.width,
        viewport_height: args.height,
        ..Default::default()
    };

    let result = engine.navigate(&args.input, &options);

    for event in &engine.session().diagnostics {
        eprintln!("{}", format_diagnostic(event));
    }

    if !result.ok {
        for plan in engine.recovery_history() {
            eprintln!("{}", plan.format());
        }
        std::process::exit(1);
    }

    let pipeline = match engine.pipeline() {
        Some(pipeline) => pipeline,
        None => {
            eprintln!("navigation completed without a pipeline");
            std::process::exit(1);
        }
    };

    if args.text_mode {
        println!("{}", render_to_text(pipeline.layout(), args.width));
    }

    if let Some(trace_path) = &args.trace_path {
        let mut trace = RenderTrace::new();
        let _ = render_to_canvas_traced(pipeline.layout(), args.width, args.height, &mut trace);
        if let Err(err) = write_render_trace(&trace, trace_path) {
            eprintln!("failed to write render trace: {}", err);
            std::process::exit(1);
        }
    }

    if let Some(output) = &args.output {
        if let Err(err) = write_ppm(pipeline.canvas(), output) {
            eprintln!("failed to write {}: {}", output, err);
            std::process::exit(1);
        }
        log::info!("wrote {}x{} canvas to {}", args.width, args.height, output);
    }
}
