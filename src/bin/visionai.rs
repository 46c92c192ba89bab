//! CLI binary for visionai.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, runs one action on one image, prints the chosen
//! presentation and writes any requested exports.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use visionai::pipeline::keywords::extract_keywords;
use visionai::pipeline::postprocess::clean_response;
use visionai::screen::{elements, render_terminal, select};
use visionai::{
    export_to_dir, format_output, AnalysisConfig, AnalysisOutcome, AnalysisProgressCallback,
    AnalysisRequest, DetailLevel, ExportKind, ExportOptions, GeneratedOutput, ModelStage,
    OutputFormat, OutputKind, OutputMetadata, ProgressCallback, Session,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner with one log line per finished model call.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the model call currently in flight.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading image…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, source: &str) {
        self.bar.set_prefix("Analysing");
        self.bar.println(format!("{} {}", cyan("◆"), bold(&format!("Analysing {source}…"))));
    }

    fn on_model_call_start(&self, stage: ModelStage) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(format!("{stage}"));
    }

    fn on_model_call_complete(&self, stage: ModelStage, chars: usize) {
        let unit = match stage {
            ModelStage::Identify => "chars",
            ModelStage::RelatedQuestions => "questions",
        };
        self.bar.println(format!(
            "  {} {:<18}  {:<14}  {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{chars:>5} {unit}")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
    }

    fn on_model_call_error(&self, stage: ModelStage, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<18}  {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
    }

    fn on_analysis_complete(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Identify an image (plain text on stdout)
  visionai cat.jpg

  # Detailed structured report
  visionai --detail large --format structured cat.jpg

  # Identify from a URL and export a PDF report
  visionai https://example.com/cat.jpg --export pdf --out-dir reports

  # Focus the analysis on a keyword
  visionai --focus whiskers cat.jpg

  # Ask a follow-up question
  visionai --ask "How old is this cat?" cat.jpg

  # Format an existing analysis without calling a model
  visionai --text analysis.txt --format json --export json --export pdf

SUPPORTED IMAGE TYPES:
  PNG, JPEG, GIF, WebP (detected from the file contents)

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Identify images with Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "visionai",
    version,
    about = "Identify images with Vision LLMs and export the analysis",
    long_about = "Identify images (local files or URLs) with Vision Language Models and present \
the analysis as plain text, a JSON section tree or a structured report. Results can be exported \
as .txt, .json or paginated .pdf files.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "text")]
    input: Option<String>,

    /// Detail level: short, medium, large.
    #[arg(short, long, env = "VISIONAI_DETAIL", default_value = "medium")]
    detail: DetailLevel,

    /// Presentation printed on screen and used for PDF bodies: plain, json, structured.
    #[arg(short, long, env = "VISIONAI_FORMAT", default_value = "plain")]
    format: OutputFormat,

    /// Regenerate the analysis focusing on this keyword.
    #[arg(long, value_name = "KEYWORD", conflicts_with = "ask")]
    focus: Option<String>,

    /// Ask a question about the image.
    #[arg(long, value_name = "QUESTION")]
    ask: Option<String>,

    /// Export the result: txt, json or pdf. Repeatable.
    #[arg(short, long = "export", value_name = "TYPE")]
    exports: Vec<ExportKind>,

    /// Directory for exported files.
    #[arg(short, long, env = "VISIONAI_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Format an existing analysis text file instead of calling a model.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["focus", "ask"])]
    text: Option<PathBuf>,

    /// Leave the detail level out of export file names and contents.
    #[arg(long)]
    no_detail_in_export: bool,

    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: gemini, openai, anthropic, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Retries per model call on failure.
    #[arg(long, env = "VISIONAI_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "VISIONAI_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "VISIONAI_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Downscale images whose longest edge exceeds this many pixels (0 = never).
    #[arg(long, env = "VISIONAI_MAX_IMAGE_EDGE", default_value_t = 2048)]
    max_image_edge: u32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "VISIONAI_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the spinner.
    #[arg(long, env = "VISIONAI_NO_PROGRESS")]
    no_progress: bool,

    /// Disable ANSI colour in the printed result.
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VISIONAI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long, env = "VISIONAI_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters while it runs, so
    // library INFO logs are only shown when it is off.
    let show_progress = !cli.quiet && !cli.no_progress && cli.text.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let output = match cli.text {
        Some(ref path) => offline_output(&cli, path).await?,
        None => {
            let progress_cb: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
            } else {
                None
            };
            match run_model(&cli, progress_cb).await? {
                AnalysisOutcome::Completed(out) => out,
                AnalysisOutcome::Failed(failure) => {
                    eprintln!("{} {}", red("✘"), failure);
                    std::process::exit(1);
                }
            }
        }
    };

    // ── Print ────────────────────────────────────────────────────────────
    let color = !cli.no_color && io::stdout().is_terminal();
    let metadata = Some(&output.metadata).filter(|m| !m.is_empty());
    let formatted = format_output(&output.content, metadata);
    let text = select(&formatted, cli.format);
    // The JSON presentation already carries the metadata.
    let trailer = metadata.filter(|_| cli.format != OutputFormat::Json);
    print!("{}", render_terminal(&elements(text, cli.format), trailer, color));

    // ── Export ───────────────────────────────────────────────────────────
    let options = ExportOptions {
        format: cli.format,
        include_detail_level: !cli.no_detail_in_export,
        ..Default::default()
    };
    for kind in &cli.exports {
        let path = export_to_dir(&output, *kind, &cli.out_dir, &options)
            .await
            .with_context(|| format!("Failed to export {kind}"))?;
        if !cli.quiet {
            eprintln!("{}  {}  →  {}", green("✔"), kind, bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Load the image and run the requested action.
async fn run_model(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisOutcome> {
    let config = build_config(cli, progress)?;
    let input = cli.input.as_deref().context("No input image given")?;

    let mut session = Session::new(config).context("Failed to set up the model")?;
    session
        .load_image(input)
        .await
        .with_context(|| format!("Failed to load image {input}"))?;

    let request = match (&cli.focus, &cli.ask) {
        (Some(keyword), _) => AnalysisRequest::FocusKeyword(keyword.clone()),
        (None, Some(question)) => AnalysisRequest::AskQuestion(question.clone()),
        (None, None) => AnalysisRequest::Describe,
    };
    let started = Instant::now();
    let outcome = session.run(request).await.context("Analysis failed")?;

    if !cli.quiet {
        if let AnalysisOutcome::Completed(ref out) = outcome {
            eprintln!(
                "{}  {}  {}  {}",
                green("✔"),
                out.kind.label(),
                dim(&format!("detail: {}", out.detail_level.label())),
                dim(&format!("{}ms", started.elapsed().as_millis())),
            );
        }
    }
    Ok(outcome)
}

/// Build an output from an existing analysis file. Keywords come from the
/// text; there are no related questions without a model.
async fn offline_output(cli: &Cli, path: &Path) -> Result<GeneratedOutput> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read analysis text from {:?}", path))?;
    let content = clean_response(&raw);
    let keywords = extract_keywords(&content, AnalysisConfig::default().keyword_limit);
    let now = Local::now();

    Ok(GeneratedOutput {
        id: u64::try_from(now.timestamp_millis()).unwrap_or(0),
        kind: OutputKind::Analysis,
        content,
        timestamp: now,
        format: cli.format,
        detail_level: cli.detail,
        metadata: OutputMetadata::new(keywords, Vec::new()),
    })
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .detail_level(cli.detail)
        .format(cli.format)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .max_image_edge(Some(cli.max_image_edge).filter(|&px| px > 0))
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
