//! CLI binary for rubystrip.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessConfig`, resolves the text-layer font, and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rubystrip::{run, BatchProgressCallback, ProcessConfig, ProgressCallback, RunMode};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// File name of the bundled fallback font, looked up beside the binary.
const DEFAULT_FONT_NAME: &str = "NotoSansJP-Regular.ttf";

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

/// Terminal progress callback: a per-document progress bar with one log
/// line per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} documents  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, name: &str, _index: usize, _total: usize) {
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, name: &str, _index: usize, _total: usize, chunks: usize) {
        self.bar.println(format!(
            "  {} {:<40} {}",
            green("✓"),
            name,
            dim(&format!("{chunks} chunks")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, name: &str, _index: usize, _total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.len() > 100 {
            format!("{}\u{2026}", &error[..99])
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<40} {}", red("✗"), name, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(succeeded);
        if failed == 0 {
            eprintln!(
                "{} {} documents processed",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents processed  ({} failed)",
                cyan("⚠"),
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract RAG JSON only (original PDFs untouched)
  rubystrip --input_dir scans --output_dir out --text-only

  # Remove furigana: rebuilt PDFs + filtered RAG JSON
  rubystrip --input_dir scans --output_dir out --rewrite --font_path NotoSansJP-Regular.ttf

  # Interactive mode selection (y/n prompt, default: text-only)
  rubystrip --input_dir scans

INPUT PAIRING:
  Every *.pdf in the input directory with a same-stem *.json sibling forms a
  processing pair. PDFs without OCR JSON are skipped silently.

HOW FURIGANA REMOVAL WORKS:
  Line heights are pooled across the WHOLE batch; the cutoff is the 90th
  percentile of those heights times 0.70. Lines below the cutoff (the ruby
  glosses) are dropped from both the invisible text layer and the RAG JSON.
  The rebuilt PDFs contain only the original raster images — raw streams,
  no re-encoding — plus the filtered, searchable text layer.

FONT:
  Full-rewrite mode embeds a TrueType font for the text layer. Without
  --font_path, NotoSansJP-Regular.ttf is looked up beside the binary.
"#;

/// Remove furigana from OCR'd scanned PDFs and extract RAG-ready text.
#[derive(Parser, Debug)]
#[command(
    name = "rubystrip",
    version,
    about = "Remove furigana from OCR'd scanned PDFs and extract RAG-ready text",
    long_about = "Process OCR-annotated scanned documents: optionally rebuild each PDF from its \
raster images with a furigana-filtered invisible text layer, and always emit a per-page JSON \
extraction suitable for RAG ingestion.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing PDF/OCR-JSON pairs.
    #[arg(long = "input_dir", env = "RUBYSTRIP_INPUT_DIR", default_value = ".")]
    input_dir: PathBuf,

    /// Directory for rebuilt PDFs and RAG JSON files.
    #[arg(long = "output_dir", env = "RUBYSTRIP_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Path to a .ttf font for the rebuilt text layer.
    #[arg(long = "font_path", env = "RUBYSTRIP_FONT_PATH")]
    font_path: Option<PathBuf>,

    /// Enable furigana removal (rebuild PDFs) without prompting.
    #[arg(long, conflicts_with = "text_only")]
    rewrite: bool,

    /// RAG JSON only, originals untouched, without prompting.
    #[arg(long)]
    text_only: bool,

    /// Disable the progress bar.
    #[arg(long, env = "RUBYSTRIP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RUBYSTRIP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RUBYSTRIP_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides the per-document feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Mode selection ───────────────────────────────────────────────────
    let mode = if cli.rewrite {
        RunMode::FullRewrite
    } else if cli.text_only {
        RunMode::TextOnly
    } else {
        prompt_for_mode()?
    };

    match mode {
        RunMode::FullRewrite => {
            if !cli.quiet {
                eprintln!("Mode: Full Processing (New PDF + RAG JSON).");
            }
        }
        RunMode::TextOnly => {
            if !cli.quiet {
                eprintln!("Mode: RAG JSON-Only (Original PDFs will not be modified).");
            }
        }
    }

    // ── Font resolution (full-rewrite only) ──────────────────────────────
    let font_path = match mode {
        RunMode::FullRewrite => Some(resolve_font(&cli)?),
        RunMode::TextOnly => None,
    };

    // ── Build config and run ─────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = ProcessConfig::builder()
        .input_dir(&cli.input_dir)
        .output_dir(&cli.output_dir)
        .mode(mode);
    if let Some(path) = font_path {
        builder = builder.font_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // Any fatal library error (missing font, missing input directory,
    // nothing to calibrate) surfaces here and exits with code 1.
    let summary = run(&config)?;

    if !cli.quiet {
        for (path, error) in &summary.failures {
            eprintln!("{} {}: {}", red("✗"), path.display(), error);
        }
        eprintln!("{}", dim(&"-".repeat(60)));
        eprintln!("Processing complete.");
        eprintln!(
            "Output files saved to: {}",
            bold(&summary.output_dir.display().to_string())
        );
    }
    Ok(())
}

/// Interactive y/n gate for the destructive mode. Default: text-only.
fn prompt_for_mode() -> Result<RunMode> {
    eprint!("Enable furigana removal? (This will create new PDFs) (y/n) [default: n]: ");
    io::stderr().flush().ok();
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read mode selection")?;
    Ok(if answer.trim().eq_ignore_ascii_case("y") {
        RunMode::FullRewrite
    } else {
        RunMode::TextOnly
    })
}

/// Resolve the font: explicit flag first, otherwise the bundled default
/// beside the executable.
fn resolve_font(cli: &Cli) -> Result<PathBuf> {
    if let Some(ref path) = cli.font_path {
        if !path.is_file() {
            bail!("Font file not found at '{}'", path.display());
        }
        return Ok(path.clone());
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    let fallback = exe_dir.join(DEFAULT_FONT_NAME);
    if !cli.quiet {
        eprintln!("INFO: --font_path not specified. Searching for '{DEFAULT_FONT_NAME}'...");
    }
    if !fallback.is_file() {
        bail!(
            "Default font not found. Place '{DEFAULT_FONT_NAME}' next to the binary or use --font_path."
        );
    }
    if !cli.quiet {
        eprintln!("INFO: Found and using default font: {}", fallback.display());
    }
    Ok(fallback)
}
