//! Lossless in-place PDF sanitiser.
//!
//! Rebuilds each PDF strictly from its embedded raster images — same raw
//! streams, same positions — discarding all text, metadata, and vector
//! content. 100% lossless for JPEG-based scans. Independent of the main
//! furigana workflow; shares only the document graphics backend.

use anyhow::{Context, Result};
use clap::Parser;
use rubystrip::pipeline::discover;
use rubystrip::pipeline::rebuild;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Losslessly rebuild PDFs from their original images, stripping all text
/// and metadata.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-reimage",
    version,
    about = "Losslessly rebuild PDFs from their embedded images, stripping text and metadata",
    long_about = "Rebuild each PDF in a directory strictly from its embedded raster images. The \
raw image streams are copied without re-encoding, so the result is pixel-identical for \
image-based PDFs, while every text layer, metadata entry, and vector object is discarded. \
Files are replaced IN PLACE; use --backup to keep the originals."
)]
struct Cli {
    /// Directory containing PDF files.
    #[arg(long = "input_dir", env = "PDF_REIMAGE_INPUT_DIR", default_value = ".")]
    input_dir: PathBuf,

    /// Create a `<name>.bak.pdf` backup of each original before modifying it.
    #[arg(long)]
    backup: bool,

    /// Skip the confirmation prompt when no backups are requested.
    #[arg(short, long)]
    yes: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_REIMAGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_REIMAGE_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let pdfs = discover::find_pdfs(&cli.input_dir)
        .with_context(|| format!("Cannot list '{}'", cli.input_dir.display()))?;
    if pdfs.is_empty() {
        if !cli.quiet {
            eprintln!("No PDF files found in '{}'.", cli.input_dir.display());
        }
        return Ok(());
    }

    if !cli.quiet {
        eprintln!("{}", "-".repeat(60));
        eprintln!("Target Directory: {}", cli.input_dir.display());
        eprintln!("Files to process: {}", pdfs.len());
        eprintln!("Mode: Rebuilding from Images (100% lossless for JPEGs)");
        eprintln!("{}", "-".repeat(60));
    }

    if !cli.backup && !cli.yes && !confirm_destructive()? {
        eprintln!("Operation cancelled by user.");
        return Ok(());
    }

    let mut failed = 0usize;
    for pdf in &pdfs {
        if !cli.quiet {
            eprintln!(
                "Processing '{}'...",
                pdf.file_name().unwrap_or_default().to_string_lossy()
            );
        }
        if let Err(e) = rebuild::reimage_in_place(pdf, cli.backup) {
            failed += 1;
            eprintln!("  [ERROR] {e}");
        }
    }

    if !cli.quiet {
        eprintln!("{}", "-".repeat(60));
        if failed == 0 {
            eprintln!("Processing complete.");
        } else {
            eprintln!("Processing complete; {failed}/{} files failed.", pdfs.len());
        }
    }
    Ok(())
}

fn confirm_destructive() -> Result<bool> {
    eprint!(
        "You have not enabled backups. This will PERMANENTLY modify your files. Continue? (y/n): "
    );
    io::stderr().flush().ok();
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
