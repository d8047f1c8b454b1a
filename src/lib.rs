//! # rubystrip
//!
//! Strip furigana ruby glosses from OCR'd scanned PDFs and extract
//! RAG-ready text chunks.
//!
//! ## Why this crate?
//!
//! Scanned Japanese documents carry furigana — small phonetic glosses
//! printed above the base text. OCR engines dutifully transcribe them,
//! which wrecks both the searchable text layer (every word appears twice,
//! once phonetically) and any retrieval corpus built from the output.
//! Furigana can be told apart from main text purely by line height, but
//! only reliably when the threshold is derived across the whole batch: a
//! document set entirely in small print would miscalibrate against itself.
//!
//! ## Pipeline Overview
//!
//! ```text
//! directory of (scan.pdf, scan.json) pairs
//!  │
//!  ├─ 1. Discover   pair PDFs with same-stem OCR JSON siblings
//!  ├─ 2. Calibrate  pool every line height → one global cutoff
//!  │                (90th percentile × 0.70)
//!  ├─ 3. Rebuild    blank pages + raw image streams, nothing else
//!  ├─ 4. Overlay    invisible text for main-text words only
//!  └─ 5. Chunks     per-page RAG JSON (pages with nothing kept are omitted)
//! ```
//!
//! In text-only mode (the default) steps 2–4 are skipped and the chunks
//! come from all OCR paragraphs, unfiltered; original PDFs are never
//! modified.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rubystrip::{run, ProcessConfig, RunMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProcessConfig::builder()
//!         .input_dir("scans")
//!         .output_dir("out")
//!         .mode(RunMode::FullRewrite)
//!         .font_path("NotoSansJP-Regular.ttf")
//!         .build()?;
//!     let summary = run(&config)?;
//!     eprintln!(
//!         "{}/{} documents processed",
//!         summary.processed, summary.total_pairs
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `rubystrip` and `pdf-reimage` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! rubystrip = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod calibrate;
pub mod config;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use calibrate::{calibrate, CalibrationResult};
pub use config::{ProcessConfig, ProcessConfigBuilder, RunMode};
pub use error::{BackendError, DocumentError, RubystripError};
pub use ocr::{parse_document, polygon_height, OcrDocument, OcrPage};
pub use output::{ContentChunk, RagDocument};
pub use process::{run, BatchSummary};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
