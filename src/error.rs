//! Error types for the rubystrip library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RubystripError`] — **Fatal**: the batch cannot proceed at all
//!   (missing font in rewrite mode, no calibratable lines anywhere in the
//!   batch, missing input directory). Returned as `Err(RubystripError)` from
//!   [`crate::process::run`].
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (unparseable
//!   OCR JSON, corrupt PDF, write failure) but the rest of the batch is fine.
//!   Collected into [`crate::process::BatchSummary`] so callers can inspect
//!   partial success rather than losing a whole directory to one bad scan.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! document failure, log and continue, or collect all errors for a post-run
//! report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the rubystrip library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::process::BatchSummary`] rather than propagated here.
#[derive(Debug, Error)]
pub enum RubystripError {
    /// The font file for the invisible text layer was not found.
    #[error("Font file not found: '{path}'\nPlace NotoSansJP-Regular.ttf next to the binary or use --font_path.")]
    FontNotFound { path: PathBuf },

    /// The font file exists but could not be read.
    #[error("Failed to read font file '{path}': {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The font file is not a parseable TrueType font.
    #[error("Invalid TrueType font '{path}': {detail}")]
    FontInvalid { path: PathBuf, detail: String },

    /// The input directory does not exist.
    #[error("Input directory not found: '{path}'")]
    InputDirNotFound { path: PathBuf },

    /// The input directory exists but could not be listed.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Calibration found no text lines across the entire batch.
    ///
    /// Every OCR JSON in the run was empty or unparseable, so there is
    /// nothing to derive a height cutoff from.
    #[error("Could not extract any text lines from the OCR JSON files for calibration")]
    NoCalibrationLines,
}

/// A non-fatal error for a single document.
///
/// The batch continues with the next document; all failures are reported in
/// [`crate::process::BatchSummary::failures`].
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The OCR JSON sibling could not be read or parsed.
    #[error("Failed to parse OCR JSON '{path}': {detail}")]
    OcrJson { path: PathBuf, detail: String },

    /// The source PDF could not be opened or traversed.
    #[error("Failed to open PDF '{path}': {source}")]
    PdfOpen {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    /// Rebuilding or saving the output PDF failed.
    #[error("Failed to rebuild PDF for '{path}': {source}")]
    PdfRebuild {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    /// A plain filesystem failure (backup copy, atomic rename, JSON write).
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the document graphics backend.
///
/// These never carry file paths; [`DocumentError`] wraps them with the
/// document they belong to.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The PDF object graph is missing something we need or is corrupt.
    #[error("malformed PDF: {0}")]
    Malformed(String),

    /// A page index past the end of the document was requested.
    #[error("page index {index} out of range ({count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// An embedded image uses a feature the raw-copy path cannot carry over.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// Text or font operations issued in an invalid order or with bad data.
    #[error("font error: {0}")]
    Font(String),

    /// Writing the document to disk failed.
    #[error("write failed: {0}")]
    Write(String),
}
