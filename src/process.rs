//! Batch orchestration: the two-phase pipeline over a directory of scans.
//!
//! Full-rewrite mode runs in two phases. Phase one parses every OCR JSON
//! and derives the **global** height cutoff ([`crate::calibrate`]); phase
//! two walks the documents one at a time, rebuilding each PDF and writing
//! its RAG JSON against that shared cutoff. The cutoff and the parsed font
//! are computed exactly once, before the document loop, and passed by
//! reference — there is no global state.
//!
//! Documents are independent: any per-document failure is recorded in the
//! [`BatchSummary`] and the batch moves on. Only the failures listed in
//! [`crate::error::RubystripError`] abort a run.

use crate::backend::{DocumentBuilder, FontRef, SaveOptions, SourceDocument};
use crate::calibrate::{self, CalibrationResult};
use crate::config::{ProcessConfig, RunMode};
use crate::error::{DocumentError, RubystripError};
use crate::ocr::{self, OcrDocument};
use crate::output::{self, ContentChunk, RagDocument};
use crate::pipeline::{chunks, discover, overlay, rebuild};
use crate::pipeline::discover::FilePair;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a finished batch looked like.
#[derive(Debug)]
pub struct BatchSummary {
    /// Matching PDF/JSON pairs found in the input directory.
    pub total_pairs: usize,
    /// Documents processed without error (including "nothing to emit").
    pub processed: usize,
    /// Per-document failures; the documents were skipped, the batch ran on.
    pub failures: Vec<(PathBuf, DocumentError)>,
    /// Where the outputs went.
    pub output_dir: PathBuf,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What one document produced.
#[derive(Debug, Default)]
struct DocumentOutcome {
    chunks: usize,
}

/// Process every matching pair in the configured input directory.
///
/// # Errors
/// Fatal, batch-aborting conditions only — see [`RubystripError`].
/// Per-document failures are collected in the returned [`BatchSummary`].
pub fn run(config: &ProcessConfig) -> Result<BatchSummary, RubystripError> {
    let pairs = discover::find_pairs(&config.input_dir)?;
    let mut summary = BatchSummary {
        total_pairs: pairs.len(),
        processed: 0,
        failures: Vec::new(),
        output_dir: config.output_dir.clone(),
    };

    if pairs.is_empty() {
        info!(dir = %config.input_dir.display(), "no matching PDF/JSON pairs found");
        return Ok(summary);
    }

    fs::create_dir_all(&config.output_dir).map_err(|source| RubystripError::OutputDirFailed {
        path: config.output_dir.clone(),
        source,
    })?;

    if let Some(ref cb) = config.progress {
        cb.on_batch_start(pairs.len());
    }

    match config.mode {
        RunMode::TextOnly => run_text_only(config, &pairs, &mut summary),
        RunMode::FullRewrite => run_full_rewrite(config, &pairs, &mut summary)?,
    }

    if let Some(ref cb) = config.progress {
        cb.on_batch_complete(summary.total_pairs, summary.processed);
    }
    info!(
        processed = summary.processed,
        failed = summary.failures.len(),
        output = %summary.output_dir.display(),
        "batch complete"
    );
    Ok(summary)
}

// ── Text-only mode ───────────────────────────────────────────────────────

fn run_text_only(config: &ProcessConfig, pairs: &[FilePair], summary: &mut BatchSummary) {
    for (index, pair) in pairs.iter().enumerate() {
        let name = pair.pdf_name();
        if let Some(ref cb) = config.progress {
            cb.on_document_start(&name, index, pairs.len());
        }
        match extract_rag_only(config, pair) {
            Ok(outcome) => {
                summary.processed += 1;
                if let Some(ref cb) = config.progress {
                    cb.on_document_complete(&name, index, pairs.len(), outcome.chunks);
                }
            }
            Err(e) => {
                warn!(document = %name, error = %e, "document skipped");
                if let Some(ref cb) = config.progress {
                    cb.on_document_error(&name, index, pairs.len(), &e.to_string());
                }
                summary.failures.push((pair.pdf.clone(), e));
            }
        }
    }
}

fn extract_rag_only(config: &ProcessConfig, pair: &FilePair) -> Result<DocumentOutcome, DocumentError> {
    info!(document = %pair.pdf_name(), "extracting RAG JSON (original PDF untouched)");
    let doc = read_ocr(&pair.json)?;
    if doc.pages.is_empty() {
        return Ok(DocumentOutcome::default());
    }

    let chunks = chunks::chunks_from_paragraphs(&doc);
    write_chunks_if_any(config, pair, chunks)
}

// ── Full-rewrite mode ────────────────────────────────────────────────────

fn run_full_rewrite(
    config: &ProcessConfig,
    pairs: &[FilePair],
    summary: &mut BatchSummary,
) -> Result<(), RubystripError> {
    // The font is loaded and parsed once, before any document is touched;
    // a bad font aborts the whole batch up front.
    let font_path = config
        .font_path
        .clone()
        .ok_or_else(|| RubystripError::InvalidConfig("FullRewrite requires a font_path".into()))?;
    if !font_path.is_file() {
        return Err(RubystripError::FontNotFound { path: font_path });
    }
    let font_data = fs::read(&font_path).map_err(|source| RubystripError::FontRead {
        path: font_path.clone(),
        source,
    })?;
    let font = FontRef::load(&font_data).map_err(|e| RubystripError::FontInvalid {
        path: font_path.clone(),
        detail: e.to_string(),
    })?;

    // Phase one: parse everything once, calibrate over the pool.
    info!("performing global line-height analysis");
    let parsed: Vec<Result<OcrDocument, DocumentError>> = pairs
        .iter()
        .map(|pair| {
            read_ocr(&pair.json).map_err(|e| {
                warn!(json = %pair.json.display(), error = %e, "unparseable OCR JSON excluded from calibration");
                e
            })
        })
        .collect();
    let calibration = calibrate::calibrate(parsed.iter().filter_map(|r| r.as_ref().ok()))?;

    // Phase two: per-document reconstruction against the shared cutoff.
    for ((index, pair), parse_result) in pairs.iter().enumerate().zip(parsed) {
        let name = pair.pdf_name();
        if let Some(ref cb) = config.progress {
            cb.on_document_start(&name, index, pairs.len());
        }
        let result = parse_result
            .and_then(|doc| process_document(config, pair, &doc, &calibration, &font));
        match result {
            Ok(outcome) => {
                summary.processed += 1;
                if let Some(ref cb) = config.progress {
                    cb.on_document_complete(&name, index, pairs.len(), outcome.chunks);
                }
            }
            Err(e) => {
                warn!(document = %name, error = %e, "document skipped");
                if let Some(ref cb) = config.progress {
                    cb.on_document_error(&name, index, pairs.len(), &e.to_string());
                }
                summary.failures.push((pair.pdf.clone(), e));
            }
        }
    }
    Ok(())
}

/// Rebuild one document: image-only PDF plus the filtered text layer and
/// RAG chunks.
fn process_document(
    config: &ProcessConfig,
    pair: &FilePair,
    ocr_doc: &OcrDocument,
    calibration: &CalibrationResult,
    font: &FontRef<'_>,
) -> Result<DocumentOutcome, DocumentError> {
    info!(document = %pair.pdf_name(), "rebuilding PDF from images");
    let pdf_out = config.output_dir.join(pair.pdf.file_name().unwrap_or_default());

    // Stage A. The source handle lives only for this block, so it is
    // released before any output is written, error or not.
    let mut builder = DocumentBuilder::new();
    {
        let src = SourceDocument::open(&pair.pdf).map_err(|source| DocumentError::PdfOpen {
            path: pair.pdf.clone(),
            source,
        })?;
        rebuild::rebuild_image_only(&src, &mut builder).map_err(|source| {
            DocumentError::PdfRebuild {
                path: pair.pdf.clone(),
                source,
            }
        })?;
    }

    // Stage B: nothing recognized means an image-only save and no RAG file.
    if ocr_doc.pages.is_empty() {
        save_builder(builder, &pair.pdf, &pdf_out)?;
        return Ok(DocumentOutcome::default());
    }

    builder.embed_font(&config.font_name, font);

    let physical_pages = builder.page_count();
    let mut page_chunks: Vec<ContentChunk> = Vec::new();
    for (index, page) in ocr_doc.pages.iter().enumerate() {
        if index >= physical_pages {
            warn!(
                document = %pair.pdf_name(),
                extra = ocr_doc.pages.len() - physical_pages,
                "OCR pages beyond the physical page count ignored"
            );
            break;
        }

        let scale = overlay::unit_scale(page);
        let main_lines = overlay::main_text_lines(page, calibration);
        if let Some(chunk) = chunks::chunk_from_lines(page, index as u32 + 1, &main_lines) {
            page_chunks.push(chunk);
        }
        overlay::overlay_page(&mut builder, index, page, &main_lines, scale).map_err(|source| {
            DocumentError::PdfRebuild {
                path: pair.pdf.clone(),
                source,
            }
        })?;
    }

    save_builder(builder, &pair.pdf, &pdf_out)?;
    write_chunks_if_any(config, pair, page_chunks)
}

// ── Shared helpers ───────────────────────────────────────────────────────

fn read_ocr(path: &Path) -> Result<OcrDocument, DocumentError> {
    let text = fs::read_to_string(path).map_err(|e| DocumentError::OcrJson {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    ocr::parse_document(&text).map_err(|e| DocumentError::OcrJson {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn save_builder(
    builder: DocumentBuilder<'_>,
    source_pdf: &Path,
    pdf_out: &Path,
) -> Result<(), DocumentError> {
    info!(out = %pdf_out.display(), "saving rebuilt PDF");
    builder
        .save(pdf_out, SaveOptions::default())
        .map_err(|source| DocumentError::PdfRebuild {
            path: source_pdf.to_path_buf(),
            source,
        })
}

fn write_chunks_if_any(
    config: &ProcessConfig,
    pair: &FilePair,
    chunks: Vec<ContentChunk>,
) -> Result<DocumentOutcome, DocumentError> {
    if chunks.is_empty() {
        return Ok(DocumentOutcome::default());
    }
    let json_out = config
        .output_dir
        .join(pair.json.file_name().unwrap_or_default());
    let rag = RagDocument {
        source_file: pair.pdf_name(),
        content_chunks: chunks,
    };
    info!(out = %json_out.display(), chunks = rag.content_chunks.len(), "saving RAG JSON");
    output::write_rag_json(&json_out, &rag).map_err(|source| DocumentError::Io {
        path: json_out,
        source,
    })?;
    Ok(DocumentOutcome {
        chunks: rag.content_chunks.len(),
    })
}
