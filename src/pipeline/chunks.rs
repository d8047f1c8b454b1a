//! RAG chunk extraction.
//!
//! One chunk per page with non-empty retained text; pages with nothing to
//! say are omitted entirely rather than emitted as empty chunks, so
//! downstream ingestion never indexes blank content.

use crate::ocr::{OcrDocument, OcrLine, OcrPage};
use crate::output::ContentChunk;

/// Chunk for one page from its retained (main-text) lines, newline-joined.
///
/// `fallback_number` stands in when the OCR engine omitted the page number
/// (1-based position in the document).
pub fn chunk_from_lines(
    page: &OcrPage,
    fallback_number: u32,
    lines: &[&OcrLine],
) -> Option<ContentChunk> {
    let content = lines
        .iter()
        .filter_map(|line| line.content.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if content.is_empty() {
        return None;
    }
    Some(ContentChunk::page(
        page.page_number.unwrap_or(fallback_number),
        content,
    ))
}

/// Text-only mode: chunks from **all** paragraphs, no height filtering,
/// blank-line separated.
pub fn chunks_from_paragraphs(doc: &OcrDocument) -> Vec<ContentChunk> {
    doc.pages
        .iter()
        .enumerate()
        .filter_map(|(index, page)| {
            let paragraphs: Vec<&str> = page
                .paragraphs
                .iter()
                .filter_map(|p| p.content.as_deref())
                .filter(|text| !text.is_empty())
                .collect();
            if paragraphs.is_empty() {
                return None;
            }
            Some(ContentChunk::page(
                page.page_number.unwrap_or(index as u32 + 1),
                paragraphs.join("\n\n"),
            ))
        })
        .collect()
}
