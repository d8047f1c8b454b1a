//! Normalized view over heterogeneous OCR result JSON.
//!
//! OCR engines that produce the input we consume disagree on two levels:
//!
//! * **Container shape** — the page array lives under `pages`,
//!   `analyzeResult.pages`, or `readResults` depending on the service and
//!   API version. [`parse_document`] tries the candidates in that priority
//!   order and takes the first non-empty match.
//! * **Field names** — per-item geometry is `polygon` or `boundingBox`, text
//!   is `content` or `text`. These are declared as serde aliases so either
//!   spelling deserialises into the one canonical struct.
//!
//! Both fallbacks fail *softly*: a document that matches no known shape
//! yields an empty page list, which downstream code treats as "nothing to
//! process", never as an error.

use serde::Deserialize;

/// One parsed OCR result file, reduced to its page sequence.
#[derive(Debug, Clone, Default)]
pub struct OcrDocument {
    pub pages: Vec<OcrPage>,
}

/// A single page of OCR output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrPage {
    /// 1-based page number as reported by the OCR engine.
    #[serde(rename = "pageNumber", alias = "page", default)]
    pub page_number: Option<u32>,

    /// Linear unit of the polygon coordinates. `"inch"` means geometry must
    /// be scaled by 72 to reach PDF points; anything else (or absent) is
    /// taken as already being in point/pixel space.
    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    pub lines: Vec<OcrLine>,

    #[serde(default)]
    pub words: Vec<OcrWord>,

    #[serde(default)]
    pub paragraphs: Vec<OcrParagraph>,
}

/// A recognized text line: polygon, spans into the page text, content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrLine {
    #[serde(default, alias = "boundingBox")]
    pub polygon: Option<Vec<f64>>,

    #[serde(default, alias = "text")]
    pub content: Option<String>,

    #[serde(default)]
    pub spans: Vec<OcrSpan>,
}

/// A recognized word with a single span into the page text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrWord {
    #[serde(default, alias = "boundingBox")]
    pub polygon: Option<Vec<f64>>,

    #[serde(default, alias = "text")]
    pub content: Option<String>,

    #[serde(default)]
    pub span: Option<OcrSpan>,
}

/// A paragraph; only its text matters (text-only extraction path).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrParagraph {
    #[serde(default, alias = "text")]
    pub content: Option<String>,
}

/// An offset+length interval into a page's logical text string.
///
/// Lines and words are emitted as separate, unlinked arrays; spans are the
/// sole mechanism associating them.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OcrSpan {
    #[serde(default)]
    pub offset: Option<u64>,

    #[serde(default)]
    pub length: u64,
}

impl OcrSpan {
    /// Half-open interval `[offset, offset + length)`, or `None` when the
    /// engine omitted the offset.
    pub fn interval(&self) -> Option<(u64, u64)> {
        self.offset.map(|o| (o, o + self.length))
    }

    /// Whether `offset` falls inside this span (inclusive start, exclusive
    /// end).
    pub fn contains(&self, offset: u64) -> bool {
        self.interval()
            .map(|(start, end)| offset >= start && offset < end)
            .unwrap_or(false)
    }
}

impl OcrLine {
    /// Vertical extent of the line polygon; 0 for degenerate polygons.
    pub fn height(&self) -> f64 {
        self.polygon.as_deref().map(polygon_height).unwrap_or(0.0)
    }
}

/// Vertical extent of a flat `[x0, y0, x1, y1, ...]` polygon.
///
/// Returns 0 when the polygon has fewer than 4 points; otherwise
/// max(y) − min(y) over the odd-indexed coordinates.
pub fn polygon_height(polygon: &[f64]) -> f64 {
    if polygon.len() < 8 {
        return 0.0;
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for y in polygon.iter().skip(1).step_by(2) {
        min = min.min(*y);
        max = max.max(*y);
    }
    max - min
}

// ── Container fallback ───────────────────────────────────────────────────

/// Raw top-level shape of the OCR JSON before normalization.
#[derive(Debug, Deserialize)]
struct OcrEnvelope {
    #[serde(default)]
    pages: Option<Vec<OcrPage>>,

    #[serde(rename = "analyzeResult", default)]
    analyze_result: Option<AnalyzeResult>,

    #[serde(rename = "readResults", default)]
    read_results: Option<Vec<OcrPage>>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

impl OcrEnvelope {
    /// First non-empty container wins; no match yields an empty sequence.
    fn into_pages(self) -> Vec<OcrPage> {
        if let Some(pages) = self.pages.filter(|p| !p.is_empty()) {
            return pages;
        }
        if let Some(result) = self.analyze_result.filter(|r| !r.pages.is_empty()) {
            return result.pages;
        }
        if let Some(pages) = self.read_results.filter(|p| !p.is_empty()) {
            return pages;
        }
        Vec::new()
    }
}

/// Parse one OCR result file into the normalized document shape.
///
/// Accepts a leading UTF-8 byte-order mark (several OCR services write
/// `utf-8-sig` output).
pub fn parse_document(text: &str) -> Result<OcrDocument, serde_json::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let envelope: OcrEnvelope = serde_json::from_str(text)?;
    Ok(OcrDocument {
        pages: envelope.into_pages(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_height_is_y_extent() {
        let poly = [0.0, 1.0, 10.0, 1.0, 10.0, 4.5, 0.0, 4.5];
        assert_eq!(polygon_height(&poly), 3.5);
    }

    #[test]
    fn degenerate_polygon_has_zero_height() {
        assert_eq!(polygon_height(&[]), 0.0);
        assert_eq!(polygon_height(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), 0.0);
        let line = OcrLine::default();
        assert_eq!(line.height(), 0.0);
    }

    #[test]
    fn span_containment_is_half_open() {
        let span = OcrSpan {
            offset: Some(10),
            length: 10,
        };
        assert!(span.contains(10));
        assert!(span.contains(15));
        assert!(span.contains(19));
        assert!(!span.contains(20));
        assert!(!span.contains(9));

        let no_offset = OcrSpan {
            offset: None,
            length: 10,
        };
        assert!(!no_offset.contains(0));
    }

    #[test]
    fn top_level_pages_and_analyze_result_normalize_identically() {
        let flat = r#"{"pages": [{"pageNumber": 1, "lines": [{"polygon": [0,0,1,0,1,2,0,2], "content": "hi"}]}]}"#;
        let nested = r#"{"analyzeResult": {"pages": [{"pageNumber": 1, "lines": [{"polygon": [0,0,1,0,1,2,0,2], "content": "hi"}]}]}}"#;

        let a = parse_document(flat).unwrap();
        let b = parse_document(nested).unwrap();

        assert_eq!(a.pages.len(), 1);
        assert_eq!(b.pages.len(), 1);
        assert_eq!(a.pages[0].page_number, b.pages[0].page_number);
        assert_eq!(
            a.pages[0].lines[0].content,
            b.pages[0].lines[0].content
        );
        assert_eq!(a.pages[0].lines[0].height(), b.pages[0].lines[0].height());
    }

    #[test]
    fn empty_pages_falls_through_to_read_results() {
        let json = r#"{"pages": [], "readResults": [{"page": 2, "lines": []}]}"#;
        let doc = parse_document(json).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].page_number, Some(2));
    }

    #[test]
    fn unknown_shape_yields_empty_not_error() {
        let doc = parse_document(r#"{"status": "succeeded"}"#).unwrap();
        assert!(doc.pages.is_empty());
    }

    #[test]
    fn bounding_box_and_text_aliases() {
        let json = r#"{"pages": [{"lines": [{"boundingBox": [0,0,5,0,5,3,0,3], "text": "alias"}]}]}"#;
        let doc = parse_document(json).unwrap();
        let line = &doc.pages[0].lines[0];
        assert_eq!(line.content.as_deref(), Some("alias"));
        assert_eq!(line.height(), 3.0);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let json = "\u{feff}{\"pages\": [{\"pageNumber\": 1}]}";
        let doc = parse_document(json).unwrap();
        assert_eq!(doc.pages.len(), 1);
    }
}
