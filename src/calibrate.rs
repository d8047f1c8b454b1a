//! Corpus-wide height calibration.
//!
//! The furigana classifier needs a single height threshold separating main
//! text from annotation glosses. Deriving that threshold per document would
//! miscalibrate documents that contain only small print, so the cutoff is
//! computed **once per batch** over the pooled line heights of every
//! document, then shared read-only by every per-document reconstruction.
//!
//! The formula: the 90th percentile of all positive line heights
//! approximates the dominant main-text size robustly against outliers
//! (headers, title pages) without being skewed by the larger population of
//! small furigana glyphs. Multiplying by 0.70 leaves a margin below
//! main-text height so that furigana (typically ~50% of main-text height)
//! falls under the cutoff while ordinary main-text variance does not.

use crate::error::RubystripError;
use crate::ocr::OcrDocument;
use tracing::{info, warn};

/// Percentile of the pooled heights taken as the main-text benchmark.
pub const MAIN_TEXT_BENCHMARK_PERCENTILE: f64 = 90.0;

/// Fraction of the benchmark height below which a line counts as annotation.
pub const ANNOTATION_HEIGHT_RATIO: f64 = 0.70;

/// The immutable result of the calibration pass.
///
/// Computed once per batch, then passed by reference into every
/// per-document call; there is deliberately no other channel for the cutoff
/// to travel through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    /// Lines with height `>= cutoff` are main text; everything below is
    /// annotation. A cutoff of 0.0 classifies every line as main text.
    pub cutoff: f64,
}

impl CalibrationResult {
    /// A calibration that retains everything (no filtering).
    pub fn retain_all() -> Self {
        Self { cutoff: 0.0 }
    }

    pub fn is_main_text(&self, height: f64) -> bool {
        height >= self.cutoff
    }
}

/// Derive the global height cutoff from every line of every document.
///
/// # Errors
/// [`RubystripError::NoCalibrationLines`] when the pooled line set is empty
/// (every OCR JSON in the batch was empty or unparseable) — there is nothing
/// to calibrate against and full processing cannot proceed.
///
/// Zero *positive* heights is only a degraded case: the cutoff falls back to
/// 0.0 (everything classified as main text) with a warning.
pub fn calibrate<'a, I>(documents: I) -> Result<CalibrationResult, RubystripError>
where
    I: IntoIterator<Item = &'a OcrDocument>,
{
    let mut total_lines = 0usize;
    let mut heights: Vec<f64> = Vec::new();

    for doc in documents {
        for page in &doc.pages {
            for line in &page.lines {
                total_lines += 1;
                let h = line.height();
                if h > 0.0 {
                    heights.push(h);
                }
            }
        }
    }

    if total_lines == 0 {
        return Err(RubystripError::NoCalibrationLines);
    }

    if heights.is_empty() {
        warn!("no positive line heights found; furigana removal will retain everything");
        return Ok(CalibrationResult::retain_all());
    }

    let benchmark = percentile(&mut heights, MAIN_TEXT_BENCHMARK_PERCENTILE);
    let cutoff = benchmark * ANNOTATION_HEIGHT_RATIO;
    info!(
        benchmark,
        cutoff,
        lines = total_lines,
        "global furigana height cutoff determined"
    );

    Ok(CalibrationResult { cutoff })
}

/// Percentile with linear interpolation between closest ranks.
///
/// Sorts `values` in place. `values` must be non-empty.
fn percentile(values: &mut [f64], pct: f64) -> f64 {
    debug_assert!(!values.is_empty());
    values.sort_by(|a, b| a.total_cmp(b));

    let rank = (values.len() - 1) as f64 * pct / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    values[lo] + (values[hi] - values[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{OcrLine, OcrPage};

    fn doc_with_heights(heights: &[f64]) -> OcrDocument {
        let lines = heights
            .iter()
            .map(|h| OcrLine {
                polygon: Some(vec![0.0, 0.0, 10.0, 0.0, 10.0, *h, 0.0, *h]),
                ..OcrLine::default()
            })
            .collect();
        OcrDocument {
            pages: vec![OcrPage {
                lines,
                ..OcrPage::default()
            }],
        }
    }

    #[test]
    fn percentile_interpolates_linearly() {
        // 90 tens and 10 twenties: rank 89.1 sits between the last 10 and
        // the first 20.
        let mut heights: Vec<f64> = std::iter::repeat(10.0)
            .take(90)
            .chain(std::iter::repeat(20.0).take(10))
            .collect();
        let p90 = percentile(&mut heights, 90.0);
        assert!((p90 - 11.0).abs() < 1e-9, "got {p90}");
    }

    #[test]
    fn percentile_of_uniform_values() {
        let mut heights = vec![30.0; 9];
        assert_eq!(percentile(&mut heights, 90.0), 30.0);
    }

    #[test]
    fn cutoff_is_order_independent() {
        let a = doc_with_heights(&[12.0, 30.0, 31.0, 29.5, 6.0]);
        let b = doc_with_heights(&[6.0, 29.5, 31.0, 30.0, 12.0]);
        let r1 = calibrate(std::iter::once(&a)).unwrap();
        let r2 = calibrate(std::iter::once(&b)).unwrap();
        assert_eq!(r1.cutoff, r2.cutoff);
    }

    #[test]
    fn cutoff_formula_applies_ratio_to_benchmark() {
        let doc = doc_with_heights(
            &std::iter::repeat(10.0)
                .take(90)
                .chain(std::iter::repeat(20.0).take(10))
                .collect::<Vec<_>>(),
        );
        let result = calibrate(std::iter::once(&doc)).unwrap();
        // Linear-interpolation p90 of this multiset is 11.0.
        assert!((result.cutoff - 7.7).abs() < 1e-9, "got {}", result.cutoff);
        assert!(result.is_main_text(20.0));
        assert!(!result.is_main_text(7.0));
    }

    #[test]
    fn pooled_batch_scenario() {
        // Document A: five main-text lines. Document B: four main-text lines
        // plus one furigana line at half height. Pooling keeps the benchmark
        // anchored to the dominant height.
        let a = doc_with_heights(&[30.0; 5]);
        let b = doc_with_heights(&[30.0, 30.0, 30.0, 30.0, 15.0]);
        let result = calibrate([&a, &b]).unwrap();
        assert!((result.cutoff - 21.0).abs() < 1e-9, "got {}", result.cutoff);
        assert!(result.is_main_text(30.0));
        assert!(!result.is_main_text(15.0));
    }

    #[test]
    fn empty_batch_is_fatal() {
        let doc = OcrDocument::default();
        let err = calibrate(std::iter::once(&doc)).unwrap_err();
        assert!(matches!(err, RubystripError::NoCalibrationLines));
    }

    #[test]
    fn degenerate_heights_fall_back_to_retain_all() {
        // Lines exist but every polygon is degenerate.
        let doc = OcrDocument {
            pages: vec![OcrPage {
                lines: vec![OcrLine::default(), OcrLine::default()],
                ..OcrPage::default()
            }],
        };
        let result = calibrate(std::iter::once(&doc)).unwrap();
        assert_eq!(result.cutoff, 0.0);
        assert!(result.is_main_text(0.0));
    }
}
