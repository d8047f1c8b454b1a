//! Stage B: the invisible, furigana-filtered text layer.
//!
//! Lines at or above the global height cutoff are main text; their words
//! are found through span containment (lines and words arrive as separate,
//! unlinked arrays) and re-inserted invisibly on the rebuilt page so the
//! output stays searchable without repainting anything.
//!
//! The insertion anchor is the word polygon's 4th vertex (indices 6,7) —
//! the bottom-left corner in the usual OCR winding — at a fixed size of 11.
//! This approximates the original glyph position well enough for selection
//! and search; anchor computation from all four corners is not attempted.

use crate::backend::{DocumentBuilder, Point};
use crate::calibrate::CalibrationResult;
use crate::error::BackendError;
use crate::ocr::{OcrLine, OcrPage, OcrWord};

/// Fixed size of the invisible overlay text.
pub const OVERLAY_FONT_SIZE: f64 = 11.0;

/// OCR engines reporting geometry in inches need scaling into PDF points.
pub const INCH_TO_POINTS: f64 = 72.0;

/// Coordinate scale for a page: ×72 for inch-based geometry, ×1 otherwise.
pub fn unit_scale(page: &OcrPage) -> f64 {
    if page.unit.as_deref() == Some("inch") {
        INCH_TO_POINTS
    } else {
        1.0
    }
}

/// The lines classified as main text under the global cutoff.
pub fn main_text_lines<'a>(
    page: &'a OcrPage,
    calibration: &CalibrationResult,
) -> Vec<&'a OcrLine> {
    page.lines
        .iter()
        .filter(|line| calibration.is_main_text(line.height()))
        .collect()
}

/// The words belonging to `line` by span containment: a word belongs when
/// its span offset falls in `[offset, offset + length)` of any line span.
pub fn words_in_line<'a>(line: &OcrLine, page: &'a OcrPage) -> Vec<&'a OcrWord> {
    let mut words = Vec::new();
    for span in &line.spans {
        if span.interval().is_none() {
            continue;
        }
        for word in &page.words {
            let belongs = word
                .span
                .as_ref()
                .and_then(|s| s.offset)
                .map(|offset| span.contains(offset))
                .unwrap_or(false);
            if belongs {
                words.push(word);
            }
        }
    }
    words
}

/// Insertion anchor for a word, scaled into PDF points.
///
/// `None` for degenerate polygons; such words are skipped.
pub fn word_anchor(word: &OcrWord, scale: f64) -> Option<Point> {
    let poly = word.polygon.as_deref()?;
    if poly.len() < 8 {
        return None;
    }
    Some(Point {
        x: poly[6] * scale,
        y: poly[7] * scale,
    })
}

/// Write the invisible text for one page's main-text lines.
///
/// Words lacking a polygon or text are skipped; everything else lands at
/// its anchor with [`OVERLAY_FONT_SIZE`].
pub fn overlay_page(
    builder: &mut DocumentBuilder<'_>,
    page_index: usize,
    page: &OcrPage,
    main_lines: &[&OcrLine],
    scale: f64,
) -> Result<(), BackendError> {
    for line in main_lines {
        for word in words_in_line(line, page) {
            let Some(text) = word.content.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            let Some(anchor) = word_anchor(word, scale) else {
                continue;
            };
            builder.insert_invisible_text(page_index, anchor, text, OVERLAY_FONT_SIZE)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrSpan;

    fn word(offset: u64, text: &str) -> OcrWord {
        OcrWord {
            polygon: Some(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]),
            content: Some(text.to_string()),
            span: Some(OcrSpan {
                offset: Some(offset),
                length: text.len() as u64,
            }),
        }
    }

    fn line_with_span(offset: u64, length: u64) -> OcrLine {
        OcrLine {
            spans: vec![OcrSpan {
                offset: Some(offset),
                length,
            }],
            ..OcrLine::default()
        }
    }

    #[test]
    fn word_belongs_to_exactly_one_line() {
        let page = OcrPage {
            words: vec![word(15, "語")],
            ..OcrPage::default()
        };
        let covering = line_with_span(10, 10); // [10, 20)
        let adjacent = line_with_span(20, 5); // [20, 25)

        assert_eq!(words_in_line(&covering, &page).len(), 1);
        assert!(words_in_line(&adjacent, &page).is_empty());
    }

    #[test]
    fn containment_boundary_is_inclusive_start_exclusive_end() {
        let page = OcrPage {
            words: vec![word(10, "a"), word(20, "b")],
            ..OcrPage::default()
        };
        let line = line_with_span(10, 10);
        let found: Vec<&str> = words_in_line(&line, &page)
            .iter()
            .filter_map(|w| w.content.as_deref())
            .collect();
        assert_eq!(found, ["a"]);
    }

    #[test]
    fn words_without_span_offset_never_match() {
        let mut w = word(0, "x");
        w.span = Some(OcrSpan {
            offset: None,
            length: 1,
        });
        let page = OcrPage {
            words: vec![w],
            ..OcrPage::default()
        };
        assert!(words_in_line(&line_with_span(0, 100), &page).is_empty());
    }

    #[test]
    fn anchor_uses_fourth_vertex_and_unit_scale() {
        let w = OcrWord {
            polygon: Some(vec![1.0, 1.0, 2.0, 1.0, 2.0, 1.5, 1.0, 1.5]),
            content: Some("x".into()),
            span: None,
        };
        let inch = word_anchor(&w, INCH_TO_POINTS).unwrap();
        assert_eq!((inch.x, inch.y), (72.0, 108.0));

        let native = word_anchor(&w, 1.0).unwrap();
        assert_eq!((native.x, native.y), (1.0, 1.5));
    }

    #[test]
    fn degenerate_polygon_has_no_anchor() {
        let mut w = word(0, "x");
        w.polygon = Some(vec![1.0, 2.0]);
        assert!(word_anchor(&w, 1.0).is_none());
        w.polygon = None;
        assert!(word_anchor(&w, 1.0).is_none());
    }

    #[test]
    fn unit_scale_only_triggers_on_inch() {
        let inch_page = OcrPage {
            unit: Some("inch".into()),
            ..OcrPage::default()
        };
        let pixel_page = OcrPage {
            unit: Some("pixel".into()),
            ..OcrPage::default()
        };
        assert_eq!(unit_scale(&inch_page), 72.0);
        assert_eq!(unit_scale(&pixel_page), 1.0);
        assert_eq!(unit_scale(&OcrPage::default()), 1.0);
    }

    #[test]
    fn main_text_filter_uses_cutoff_inclusively() {
        let tall = OcrLine {
            polygon: Some(vec![0.0, 0.0, 9.0, 0.0, 9.0, 21.0, 0.0, 21.0]),
            ..OcrLine::default()
        };
        let short = OcrLine {
            polygon: Some(vec![0.0, 0.0, 9.0, 0.0, 9.0, 15.0, 0.0, 15.0]),
            ..OcrLine::default()
        };
        let page = OcrPage {
            lines: vec![tall, short],
            ..OcrPage::default()
        };
        let calibration = CalibrationResult { cutoff: 21.0 };
        let kept = main_text_lines(&page, &calibration);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].height(), 21.0);
    }
}
