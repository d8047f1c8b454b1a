//! Pipeline stages for OCR'd-scan reconstruction.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and keeps the batch
//! orchestration in [`crate::process`] free of geometry and PDF detail.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ calibrate ──▶ rebuild ──▶ overlay ──▶ chunks
//! (pairing)    (global       (Stage A:   (Stage B:    (RAG JSON)
//!               cutoff)       images)     text layer)
//! ```
//!
//! 1. [`discover`] — pair each `*.pdf` with its same-stem `*.json` sibling
//! 2. [`rebuild`]  — Stage A: copy every drawn raster image, raw bytes and
//!    all, onto blank same-sized pages; nothing else survives
//! 3. [`overlay`]  — Stage B: invisible text for the words of main-text
//!    lines, associated through span containment
//! 4. [`chunks`]   — page-level text chunks for RAG ingestion
//!
//! Calibration sits outside this module ([`crate::calibrate`]) because it
//! runs once per batch, not once per document.

pub mod chunks;
pub mod discover;
pub mod overlay;
pub mod rebuild;
