//! Document graphics backend: the narrow seam around the PDF library.
//!
//! Everything the pipeline needs from a PDF library goes through this module
//! and nothing else in the crate touches `lopdf` or `ttf-parser` directly.
//! That keeps the reconstruction logic testable against tiny synthesized
//! documents and leaves the door open for a different writer without
//! touching the pipeline.
//!
//! Two concrete types split the read and write sides:
//!
//! * [`SourceDocument`] — opens an existing PDF and enumerates the raster
//!   images *actually drawn* on each page, exposing their raw (still
//!   encoded, never re-encoded) stream bytes plus the minimal metadata
//!   needed to reinsert them losslessly.
//! * [`DocumentBuilder`] — assembles a fresh document: blank pages, raw
//!   image placement, and an invisible (render mode 3) text layer drawn
//!   with an embedded CID font.
//!
//! Handles are plain owned values: dropping a [`SourceDocument`] or an
//! unsaved [`DocumentBuilder`] releases it, on every exit path, exactly
//! once. There is no separate close call to forget.
//!
//! ## Coordinate convention
//!
//! All rectangles and points crossing this boundary use a **top-left
//! origin**, matching the OCR geometry the rest of the crate works in. The
//! backend converts to PDF's bottom-left space internally, in exactly one
//! place per direction.

pub mod font;
pub mod read;
pub mod write;

pub use font::FontRef;
pub use read::{ImageRef, PlacedImage, SourceDocument};
pub use write::DocumentBuilder;

/// A point in top-left-origin page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle in top-left-origin page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A raster image lifted out of a PDF without re-encoding.
///
/// `data` is the stream content exactly as stored in the source file (for a
/// JPEG scan this is the JPEG byte stream itself); the remaining fields are
/// the dictionary entries required to reinsert the stream losslessly.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub width: i64,
    pub height: i64,
    pub bits_per_component: Option<i64>,
    pub color_space: Option<ColorSpace>,
    /// Filter chain, outermost first (e.g. `["DCTDecode"]`).
    pub filters: Vec<String>,
    /// Direct-value decode parameters (CCITT `K`/`Columns`, Flate
    /// `Predictor`, ...). Images whose parameters reference other objects
    /// are rejected at extraction time.
    pub decode_parms: Option<lopdf::Dictionary>,
    pub decode: Option<Vec<f64>>,
    pub image_mask: bool,
    pub interpolate: bool,
    /// Transparency soft mask, itself a raw image.
    pub soft_mask: Option<Box<RawImage>>,
    pub data: Vec<u8>,
}

/// Color space metadata carried across the raw-copy boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    /// A named device space (`DeviceRGB`, `DeviceGray`, `DeviceCMYK`, ...).
    Device(String),
    /// Palette-indexed color; `lookup` is the decompressed palette.
    Indexed {
        base: Box<ColorSpace>,
        hival: i64,
        lookup: Vec<u8>,
    },
    /// ICC profile; `profile` is the decompressed profile data.
    Icc { components: i64, profile: Vec<u8> },
}

/// Options for [`DocumentBuilder::save`].
#[derive(Debug, Clone, Copy)]
pub struct SaveOptions {
    /// Renumber objects and compress streams before writing.
    pub compact: bool,
    /// Request linearized ("fast web view") output. The lopdf writer does
    /// not produce linearized files; the flag is accepted and logged so the
    /// call sites document their intent.
    pub linearize: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            compact: true,
            linearize: true,
        }
    }
}
