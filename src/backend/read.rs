//! Read side of the backend: raw image enumeration and extraction.
//!
//! Image placement is recovered by walking each page's content stream with a
//! small graphics-state machine (`q`/`Q`/`cm`/`Do`). This mirrors what a
//! viewer does and therefore reports where images are *drawn*, not merely
//! which ones sit unused in the resource dictionary. Form XObjects are
//! followed to a bounded depth because scanners occasionally wrap the page
//! image in one.

use crate::error::BackendError;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;
use tracing::{debug, warn};

use super::{ColorSpace, RawImage, Rect};

/// Nested Form XObjects deeper than this are ignored.
const MAX_FORM_DEPTH: usize = 4;

/// Fallback when a page carries no MediaBox anywhere in its ancestry.
const US_LETTER: (f64, f64) = (612.0, 792.0);

/// A handle to an image stream inside a [`SourceDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub(crate) id: ObjectId,
}

/// An image reference together with where it is drawn on the page,
/// in top-left-origin page coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PlacedImage {
    pub image: ImageRef,
    pub rect: Rect,
}

/// A read-only view of an existing PDF.
pub struct SourceDocument {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl SourceDocument {
    /// Open a PDF from disk.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let doc = Document::load(path).map_err(|e| BackendError::Malformed(e.to_string()))?;
        let pages = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page dimensions in points, from the (possibly inherited) MediaBox.
    pub fn page_size(&self, index: usize) -> Result<(f64, f64), BackendError> {
        let page_id = self.page_id(index)?;
        match self.inherited(page_id, b"MediaBox") {
            Some(obj) => {
                let nums = self.number_array(obj);
                if nums.len() == 4 {
                    Ok((nums[2] - nums[0], nums[3] - nums[1]))
                } else {
                    Err(BackendError::Malformed("MediaBox is not 4 numbers".into()))
                }
            }
            None => {
                warn!(page = index + 1, "page has no MediaBox; assuming US Letter");
                Ok(US_LETTER)
            }
        }
    }

    /// Every raster image drawn on the page, with its bounding rectangle.
    pub fn page_images(&self, index: usize) -> Result<Vec<PlacedImage>, BackendError> {
        let page_id = self.page_id(index)?;
        let (_, page_height) = self.page_size(index)?;

        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| BackendError::Malformed(format!("page content: {e}")))?;
        let resources = self.page_resources(page_id);

        let mut drawn: Vec<(ImageRef, Matrix)> = Vec::new();
        self.walk_content(&content, resources, Matrix::IDENTITY, 0, &mut drawn)?;

        Ok(drawn
            .into_iter()
            .map(|(image, ctm)| {
                let (min_x, min_y, max_x, max_y) = ctm.unit_square_bbox();
                PlacedImage {
                    image,
                    rect: Rect {
                        x: min_x,
                        y: page_height - max_y,
                        width: max_x - min_x,
                        height: max_y - min_y,
                    },
                }
            })
            .collect())
    }

    /// Lift an image out of the document without re-encoding it.
    pub fn extract_raw_image(&self, image: &ImageRef) -> Result<RawImage, BackendError> {
        self.raw_image_from_id(image.id, true)
    }

    // ── Object-graph helpers ────────────────────────────────────────────

    fn page_id(&self, index: usize) -> Result<ObjectId, BackendError> {
        self.pages
            .get(index)
            .copied()
            .ok_or(BackendError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }

    /// Follow reference chains to the underlying object.
    fn resolve<'a>(&'a self, mut obj: &'a Object) -> &'a Object {
        for _ in 0..16 {
            match obj {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(next) => obj = next,
                    Err(_) => return obj,
                },
                _ => return obj,
            }
        }
        obj
    }

    /// Look up a page attribute, walking the Pages ancestry for inheritable
    /// entries (MediaBox, Resources).
    fn inherited(&self, mut id: ObjectId, key: &[u8]) -> Option<&Object> {
        for _ in 0..32 {
            let dict = self.doc.get_dictionary(id).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        }
        None
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        self.inherited(page_id, b"Resources")
            .and_then(|obj| obj.as_dict().ok())
    }

    fn number_array(&self, obj: &Object) -> Vec<f64> {
        match self.resolve(obj) {
            Object::Array(items) => items
                .iter()
                .filter_map(|item| number(self.resolve(item)))
                .collect(),
            _ => Vec::new(),
        }
    }

    // ── Content-stream walk ─────────────────────────────────────────────

    fn walk_content(
        &self,
        content: &[u8],
        resources: Option<&Dictionary>,
        base: Matrix,
        depth: usize,
        out: &mut Vec<(ImageRef, Matrix)>,
    ) -> Result<(), BackendError> {
        let parsed = Content::decode(content)
            .map_err(|e| BackendError::Malformed(format!("content stream: {e}")))?;

        let mut stack: Vec<Matrix> = Vec::new();
        let mut ctm = base;

        for op in &parsed.operations {
            match op.operator.as_str() {
                "q" => stack.push(ctm),
                "Q" => ctm = stack.pop().unwrap_or(base),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        ctm = m.then(&ctm);
                    }
                }
                "Do" => {
                    let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    self.visit_xobject(name, resources, ctm, depth, out)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn visit_xobject(
        &self,
        name: &[u8],
        resources: Option<&Dictionary>,
        ctm: Matrix,
        depth: usize,
        out: &mut Vec<(ImageRef, Matrix)>,
    ) -> Result<(), BackendError> {
        let Some(resources) = resources else {
            return Ok(());
        };
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| self.resolve(o).as_dict().ok())
        else {
            return Ok(());
        };
        let Some(id) = xobjects.get(name).ok().and_then(|o| o.as_reference().ok()) else {
            return Ok(());
        };
        let Ok(Object::Stream(stream)) = self.doc.get_object(id) else {
            return Ok(());
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok());

        if subtype == Some(b"Image".as_slice()) {
            out.push((ImageRef { id }, ctm));
        } else if subtype == Some(b"Form".as_slice()) {
            if depth >= MAX_FORM_DEPTH {
                debug!("ignoring form XObject nested deeper than {MAX_FORM_DEPTH}");
                return Ok(());
            }
            let inner_resources = stream
                .dict
                .get(b"Resources")
                .ok()
                .and_then(|o| self.resolve(o).as_dict().ok())
                .or(Some(resources));
            let matrix = stream
                .dict
                .get(b"Matrix")
                .ok()
                .map(|o| self.number_array(o))
                .and_then(|nums| Matrix::from_numbers(&nums))
                .unwrap_or(Matrix::IDENTITY);
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            self.walk_content(&data, inner_resources, matrix.then(&ctm), depth + 1, out)?;
        }
        Ok(())
    }

    // ── Raw extraction ──────────────────────────────────────────────────

    fn raw_image_from_id(&self, id: ObjectId, allow_smask: bool) -> Result<RawImage, BackendError> {
        let Ok(Object::Stream(stream)) = self.doc.get_object(id) else {
            return Err(BackendError::Malformed("image is not a stream".into()));
        };
        let dict = &stream.dict;

        let width = self
            .dict_number(dict, b"Width")
            .ok_or_else(|| BackendError::Malformed("image has no Width".into()))?
            as i64;
        let height = self
            .dict_number(dict, b"Height")
            .ok_or_else(|| BackendError::Malformed("image has no Height".into()))?
            as i64;

        let image_mask = dict
            .get(b"ImageMask")
            .ok()
            .and_then(|o| o.as_bool().ok())
            .unwrap_or(false);

        let color_space = match dict.get(b"ColorSpace") {
            Ok(obj) => Some(self.parse_color_space(self.resolve(obj))?),
            Err(_) => None,
        };

        let soft_mask = if allow_smask {
            match dict.get(b"SMask").ok().and_then(|o| o.as_reference().ok()) {
                Some(mask_id) => Some(Box::new(self.raw_image_from_id(mask_id, false)?)),
                None => None,
            }
        } else {
            None
        };

        Ok(RawImage {
            width,
            height,
            bits_per_component: self.dict_number(dict, b"BitsPerComponent").map(|n| n as i64),
            color_space,
            filters: self.filter_names(dict),
            decode_parms: self.direct_decode_parms(dict)?,
            decode: dict
                .get(b"Decode")
                .ok()
                .map(|o| self.number_array(o))
                .filter(|v| !v.is_empty()),
            image_mask,
            interpolate: dict
                .get(b"Interpolate")
                .ok()
                .and_then(|o| o.as_bool().ok())
                .unwrap_or(false),
            soft_mask,
            data: stream.content.clone(),
        })
    }

    fn dict_number(&self, dict: &Dictionary, key: &[u8]) -> Option<f64> {
        dict.get(key).ok().and_then(|o| number(self.resolve(o)))
    }

    fn filter_names(&self, dict: &Dictionary) -> Vec<String> {
        match dict.get(b"Filter").map(|o| self.resolve(o)) {
            Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|item| self.resolve(item).as_name().ok())
                .map(|name| String::from_utf8_lossy(name).into_owned())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Decode parameters are carried over only when every entry is a direct
    /// value; an indirect entry (e.g. JBIG2Globals) cannot survive the
    /// raw-copy boundary.
    fn direct_decode_parms(&self, dict: &Dictionary) -> Result<Option<Dictionary>, BackendError> {
        let parms = match dict.get(b"DecodeParms").map(|o| self.resolve(o)) {
            Ok(Object::Dictionary(d)) => d,
            Ok(Object::Array(items)) if items.len() == 1 => {
                match self.resolve(&items[0]).as_dict() {
                    Ok(d) => d,
                    Err(_) => return Ok(None),
                }
            }
            Ok(Object::Array(_)) => {
                return Err(BackendError::UnsupportedImage(
                    "multiple DecodeParms entries".into(),
                ))
            }
            _ => return Ok(None),
        };

        for (key, value) in parms.iter() {
            if matches!(value, Object::Reference(_) | Object::Stream(_)) {
                return Err(BackendError::UnsupportedImage(format!(
                    "DecodeParms entry {} is indirect",
                    String::from_utf8_lossy(key)
                )));
            }
        }
        Ok(Some(parms.clone()))
    }

    fn parse_color_space(&self, obj: &Object) -> Result<ColorSpace, BackendError> {
        match obj {
            Object::Name(name) => Ok(ColorSpace::Device(
                String::from_utf8_lossy(name).into_owned(),
            )),
            Object::Array(items) => {
                let family = items
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .unwrap_or_default();
                match family {
                    b"ICCBased" => self.parse_icc(items),
                    b"Indexed" => self.parse_indexed(items),
                    other => Err(BackendError::UnsupportedImage(format!(
                        "color space family {}",
                        String::from_utf8_lossy(other)
                    ))),
                }
            }
            _ => Err(BackendError::UnsupportedImage(
                "color space is neither name nor array".into(),
            )),
        }
    }

    fn parse_icc(&self, items: &[Object]) -> Result<ColorSpace, BackendError> {
        let stream = items
            .get(1)
            .map(|o| self.resolve(o))
            .and_then(|o| match o {
                Object::Stream(s) => Some(s),
                _ => None,
            })
            .ok_or_else(|| BackendError::Malformed("ICCBased without profile stream".into()))?;
        let components = self
            .dict_number(&stream.dict, b"N")
            .ok_or_else(|| BackendError::Malformed("ICC profile without N".into()))?
            as i64;
        Ok(ColorSpace::Icc {
            components,
            profile: self.stream_bytes(stream)?,
        })
    }

    fn parse_indexed(&self, items: &[Object]) -> Result<ColorSpace, BackendError> {
        if items.len() != 4 {
            return Err(BackendError::Malformed("Indexed color space arity".into()));
        }
        let base = Box::new(self.parse_color_space(self.resolve(&items[1]))?);
        let hival = number(self.resolve(&items[2]))
            .ok_or_else(|| BackendError::Malformed("Indexed hival".into()))? as i64;
        let lookup = match self.resolve(&items[3]) {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(stream) => self.stream_bytes(stream)?,
            _ => {
                return Err(BackendError::UnsupportedImage(
                    "Indexed lookup is neither string nor stream".into(),
                ))
            }
        };
        Ok(ColorSpace::Indexed {
            base,
            hival,
            lookup,
        })
    }

    fn stream_bytes(&self, stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
        if stream.dict.has(b"Filter") {
            stream
                .decompressed_content()
                .map_err(|e| BackendError::UnsupportedImage(format!("stream filter: {e}")))
        } else {
            Ok(stream.content.clone())
        }
    }
}

// ── Transform math ───────────────────────────────────────────────────────

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    pub(crate) const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        let nums: Vec<f64> = operands.iter().filter_map(number).collect();
        Self::from_numbers(&nums)
    }

    fn from_numbers(nums: &[f64]) -> Option<Matrix> {
        if nums.len() != 6 {
            return None;
        }
        Some(Matrix {
            a: nums[0],
            b: nums[1],
            c: nums[2],
            d: nums[3],
            e: nums[4],
            f: nums[5],
        })
    }

    /// Matrix concatenation: apply `self`, then `outer`.
    fn then(&self, outer: &Matrix) -> Matrix {
        Matrix {
            a: self.a * outer.a + self.b * outer.c,
            b: self.a * outer.b + self.b * outer.d,
            c: self.c * outer.a + self.d * outer.c,
            d: self.c * outer.b + self.d * outer.d,
            e: self.e * outer.a + self.f * outer.c + outer.e,
            f: self.e * outer.b + self.f * outer.d + outer.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Bounding box of the transformed unit square in PDF space.
    ///
    /// Images are drawn into the unit square, so this is the drawn extent
    /// regardless of rotation or mirroring.
    fn unit_square_bbox(&self) -> (f64, f64, f64, f64) {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(1.0, 0.0),
            self.apply(0.0, 1.0),
            self.apply(1.0, 1.0),
        ];
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        (min_x, min_y, max_x, max_y)
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_concat_scales_then_translates() {
        // Scale by 2, then translate by (10, 20).
        let scale = Matrix::from_numbers(&[2.0, 0.0, 0.0, 2.0, 0.0, 0.0]).unwrap();
        let translate = Matrix::from_numbers(&[1.0, 0.0, 0.0, 1.0, 10.0, 20.0]).unwrap();
        let combined = scale.then(&translate);
        assert_eq!(combined.apply(1.0, 1.0), (12.0, 22.0));
    }

    #[test]
    fn unit_square_bbox_handles_mirrored_axes() {
        // Negative vertical scale flips the square below the origin.
        let m = Matrix::from_numbers(&[100.0, 0.0, 0.0, -50.0, 0.0, 50.0]).unwrap();
        let (min_x, min_y, max_x, max_y) = m.unit_square_bbox();
        assert_eq!((min_x, min_y), (0.0, 0.0));
        assert_eq!((max_x, max_y), (100.0, 50.0));
    }

    #[test]
    fn from_operands_rejects_wrong_arity() {
        assert!(Matrix::from_operands(&[Object::Integer(1)]).is_none());
    }
}
