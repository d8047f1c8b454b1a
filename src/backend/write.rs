//! Write side of the backend: assembling the rebuilt document.
//!
//! Pages are drafted in memory (dimensions, placement operations, resource
//! references) and the PDF object graph is materialized once, at
//! [`DocumentBuilder::save`]. Deferring materialization is what makes the
//! font subset possible: by save time we know exactly which glyphs the
//! text layer used, so the width array and ToUnicode CMap cover precisely
//! those.
//!
//! The builder only ever creates objects that end up referenced from the
//! page tree, so "maximal garbage collection" reduces to renumbering and
//! stream compression.

use crate::error::BackendError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::font::{build_font_objects, FontRef};
use super::{ColorSpace, Point, RawImage, Rect, SaveOptions};

/// Builds a fresh, image-only PDF with an optional invisible text layer.
pub struct DocumentBuilder<'f> {
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<PageDraft>,
    font: Option<FontUse<'f>>,
}

struct PageDraft {
    width: f64,
    height: f64,
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
    uses_font: bool,
}

struct FontUse<'f> {
    font: &'f FontRef<'f>,
    resource_name: String,
    used_glyphs: BTreeMap<u16, char>,
}

impl<'f> DocumentBuilder<'f> {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            pages: Vec::new(),
            font: None,
        }
    }

    /// Append a blank page with the given dimensions in points.
    ///
    /// Returns the page index for subsequent insertions.
    pub fn add_page(&mut self, width: f64, height: f64) -> usize {
        self.pages.push(PageDraft {
            width,
            height,
            operations: Vec::new(),
            images: Vec::new(),
            uses_font: false,
        });
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Place a raw image at `rect` (top-left origin), byte-for-byte as it
    /// came out of the source document.
    pub fn insert_image(
        &mut self,
        page: usize,
        rect: Rect,
        image: &RawImage,
    ) -> Result<(), BackendError> {
        let image_id = self.add_image_object(image);
        let draft = self.page_mut(page)?;

        let name = format!("Im{}", draft.images.len());
        let y_pdf = draft.height - rect.y - rect.height;

        draft.operations.push(Operation::new("q", vec![]));
        draft.operations.push(Operation::new(
            "cm",
            vec![
                real(rect.width),
                real(0.0),
                real(0.0),
                real(rect.height),
                real(rect.x),
                real(y_pdf),
            ],
        ));
        draft.operations.push(Operation::new(
            "Do",
            vec![Object::Name(name.clone().into_bytes())],
        ));
        draft.operations.push(Operation::new("Q", vec![]));
        draft.images.push((name, image_id));
        Ok(())
    }

    /// Register the text-layer font for this document.
    ///
    /// One font serves every page; repeated calls replace the previous
    /// registration.
    pub fn embed_font(&mut self, logical_name: &str, font: &'f FontRef<'f>) {
        self.font = Some(FontUse {
            font,
            resource_name: sanitize_name(logical_name),
            used_glyphs: BTreeMap::new(),
        });
    }

    /// Place searchable but non-rendered text (render mode 3: added to the
    /// clip path, never painted) with its baseline origin at `at`
    /// (top-left-origin page space).
    pub fn insert_invisible_text(
        &mut self,
        page: usize,
        at: Point,
        text: &str,
        size: f64,
    ) -> Result<(), BackendError> {
        let Some(font_use) = self.font.as_mut() else {
            return Err(BackendError::Font(
                "text inserted before a font was embedded".into(),
            ));
        };

        let mut glyphs = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let gid = font_use.font.glyph_id(c);
            font_use.used_glyphs.entry(gid).or_insert(c);
            glyphs.extend_from_slice(&gid.to_be_bytes());
        }
        let resource_name = font_use.resource_name.clone();

        let draft = self.page_mut(page)?;
        let y_pdf = draft.height - at.y;

        draft.operations.push(Operation::new("BT", vec![]));
        draft.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(resource_name.into_bytes()), real(size)],
        ));
        draft
            .operations
            .push(Operation::new("Tr", vec![Object::Integer(3)]));
        draft
            .operations
            .push(Operation::new("Td", vec![real(at.x), real(y_pdf)]));
        draft.operations.push(Operation::new(
            "Tj",
            vec![Object::String(glyphs, StringFormat::Hexadecimal)],
        ));
        draft.operations.push(Operation::new("ET", vec![]));
        draft.uses_font = true;
        Ok(())
    }

    /// Materialize the object graph and write the file.
    pub fn save(mut self, path: &Path, options: SaveOptions) -> Result<(), BackendError> {
        let font_objects = match self.font.take() {
            Some(font_use) if !font_use.used_glyphs.is_empty() => {
                let font_id = build_font_objects(
                    &mut self.doc,
                    font_use.font,
                    &font_use.resource_name,
                    &font_use.used_glyphs,
                );
                Some((font_use.resource_name, font_id))
            }
            _ => None,
        };

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for draft in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: draft.operations,
            }
            .encode()
            .map_err(|e| BackendError::Write(format!("content encoding: {e}")))?;
            let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

            let mut resources = Dictionary::new();
            if !draft.images.is_empty() {
                let mut xobjects = Dictionary::new();
                for (name, id) in &draft.images {
                    xobjects.set(name.as_bytes(), Object::Reference(*id));
                }
                resources.set("XObject", Object::Dictionary(xobjects));
            }
            if draft.uses_font {
                if let Some((ref name, font_id)) = font_objects {
                    let mut fonts = Dictionary::new();
                    fonts.set(name.as_bytes(), Object::Reference(font_id));
                    resources.set("Font", Object::Dictionary(fonts));
                }
            }

            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "MediaBox" => Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(draft.width),
                    real(draft.height),
                ]),
                "Contents" => content_id,
                "Resources" => Object::Dictionary(resources),
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Object::Array(kids),
                "Count" => page_count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        if options.linearize {
            debug!("linearized output is not supported by the lopdf writer; ignoring");
        }
        if options.compact {
            self.doc.renumber_objects();
            self.doc.compress();
        }

        self.doc
            .save(path)
            .map_err(|e| BackendError::Write(e.to_string()))?;
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn page_mut(&mut self, page: usize) -> Result<&mut PageDraft, BackendError> {
        let count = self.pages.len();
        self.pages
            .get_mut(page)
            .ok_or(BackendError::PageOutOfRange { index: page, count })
    }

    fn add_image_object(&mut self, image: &RawImage) -> ObjectId {
        let soft_mask_id = image
            .soft_mask
            .as_ref()
            .map(|mask| self.add_image_object(mask));

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width,
            "Height" => image.height,
        };
        if let Some(bits) = image.bits_per_component {
            dict.set("BitsPerComponent", bits);
        }
        if image.image_mask {
            dict.set("ImageMask", true);
        }
        if let Some(ref cs) = image.color_space {
            let cs_object = color_space_object(&mut self.doc, cs);
            dict.set("ColorSpace", cs_object);
        }
        match image.filters.len() {
            0 => {}
            1 => dict.set("Filter", Object::Name(image.filters[0].clone().into_bytes())),
            _ => dict.set(
                "Filter",
                Object::Array(
                    image
                        .filters
                        .iter()
                        .map(|f| Object::Name(f.clone().into_bytes()))
                        .collect(),
                ),
            ),
        }
        if let Some(ref parms) = image.decode_parms {
            dict.set("DecodeParms", Object::Dictionary(parms.clone()));
        }
        if let Some(ref decode) = image.decode {
            dict.set(
                "Decode",
                Object::Array(decode.iter().map(|v| real(*v)).collect()),
            );
        }
        if image.interpolate {
            dict.set("Interpolate", true);
        }
        if let Some(mask_id) = soft_mask_id {
            dict.set("SMask", Object::Reference(mask_id));
        }

        self.doc
            .add_object(Stream::new(dict, image.data.clone()))
    }
}

impl Default for DocumentBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild a color space as PDF objects in the target document.
fn color_space_object(doc: &mut Document, cs: &ColorSpace) -> Object {
    match cs {
        ColorSpace::Device(name) => Object::Name(name.clone().into_bytes()),
        ColorSpace::Indexed {
            base,
            hival,
            lookup,
        } => {
            let base_object = color_space_object(doc, base);
            Object::Array(vec![
                Object::Name(b"Indexed".to_vec()),
                base_object,
                Object::Integer(*hival),
                Object::String(lookup.clone(), StringFormat::Hexadecimal),
            ])
        }
        ColorSpace::Icc {
            components,
            profile,
        } => {
            let profile_id = doc.add_object(Stream::new(
                dictionary! { "N" => *components },
                profile.clone(),
            ));
            Object::Array(vec![
                Object::Name(b"ICCBased".to_vec()),
                Object::Reference(profile_id),
            ])
        }
    }
}

/// Make a logical font name usable as a PDF name object: strip whitespace
/// and delimiter characters, never return an empty name.
fn sanitize_name(logical: &str) -> String {
    let cleaned: String = logical
        .chars()
        .filter(|c| c.is_ascii_graphic())
        .filter(|c| !matches!(c, '/' | '%' | '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}' | '#'))
        .collect();
    if cleaned.is_empty() {
        "F0".to_string()
    } else {
        cleaned
    }
}

/// Integer-valued coordinates are common; emit them without a fraction.
fn real(value: f64) -> Object {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_prefers_integers() {
        assert_eq!(real(72.0), Object::Integer(72));
        assert!(matches!(real(10.5), Object::Real(_)));
    }

    #[test]
    fn sanitize_name_strips_delimiters() {
        assert_eq!(sanitize_name("UserFont"), "UserFont");
        assert_eq!(sanitize_name("Noto Sans/JP"), "NotoSansJP");
        assert_eq!(sanitize_name("   "), "F0");
    }

    #[test]
    fn text_before_font_is_an_error() {
        let mut builder = DocumentBuilder::new();
        builder.add_page(100.0, 100.0);
        let err = builder
            .insert_invisible_text(0, Point { x: 1.0, y: 2.0 }, "x", 11.0)
            .unwrap_err();
        assert!(matches!(err, BackendError::Font(_)));
    }

    #[test]
    fn insert_image_rejects_bad_page_index() {
        let mut builder = DocumentBuilder::new();
        let image = RawImage {
            width: 1,
            height: 1,
            bits_per_component: Some(8),
            color_space: Some(ColorSpace::Device("DeviceGray".into())),
            filters: vec!["DCTDecode".into()],
            decode_parms: None,
            decode: None,
            image_mask: false,
            interpolate: false,
            soft_mask: None,
            data: vec![0xFF, 0xD8],
        };
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        };
        let err = builder.insert_image(3, rect, &image).unwrap_err();
        assert!(matches!(
            err,
            BackendError::PageOutOfRange { index: 3, count: 0 }
        ));
    }
}
