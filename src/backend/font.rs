//! Embedded-font support for the invisible text layer.
//!
//! The text layer must be *searchable*, which dictates the font machinery:
//! a Type0/CIDFontType2 composite font with Identity-H encoding (text is
//! written as raw glyph ids, so any script the face covers works), plus a
//! ToUnicode CMap built from the glyphs actually used so text extraction
//! and search recover the original characters.
//!
//! The face is parsed once per batch; every document shares the same
//! [`FontRef`] by reference.

use crate::error::BackendError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use ttf_parser::{Face, GlyphId};

/// Glyph-space units per em in PDF font metrics.
const PDF_UNITS_PER_EM: f64 = 1000.0;

/// A TrueType face parsed from a caller-owned byte buffer.
#[derive(Debug)]
pub struct FontRef<'a> {
    data: &'a [u8],
    face: Face<'a>,
}

impl<'a> FontRef<'a> {
    /// Parse the font. Fails on anything `ttf-parser` cannot read.
    pub fn load(data: &'a [u8]) -> Result<Self, BackendError> {
        let face = Face::parse(data, 0).map_err(|e| BackendError::Font(e.to_string()))?;
        Ok(Self { data, face })
    }

    /// Glyph id for a character; missing glyphs map to `.notdef` (0).
    pub fn glyph_id(&self, c: char) -> u16 {
        self.face.glyph_index(c).map(|g| g.0).unwrap_or(0)
    }

    fn em_scale(&self) -> f64 {
        PDF_UNITS_PER_EM / f64::from(self.face.units_per_em())
    }
}

/// Materialize the font object graph for one output document.
///
/// Only the glyphs in `used` get width and ToUnicode entries; everything
/// else falls back to the default width.
pub(super) fn build_font_objects(
    doc: &mut Document,
    font: &FontRef<'_>,
    base_name: &str,
    used: &BTreeMap<u16, char>,
) -> ObjectId {
    let scale = font.em_scale();
    let face = &font.face;

    let font_file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data.len() as i64 },
        font.data.to_vec(),
    ));

    let bbox = face.global_bounding_box();
    let ascent = (f64::from(face.ascender()) * scale).round() as i64;
    let descent = (f64::from(face.descender()) * scale).round() as i64;
    let cap_height = face
        .capital_height()
        .map(|h| (f64::from(h) * scale).round() as i64)
        .unwrap_or(ascent);

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(base_name.as_bytes().to_vec()),
        "Flags" => 4,
        "FontBBox" => Object::Array(vec![
            Object::Integer((f64::from(bbox.x_min) * scale).round() as i64),
            Object::Integer((f64::from(bbox.y_min) * scale).round() as i64),
            Object::Integer((f64::from(bbox.x_max) * scale).round() as i64),
            Object::Integer((f64::from(bbox.y_max) * scale).round() as i64),
        ]),
        "ItalicAngle" => 0,
        "Ascent" => ascent,
        "Descent" => descent,
        "CapHeight" => cap_height,
        "StemV" => 80,
        "FontFile2" => font_file_id,
    });

    let mut widths: Vec<Object> = Vec::with_capacity(used.len() * 2);
    for &gid in used.keys() {
        let advance = face
            .glyph_hor_advance(GlyphId(gid))
            .map(|a| (f64::from(a) * scale).round() as i64)
            .unwrap_or(PDF_UNITS_PER_EM as i64);
        widths.push(Object::Integer(i64::from(gid)));
        widths.push(Object::Array(vec![Object::Integer(advance)]));
    }

    let descendant_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(base_name.as_bytes().to_vec()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => PDF_UNITS_PER_EM as i64,
        "W" => Object::Array(widths),
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(
        Dictionary::new(),
        to_unicode_cmap(used).into_bytes(),
    ));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(base_name.as_bytes().to_vec()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => Object::Array(vec![descendant_id.into()]),
        "ToUnicode" => to_unicode_id,
    })
}

/// Build a ToUnicode CMap covering exactly the used glyph ids.
fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    // bfchar sections are limited to 100 entries by the CMap spec.
    let entries: Vec<(u16, char)> = used.iter().map(|(&g, &c)| (g, c)).collect();
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, c) in chunk {
            cmap.push('<');
            cmap.push_str(&format!("{gid:04X}"));
            cmap.push_str("> <");
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                cmap.push_str(&format!("{unit:04X}"));
            }
            cmap.push_str(">\n");
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}
