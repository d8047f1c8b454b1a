//! Shared fixtures: a synthesized TrueType face and tiny image-based PDFs.
//!
//! The font is the smallest thing `ttf-parser` will accept (head + hhea +
//! maxp + cmap + hmtx, no outlines — the text layer is invisible, so none
//! are needed). Its cmap covers printable ASCII plus the U+3000..U+9FFF
//! block, enough for kana and common kanji in test data.

use lopdf::{dictionary, Dictionary, Document, Stream};
use std::path::Path;

// ── Synthesized TrueType font ────────────────────────────────────────────

const ASCII_FIRST: u32 = 0x20;
const ASCII_LAST: u32 = 0x7E;
const CJK_FIRST: u32 = 0x3000;
const CJK_LAST: u32 = 0x9FFF;

/// .notdef + ASCII + CJK block.
const NUM_GLYPHS: u32 = 1 + (ASCII_LAST - ASCII_FIRST + 1) + (CJK_LAST - CJK_FIRST + 1);

fn be16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn be32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn head_table() -> Vec<u8> {
    let mut t = Vec::with_capacity(54);
    be32(&mut t, 0x0001_0000); // version
    be32(&mut t, 0); // fontRevision
    be32(&mut t, 0); // checkSumAdjustment
    be32(&mut t, 0x5F0F_3CF5); // magicNumber
    be16(&mut t, 0); // flags
    be16(&mut t, 1000); // unitsPerEm
    t.extend_from_slice(&0i64.to_be_bytes()); // created
    t.extend_from_slice(&0i64.to_be_bytes()); // modified
    be16(&mut t, 0); // xMin
    be16(&mut t, (-200i16) as u16); // yMin
    be16(&mut t, 800); // xMax
    be16(&mut t, 800); // yMax
    be16(&mut t, 0); // macStyle
    be16(&mut t, 8); // lowestRecPPEM
    be16(&mut t, 2); // fontDirectionHint
    be16(&mut t, 0); // indexToLocFormat
    be16(&mut t, 0); // glyphDataFormat
    t
}

fn hhea_table() -> Vec<u8> {
    let mut t = Vec::with_capacity(36);
    be32(&mut t, 0x0001_0000); // version
    be16(&mut t, 800); // ascender
    be16(&mut t, (-200i16) as u16); // descender
    be16(&mut t, 0); // lineGap
    be16(&mut t, 600); // advanceWidthMax
    be16(&mut t, 0); // minLeftSideBearing
    be16(&mut t, 0); // minRightSideBearing
    be16(&mut t, 600); // xMaxExtent
    be16(&mut t, 1); // caretSlopeRise
    be16(&mut t, 0); // caretSlopeRun
    be16(&mut t, 0); // caretOffset
    for _ in 0..4 {
        be16(&mut t, 0); // reserved
    }
    be16(&mut t, 0); // metricDataFormat
    be16(&mut t, 1); // numberOfHMetrics
    t
}

fn maxp_table() -> Vec<u8> {
    let mut t = Vec::with_capacity(6);
    be32(&mut t, 0x0000_5000); // version 0.5: no glyf-dependent fields
    be16(&mut t, NUM_GLYPHS as u16);
    t
}

fn cmap_table() -> Vec<u8> {
    let groups: [(u32, u32, u32); 2] = [
        (ASCII_FIRST, ASCII_LAST, 1),
        (CJK_FIRST, CJK_LAST, 1 + (ASCII_LAST - ASCII_FIRST + 1)),
    ];

    let mut t = Vec::new();
    be16(&mut t, 0); // version
    be16(&mut t, 1); // numTables
    be16(&mut t, 3); // platformID: Windows
    be16(&mut t, 10); // encodingID: full Unicode
    be32(&mut t, 12); // subtable offset

    // Format 12: sequential map groups.
    be16(&mut t, 12);
    be16(&mut t, 0); // reserved
    be32(&mut t, 16 + groups.len() as u32 * 12); // length
    be32(&mut t, 0); // language
    be32(&mut t, groups.len() as u32);
    for (start, end, start_gid) in groups {
        be32(&mut t, start);
        be32(&mut t, end);
        be32(&mut t, start_gid);
    }
    t
}

fn hmtx_table() -> Vec<u8> {
    // One long metric, then a left-side-bearing array for the rest.
    let mut t = Vec::with_capacity(4 + 2 * (NUM_GLYPHS as usize - 1));
    be16(&mut t, 600); // advanceWidth
    be16(&mut t, 0); // lsb
    for _ in 1..NUM_GLYPHS {
        be16(&mut t, 0);
    }
    t
}

/// Assemble a parseable sfnt from the five required tables.
pub fn synth_font() -> Vec<u8> {
    let tables: [([u8; 4], Vec<u8>); 5] = [
        (*b"cmap", cmap_table()),
        (*b"head", head_table()),
        (*b"hhea", hhea_table()),
        (*b"hmtx", hmtx_table()),
        (*b"maxp", maxp_table()),
    ];

    let mut font = Vec::new();
    be32(&mut font, 0x0001_0000); // sfnt version
    be16(&mut font, tables.len() as u16);
    be16(&mut font, 0); // searchRange
    be16(&mut font, 0); // entrySelector
    be16(&mut font, 0); // rangeShift

    let mut offset = 12 + 16 * tables.len() as u32;
    let mut directory = Vec::new();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        directory.extend_from_slice(tag);
        be32(&mut directory, 0); // checksum: unchecked by ttf-parser
        be32(&mut directory, offset);
        be32(&mut directory, data.len() as u32);
        body.extend_from_slice(data);
        let padded = (data.len() as u32 + 3) & !3;
        body.extend(std::iter::repeat(0u8).take((padded - data.len() as u32) as usize));
        offset += padded;
    }
    font.extend_from_slice(&directory);
    font.extend_from_slice(&body);
    font
}

// ── Synthesized scan PDFs ────────────────────────────────────────────────

/// Stand-in for a scanned page image: never decoded, only copied.
pub fn fake_jpeg(seed: u8) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend((0..64).map(|i| seed.wrapping_add(i)));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// Write a PDF whose pages each contain exactly one full-page image.
///
/// `pages` is a list of `(width, height, image bytes)`.
pub fn write_scan_pdf(path: &Path, pages: &[(f64, f64, Vec<u8>)]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<lopdf::Object> = Vec::new();
    for (width, height, image) in pages {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 100,
                "Height" => 100,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.clone(),
        ));

        let content = format!("q {width} 0 0 {height} 0 0 cm /Im0 Do Q");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut xobjects = Dictionary::new();
        xobjects.set("Im0", lopdf::Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", lopdf::Object::Dictionary(xobjects));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                lopdf::Object::Integer(0),
                lopdf::Object::Integer(0),
                lopdf::Object::Real(*width as f32),
                lopdf::Object::Real(*height as f32),
            ],
            "Contents" => content_id,
            "Resources" => lopdf::Object::Dictionary(resources),
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        lopdf::Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("write fixture PDF");
}

/// Collect every image stream's raw content from a saved PDF.
pub fn image_streams(path: &Path) -> Vec<Vec<u8>> {
    let doc = Document::load(path).expect("reload PDF");
    let mut streams: Vec<Vec<u8>> = doc
        .objects
        .values()
        .filter_map(|obj| match obj {
            lopdf::Object::Stream(stream) => {
                let subtype = stream
                    .dict
                    .get(b"Subtype")
                    .ok()
                    .and_then(|o| o.as_name().ok());
                if subtype == Some(b"Image".as_slice()) {
                    Some(stream.content.clone())
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect();
    streams.sort();
    streams
}
