//! Stage A: rebuild a PDF strictly from its embedded raster images.
//!
//! Every page of the source becomes a blank page of the same dimensions in
//! the output; every raster image drawn on the source page is copied over
//! raw — same encoded bytes, same bounding rectangle. Vector graphics,
//! existing text layers, and document metadata do not survive. Because the
//! copy is byte-preserving, running the rebuild on an already-rebuilt file
//! is a fixed point.

use crate::backend::{DocumentBuilder, SaveOptions, SourceDocument};
use crate::error::{BackendError, DocumentError};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Copy every page's drawn raster images from `src` into `builder`.
///
/// Individual images that cannot be carried over losslessly are skipped
/// with a diagnostic; the page keeps its remaining images.
pub fn rebuild_image_only(
    src: &SourceDocument,
    builder: &mut DocumentBuilder<'_>,
) -> Result<(), BackendError> {
    for index in 0..src.page_count() {
        let (width, height) = src.page_size(index)?;
        let page = builder.add_page(width, height);

        let placements = src.page_images(index)?;
        if placements.is_empty() {
            warn!(page = index + 1, "no raster images on page; it will be blank");
            continue;
        }

        for placed in placements {
            match src.extract_raw_image(&placed.image) {
                Ok(raw) => {
                    debug!(
                        page = index + 1,
                        width = raw.width,
                        height = raw.height,
                        "copying raw image stream"
                    );
                    builder.insert_image(page, placed.rect, &raw)?;
                }
                Err(e) => {
                    warn!(page = index + 1, error = %e, "skipping uncopyable image");
                }
            }
        }
    }
    Ok(())
}

/// Rebuild `pdf_path` in place: write the image-only version to a scratch
/// file, then atomically replace the original.
///
/// With `create_backup`, the original is first copied to `<stem>.bak.pdf`.
/// On any failure the scratch file is removed and the original is left
/// untouched.
pub fn reimage_in_place(pdf_path: &Path, create_backup: bool) -> Result<(), DocumentError> {
    if create_backup {
        let backup = pdf_path.with_extension("bak.pdf");
        info!(backup = %backup.display(), "creating backup");
        fs::copy(pdf_path, &backup).map_err(|source| DocumentError::Io {
            path: backup,
            source,
        })?;
    }

    let scratch = pdf_path.with_extension("tmp.pdf");
    let rebuilt = rebuild_to(pdf_path, &scratch);
    if let Err(e) = rebuilt {
        let _ = fs::remove_file(&scratch);
        return Err(e);
    }

    fs::rename(&scratch, pdf_path).map_err(|source| {
        let _ = fs::remove_file(&scratch);
        DocumentError::Io {
            path: pdf_path.to_path_buf(),
            source,
        }
    })?;
    info!(pdf = %pdf_path.display(), "rebuilt from original images");
    Ok(())
}

fn rebuild_to(pdf_path: &Path, out_path: &Path) -> Result<(), DocumentError> {
    // The source handle is dropped before the save so no two handles on the
    // same document overlap.
    let mut builder = DocumentBuilder::new();
    {
        let src = SourceDocument::open(pdf_path).map_err(|source| DocumentError::PdfOpen {
            path: pdf_path.to_path_buf(),
            source,
        })?;
        rebuild_image_only(&src, &mut builder).map_err(|source| DocumentError::PdfRebuild {
            path: pdf_path.to_path_buf(),
            source,
        })?;
    }
    builder
        .save(
            out_path,
            SaveOptions {
                compact: true,
                linearize: false,
            },
        )
        .map_err(|source| DocumentError::PdfRebuild {
            path: pdf_path.to_path_buf(),
            source,
        })
}
