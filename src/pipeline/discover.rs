//! Input discovery: pair PDFs with their OCR JSON siblings.

use crate::error::RubystripError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One unit of work: a scanned PDF and its OCR result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub pdf: PathBuf,
    pub json: PathBuf,
}

impl FilePair {
    /// File name of the PDF, for logs and the RAG `source_file` field.
    pub fn pdf_name(&self) -> String {
        self.pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Every `*.pdf` in `input_dir` that has a same-stem `*.json` sibling,
/// sorted by file name for a deterministic batch order. PDFs without a
/// sibling are ignored silently.
pub fn find_pairs(input_dir: &Path) -> Result<Vec<FilePair>, RubystripError> {
    let mut pairs: Vec<FilePair> = list_by_extension(input_dir, "pdf")?
        .into_iter()
        .filter_map(|pdf| {
            let json = pdf.with_extension("json");
            if json.is_file() {
                Some(FilePair { pdf, json })
            } else {
                debug!(pdf = %pdf.display(), "no OCR JSON sibling; skipping");
                None
            }
        })
        .collect();
    pairs.sort_by(|a, b| a.pdf.cmp(&b.pdf));
    Ok(pairs)
}

/// Every `*.pdf` in `input_dir`, excluding our own backup and scratch
/// files, sorted by file name.
pub fn find_pdfs(input_dir: &Path) -> Result<Vec<PathBuf>, RubystripError> {
    let mut pdfs: Vec<PathBuf> = list_by_extension(input_dir, "pdf")?
        .into_iter()
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            !name.ends_with(".bak.pdf") && !name.ends_with(".tmp.pdf")
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

fn list_by_extension(input_dir: &Path, ext: &str) -> Result<Vec<PathBuf>, RubystripError> {
    if !input_dir.is_dir() {
        return Err(RubystripError::InputDirNotFound {
            path: input_dir.to_path_buf(),
        });
    }
    let entries = fs::read_dir(input_dir).map_err(|source| RubystripError::InputDirUnreadable {
        path: input_dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let matches = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false);
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn pairs_require_json_sibling() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.pdf")).unwrap();
        File::create(dir.path().join("a.json")).unwrap();
        File::create(dir.path().join("b.pdf")).unwrap();
        File::create(dir.path().join("c.json")).unwrap();

        let pairs = find_pairs(dir.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].pdf_name(), "a.pdf");
        assert_eq!(pairs[0].json, dir.path().join("a.json"));
    }

    #[test]
    fn pairs_are_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for stem in ["zeta", "alpha", "mid"] {
            File::create(dir.path().join(format!("{stem}.pdf"))).unwrap();
            File::create(dir.path().join(format!("{stem}.json"))).unwrap();
        }
        let names: Vec<String> = find_pairs(dir.path())
            .unwrap()
            .iter()
            .map(FilePair::pdf_name)
            .collect();
        assert_eq!(names, ["alpha.pdf", "mid.pdf", "zeta.pdf"]);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let err = find_pairs(Path::new("/no/such/dir/anywhere")).unwrap_err();
        assert!(matches!(err, RubystripError::InputDirNotFound { .. }));
    }

    #[test]
    fn find_pdfs_skips_backups_and_scratch() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["scan.pdf", "scan.bak.pdf", "scan.tmp.pdf", "other.pdf"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let names: Vec<String> = find_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["other.pdf", "scan.pdf"]);
    }
}
