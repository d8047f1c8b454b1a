//! RAG output document and its JSON serialisation.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Chunk type emitted for ordinary page text.
pub const CHUNK_TYPE_PAGE_CONTENT: &str = "page_content";

/// The per-document RAG extraction written next to the rebuilt PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagDocument {
    /// File name of the source PDF (not a path).
    pub source_file: String,
    pub content_chunks: Vec<ContentChunk>,
}

/// One retrieval unit: the retained text of a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChunk {
    pub page_number: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl ContentChunk {
    pub fn page(page_number: u32, content: String) -> Self {
        Self {
            page_number,
            kind: CHUNK_TYPE_PAGE_CONTENT.to_string(),
            content,
        }
    }
}

/// Write the RAG JSON: UTF-8, 2-space indentation, non-ASCII characters
/// emitted literally.
pub fn write_rag_json(path: &Path, doc: &RagDocument) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_matches_ingestion_contract() {
        let doc = RagDocument {
            source_file: "scan.pdf".into(),
            content_chunks: vec![ContentChunk::page(2, "本文".into())],
        };
        let json = serde_json::to_string_pretty(&doc).unwrap();
        assert!(json.contains("\"source_file\": \"scan.pdf\""));
        assert!(json.contains("\"page_number\": 2"));
        assert!(json.contains("\"type\": \"page_content\""));
        // Non-ASCII stays literal, not \u-escaped.
        assert!(json.contains("本文"));
    }

    #[test]
    fn round_trips_through_serde() {
        let doc = RagDocument {
            source_file: "a.pdf".into(),
            content_chunks: vec![ContentChunk::page(1, "text".into())],
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: RagDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source_file, "a.pdf");
        assert_eq!(back.content_chunks.len(), 1);
        assert_eq!(back.content_chunks[0].kind, CHUNK_TYPE_PAGE_CONTENT);
    }
}
