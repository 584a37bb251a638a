// Serialization utilities for beat documents
// JSON or RON, picked from the file extension

use crate::document::BeatDocument;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RON error: {0}")]
    Ron(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// Parse a beat document from JSON text
pub fn parse_json(text: &str) -> Result<BeatDocument, DocumentError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse a beat document from RON text
pub fn parse_ron(text: &str) -> Result<BeatDocument, DocumentError> {
    ron::from_str(text).map_err(|e| DocumentError::Ron(format!("Failed to parse RON: {}", e)))
}

/// Read a beat document from disk
pub fn load_document(path: &Path) -> Result<BeatDocument, DocumentError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => parse_json(&std::fs::read_to_string(path)?),
        "ron" => parse_ron(&std::fs::read_to_string(path)?),
        _ => Err(DocumentError::UnsupportedFormat(extension)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_json() {
        let doc = parse_json(r#"{ "name": "Rock", "bpm": 96.0, "signature": [3, 4] }"#).unwrap();
        assert_eq!(doc.name.as_deref(), Some("Rock"));
        assert_eq!(doc.bpm, Some(96.0));
        assert_eq!(doc.signature, Some([3, 4]));
    }

    #[test]
    fn test_parse_ron() {
        let text = r#"#![enable(implicit_some)]
            (
                name: "Shuffle",
                quarters_per_bar: 3.0,
                parts: [ (name: "A", sequence: (filename: "a.mid")) ],
            )"#;
        let doc = parse_ron(text).unwrap();
        assert_eq!(doc.name.as_deref(), Some("Shuffle"));
        assert_eq!(doc.quarters_per_bar, Some(3.0));
        assert_eq!(doc.parts.map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_json("{ name: "), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("beat.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"{{ "name": "Disk" }}"#).unwrap();
        assert_eq!(load_document(&json_path).unwrap().name.as_deref(), Some("Disk"));

        let txt_path = dir.path().join("beat.txt");
        std::fs::write(&txt_path, "name").unwrap();
        assert!(matches!(
            load_document(&txt_path),
            Err(DocumentError::UnsupportedFormat(_))
        ));
    }
}
