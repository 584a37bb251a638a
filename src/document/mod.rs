// Beat document - serde representation of a beat description file
// This is the shape read from disk; `BeatDescription::build` validates it

pub mod serialization;

pub use serialization::{DocumentError, load_document, parse_json, parse_ron};

use serde::{Deserialize, Serialize};

/// Top-level beat record
///
/// Every field is optional at this level so validation can report a
/// precise `BeatError` instead of a generic parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatDocument {
    pub name: Option<String>,
    pub group: Option<String>,
    pub bpm: Option<f64>,
    pub quarters_per_bar: Option<f64>,
    /// [numerator, denominator]
    pub signature: Option<[u8; 2]>,
    pub intro: Option<SequenceNode>,
    pub ending: Option<SequenceNode>,
    pub parts: Option<Vec<PartDocument>>,
}

/// One part: a main loop, its fills and an optional transition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartDocument {
    pub name: Option<String>,
    pub sequence: Option<SequenceNode>,
    pub fills: Vec<SequenceNode>,
    pub transition: Option<SequenceNode>,
}

/// Where the notes of a sequence come from
///
/// Either `{filename, ignore_bars?, bars?}` for a MIDI file excerpt or
/// `{notes: [...]}` for an inline list. Numeric fields are kept as raw
/// values so the reader can tell a wrong type from a wrong range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceNode {
    pub filename: Option<String>,
    pub ignore_bars: Option<serde_json::Value>,
    pub bars: Option<serde_json::Value>,
    pub notes: Option<serde_json::Value>,
}

impl SequenceNode {
    /// Node pointing at a MIDI file excerpt
    pub fn midi_file(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    /// Node holding an inline note list
    pub fn inline(notes: serde_json::Value) -> Self {
        Self {
            notes: Some(notes),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_defaults() {
        let doc: BeatDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc, BeatDocument::default());
        assert!(doc.parts.is_none());
    }

    #[test]
    fn test_part_with_fills() {
        let json = r#"{
            "name": "Verse",
            "sequence": { "filename": "verse.mid", "bars": 2 },
            "fills": [ { "notes": [] }, { "filename": "fill.mid", "ignore_bars": 1 } ]
        }"#;
        let part: PartDocument = serde_json::from_str(json).unwrap();

        assert_eq!(part.name.as_deref(), Some("Verse"));
        assert_eq!(part.fills.len(), 2);
        assert!(part.transition.is_none());
        let main = part.sequence.unwrap();
        assert_eq!(main.filename.as_deref(), Some("verse.mid"));
        assert_eq!(main.bars, Some(serde_json::json!(2)));
    }
}
