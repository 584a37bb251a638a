// Sequence reader - Turns a sequence node into a time-ordered note sequence
// Sources: a bar range of a Standard MIDI File, or an inline note list

pub mod midi_file;
pub mod note_list;

use crate::document::SequenceNode;
use crate::sequencer::sequence::Sequence;
use std::path::Path;

/// Why a sequence node could not be turned into a sequence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequenceError {
    #[error("Sequence not present")]
    NotPresent,

    #[error("MIDI file error: {0}")]
    MidiFileError(String),

    #[error("ignore_bars must be a non-negative integer")]
    WrongIgnoreBars,

    #[error("bars must be a non-negative integer")]
    WrongBars,

    #[error("bars must not be zero")]
    ZeroBars,

    #[error("notes must be a list of note records")]
    WrongNoteListFormat,

    #[error("Invalid note time")]
    WrongTimeFormat,

    #[error("Note duration must be a non-negative number")]
    WrongNoteDuration,

    #[error("Note number must be an integer 0-127")]
    WrongNoteNumber,

    #[error("Note velocity must be a number 0-127")]
    WrongNoteValue,

    #[error("No notes read")]
    NoDataRead,
}

/// Read the sequence described by `node`
///
/// Relative file names are resolved against `base_dir` (the directory of
/// the beat document).
pub fn read_sequence(
    node: Option<&SequenceNode>,
    base_dir: &Path,
    quarters_per_bar: f64,
) -> Result<Sequence, SequenceError> {
    let node = node.ok_or(SequenceError::NotPresent)?;

    if let Some(notes) = &node.notes {
        return note_list::read_note_list(notes, quarters_per_bar);
    }

    let Some(filename) = &node.filename else {
        return Err(SequenceError::NotPresent);
    };

    let ignore_bars = match &node.ignore_bars {
        Some(value) => bar_count(value).ok_or(SequenceError::WrongIgnoreBars)?,
        None => 0,
    };
    let bars = match &node.bars {
        Some(value) => match bar_count(value).ok_or(SequenceError::WrongBars)? {
            0 => return Err(SequenceError::ZeroBars),
            n => Some(n),
        },
        None => None,
    };

    let excerpt = midi_file::Excerpt {
        ignore_bars,
        bars,
        quarters_per_bar,
    };
    midi_file::read_midi_excerpt(&base_dir.join(filename), &excerpt)
}

/// Accepts 2 or 2.0, rejects -1, 1.5, "2"
fn bar_count(value: &serde_json::Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_node() {
        let result = read_sequence(None, Path::new("."), 4.0);
        assert_eq!(result, Err(SequenceError::NotPresent));

        let empty = SequenceNode::default();
        assert_eq!(
            read_sequence(Some(&empty), Path::new("."), 4.0),
            Err(SequenceError::NotPresent)
        );
    }

    #[test]
    fn test_bar_range_validation() {
        let mut node = SequenceNode::midi_file("groove.mid");

        node.ignore_bars = Some(json!(-1));
        assert_eq!(
            read_sequence(Some(&node), Path::new("."), 4.0),
            Err(SequenceError::WrongIgnoreBars)
        );

        node.ignore_bars = Some(json!(1));
        node.bars = Some(json!(1.5));
        assert_eq!(
            read_sequence(Some(&node), Path::new("."), 4.0),
            Err(SequenceError::WrongBars)
        );

        node.bars = Some(json!(0));
        assert_eq!(
            read_sequence(Some(&node), Path::new("."), 4.0),
            Err(SequenceError::ZeroBars)
        );
    }

    #[test]
    fn test_missing_midi_file() {
        let node = SequenceNode::midi_file("does-not-exist.mid");
        let result = read_sequence(Some(&node), Path::new("/nonexistent"), 4.0);
        assert!(matches!(result, Err(SequenceError::MidiFileError(_))));
    }

    #[test]
    fn test_inline_takes_precedence() {
        let mut node = SequenceNode::inline(json!([
            { "time": 0.0, "duration": 0.1, "number": 36, "velocity": 127 }
        ]));
        node.filename = Some("ignored.mid".to_string());

        let sequence = read_sequence(Some(&node), Path::new("."), 4.0).unwrap();
        assert_eq!(sequence.note_count(), 1);
    }

    #[test]
    fn test_bar_count() {
        assert_eq!(bar_count(&json!(2)), Some(2));
        assert_eq!(bar_count(&json!(2.0)), Some(2));
        assert_eq!(bar_count(&json!(-2)), None);
        assert_eq!(bar_count(&json!("2")), None);
    }
}
