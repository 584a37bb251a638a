// Inline note list reader
// notes: [{ time, duration, number, velocity }, ...]

use crate::reader::SequenceError;
use crate::sequencer::note::Note;
use crate::sequencer::sequence::Sequence;
use serde_json::Value;

/// Highest velocity accepted in documents (MIDI scale)
const MAX_VELOCITY: f64 = 127.0;

/// Validate an inline note list and build a sorted sequence from it
pub fn read_note_list(value: &Value, quarters_per_bar: f64) -> Result<Sequence, SequenceError> {
    let entries = value.as_array().ok_or(SequenceError::WrongNoteListFormat)?;
    if entries.is_empty() {
        return Err(SequenceError::NoDataRead);
    }

    let mut notes = Vec::with_capacity(entries.len());
    for entry in entries {
        notes.push(read_note(entry, quarters_per_bar)?);
    }

    Ok(Sequence::from_notes(notes, quarters_per_bar))
}

fn read_note(entry: &Value, quarters_per_bar: f64) -> Result<Note, SequenceError> {
    let record = entry.as_object().ok_or(SequenceError::WrongNoteListFormat)?;

    let time = record
        .get("time")
        .and_then(|t| parse_time(t, quarters_per_bar))
        .ok_or(SequenceError::WrongTimeFormat)?;

    let duration = record
        .get("duration")
        .and_then(Value::as_f64)
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or(SequenceError::WrongNoteDuration)?;

    let pitch = record
        .get("number")
        .and_then(integer)
        .filter(|n| *n <= 127)
        .ok_or(SequenceError::WrongNoteNumber)? as u8;

    let velocity = record
        .get("velocity")
        .and_then(Value::as_f64)
        .filter(|v| (0.0..=MAX_VELOCITY).contains(v))
        .ok_or(SequenceError::WrongNoteValue)?;

    Ok(Note::new(time, duration, pitch, (velocity / MAX_VELOCITY) as f32))
}

/// Either quarters (`2.5`) or `"bar:quarter"` with a 0-based bar index
fn parse_time(value: &Value, quarters_per_bar: f64) -> Option<f64> {
    let quarters = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(text) => {
            let (bar, quarter) = text.split_once(':')?;
            let bar: u32 = bar.trim().parse().ok()?;
            let quarter: f64 = quarter.trim().parse().ok()?;
            if !(0.0..quarters_per_bar).contains(&quarter) {
                return None;
            }
            bar as f64 * quarters_per_bar + quarter
        }
        _ => return None,
    };

    (quarters.is_finite() && quarters >= 0.0).then_some(quarters)
}

fn integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0).then_some(f as u64)
}
