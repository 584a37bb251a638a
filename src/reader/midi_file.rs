// MIDI file excerpt reader
// Extracts the notes of a bar range of a Standard MIDI File (metrical timing)

use crate::reader::SequenceError;
use crate::sequencer::note::Note;
use crate::sequencer::sequence::Sequence;
use midly::{MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::path::Path;

/// Bar range to extract
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Excerpt {
    /// Bars skipped from the start of the file
    pub ignore_bars: u32,
    /// Bars kept after the skipped ones (None = until the last note)
    pub bars: Option<u32>,
    pub quarters_per_bar: f64,
}

/// A note found in a track, timed in ticks
#[derive(Debug, Clone, Copy)]
struct RawNote {
    start_tick: u64,
    end_tick: u64,
    key: u8,
    velocity: u8,
}

/// Read a MIDI file from disk and extract the excerpt
pub fn read_midi_excerpt(path: &Path, excerpt: &Excerpt) -> Result<Sequence, SequenceError> {
    let bytes = std::fs::read(path)
        .map_err(|e| SequenceError::MidiFileError(format!("{}: {}", path.display(), e)))?;
    parse_midi_excerpt(&bytes, excerpt)
}

/// Extract the excerpt from raw SMF bytes
pub fn parse_midi_excerpt(bytes: &[u8], excerpt: &Excerpt) -> Result<Sequence, SequenceError> {
    let smf = Smf::parse(bytes).map_err(|e| SequenceError::MidiFileError(e.to_string()))?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) if tpq.as_int() > 0 => tpq.as_int() as f64,
        _ => {
            return Err(SequenceError::MidiFileError(
                "Only metrical (ticks per quarter) timing is supported".to_string(),
            ));
        }
    };

    let mut raw_notes = Vec::new();
    for track in &smf.tracks {
        collect_track_notes(track, &mut raw_notes);
    }

    let qpb = excerpt.quarters_per_bar;
    let start = excerpt.ignore_bars as f64 * qpb;
    let length = excerpt.bars.map(|bars| bars as f64 * qpb);

    // Tolerate rounding from tick quantization right on the bar line
    const EPSILON: f64 = 1e-9;

    let notes: Vec<Note> = raw_notes
        .iter()
        .filter_map(|raw| {
            let time = raw.start_tick as f64 / ticks_per_quarter - start;
            if time < -EPSILON {
                return None;
            }
            if let Some(length) = length {
                if time >= length - EPSILON {
                    return None;
                }
            }
            let duration = raw.end_tick.saturating_sub(raw.start_tick) as f64 / ticks_per_quarter;
            Some(Note::new(
                time.max(0.0),
                duration,
                raw.key,
                raw.velocity as f32 / 127.0,
            ))
        })
        .collect();

    if notes.is_empty() {
        return Err(SequenceError::NoDataRead);
    }

    Ok(match length {
        Some(length) => Sequence::with_length(notes, length),
        None => Sequence::from_notes(notes, qpb),
    })
}

/// Pair note-on/note-off events of one track
/// Unterminated notes end with the track
fn collect_track_notes(track: &[TrackEvent], out: &mut Vec<RawNote>) {
    let mut tick: u64 = 0;
    let mut open: [Option<(u64, u8)>; 128] = [None; 128];

    for event in track {
        tick += event.delta.as_int() as u64;

        let TrackEventKind::Midi { message, .. } = event.kind else {
            continue;
        };

        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                let key = key.as_int();
                // A retrigger closes the previous hit on the same key
                if let Some((start_tick, velocity)) = open[key as usize].take() {
                    out.push(RawNote {
                        start_tick,
                        end_tick: tick,
                        key,
                        velocity,
                    });
                }
                open[key as usize] = Some((tick, vel.as_int()));
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                if let Some((start_tick, velocity)) = open[key as usize].take() {
                    out.push(RawNote {
                        start_tick,
                        end_tick: tick,
                        key,
                        velocity,
                    });
                }
            }
            _ => {}
        }
    }

    for (key, slot) in open.iter().enumerate() {
        if let Some((start_tick, velocity)) = *slot {
            out.push(RawNote {
                start_tick,
                end_tick: tick,
                key: key as u8,
                velocity,
            });
        }
    }
}
