// Sequence - Time-ordered collection of notes forming a loop, fill, intro...
// A sequence always spans a whole number of bars

use crate::sequencer::note::Note;

/// A sequence of notes, ascending by timestamp
///
/// The length is bar-aligned: it is the position at which the player
/// wraps or moves on to the next queued sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    /// All notes, sorted by start time
    notes: Vec<Note>,

    /// Length in quarter-notes (multiple of the bar length)
    length: f64,
}

impl Sequence {
    /// Build a sequence from unordered notes
    ///
    /// The length is the smallest whole number of bars that strictly contains
    /// the last onset (at least one bar).
    pub fn from_notes(mut notes: Vec<Note>, quarters_per_bar: f64) -> Self {
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));

        let last_onset = notes.last().map(|n| n.time).unwrap_or(0.0);
        let bars = (last_onset / quarters_per_bar).floor() + 1.0;

        Self {
            notes,
            length: bars.max(1.0) * quarters_per_bar,
        }
    }

    /// Build a sequence with an explicit length, dropping notes past the end
    pub fn with_length(mut notes: Vec<Note>, length: f64) -> Self {
        notes.retain(|n| n.time < length);
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { notes, length }
    }

    /// Get all notes
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Length in quarter-notes
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Number of bars covered by this sequence
    pub fn bars(&self, quarters_per_bar: f64) -> u32 {
        (self.length / quarters_per_bar).round() as u32
    }

    /// First note of the sequence, if any
    pub fn first_note(&self) -> Option<&Note> {
        self.notes.first()
    }

    /// Index of the first note starting at or after `position`
    pub fn index_at(&self, position: f64) -> usize {
        self.notes.partition_point(|n| n.time < position)
    }

    /// Get the number of notes
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Check if sequence is empty
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(time: f64, pitch: u8) -> Note {
        Note::new(time, 0.1, pitch, 1.0)
    }

    #[test]
    fn test_notes_sorted_by_time() {
        // Add notes out of order
        let sequence = Sequence::from_notes(vec![hit(2.0, 38), hit(0.0, 36), hit(1.0, 42)], 4.0);

        let notes = sequence.notes();
        assert_eq!(notes[0].time, 0.0);
        assert_eq!(notes[1].time, 1.0);
        assert_eq!(notes[2].time, 2.0);
    }

    #[test]
    fn test_bar_aligned_length() {
        let one_bar = Sequence::from_notes(vec![hit(0.0, 36), hit(3.5, 42)], 4.0);
        assert_eq!(one_bar.length(), 4.0);
        assert_eq!(one_bar.bars(4.0), 1);

        // Onset exactly on the bar line opens a second bar
        let two_bars = Sequence::from_notes(vec![hit(0.0, 36), hit(4.0, 36)], 4.0);
        assert_eq!(two_bars.length(), 8.0);

        // 3/4 bar
        let waltz = Sequence::from_notes(vec![hit(4.0, 36)], 3.0);
        assert_eq!(waltz.length(), 6.0);
    }

    #[test]
    fn test_empty_sequence_spans_one_bar() {
        let sequence = Sequence::from_notes(Vec::new(), 4.0);
        assert!(sequence.is_empty());
        assert_eq!(sequence.length(), 4.0);
        assert!(sequence.first_note().is_none());
    }

    #[test]
    fn test_explicit_length_drops_overflow() {
        let sequence = Sequence::with_length(vec![hit(1.0, 36), hit(9.0, 38)], 8.0);
        assert_eq!(sequence.note_count(), 1);
        assert_eq!(sequence.length(), 8.0);
    }

    #[test]
    fn test_index_at() {
        let sequence = Sequence::from_notes(vec![hit(0.0, 36), hit(1.0, 42), hit(2.0, 38)], 4.0);

        assert_eq!(sequence.index_at(0.0), 0);
        assert_eq!(sequence.index_at(0.5), 1);
        assert_eq!(sequence.index_at(1.0), 1);
        assert_eq!(sequence.index_at(3.0), 3);
    }
}
