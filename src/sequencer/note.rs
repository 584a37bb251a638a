// Note representation for the sequencer
// A note is a drum hit with a quarter-note position, pitch, duration, and velocity

/// A musical note in a sequence
///
/// Timing is stored in quarter-notes so a sequence stays independent of
/// tempo and sample rate until the player converts it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Start position in quarter-notes from the start of the sequence
    pub time: f64,

    /// Length in quarter-notes
    pub duration: f64,

    /// MIDI note number (0-127, where 36 = kick on a GM kit)
    pub pitch: u8,

    /// Normalized velocity (0.0-1.0)
    pub velocity: f32,
}

impl Note {
    /// Creates a new note
    pub fn new(time: f64, duration: f64, pitch: u8, velocity: f32) -> Self {
        assert!(pitch <= 127, "MIDI pitch must be 0-127");
        assert!(
            (0.0..=1.0).contains(&velocity),
            "Velocity must be normalized to 0.0-1.0"
        );
        assert!(duration >= 0.0, "Note duration must be >= 0");
        assert!(time >= 0.0, "Note time must be >= 0");

        Self {
            time,
            duration,
            pitch,
            velocity,
        }
    }

    /// Get the end position of this note (in quarter-notes)
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }

    /// Get the note name (e.g., "C1", "A#5")
    pub fn note_name(&self) -> String {
        note_name(self.pitch)
    }
}

/// Name of a MIDI pitch, middle C (60) being "C4"
pub fn note_name(pitch: u8) -> String {
    const NOTE_NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];

    let octave = (pitch / 12) as i32 - 1;
    let note_index = (pitch % 12) as usize;

    format!("{}{}", NOTE_NAMES[note_index], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation() {
        let note = Note::new(1.5, 0.25, 36, 0.8);

        assert_eq!(note.time, 1.5);
        assert_eq!(note.duration, 0.25);
        assert_eq!(note.pitch, 36);
        assert_eq!(note.velocity, 0.8);
        assert_eq!(note.end_time(), 1.75);
    }

    #[test]
    fn test_note_name() {
        // GM kick = C2
        assert_eq!(Note::new(0.0, 0.1, 36, 1.0).note_name(), "C2");
        // Middle C (C4) = MIDI note 60
        assert_eq!(Note::new(0.0, 0.1, 60, 1.0).note_name(), "C4");
        // Closed hi-hat = F#2
        assert_eq!(Note::new(0.0, 0.1, 42, 1.0).note_name(), "F#2");
    }

    #[test]
    #[should_panic(expected = "MIDI pitch must be 0-127")]
    fn test_invalid_pitch() {
        Note::new(0.0, 0.1, 128, 1.0);
    }

    #[test]
    #[should_panic(expected = "Velocity must be normalized to 0.0-1.0")]
    fn test_invalid_velocity() {
        Note::new(0.0, 0.1, 36, 1.5);
    }

    #[test]
    #[should_panic(expected = "Note duration must be >= 0")]
    fn test_negative_duration() {
        Note::new(0.0, -0.1, 36, 1.0);
    }
}
