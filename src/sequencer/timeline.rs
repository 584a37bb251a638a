// Timeline - Musical time representation
// Handles conversion between quarter-notes, bars and samples

use std::fmt;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 3, 4, 5, 6, 7)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Creates a new time signature
    /// Returns None for a zero numerator or a denominator that is not a power of two
    pub fn new(numerator: u8, denominator: u8) -> Option<Self> {
        if numerator == 0 || !denominator.is_power_of_two() {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    /// Common time signature: 4/4
    pub fn four_four() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }

    /// Waltz time: 3/4
    pub fn three_four() -> Self {
        Self {
            numerator: 3,
            denominator: 4,
        }
    }

    /// Compound duple: 6/8
    pub fn six_eight() -> Self {
        Self {
            numerator: 6,
            denominator: 8,
        }
    }

    /// Length of one bar in quarter-notes
    /// 4/4 = 4.0, 3/4 = 3.0, 6/8 = 3.0, 7/8 = 3.5
    pub fn quarters_per_bar(&self) -> f64 {
        self.numerator as f64 * 4.0 / self.denominator as f64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo in BPM (Beats Per Minute, one beat = one quarter-note)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub const MIN_BPM: f64 = 20.0;
    pub const MAX_BPM: f64 = 999.0;
    pub const DEFAULT_BPM: f64 = 120.0;

    /// Creates a new tempo
    /// BPM is clamped to [20.0, 999.0]; non-finite values fall back to 120
    pub fn new(bpm: f64) -> Self {
        let bpm = if bpm.is_finite() {
            bpm.clamp(Self::MIN_BPM, Self::MAX_BPM)
        } else {
            Self::DEFAULT_BPM
        };
        Self { bpm }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one quarter-note in seconds
    pub fn seconds_per_quarter(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one quarter-note in samples at given sample rate
    pub fn samples_per_quarter(&self, sample_rate: f64) -> f64 {
        self.seconds_per_quarter() * sample_rate
    }

    /// Convert a quarter-note span to a whole number of samples
    pub fn quarters_to_samples(&self, quarters: f64, sample_rate: f64) -> i64 {
        (quarters * self.samples_per_quarter(sample_rate)).round() as i64
    }

    /// Convert a sample count to quarter-notes
    pub fn samples_to_quarters(&self, samples: f64, sample_rate: f64) -> f64 {
        let per_quarter = self.samples_per_quarter(sample_rate);
        if per_quarter > 0.0 {
            samples / per_quarter
        } else {
            0.0
        }
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BPM)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Offset of a quarter-note position inside its bar
pub fn bar_offset(position: f64, quarters_per_bar: f64) -> f64 {
    if quarters_per_bar <= 0.0 {
        return 0.0;
    }
    position.rem_euclid(quarters_per_bar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature() {
        let ts = TimeSignature::four_four();
        assert_eq!(ts.numerator, 4);
        assert_eq!(ts.denominator, 4);
        assert_eq!(ts.quarters_per_bar(), 4.0);
        assert_eq!(ts.to_string(), "4/4");
    }

    #[test]
    fn test_invalid_time_signature() {
        assert!(TimeSignature::new(0, 4).is_none());
        assert!(TimeSignature::new(4, 3).is_none());
        assert_eq!(TimeSignature::new(7, 8).map(|ts| ts.quarters_per_bar()), Some(3.5));
    }

    #[test]
    fn test_tempo() {
        let tempo = Tempo::new(120.0);
        assert_eq!(tempo.bpm(), 120.0);
        assert_eq!(tempo.seconds_per_quarter(), 0.5);

        // At 120 BPM, one quarter = 0.5s
        // At 48000 Hz, one quarter = 24000 samples
        assert_eq!(tempo.samples_per_quarter(48000.0), 24000.0);
    }

    #[test]
    fn test_tempo_clamping() {
        assert_eq!(Tempo::new(5.0).bpm(), Tempo::MIN_BPM);
        assert_eq!(Tempo::new(5000.0).bpm(), Tempo::MAX_BPM);
        assert_eq!(Tempo::new(f64::NAN).bpm(), Tempo::DEFAULT_BPM);
    }

    #[test]
    fn test_quarter_sample_conversion() {
        let tempo = Tempo::new(120.0);

        // 0.1 quarter = 2400 samples @ 48kHz, 120 BPM
        assert_eq!(tempo.quarters_to_samples(0.1, 48000.0), 2400);
        assert_eq!(tempo.quarters_to_samples(1.0, 44100.0), 22050);
        assert_eq!(tempo.samples_to_quarters(24000.0, 48000.0), 1.0);
        assert_eq!(tempo.samples_to_quarters(512.0, 0.0), 0.0);
    }

    #[test]
    fn test_bar_helpers() {
        assert_eq!(bar_offset(5.5, 4.0), 1.5);
        assert_eq!(bar_offset(3.0, 4.0), 3.0);
    }
}
