// Beat description - Immutable, validated description of a drum beat
// Intro, alternating parts (main loop + fills + transition), ending

use crate::document::{self, BeatDocument, SequenceNode};
use crate::reader::{self, SequenceError};
use crate::sequencer::sequence::Sequence;
use crate::sequencer::timeline::{Tempo, TimeSignature};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BeatError {
    #[error("Beat file does not exist")]
    NonexistentFile,

    #[error("Beat has no name")]
    NoFilename,

    #[error("Beat has no usable part")]
    NoParts,

    #[error("Invalid beat document: {0}")]
    InvalidDocument(String),
}

/// Stable reference to one sequence of a beat description
///
/// The player stores these tags instead of references and resolves them
/// against the loaded description on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceSlot {
    Intro,
    MainLoop(usize),
    Fill { part: usize, index: usize },
    Transition(usize),
    Ending,
}

impl SequenceSlot {
    pub fn is_main_loop(&self) -> bool {
        matches!(self, SequenceSlot::MainLoop(_))
    }
}

/// A song part: main loop, fills and the transition played when leaving it
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub main_loop: Sequence,
    pub fills: Vec<Sequence>,
    pub transition: Option<Sequence>,
}

impl Part {
    pub fn new(name: impl Into<String>, main_loop: Sequence) -> Self {
        Self {
            name: name.into(),
            main_loop,
            fills: Vec::new(),
            transition: None,
        }
    }

    pub fn with_fill(mut self, fill: Sequence) -> Self {
        self.fills.push(fill);
        self
    }

    pub fn with_transition(mut self, transition: Sequence) -> Self {
        self.transition = Some(transition);
        self
    }
}

/// A complete beat, read-only once built
#[derive(Debug, Clone, PartialEq)]
pub struct BeatDescription {
    name: String,
    group: String,
    tempo: Tempo,
    quarters_per_bar: f64,
    time_signature: TimeSignature,
    intro: Option<Sequence>,
    parts: Vec<Part>,
    ending: Option<Sequence>,
}

impl BeatDescription {
    /// Start an empty description (4/4 at 120 BPM); add parts with `with_part`
    pub fn new(name: impl Into<String>) -> Self {
        let time_signature = TimeSignature::four_four();
        Self {
            name: name.into(),
            group: String::new(),
            tempo: Tempo::default(),
            quarters_per_bar: time_signature.quarters_per_bar(),
            time_signature,
            intro: None,
            parts: Vec::new(),
            ending: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = Tempo::new(bpm);
        self
    }

    pub fn with_time_signature(mut self, time_signature: TimeSignature) -> Self {
        self.time_signature = time_signature;
        self.quarters_per_bar = time_signature.quarters_per_bar();
        self
    }

    pub fn with_quarters_per_bar(mut self, quarters_per_bar: f64) -> Self {
        self.quarters_per_bar = quarters_per_bar;
        self.time_signature = signature_for(quarters_per_bar);
        self
    }

    pub fn with_intro(mut self, intro: Sequence) -> Self {
        self.intro = Some(intro);
        self
    }

    pub fn with_ending(mut self, ending: Sequence) -> Self {
        self.ending = Some(ending);
        self
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Validate a document and load every sequence it references
    ///
    /// Intro, ending, fills and transitions are optional: when one fails to
    /// load it is logged and left out. A part whose main loop fails is
    /// skipped; if no part survives the beat is rejected.
    pub fn build(document: &BeatDocument, base_dir: &Path) -> Result<Self, BeatError> {
        let name = document
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(BeatError::NoFilename)?;

        let part_documents = document
            .parts
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(BeatError::NoParts)?;

        let mut beat = Self::new(name)
            .with_group(document.group.clone().unwrap_or_default())
            .with_tempo(document.bpm.unwrap_or(Tempo::DEFAULT_BPM));

        match (document.quarters_per_bar, document.signature) {
            (Some(qpb), _) if qpb.is_finite() && qpb > 0.0 => {
                beat = beat.with_quarters_per_bar(qpb);
            }
            (_, Some([numerator, denominator])) => {
                match TimeSignature::new(numerator, denominator) {
                    Some(ts) => beat = beat.with_time_signature(ts),
                    None => log::warn!(
                        "Beat '{}': invalid signature {}/{}, using 4/4",
                        name,
                        numerator,
                        denominator
                    ),
                }
            }
            (Some(qpb), None) => {
                log::warn!("Beat '{}': invalid bar length {}, using 4/4", name, qpb);
            }
            (None, None) => {}
        }

        let qpb = beat.quarters_per_bar;
        beat.intro = optional_sequence(document.intro.as_ref(), base_dir, qpb, name, "intro");
        beat.ending = optional_sequence(document.ending.as_ref(), base_dir, qpb, name, "ending");

        for (index, part_document) in part_documents.iter().enumerate() {
            let part_name = part_document
                .name
                .clone()
                .unwrap_or_else(|| format!("Part {}", index + 1));

            let main_loop =
                match reader::read_sequence(part_document.sequence.as_ref(), base_dir, qpb) {
                    Ok(sequence) => sequence,
                    Err(e) => {
                        log::warn!(
                            "Beat '{}': skipping part '{}', main loop unusable: {}",
                            name,
                            part_name,
                            e
                        );
                        continue;
                    }
                };

            let mut part = Part::new(part_name, main_loop);
            for fill in &part_document.fills {
                if let Some(sequence) = optional_sequence(Some(fill), base_dir, qpb, name, "fill") {
                    part.fills.push(sequence);
                }
            }
            part.transition = optional_sequence(
                part_document.transition.as_ref(),
                base_dir,
                qpb,
                name,
                "transition",
            );
            beat.parts.push(part);
        }

        if beat.parts.is_empty() {
            return Err(BeatError::NoParts);
        }

        Ok(beat)
    }

    /// Read a beat document (JSON or RON) and build it
    /// Sequence files are resolved relative to the document's directory
    pub fn load(path: &Path) -> Result<Self, BeatError> {
        if !path.exists() {
            return Err(BeatError::NonexistentFile);
        }

        let document = document::load_document(path)
            .map_err(|e| BeatError::InvalidDocument(e.to_string()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let beat = Self::build(&document, base_dir)?;
        log::info!(
            "Loaded beat '{}' ({} parts, {}, {})",
            beat.name,
            beat.parts.len(),
            beat.time_signature,
            beat.tempo
        );
        Ok(beat)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn quarters_per_bar(&self) -> f64 {
        self.quarters_per_bar
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn intro(&self) -> Option<&Sequence> {
        self.intro.as_ref()
    }

    pub fn ending(&self) -> Option<&Sequence> {
        self.ending.as_ref()
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Resolve a slot tag against this description
    pub fn sequence(&self, slot: SequenceSlot) -> Option<&Sequence> {
        match slot {
            SequenceSlot::Intro => self.intro.as_ref(),
            SequenceSlot::Ending => self.ending.as_ref(),
            SequenceSlot::MainLoop(part) => self.parts.get(part).map(|p| &p.main_loop),
            SequenceSlot::Fill { part, index } => {
                self.parts.get(part).and_then(|p| p.fills.get(index))
            }
            SequenceSlot::Transition(part) => {
                self.parts.get(part).and_then(|p| p.transition.as_ref())
            }
        }
    }

    /// A description the player can run: at least one part, positive bar length
    pub fn is_playable(&self) -> bool {
        !self.parts.is_empty() && self.quarters_per_bar.is_finite() && self.quarters_per_bar > 0.0
    }
}

fn optional_sequence(
    node: Option<&SequenceNode>,
    base_dir: &Path,
    quarters_per_bar: f64,
    beat_name: &str,
    what: &str,
) -> Option<Sequence> {
    match reader::read_sequence(node, base_dir, quarters_per_bar) {
        Ok(sequence) => Some(sequence),
        Err(SequenceError::NotPresent) => None,
        Err(e) => {
            log::warn!("Beat '{}': ignoring {}: {}", beat_name, what, e);
            None
        }
    }
}

/// Closest notated signature for a bar length (3.5 -> 7/8)
fn signature_for(quarters_per_bar: f64) -> TimeSignature {
    for denominator in [4u8, 8, 16] {
        let numerator = quarters_per_bar * denominator as f64 / 4.0;
        if numerator.fract() == 0.0 && (1.0..=255.0).contains(&numerator) {
            if let Some(ts) = TimeSignature::new(numerator as u8, denominator) {
                return ts;
            }
        }
    }
    TimeSignature::four_four()
}
