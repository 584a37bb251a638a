// Beat Sequencer - Library exports for the renderer, tests and benchmarks

pub mod config;
pub mod document;
pub mod messaging;
pub mod reader;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use config::{ConfigError, PlayerConfig};
pub use document::{BeatDocument, DocumentError, PartDocument, SequenceNode};
pub use messaging::TransportCommand;
pub use reader::SequenceError;
pub use sequencer::{
    BeatDescription, BeatError, Note, Part, Player, PlayerProcessor, PlayerState, Sequence, Tempo,
    TimeSignature,
};
