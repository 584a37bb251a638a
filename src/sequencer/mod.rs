// Sequencer module
// Musical time, sequences, beat descriptions and the real-time beat player

pub mod beat;
pub mod events;
pub mod note;
pub mod player;
pub mod sequence;
pub mod splice;
pub mod timeline;
pub mod transport;

pub use beat::{BeatDescription, BeatError, Part, SequenceSlot};
pub use note::Note;
pub use player::{NoteCallback, Player, PlayerProcessor};
pub use sequence::Sequence;
pub use timeline::{Tempo, TimeSignature};
pub use transport::PlayerState;
