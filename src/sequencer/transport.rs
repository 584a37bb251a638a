// Transport - Playback states and the lookahead queue
// Everything here is fixed-size so the audio thread never allocates

use crate::sequencer::beat::SequenceSlot;

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Stopped,
    Intro,
    Playing,
    Fill,
    Next,
    Ending,
}

impl PlayerState {
    /// Check if the player is producing notes
    pub fn is_running(&self) -> bool {
        !matches!(self, PlayerState::Stopped)
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            PlayerState::Stopped => 0,
            PlayerState::Intro => 1,
            PlayerState::Playing => 2,
            PlayerState::Fill => 3,
            PlayerState::Next => 4,
            PlayerState::Ending => 5,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => PlayerState::Intro,
            2 => PlayerState::Playing,
            3 => PlayerState::Fill,
            4 => PlayerState::Next,
            5 => PlayerState::Ending,
            _ => PlayerState::Stopped,
        }
    }
}

/// Maximum number of queued sequences: the active one plus two lookaheads
pub const QUEUE_CAPACITY: usize = 3;

/// Short stack of queued sequences, front = now playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotQueue {
    slots: [Option<SequenceSlot>; QUEUE_CAPACITY],
    len: usize,
}

impl SlotQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<SequenceSlot> {
        self.get(0)
    }

    pub fn get(&self, index: usize) -> Option<SequenceSlot> {
        if index < self.len {
            self.slots[index]
        } else {
            None
        }
    }

    /// Append a slot; returns false when the queue is full
    pub fn push(&mut self, slot: SequenceSlot) -> bool {
        if self.len == QUEUE_CAPACITY {
            return false;
        }
        self.slots[self.len] = Some(slot);
        self.len += 1;
        true
    }

    /// Remove the front slot, shifting the lookaheads forward
    pub fn pop_front(&mut self) -> Option<SequenceSlot> {
        let front = self.front()?;
        self.slots.rotate_left(1);
        self.len -= 1;
        self.slots[self.len] = None;
        Some(front)
    }

    /// Keep only the first `len` slots
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            self.len -= 1;
            self.slots[self.len] = None;
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    pub fn iter(&self) -> impl Iterator<Item = SequenceSlot> + '_ {
        self.slots[..self.len].iter().flatten().copied()
    }
}
