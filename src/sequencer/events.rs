// Deferred note events and same-pitch merge tracking
// Both buffers are reserved up front and never grow on the audio thread

/// Note-on or note-off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEventKind {
    On,
    Off,
}

/// A note event waiting for its sample to come up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredEvent {
    /// Samples from the start of the current block
    pub delay: i64,
    pub kind: NoteEventKind,
    pub pitch: u8,
    pub velocity: f32,
}

impl DeferredEvent {
    pub fn note_on(delay: i64, pitch: u8, velocity: f32) -> Self {
        Self {
            delay,
            kind: NoteEventKind::On,
            pitch,
            velocity,
        }
    }

    pub fn note_off(delay: i64, pitch: u8) -> Self {
        Self {
            delay,
            kind: NoteEventKind::Off,
            pitch,
            velocity: 0.0,
        }
    }

    fn sort_key(&self) -> (i64, u8, u8) {
        // At the same sample a note-off goes out before a retrigger
        let kind = match self.kind {
            NoteEventKind::Off => 0,
            NoteEventKind::On => 1,
        };
        (self.delay, kind, self.pitch)
    }
}

/// Events computed ahead of time, carried from block to block
#[derive(Debug, Clone)]
pub struct PendingEvents {
    events: Vec<DeferredEvent>,
}

impl PendingEvents {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Room left without reallocating
    pub fn spare(&self) -> usize {
        self.events.capacity() - self.events.len()
    }

    /// Add an event; refused (false) when the reserved space is used up
    pub fn push(&mut self, event: DeferredEvent) -> bool {
        if self.spare() == 0 {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn find_note_off_mut(&mut self, pitch: u8, delay: i64) -> Option<&mut DeferredEvent> {
        self.events
            .iter_mut()
            .find(|e| e.kind == NoteEventKind::Off && e.pitch == pitch && e.delay == delay)
    }

    /// Emit, in delay order, every event due before `block_size`,
    /// then move the rest one block closer
    pub fn emit_due(&mut self, block_size: i64, mut emit: impl FnMut(&DeferredEvent)) {
        self.events.sort_unstable_by_key(DeferredEvent::sort_key);

        let due = self.events.partition_point(|e| e.delay < block_size);
        for event in &self.events[..due] {
            emit(event);
        }
        self.events.drain(..due);

        for event in &mut self.events {
            event.delay -= block_size;
        }
    }

    /// Drop pending note-ons and make pending note-offs due immediately
    pub fn flush_note_offs(&mut self) {
        self.events.retain(|e| e.kind == NoteEventKind::Off);
        for event in &mut self.events {
            event.delay = 0;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeferredEvent> {
        self.events.iter()
    }
}

/// A recent trigger, remembered to coalesce near-simultaneous hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentTrigger {
    pub pitch: u8,
    pub on_delay: i64,
    pub off_delay: i64,
}

/// Recent triggers per pitch, aged block by block
#[derive(Debug, Clone)]
pub struct MergeTracker {
    triggers: Vec<RecentTrigger>,
}

impl MergeTracker {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triggers: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Trigger of `pitch` within `window` samples of `on_delay`
    pub fn find_mut(
        &mut self,
        pitch: u8,
        on_delay: i64,
        window: i64,
    ) -> Option<&mut RecentTrigger> {
        self.triggers
            .iter_mut()
            .find(|t| t.pitch == pitch && (t.on_delay - on_delay).abs() <= window)
    }

    /// Remember a trigger; ignored when the reserved space is used up
    pub fn record(&mut self, trigger: RecentTrigger) -> bool {
        if self.triggers.len() == self.triggers.capacity() {
            return false;
        }
        self.triggers.push(trigger);
        true
    }

    /// Age every trigger by one block and forget those out of reach
    pub fn expire(&mut self, block_size: i64, window: i64) {
        for trigger in &mut self.triggers {
            trigger.on_delay -= block_size;
            trigger.off_delay -= block_size;
        }
        self.triggers.retain(|t| t.on_delay + window >= 0);
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }
}
