// Beat Player - Transport state machine and per-block note scheduler
// Control side (Player) and audio side (PlayerProcessor) share one core

use crate::config::PlayerConfig;
use crate::messaging::{
    AtomicF64, CommandConsumer, CommandProducer, TransportCommand, create_command_channel,
};
use crate::sequencer::beat::{BeatDescription, SequenceSlot};
use crate::sequencer::events::{DeferredEvent, MergeTracker, PendingEvents, RecentTrigger};
use crate::sequencer::splice::{self, Splice, SpliceKind};
use crate::sequencer::timeline::{Tempo, bar_offset};
use crate::sequencer::transport::{PlayerState, SlotQueue};
use ringbuf::traits::{Consumer, Producer};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Upper bound on sequence segments handled in one block
const MAX_SEGMENTS: usize = 64;

/// Positions closer than this are considered equal
const POSITION_EPSILON: f64 = 1e-9;

/// Note callback: (sample delay in block, pitch, velocity); velocity 0.0 is a note-off
pub type NoteCallback = Box<dyn FnMut(u32, u8, f32) + Send>;

/// Values published by the audio side for the control-side accessors
#[derive(Debug, Default)]
struct Status {
    state: AtomicU8,
    part_index: AtomicUsize,
    fill_index: AtomicUsize,
    bar_position: AtomicF64,
    overrun_blocks: AtomicUsize,
}

struct Shared {
    core: Mutex<PlayerCore>,
    tempo: AtomicF64,
    sample_rate: AtomicF64,
    status: Status,
}

/// A splice waiting for its position, with the sequences that take over
///
/// The queue keeps only the active sequence while this is pending.
#[derive(Debug, Clone, Copy)]
struct PendingSplice {
    splice: Splice,
    /// Entered at the splice point; `None` stops playback there
    target: Option<SequenceSlot>,
    /// Queued behind `target`
    then: Option<SequenceSlot>,
}

/// Playback state, touched by the audio thread under `try_lock`
/// and by the control thread only for loads and resets
struct PlayerCore {
    beat: Option<Arc<BeatDescription>>,
    commands: CommandConsumer,
    state: PlayerState,
    queue: SlotQueue,
    /// Position in the front sequence, in quarter-notes
    position: f64,
    part_index: usize,
    fill_index: usize,
    pending_splice: Option<PendingSplice>,
    /// Blocks cut short by `MAX_SEGMENTS`
    overrun_blocks: usize,
    events: PendingEvents,
    merges: MergeTracker,
    bar_end_margin: f64,
    merge_window: f64,
}

impl PlayerCore {
    fn reset(&mut self) {
        self.state = PlayerState::Stopped;
        self.queue.clear();
        self.position = 0.0;
        self.part_index = 0;
        self.fill_index = 0;
        self.pending_splice = None;
    }

    fn quarters_per_bar(&self) -> f64 {
        self.beat
            .as_ref()
            .map(|b| b.quarters_per_bar())
            .unwrap_or(4.0)
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.try_pop() {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: TransportCommand) {
        let Some(beat) = self.beat.clone() else {
            return;
        };

        match (command, self.state) {
            (TransportCommand::Start, PlayerState::Stopped) => {
                self.queue.clear();
                self.position = 0.0;
                self.pending_splice = None;
                let part = self.part_index % beat.part_count();
                self.part_index = part;
                if beat.intro().is_some() {
                    self.queue.push(SequenceSlot::Intro);
                    self.queue.push(SequenceSlot::MainLoop(part));
                    self.state = PlayerState::Intro;
                } else {
                    self.queue.push(SequenceSlot::MainLoop(part));
                    self.state = PlayerState::Playing;
                }
            }
            (TransportCommand::Fill, PlayerState::Playing) => {
                let part = self.part_index;
                let fill_count = beat.part(part).map(|p| p.fills.len()).unwrap_or(0);
                if fill_count == 0 {
                    return;
                }
                let index = self.fill_index % fill_count;
                self.fill_index = (index + 1) % fill_count;
                self.state = PlayerState::Fill;
                self.request_splice(
                    &beat,
                    Some(SequenceSlot::Fill { part, index }),
                    Some(SequenceSlot::MainLoop(part)),
                );
            }
            (TransportCommand::Next, PlayerState::Playing) => {
                let (target, then) = self.advance_part(&beat);
                self.state = PlayerState::Next;
                self.request_splice(&beat, Some(target), then);
            }
            (TransportCommand::Next, PlayerState::Fill) => {
                let fill_waiting = self.pending_splice.take().is_some();
                let (target, then) = self.advance_part(&beat);
                self.state = PlayerState::Next;
                if fill_waiting {
                    // Fill not started yet: leave the main loop directly
                    self.request_splice(&beat, Some(target), then);
                } else {
                    // Let the fill finish; a transition is followed by the
                    // new main loop once it runs out
                    self.queue.truncate(1);
                    self.queue.push(target);
                }
            }
            (
                TransportCommand::Stop,
                PlayerState::Intro | PlayerState::Playing | PlayerState::Fill | PlayerState::Next,
            ) => {
                let ending = beat.ending().map(|_| SequenceSlot::Ending);
                self.state = PlayerState::Ending;
                self.request_splice(&beat, ending, None);
            }
            _ => {}
        }
    }

    /// Move to the next part; returns the leaving part's transition (or the
    /// next part's main loop when there is none) and what follows it
    fn advance_part(&mut self, beat: &BeatDescription) -> (SequenceSlot, Option<SequenceSlot>) {
        let leaving = self.part_index;
        let entering = (leaving + 1) % beat.part_count();
        self.part_index = entering;
        self.fill_index = 0;

        if beat.part(leaving).and_then(|p| p.transition.as_ref()).is_some() {
            (
                SequenceSlot::Transition(leaving),
                Some(SequenceSlot::MainLoop(entering)),
            )
        } else {
            (SequenceSlot::MainLoop(entering), None)
        }
    }

    /// Decide where `target` takes over; apply at once when immediate
    fn request_splice(
        &mut self,
        beat: &BeatDescription,
        target: Option<SequenceSlot>,
        then: Option<SequenceSlot>,
    ) {
        self.queue.truncate(1);
        let first_note = target
            .and_then(|slot| beat.sequence(slot))
            .and_then(|s| s.first_note())
            .map(|n| n.time);

        let decided = splice::decide(
            self.position,
            first_note,
            beat.quarters_per_bar(),
            self.bar_end_margin,
        );
        let pending = PendingSplice {
            splice: decided,
            target,
            then,
        };

        if decided.kind == SpliceKind::Immediate {
            self.enter_lookahead(pending);
        } else {
            self.pending_splice = Some(pending);
        }
    }

    /// Replace the active sequence with the splice target
    fn enter_lookahead(&mut self, pending: PendingSplice) {
        self.pending_splice = None;
        self.queue.clear();
        let Some(target) = pending.target else {
            self.reset();
            return;
        };
        self.queue.push(target);
        if let Some(then) = pending.then {
            self.queue.push(then);
        }
        self.position = pending.splice.enter;
        self.settle_state();
    }

    /// Back to Playing once a main loop is at the front
    fn settle_state(&mut self) {
        let at_main_loop = self.queue.front().is_some_and(|s| s.is_main_loop());
        if at_main_loop
            && matches!(
                self.state,
                PlayerState::Intro | PlayerState::Fill | PlayerState::Next
            )
        {
            self.state = PlayerState::Playing;
        }
    }

    /// The front sequence ran out
    fn on_exhausted(&mut self, length: f64) {
        if let Some(pending) = self.pending_splice.as_mut() {
            // Splice point lies in the next repetition
            pending.splice.at -= length;
            self.position = (self.position - length).max(0.0);
            return;
        }

        if self.queue.len() > 1 {
            self.queue.pop_front();
            self.position = 0.0;
            self.settle_state();
        } else if let Some(SequenceSlot::Transition(_)) = self.queue.front() {
            self.queue.clear();
            self.queue.push(SequenceSlot::MainLoop(self.part_index));
            self.position = 0.0;
            self.settle_state();
        } else if self.state == PlayerState::Ending {
            self.reset();
        } else {
            self.position = 0.0;
        }
    }

    /// Schedule everything that falls in the next `block_size` samples
    ///
    /// At most `MAX_SEGMENTS` sequence segments are handled; whatever is
    /// left of the block after that is skipped and counted as an overrun.
    fn schedule(&mut self, block_size: i64, tempo: Tempo, sample_rate: f64) {
        let Some(beat) = self.beat.clone() else {
            return;
        };

        let block_quarters = tempo.samples_to_quarters(block_size as f64, sample_rate);
        let window = tempo.quarters_to_samples(self.merge_window, sample_rate);
        let mut elapsed = 0.0;

        for _ in 0..MAX_SEGMENTS {
            if !self.state.is_running() {
                break;
            }
            let Some(sequence) = self.queue.front().and_then(|slot| beat.sequence(slot)) else {
                self.reset();
                break;
            };

            let remaining = block_quarters - elapsed;
            if remaining <= POSITION_EPSILON {
                break;
            }

            let length = sequence.length();
            let boundary = match self.pending_splice {
                Some(pending) => pending.splice.at.min(length),
                None => length,
            };
            let start = self.position;
            let end = (start + remaining).min(boundary).max(start);

            let notes = &sequence.notes()[sequence.index_at(start)..sequence.index_at(end)];
            for note in notes {
                let on = tempo.quarters_to_samples(elapsed + (note.time - start), sample_rate);
                let off =
                    tempo.quarters_to_samples(elapsed + (note.end_time() - start), sample_rate);
                self.trigger(note.pitch, note.velocity, on, off, window);
            }

            elapsed += end - start;
            self.position = end;

            if end < boundary - POSITION_EPSILON {
                // Block used up before anything happens
                break;
            }

            match self.pending_splice {
                Some(pending) if self.position >= pending.splice.at - POSITION_EPSILON => {
                    self.enter_lookahead(pending);
                }
                _ => self.on_exhausted(length),
            }
        }

        if self.state.is_running() && block_quarters - elapsed > POSITION_EPSILON {
            self.overrun_blocks += 1;
        }
    }

    fn trigger(&mut self, pitch: u8, velocity: f32, on: i64, off: i64, window: i64) {
        // A note-off never shares the sample of its note-on
        let off = off.max(on + 1);
        if let Some(recent) = self.merges.find_mut(pitch, on, window) {
            if off > recent.off_delay {
                if let Some(event) = self.events.find_note_off_mut(pitch, recent.off_delay) {
                    event.delay = off;
                }
                recent.off_delay = off;
            }
            return;
        }

        if self.events.spare() < 2 {
            return;
        }
        self.events.push(DeferredEvent::note_on(on, pitch, velocity));
        self.events.push(DeferredEvent::note_off(off, pitch));
        self.merges.record(RecentTrigger {
            pitch,
            on_delay: on,
            off_delay: off,
        });
    }

    fn publish(&self, status: &Status) {
        status.state.store(self.state.to_u8(), Ordering::Release);
        status.part_index.store(self.part_index, Ordering::Relaxed);
        status.fill_index.store(self.fill_index, Ordering::Relaxed);
        status
            .overrun_blocks
            .store(self.overrun_blocks, Ordering::Relaxed);
        status
            .bar_position
            .set(bar_offset(self.position, self.quarters_per_bar()));
    }
}

/// Control-thread handle: loads beats, sends transport commands
pub struct Player {
    commands: CommandProducer,
    shared: Arc<Shared>,
    beat: Option<Arc<BeatDescription>>,
}

/// Audio-thread handle: runs the scheduler once per buffer
pub struct PlayerProcessor {
    shared: Arc<Shared>,
    callback: Option<NoteCallback>,
}

impl Player {
    /// Create both halves of a player
    pub fn new(config: &PlayerConfig) -> (Player, PlayerProcessor) {
        let (producer, consumer) = create_command_channel(config.command_capacity);

        let core = PlayerCore {
            beat: None,
            commands: consumer,
            state: PlayerState::Stopped,
            queue: SlotQueue::new(),
            position: 0.0,
            part_index: 0,
            fill_index: 0,
            pending_splice: None,
            overrun_blocks: 0,
            events: PendingEvents::with_capacity(config.max_pending_events),
            merges: MergeTracker::with_capacity(config.max_merge_entries),
            bar_end_margin: config.bar_end_margin,
            merge_window: config.merge_window,
        };

        let shared = Arc::new(Shared {
            core: Mutex::new(core),
            tempo: AtomicF64::new(Tempo::DEFAULT_BPM),
            sample_rate: AtomicF64::new(config.sample_rate),
            status: Status::default(),
        });

        let player = Player {
            commands: producer,
            shared: Arc::clone(&shared),
            beat: None,
        };
        let processor = PlayerProcessor {
            shared,
            callback: None,
        };
        (player, processor)
    }

    /// Swap in a new beat and reset playback
    ///
    /// A beat without parts is refused and the current one stays loaded.
    pub fn load_beat_description(&mut self, beat: Arc<BeatDescription>) -> bool {
        if !beat.is_playable() {
            log::warn!("Refusing beat '{}': no playable part", beat.name());
            return false;
        }

        let Ok(mut core) = self.shared.core.lock() else {
            log::error!("Player state lock poisoned, beat '{}' not loaded", beat.name());
            return false;
        };
        core.beat = Some(Arc::clone(&beat));
        core.reset();
        core.events.flush_note_offs();
        core.merges.clear();
        core.publish(&self.shared.status);
        drop(core);

        self.shared.tempo.set(beat.tempo().bpm());
        log::info!(
            "Loaded beat '{}' ({} parts, {} BPM)",
            beat.name(),
            beat.part_count(),
            beat.tempo().bpm()
        );
        self.beat = Some(beat);
        true
    }

    pub fn start(&mut self) -> bool {
        self.send(TransportCommand::Start)
    }

    pub fn stop(&mut self) -> bool {
        self.send(TransportCommand::Stop)
    }

    pub fn fill_in(&mut self) -> bool {
        self.send(TransportCommand::Fill)
    }

    pub fn next(&mut self) -> bool {
        self.send(TransportCommand::Next)
    }

    fn send(&mut self, command: TransportCommand) -> bool {
        match self.commands.try_push(command) {
            Ok(()) => true,
            Err(command) => {
                log::debug!("Command queue full, dropping {:?}", command);
                false
            }
        }
    }

    /// Silence everything now: drop queued commands and sequences,
    /// release sounding notes at the start of the next block
    pub fn all_off(&mut self) {
        let Ok(mut core) = self.shared.core.lock() else {
            log::error!("Player state lock poisoned, all-off skipped");
            return;
        };
        while core.commands.try_pop().is_some() {}
        core.reset();
        core.events.flush_note_offs();
        core.merges.clear();
        core.publish(&self.shared.status);
        log::debug!("All notes off");
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.shared.sample_rate.set(sample_rate);
        } else {
            log::warn!("Ignoring invalid sample rate {}", sample_rate);
        }
    }

    /// Set the tempo (clamped to the supported BPM range)
    pub fn set_tempo(&mut self, bpm: f64) {
        self.shared.tempo.set(Tempo::new(bpm).bpm());
    }

    pub fn tempo(&self) -> f64 {
        self.shared.tempo.get()
    }

    pub fn sample_rate(&self) -> f64 {
        self.shared.sample_rate.get()
    }

    pub fn state(&self) -> PlayerState {
        PlayerState::from_u8(self.shared.status.state.load(Ordering::Acquire))
    }

    pub fn part_index(&self) -> usize {
        self.shared.status.part_index.load(Ordering::Relaxed)
    }

    pub fn part_name(&self) -> Option<&str> {
        self.beat
            .as_ref()?
            .part(self.part_index())
            .map(|p| p.name.as_str())
    }

    /// Index of the fill the next fill-in will play
    pub fn fill_index(&self) -> usize {
        self.shared.status.fill_index.load(Ordering::Relaxed)
    }

    /// Position within the current bar, in quarter-notes
    pub fn bar_position(&self) -> f64 {
        self.shared.status.bar_position.get()
    }

    /// Blocks in which scheduling gave up before the end of the block
    ///
    /// Only very short sequences at large block sizes get here; playback
    /// then lags the host clock by the skipped part of each such block.
    pub fn overrun_blocks(&self) -> usize {
        self.shared.status.overrun_blocks.load(Ordering::Relaxed)
    }

    pub fn beat(&self) -> Option<&Arc<BeatDescription>> {
        self.beat.as_ref()
    }
}

impl PlayerProcessor {
    pub fn set_note_callback(&mut self, callback: impl FnMut(u32, u8, f32) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Process one audio buffer of `sample_count` samples
    ///
    /// Skips the whole block if the control thread holds the state lock.
    /// A block crossing more than 64 sequence ends is scheduled only up to
    /// the 64th; see [`Player::overrun_blocks`].
    pub fn tick(&mut self, sample_count: usize) {
        let Ok(mut core) = self.shared.core.try_lock() else {
            return;
        };

        let block_size = sample_count as i64;
        let tempo = Tempo::new(self.shared.tempo.get());
        let sample_rate = self.shared.sample_rate.get();

        core.drain_commands();
        core.schedule(block_size, tempo, sample_rate);

        match self.callback.as_mut() {
            Some(callback) => core.events.emit_due(block_size, |e| {
                callback(e.delay.max(0) as u32, e.pitch, e.velocity)
            }),
            None => core.events.emit_due(block_size, |_| {}),
        }

        let window = tempo.quarters_to_samples(core.merge_window, sample_rate);
        core.merges.expire(block_size, window);
        core.publish(&self.shared.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::beat::Part;
    use crate::sequencer::note::Note;
    use crate::sequencer::sequence::Sequence;

    /// One quarter-note at 120 BPM, 48 kHz
    const QUARTER: usize = 24000;

    type Events = Arc<Mutex<Vec<(u32, u8, f32)>>>;

    fn one_bar(notes: &[(f64, u8)]) -> Sequence {
        let notes = notes
            .iter()
            .map(|&(time, pitch)| Note::new(time, 0.1, pitch, 1.0))
            .collect();
        Sequence::from_notes(notes, 4.0)
    }

    fn setup(beat: BeatDescription) -> (Player, PlayerProcessor, Events) {
        let (mut player, mut processor) = Player::new(&PlayerConfig::default());
        let events: Events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        processor.set_note_callback(move |delay, pitch, velocity| {
            sink.lock().unwrap().push((delay, pitch, velocity));
        });
        assert!(player.load_beat_description(Arc::new(beat)));
        (player, processor, events)
    }

    fn simple_beat() -> BeatDescription {
        BeatDescription::new("Rock")
            .with_tempo(120.0)
            .with_part(Part::new("Verse", one_bar(&[(0.0, 36)])))
    }

    #[test]
    fn test_single_note_block() {
        let (mut player, mut processor, events) = setup(simple_beat());
        player.start();
        processor.tick(QUARTER);

        let events = events.lock().unwrap();
        assert_eq!(*events, vec![(0, 36, 1.0), (2400, 36, 0.0)]);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn test_note_off_carried_to_next_block() {
        let (mut player, mut processor, events) = setup(simple_beat());
        player.start();
        processor.tick(1024);
        processor.tick(1024);
        processor.tick(1024);

        let events = events.lock().unwrap();
        // 2400 - 2 * 1024
        assert_eq!(*events, vec![(0, 36, 1.0), (352, 36, 0.0)]);
    }

    #[test]
    fn test_loop_repeats() {
        let (mut player, mut processor, events) = setup(simple_beat());
        player.start();
        for _ in 0..8 {
            processor.tick(QUARTER);
        }

        let ons = events.lock().unwrap().iter().filter(|e| e.2 > 0.0).count();
        assert_eq!(ons, 2);
        assert_eq!(player.bar_position(), 0.0);
    }

    #[test]
    fn test_commands_without_beat_are_ignored() {
        let (mut player, mut processor) = Player::new(&PlayerConfig::default());
        assert!(player.start());
        processor.tick(QUARTER);
        assert_eq!(player.state(), PlayerState::Stopped);
    }

    #[test]
    fn test_empty_beat_refused() {
        let (mut player, _processor, _events) = setup(simple_beat());
        assert!(!player.load_beat_description(Arc::new(BeatDescription::new("Empty"))));
        assert_eq!(player.beat().map(|b| b.name()), Some("Rock"));
    }

    #[test]
    fn test_full_command_queue() {
        let config = PlayerConfig {
            command_capacity: 2,
            ..Default::default()
        };
        let (mut player, _processor) = Player::new(&config);
        assert!(player.start());
        assert!(player.fill_in());
        assert!(!player.next());
    }

    #[test]
    fn test_all_off_releases_notes() {
        let (mut player, mut processor, events) = setup(simple_beat());
        player.start();
        processor.tick(512);
        player.all_off();
        assert_eq!(player.state(), PlayerState::Stopped);

        processor.tick(512);
        let events = events.lock().unwrap();
        assert_eq!(*events, vec![(0, 36, 1.0), (0, 36, 0.0)]);
    }

    #[test]
    fn test_locked_core_skips_block() {
        let (mut player, mut processor, events) = setup(simple_beat());
        player.start();
        {
            let _guard = player.shared.core.lock().unwrap();
            processor.tick(QUARTER);
        }
        assert!(events.lock().unwrap().is_empty());
        assert_eq!(player.state(), PlayerState::Stopped);

        processor.tick(QUARTER);
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[test]
    fn test_tempo_changes_timing() {
        let (mut player, mut processor, events) = setup(simple_beat());
        player.set_tempo(60.0);
        player.start();
        processor.tick(QUARTER * 2);

        // 0.1 quarter at 60 BPM
        assert!(events.lock().unwrap().contains(&(4800, 36, 0.0)));
    }

    #[test]
    fn test_merge_same_pitch() {
        let beat = BeatDescription::new("Flam")
            .with_part(Part::new("A", one_bar(&[(0.0, 38), (0.02, 38), (1.0, 38)])));
        let (mut player, mut processor, events) = setup(beat);
        player.start();
        processor.tick(QUARTER * 2);

        let ons: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.2 > 0.0)
            .map(|e| e.0)
            .collect();
        assert_eq!(ons, vec![0, 24000]);
        // Off extended to the later hit: (0.02 + 0.1) quarter
        assert!(events.lock().unwrap().contains(&(2880, 38, 0.0)));
    }

    #[test]
    fn test_zero_length_note_off_follows_on() {
        let notes = vec![Note::new(0.0, 0.0, 36, 1.0)];
        let beat = BeatDescription::new("Click")
            .with_part(Part::new("A", Sequence::from_notes(notes, 4.0)));
        let (mut player, mut processor, events) = setup(beat);
        player.start();
        processor.tick(QUARTER);

        assert_eq!(*events.lock().unwrap(), vec![(0, 36, 1.0), (1, 36, 0.0)]);
    }

    fn queue_len(player: &Player) -> usize {
        player.shared.core.lock().unwrap().queue.len()
    }

    fn two_part_beat() -> BeatDescription {
        BeatDescription::new("Song")
            .with_part(
                Part::new("Verse", one_bar(&[(0.0, 36)]))
                    .with_fill(one_bar(&[(0.0, 45)]))
                    .with_transition(one_bar(&[(0.0, 49)])),
            )
            .with_part(Part::new("Chorus", one_bar(&[(0.0, 38)])))
    }

    #[test]
    fn test_waiting_fill_stays_out_of_queue() {
        let (mut player, mut processor, _events) = setup(two_part_beat());
        player.start();
        processor.tick(QUARTER * 7 / 2);

        player.fill_in();
        for _ in 0..3 {
            processor.tick(512);
            assert_eq!(player.state(), PlayerState::Fill);
            assert_eq!(queue_len(&player), 1);
            assert!(player.shared.core.lock().unwrap().pending_splice.is_some());
        }

        processor.tick(QUARTER);
        let core = player.shared.core.lock().unwrap();
        assert!(core.pending_splice.is_none());
        assert_eq!(
            core.queue.iter().collect::<Vec<_>>(),
            vec![SequenceSlot::Fill { part: 0, index: 0 }, SequenceSlot::MainLoop(0)]
        );
    }

    #[test]
    fn test_waiting_transition_stays_out_of_queue() {
        let (mut player, mut processor, _events) = setup(two_part_beat());
        player.start();
        processor.tick(QUARTER * 7 / 2);

        player.next();
        processor.tick(512);
        assert_eq!(player.state(), PlayerState::Next);
        assert_eq!(queue_len(&player), 1);

        processor.tick(QUARTER);
        assert_eq!(
            player.shared.core.lock().unwrap().queue.iter().collect::<Vec<_>>(),
            vec![SequenceSlot::Transition(0), SequenceSlot::MainLoop(1)]
        );
    }

    #[test]
    fn test_next_during_fill_chains_transition() {
        let (mut player, mut processor, events) = setup(two_part_beat());
        player.start();
        player.fill_in();
        processor.tick(512);
        assert_eq!(player.state(), PlayerState::Fill);

        player.next();
        processor.tick(512);
        assert_eq!(player.state(), PlayerState::Next);
        assert_eq!(
            player.shared.core.lock().unwrap().queue.iter().collect::<Vec<_>>(),
            vec![SequenceSlot::Fill { part: 0, index: 0 }, SequenceSlot::Transition(0)]
        );

        // Rest of the fill, the transition, then the chorus
        processor.tick(QUARTER * 8);
        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(player.part_index(), 1);
        assert_eq!(
            player.shared.core.lock().unwrap().queue.front(),
            Some(SequenceSlot::MainLoop(1))
        );

        let ons: Vec<u8> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.2 > 0.0)
            .map(|e| e.1)
            .collect();
        assert_eq!(ons, vec![45, 49, 38]);
    }

    #[test]
    fn test_segment_cap_counts_overrun() {
        let tiny = Sequence::from_notes(vec![Note::new(0.0, 0.001, 36, 1.0)], 0.01);
        let beat = BeatDescription::new("Buzz")
            .with_quarters_per_bar(0.01)
            .with_part(Part::new("A", tiny));
        let (mut player, mut processor, _events) = setup(beat);
        player.start();

        // 0.02 quarter: two repetitions
        processor.tick(480);
        assert_eq!(player.overrun_blocks(), 0);

        // A whole quarter is a hundred repetitions
        processor.tick(QUARTER);
        assert_eq!(player.overrun_blocks(), 1);
        assert_eq!(player.state(), PlayerState::Playing);
    }
}
