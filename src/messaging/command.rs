// Command types - Communication control thread → audio thread

/// Transport command, applied by the player at the start of the next block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Start,
    Stop,
    Fill,
    Next,
}
