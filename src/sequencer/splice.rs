// Splice - Decides where a fill, part change or ending takes over
// The decision is bar-aligned and takes pickup notes into account

use crate::sequencer::timeline::bar_offset;

/// Positions closer than this to a bar line count as on it
const ON_BAR_LINE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceKind {
    /// Late in the bar and the lookahead starts with a pickup we already passed:
    /// cut the bar short and jump to the pickup
    ShortBar,
    /// Take over now at the same bar offset
    Immediate,
    /// Keep the current bar until the lookahead's pickup note is due
    Pickup,
    /// Finish the current bar first
    NextBar,
}

/// Where to leave the active sequence and where to enter the lookahead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splice {
    pub kind: SpliceKind,
    /// Position in the active sequence at which the lookahead takes over
    pub at: f64,
    /// Position in the lookahead to start from
    pub enter: f64,
}

/// Decide the splice for a lookahead whose first note is at `first_note`
/// (None when there is nothing to enter, e.g. stopping without an ending)
///
/// `bar_end_margin` is how close to the bar end a position counts as late.
pub fn decide(
    position: f64,
    first_note: Option<f64>,
    quarters_per_bar: f64,
    bar_end_margin: f64,
) -> Splice {
    let threshold = (quarters_per_bar - bar_end_margin).max(0.0);
    let current = bar_offset(position, quarters_per_bar);
    let bar_start = position - current;
    let on_bar_line = current < ON_BAR_LINE || quarters_per_bar - current < ON_BAR_LINE;
    let next_bar = if current < ON_BAR_LINE {
        bar_start
    } else {
        bar_start + quarters_per_bar
    };

    let Some(first) = first_note else {
        return if on_bar_line {
            splice(SpliceKind::Immediate, next_bar.max(position), 0.0)
        } else {
            splice(SpliceKind::NextBar, next_bar, 0.0)
        };
    };

    let first_offset = bar_offset(first, quarters_per_bar);
    let pickup = first_offset >= threshold;

    if on_bar_line {
        return if pickup {
            splice(SpliceKind::Pickup, next_bar + first_offset, first)
        } else {
            splice(SpliceKind::Immediate, next_bar.max(position), 0.0)
        };
    }

    if current >= threshold {
        if pickup && first_offset < current {
            return splice(SpliceKind::ShortBar, position, first);
        }
    } else if first_offset <= current {
        return splice(SpliceKind::Immediate, position, current);
    } else if pickup {
        return splice(SpliceKind::Pickup, bar_start + first_offset, first);
    }

    if pickup {
        splice(SpliceKind::NextBar, next_bar + first_offset, first)
    } else {
        splice(SpliceKind::NextBar, next_bar, 0.0)
    }
}

fn splice(kind: SpliceKind, at: f64, enter: f64) -> Splice {
    Splice { kind, at, enter }
}
