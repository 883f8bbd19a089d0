//! Last-tagged index per signal kind.
//!
//! Replaces re-scanning the tag column for suppression checks: a kind is in
//! cooldown at `i` when it was last placed within `window` candles before `i`.
//! For absorption kinds the recorded index is the live marker, cleared before
//! a new one is placed.

use crate::domain::SignalKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagLedger {
    last: [Option<usize>; 8],
}

impl TagLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: SignalKind, index: usize) {
        self.last[kind.index()] = Some(index);
    }

    pub fn last(&self, kind: SignalKind) -> Option<usize> {
        self.last[kind.index()]
    }

    /// True when `kind` was recorded in `[i - window, i)`.
    pub fn in_cooldown(&self, kind: SignalKind, i: usize, window: usize) -> bool {
        self.last(kind)
            .is_some_and(|last| last < i && last + window >= i)
    }
}
