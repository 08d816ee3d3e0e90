#![forbid(unsafe_code)]

//! Open style bookkeeping.
//!
//! The tracker remembers the most recent SGR sequence (`ESC [ … m`) that is
//! not a reset. Sequences do not stack: a later style replaces an earlier
//! one, and a reset clears it. Line breakers use it to close the style before
//! a break they introduce and reissue it afterwards, so every line renders
//! on its own.

use crate::token::SequenceBytes;

/// The canonical reset sequence.
pub const RESET: &[u8] = b"\x1b[0m";

/// Whether `seq` is a complete SGR sequence (`ESC [ params m`).
#[must_use]
pub fn is_style_sequence(seq: &[u8]) -> bool {
    seq.len() >= 3 && seq.starts_with(b"\x1b[") && seq.ends_with(b"m")
}

/// Whether `seq` is an SGR reset: `ESC [ m`, `ESC [ 0 m`, `ESC [ 0;0 m`, ...
#[must_use]
pub fn is_reset_sequence(seq: &[u8]) -> bool {
    is_style_sequence(seq)
        && seq[2..seq.len() - 1]
            .iter()
            .all(|&b| b == b'0' || b == b';')
}

/// Tracks the single open style of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTracker {
    open: Option<SequenceBytes>,
}

impl StyleTracker {
    /// A tracker with no open style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a complete escape sequence.
    ///
    /// Anything that is not an SGR sequence (cursor moves, OSC, unterminated
    /// fragments) leaves the tracker unchanged.
    pub fn observe(&mut self, seq: &[u8]) {
        if !is_style_sequence(seq) {
            return;
        }
        if is_reset_sequence(seq) {
            self.open = None;
        } else {
            self.open = Some(SequenceBytes::from_slice(seq));
        }
    }

    /// The open style, or an empty slice.
    #[inline]
    #[must_use]
    pub fn current_style(&self) -> &[u8] {
        self.open.as_deref().unwrap_or_default()
    }

    /// Whether a non-reset style is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Forget the open style without emitting anything.
    pub fn clear(&mut self) {
        self.open = None;
    }

    /// Append [`RESET`] to `out` if a style is open. Returns whether it did.
    ///
    /// The open style is remembered so it can be restored.
    pub fn write_reset(&self, out: &mut Vec<u8>) -> bool {
        if self.is_open() {
            out.extend_from_slice(RESET);
            true
        } else {
            false
        }
    }

    /// Append the open style to `out` (nothing if none is open).
    pub fn write_restore(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.current_style());
    }
}

/// Style changes recorded while content is staged but not yet committed.
///
/// Pending words and held truncation content carry their own sequences; the
/// stream's style only changes once that content is emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StyleDelta {
    /// No style sequence seen.
    #[default]
    Unchanged,
    /// The last style sequence seen was a reset.
    Reset,
    /// The last style sequence seen opened this style.
    Set(SequenceBytes),
}

impl StyleDelta {
    /// Record a sequence, with the same last-write-wins rule as the tracker.
    pub fn record(&mut self, seq: &[u8]) {
        if !is_style_sequence(seq) {
            return;
        }
        *self = if is_reset_sequence(seq) {
            Self::Reset
        } else {
            Self::Set(SequenceBytes::from_slice(seq))
        };
    }

    /// Apply the recorded change to `tracker` and forget it.
    pub fn apply_to(&mut self, tracker: &mut StyleTracker) {
        match std::mem::take(self) {
            Self::Unchanged => {}
            Self::Reset => tracker.clear(),
            Self::Set(seq) => tracker.open = Some(seq),
        }
    }

    /// The style that would be open after applying this delta to `tracker`.
    #[must_use]
    pub fn resolve<'a>(&'a self, tracker: &'a StyleTracker) -> Option<&'a [u8]> {
        match self {
            Self::Unchanged => tracker.open.as_deref(),
            Self::Reset => None,
            Self::Set(seq) => Some(seq),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Classification ─────────────────────────────────────────────

    #[test]
    fn style_sequences() {
        assert!(is_style_sequence(b"\x1b[31m"));
        assert!(is_style_sequence(b"\x1b[m"));
        assert!(is_style_sequence(b"\x1b[38;2;1;2;3m"));
        assert!(!is_style_sequence(b"\x1b[2J"));
        assert!(!is_style_sequence(b"\x1b]0;m"));
        assert!(!is_style_sequence(b"\x1bm"));
    }

    #[test]
    fn reset_forms() {
        assert!(is_reset_sequence(b"\x1b[0m"));
        assert!(is_reset_sequence(b"\x1b[m"));
        assert!(is_reset_sequence(b"\x1b[00m"));
        assert!(is_reset_sequence(b"\x1b[0;0m"));
        assert!(!is_reset_sequence(b"\x1b[10m"));
        assert!(!is_reset_sequence(b"\x1b[0;1m"));
        assert!(!is_reset_sequence(b"\x1b[0K"));
    }

    // ── Tracker ────────────────────────────────────────────────────

    #[test]
    fn last_write_wins() {
        let mut t = StyleTracker::new();
        t.observe(b"\x1b[1m");
        t.observe(b"\x1b[31m");
        assert_eq!(t.current_style(), b"\x1b[31m");
    }

    #[test]
    fn reset_clears() {
        let mut t = StyleTracker::new();
        t.observe(b"\x1b[31m");
        t.observe(b"\x1b[m");
        assert!(!t.is_open());
        assert_eq!(t.current_style(), b"");
    }

    #[test]
    fn non_style_sequences_ignored() {
        let mut t = StyleTracker::new();
        t.observe(b"\x1b[7m");
        t.observe(b"\x1b[2K");
        t.observe(b"\x1b]8;;http://x\x07");
        assert_eq!(t.current_style(), b"\x1b[7m");
    }

    #[test]
    fn reset_and_restore_output() {
        let mut t = StyleTracker::new();
        let mut out = Vec::new();
        assert!(!t.write_reset(&mut out));
        t.write_restore(&mut out);
        assert!(out.is_empty());

        t.observe(b"\x1b[4m");
        assert!(t.write_reset(&mut out));
        t.write_restore(&mut out);
        assert_eq!(out, b"\x1b[0m\x1b[4m");
        assert!(t.is_open());
    }

    // ── Delta ──────────────────────────────────────────────────────

    #[test]
    fn delta_applies_last_change() {
        let mut t = StyleTracker::new();
        t.observe(b"\x1b[1m");

        let mut d = StyleDelta::default();
        d.record(b"\x1b[2J");
        assert_eq!(d, StyleDelta::Unchanged);
        d.record(b"\x1b[0m");
        d.record(b"\x1b[32m");
        assert_eq!(d.resolve(&t), Some(&b"\x1b[32m"[..]));

        d.apply_to(&mut t);
        assert_eq!(t.current_style(), b"\x1b[32m");
        assert_eq!(d, StyleDelta::Unchanged);
    }

    #[test]
    fn delta_reset_clears_tracker() {
        let mut t = StyleTracker::new();
        t.observe(b"\x1b[1m");
        let mut d = StyleDelta::default();
        d.record(b"\x1b[0m");
        assert_eq!(d.resolve(&t), None);
        d.apply_to(&mut t);
        assert!(!t.is_open());
    }

    #[test]
    fn unchanged_delta_keeps_tracker() {
        let mut t = StyleTracker::new();
        t.observe(b"\x1b[1m");
        let mut d = StyleDelta::default();
        assert_eq!(d.resolve(&t), Some(&b"\x1b[1m"[..]));
        d.apply_to(&mut t);
        assert_eq!(t.current_style(), b"\x1b[1m");
    }
}
