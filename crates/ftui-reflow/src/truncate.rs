#![forbid(unsafe_code)]

//! Cell-width truncation of styled text.
//!
//! [`Truncate`] passes content through until the visible width would exceed
//! the limit, then cuts: the open style is reset, the tail is appended, and
//! all further input is dropped. Input that fits is returned byte for byte.
//!
//! The tail needs room of its own. Clusters that still fit the limit but
//! not the limit minus the tail width are held back: if the stream ends
//! there they are flushed unchanged, and if it overflows they are replaced
//! by the tail.

use std::io::{self, Write};

use crate::cluster::{Piece, Segmenter};
use crate::output::{self, Output};
use crate::style::StyleDelta;
use crate::width::{cluster_width, printable_width};

/// Streaming truncating writer.
#[derive(Debug)]
pub struct Truncate<W> {
    out: Output<W>,
    segmenter: Segmenter,
    pieces: Vec<Piece>,
    limit: usize,
    tail: String,
    /// Width available before content must be held; `None` when the tail
    /// alone is wider than the limit.
    reserve: Option<usize>,
    width: usize,
    held: Vec<u8>,
    held_style: StyleDelta,
    holding: bool,
    cut: bool,
    closed: bool,
}

impl<W> Truncate<W> {
    /// Truncate to `limit` cells, appending `tail` when content is removed.
    pub fn new(inner: W, limit: usize, tail: impl Into<String>) -> Self {
        let tail = tail.into();
        let reserve = limit.checked_sub(printable_width(&tail));
        Self {
            out: Output::new(inner),
            segmenter: Segmenter::new(),
            pieces: Vec::new(),
            limit,
            tail,
            reserve,
            width: 0,
            held: Vec::new(),
            held_style: StyleDelta::default(),
            holding: reserve.is_none(),
            cut: false,
            closed: false,
        }
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Whether content has been cut.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.cut
    }

    /// Bytes accepted by the sink so far.
    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.out.bytes_written()
    }

    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut W {
        self.out.get_mut()
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn process(&mut self, buf: &[u8]) {
        if self.cut {
            return;
        }
        self.segmenter.feed(buf, &mut self.pieces);
        self.handle_pieces();
    }

    fn finalize(&mut self) {
        let dangling = self.segmenter.in_sequence();
        self.segmenter.finish(&mut self.pieces);
        self.handle_pieces();
        if self.cut {
            return;
        }

        if self.holding {
            self.out.push(&self.held);
            self.held.clear();
            self.held_style.apply_to(self.out.style_mut());
        }
        if dangling {
            tracing::debug!("unterminated escape sequence at close; appending reset");
            self.out.push_reset();
        }
    }

    fn handle_pieces(&mut self) {
        let mut pieces = std::mem::take(&mut self.pieces);
        for piece in pieces.drain(..) {
            if self.cut {
                break;
            }
            match piece {
                Piece::Sequence { bytes, terminated } => {
                    if self.holding {
                        self.held.extend_from_slice(&bytes);
                        if terminated {
                            self.held_style.record(&bytes);
                        }
                    } else {
                        self.out.push_sequence(&bytes, terminated);
                    }
                }
                Piece::Invalid(bytes) => {
                    if self.holding {
                        self.held.extend_from_slice(&bytes);
                    } else {
                        self.out.push(&bytes);
                    }
                }
                Piece::Cluster(cluster) => self.handle_cluster(&cluster),
            }
        }
        pieces.clear();
        self.pieces = pieces;
    }

    fn handle_cluster(&mut self, cluster: &str) {
        let width = self.width + cluster_width(cluster);

        if width > self.limit {
            self.cut_here();
            return;
        }

        if !self.holding && self.reserve.is_some_and(|reserve| width > reserve) {
            self.holding = true;
        }
        if self.holding {
            self.held.extend_from_slice(cluster.as_bytes());
        } else {
            self.out.push_str(cluster);
        }
        self.width = width;
    }

    fn cut_here(&mut self) {
        tracing::trace!(
            width = self.width,
            limit = self.limit,
            discarded = self.held.len(),
            "truncating"
        );
        self.held.clear();
        self.held_style = StyleDelta::default();
        self.out.reset_style();
        self.out.push_str(&self.tail);
        self.cut = true;
    }
}

impl Truncate<Vec<u8>> {
    /// A truncating writer collecting its output in memory.
    #[must_use]
    pub fn buffered(limit: usize, tail: impl Into<String>) -> Self {
        Self::new(Vec::new(), limit, tail)
    }

    /// Output produced so far. Held content appears after
    /// [`close`](Self::close).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.out.as_bytes()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        output::into_string(self.out.into_bytes())
    }
}

impl<W: Write> Truncate<W> {
    /// Finish the stream, flushing held content if nothing was cut. Later
    /// calls only retry forwarding queued output.
    pub fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.closed = true;
            self.finalize();
        }
        self.out.check()
    }
}

impl<W: Write> Write for Truncate<W> {
    /// Consumes the whole chunk even after the cut; input past the cut is
    /// dropped.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.check()?;
        self.process(buf);
        self.out.accept(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Truncate `text` to `limit` cells.
#[must_use]
pub fn truncate(text: &str, limit: usize) -> String {
    truncate_with_tail(text, limit, "")
}

/// Truncate `text` to `limit` cells, ending with `tail` if anything was
/// removed.
#[must_use]
pub fn truncate_with_tail(text: &str, limit: usize, tail: &str) -> String {
    let _span = tracing::debug_span!("truncate", limit).entered();
    let mut truncator = Truncate::new(Vec::new(), limit, tail);
    truncator.process(text.as_bytes());
    truncator.finalize();
    output::into_string(truncator.out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    // ── Plain text ─────────────────────────────────────────────────

    #[test]
    fn fits_unchanged() {
        assert_eq!(truncate("foo", 10), "foo");
        assert_eq!(truncate("foo", 3), "foo");
    }

    #[test]
    fn narrow_symbols_fit() {
        assert_eq!(truncate("\u{2713}\u{2713}", 2), "\u{2713}\u{2713}");
        assert_eq!(truncate("\u{2605}\u{2605}\u{2605}", 2), "\u{2605}\u{2605}");
    }

    #[test]
    fn cuts_at_limit() {
        assert_eq!(truncate("foobar", 3), "foo");
    }

    #[test]
    fn tail_takes_its_room() {
        assert_eq!(truncate_with_tail("foobar", 4, "."), "foo.");
        assert_eq!(truncate_with_tail("foobar", 5, "..."), "fo...");
    }

    #[test]
    fn tail_not_added_when_nothing_removed() {
        assert_eq!(truncate_with_tail("foob", 4, "..."), "foob");
        assert_eq!(truncate_with_tail("", 4, "..."), "");
    }

    #[test]
    fn tail_wider_than_limit() {
        assert_eq!(truncate_with_tail("foo", 2, "..."), "...");
        assert_eq!(truncate_with_tail("fo", 2, "..."), "fo");
    }

    #[test]
    fn zero_limit_drops_everything() {
        assert_eq!(truncate("foo", 0), "");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn wide_cluster_not_split() {
        assert_eq!(truncate("你好", 3), "你");
        assert_eq!(truncate_with_tail("ab你好", 5, "…"), "ab你…");
    }

    #[test]
    fn combining_marks_stay_with_base() {
        assert_eq!(truncate("e\u{0301}e\u{0301}e\u{0301}", 2), "e\u{0301}e\u{0301}");
    }

    // ── Styled text ────────────────────────────────────────────────

    #[test]
    fn style_closed_at_cut() {
        assert_eq!(truncate("\x1B[7m--", 1), "\x1B[7m-\x1B[0m");
    }

    #[test]
    fn style_closed_before_tail() {
        assert_eq!(
            truncate_with_tail("\x1b[31mfoobar", 4, "~"),
            "\x1b[31mfoo\x1b[0m~"
        );
    }

    #[test]
    fn wide_styled_text() {
        assert_eq!(
            truncate("\x1B[38;2;249;38;114m你好\x1B[0m", 3),
            "\x1B[38;2;249;38;114m你\x1B[0m"
        );
    }

    #[test]
    fn styled_fit_is_byte_identical() {
        let input = "\x1b[1mbo\x1b[0mld";
        assert_eq!(truncate_with_tail(input, 4, ".."), input);
    }

    #[test]
    fn held_style_change_is_discarded_on_cut() {
        // "c" and the reset after it are held for the tail, then dropped.
        assert_eq!(
            truncate_with_tail("\x1b[1mabc\x1b[0mdef", 3, "."),
            "\x1b[1mab\x1b[0m."
        );
    }

    #[test]
    fn no_reset_when_style_already_closed() {
        assert_eq!(truncate("\x1b[1mab\x1b[0mcdef", 3), "\x1b[1mab\x1b[0mc");
    }

    #[test]
    fn dangling_sequence_reset_at_close() {
        assert_eq!(truncate("ab\x1b[", 5), "ab\x1b[\x1b[0m");
    }

    // ── Streaming ──────────────────────────────────────────────────

    #[test]
    fn later_chunks_dropped_after_cut() {
        let mut t = Truncate::buffered(3, "");
        t.write_all(b"\x1b[4mab").unwrap();
        t.write_all(b"cd").unwrap();
        // "d" is still an open cluster until the next byte arrives.
        assert!(!t.is_truncated());
        t.write_all(b"\x1b[0mmore").unwrap();
        assert!(t.is_truncated());
        t.close().unwrap();
        assert_eq!(t.into_string(), "\x1b[4mabc\x1b[0m");
    }

    #[test]
    fn held_content_flushed_at_close() {
        let mut t = Truncate::buffered(4, "..");
        t.write_all(b"abc").unwrap();
        assert_eq!(t.as_bytes(), b"ab");
        t.write_all(b"d").unwrap();
        t.close().unwrap();
        assert!(!t.is_truncated());
        assert_eq!(t.as_bytes(), b"abcd");
    }

    #[test]
    #[traced_test]
    fn cut_is_traced() {
        let _ = truncate("foobar", 2);
        assert!(logs_contain("truncating"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn styled() -> impl Strategy<Value = String> {
        "([a-z \u{4e00}-\u{4e10}]{0,6}(\u{1b}\\[[0-9]{1,2}m)?){0,6}"
    }

    proptest! {
        #[test]
        fn width_never_exceeds_limit(s in styled(), limit in 0usize..20, tail in "[.~]{0,3}") {
            prop_assume!(printable_width(&tail) <= limit);
            let out = truncate_with_tail(&s, limit, &tail);
            prop_assert!(printable_width(&out) <= limit, "{:?} -> {:?}", s, out);
        }

        #[test]
        fn fitting_input_unchanged(s in styled(), tail in "[.~]{0,3}") {
            let limit = printable_width(&s);
            prop_assert_eq!(truncate_with_tail(&s, limit, &tail), s);
        }

        #[test]
        fn output_is_prefix_plus_tail(s in "[a-z]{0,30}", limit in 0usize..20) {
            let out = truncate_with_tail(&s, limit, "~");
            if s.len() <= limit {
                prop_assert_eq!(out, s);
            } else {
                prop_assert!(out.ends_with('~'));
                prop_assert!(s.starts_with(out.trim_end_matches('~')));
            }
        }
    }
}
