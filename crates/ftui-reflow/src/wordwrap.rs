#![forbid(unsafe_code)]

//! Streaming word wrap.
//!
//! Lines are broken at whitespace and at breakpoint runes (`-` by default).
//! Words are never split: a word wider than the limit overflows on a line
//! of its own. Escape sequences travel with the word they are attached to
//! and never count toward line length.
//!
//! Content is staged in two buffers before it reaches the output:
//!
//! - the pending word (contiguous non-whitespace, sequences included)
//! - the pending space (contiguous whitespace)
//!
//! The space is only written once a following word is known to fit on the
//! same line; otherwise it is dropped at the break.

use std::io::{self, Write};

use crate::cluster::{Piece, Segmenter};
use crate::output::{self, Output};
use crate::style::StyleDelta;
use crate::width::cluster_width;
use crate::wrap::{WrapOptions, is_whitespace, line_terminator};

/// Streaming word-wrapping writer.
///
/// ```
/// use ftui_reflow::wordwrap::WordWrap;
/// use std::io::Write;
///
/// let mut w = WordWrap::buffered(4);
/// w.write_all(b"foo bar foo").unwrap();
/// w.close().unwrap();
/// assert_eq!(w.into_string(), "foo\nbar\nfoo");
/// ```
#[derive(Debug)]
pub struct WordWrap<W> {
    out: Output<W>,
    segmenter: Segmenter,
    pieces: Vec<Piece>,
    options: WrapOptions,

    word: Vec<u8>,
    word_width: usize,
    word_style: StyleDelta,
    space: Vec<u8>,
    space_width: usize,

    line_len: usize,
    started: bool,
    closed: bool,
}

impl<W> WordWrap<W> {
    /// Wrap at `limit` cells with default options.
    pub fn new(inner: W, limit: usize) -> Self {
        Self::with_options(inner, WrapOptions::new(limit))
    }

    /// Wrap with explicit options; `mode` is ignored.
    pub fn with_options(inner: W, options: WrapOptions) -> Self {
        Self {
            out: Output::new(inner),
            segmenter: Segmenter::new(),
            pieces: Vec::new(),
            options,
            word: Vec::new(),
            word_width: 0,
            word_style: StyleDelta::default(),
            space: Vec::new(),
            space_width: 0,
            line_len: 0,
            started: false,
            closed: false,
        }
    }

    #[inline]
    pub fn options(&self) -> &WrapOptions {
        &self.options
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

    /// Return the sink. Staged and queued output is lost unless
    /// [`close`](Self::close) succeeded first.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn process(&mut self, buf: &[u8]) {
        if self.options.width == 0 {
            self.out.push(buf);
            return;
        }
        self.segmenter.feed(buf, &mut self.pieces);
        self.handle_pieces();
    }

    fn finalize(&mut self) {
        if self.options.width == 0 {
            return;
        }
        let dangling = self.segmenter.in_sequence();
        self.segmenter.finish(&mut self.pieces);
        self.handle_pieces();

        self.add_word();
        if self.options.keep_newlines && self.line_len + self.space_width <= self.options.width
        {
            self.add_space();
        }
        if dangling {
            tracing::debug!("unterminated escape sequence at close; appending reset");
            self.out.push_reset();
        }
    }

    fn handle_pieces(&mut self) {
        let mut pieces = std::mem::take(&mut self.pieces);
        for piece in pieces.drain(..) {
            match piece {
                Piece::Sequence { bytes, terminated } => {
                    self.word.extend_from_slice(&bytes);
                    if terminated {
                        self.word_style.record(&bytes);
                    }
                }
                Piece::Invalid(bytes) => self.word.extend_from_slice(&bytes),
                Piece::Cluster(cluster) => self.handle_cluster(&cluster),
            }
        }
        self.pieces = pieces;
    }

    fn handle_cluster(&mut self, cluster: &str) {
        let newline = self.options.is_newline(cluster);

        if newline && self.options.keep_newlines {
            if self.word.is_empty() {
                if self.line_len + self.space_width > self.options.width {
                    self.line_len = 0;
                } else {
                    self.out.push(&self.space);
                }
                self.clear_space();
            }
            self.add_word();
            self.out
                .line_break(line_terminator(cluster), self.options.style_continuity);
            self.line_len = 0;
            self.clear_space();
            return;
        }

        if newline || is_whitespace(cluster) {
            self.add_word();
            if !self.options.keep_newlines && !self.started {
                return;
            }
            if newline {
                self.space.push(b' ');
                self.space_width += 1;
            } else {
                self.space.extend_from_slice(cluster.as_bytes());
                self.space_width += cluster_width(cluster);
            }
            return;
        }

        self.started = true;

        if self.options.is_breakpoint(cluster) {
            self.add_space();
            self.add_word();
            self.out.push_str(cluster);
            self.line_len += cluster_width(cluster);
            return;
        }

        self.word.extend_from_slice(cluster.as_bytes());
        self.word_width += cluster_width(cluster);

        let limit = self.options.width;
        if self.line_len + self.space_width + self.word_width > limit && self.word_width < limit {
            tracing::trace!(
                line_len = self.line_len,
                word_width = self.word_width,
                "word wrap: breaking before word"
            );
            self.out.line_break(b"\n", self.options.style_continuity);
            self.line_len = 0;
            self.clear_space();
        }
    }

    fn add_space(&mut self) {
        self.line_len += self.space_width;
        self.out.push(&self.space);
        self.clear_space();
    }

    fn add_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        self.add_space();
        self.line_len += self.word_width;
        self.out.push(&self.word);
        self.word.clear();
        self.word_width = 0;
        self.word_style.apply_to(self.out.style_mut());
    }

    fn clear_space(&mut self) {
        self.space.clear();
        self.space_width = 0;
    }
}

impl WordWrap<Vec<u8>> {
    /// A word wrapper collecting its output in memory.
    #[must_use]
    pub fn buffered(limit: usize) -> Self {
        Self::new(Vec::new(), limit)
    }

    /// Output produced so far. Staged words appear after
    /// [`close`](Self::close).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.out.as_bytes()
    }

    /// Output as a string. Invalid UTF-8 from the input is replaced.
    #[must_use]
    pub fn into_string(self) -> String {
        output::into_string(self.out.into_bytes())
    }
}

impl<W: Write> WordWrap<W> {
    /// Finish the stream: commit the pending word, keep trailing
    /// whitespace that fits, and close any dangling escape sequence.
    /// Later calls only retry forwarding queued output.
    pub fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.closed = true;
            self.finalize();
        }
        self.out.check()
    }
}

impl<W: Write> Write for WordWrap<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.check()?;
        self.process(buf);
        self.out.accept(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Word-wrap `text` at `limit` cells with default options.
#[must_use]
pub fn wrap_words(text: &str, limit: usize) -> String {
    wrap_words_with(text, &WrapOptions::new(limit))
}

/// Word-wrap `text` with explicit options.
#[must_use]
pub fn wrap_words_with(text: &str, options: &WrapOptions) -> String {
    let _span = tracing::debug_span!("wrap_words", width = options.width).entered();
    let mut wrapper = WordWrap::with_options(Vec::new(), options.clone());
    wrapper.process(text.as_bytes());
    wrapper.finalize();
    output::into_string(wrapper.out.into_bytes())
}
