#![forbid(unsafe_code)]

//! Grapheme cluster assembly over a token stream.
//!
//! [`Segmenter`] turns raw bytes into [`Piece`]s: whole grapheme clusters,
//! whole escape sequences, and runs of invalid bytes. A cluster is only
//! released once the next code point proves it complete (or an escape
//! sequence, invalid byte, or end of input closes it), so combining marks
//! and ZWJ sequences arriving in a later chunk still join their base.

use smallvec::SmallVec;
use unicode_segmentation::UnicodeSegmentation;

use crate::token::{SequenceBytes, Token, Tokenizer, Tokens};

/// A unit the layout engines operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// One extended grapheme cluster.
    Cluster(String),
    /// One escape sequence, verbatim.
    Sequence {
        bytes: SequenceBytes,
        terminated: bool,
    },
    /// Bytes that are not valid UTF-8 (zero width).
    Invalid(SmallVec<[u8; 4]>),
}

/// Incremental byte → [`Piece`] segmenter.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    tokenizer: Tokenizer,
    pending: String,
    tokens: Tokens,
}

impl Segmenter {
    /// Create an empty segmenter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.tokenizer.is_idle()
    }

    /// Whether an escape sequence is open (unterminated so far).
    #[must_use]
    pub fn in_sequence(&self) -> bool {
        self.tokenizer.in_sequence()
    }

    /// Feed a chunk, appending completed pieces to `out`.
    pub fn feed(&mut self, bytes: &[u8], out: &mut Vec<Piece>) {
        for &b in bytes {
            self.tokenizer.advance(b, &mut self.tokens);
            self.drain_tokens(out);
        }
    }

    /// Flush everything buffered at end of input.
    pub fn finish(&mut self, out: &mut Vec<Piece>) {
        self.tokenizer.finish(&mut self.tokens);
        self.drain_tokens(out);
        self.flush_cluster(out);
    }

    fn drain_tokens(&mut self, out: &mut Vec<Piece>) {
        let mut tokens = std::mem::take(&mut self.tokens);
        for token in tokens.drain(..) {
            match token {
                Token::Char(ch) => self.push_char(ch, out),
                Token::Sequence { bytes, terminated } => {
                    self.flush_cluster(out);
                    out.push(Piece::Sequence { bytes, terminated });
                }
                Token::Invalid(bytes) => {
                    self.flush_cluster(out);
                    out.push(Piece::Invalid(bytes));
                }
            }
        }
        self.tokens = tokens;
    }

    fn push_char(&mut self, ch: char, out: &mut Vec<Piece>) {
        if self.pending.is_empty() {
            self.pending.push(ch);
            return;
        }

        let boundary = self.pending.len();
        self.pending.push(ch);
        if extends_cluster(&self.pending) {
            return;
        }

        let next = self.pending.split_off(boundary);
        out.push(Piece::Cluster(std::mem::replace(&mut self.pending, next)));
    }

    fn flush_cluster(&mut self, out: &mut Vec<Piece>) {
        if !self.pending.is_empty() {
            out.push(Piece::Cluster(std::mem::take(&mut self.pending)));
        }
    }
}

/// Whether `text` is still a single extended grapheme cluster.
#[inline]
fn extends_cluster(text: &str) -> bool {
    text.graphemes(true)
        .next()
        .is_some_and(|first| first.len() == text.len())
}

/// Segment a complete byte slice into pieces.
#[must_use]
pub fn pieces(bytes: &[u8]) -> Vec<Piece> {
    let mut segmenter = Segmenter::new();
    let mut out = Vec::new();
    segmenter.feed(bytes, &mut out);
    segmenter.finish(&mut out);
    out
}
