#![forbid(unsafe_code)]

//! Byte stream to token conversion.
//!
//! [`Tokenizer`] sits on top of the [`Scanner`] and assembles its byte
//! classifications into whole units:
//!
//! - printable bytes are reassembled into code points ([`Token::Char`])
//! - sequence bytes are collected into complete escape sequences
//!   ([`Token::Sequence`])
//! - bytes that do not decode as UTF-8 are surfaced as [`Token::Invalid`] so
//!   callers can forward them verbatim with zero width
//!
//! Partial characters and partial sequences are kept across calls to
//! [`Tokenizer::advance`], so chunk boundaries never split a unit.

use smallvec::{SmallVec, smallvec};

use crate::scanner::{ByteClass, Scanner};

/// Inline capacity for escape sequence bytes (covers truecolor SGR).
pub type SequenceBytes = SmallVec<[u8; 24]>;

/// Scratch list of tokens produced by a single byte.
pub type Tokens = SmallVec<[Token; 2]>;

/// A unit of input recognized by the [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A decoded code point outside any escape sequence, controls included.
    Char(char),
    /// An escape sequence, verbatim.
    ///
    /// `terminated` is false when the sequence was cut short, either by an
    /// unexpected byte or by end of input.
    Sequence {
        bytes: SequenceBytes,
        terminated: bool,
    },
    /// Bytes that are not valid UTF-8.
    Invalid(SmallVec<[u8; 4]>),
}

/// Incremental tokenizer.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    scanner: Scanner,
    seq: SequenceBytes,
    utf8: SmallVec<[u8; 4]>,
    utf8_len: usize,
}

impl Tokenizer {
    /// Create a tokenizer in the text state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an escape sequence is currently open.
    #[inline]
    #[must_use]
    pub fn in_sequence(&self) -> bool {
        !self.seq.is_empty()
    }

    /// Whether any partial unit is buffered.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.seq.is_empty() && self.utf8.is_empty()
    }

    /// Feed one byte, appending any completed tokens to `out`.
    pub fn advance(&mut self, b: u8, out: &mut Tokens) {
        match self.scanner.classify(b) {
            ByteClass::Printable => {
                self.flush_sequence(out);
                self.push_text(b, out);
            }
            ByteClass::SequenceStart => {
                self.flush_utf8(out);
                self.flush_sequence(out);
                self.seq.push(b);
            }
            ByteClass::SequenceContinuation => self.seq.push(b),
            ByteClass::SequenceEnd => {
                self.seq.push(b);
                out.push(Token::Sequence {
                    bytes: std::mem::take(&mut self.seq),
                    terminated: true,
                });
            }
        }
    }

    /// Feed a chunk of bytes and return every completed token.
    #[must_use]
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Token> {
        let mut out = Vec::new();
        let mut tokens = Tokens::new();
        for &b in bytes {
            self.advance(b, &mut tokens);
            out.extend(tokens.drain(..));
        }
        out
    }

    /// Flush partial state at end of input.
    ///
    /// A pending partial character becomes [`Token::Invalid`]; an open
    /// sequence is emitted with `terminated: false`.
    pub fn finish(&mut self, out: &mut Tokens) {
        self.flush_utf8(out);
        self.flush_sequence(out);
        self.scanner.reset();
    }

    fn push_text(&mut self, b: u8, out: &mut Tokens) {
        if self.utf8.is_empty() {
            match utf8_sequence_len(b) {
                Some(1) => out.push(Token::Char(char::from(b))),
                Some(len) => {
                    self.utf8.push(b);
                    self.utf8_len = len;
                }
                None => {
                    tracing::trace!(byte = b, "invalid utf-8 lead byte");
                    out.push(Token::Invalid(smallvec![b]));
                }
            }
            return;
        }

        if is_continuation(b) {
            self.utf8.push(b);
            if self.utf8.len() == self.utf8_len {
                let bytes = std::mem::take(&mut self.utf8);
                match std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) {
                    Some(ch) => out.push(Token::Char(ch)),
                    None => out.push(Token::Invalid(bytes)),
                }
            }
        } else {
            // Truncated character: surface what we have, then restart on `b`.
            self.flush_utf8(out);
            self.push_text(b, out);
        }
    }

    fn flush_utf8(&mut self, out: &mut Tokens) {
        if !self.utf8.is_empty() {
            tracing::trace!(len = self.utf8.len(), "truncated utf-8 sequence");
            out.push(Token::Invalid(std::mem::take(&mut self.utf8)));
        }
    }

    fn flush_sequence(&mut self, out: &mut Tokens) {
        if !self.seq.is_empty() {
            out.push(Token::Sequence {
                bytes: std::mem::take(&mut self.seq),
                terminated: false,
            });
        }
    }
}

/// Expected length of a UTF-8 sequence from its lead byte.
///
/// Overlong (`0xC0`, `0xC1`) and out-of-range (`0xF5..`) leads are rejected.
#[inline]
fn utf8_sequence_len(b: u8) -> Option<usize> {
    match b {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

#[inline]
fn is_continuation(b: u8) -> bool {
    (0x80..=0xBF).contains(&b)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn concat(tokens: &[Token]) -> Vec<u8> {
        let mut out = Vec::new();
        for token in tokens {
            match token {
                Token::Char(ch) => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
                Token::Sequence { bytes, .. } => out.extend_from_slice(bytes),
                Token::Invalid(bytes) => out.extend_from_slice(bytes),
            }
        }
        out
    }

    proptest! {
        #[test]
        fn tokens_reproduce_input(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut t = Tokenizer::new();
            let mut tokens = t.feed(&bytes);
            let mut tail = Tokens::new();
            t.finish(&mut tail);
            tokens.extend(tail);
            prop_assert_eq!(concat(&tokens), bytes);
        }

        #[test]
        fn chunking_does_not_change_tokens(s in "[a-z\u{4e2d}\u{1f389} ]{0,16}(\u{1b}\\[[0-9;]{0,6}m[a-z]{0,4}){0,4}", split in 0usize..64) {
            let bytes = s.as_bytes();
            let split = split.min(bytes.len());

            let mut whole = Tokenizer::new();
            let expected = whole.feed(bytes);

            let mut chunked = Tokenizer::new();
            let mut actual = chunked.feed(&bytes[..split]);
            actual.extend(chunked.feed(&bytes[split..]));

            prop_assert_eq!(actual, expected);
        }
    }
}
