#![forbid(unsafe_code)]

//! Removal of redundant style resets.
//!
//! Wrapped output closes the open style before every break and reissues it
//! after. Once the lines are joined again, or when upstream tools emit the
//! same pattern, a reset that is immediately followed by the style it just
//! closed changes nothing on screen. [`Compressor`] drops such pairs and
//! collapses runs of resets into one.

use std::io::{self, Write};

use crate::output::{self, Output};
use crate::style::{is_reset_sequence, is_style_sequence};
use crate::token::{SequenceBytes, Token, Tokenizer, Tokens};

/// Streaming writer that drops reset/restore pairs with nothing in
/// between.
///
/// A reset is held back until something visible follows it. If the next
/// sequence reopens the style that was open before the reset, both are
/// dropped.
///
/// ```
/// use ftui_reflow::compressor::compress;
///
/// assert_eq!(
///     compress("\x1b[31mre\x1b[0m\x1b[31mflow\x1b[0m"),
///     "\x1b[31mreflow\x1b[0m"
/// );
/// ```
#[derive(Debug)]
pub struct Compressor<W> {
    out: Output<W>,
    tokenizer: Tokenizer,
    tokens: Tokens,
    reset_pending: bool,
    /// Style open before the pending reset.
    restorable: Option<SequenceBytes>,
    closed: bool,
}

impl<W> Compressor<W> {
    pub fn new(inner: W) -> Self {
        Self {
            out: Output::new(inner),
            tokenizer: Tokenizer::new(),
            tokens: Tokens::new(),
            reset_pending: false,
            restorable: None,
            closed: false,
        }
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
        for &b in buf {
            self.tokenizer.advance(b, &mut self.tokens);
            self.handle_tokens();
        }
    }

    fn finalize(&mut self) {
        self.tokenizer.finish(&mut self.tokens);
        self.handle_tokens();
        self.flush_reset();
    }

    fn handle_tokens(&mut self) {
        let mut tokens = std::mem::take(&mut self.tokens);
        for token in tokens.drain(..) {
            match token {
                Token::Sequence {
                    bytes,
                    terminated: true,
                } => self.handle_sequence(bytes),
                Token::Sequence {
                    bytes,
                    terminated: false,
                } => {
                    self.flush_reset();
                    self.out.push_sequence(&bytes, false);
                }
                Token::Invalid(bytes) => {
                    self.flush_reset();
                    self.out.push(&bytes);
                }
                Token::Char(ch) => {
                    self.flush_reset();
                    let mut buf = [0u8; 4];
                    self.out.push(ch.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        self.tokens = tokens;
    }

    fn handle_sequence(&mut self, seq: SequenceBytes) {
        if is_reset_sequence(&seq) {
            if !self.reset_pending {
                self.reset_pending = true;
                self.restorable = is_open_style(self.out.style_mut().current_style());
            }
            self.out.style_mut().clear();
            return;
        }

        if self.reset_pending
            && is_style_sequence(&seq)
            && self.restorable.as_deref() == Some(seq.as_slice())
        {
            tracing::trace!("dropping reset followed by the same style");
            self.reset_pending = false;
            self.restorable = None;
            self.out.style_mut().observe(&seq);
            return;
        }

        self.flush_reset();
        self.out.push_sequence(&seq, true);
    }

    fn flush_reset(&mut self) {
        if self.reset_pending {
            self.reset_pending = false;
            self.restorable = None;
            self.out.push_reset();
        }
    }
}

fn is_open_style(current: &[u8]) -> Option<SequenceBytes> {
    (!current.is_empty()).then(|| SequenceBytes::from_slice(current))
}

impl Compressor<Vec<u8>> {
    /// A compressor collecting its output in memory.
    #[must_use]
    pub fn buffered() -> Self {
        Self::new(Vec::new())
    }

    /// Output produced so far. A held reset appears after
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

impl<W: Write> Compressor<W> {
    /// Finish the stream, emitting a held reset. Later calls only retry
    /// forwarding queued output.
    pub fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.closed = true;
            self.finalize();
        }
        self.out.check()
    }
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.check()?;
        self.process(buf);
        self.out.accept(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Drop redundant reset/restore pairs from `text`.
#[must_use]
pub fn compress(text: &str) -> String {
    let _span = tracing::debug_span!("compress", len = text.len()).entered();
    let mut compressor = Compressor::buffered();
    compressor.process(text.as_bytes());
    compressor.finalize();
    output::into_string(compressor.out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wordwrap::wrap_words;
    use crate::wrap::hard_wrap;
    use tracing_test::traced_test;

    // ── Pairs ──────────────────────────────────────────────────────

    #[test]
    fn different_styles_are_kept() {
        let input = "\x1B[38;2;249;38;114mre\x1B[0m\x1B[38;2;249;38;115mflow\x1B[0m";
        assert_eq!(compress(input), input);
    }

    #[test]
    fn reset_then_same_style_is_dropped() {
        assert_eq!(
            compress("\x1B[38;2;249;38;114mre\x1B[0m\x1B[38;2;249;38;114mflow\x1B[0m"),
            "\x1B[38;2;249;38;114mreflow\x1B[0m"
        );
    }

    #[test]
    fn reset_before_text_is_kept() {
        assert_eq!(
            compress("\x1b[1mA\x1b[0m B \x1b[1mC"),
            "\x1b[1mA\x1b[0m B \x1b[1mC"
        );
    }

    #[test]
    fn repeated_resets_collapse() {
        assert_eq!(compress("a\x1b[0m\x1b[0m\x1b[0mb"), "a\x1b[0mb");
        assert_eq!(compress("\x1b[31ma\x1b[0m\x1b[0m\x1b[31mb"), "\x1b[31mab");
    }

    #[test]
    fn trailing_reset_emitted_at_close() {
        let mut c = Compressor::buffered();
        c.write_all(b"\x1b[31mab\x1b[0m").unwrap();
        assert_eq!(c.as_bytes(), b"\x1b[31mab");
        c.close().unwrap();
        assert_eq!(c.into_string(), "\x1b[31mab\x1b[0m");
    }

    #[test]
    fn reset_before_other_sequence_is_kept() {
        assert_eq!(
            compress("\x1b[31ma\x1b[0m\x1b[2J\x1b[31mb"),
            "\x1b[31ma\x1b[0m\x1b[2J\x1b[31mb"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(compress("foo\nbar 中文"), "foo\nbar 中文");
        assert_eq!(compress(""), "");
    }

    // ── Layout output ──────────────────────────────────────────────

    #[test]
    fn rejoined_hard_wrap_collapses() {
        let wrapped = hard_wrap("\x1b[31mabcdef", 2);
        assert_eq!(compress(&wrapped.replace('\n', "")), "\x1b[31mabcdef");
    }

    #[test]
    fn newlines_keep_their_resets() {
        let wrapped = wrap_words("\x1b[31mone two", 3);
        assert_eq!(compress(&wrapped), wrapped);
    }

    #[test]
    #[traced_test]
    fn dropped_pair_is_traced() {
        let _ = compress("\x1b[1ma\x1b[0m\x1b[1mb");
        assert!(logs_contain("dropping reset"));
    }

    // ── Streaming ──────────────────────────────────────────────────

    #[test]
    fn split_sequences_are_reassembled() {
        let input = b"\x1b[38;5;208mre\x1b[0m\x1b[38;5;208mflow\x1b[0m";
        let mut c = Compressor::buffered();
        for b in input {
            c.write_all(std::slice::from_ref(b)).unwrap();
        }
        c.close().unwrap();
        assert_eq!(c.into_string(), "\x1b[38;5;208mreflow\x1b[0m");
    }

    /// Always fails.
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("fake error"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_error_is_reported() {
        let mut c = Compressor::new(Broken);
        assert_eq!(c.write(b"foo").unwrap(), 3);
        let err = c.write(b"bar").unwrap_err();
        assert_eq!(err.to_string(), "fake error");
        assert!(c.close().is_err());
    }
}
