#![forbid(unsafe_code)]

//! Left indentation of every line.

use std::io::{self, Write};

use crate::output::{self, Output};
use crate::padding::Fill;
use crate::token::{Token, Tokenizer, Tokens};

/// Streaming writer that indents every line by a fixed number of cells.
///
/// The indent is written in front of the first character of each line,
/// after any escape sequences that precede it. An open style is closed
/// around the indent so the fill is never styled.
#[derive(Debug)]
pub struct Indent<W> {
    out: Output<W>,
    tokenizer: Tokenizer,
    tokens: Tokens,
    indent: usize,
    fill: Fill,
    line_start: bool,
    closed: bool,
}

impl<W> Indent<W> {
    /// Indent by `indent` spaces. Zero passes input through.
    pub fn new(inner: W, indent: usize) -> Self {
        Self::with_fill(inner, indent, Fill::Space)
    }

    pub fn with_fill(inner: W, indent: usize, fill: Fill) -> Self {
        Self {
            out: Output::new(inner),
            tokenizer: Tokenizer::new(),
            tokens: Tokens::new(),
            indent,
            fill,
            line_start: true,
            closed: false,
        }
    }

    #[inline]
    pub fn indent(&self) -> usize {
        self.indent
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

    pub(crate) fn process(&mut self, buf: &[u8]) {
        if self.indent == 0 {
            self.out.push(buf);
            return;
        }
        for &b in buf {
            self.tokenizer.advance(b, &mut self.tokens);
            self.handle_tokens();
        }
    }

    pub(crate) fn finalize(&mut self) {
        if self.indent == 0 {
            return;
        }
        let dangling = self.tokenizer.in_sequence();
        self.tokenizer.finish(&mut self.tokens);
        self.handle_tokens();
        if dangling {
            tracing::debug!("unterminated escape sequence at close; appending reset");
            self.out.push_reset();
        }
    }

    fn handle_tokens(&mut self) {
        let mut tokens = std::mem::take(&mut self.tokens);
        for token in tokens.drain(..) {
            match token {
                Token::Sequence { bytes, terminated } => self.out.push_sequence(&bytes, terminated),
                Token::Invalid(bytes) => {
                    self.begin_line();
                    self.out.push(&bytes);
                }
                Token::Char(ch) => {
                    self.begin_line();
                    let mut buf = [0u8; 4];
                    self.out.push(ch.encode_utf8(&mut buf).as_bytes());
                    if ch == '\n' {
                        self.line_start = true;
                    }
                }
            }
        }
        self.tokens = tokens;
    }

    fn begin_line(&mut self) {
        if !self.line_start {
            return;
        }
        self.line_start = false;
        let reopened = self.out.reset_style();
        let mut fill = Vec::new();
        self.fill.write_cells(self.indent, &mut fill);
        self.out.push(&fill);
        if reopened {
            self.out.restore_style();
        }
    }
}

impl Indent<Vec<u8>> {
    /// An indenting writer collecting its output in memory.
    #[must_use]
    pub fn buffered(indent: usize) -> Self {
        Self::new(Vec::new(), indent)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.out.as_bytes()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        output::into_string(self.out.into_bytes())
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.out.into_bytes()
    }
}

impl<W: Write> Indent<W> {
    /// Finish the stream. Later calls only retry forwarding queued output.
    pub fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.closed = true;
            self.finalize();
        }
        self.out.check()
    }
}

impl<W: Write> Write for Indent<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.check()?;
        self.process(buf);
        self.out.accept(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Indent every line of `text` by `indent` spaces.
#[must_use]
pub fn indent(text: &str, indent: usize) -> String {
    indent_with(text, indent, Fill::Space)
}

/// Indent every line of `text` by `indent` cells of `fill`.
#[must_use]
pub fn indent_with(text: &str, indent: usize, fill: Fill) -> String {
    output::into_string(indent_bytes(text.as_bytes(), indent, fill))
}

pub(crate) fn indent_bytes(bytes: &[u8], indent: usize, fill: Fill) -> Vec<u8> {
    let mut indenter = Indent::with_fill(Vec::new(), indent, fill);
    indenter.process(bytes);
    indenter.finalize();
    indenter.into_bytes()
}
