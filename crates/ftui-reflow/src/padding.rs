#![forbid(unsafe_code)]

//! Right padding of lines to a fixed cell width.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use crate::cluster::{Piece, Segmenter};
use crate::output::{self, Output};
use crate::width::cluster_width;

/// How padding and indentation cells are filled.
#[derive(Clone, Default)]
pub enum Fill {
    /// A plain space per cell.
    #[default]
    Space,
    /// A fixed character per cell.
    Char(char),
    /// A callback invoked once per cell, appending whatever it likes.
    Func(Arc<dyn Fn(&mut Vec<u8>) + Send + Sync>),
}

impl Fill {
    /// Fill from a callback.
    pub fn func(f: impl Fn(&mut Vec<u8>) + Send + Sync + 'static) -> Self {
        Self::Func(Arc::new(f))
    }

    /// Append `cells` fill cells to `out`.
    pub(crate) fn write_cells(&self, cells: usize, out: &mut Vec<u8>) {
        match self {
            Self::Space => out.resize(out.len() + cells, b' '),
            Self::Char(ch) => {
                let mut buf = [0u8; 4];
                let encoded = ch.encode_utf8(&mut buf).as_bytes();
                for _ in 0..cells {
                    out.extend_from_slice(encoded);
                }
            }
            Self::Func(f) => {
                for _ in 0..cells {
                    f(out);
                }
            }
        }
    }
}

impl fmt::Debug for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Space => f.write_str("Space"),
            Self::Char(ch) => f.debug_tuple("Char").field(ch).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Whether `cluster` ends a line for padding and indentation.
pub(crate) fn is_line_end(cluster: &str) -> bool {
    cluster == "\n" || cluster == "\r\n"
}

/// Streaming writer that pads every line to `width` cells.
///
/// Lines at or over the width are left alone, and an empty last line is
/// not padded. A style open at the end of a line is closed before the
/// newline and reopened after it.
#[derive(Debug)]
pub struct Padding<W> {
    out: Output<W>,
    segmenter: Segmenter,
    pieces: Vec<Piece>,
    width: usize,
    fill: Fill,
    line_len: usize,
    closed: bool,
}

impl<W> Padding<W> {
    /// Pad lines to `width` cells with spaces. Zero disables padding.
    pub fn new(inner: W, width: usize) -> Self {
        Self::with_fill(inner, width, Fill::Space)
    }

    pub fn with_fill(inner: W, width: usize, fill: Fill) -> Self {
        Self {
            out: Output::new(inner),
            segmenter: Segmenter::new(),
            pieces: Vec::new(),
            width,
            fill,
            line_len: 0,
            closed: false,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
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
        if self.width == 0 {
            self.out.push(buf);
            return;
        }
        self.segmenter.feed(buf, &mut self.pieces);
        self.handle_pieces();
    }

    pub(crate) fn finalize(&mut self) {
        if self.width == 0 {
            return;
        }
        let dangling = self.segmenter.in_sequence();
        self.segmenter.finish(&mut self.pieces);
        self.handle_pieces();
        if self.line_len > 0 {
            self.pad();
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
                Piece::Sequence { bytes, terminated } => self.out.push_sequence(&bytes, terminated),
                Piece::Invalid(bytes) => self.out.push(&bytes),
                Piece::Cluster(cluster) if is_line_end(&cluster) => {
                    self.pad();
                    self.out.line_break(cluster.as_bytes(), true);
                    self.line_len = 0;
                }
                Piece::Cluster(cluster) => {
                    self.out.push_str(&cluster);
                    self.line_len += cluster_width(&cluster);
                }
            }
        }
        self.pieces = pieces;
    }

    fn pad(&mut self) {
        if let Some(cells) = self.width.checked_sub(self.line_len).filter(|&n| n > 0) {
            let mut fill = Vec::new();
            self.fill.write_cells(cells, &mut fill);
            self.out.push(&fill);
        }
    }
}

impl Padding<Vec<u8>> {
    /// A padding writer collecting its output in memory.
    #[must_use]
    pub fn buffered(width: usize) -> Self {
        Self::new(Vec::new(), width)
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

impl<W: Write> Padding<W> {
    /// Finish the stream, padding the last line if it holds content.
    pub fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.closed = true;
            self.finalize();
        }
        self.out.check()
    }
}

impl<W: Write> Write for Padding<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.check()?;
        self.process(buf);
        self.out.accept(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Pad every line of `text` to `width` cells with spaces.
#[must_use]
pub fn pad(text: &str, width: usize) -> String {
    pad_with(text, width, Fill::Space)
}

/// Pad every line of `text` to `width` cells with `fill`.
#[must_use]
pub fn pad_with(text: &str, width: usize, fill: Fill) -> String {
    let mut padding = Padding::with_fill(Vec::new(), width, fill);
    padding.process(text.as_bytes());
    padding.finalize();
    output::into_string(padding.into_bytes())
}
