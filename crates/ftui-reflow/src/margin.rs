#![forbid(unsafe_code)]

//! Margins: indentation plus right padding.

use std::io::{self, Write};

use crate::indent::{Indent, indent_bytes};
use crate::output;
use crate::padding::{Fill, Padding, pad_with};

/// Streaming writer that indents every line by `margin` cells and pads it
/// to `width` cells. The width includes the margin.
#[derive(Debug)]
pub struct Margin<W> {
    inner: Indent<Padding<W>>,
}

impl<W: Write> Margin<W> {
    pub fn new(inner: W, width: usize, margin: usize) -> Self {
        Self::with_fill(inner, width, margin, Fill::Space)
    }

    pub fn with_fill(inner: W, width: usize, margin: usize, fill: Fill) -> Self {
        let padding = Padding::with_fill(inner, width, fill.clone());
        Self {
            inner: Indent::with_fill(padding, margin, fill),
        }
    }

    pub fn get_ref(&self) -> &W {
        self.inner.get_ref().get_ref()
    }

    pub fn get_mut(&mut self) -> &mut W {
        self.inner.get_mut().get_mut()
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().into_inner()
    }

    /// Bytes accepted by the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.inner.get_ref().bytes_written()
    }

    /// Finish indentation, then padding of the last line.
    pub fn close(&mut self) -> io::Result<()> {
        self.inner.close()?;
        self.inner.get_mut().close()
    }
}

impl Margin<Vec<u8>> {
    /// A margin writer collecting its output in memory.
    #[must_use]
    pub fn buffered(width: usize, margin: usize) -> Self {
        Self::new(Vec::new(), width, margin)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.get_ref().as_bytes()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.inner.into_inner().into_string()
    }
}

impl<W: Write> Write for Margin<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Apply a `margin` of spaces to every line of `text`, padded to `width`.
#[must_use]
pub fn margin(text: &str, width: usize, margin: usize) -> String {
    let indented = output::into_string(indent_bytes(text.as_bytes(), margin, Fill::Space));
    pad_with(&indented, width, Fill::Space)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_margin_and_width_pass_through() {
        assert_eq!(margin("foobar", 0, 0), "foobar");
    }

    #[test]
    fn margin_both_sides() {
        assert_eq!(margin("foobar", 10, 2), "  foobar  ");
        assert_eq!(margin("foo", 6, 2), "  foo ");
    }

    #[test]
    fn multi_line() {
        assert_eq!(margin("foo\nbar", 5, 1), " foo \n bar ");
        assert_eq!(margin("foo\nbar\n", 5, 1), " foo \n bar \n");
    }

    #[test]
    fn styled_margin() {
        assert_eq!(
            margin("\x1B[38;2;249;38;114mfoo", 9, 3),
            "\x1B[38;2;249;38;114m\x1B[0m   \x1B[38;2;249;38;114mfoo   "
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut m = Margin::buffered(5, 1);
        m.write_all(b"fo").unwrap();
        m.write_all(b"o\nbar").unwrap();
        m.close().unwrap();
        assert_eq!(m.into_string(), " foo \n bar ");
    }

    #[test]
    fn custom_fill_on_both_sides() {
        let mut m = Margin::with_fill(Vec::new(), 5, 1, Fill::Char('.'));
        m.write_all(b"ab").unwrap();
        m.close().unwrap();
        assert_eq!(m.into_string(), ".ab..");
    }
}
