#![forbid(unsafe_code)]

//! Terminal cell width measurement.
//!
//! Widths are computed per grapheme cluster, never per code point, so a base
//! character followed by combining marks counts once and emoji ZWJ sequences
//! count as a single wide glyph. Escape sequences and invalid bytes have no
//! width.
//!
//! # Rules
//!
//! | Cluster                                   | Cells |
//! |-------------------------------------------|-------|
//! | printable ASCII (`0x20..=0x7E`)           | 1     |
//! | other ASCII (controls, newline, tab)      | 0     |
//! | only zero-width code points (ZWJ, marks)  | 0     |
//! | emoji presentation, `FE0F`, or a flag     | 2     |
//! | anything else                             | `unicode-width` of the cluster |
//!
//! # Example
//!
//! ```
//! use ftui_reflow::width::printable_width;
//!
//! assert_eq!(printable_width("\x1b[38;2;249;38;114mfoo"), 3);
//! assert_eq!(printable_width("中文"), 4);
//! ```

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cluster::{Piece, Segmenter};
use crate::token::{Token, Tokenizer, Tokens};

#[inline]
fn is_zero_width_codepoint(c: char) -> bool {
    let u = c as u32;
    matches!(u, 0x0000..=0x001F | 0x007F..=0x009F)
        || matches!(u, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF)
        || matches!(u, 0xFE20..=0xFE2F)
        || matches!(u, 0xFE00..=0xFE0F | 0xE0100..=0xE01EF)
        || matches!(
            u,
            0x00AD | 0x034F | 0x180E | 0x200B | 0x200C | 0x200D | 0x200E | 0x200F | 0x2060 | 0xFEFF
        )
        || matches!(u, 0x202A..=0x202E | 0x2066..=0x2069 | 0x206A..=0x206F)
}

/// Emoji with default emoji presentation. The symbol blocks also hold
/// narrow text-presentation glyphs (check marks, stars, arrows), so only
/// code points `unicode-width` already reports as wide qualify.
#[inline]
fn is_presentation_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F000..=0x1FAFF | 0x2300..=0x23FF | 0x2600..=0x27BF | 0x2B00..=0x2BFF
    ) && c.width() == Some(2)
}

#[inline]
fn is_regional_indicator(c: char) -> bool {
    matches!(c as u32, 0x1F1E6..=0x1F1FF)
}

/// Clusters rendered as one wide emoji glyph: an explicit emoji
/// presentation selector, a flag, or a presentation emoji base.
#[inline]
fn is_emoji_cluster(cluster: &str) -> bool {
    let mut indicators = 0;
    for c in cluster.chars() {
        if c == '\u{FE0F}' || is_presentation_emoji(c) {
            return true;
        }
        if is_regional_indicator(c) {
            indicators += 1;
        }
    }
    indicators >= 2
}

/// Width of a single code point in isolation.
///
/// Prefer [`cluster_width`] for text: combining marks and joiners only make
/// sense together with their base.
#[inline]
#[must_use]
pub fn char_width(ch: char) -> usize {
    if ch.is_ascii() {
        return usize::from(matches!(ch, ' '..='~'));
    }
    if is_zero_width_codepoint(ch) {
        return 0;
    }
    ch.width().unwrap_or(0)
}

/// Width of one grapheme cluster.
#[inline]
#[must_use]
pub fn cluster_width(cluster: &str) -> usize {
    if cluster.is_ascii() {
        return cluster.bytes().filter(|b| matches!(b, 0x20..=0x7E)).count();
    }
    if cluster.chars().all(is_zero_width_codepoint) {
        return 0;
    }
    if is_emoji_cluster(cluster) {
        return 2;
    }
    cluster.width()
}

/// Width of plain text (no escape sequences expected), summed per cluster.
#[must_use]
pub fn text_width(text: &str) -> usize {
    if is_printable_ascii(text.as_bytes()) {
        return text.len();
    }
    text.graphemes(true).map(cluster_width).sum()
}

/// Visible width of `text`, ignoring escape sequences.
#[must_use]
pub fn printable_width(text: &str) -> usize {
    printable_width_bytes(text.as_bytes())
}

/// Visible width of raw bytes.
///
/// Escape sequences and bytes that are not valid UTF-8 contribute nothing.
#[must_use]
pub fn printable_width_bytes(bytes: &[u8]) -> usize {
    if is_printable_ascii(bytes) {
        return bytes.len();
    }

    let mut segmenter = Segmenter::new();
    let mut pieces = Vec::new();
    segmenter.feed(bytes, &mut pieces);
    segmenter.finish(&mut pieces);

    pieces
        .iter()
        .map(|piece| match piece {
            Piece::Cluster(cluster) => cluster_width(cluster),
            Piece::Sequence { .. } | Piece::Invalid(_) => 0,
        })
        .sum()
}

/// Remove every escape sequence from `text`.
#[must_use]
pub fn strip_sequences(text: &str) -> String {
    if !text.as_bytes().contains(&crate::scanner::ESC) {
        return text.to_string();
    }

    let mut tokenizer = Tokenizer::new();
    let mut tokens = Tokens::new();
    let mut out = String::with_capacity(text.len());
    let keep = |tokens: &mut Tokens, out: &mut String| {
        for token in tokens.drain(..) {
            if let Token::Char(ch) = token {
                out.push(ch);
            }
        }
    };
    for &b in text.as_bytes() {
        tokenizer.advance(b, &mut tokens);
        keep(&mut tokens, &mut out);
    }
    tokenizer.finish(&mut tokens);
    keep(&mut tokens, &mut out);
    out
}

/// Whether any visible cluster in `text` is double width.
#[must_use]
pub fn has_wide_chars(text: &str) -> bool {
    if text.is_ascii() {
        return false;
    }
    strip_sequences(text)
        .graphemes(true)
        .any(|cluster| cluster_width(cluster) >= 2)
}

#[inline]
fn is_printable_ascii(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| matches!(b, 0x20..=0x7E))
}
