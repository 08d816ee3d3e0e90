#![forbid(unsafe_code)]

//! Wrap configuration and hard (character) wrapping.
//!
//! [`HardWrap`] breaks lines at an exact cell width, between grapheme
//! clusters, regardless of word boundaries. [`WordWrap`](crate::wordwrap::WordWrap)
//! is the soft counterpart. Both are configured through [`WrapOptions`].
//!
//! # Example
//! ```
//! use ftui_reflow::wrap::{hard_wrap, wrap_text, WrapMode};
//!
//! assert_eq!(hard_wrap("foobarfoo", 4), "foob\narfo\no");
//!
//! let lines = wrap_text("Hello world foo bar", 10, WrapMode::Word);
//! assert_eq!(lines, vec!["Hello", "world foo", "bar"]);
//! ```

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::cluster::{Piece, Segmenter};
use crate::output::{self, Output};
use crate::width::cluster_width;
use crate::wordwrap::wrap_words_with;

/// Default line width.
pub const DEFAULT_WIDTH: usize = 80;
/// Default soft-wrap breakpoints.
pub const DEFAULT_BREAKPOINTS: &[char] = &['-'];
/// Default explicit line break runes.
pub const DEFAULT_NEWLINES: &[char] = &['\n'];
/// Default tab expansion for hard wrap.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Text wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// No wrapping - lines may exceed width.
    None,
    /// Break at whitespace and breakpoints; long words overflow.
    #[default]
    Word,
    /// Break between grapheme clusters at the exact width.
    Char,
}

impl WrapMode {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Word => "word",
            Self::Char => "char",
        }
    }
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`WrapMode`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWrapModeError {
    /// The input was empty.
    Empty,
    /// The input named no known mode.
    Unknown(String),
}

impl fmt::Display for ParseWrapModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty wrap mode"),
            Self::Unknown(name) => write!(
                f,
                "unknown wrap mode '{name}' (expected none, word, char or hard)"
            ),
        }
    }
}

impl std::error::Error for ParseWrapModeError {}

impl FromStr for WrapMode {
    type Err = ParseWrapModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseWrapModeError::Empty);
        }
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "word" => Ok(Self::Word),
            "char" | "hard" => Ok(Self::Char),
            _ => Err(ParseWrapModeError::Unknown(s.to_string())),
        }
    }
}

/// Options for text wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOptions {
    /// Maximum width in cells. Zero disables wrapping.
    pub width: usize,
    /// Wrapping mode used by [`wrap_with_options`].
    pub mode: WrapMode,
    /// Runes after which a soft wrap may break.
    pub breakpoints: Vec<char>,
    /// Runes that end a line.
    pub newlines: Vec<char>,
    /// Keep explicit line breaks from the input.
    pub keep_newlines: bool,
    /// Hard wrap: keep whitespace that starts a line after a forced break.
    pub preserve_space: bool,
    /// Hard wrap: cells per tab. A tab crossing the edge becomes spaces.
    pub tab_width: usize,
    /// Close the open style before each line break and reopen it after.
    pub style_continuity: bool,
}

impl WrapOptions {
    /// Create new wrap options with the given width.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            mode: WrapMode::Word,
            breakpoints: DEFAULT_BREAKPOINTS.to_vec(),
            newlines: DEFAULT_NEWLINES.to_vec(),
            keep_newlines: true,
            preserve_space: false,
            tab_width: DEFAULT_TAB_WIDTH,
            style_continuity: true,
        }
    }

    /// Set the wrap mode.
    #[must_use]
    pub fn mode(mut self, mode: WrapMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the runes after which a soft wrap may break.
    #[must_use]
    pub fn breakpoints(mut self, breakpoints: impl IntoIterator<Item = char>) -> Self {
        self.breakpoints = breakpoints.into_iter().collect();
        self
    }

    /// Set the runes treated as explicit line breaks.
    #[must_use]
    pub fn newlines(mut self, newlines: impl IntoIterator<Item = char>) -> Self {
        self.newlines = newlines.into_iter().collect();
        self
    }

    /// Keep or drop explicit line breaks from the input.
    #[must_use]
    pub fn keep_newlines(mut self, keep: bool) -> Self {
        self.keep_newlines = keep;
        self
    }

    /// Keep whitespace that starts a line after a forced break.
    #[must_use]
    pub fn preserve_space(mut self, preserve: bool) -> Self {
        self.preserve_space = preserve;
        self
    }

    /// Set the number of cells a tab occupies in hard wrap.
    #[must_use]
    pub fn tab_width(mut self, width: usize) -> Self {
        self.tab_width = width;
        self
    }

    /// Close and reopen the open style around line breaks.
    #[must_use]
    pub fn style_continuity(mut self, enabled: bool) -> Self {
        self.style_continuity = enabled;
        self
    }

    /// Whether `cluster` is an explicit line break.
    pub(crate) fn is_newline(&self, cluster: &str) -> bool {
        match single_char(cluster) {
            Some(ch) => self.newlines.contains(&ch),
            None => cluster == "\r\n" && self.newlines.contains(&'\n'),
        }
    }

    pub(crate) fn is_breakpoint(&self, cluster: &str) -> bool {
        single_char(cluster).is_some_and(|ch| self.breakpoints.contains(&ch))
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

#[inline]
fn single_char(cluster: &str) -> Option<char> {
    let mut chars = cluster.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

/// Terminator written for an explicit break: `\n` and `\r\n` are kept,
/// other newline runes become `\n`.
pub(crate) fn line_terminator(cluster: &str) -> &[u8] {
    if cluster.ends_with('\n') {
        cluster.as_bytes()
    } else {
        b"\n"
    }
}

pub(crate) fn is_whitespace(cluster: &str) -> bool {
    !cluster.is_empty() && cluster.chars().all(char::is_whitespace)
}

// ── Hard wrap ──────────────────────────────────────────────────────

/// Streaming hard-wrapping writer.
///
/// Every grapheme cluster is placed on the current line; a line break is
/// inserted first when the cluster would overflow a line that already holds
/// content. Escape sequences never count toward the width and are never
/// split.
#[derive(Debug)]
pub struct HardWrap<W> {
    out: Output<W>,
    segmenter: Segmenter,
    pieces: Vec<Piece>,
    options: WrapOptions,
    line_len: usize,
    forced: bool,
    closed: bool,
}

impl<W> HardWrap<W> {
    /// Wrap at `limit` cells with default options.
    pub fn new(inner: W, limit: usize) -> Self {
        Self::with_options(inner, WrapOptions::new(limit))
    }

    /// Wrap with explicit options.
    pub fn with_options(inner: W, options: WrapOptions) -> Self {
        Self {
            out: Output::new(inner),
            segmenter: Segmenter::new(),
            pieces: Vec::new(),
            options,
            line_len: 0,
            forced: false,
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

    /// Return the sink. Output still queued after a sink failure is lost.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn process(&mut self, buf: &[u8]) {
        if self.options.width == 0 {
            self.out.push(buf);
            return;
        }
        self.segmenter.feed(buf, &mut self.pieces);
        self.place_pieces();
    }

    fn finalize(&mut self) {
        if self.options.width == 0 {
            return;
        }
        let dangling = self.segmenter.in_sequence();
        self.segmenter.finish(&mut self.pieces);
        self.place_pieces();
        if dangling {
            tracing::debug!("unterminated escape sequence at close; appending reset");
            self.out.push_reset();
        }
    }

    fn place_pieces(&mut self) {
        let mut pieces = std::mem::take(&mut self.pieces);
        for piece in pieces.drain(..) {
            match piece {
                Piece::Sequence { bytes, terminated } => {
                    self.out.push_sequence(&bytes, terminated);
                }
                Piece::Invalid(bytes) => self.out.push(&bytes),
                Piece::Cluster(cluster) => self.place_cluster(&cluster),
            }
        }
        self.pieces = pieces;
    }

    fn place_cluster(&mut self, cluster: &str) {
        if self.options.is_newline(cluster) {
            if self.options.keep_newlines {
                self.out
                    .line_break(line_terminator(cluster), self.options.style_continuity);
                self.line_len = 0;
            }
            self.forced = false;
            return;
        }

        if cluster == "\t" {
            // A tab that fits is kept; one crossing the edge becomes spaces.
            let tab = self.options.tab_width;
            if tab > 0 && self.line_len + tab <= self.options.width {
                self.place(cluster, tab);
            } else {
                for _ in 0..tab {
                    self.place(" ", 1);
                }
            }
            return;
        }

        self.place(cluster, cluster_width(cluster));
    }

    fn place(&mut self, cluster: &str, width: usize) {
        if self.line_len > 0 && self.line_len + width > self.options.width {
            tracing::trace!(line_len = self.line_len, width, "hard wrap: forced break");
            self.out.line_break(b"\n", self.options.style_continuity);
            self.line_len = 0;
            self.forced = true;
        }

        if self.line_len == 0 {
            if self.forced && !self.options.preserve_space && is_whitespace(cluster) {
                return;
            }
        } else {
            self.forced = false;
        }

        self.out.push_str(cluster);
        self.line_len += width;
    }
}

impl HardWrap<Vec<u8>> {
    /// A hard wrapper collecting its output in memory.
    #[must_use]
    pub fn buffered(limit: usize) -> Self {
        Self::new(Vec::new(), limit)
    }

    /// Output produced so far.
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

impl<W: Write> HardWrap<W> {
    /// Finish the stream: flush the pending cluster and close any dangling
    /// escape sequence. Later calls only retry forwarding queued output.
    pub fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.closed = true;
            self.finalize();
        }
        self.out.check()
    }
}

impl<W: Write> Write for HardWrap<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.check()?;
        self.process(buf);
        self.out.accept(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

// ── One-shot helpers ───────────────────────────────────────────────

/// Hard-wrap `text` at `limit` cells.
#[must_use]
pub fn hard_wrap(text: &str, limit: usize) -> String {
    hard_wrap_with(text, &WrapOptions::new(limit).mode(WrapMode::Char))
}

fn hard_wrap_with(text: &str, options: &WrapOptions) -> String {
    let _span = tracing::debug_span!("hard_wrap", width = options.width).entered();
    let mut wrapper = HardWrap::with_options(Vec::new(), options.clone());
    wrapper.process(text.as_bytes());
    wrapper.finalize();
    output::into_string(wrapper.out.into_bytes())
}

/// Wrap text to the specified width, returning one string per line.
#[must_use]
pub fn wrap_text(text: &str, width: usize, mode: WrapMode) -> Vec<String> {
    wrap_with_options(text, &WrapOptions::new(width).mode(mode))
}

/// Wrap text with full options, returning one string per line.
///
/// With style continuity enabled each line renders correctly on its own.
#[must_use]
pub fn wrap_with_options(text: &str, options: &WrapOptions) -> Vec<String> {
    let wrapped = match options.mode {
        WrapMode::None => text.to_string(),
        WrapMode::Word => wrap_words_with(text, options),
        WrapMode::Char => hard_wrap_with(text, options),
    };
    wrapped
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_hard(input: &str, options: WrapOptions) -> String {
        let mut w = HardWrap::with_options(Vec::new(), options);
        w.write_all(input.as_bytes()).unwrap();
        w.close().unwrap();
        w.into_string()
    }

    // ── Options ────────────────────────────────────────────────────

    #[test]
    fn wrap_options_builder() {
        let opts = WrapOptions::new(40)
            .mode(WrapMode::Char)
            .breakpoints(['-', '/'])
            .newlines(['\n', '|'])
            .keep_newlines(false)
            .preserve_space(true)
            .tab_width(2)
            .style_continuity(false);
        assert_eq!(opts.width, 40);
        assert_eq!(opts.mode, WrapMode::Char);
        assert_eq!(opts.breakpoints, vec!['-', '/']);
        assert_eq!(opts.newlines, vec!['\n', '|']);
        assert!(!opts.keep_newlines);
        assert!(opts.preserve_space);
        assert_eq!(opts.tab_width, 2);
        assert!(!opts.style_continuity);
    }

    #[test]
    fn wrap_options_defaults() {
        let opts = WrapOptions::default();
        assert_eq!(opts.width, DEFAULT_WIDTH);
        assert_eq!(opts.mode, WrapMode::Word);
        assert_eq!(opts.breakpoints, vec!['-']);
        assert_eq!(opts.newlines, vec!['\n']);
        assert!(opts.keep_newlines);
        assert!(!opts.preserve_space);
        assert_eq!(opts.tab_width, 4);
        assert!(opts.style_continuity);
    }

    #[test]
    fn wrap_mode_parses() {
        assert_eq!("none".parse::<WrapMode>(), Ok(WrapMode::None));
        assert_eq!("Word".parse::<WrapMode>(), Ok(WrapMode::Word));
        assert_eq!(" char ".parse::<WrapMode>(), Ok(WrapMode::Char));
        assert_eq!("hard".parse::<WrapMode>(), Ok(WrapMode::Char));
        assert_eq!("".parse::<WrapMode>(), Err(ParseWrapModeError::Empty));
        assert_eq!(
            "soft".parse::<WrapMode>(),
            Err(ParseWrapModeError::Unknown("soft".to_string()))
        );
    }

    #[test]
    fn wrap_mode_display_round_trips() {
        for mode in [WrapMode::None, WrapMode::Word, WrapMode::Char] {
            assert_eq!(mode.to_string().parse::<WrapMode>(), Ok(mode));
        }
    }

    #[test]
    fn parse_error_message() {
        let err = "soft".parse::<WrapMode>().unwrap_err();
        assert!(err.to_string().contains("unknown wrap mode 'soft'"));
    }

    // ── Hard wrap ──────────────────────────────────────────────────

    #[test]
    fn zero_width_passes_through() {
        assert_eq!(hard_wrap("foobar\n ", 0), "foobar\n ");
    }

    #[test]
    fn fits_unchanged() {
        assert_eq!(hard_wrap("foo", 4), "foo");
    }

    #[test]
    fn breaks_at_exact_width() {
        assert_eq!(hard_wrap("foobarfoo", 4), "foob\narfo\no");
    }

    #[test]
    fn explicit_newlines_reset_length() {
        assert_eq!(hard_wrap("f\no\nobar", 3), "f\no\noba\nr");
    }

    #[test]
    fn dropped_newlines() {
        let opts = WrapOptions::new(3).keep_newlines(false);
        assert_eq!(wrap_hard("f\no\nobar", opts), "foo\nbar");
    }

    #[test]
    fn preserve_space_keeps_leading_whitespace() {
        let opts = WrapOptions::new(3).preserve_space(true);
        assert_eq!(wrap_hard("foo bar\n  baz", opts), "foo\n ba\nr\n  b\naz");
    }

    #[test]
    fn leading_whitespace_after_forced_break_dropped() {
        let opts = WrapOptions::new(3);
        assert_eq!(wrap_hard("foo bar\n  baz", opts), "foo\nbar\n  b\naz");
    }

    #[test]
    fn tabs_expand_with_preserved_space() {
        let opts = WrapOptions::new(4).preserve_space(true).tab_width(3);
        assert_eq!(wrap_hard("foo\tbar", opts), "foo \n  ba\nr");
    }

    #[test]
    fn tabs_expand_without_preserved_space() {
        let opts = WrapOptions::new(4).tab_width(3);
        assert_eq!(wrap_hard("foo\tbar", opts), "foo \nbar");
    }

    #[test]
    fn fitting_tab_is_kept() {
        assert_eq!(hard_wrap("a\tb", 10), "a\tb");
        let opts = WrapOptions::new(4).tab_width(2);
        assert_eq!(wrap_hard("a\tbcd", opts), "a\tb\ncd");
    }

    #[test]
    fn zero_tab_width_removes_tabs() {
        let opts = WrapOptions::new(10).tab_width(0);
        assert_eq!(wrap_hard("a\tb", opts), "ab");
    }

    #[test]
    fn wide_chars_never_split() {
        assert_eq!(hard_wrap("中文字", 3), "中\n文\n字");
        assert_eq!(hard_wrap("a中b", 2), "a\n中\nb");
    }

    #[test]
    fn overwide_cluster_gets_its_own_line() {
        assert_eq!(hard_wrap("中a", 1), "中\na");
    }

    #[test]
    fn crlf_is_kept() {
        assert_eq!(hard_wrap("abc\r\nde", 2), "ab\nc\r\nde");
    }

    #[test]
    fn styled_text_fits_unchanged() {
        let input = "\x1B[38;2;249;38;114mfoo\x1B[0m\x1B[38;2;248;248;242m \x1B[0m\x1B[38;2;230;219;116mbar\x1B[0m";
        assert_eq!(hard_wrap(input, 7), input);
    }

    #[test]
    fn style_reopened_after_each_break() {
        let input = "\x1B[38;2;249;38;114m(\x1B[0m\x1B[38;2;248;248;242mjust another test\x1B[38;2;249;38;114m)\x1B[0m";
        let a = "\x1B[38;2;249;38;114m";
        let b = "\x1B[38;2;248;248;242m";
        let r = "\x1B[0m";
        let expected = format!(
            "{a}({r}{b}ju{r}\n{b}st {r}\n{b}ano{r}\n{b}the{r}\n{b}r t{r}\n{b}est{a}{r}\n{a}){r}"
        );
        assert_eq!(hard_wrap(input, 3), expected);
    }

    #[test]
    fn style_not_reopened_without_continuity() {
        let input = "\x1B[38;2;249;38;114m(\x1B[0m\x1B[38;2;248;248;242mjust another test\x1B[38;2;249;38;114m)\x1B[0m";
        let opts = WrapOptions::new(3).style_continuity(false);
        assert_eq!(
            wrap_hard(input, opts),
            "\x1B[38;2;249;38;114m(\x1B[0m\x1B[38;2;248;248;242mju\nst \nano\nthe\nr t\nest\x1B[38;2;249;38;114m\n)\x1B[0m"
        );
    }

    #[test]
    fn dangling_sequence_gets_reset_at_close() {
        assert_eq!(hard_wrap("ab\x1b[3", 4), "ab\x1b[3\x1b[0m");
    }

    #[test]
    fn chunked_writes_match_one_shot() {
        let input = "\x1b[1mhello 世界 wide\x1b[0m text";
        let expected = hard_wrap(input, 5);
        let mut w = HardWrap::buffered(5);
        for chunk in input.as_bytes().chunks(3) {
            w.write_all(chunk).unwrap();
        }
        w.close().unwrap();
        assert_eq!(w.as_bytes(), expected.as_bytes());
    }

    // ── Line helpers ───────────────────────────────────────────────

    #[test]
    fn wrap_text_word_mode() {
        let lines = wrap_text("Hello world foo bar", 10, WrapMode::Word);
        assert_eq!(lines, vec!["Hello", "world foo", "bar"]);
    }

    #[test]
    fn wrap_text_char_mode() {
        let lines = wrap_text("Supercalifragilistic", 10, WrapMode::Char);
        assert_eq!(lines, vec!["Supercalif", "ragilistic"]);
    }

    #[test]
    fn wrap_text_none_mode() {
        let lines = wrap_text("a long line\nnext", 3, WrapMode::None);
        assert_eq!(lines, vec!["a long line", "next"]);
    }

    #[test]
    fn wrap_text_empty_string() {
        assert_eq!(wrap_text("", 10, WrapMode::Word), vec![""]);
    }

    #[test]
    fn wrap_text_styled_lines_render_alone() {
        let lines = wrap_text("\x1b[1mfoo bar\x1b[0m", 4, WrapMode::Word);
        assert_eq!(lines, vec!["\x1b[1mfoo\x1b[0m", "\x1b[1mbar\x1b[0m"]);
    }
}
