#![forbid(unsafe_code)]

//! ANSI-aware text layout for FrankenTUI.
//!
//! Every transform in this crate treats escape sequences as zero-width,
//! unbreakable control data and measures visible text in terminal cells,
//! per grapheme cluster. Styled and unstyled input wrap and truncate at the
//! same positions.
//!
//! - [`WordWrap`] - soft wrap at whitespace and breakpoints
//! - [`HardWrap`] - wrap at an exact cell width
//! - [`Truncate`] - cut to a cell width with an optional tail
//! - [`Padding`], [`Indent`], [`Margin`], [`dedent`] - whitespace helpers
//! - [`Compressor`] - drops redundant reset/restore pairs
//! - [`printable_width`], [`WidthCache`] - measurement
//!
//! The writers are streaming: feed them arbitrary chunks through
//! [`std::io::Write`], then call `close()`. Escape sequences and grapheme
//! clusters split across chunks are reassembled. When a wrapper introduces
//! a line break inside styled text it closes the open style before the
//! break and reissues it after, so each line renders on its own.
//!
//! # Example
//! ```
//! use ftui_reflow::{hard_wrap, printable_width, truncate, wrap_words};
//!
//! assert_eq!(wrap_words("foo bar foo", 4), "foo\nbar\nfoo");
//! assert_eq!(hard_wrap("foobarfoo", 4), "foob\narfo\no");
//! assert_eq!(truncate("\x1b[7m--", 1), "\x1b[7m-\x1b[0m");
//! assert_eq!(printable_width("\x1b[38;2;249;38;114mfoo"), 3);
//! ```
//!
//! Streaming into any sink:
//! ```
//! use ftui_reflow::WordWrap;
//! use std::io::Write;
//!
//! let mut out = Vec::new();
//! let mut wrapper = WordWrap::new(&mut out, 6);
//! wrapper.write_all(b"\x1b[1mhello ").unwrap();
//! wrapper.write_all(b"world\x1b[0m").unwrap();
//! wrapper.close().unwrap();
//! drop(wrapper);
//! assert_eq!(out, b"\x1b[1mhello\x1b[0m\n\x1b[1mworld\x1b[0m");
//! ```

pub mod cluster;
pub mod compressor;
pub mod dedent;
pub mod indent;
pub mod margin;
mod output;
pub mod padding;
pub mod scanner;
pub mod style;
pub mod token;
pub mod truncate;
pub mod width;
pub mod width_cache;
pub mod wordwrap;
pub mod wrap;

pub use cluster::{Piece, Segmenter};
pub use compressor::{Compressor, compress};
pub use dedent::dedent;
pub use indent::{Indent, indent, indent_with};
pub use margin::{Margin, margin};
pub use padding::{Fill, Padding, pad, pad_with};
pub use scanner::{BEL, ByteClass, ESC, ScanState, Scanner};
pub use style::{RESET, StyleDelta, StyleTracker, is_reset_sequence, is_style_sequence};
pub use token::{Token, Tokenizer};
pub use truncate::{Truncate, truncate, truncate_with_tail};
pub use width::{
    char_width, cluster_width, has_wide_chars, printable_width, printable_width_bytes,
    strip_sequences, text_width,
};
pub use width_cache::{CacheStats, DEFAULT_CACHE_CAPACITY, WidthCache};
#[cfg(feature = "thread_local_cache")]
pub use width_cache::{cached_width, clear_thread_cache};
pub use wordwrap::{WordWrap, wrap_words, wrap_words_with};
pub use wrap::{
    HardWrap, ParseWrapModeError, WrapMode, WrapOptions, hard_wrap, wrap_text, wrap_with_options,
};
