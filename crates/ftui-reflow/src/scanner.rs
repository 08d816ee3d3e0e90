#![forbid(unsafe_code)]

//! Escape-sequence scanner.
//!
//! A deterministic byte-at-a-time state machine that classifies every input
//! byte as printable text or as part of an escape sequence. The state is
//! carried across calls, so a sequence split over two `write()` chunks is
//! still recognized as one unit.
//!
//! Recognized sequence classes (ECMA-48):
//!
//! - **nF**: `ESC`, intermediates in `0x20..=0x2F`, one final byte in `0x30..=0x7E`
//! - **CSI**: `ESC [`, parameters, final byte in `0x40..=0x7E`
//! - **String**: `ESC P` / `ESC ]` / `ESC X` / `ESC ^` / `ESC _`, terminated
//!   by `BEL` or `ESC \`
//! - **Fp/Fe/Fs**: `ESC` followed by a single final byte in `0x30..=0x7E`
//!
//! Anything else after `ESC` aborts the sequence: the scanner falls back to
//! text and reclassifies the offending byte there, so malformed input never
//! stalls the stream.
//!
//! # Example
//! ```
//! use ftui_reflow::scanner::{ByteClass, Scanner};
//!
//! let mut scanner = Scanner::new();
//! let classes: Vec<ByteClass> = b"\x1b[1mA".iter().map(|&b| scanner.classify(b)).collect();
//! assert_eq!(
//!     classes,
//!     vec![
//!         ByteClass::SequenceStart,
//!         ByteClass::SequenceContinuation,
//!         ByteClass::SequenceContinuation,
//!         ByteClass::SequenceEnd,
//!         ByteClass::Printable,
//!     ]
//! );
//! ```

/// Escape (`0x1B`), the marker that opens every sequence.
pub const ESC: u8 = 0x1b;

/// Bell (`0x07`), one of the two string-sequence terminators.
pub const BEL: u8 = 0x07;

/// Scanner state between two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Ordinary text.
    #[default]
    Text,
    /// `ESC` seen; the next byte selects the sequence class.
    Escape,
    /// nF sequence: collecting intermediates until a final byte.
    Intermediate,
    /// CSI sequence: collecting parameters until a final byte.
    Csi,
    /// DCS/OSC/SOS/PM/APC body.
    StringBody,
    /// `ESC` seen inside a string body; `\` completes ST.
    StringEscape,
}

/// Classification of a single input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// Text byte (possibly part of a multi-byte UTF-8 character).
    Printable,
    /// The `ESC` that opens a sequence.
    SequenceStart,
    /// A byte inside an open sequence.
    SequenceContinuation,
    /// The terminator that closes a sequence.
    SequenceEnd,
}

impl ByteClass {
    /// Whether the byte belongs to an escape sequence.
    #[inline]
    #[must_use]
    pub const fn is_sequence(self) -> bool {
        !matches!(self, Self::Printable)
    }
}

/// Incremental escape-sequence scanner.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    state: ScanState,
}

impl Scanner {
    /// Create a scanner in the text state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ScanState::Text,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Whether a sequence is currently open.
    #[inline]
    #[must_use]
    pub fn in_sequence(&self) -> bool {
        self.state != ScanState::Text
    }

    /// Drop any open sequence and return to the text state.
    pub fn reset(&mut self) {
        self.state = ScanState::Text;
    }

    /// Classify one byte and advance the state machine.
    pub fn classify(&mut self, b: u8) -> ByteClass {
        match self.state {
            ScanState::Text => self.classify_text(b),
            ScanState::Escape => self.classify_escape(b),
            ScanState::Intermediate => self.classify_intermediate(b),
            ScanState::Csi => self.classify_csi(b),
            ScanState::StringBody => self.classify_string(b),
            ScanState::StringEscape => self.classify_string_escape(b),
        }
    }

    fn classify_text(&mut self, b: u8) -> ByteClass {
        if b == ESC {
            self.state = ScanState::Escape;
            ByteClass::SequenceStart
        } else {
            ByteClass::Printable
        }
    }

    fn classify_escape(&mut self, b: u8) -> ByteClass {
        match b {
            0x20..=0x2F => {
                self.state = ScanState::Intermediate;
                ByteClass::SequenceContinuation
            }
            b'[' => {
                self.state = ScanState::Csi;
                ByteClass::SequenceContinuation
            }
            // DCS, OSC, SOS, PM, APC
            b'P' | b']' | b'X' | b'^' | b'_' => {
                self.state = ScanState::StringBody;
                ByteClass::SequenceContinuation
            }
            // Fp, Fe and Fs: the byte after ESC is the terminator.
            0x30..=0x7E => {
                self.state = ScanState::Text;
                ByteClass::SequenceEnd
            }
            _ => self.abort(b),
        }
    }

    fn classify_intermediate(&mut self, b: u8) -> ByteClass {
        match b {
            0x20..=0x2F => ByteClass::SequenceContinuation,
            0x30..=0x7E => {
                self.state = ScanState::Text;
                ByteClass::SequenceEnd
            }
            _ => self.abort(b),
        }
    }

    fn classify_csi(&mut self, b: u8) -> ByteClass {
        match b {
            0x40..=0x7E => {
                self.state = ScanState::Text;
                ByteClass::SequenceEnd
            }
            ESC => self.abort(b),
            _ => ByteClass::SequenceContinuation,
        }
    }

    fn classify_string(&mut self, b: u8) -> ByteClass {
        match b {
            BEL => {
                self.state = ScanState::Text;
                ByteClass::SequenceEnd
            }
            ESC => {
                self.state = ScanState::StringEscape;
                ByteClass::SequenceContinuation
            }
            _ => ByteClass::SequenceContinuation,
        }
    }

    fn classify_string_escape(&mut self, b: u8) -> ByteClass {
        match b {
            b'\\' | BEL => {
                self.state = ScanState::Text;
                ByteClass::SequenceEnd
            }
            ESC => ByteClass::SequenceContinuation,
            // Not ST after all; keep reading the string body.
            _ => {
                self.state = ScanState::StringBody;
                ByteClass::SequenceContinuation
            }
        }
    }

    /// Give up on the open sequence and reclassify `b` as text.
    fn abort(&mut self, b: u8) -> ByteClass {
        tracing::trace!(state = ?self.state, byte = b, "escape sequence aborted");
        self.state = ScanState::Text;
        self.classify_text(b)
    }
}
