#![forbid(unsafe_code)]

//! Queued output shared by every layout writer.
//!
//! Engines append to an in-memory queue, which is infallible, and the queue
//! is forwarded to the sink afterwards. A sink failure never loses output:
//! whatever the sink did not accept stays queued and is retried by the next
//! call.
//!
//! Error reporting follows `std::io::BufWriter`: a failure while forwarding
//! the output of an accepted chunk is parked and handed back verbatim by the
//! next `write`, `flush` or `close`, before any new input is consumed.

use std::io::{self, Write};

use crate::style::{RESET, StyleTracker};

/// Output queue, open style and sink for one writer.
#[derive(Debug)]
pub(crate) struct Output<W> {
    inner: W,
    queue: Vec<u8>,
    style: StyleTracker,
    bytes_written: u64,
    deferred: Option<io::Error>,
}

impl<W> Output<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            queue: Vec::new(),
            style: StyleTracker::new(),
            bytes_written: 0,
            deferred: None,
        }
    }

    // ── Queueing ───────────────────────────────────────────────────

    #[inline]
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.queue.extend_from_slice(bytes);
    }

    #[inline]
    pub(crate) fn push_str(&mut self, text: &str) {
        self.queue.extend_from_slice(text.as_bytes());
    }

    /// Queue an escape sequence; complete ones update the open style.
    pub(crate) fn push_sequence(&mut self, seq: &[u8], terminated: bool) {
        self.queue.extend_from_slice(seq);
        if terminated {
            self.style.observe(seq);
        }
    }

    /// Queue `term`, closing and reopening the open style around it.
    pub(crate) fn line_break(&mut self, term: &[u8], continuity: bool) {
        if continuity {
            self.style.write_reset(&mut self.queue);
        }
        self.queue.extend_from_slice(term);
        if continuity {
            self.style.write_restore(&mut self.queue);
        }
    }

    /// Queue a reset if a style is open.
    pub(crate) fn reset_style(&mut self) -> bool {
        self.style.write_reset(&mut self.queue)
    }

    pub(crate) fn restore_style(&mut self) {
        self.style.write_restore(&mut self.queue);
    }

    /// Queue an unconditional reset.
    pub(crate) fn push_reset(&mut self) {
        self.queue.extend_from_slice(RESET);
    }

    #[inline]
    pub(crate) fn style_mut(&mut self) -> &mut StyleTracker {
        &mut self.style
    }

    // ── Sink access ────────────────────────────────────────────────

    /// Bytes accepted by the sink so far.
    #[inline]
    pub(crate) fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Bytes produced but not yet accepted by the sink.
    #[cfg(test)]
    pub(crate) fn queued(&self) -> &[u8] {
        &self.queue
    }

    #[inline]
    pub(crate) fn get_ref(&self) -> &W {
        &self.inner
    }

    #[inline]
    pub(crate) fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    #[inline]
    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Output<W> {
    /// Forward the queue to the sink, keeping whatever it did not accept.
    pub(crate) fn forward(&mut self) -> io::Result<()> {
        let mut written = 0;
        let result = loop {
            if written == self.queue.len() {
                break Ok(());
            }
            match self.inner.write(&self.queue[written..]) {
                Ok(0) => {
                    break Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write queued output",
                    ));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => break Err(e),
            }
        };
        self.queue.drain(..written);
        self.bytes_written += written as u64;
        result
    }

    /// Settle state left by the previous call: a parked error first, then
    /// any queued output.
    pub(crate) fn check(&mut self) -> io::Result<()> {
        if let Some(err) = self.deferred.take() {
            return Err(err);
        }
        self.forward()
    }

    /// Forward after a chunk was consumed, parking any failure.
    pub(crate) fn accept(&mut self, len: usize) -> io::Result<usize> {
        if let Err(err) = self.forward() {
            tracing::debug!(
                error = %err,
                queued = self.queue.len(),
                "sink rejected output; deferring error"
            );
            self.deferred = Some(err);
        }
        Ok(len)
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.check()?;
        self.inner.flush()
    }
}

impl Output<Vec<u8>> {
    /// Everything produced so far, sink contents first.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Consume the output, joining the sink and whatever is still queued.
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        let mut bytes = self.inner;
        bytes.extend_from_slice(&self.queue);
        bytes
    }
}

/// Convert produced bytes to a `String`, replacing invalid sequences.
pub(crate) fn into_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}
