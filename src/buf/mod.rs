//! Append-only byte buffers for small payloads.
//!
//! Two interchangeable buffers share one contract:
//! - [`Buf`] keeps a single heap region and grows it by a fixed slack.
//! - [`InlineBuf`] starts in an inline array and moves to the heap once,
//!   for good, when a write no longer fits.
//!
//! Neither buffer has a read cursor. Content is read back whole through
//! `as_bytes` (borrowed) or `text` (copied).

mod basic;
mod inline;

pub use basic::Buf;
pub use inline::InlineBuf;

use crate::error::Result;

/// Contract shared by [`Buf`] and [`InlineBuf`].
///
/// Both types expose the same operations as inherent methods; the trait lets
/// callers be generic over which buffer they get.
pub trait ByteBuffer {
    /// Append `bytes` after the current content.
    fn write(&mut self, bytes: &[u8]);

    /// Append the UTF-8 bytes of `s`.
    fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    /// Append a single byte.
    fn write_byte(&mut self, byte: u8);

    /// Borrow the buffered content. The view ends at the next mutation.
    fn as_bytes(&self) -> &[u8];

    /// Number of buffered bytes; always `as_bytes().len()`.
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes that fit without another allocation.
    fn capacity(&self) -> usize;

    /// Drop the content but keep the storage for later writes.
    fn reset(&mut self);
}

/// Copy `bytes` into a new `String`, replacing invalid UTF-8 with U+FFFD.
#[inline]
pub(crate) fn lossy_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[inline]
pub(crate) fn strict_str(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}

#[cfg(test)]
pub(crate) mod testdata {
    /// Deterministic non-text payload of `len` bytes.
    pub(crate) fn sample(len: usize, seed: u8) -> Vec<u8> {
        (0..len)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect()
    }

    pub(crate) const LONG_TEXT: &str = "a fairly long line of text. a fairly long line of text. \
        a fairly long line of text. a fairly long line of text. a fairly long line of text. \
        a fairly long line of text. a fairly long line of text.";
}
