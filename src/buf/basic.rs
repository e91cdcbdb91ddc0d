//! Heap-backed append buffer with fixed-slack growth.

use std::fmt;
use std::ops::Deref;

use bytes::Bytes;
use tracing::trace;

use crate::buf::{lossy_text, strict_str, ByteBuffer};
use crate::config::grown_capacity;
use crate::error::Result;

/// A growable byte buffer for a few short writes.
///
/// Works best for content under ~300 bytes or for no more than a handful of
/// writes. When a write does not fit, the storage is reallocated to exactly the
/// required size plus [`GROWTH_SLACK`](crate::GROWTH_SLACK) bytes instead of
/// doubling. [`reset`](Buf::reset) keeps the allocation for reuse.
///
/// No read cursor and no partial drain: content is read back whole.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Buf {
    buf: Vec<u8>,
}

impl Buf {
    /// Create an empty buffer. Does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create an empty buffer that can hold `capacity` bytes before the first
    /// reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append `bytes` to the buffer.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        self.grow(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Append the bytes of `s` to the buffer.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    /// Append a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.grow(1);
        self.buf.push(byte);
    }

    /// Append the decimal representation of an integer.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, value: I) {
        let mut itoa_buf = itoa::Buffer::new();
        self.write(itoa_buf.format(value).as_bytes());
    }

    /// Borrow the buffered bytes.
    ///
    /// The slice points into the buffer's own storage, so it cannot outlive
    /// the next write or reset.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Copy the buffered bytes into a new `String`.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD; see [`try_text`](Buf::try_text)
    /// for a strict variant.
    pub fn text(&self) -> String {
        lossy_text(&self.buf)
    }

    /// Copy the buffered bytes into a new `String`, failing on invalid UTF-8.
    pub fn try_text(&self) -> Result<String> {
        strict_str(&self.buf).map(str::to_owned)
    }

    /// Borrow the buffered bytes as `&str`, failing on invalid UTF-8.
    pub fn try_as_str(&self) -> Result<&str> {
        strict_str(&self.buf)
    }

    /// Number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes the current allocation can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Empty the buffer, keeping the allocation for future writes.
    #[inline]
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Convert into [`Bytes`] without copying.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }

    /// Convert into the underlying `Vec<u8>` without copying.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Make sure `n` more bytes fit, reallocating with fixed slack if not.
    ///
    /// The caller appends right after, at offset `len()`. Since capacity is
    /// already sufficient, `Vec` never applies its own growth factor.
    #[inline]
    fn grow(&mut self, n: usize) {
        let needed = self.buf.len() + n;
        if needed <= self.buf.capacity() {
            return;
        }
        self.realloc(needed);
    }

    #[cold]
    fn realloc(&mut self, needed: usize) {
        let old_capacity = self.buf.capacity();
        let len = self.buf.len();
        self.buf.reserve_exact(grown_capacity(needed) - len);
        trace!(
            len,
            needed,
            old_capacity,
            new_capacity = self.buf.capacity(),
            "buffer reallocated"
        );
    }
}

impl ByteBuffer for Buf {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        Buf::write(self, bytes);
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) {
        Buf::write_byte(self, byte);
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        Buf::as_bytes(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        Buf::capacity(self)
    }

    #[inline]
    fn reset(&mut self) {
        Buf::reset(self);
    }
}

impl fmt::Write for Buf {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes());
        Ok(())
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        self.write(c.encode_utf8(&mut [0; 4]).as_bytes());
        Ok(())
    }
}

impl Deref for Buf {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl AsRef<[u8]> for Buf {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<Buf> for Bytes {
    fn from(buf: Buf) -> Self {
        buf.into_bytes()
    }
}

impl From<Buf> for Vec<u8> {
    fn from(buf: Buf) -> Self {
        buf.buf
    }
}

impl fmt::Debug for Buf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.buf) {
            Ok(s) => write!(f, "Buf({:?})", s),
            Err(_) => write!(f, "Buf({:?})", self.buf),
        }
    }
}
