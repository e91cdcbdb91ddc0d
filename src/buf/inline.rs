//! Append buffer that starts in an inline array and spills to the heap once.

use std::fmt;
use std::ops::Deref;

use bytes::Bytes;
use tracing::trace;

use crate::buf::{lossy_text, strict_str, ByteBuffer};
use crate::config::{grown_capacity, INLINE_CAPACITY};
use crate::error::Result;

/// Active storage region.
///
/// The only transition is `Inline -> External`. Once content has moved to the
/// heap it stays there, including after a reset, so the larger allocation is
/// reused instead of being thrown away for the inline array.
#[derive(Clone)]
enum Storage<const N: usize> {
    Inline { data: [u8; N], len: usize },
    External(Vec<u8>),
}

/// A growable byte buffer with `N` bytes of inline storage.
///
/// Content up to `N` bytes lives inside the value itself, so short-lived
/// buffers never touch the allocator. The first write that does not fit moves
/// the content to a heap region sized like [`Buf`](crate::Buf) does (required
/// size plus [`GROWTH_SLACK`](crate::GROWTH_SLACK)). From then on the heap
/// region is used for the rest of the buffer's life.
///
/// ```
/// use smallbuf::InlineBuf;
///
/// let mut buf: InlineBuf = InlineBuf::new();
/// buf.write_str("id=");
/// buf.write_int(42);
/// assert!(buf.is_inline());
/// assert_eq!(buf.as_bytes(), b"id=42");
/// ```
#[derive(Clone)]
pub struct InlineBuf<const N: usize = INLINE_CAPACITY> {
    storage: Storage<N>,
}

impl<const N: usize> InlineBuf<N> {
    /// Create an empty buffer using the inline region. Does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Self {
            storage: Storage::Inline {
                data: [0; N],
                len: 0,
            },
        }
    }

    /// Append `bytes` to the buffer.
    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        let at = self.grow(bytes.len());
        match &mut self.storage {
            Storage::Inline { data, len } => {
                let end = at + bytes.len();
                data[at..end].copy_from_slice(bytes);
                *len = end;
            }
            Storage::External(buf) => buf.extend_from_slice(bytes),
        }
    }

    /// Append the bytes of `s` to the buffer.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    /// Append a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        let at = self.grow(1);
        match &mut self.storage {
            Storage::Inline { data, len } => {
                data[at] = byte;
                *len = at + 1;
            }
            Storage::External(buf) => buf.push(byte),
        }
    }

    /// Append the decimal representation of an integer.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, value: I) {
        let mut itoa_buf = itoa::Buffer::new();
        self.write(itoa_buf.format(value).as_bytes());
    }

    /// Borrow the buffered bytes.
    ///
    /// The slice points into the active region, so it cannot outlive the next
    /// write or reset.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Inline { data, len } => &data[..*len],
            Storage::External(buf) => buf.as_slice(),
        }
    }

    /// Copy the buffered bytes into a new `String`, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        lossy_text(self.as_bytes())
    }

    /// Copy the buffered bytes into a new `String`, failing on invalid UTF-8.
    pub fn try_text(&self) -> Result<String> {
        strict_str(self.as_bytes()).map(str::to_owned)
    }

    /// Borrow the buffered bytes as `&str`, failing on invalid UTF-8.
    pub fn try_as_str(&self) -> Result<&str> {
        strict_str(self.as_bytes())
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Inline { len, .. } => *len,
            Storage::External(buf) => buf.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the active region: `N` while inline, the heap allocation
    /// size afterwards.
    #[inline]
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Inline { .. } => N,
            Storage::External(buf) => buf.capacity(),
        }
    }

    /// Whether content still lives in the inline region.
    ///
    /// Becomes `false` on the first write that exceeds `N` bytes and never
    /// returns to `true`.
    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline { .. })
    }

    /// Empty the buffer, keeping whichever region is active.
    #[inline]
    pub fn reset(&mut self) {
        match &mut self.storage {
            Storage::Inline { len, .. } => *len = 0,
            Storage::External(buf) => buf.clear(),
        }
    }

    /// Convert into [`Bytes`]. Copies only while inline.
    pub fn into_bytes(self) -> Bytes {
        match self.storage {
            Storage::Inline { data, len } => Bytes::copy_from_slice(&data[..len]),
            Storage::External(buf) => Bytes::from(buf),
        }
    }

    /// Convert into a `Vec<u8>`. Copies only while inline.
    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            Storage::Inline { data, len } => data[..len].to_vec(),
            Storage::External(buf) => buf,
        }
    }

    /// Make sure `n` more bytes fit in the active region and return the offset
    /// to write them at.
    #[inline]
    fn grow(&mut self, n: usize) -> usize {
        let at = self.len();
        let needed = at + n;
        if needed > self.capacity() {
            self.spill(needed);
        }
        at
    }

    /// Move to a heap region of `needed + GROWTH_SLACK` bytes, or reallocate
    /// the heap region if already there.
    #[cold]
    fn spill(&mut self, needed: usize) {
        let external = match &mut self.storage {
            Storage::Inline { data, len } => {
                let mut external = Vec::with_capacity(grown_capacity(needed));
                external.extend_from_slice(&data[..*len]);
                external
            }
            Storage::External(buf) => {
                let old_capacity = buf.capacity();
                let len = buf.len();
                buf.reserve_exact(grown_capacity(needed) - len);
                trace!(
                    len,
                    needed,
                    old_capacity,
                    new_capacity = buf.capacity(),
                    "buffer reallocated"
                );
                return;
            }
        };

        trace!(
            inline_capacity = N,
            needed,
            new_capacity = external.capacity(),
            "inline buffer moved to heap"
        );
        self.storage = Storage::External(external);
    }
}

impl<const N: usize> Default for InlineBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteBuffer for InlineBuf<N> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        InlineBuf::write(self, bytes);
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) {
        InlineBuf::write_byte(self, byte);
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        InlineBuf::as_bytes(self)
    }

    #[inline]
    fn len(&self) -> usize {
        InlineBuf::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        InlineBuf::capacity(self)
    }

    #[inline]
    fn reset(&mut self) {
        InlineBuf::reset(self);
    }
}

impl<const N: usize> fmt::Write for InlineBuf<N> {
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

impl<const N: usize> Deref for InlineBuf<N> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> AsRef<[u8]> for InlineBuf<N> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

// Equality is by content; the active region does not matter.
impl<const N: usize> PartialEq for InlineBuf<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for InlineBuf<N> {}

impl<const N: usize> From<InlineBuf<N>> for Bytes {
    fn from(buf: InlineBuf<N>) -> Self {
        buf.into_bytes()
    }
}

impl<const N: usize> From<InlineBuf<N>> for Vec<u8> {
    fn from(buf: InlineBuf<N>) -> Self {
        buf.into_vec()
    }
}

impl<const N: usize> fmt::Debug for InlineBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let region = if self.is_inline() { "inline" } else { "heap" };
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => write!(f, "InlineBuf<{}>({}, {:?})", N, region, s),
            Err(_) => write!(f, "InlineBuf<{}>({}, {:?})", N, region, self.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buf::testdata::{sample, LONG_TEXT};
    use crate::GROWTH_SLACK;
    use std::fmt::Write as _;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn test_write_bytes() {
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&[b'a', b'b', b'c']);
        assert_eq!(buf.text(), "abc");
        assert!(buf.is_inline());
    }

    #[test]
    fn test_write_bytes_then_str() {
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(b"hello world");
        buf.write_str("--some more...");
        assert_eq!(buf.text(), "hello world--some more...");
        assert!(buf.is_inline());
    }

    #[test]
    fn test_new_is_inline_and_empty() {
        let buf: InlineBuf = InlineBuf::new();
        assert!(buf.is_inline());
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), INLINE_CAPACITY);
    }

    #[test]
    fn test_exact_inline_fill_stays_inline() {
        let data = sample(INLINE_CAPACITY, 5);
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&data[..10]);
        buf.write(&data[10..]);

        assert!(buf.is_inline());
        assert_eq!(buf.as_bytes(), &data[..]);
    }

    #[test]
    fn test_overflow_moves_to_heap() {
        init_tracing();
        let data = sample(INLINE_CAPACITY, 5);
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&data);
        buf.write_byte(b'!');

        assert!(!buf.is_inline());
        assert!(buf.capacity() >= INLINE_CAPACITY + 1 + GROWTH_SLACK);
        assert_eq!(&buf.as_bytes()[..INLINE_CAPACITY], &data[..]);
        assert_eq!(buf.as_bytes()[INLINE_CAPACITY], b'!');
    }

    #[test]
    fn test_large_first_write_goes_to_heap() {
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write_str(LONG_TEXT);
        assert!(!buf.is_inline());
        assert_eq!(buf.text(), LONG_TEXT);
    }

    #[test]
    fn test_heap_is_sticky_after_reset() {
        init_tracing();
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&sample(100, 2));
        assert!(!buf.is_inline());
        let capacity = buf.capacity();
        let ptr = buf.as_bytes().as_ptr();

        buf.reset();
        assert!(buf.is_empty());
        assert!(!buf.is_inline());

        // Would fit inline, but the heap region is kept.
        buf.write_str("tiny");
        assert!(!buf.is_inline());
        assert_eq!(buf.as_bytes().as_ptr(), ptr);
        assert_eq!(buf.capacity(), capacity);

        // Repeating the pattern that forced the move needs no new allocation.
        buf.reset();
        buf.write(&sample(100, 2));
        assert_eq!(buf.as_bytes().as_ptr(), ptr);
        assert_eq!(buf.capacity(), capacity);
        assert_eq!(buf.as_bytes(), &sample(100, 2)[..]);
    }

    #[test]
    fn test_reset_while_inline_stays_inline() {
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write_str("hello");
        buf.reset();
        assert!(buf.is_inline());
        assert_eq!(buf.len(), 0);

        buf.write_str("world");
        assert_eq!(buf.text(), "world");
    }

    #[test]
    fn test_heap_region_regrows_with_slack() {
        let first = sample(100, 1);
        let second = sample(300, 2);

        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&first);
        let capacity = buf.capacity();
        buf.write(&second);

        assert!(buf.capacity() > capacity);
        assert!(buf.capacity() >= 400 + GROWTH_SLACK);
        assert_eq!(&buf.as_bytes()[..100], &first[..]);
        assert_eq!(&buf.as_bytes()[100..], &second[..]);
    }

    #[test]
    fn test_growth_preserves_content() {
        let head = sample(25, 7);
        let more = sample(180, 3);

        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&head);
        buf.write(&more);
        buf.write_str("hello world");
        buf.write(&more);
        buf.write_str("and some more string data here");

        let mut want = head.clone();
        want.extend_from_slice(&more);
        want.extend_from_slice(b"hello world");
        want.extend_from_slice(&more);
        want.extend_from_slice(b"and some more string data here");

        assert_eq!(buf.as_bytes(), &want[..]);
    }

    #[test]
    fn test_len_and_reset() {
        let data = sample(25, 1);
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&data);
        let before = buf.len();
        buf.reset();
        assert_eq!(before, data.len());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn test_custom_inline_size() {
        let mut buf = InlineBuf::<8>::new();
        buf.write_str("12345678");
        assert!(buf.is_inline());
        assert_eq!(buf.capacity(), 8);

        buf.write_byte(b'9');
        assert!(!buf.is_inline());
        assert_eq!(buf.text(), "123456789");
    }

    #[test]
    fn test_zero_inline_size() {
        let mut buf = InlineBuf::<0>::new();
        buf.write(&[]);
        assert!(buf.is_inline());

        buf.write_byte(1);
        assert!(!buf.is_inline());
        assert_eq!(buf.as_bytes(), &[1u8]);
    }

    #[test]
    fn test_fmt_write_and_int() {
        let mut buf: InlineBuf = InlineBuf::new();
        write!(buf, "{}:", "n").unwrap();
        buf.write_int(-7i32);
        buf.write_char('ß').unwrap();
        assert_eq!(buf.try_text().unwrap(), "n:-7ß");
    }

    #[test]
    fn test_text_with_invalid_utf8() {
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write(&[0xf0, 0x28]);
        assert!(buf.try_as_str().is_err());
        assert_eq!(buf.text(), "\u{fffd}(");
    }

    #[test]
    fn test_into_bytes_from_both_regions() {
        let mut small: InlineBuf = InlineBuf::new();
        small.write_str("small");
        assert_eq!(&small.into_bytes()[..], b"small");

        let mut large: InlineBuf = InlineBuf::new();
        large.write_str(LONG_TEXT);
        assert_eq!(&large.clone().into_bytes()[..], LONG_TEXT.as_bytes());
        assert_eq!(Vec::from(large), LONG_TEXT.as_bytes().to_vec());
    }

    #[test]
    fn test_eq_ignores_region() {
        let mut inline: InlineBuf = InlineBuf::new();
        inline.write_str("abc");

        let mut heap: InlineBuf = InlineBuf::new();
        heap.write_str(LONG_TEXT);
        heap.reset();
        heap.write_str("abc");

        assert!(inline.is_inline());
        assert!(!heap.is_inline());
        assert_eq!(inline, heap);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut buf: InlineBuf = InlineBuf::new();
        buf.write_str("one");
        let copy = buf.clone();
        buf.write_str("two");

        assert_eq!(copy.text(), "one");
        assert_eq!(buf.text(), "onetwo");
    }

    #[test]
    fn test_debug_format() {
        let mut buf = InlineBuf::<16>::new();
        buf.write_str("hi");
        assert_eq!(format!("{:?}", buf), "InlineBuf<16>(inline, \"hi\")");
    }
}
