//! Sizing constants shared by the buffers.
//!
//! Both buffers are plain value types, so there is no runtime configuration.
//! The numbers here are tuned for a few writes totalling well under a few
//! hundred bytes.

/// Extra capacity added on top of the required size whenever a buffer has to
/// reallocate.
///
/// A fixed slack instead of a growth factor: callers are expected to do one or
/// two more small writes after a reallocation, not hundreds.
pub const GROWTH_SLACK: usize = 64;

/// Default size of the inline region of [`InlineBuf`](crate::InlineBuf).
pub const INLINE_CAPACITY: usize = 64;

/// Capacity to allocate when `needed` bytes no longer fit.
///
/// Saturates instead of wrapping; a saturated request is rejected by the
/// allocator as a capacity overflow.
#[inline]
pub const fn grown_capacity(needed: usize) -> usize {
    needed.saturating_add(GROWTH_SLACK)
}
