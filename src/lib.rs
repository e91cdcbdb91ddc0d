//! Small append-only byte buffers.
//!
//! For building short byte strings or text out of a few pieces (a handful of
//! writes, a few hundred bytes) with as few allocations and copies as
//! possible. Larger or streaming workloads are better served by `Vec<u8>` or
//! `bytes::BytesMut`.
//!
//! ```
//! use std::fmt::Write;
//! use smallbuf::Buf;
//!
//! let mut buf = Buf::new();
//! buf.write_str("user=");
//! write!(buf, "{}", 17).unwrap();
//! buf.write_byte(b';');
//! assert_eq!(buf.text(), "user=17;");
//! ```
//!
//! Buffers are not synchronized; share them across threads only behind a
//! lock.

pub mod buf;
pub mod config;
pub mod error;

pub use buf::{Buf, ByteBuffer, InlineBuf};
pub use config::{GROWTH_SLACK, INLINE_CAPACITY};
pub use error::{Error, Result};
