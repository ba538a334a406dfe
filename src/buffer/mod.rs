//! Fixed-capacity transmission buffers and the pool that supplies them.
//!
//! A [`ComBuf`] is the unit the send queue allocates and the unit a transport
//! writes to the socket. Appends are all-or-nothing per element so a value is
//! never split across two buffers.

use bytes::BytesMut;

use crate::wire::WireEncode;

pub mod pool;

pub use pool::{BufferPool, FreeListPool, PoolError};

/// Capacity of every transmission buffer in bytes.
///
/// Matches the protocol's largest TCP frame, so a request without the
/// extended header always fits in a single buffer's worth of bytes.
pub const COMBUF_CAPACITY: usize = 0x4000;

/// Append-only byte container of [`COMBUF_CAPACITY`] bytes.
#[derive(Debug)]
pub struct ComBuf {
    bytes: BytesMut,
}

impl Default for ComBuf {
    fn default() -> Self { Self::new() }
}

impl ComBuf {
    /// Allocate an empty buffer.
    ///
    /// Outside of tests, buffers should come from a [`BufferPool`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: BytesMut::with_capacity(COMBUF_CAPACITY),
        }
    }

    /// Fixed capacity shared by all buffers.
    #[must_use]
    pub const fn capacity() -> usize { COMBUF_CAPACITY }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Bytes still available before the buffer is full.
    #[must_use]
    pub fn remaining(&self) -> usize { COMBUF_CAPACITY.saturating_sub(self.bytes.len()) }

    /// Written bytes, ready for transmission.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    /// Append one element.
    ///
    /// Returns `false`, leaving the buffer untouched, when the element does
    /// not fit in the remaining space.
    pub fn push<T: WireEncode>(&mut self, value: &T) -> bool {
        if T::WIRE_SIZE > self.remaining() {
            return false;
        }
        value.put_wire(&mut self.bytes);
        true
    }

    /// Append as many whole elements of `values` as fit.
    ///
    /// Returns the number of elements written, between zero and
    /// `values.len()`.
    pub fn push_slice<T: WireEncode>(&mut self, values: &[T]) -> usize {
        let fit = self
            .remaining()
            .checked_div(T::WIRE_SIZE)
            .unwrap_or(values.len())
            .min(values.len());
        for value in values.iter().take(fit) {
            value.put_wire(&mut self.bytes);
        }
        fit
    }

    /// Cut the buffer back to `len` bytes. Used only by message rollback.
    pub(crate) fn truncate(&mut self, len: usize) { self.bytes.truncate(len); }

    /// Forget all written bytes so the buffer can be handed out again.
    pub(crate) fn reset(&mut self) { self.bytes.clear(); }
}
