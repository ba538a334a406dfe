//! Helpers shared by unit and integration tests.

use crate::{buffer::BufferPool, queue::SendQueue};

#[cfg(test)]
pub(crate) mod tracing;

/// Pop every sendable buffer, concatenating their bytes in transmission order.
///
/// Buffers are released to the queue's pool once copied, as a transport
/// would after a successful send.
pub fn drain_stream<P: BufferPool>(queue: &mut SendQueue<P>) -> Vec<u8> {
    let mut stream = Vec::with_capacity(queue.occupied_bytes());
    while let Some(buf) = queue.pop_next_com_buf_to_send() {
        stream.extend_from_slice(buf.as_bytes());
        queue.pool().release(buf);
    }
    stream
}

/// Lengths of every buffer in the chain, oldest first, without draining it.
#[must_use]
pub fn buffer_lengths<P: BufferPool>(queue: &SendQueue<P>) -> Vec<usize> {
    queue.buffers().map(crate::buffer::ComBuf::len).collect()
}
