//! Outbound message queue for one virtual circuit.
//!
//! [`SendQueue`] owns an ordered chain of [`ComBuf`]s. Callers frame a request
//! between [`begin_msg`](SendQueue::begin_msg) and
//! [`commit_msg`](SendQueue::commit_msg); anything written after the last
//! `begin_msg` that was never committed is discarded by the next
//! `begin_msg` or [`pop_next_com_buf_to_send`](SendQueue::pop_next_com_buf_to_send),
//! so the transport never sees a torn request.
//!
//! The queue has no internal locking. One writer and one drainer must be
//! serialized by the owner, usually by keeping both on the same connection
//! task.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{
    buffer::{BufferPool, COMBUF_CAPACITY, ComBuf},
    dbr::{self, ElementKind, Payload},
    header::{FieldSink, HEADER_LEN, MAX_TCP, RequestHeader, align_payload},
    wire::WireEncode,
};

pub mod errors;

pub use errors::SendError;

/// Pending bytes beyond which a flush should be scheduled soon.
pub const FLUSH_EARLY_BYTES: usize = 4 * COMBUF_CAPACITY;
/// Pending bytes beyond which the writer should flush before queueing more.
pub const FLUSH_BLOCK_BYTES: usize = 16 * COMBUF_CAPACITY;

#[expect(
    clippy::cast_possible_truncation,
    reason = "protocol limits are far below u32::MAX"
)]
pub(crate) const STANDARD_PAYLOAD_LIMIT: u32 = (MAX_TCP - HEADER_LEN) as u32;

// Array requests keep room for one double beyond the element data.
const ARRAY_HEADROOM: u32 = 8;

const NILL_BYTES: [u8; 8] = [0; 8];

/// Whether a message is being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    /// No uncommitted bytes exist.
    Idle,
    /// Bytes written since the last `begin_msg` can still be rolled back.
    MessageOpen,
}

/// Position where the open message began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker {
    buf: usize,
    offset: usize,
}

/// Request whose payload is serialized through the type dispatch table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayloadRequest<'a> {
    /// Command code.
    pub command: u16,
    /// Payload element type code.
    pub data_type: u16,
    /// Number of elements to send from `payload`.
    pub count: u32,
    /// Channel identifier.
    pub cid: u32,
    /// Command-dependent parameter.
    pub available: u32,
    /// Element values; must hold at least `count` elements.
    pub payload: Payload<'a>,
}

/// Chain of transmission buffers with commit/rollback bookkeeping.
#[derive(Debug)]
pub struct SendQueue<P: BufferPool> {
    pool: P,
    bufs: VecDeque<ComBuf>,
    pending: usize,
    uncommitted: Option<Marker>,
}

impl<P: BufferPool> SendQueue<P> {
    /// Create an empty queue drawing buffers from `pool`.
    #[must_use]
    pub const fn new(pool: P) -> Self {
        Self {
            pool,
            bufs: VecDeque::new(),
            pending: 0,
            uncommitted: None,
        }
    }

    /// Pool used for buffer allocation.
    ///
    /// Transports return popped buffers here once they are sent.
    #[must_use]
    pub const fn pool(&self) -> &P { &self.pool }

    /// Current state of message assembly.
    #[must_use]
    pub const fn state(&self) -> MessageState {
        if self.uncommitted.is_some() {
            MessageState::MessageOpen
        } else {
            MessageState::Idle
        }
    }

    /// Number of buffers in the chain.
    #[must_use]
    pub fn buffer_count(&self) -> usize { self.bufs.len() }

    /// Buffers in the chain, oldest first, including uncommitted bytes.
    #[must_use]
    pub fn buffers(&self) -> impl Iterator<Item = &ComBuf> { self.bufs.iter() }

    /// Drop every queued byte, committed or not, and return all buffers to
    /// the pool.
    pub fn clear(&mut self) {
        let released = self.bufs.len();
        for buf in self.bufs.drain(..) {
            self.pool.release(buf);
        }
        debug!(released, discarded = self.pending, "cleared send queue");
        self.pending = 0;
        self.uncommitted = None;
    }

    /// Start a new message.
    ///
    /// An uncommitted message is rolled back first. Calling this twice with
    /// nothing written in between has no further effect.
    pub fn begin_msg(&mut self) {
        if self.uncommitted.is_some() {
            self.clear_uncommitted();
        }
        self.uncommitted = Some(self.end_marker());
    }

    /// Make the open message part of the sendable stream.
    pub const fn commit_msg(&mut self) { self.uncommitted = None; }

    /// Bytes queued across all buffers.
    #[must_use]
    pub const fn occupied_bytes(&self) -> usize { self.pending }

    /// Whether queueing `n_bytes_this_msg` more bytes passes the early flush
    /// threshold of four buffers.
    #[must_use]
    pub const fn flush_early_threshold(&self, n_bytes_this_msg: usize) -> bool {
        self.pending.saturating_add(n_bytes_this_msg) > FLUSH_EARLY_BYTES
    }

    /// Whether queueing `n_bytes_this_msg` more bytes passes the blocking
    /// flush threshold of sixteen buffers.
    #[must_use]
    pub const fn flush_block_threshold(&self, n_bytes_this_msg: usize) -> bool {
        self.pending.saturating_add(n_bytes_this_msg) > FLUSH_BLOCK_BYTES
    }

    /// Whether payloads of type `data_type` can be serialized.
    #[must_use]
    pub fn dbr_type_ok(&self, data_type: u16) -> bool { dbr::dbr_type_ok(data_type) }

    /// Append a 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when a new buffer is needed and the pool
    /// cannot supply one.
    pub fn push_u16(&mut self, value: u16) -> Result<(), SendError> { self.push(&value) }

    /// Append a 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when a new buffer is needed and the pool
    /// cannot supply one.
    pub fn push_u32(&mut self, value: u32) -> Result<(), SendError> { self.push(&value) }

    /// Append a 32-bit float.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when a new buffer is needed and the pool
    /// cannot supply one.
    pub fn push_f32(&mut self, value: f32) -> Result<(), SendError> { self.push(&value) }

    /// Append a run of bytes, spilling into new buffers as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Pool`] when a new buffer is needed and the pool
    /// cannot supply one. Bytes written before the failure stay queued until
    /// the open message is rolled back.
    pub fn push_string(&mut self, bytes: &[u8]) -> Result<(), SendError> { self.push_slice(bytes) }

    /// Frame a request header.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::ExtensionRequired`], writing nothing, when the
    /// size or count needs the extended header and `extended_ok` is false.
    /// Returns [`SendError::Pool`] on buffer exhaustion, after removing any
    /// header fields already written.
    pub fn insert_request_header(
        &mut self,
        header: &RequestHeader,
        extended_ok: bool,
    ) -> Result<(), SendError> {
        let framing = header
            .framing(extended_ok)
            .ok_or(SendError::ExtensionRequired {
                payload_size: header.payload_size,
                count: header.count,
            })?;
        self.all_or_nothing(|queue| header.write_fields(framing, queue))
    }

    /// Frame a request and serialize its typed payload.
    ///
    /// The payload is padded with zero bytes to the 8-byte message
    /// alignment. A single `DBR_STRING` element is sent as its text and
    /// terminator only.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::UnsupportedType`] when
    /// [`dbr_type_ok`](Self::dbr_type_ok) is false for the type,
    /// [`SendError::PayloadKindMismatch`] when the payload elements do not
    /// match it, [`SendError::PayloadTooShort`] when fewer than `count`
    /// elements are supplied and [`SendError::PayloadTooLarge`] when the count
    /// exceeds what the framing can carry. None of these write anything.
    /// Returns [`SendError::Pool`] on buffer exhaustion, after removing the
    /// part of the request already written.
    pub fn insert_request_with_payload(
        &mut self,
        request: &PayloadRequest<'_>,
        extended_ok: bool,
    ) -> Result<(), SendError> {
        let expected =
            dbr::copy_kind(request.data_type).ok_or(SendError::UnsupportedType(request.data_type))?;
        let found = request.payload.kind();
        if found != expected {
            return Err(SendError::PayloadKindMismatch {
                data_type: request.data_type,
                expected,
                found,
            });
        }
        let count = usize::try_from(request.count)
            .ok()
            .filter(|&n| n <= request.payload.len())
            .ok_or(SendError::PayloadTooShort {
                needed: request.count,
                available: request.payload.len(),
            })?;

        let size = payload_bytes(expected, &request.payload, request.count, extended_ok)?;
        let payload_size = align_payload(size).ok_or(SendError::PayloadTooLarge {
            count: request.count,
            limit: array_limit(expected, extended_ok),
        })?;
        let header = RequestHeader {
            command: request.command,
            payload_size,
            data_type: request.data_type,
            count: request.count,
            cid: request.cid,
            available: request.available,
        };
        let pad = usize::try_from(payload_size - size).unwrap_or_default();
        self.all_or_nothing(|queue| {
            queue.insert_request_header(&header, extended_ok)?;
            queue.copy_payload(&request.payload, count)?;
            if pad > 0 {
                queue.push_string(NILL_BYTES.get(..pad).unwrap_or(&NILL_BYTES))?;
            }
            Ok(())
        })
    }

    /// Remove the oldest buffer for transmission.
    ///
    /// Any uncommitted message is rolled back first. Returns `None` once the
    /// chain is empty. The caller owns the returned buffer and should release
    /// it to the pool after sending.
    pub fn pop_next_com_buf_to_send(&mut self) -> Option<ComBuf> {
        self.clear_uncommitted();
        let buf = self.bufs.pop_front()?;
        self.pending -= buf.len();
        Some(buf)
    }

    fn end_marker(&self) -> Marker {
        self.bufs.back().map_or(Marker { buf: 0, offset: 0 }, |last| Marker {
            buf: self.bufs.len() - 1,
            offset: last.len(),
        })
    }

    fn clear_uncommitted(&mut self) {
        if let Some(marker) = self.uncommitted.take() {
            self.truncate_to(marker);
        }
    }

    /// Run `write`, dropping whatever it appended if it fails.
    fn all_or_nothing(
        &mut self,
        write: impl FnOnce(&mut Self) -> Result<(), SendError>,
    ) -> Result<(), SendError> {
        let start = self.end_marker();
        let written = write(self);
        if written.is_err() {
            self.truncate_to(start);
        }
        written
    }

    fn truncate_to(&mut self, marker: Marker) {
        let mut discarded = 0usize;
        while self.bufs.len() > marker.buf + 1 {
            if let Some(buf) = self.bufs.pop_back() {
                discarded += buf.len();
                self.pool.release(buf);
            }
        }
        if marker.offset == 0 {
            if let Some(buf) = self.bufs.pop_back() {
                discarded += buf.len();
                self.pool.release(buf);
            }
        } else if let Some(buf) = self.bufs.back_mut() {
            discarded += buf.len() - marker.offset;
            buf.truncate(marker.offset);
        }
        self.pending -= discarded;
        if discarded > 0 {
            trace!(discarded, "rolled back uncommitted message");
        }
    }

    fn fresh_buf(&self) -> Result<ComBuf, SendError> {
        let mut buf = self.pool.acquire()?;
        buf.reset();
        Ok(buf)
    }

    fn link(&mut self, buf: ComBuf) { self.bufs.push_back(buf); }

    fn push<T: WireEncode>(&mut self, value: &T) -> Result<(), SendError> {
        const { assert!(T::WIRE_SIZE <= COMBUF_CAPACITY) };
        if let Some(last) = self.bufs.back_mut() {
            if last.push(value) {
                self.pending += T::WIRE_SIZE;
                return Ok(());
            }
        }
        let mut buf = self.fresh_buf()?;
        let pushed = buf.push(value);
        debug_assert!(pushed, "fresh buffer must hold one element");
        self.link(buf);
        self.pending += T::WIRE_SIZE;
        Ok(())
    }

    fn push_slice<T: WireEncode>(&mut self, values: &[T]) -> Result<(), SendError> {
        const { assert!(T::WIRE_SIZE > 0 && T::WIRE_SIZE <= COMBUF_CAPACITY) };
        let mut copied = self
            .bufs
            .back_mut()
            .map_or(0, |last| last.push_slice(values));
        self.pending += copied * T::WIRE_SIZE;
        while let Some(rest) = values.get(copied..).filter(|tail| !tail.is_empty()) {
            let mut buf = self.fresh_buf()?;
            let written = buf.push_slice(rest);
            self.link(buf);
            self.pending += written * T::WIRE_SIZE;
            copied += written;
        }
        Ok(())
    }

    fn copy_payload(&mut self, payload: &Payload<'_>, count: usize) -> Result<(), SendError> {
        match *payload {
            Payload::String(values) if count == 1 => match values.first() {
                Some(value) => self.push_string(value.terminated()),
                None => Ok(()),
            },
            Payload::String(values) => self.push_slice(head(values, count)),
            Payload::Short(values) => self.push_slice(head(values, count)),
            Payload::Float(values) => self.push_slice(head(values, count)),
            Payload::Enum(values) => self.push_slice(head(values, count)),
            Payload::Char(values) => self.push_slice(head(values, count)),
            Payload::Long(values) => self.push_slice(head(values, count)),
            Payload::Double(values) => self.push_slice(head(values, count)),
        }
    }
}

impl<P: BufferPool> FieldSink for SendQueue<P> {
    type Error = SendError;

    fn field_u16(&mut self, value: u16) -> Result<(), Self::Error> { self.push_u16(value) }

    fn field_u32(&mut self, value: u32) -> Result<(), Self::Error> { self.push_u32(value) }
}

impl<P: BufferPool> Drop for SendQueue<P> {
    fn drop(&mut self) {
        for buf in self.bufs.drain(..) {
            self.pool.release(buf);
        }
    }
}

fn head<T>(values: &[T], count: usize) -> &[T] { values.get(..count).unwrap_or(values) }

/// Unpadded payload size of `count` elements of `kind`.
fn payload_bytes(
    kind: ElementKind,
    payload: &Payload<'_>,
    count: u32,
    extended_ok: bool,
) -> Result<u32, SendError> {
    let element = kind.wire_size();
    if count == 1 {
        return Ok(match *payload {
            Payload::String(values) => values
                .first()
                .map_or(element, |s| u32::try_from(s.terminated().len()).unwrap_or(element)),
            _ => element,
        });
    }
    let limit = array_limit(kind, extended_ok);
    if count >= limit {
        return Err(SendError::PayloadTooLarge { count, limit });
    }
    Ok(element * count)
}

/// Element count at which an array of `kind` no longer fits the framing.
fn array_limit(kind: ElementKind, extended_ok: bool) -> u32 {
    let element = kind.wire_size();
    let max_bytes = if extended_ok {
        u32::MAX
    } else {
        STANDARD_PAYLOAD_LIMIT
    };
    max_bytes
        .saturating_sub(ARRAY_HEADROOM + element)
        .checked_div(element)
        .unwrap_or_default()
}
