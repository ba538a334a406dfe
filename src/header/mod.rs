//! Request header layout and the large-payload framing rule.
//!
//! Every request starts with a fixed 16-byte header:
//!
//! ```text
//! command u16 | payload_size u16 | data_type u16 | count u16 | cid u32 | available u32
//! ```
//!
//! A payload size or element count that does not fit below the `0xFFFF`
//! sentinel is carried in an 8-byte extension (`payload_size u32 | count u32`)
//! placed right after the header, with both 16-bit fields set to the
//! sentinel. Peers older than minor revision 9 cannot parse the extension,
//! so the caller states whether it may be used.

use std::convert::Infallible;

/// Length of the standard request header in bytes.
pub const HEADER_LEN: usize = 16;
/// Length of the extension that follows a sentinel header.
pub const EXTENSION_LEN: usize = 8;
/// Value of the 16-bit size and count fields when the extension follows.
pub const SIZE_SENTINEL: u16 = 0xFFFF;
/// Largest message accepted by peers that cannot parse the extension.
pub const MAX_TCP: usize = 1024 * 16;
/// Payloads are padded to a multiple of this many bytes.
pub const MESSAGE_ALIGN: u32 = 8;

/// How a header is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Literal 16-bit size and count fields.
    Standard,
    /// Sentinel fields followed by a 32-bit size and count extension.
    Extended,
}

impl Framing {
    /// Total encoded length of a header framed this way.
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        match self {
            Self::Standard => HEADER_LEN,
            Self::Extended => HEADER_LEN + EXTENSION_LEN,
        }
    }
}

/// Destination for header fields, written in wire order.
pub trait FieldSink {
    /// Error raised when a field cannot be stored.
    type Error;

    /// Append a 16-bit field.
    ///
    /// # Errors
    ///
    /// Returns the sink's error when the field cannot be stored.
    fn field_u16(&mut self, value: u16) -> Result<(), Self::Error>;

    /// Append a 32-bit field.
    ///
    /// # Errors
    ///
    /// Returns the sink's error when the field cannot be stored.
    fn field_u32(&mut self, value: u32) -> Result<(), Self::Error>;
}

#[expect(clippy::big_endian_bytes, reason = "network protocol uses big-endian")]
impl FieldSink for Vec<u8> {
    type Error = Infallible;

    fn field_u16(&mut self, value: u16) -> Result<(), Self::Error> {
        self.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }

    fn field_u32(&mut self, value: u32) -> Result<(), Self::Error> {
        self.extend_from_slice(&value.to_be_bytes());
        Ok(())
    }
}

/// Logical contents of a request header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestHeader {
    /// Command code.
    pub command: u16,
    /// Payload size in bytes, padding included.
    pub payload_size: u32,
    /// Payload element type code.
    pub data_type: u16,
    /// Number of payload elements.
    pub count: u32,
    /// Channel identifier (client or server side, depending on the command).
    pub cid: u32,
    /// Command-dependent parameter.
    pub available: u32,
}

impl RequestHeader {
    /// Header for `command` with every other field zeroed.
    #[must_use]
    pub fn new(command: impl Into<u16>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Whether the size or count cannot be carried in the 16-bit fields.
    #[must_use]
    pub const fn needs_extension(&self) -> bool {
        self.payload_size >= SIZE_SENTINEL as u32 || self.count >= SIZE_SENTINEL as u32
    }

    /// Pick the framing for this header.
    ///
    /// Returns `None` when the extension is needed but `extended_ok` is
    /// false; the header cannot be sent to that peer without truncation.
    #[must_use]
    pub const fn framing(&self, extended_ok: bool) -> Option<Framing> {
        if !self.needs_extension() {
            Some(Framing::Standard)
        } else if extended_ok {
            Some(Framing::Extended)
        } else {
            None
        }
    }

    /// Write the header fields to `sink` in wire order.
    ///
    /// With [`Framing::Standard`] the size and count must fit below the
    /// sentinel; larger values are clamped to it rather than wrapped, so use
    /// [`framing`](Self::framing) to choose the layout.
    ///
    /// # Errors
    ///
    /// Propagates the first error reported by `sink`.
    pub fn write_fields<S: FieldSink>(&self, framing: Framing, sink: &mut S) -> Result<(), S::Error> {
        sink.field_u16(self.command)?;
        match framing {
            Framing::Standard => {
                sink.field_u16(short_field(self.payload_size))?;
                sink.field_u16(self.data_type)?;
                sink.field_u16(short_field(self.count))?;
                sink.field_u32(self.cid)?;
                sink.field_u32(self.available)
            }
            Framing::Extended => {
                sink.field_u16(SIZE_SENTINEL)?;
                sink.field_u16(self.data_type)?;
                sink.field_u16(SIZE_SENTINEL)?;
                sink.field_u32(self.cid)?;
                sink.field_u32(self.available)?;
                sink.field_u32(self.payload_size)?;
                sink.field_u32(self.count)
            }
        }
    }

    /// Encode the header into a fresh byte vector.
    #[must_use]
    pub fn to_bytes(&self, framing: Framing) -> Vec<u8> {
        let mut out = Vec::with_capacity(framing.encoded_len());
        let Ok(()) = self.write_fields(framing, &mut out);
        out
    }
}

fn short_field(value: u32) -> u16 { u16::try_from(value).unwrap_or(SIZE_SENTINEL) }

/// Round `size` up to the payload alignment.
///
/// Returns `None` when the padded size does not fit in 32 bits.
#[must_use]
pub const fn align_payload(size: u32) -> Option<u32> {
    match size.checked_add(MESSAGE_ALIGN - 1) {
        Some(padded) => Some(padded & !(MESSAGE_ALIGN - 1)),
        None => None,
    }
}

#[cfg(kani)]
mod kani;
