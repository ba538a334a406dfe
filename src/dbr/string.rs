//! Fixed-width protocol strings.

use std::fmt;

use bytes::BufMut;
use thiserror::Error;

use crate::wire::WireEncode;

/// Size of a `DBR_STRING` element on the wire, terminator included.
pub const MAX_STRING_SIZE: usize = 40;

/// Errors raised when building protocol values.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DbrError {
    /// The text plus its terminator does not fit in [`MAX_STRING_SIZE`].
    #[error("string of {len} bytes exceeds the {max}-byte limit", max = MAX_STRING_SIZE - 1)]
    StringTooLong {
        /// Byte length of the rejected text.
        len: usize,
    },
    /// The text contains a NUL byte before its end.
    #[error("string contains an interior NUL at byte {0}")]
    InteriorNul(usize),
}

/// A NUL-terminated string stored in a fixed 40-byte field.
///
/// The unused tail is zero filled, so every element encodes to exactly
/// [`MAX_STRING_SIZE`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DbrString([u8; MAX_STRING_SIZE]);

impl DbrString {
    /// Build a protocol string from text.
    ///
    /// # Errors
    ///
    /// Returns [`DbrError::StringTooLong`] when `text` is 40 bytes or longer
    /// and [`DbrError::InteriorNul`] when it contains a NUL byte.
    pub fn new(text: &str) -> Result<Self, DbrError> {
        let bytes = text.as_bytes();
        if let Some(pos) = bytes.iter().position(|&b| b == 0) {
            return Err(DbrError::InteriorNul(pos));
        }
        if bytes.len() >= MAX_STRING_SIZE {
            return Err(DbrError::StringTooLong { len: bytes.len() });
        }
        let mut field = [0u8; MAX_STRING_SIZE];
        if let Some(dst) = field.get_mut(..bytes.len()) {
            dst.copy_from_slice(bytes);
        }
        Ok(Self(field))
    }

    /// Length of the text, terminator excluded.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.0
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_STRING_SIZE)
    }

    /// The text bytes followed by their terminator.
    #[must_use]
    pub fn terminated(&self) -> &[u8] {
        let end = (self.text_len() + 1).min(MAX_STRING_SIZE);
        self.0.get(..end).unwrap_or(&self.0)
    }

    /// The full fixed-width field.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MAX_STRING_SIZE] { &self.0 }

    /// The text as UTF-8.
    #[must_use]
    pub fn as_str(&self) -> &str {
        let text = self.0.get(..self.text_len()).unwrap_or_default();
        std::str::from_utf8(text).unwrap_or_default()
    }
}

impl Default for DbrString {
    fn default() -> Self { Self([0u8; MAX_STRING_SIZE]) }
}

impl TryFrom<&str> for DbrString {
    type Error = DbrError;

    fn try_from(text: &str) -> Result<Self, Self::Error> { Self::new(text) }
}

impl fmt::Debug for DbrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DbrString").field(&self.as_str()).finish()
    }
}

impl fmt::Display for DbrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl WireEncode for DbrString {
    const WIRE_SIZE: usize = MAX_STRING_SIZE;

    fn put_wire<B: BufMut>(&self, dst: &mut B) { dst.put_slice(&self.0); }
}
