//! Error types for assembling outbound requests.

use thiserror::Error;

use crate::{buffer::PoolError, dbr::ElementKind};

/// Errors that can occur while framing or serializing a request.
///
/// Every variant except [`SendError::Pool`] is detected before any byte of
/// the request is written.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The type code has no outbound serialization routine.
    #[error("type code {0} cannot be sent")]
    UnsupportedType(u16),
    /// The payload elements do not match the category of the type code.
    #[error("type code {data_type} expects {expected} elements, got {found}")]
    PayloadKindMismatch {
        /// Requested type code.
        data_type: u16,
        /// Category the type code serializes as.
        expected: ElementKind,
        /// Category of the supplied payload.
        found: ElementKind,
    },
    /// The payload holds fewer elements than the request count.
    #[error("payload holds {available} elements, request needs {needed}")]
    PayloadTooShort {
        /// Element count named in the request.
        needed: u32,
        /// Elements actually supplied.
        available: usize,
    },
    /// The element count exceeds what the peer can accept.
    #[error("element count {count} exceeds the limit of {limit}")]
    PayloadTooLarge {
        /// Element count named in the request.
        count: u32,
        /// Largest count accepted for this type and framing.
        limit: u32,
    },
    /// The size or count needs the extended header, which is not permitted.
    #[error("payload size {payload_size} / count {count} needs the extended header")]
    ExtensionRequired {
        /// Payload size in bytes.
        payload_size: u32,
        /// Element count.
        count: u32,
    },
    /// No transmission buffer could be obtained.
    #[error(transparent)]
    Pool(#[from] PoolError),
}
