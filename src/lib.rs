//! Outbound request queue for a Channel Access virtual circuit.
//!
//! Requests are framed into a chain of fixed-capacity transmission buffers
//! drawn from a [`BufferPool`]. Each request is assembled as a transaction:
//! bytes become sendable only once the message is committed, and an
//! abandoned message is rolled back before anything reaches the transport.
//! Typed payloads are serialized through a table indexed by `DBR_*` type
//! code, and oversized requests use the extended header when the peer
//! supports it.

pub mod buffer;
pub mod config;
pub mod dbr;
pub mod header;
pub mod queue;
pub mod request_code;
pub mod requests;
#[cfg(any(test, feature = "test-support"))]
pub mod test_helpers;
pub mod wire;

pub use buffer::{BufferPool, ComBuf, FreeListPool, PoolError};
pub use config::QueueConfig;
pub use queue::{MessageState, PayloadRequest, SendError, SendQueue};
pub use requests::RequestWriter;
