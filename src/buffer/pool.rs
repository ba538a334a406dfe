//! Buffer pool contract and a bounded free-list implementation.
//!
//! The send queue never allocates a [`ComBuf`] directly: it asks a
//! [`BufferPool`] for one whenever the chain needs a new tail. Transports
//! return buffers they have finished sending through the same pool, which is
//! why [`BufferPool`] takes `&self` and [`FreeListPool`] is shareable.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::warn;

use super::ComBuf;
use crate::config::QueueConfig;

/// Errors reported by a [`BufferPool`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Every buffer the pool may hand out is already in use.
    #[error("buffer pool exhausted ({limit} buffers outstanding)")]
    Exhausted {
        /// Configured maximum of outstanding buffers.
        limit: usize,
    },
}

/// Source and sink of transmission buffers.
pub trait BufferPool {
    /// Hand out an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when no buffer can be supplied.
    fn acquire(&self) -> Result<ComBuf, PoolError>;

    /// Take back a buffer that is no longer needed.
    fn release(&self, buf: ComBuf);
}

impl<P: BufferPool + ?Sized> BufferPool for &P {
    fn acquire(&self) -> Result<ComBuf, PoolError> { (**self).acquire() }

    fn release(&self, buf: ComBuf) { (**self).release(buf); }
}

impl<P: BufferPool + ?Sized> BufferPool for Arc<P> {
    fn acquire(&self) -> Result<ComBuf, PoolError> { (**self).acquire() }

    fn release(&self, buf: ComBuf) { (**self).release(buf); }
}

#[derive(Debug, Default)]
struct PoolState {
    idle: Vec<ComBuf>,
    outstanding: usize,
}

/// Pool that recycles released buffers and caps how many are in use.
#[derive(Debug)]
pub struct FreeListPool {
    limit: usize,
    state: Mutex<PoolState>,
}

impl FreeListPool {
    /// Create a pool that allows at most `limit` outstanding buffers.
    #[must_use]
    pub fn new(limit: usize) -> Self { Self::with_prealloc(limit, 0) }

    /// Create a pool with `prealloc` idle buffers ready to hand out.
    ///
    /// The preallocation is capped at `limit`.
    #[must_use]
    pub fn with_prealloc(limit: usize, prealloc: usize) -> Self {
        let idle = std::iter::repeat_with(ComBuf::new)
            .take(prealloc.min(limit))
            .collect();
        Self {
            limit,
            state: Mutex::new(PoolState {
                idle,
                outstanding: 0,
            }),
        }
    }

    /// Build a pool sized by the loaded configuration.
    #[must_use]
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::with_prealloc(config.pool_limit, config.pool_prealloc)
    }

    /// Maximum number of buffers that may be outstanding at once.
    #[must_use]
    pub const fn limit(&self) -> usize { self.limit }

    /// Buffers currently handed out and not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize { self.lock().outstanding }

    /// Buffers waiting in the free list.
    #[must_use]
    pub fn idle(&self) -> usize { self.lock().idle.len() }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl BufferPool for FreeListPool {
    fn acquire(&self) -> Result<ComBuf, PoolError> {
        let mut state = self.lock();
        if state.outstanding >= self.limit {
            warn!(limit = self.limit, "transmission buffer pool exhausted");
            return Err(PoolError::Exhausted { limit: self.limit });
        }
        state.outstanding += 1;
        Ok(state.idle.pop().unwrap_or_default())
    }

    fn release(&self, mut buf: ComBuf) {
        buf.reset();
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        if state.idle.len() < self.limit {
            state.idle.push(buf);
        }
    }
}
