//! Layered configuration for buffer pool sizing.
//!
//! Values come from CLI flags, `CA_SENDQ_*` environment variables and a
//! configuration dotfile, in that order of precedence, falling back to the
//! defaults below.

#![expect(
    non_snake_case,
    reason = "Clap/OrthoConfig derive macros generate helper modules with uppercase names"
)]
#![allow(
    missing_docs,
    reason = "OrthoConfig and Clap derive macros generate items that cannot be documented"
)]
#![allow(
    unfulfilled_lint_expectations,
    reason = "derive macros conditionally generate items"
)]

use clap::Args;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

/// Default cap on buffers outstanding from one pool.
pub const DEFAULT_POOL_LIMIT: usize = 1024;
/// Default number of idle buffers allocated when a pool is built.
pub const DEFAULT_POOL_PREALLOC: usize = 4;

/// Buffer pool sizing shared by every send queue of a process.
#[expect(
    missing_docs,
    reason = "OrthoConfig derive macro generates items that cannot be documented"
)]
#[derive(Args, OrthoConfig, Serialize, Deserialize, Default, Debug, Clone)]
#[ortho_config(prefix = "CA_SENDQ_")]
pub struct QueueConfig {
    /// Maximum number of transmission buffers outstanding at once.
    #[ortho_config(default = DEFAULT_POOL_LIMIT)]
    #[arg(long, default_value_t = DEFAULT_POOL_LIMIT)]
    pub pool_limit: usize,
    /// Idle buffers allocated up front.
    #[ortho_config(default = DEFAULT_POOL_PREALLOC)]
    #[arg(long, default_value_t = DEFAULT_POOL_PREALLOC)]
    pub pool_prealloc: usize,
}
