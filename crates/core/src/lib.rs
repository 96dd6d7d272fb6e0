//! rcv-core: Shared building blocks for recoverable calls
//!
//! This crate provides:
//! - Identifier generation for journal entries
//! - Journal configuration, loadable from TOML

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod id;

// Re-exports
pub use config::{ConfigError, ExhaustedPolicy, JournalConfig, DEFAULT_MAX_ATTEMPTS};
pub use id::{FixedIdGen, IdGen, SequentialIdGen, UuidIdGen};
