// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable execution of a function over byte payloads
//!
//! The payload is journaled to disk before the function runs and removed
//! only once it returns `Ok`, so a crash or failure leaves it behind for
//! [`Recoverable::recover`].

mod error;
mod recoverable;

pub use error::RecoverableError;
pub use recoverable::Recoverable;

pub use rcv_core::{ExhaustedPolicy, FixedIdGen, IdGen, JournalConfig, SequentialIdGen, UuidIdGen};
pub use rcv_storage::{Journal, JournalError};
