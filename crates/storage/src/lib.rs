// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rcv-storage: File-per-payload journal with OS advisory locks

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod journal;

pub use journal::{validate_id, Journal, JournalError, PendingEntry};
