// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal entry identifier generation
//!
//! Every create attempt asks the generator for a fresh candidate name. The
//! journal tolerates collisions by retrying, so generators only need to make
//! them unlikely, not impossible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates candidate file names for journal entries
pub trait IdGen: Clone + Send + Sync {
    fn next(&self) -> String;
}

/// Random 128-bit identifiers rendered as 32 lowercase hex characters
#[derive(Debug, Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Sequential ID generator for testing
#[derive(Debug, Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("entry")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

/// Always proposes the same name.
///
/// Useful when the caller derives the name from something it already knows
/// (a content hash, an upstream message id), and for exercising collisions.
/// A second live entry under the same name is impossible, so concurrent
/// calls beyond the first exhaust their attempts.
#[derive(Debug, Clone)]
pub struct FixedIdGen {
    id: String,
}

impl FixedIdGen {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl IdGen for FixedIdGen {
    fn next(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
