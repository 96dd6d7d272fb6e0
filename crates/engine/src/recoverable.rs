// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journaled function wrapper

use crate::RecoverableError;
use rcv_core::{ExhaustedPolicy, IdGen, UuidIdGen};
use rcv_storage::{Journal, JournalError, PendingEntry};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A function over byte payloads whose input survives failures and crashes.
///
/// Every [`call`](Self::call) stages the payload in the journal, fsynced and
/// locked, before invoking the function. The entry is deleted when the
/// function returns `Ok`; on `Err`, a panic, or the process dying, it stays
/// on disk unlocked, and [`recover`](Self::recover) can replay it later from
/// any process.
pub struct Recoverable<F, G = UuidIdGen> {
    journal: Journal<G>,
    f: F,
}

impl<F> Recoverable<F> {
    /// Journal into `directory` with random ids and default settings.
    /// The directory must already exist.
    pub fn new(directory: impl Into<PathBuf>, f: F) -> Self {
        Self::with_journal(Journal::with_defaults(directory), f)
    }
}

impl<F, G: IdGen> Recoverable<F, G> {
    pub fn with_journal(journal: Journal<G>, f: F) -> Self {
        Self { journal, f }
    }

    pub fn journal(&self) -> &Journal<G> {
        &self.journal
    }

    /// Ids of entries left in the journal, including ones still in flight
    /// in other callers. Unordered.
    pub fn list_pending(&self) -> Result<Vec<String>, JournalError> {
        self.journal.list()
    }

    /// Journal `payload`, then run the function on it.
    ///
    /// The function's error comes back as [`RecoverableError::Transform`]
    /// unchanged. If no journal entry can be created, the configured
    /// [`ExhaustedPolicy`] decides between running without one and failing
    /// with [`JournalError::CreationExhausted`].
    pub fn call<T, E>(&self, payload: &[u8]) -> Result<T, RecoverableError<E>>
    where
        F: Fn(&[u8]) -> Result<T, E>,
    {
        let span = tracing::info_span!("recoverable.call", len = payload.len());
        let _guard = span.enter();

        let entry = match self.journal.create(payload) {
            Ok(entry) => Some(entry),
            Err(JournalError::CreationExhausted { attempts })
                if self.journal.config().on_exhausted == ExhaustedPolicy::Degrade =>
            {
                warn!(
                    attempts,
                    directory = %self.journal.directory().display(),
                    "no journal entry created, running without durability"
                );
                None
            }
            Err(e) => {
                error!(error = %e, "journal entry creation failed");
                return Err(e.into());
            }
        };

        self.run(entry, payload)
    }

    /// Replay a journaled payload left behind by an earlier call.
    ///
    /// Fails immediately with [`JournalError::Locked`] when the entry is
    /// being processed elsewhere; retrying is up to the caller. The entry is
    /// deleted only if the function returns `Ok`.
    pub fn recover<T, E>(&self, id: &str) -> Result<T, RecoverableError<E>>
    where
        F: Fn(&[u8]) -> Result<T, E>,
    {
        let span = tracing::info_span!("recoverable.recover", id);
        let _guard = span.enter();

        let (entry, payload) = self.journal.claim(id)?;
        info!(len = payload.len(), "replaying entry");
        self.run(Some(entry), &payload)
    }

    fn run<T, E>(
        &self,
        entry: Option<PendingEntry>,
        payload: &[u8],
    ) -> Result<T, RecoverableError<E>>
    where
        F: Fn(&[u8]) -> Result<T, E>,
    {
        let start = Instant::now();
        let result = (self.f)(payload);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                if let Some(entry) = entry {
                    entry.complete()?;
                }
                debug!(elapsed_ms, "succeeded");
                Ok(value)
            }
            Err(e) => {
                match entry {
                    Some(entry) => {
                        info!(id = entry.id(), elapsed_ms, "failed, entry kept for recovery");
                        entry.release();
                    }
                    None => info!(elapsed_ms, "failed"),
                }
                Err(RecoverableError::Transform(e))
            }
        }
    }
}

impl<F, G: fmt::Debug> fmt::Debug for Recoverable<F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recoverable")
            .field("journal", &self.journal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "recoverable_tests.rs"]
mod tests;
