// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for recoverable calls

use rcv_storage::JournalError;
use thiserror::Error;

/// Errors from a recoverable call or recovery.
///
/// `E` is the wrapped function's own error type, passed through untouched.
#[derive(Debug, Error)]
pub enum RecoverableError<E> {
    #[error("transformation failed: {0}")]
    Transform(#[source] E),
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}

impl<E> RecoverableError<E> {
    pub fn is_transform(&self) -> bool {
        matches!(self, RecoverableError::Transform(_))
    }

    /// The function's error, if that is what this is
    pub fn as_transform(&self) -> Option<&E> {
        match self {
            RecoverableError::Transform(e) => Some(e),
            RecoverableError::Journal(_) => None,
        }
    }

    pub fn into_transform(self) -> Option<E> {
        match self {
            RecoverableError::Transform(e) => Some(e),
            RecoverableError::Journal(_) => None,
        }
    }

    pub fn as_journal(&self) -> Option<&JournalError> {
        match self {
            RecoverableError::Transform(_) => None,
            RecoverableError::Journal(e) => Some(e),
        }
    }

    /// True when recovery hit an entry someone else is processing
    pub fn is_locked(&self) -> bool {
        matches!(self, RecoverableError::Journal(JournalError::Locked(_)))
    }
}
