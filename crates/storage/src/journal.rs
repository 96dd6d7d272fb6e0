// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead journal of pending payloads
//!
//! Each payload lives in its own file, named by an opaque id, in a single
//! flat directory. On Linux the payload is written, fsynced and locked in a
//! nameless `O_TMPFILE` inode, and only then linked under its id, so an
//! entry is never visible before it is complete. Elsewhere the entry is
//! created exclusively, then locked and written. Locks are OS advisory
//! locks: they are released when the handle closes or the holding process
//! dies, which is what makes an orphaned entry claimable by a later process.

use fs2::FileExt;
use rcv_core::{IdGen, JournalConfig, UuidIdGen};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur in journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("no journal entry could be created after {attempts} attempts")]
    CreationExhausted { attempts: u32 },
    #[error("journal entry {0} is locked by another holder")]
    Locked(String),
    #[error("journal entry not found: {0}")]
    NotFound(String),
    #[error("invalid journal entry id: {0:?}")]
    InvalidId(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Directory of pending payloads, one file per payload
#[derive(Debug, Clone)]
pub struct Journal<G = UuidIdGen> {
    config: JournalConfig,
    id_gen: G,
}

impl Journal<UuidIdGen> {
    /// Journal in `directory` with random ids and default settings
    pub fn with_defaults(directory: impl Into<PathBuf>) -> Self {
        Self::new(JournalConfig::new(directory), UuidIdGen)
    }
}

impl<G: IdGen> Journal<G> {
    /// A `max_attempts` of zero is raised to one, so every call makes at
    /// least one attempt at durability.
    pub fn new(mut config: JournalConfig, id_gen: G) -> Self {
        if config.max_attempts == 0 {
            warn!("max_attempts of 0 raised to 1");
            config.max_attempts = 1;
        }
        Self { config, id_gen }
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn directory(&self) -> &Path {
        self.config.directory()
    }

    /// Durably stage `payload` under a fresh, locked entry.
    ///
    /// Candidates that collide with an existing file, or fail for any other
    /// reason, are dropped and a new id is drawn, up to `max_attempts`
    /// times. An existing file is never opened for writing. On return the
    /// payload has been written and fsynced and the entry is still locked
    /// by the returned handle.
    pub fn create(&self, payload: &[u8]) -> Result<PendingEntry, JournalError> {
        let span = tracing::debug_span!("journal.create", len = payload.len());
        let _guard = span.enter();

        #[cfg(target_os = "linux")]
        {
            if let Some(file) = stage_anonymous(self.directory(), payload)? {
                return self.publish(file);
            }
        }
        self.create_in_place(payload)
    }

    /// Give an already written, locked, anonymous file its first name.
    ///
    /// The entry only becomes visible once it is complete, so a concurrent
    /// claim can never see it empty or unlocked.
    #[cfg(target_os = "linux")]
    fn publish(&self, file: File) -> Result<PendingEntry, JournalError> {
        use rustix::fs::{linkat, AtFlags, CWD};
        use std::os::fd::AsRawFd;

        let source = PathBuf::from(format!("/proc/self/fd/{}", file.as_raw_fd()));
        for attempt in 1..=self.config.max_attempts {
            let Some((id, path)) = self.candidate(attempt) else {
                continue;
            };

            // EEXIST here is a collision; the existing file is not touched
            if let Err(e) = linkat(
                CWD,
                source.as_path(),
                CWD,
                path.as_path(),
                AtFlags::SYMLINK_FOLLOW,
            ) {
                debug!(attempt, id, error = %e, "publish attempt failed");
                continue;
            }

            let entry = PendingEntry { id, path, file };
            if self.config.sync_directory {
                if let Err(e) = sync_dir(self.directory()) {
                    entry.discard();
                    return Err(e.into());
                }
            }
            debug!(attempt, id = entry.id(), "entry published");
            return Ok(entry);
        }

        Err(self.exhausted())
    }

    /// Exclusive create, then lock, then write.
    ///
    /// Used where anonymous files are unavailable. Between the create and
    /// the lock the entry is visible and empty; a claim landing in that gap
    /// wins the file and this attempt moves on to a new id.
    fn create_in_place(&self, payload: &[u8]) -> Result<PendingEntry, JournalError> {
        for attempt in 1..=self.config.max_attempts {
            let Some((id, path)) = self.candidate(attempt) else {
                continue;
            };

            let file = match open_locked(&path) {
                Ok(file) => file,
                Err(e) => {
                    debug!(attempt, id, error = %e, "create attempt failed");
                    continue;
                }
            };

            let mut entry = PendingEntry { id, path, file };
            if let Err(e) = self.arm(&mut entry, payload) {
                // Nobody else can see a half-written entry through the lock,
                // so it is ours to remove.
                entry.discard();
                return Err(e.into());
            }

            debug!(attempt, id = entry.id(), "entry staged");
            return Ok(entry);
        }

        Err(self.exhausted())
    }

    fn candidate(&self, attempt: u32) -> Option<(String, PathBuf)> {
        let id = self.id_gen.next();
        if let Err(e) = validate_id(&id) {
            debug!(attempt, error = %e, "candidate rejected");
            return None;
        }
        let path = self.directory().join(&id);
        Some((id, path))
    }

    fn exhausted(&self) -> JournalError {
        JournalError::CreationExhausted {
            attempts: self.config.max_attempts,
        }
    }

    fn arm(&self, entry: &mut PendingEntry, payload: &[u8]) -> io::Result<()> {
        entry.file.write_all(payload)?;
        entry.file.sync_all()?;
        if self.config.sync_directory {
            sync_dir(self.directory())?;
        }
        Ok(())
    }

    /// Names of the entries currently in the directory, in no particular
    /// order. Entries held by live callers are included.
    pub fn list(&self) -> Result<Vec<String>, JournalError> {
        let mut ids = Vec::new();
        for dirent in fs::read_dir(self.directory())? {
            let dirent = dirent?;
            match dirent.file_type() {
                Ok(kind) if kind.is_file() => {}
                Ok(_) => continue,
                // Completed and removed since the directory was read
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
            match dirent.file_name().into_string() {
                Ok(id) => ids.push(id),
                Err(name) => debug!(?name, "skipping non-UTF-8 file name"),
            }
        }
        Ok(ids)
    }

    /// Lock an existing entry and read its payload.
    ///
    /// Never waits: an entry locked elsewhere fails with
    /// [`JournalError::Locked`] and is left untouched.
    pub fn claim(&self, id: &str) -> Result<(PendingEntry, Vec<u8>), JournalError> {
        validate_id(id)?;
        let span = tracing::debug_span!("journal.claim", id);
        let _guard = span.enter();

        let path = self.directory().join(id);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(JournalError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                debug!("entry is held elsewhere");
                return Err(JournalError::Locked(id.to_string()));
            }
            return Err(e.into());
        }

        // The previous holder may have completed the entry between our open
        // and our lock; its payload has already been handled.
        if is_unlinked(&file)? {
            return Err(JournalError::NotFound(id.to_string()));
        }

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;
        debug!(len = payload.len(), "entry claimed");

        Ok((
            PendingEntry {
                id: id.to_string(),
                path,
                file,
            },
            payload,
        ))
    }
}

/// A journal entry whose lock is held by this handle
#[derive(Debug)]
pub struct PendingEntry {
    id: String,
    path: PathBuf,
    file: File,
}

impl PendingEntry {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the entry, then release its lock
    pub fn complete(self) -> Result<(), JournalError> {
        fs::remove_file(&self.path)?;
        debug!(id = self.id, "entry completed");
        self.unlock();
        Ok(())
    }

    /// Release the lock and keep the entry for a later recovery
    pub fn release(self) {
        debug!(id = self.id, "entry released");
        self.unlock();
    }

    fn unlock(self) {
        // Closing the handle drops the lock regardless
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(id = self.id, error = %e, "explicit unlock failed");
        }
    }

    fn discard(self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(id = self.id, error = %e, "failed to remove partial entry");
        }
    }
}

/// Reject ids that would not name a plain file directly inside the journal
pub fn validate_id(id: &str) -> Result<(), JournalError> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains('/')
        || id.contains(std::path::MAIN_SEPARATOR)
        || id.contains('\0');
    if invalid {
        return Err(JournalError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Exclusive create plus non-blocking lock
fn open_locked(path: &Path) -> io::Result<File> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.try_lock_exclusive()?;
    Ok(file)
}

/// Write and fsync `payload` into a locked, nameless file in `dir`.
///
/// `Ok(None)` when the filesystem cannot create `O_TMPFILE` files; the
/// caller then falls back to creating entries in place.
#[cfg(target_os = "linux")]
fn stage_anonymous(dir: &Path, payload: &[u8]) -> io::Result<Option<File>> {
    use rustix::fs::{openat, Mode, OFlags, CWD};

    let flags = OFlags::WRONLY | OFlags::TMPFILE | OFlags::CLOEXEC;
    let fd = match openat(CWD, dir, flags, Mode::from_raw_mode(0o666)) {
        Ok(fd) => fd,
        Err(e) => {
            debug!(error = %e, "anonymous staging unavailable");
            return Ok(None);
        }
    };

    let mut file = File::from(fd);
    file.try_lock_exclusive()?;
    file.write_all(payload)?;
    file.sync_all()?;
    Ok(Some(file))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn is_unlinked(file: &File) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    Ok(file.metadata()?.nlink() == 0)
}

#[cfg(not(unix))]
fn is_unlinked(_file: &File) -> io::Result<bool> {
    Ok(false)
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
