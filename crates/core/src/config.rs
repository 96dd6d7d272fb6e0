// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Create attempts made before giving up on a journal entry
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Errors from loading a journal configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("max_attempts must be at least 1")]
    InvalidMaxAttempts,
}

/// What a call does when no journal entry could be created
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedPolicy {
    /// Run the function anyway, without durability for that call
    #[default]
    Degrade,
    /// Refuse to run the function
    Fail,
}

/// Where and how pending payloads are journaled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalConfig {
    /// Existing, writable directory holding one file per pending payload
    pub directory: PathBuf,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub on_exhausted: ExhaustedPolicy,
    /// Fsync the directory after creating an entry so its name survives a
    /// power loss, not just its content.
    #[serde(default = "default_sync_directory")]
    pub sync_directory: bool,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_sync_directory() -> bool {
    true
}

impl JournalConfig {
    /// Defaults for everything but the directory
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            on_exhausted: ExhaustedPolicy::default(),
            sync_directory: true,
        }
    }

    /// Zero is raised to one; use [`from_toml_str`](Self::from_toml_str)
    /// to have it rejected instead.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_on_exhausted(mut self, policy: ExhaustedPolicy) -> Self {
        self.on_exhausted = policy;
        self
    }

    pub fn with_sync_directory(mut self, sync_directory: bool) -> Self {
        self.sync_directory = sync_directory;
        self
    }

    /// Parse and validate a configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        Ok(())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
