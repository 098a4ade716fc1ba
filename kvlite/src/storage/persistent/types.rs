// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Backend types and error handling
//!
//! This module defines the backend kind selector, the error type shared by
//! both backends, and the result alias used throughout the backend layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest key accepted by either backend (matches the `key_value.key` column width)
pub const MAX_KEY_LENGTH: usize = 255;

/// Backend kind configuration
///
/// Exactly two kinds exist. Every store owns one active backend of one of
/// these kinds, and the File kind doubles as the fallback target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Flat hierarchical YAML document, one file per store
    /// Best for: small stores, hand-editable data, fallback
    #[default]
    File,

    /// Embedded SQLite database with a single `key_value` table
    /// Best for: larger stores, frequent point writes
    Relational,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "yml" | "yaml" => Ok(BackendKind::File),
            "relational" | "sqlite" | "sql" => Ok(BackendKind::Relational),
            _ => Err(format!(
                "Unknown backend kind: {}. Valid options: file, relational",
                s
            )),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendKind::File => "file",
            BackendKind::Relational => "relational",
        };
        write!(f, "{}", name)
    }
}

/// Error type for backend operations
///
/// Covers the three failure families a backend can hit: resource I/O
/// (file system, SQLite), value (de)serialization, and misuse (bad keys,
/// operating before `initialize` or after `close`).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Backend not initialized")]
    NotInitialized,

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl BackendError {
    /// Create an invalid key error
    pub fn invalid_key<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for BackendError {
    fn from(e: tokio::task::JoinError) -> Self {
        BackendError::TaskFailed(e.to_string())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Check a key against the rules both backends share
///
/// Keys must be non-empty, fit the relational key column, and form a valid
/// dotted path (no empty segments) for the file backend.
pub fn validate_key(key: &str) -> BackendResult<()> {
    if key.is_empty() {
        return Err(BackendError::invalid_key(key, "key is empty"));
    }
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(BackendError::invalid_key(
            key,
            format!("key exceeds {} characters", MAX_KEY_LENGTH),
        ));
    }
    if key.split('.').any(|segment| segment.is_empty()) {
        return Err(BackendError::invalid_key(key, "empty path segment"));
    }
    Ok(())
}
