// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Store configuration

use crate::storage::persistent::yaml::DEFAULT_SUBPATH;
use crate::storage::persistent::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default directory for backup snapshots, relative to the data root
pub const DEFAULT_BACKUP_SUBPATH: &str = "backups";

/// Default store name
pub const DEFAULT_STORE_NAME: &str = "key_value";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Everything needed to open a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Process data root every store path is resolved against
    pub data_root: PathBuf,

    /// Preferred backend; the file backend is the fallback
    pub backend: BackendKind,

    /// Store name, used as the file or database name
    pub store_name: String,

    /// File backend subdirectory under the data root
    pub subpath: Option<String>,

    /// Relational database directory; defaults to `<data_root>/database`
    pub database_dir: Option<PathBuf>,

    /// Backup snapshot subdirectory under the data root
    pub backup_subpath: String,

    /// Enable the in-memory value cache
    pub use_cache: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            backend: BackendKind::default(),
            store_name: DEFAULT_STORE_NAME.to_string(),
            subpath: None,
            database_dir: None,
            backup_subpath: DEFAULT_BACKUP_SUBPATH.to_string(),
            use_cache: false,
        }
    }
}

impl StoreConfig {
    pub fn new<P: Into<PathBuf>, N: Into<String>>(
        data_root: P,
        backend: BackendKind,
        store_name: N,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            backend,
            store_name: store_name.into(),
            ..Self::default()
        }
    }

    /// Load a YAML config file; missing fields take their defaults
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_subpath<S: Into<String>>(mut self, subpath: S) -> Self {
        self.subpath = Some(subpath.into());
        self
    }

    pub fn with_database_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.database_dir = Some(dir.into());
        self
    }

    pub fn with_backup_subpath<S: Into<String>>(mut self, subpath: S) -> Self {
        self.backup_subpath = subpath.into();
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Effective file backend subdirectory
    pub fn file_subpath(&self) -> &str {
        self.subpath.as_deref().unwrap_or(DEFAULT_SUBPATH)
    }

    /// Effective relational database directory
    pub fn database_dir(&self) -> PathBuf {
        self.database_dir
            .clone()
            .unwrap_or_else(|| self.data_root.join("database"))
    }
}
