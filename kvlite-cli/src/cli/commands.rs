// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line arguments

use clap::{Parser, Subcommand};
use kvlite::{BackendKind, ConfigError, StoreConfig};
use std::path::PathBuf;

/// Inspect and edit KvLite stores
#[derive(Parser, Debug)]
#[command(name = "kvlite", version, about = "Typed embedded key-value store")]
pub struct Cli {
    /// Data root all store files live under
    #[arg(long, global = true)]
    pub data_root: Option<PathBuf>,

    /// Preferred backend (file, relational)
    #[arg(short, long, global = true)]
    pub backend: Option<BackendKind>,

    /// Store name
    #[arg(short, long, global = true)]
    pub store: Option<String>,

    /// File backend subdirectory under the data root
    #[arg(long, global = true)]
    pub subpath: Option<String>,

    /// Enable the in-memory cache
    #[arg(long, global = true)]
    pub cache: bool,

    /// YAML config file; command-line options override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print the value stored under a key as JSON
    Get { key: String },

    /// Store a value; VALUE is parsed as JSON, anything else is stored as a string
    Set { key: String, value: String },

    /// Remove a key
    Remove { key: String },

    /// Snapshot the given keys into the backup file
    Backup {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Show which backend the store opened with
    Info,

    /// Print version information
    Version,
}

impl Cli {
    /// Build the store config: config file first, then command-line overrides
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_yaml_file(path)?,
            None => StoreConfig::default(),
        };
        if let Some(data_root) = &self.data_root {
            config.data_root = data_root.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(store) = &self.store {
            config.store_name = store.clone();
        }
        if let Some(subpath) = &self.subpath {
            config.subpath = Some(subpath.clone());
        }
        if self.cache {
            config.use_cache = true;
        }
        Ok(config)
    }
}
