// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Backend factory
//!
//! This module maps a configured [`BackendKind`] to a concrete backend. The set
//! of kinds is closed, so construction is a single match.

use super::sqlite::SqliteBackend;
use super::traits::StorageBackend;
use super::types::BackendKind;
use super::yaml::YamlBackend;
use crate::config::StoreConfig;

/// Create an uninitialized backend of the given kind
///
/// Construction never touches the disk; call
/// [`StorageBackend::initialize`] to open the backend's resource.
///
/// # Arguments
/// * `kind` - Which backend to build
/// * `config` - Store configuration supplying the data root and directories
///
/// # Examples
/// ```ignore
/// let backend = create_backend(BackendKind::Relational, &config);
/// if backend.initialize(&config.store_name, None).await {
///     backend.set("counter", Some(json!(1))).await?;
/// }
/// ```
pub fn create_backend(kind: BackendKind, config: &StoreConfig) -> Box<dyn StorageBackend> {
    match kind {
        BackendKind::File => Box::new(YamlBackend::new(&config.data_root)),
        BackendKind::Relational => Box::new(SqliteBackend::new(config.database_dir())),
    }
}
