// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Key-value storage
//!
//! This module provides:
//! - Two interchangeable persistent backends (YAML file, SQLite)
//! - An optional in-memory value cache
//! - The [`Store`] facade with fallback and backup

pub mod cache;
pub mod persistent;
pub mod store;

pub use cache::{CacheStats, ValueCache};
pub use persistent::{BackendError, BackendKind, BackendResult, StorageBackend, StoredValue};
pub use store::{BackupReport, Store, StoreState};
