// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Persistent storage backends
//!
//! This module provides the trait-based backend contract and its two
//! implementations, which can be used interchangeably behind a store.
//!
//! # Architecture
//!
//! ```text
//! Store (typed descriptors, cache, fallback, backup)
//!     ↓
//! StorageBackend (serialized key-value contract)
//!     ↓
//! Concrete Implementations (YAML file, SQLite)
//! ```
//!
//! # Example Usage
//!
//! ```ignore
//! use crate::storage::persistent::{create_backend, BackendKind};
//!
//! let backend = create_backend(BackendKind::File, &config);
//! backend.initialize("settings", None).await;
//!
//! backend.set("motd", Some(json!("hello"))).await?;
//! let value = backend.get("motd").await?;
//! backend.remove("motd").await?;
//! ```

// Core modules
pub mod factory;
pub mod traits;
pub mod types;

// Backend implementations
pub mod sqlite;
pub mod yaml;

// Public API re-exports
pub use factory::create_backend;
pub use sqlite::SqliteBackend;
pub use traits::{StorageBackend, StoredValue};
pub use types::{BackendError, BackendKind, BackendResult, MAX_KEY_LENGTH};
pub use yaml::YamlBackend;
