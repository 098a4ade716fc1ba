// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! KvLite - A typed, embedded key-value store
//!
//! KvLite stores named, typed values in one of two embedded backends and
//! keeps working when the preferred backend is unavailable.
//!
//! # Features
//!
//! - **Typed Keys**: Values are declared once through key descriptors with a lazy default
//! - **Two Backends**: A hand-editable YAML document or an SQLite table
//! - **Fallback**: A store whose backend cannot start falls back to the YAML file
//! - **Caching**: Optional in-memory cache in front of the backend
//! - **Backups**: Snapshot every registered key into a separate YAML file
//! - **Async**: All I/O runs off the async executor on tokio's blocking pool
//!
//! # Usage
//!
//! ```ignore
//! use kvlite::{BackendKind, DescriptorRegistry, Store, StoreConfig};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(DescriptorRegistry::new());
//! let counter = registry.register("counter", || 0_i64)?;
//!
//! let config = StoreConfig::new("./data", BackendKind::Relational, "test-store");
//! let store = Store::open(config, Arc::clone(&registry)).await;
//!
//! store.set(&counter, &42).await;
//! assert_eq!(store.get(&counter).await, Some(42));
//! store.backup().await;
//! ```

pub mod config;
pub mod descriptor;
pub mod storage;

pub use config::{ConfigError, StoreConfig};
pub use descriptor::{DescriptorRegistry, KeyDescriptor, RegistryError, StorableValue};
pub use storage::{BackendKind, BackupReport, CacheStats, Store, StoreState};

/// KvLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// KvLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
