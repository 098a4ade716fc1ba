// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Storage backend trait
//!
//! This module defines the contract both backends implement. Values cross the
//! contract as [`StoredValue`], a serialized intermediate; the typed layer
//! above (the store) encodes and decodes at the call site where the concrete
//! type is known, so a backend never inspects or casts on a type tag.

use super::types::{BackendKind, BackendResult};
use async_trait::async_trait;

/// Serialized, type-erased value passed between the store and a backend
pub type StoredValue = serde_json::Value;

/// Uniform async operation set of a storage backend
///
/// One backend instance owns exactly one mutable resource (a document or a
/// connection). Implementations serialize every mutation against that
/// resource and run blocking work off the caller's task.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which kind of backend this is
    fn kind(&self) -> BackendKind;

    /// Open the backend's resource and prepare its structures
    ///
    /// Idempotent. Never fails loudly: problems are logged and reported by
    /// returning `false`.
    async fn initialize(&self, store_name: &str, subpath: Option<&str>) -> bool;

    /// Store `value` under `key`, or delete the key when `value` is `None`
    ///
    /// A JSON `null` value deletes the key as well.
    async fn set(&self, key: &str, value: Option<StoredValue>) -> BackendResult<()>;

    /// Look up `key`; `Ok(None)` means absent, never `Ok(Some(Null))`
    async fn get(&self, key: &str) -> BackendResult<Option<StoredValue>>;

    /// Remove `key`; defined as storing no value
    async fn remove(&self, key: &str) -> BackendResult<()> {
        self.set(key, None).await
    }

    /// Remove every key
    async fn clear(&self) -> BackendResult<()>;

    /// Whether `initialize` succeeded and `close` has not been called
    fn is_ready(&self) -> bool;

    /// Release the underlying resource
    ///
    /// Safe to call more than once; later operations report `NotInitialized`.
    fn close(&self);
}
