// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Typed key descriptors
//!
//! A [`KeyDescriptor`] names one stored value, fixes its Rust type and carries
//! a lazily evaluated default. Descriptors compare and hash by key alone; the
//! [`DescriptorRegistry`] is what keeps one key from being declared with two
//! different types.

pub mod registry;

pub use registry::{DescriptorRegistry, RegistryError};

use crate::storage::Store;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Bound for every type a store can hold
pub trait StorableValue: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StorableValue for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

type DefaultFn<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Named, typed handle to one stored value
pub struct KeyDescriptor<T> {
    key: Arc<str>,
    default: DefaultFn<T>,
}

impl<T: StorableValue> KeyDescriptor<T> {
    /// Create a descriptor outside any registry
    ///
    /// Such a descriptor works with every store operation but is invisible
    /// to backups; use [`DescriptorRegistry::register`] for keys that must
    /// be backed up.
    pub fn new<K, F>(key: K, default: F) -> Self
    where
        K: Into<String>,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            key: Arc::from(key.into()),
            default: Arc::new(default),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Evaluate the default supplier
    pub fn default_value(&self) -> T {
        (self.default)()
    }

    /// Write the default if the key is absent; returns whether it was written
    pub async fn initialize_default(&self, store: &Store) -> bool {
        if self.exists(store).await {
            return false;
        }
        store.set(self, &self.default_value()).await
    }

    /// Whether the store currently holds a readable value for this key
    pub async fn exists(&self, store: &Store) -> bool {
        store.get(self).await.is_some()
    }
}

impl<T> Clone for KeyDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            default: Arc::clone(&self.default),
        }
    }
}

impl<T> PartialEq for KeyDescriptor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for KeyDescriptor<T> {}

impl<T> Hash for KeyDescriptor<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for KeyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDescriptor")
            .field("key", &self.key)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for KeyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}
