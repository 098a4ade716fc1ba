// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Descriptor registry
//!
//! Append-only record of every registered key and its declared type. It is
//! built once at startup, shared by handle, and read by backups to know
//! which keys exist.

use super::{KeyDescriptor, StorableValue};
use crate::storage::persistent::types::validate_key;
use log::debug;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use thiserror::Error;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Key '{key}' is already registered as {existing}, cannot register it as {requested}")]
    TypeConflict {
        key: String,
        existing: &'static str,
        requested: &'static str,
    },
}

#[derive(Debug, Clone)]
struct RegisteredKey {
    key: String,
    type_id: TypeId,
    type_name: &'static str,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: Vec<RegisteredKey>,
    index: HashMap<String, usize>,
}

/// Registry of every descriptor a process declares
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    inner: RwLock<RegistryInner>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a key with its type and default
    ///
    /// Registering the same key again with the same type returns a fresh
    /// descriptor and leaves the registry unchanged. Registering it with a
    /// different type is rejected.
    ///
    /// # Examples
    /// ```ignore
    /// let registry = DescriptorRegistry::new();
    /// let counter = registry.register("counter", || 0_i64)?;
    /// assert!(registry.register("counter", String::new).is_err());
    /// ```
    pub fn register<T, K, F>(&self, key: K, default: F) -> Result<KeyDescriptor<T>, RegistryError>
    where
        T: StorableValue,
        K: Into<String>,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let key = key.into();
        validate_key(&key).map_err(|e| RegistryError::InvalidKey {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        self.claim::<T>(&key)?;
        Ok(KeyDescriptor::new(key, default))
    }

    /// Record `key` as holding `T`
    ///
    /// Returns whether the key was new. A key already recorded with another
    /// type is left untouched and reported as a conflict.
    pub(crate) fn claim<T: 'static>(&self, key: &str) -> Result<bool, RegistryError> {
        let mut inner = self.inner.write();
        if let Some(&position) = inner.index.get(key) {
            return conflict::<T>(key, &inner.entries[position]).map(|()| false);
        }

        let type_name = std::any::type_name::<T>();
        debug!("Recorded key '{}' as {}", key, type_name);
        let position = inner.entries.len();
        inner.entries.push(RegisteredKey {
            key: key.to_string(),
            type_id: TypeId::of::<T>(),
            type_name,
        });
        inner.index.insert(key.to_string(), position);
        Ok(true)
    }

    /// Whether `key` may be used with `T`
    ///
    /// Unregistered keys pass; nothing is recorded.
    pub fn check<T: 'static>(&self, key: &str) -> Result<(), RegistryError> {
        let inner = self.inner.read();
        match inner.index.get(key) {
            Some(&position) => conflict::<T>(key, &inner.entries[position]),
            None => Ok(()),
        }
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Declared type name of a registered key
    pub fn type_name(&self, key: &str) -> Option<&'static str> {
        let inner = self.inner.read();
        inner.index.get(key).map(|&i| inner.entries[i].type_name)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

fn conflict<T: 'static>(key: &str, existing: &RegisteredKey) -> Result<(), RegistryError> {
    if existing.type_id == TypeId::of::<T>() {
        return Ok(());
    }
    Err(RegistryError::TypeConflict {
        key: key.to_string(),
        existing: existing.type_name,
        requested: std::any::type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Spawn {
        world: String,
        x: i32,
    }

    #[test]
    fn test_register_preserves_order() {
        let registry = DescriptorRegistry::new();
        registry.register("counter", || 0_i64).unwrap();
        registry
            .register("spawn", || Spawn {
                world: "overworld".into(),
                x: 0,
            })
            .unwrap();
        registry.register("motd", String::new).unwrap();

        assert_eq!(registry.keys(), vec!["counter", "spawn", "motd"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("spawn"));
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_same_key_same_type_is_accepted() {
        let registry = DescriptorRegistry::new();
        let first = registry.register("counter", || 0_i64).unwrap();
        let second = registry.register("counter", || 5_i64).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_key_other_type_conflicts() {
        let registry = DescriptorRegistry::new();
        registry.register("counter", || 0_i64).unwrap();
        let err = registry.register("counter", String::new).unwrap_err();
        match err {
            RegistryError::TypeConflict {
                key,
                existing,
                requested,
            } => {
                assert_eq!(key, "counter");
                assert_eq!(existing, "i64");
                assert!(requested.contains("String"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(registry.type_name("counter"), Some("i64"));
    }

    #[test]
    fn test_check_does_not_register() {
        let registry = DescriptorRegistry::new();
        registry.register("counter", || 0_i64).unwrap();

        assert!(registry.check::<i64>("counter").is_ok());
        assert!(matches!(
            registry.check::<String>("counter"),
            Err(RegistryError::TypeConflict { .. })
        ));
        assert!(registry.check::<String>("motd").is_ok());
        assert!(!registry.contains("motd"));
    }

    #[test]
    fn test_claim_reports_new_keys() {
        let registry = DescriptorRegistry::new();
        assert_eq!(registry.claim::<u32>("level"), Ok(true));
        assert_eq!(registry.claim::<u32>("level"), Ok(false));
        assert!(registry.claim::<bool>("level").is_err());
        assert_eq!(registry.type_name("level"), Some("u32"));
    }

    #[test]
    fn test_invalid_keys_are_rejected() {
        let registry = DescriptorRegistry::new();
        assert!(matches!(
            registry.register("", || 0_u8),
            Err(RegistryError::InvalidKey { .. })
        ));
        assert!(matches!(
            registry.register("a..b", || 0_u8),
            Err(RegistryError::InvalidKey { .. })
        ));
        assert!(registry.is_empty());
    }
}
