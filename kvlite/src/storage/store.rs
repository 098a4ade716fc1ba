// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Store - typed key-value facade over one storage backend
//!
//! A store owns exactly one active backend, chosen when it is opened:
//! - the configured backend if it initializes,
//! - otherwise the file backend (one attempt),
//! - otherwise nothing: the store is `Failed` for the rest of its life.
//!
//! Layered on top are an optional value cache and a backup operation that
//! copies every registered key into a separate snapshot file.
//!
//! No operation returns an error to the caller. Failures are logged with the
//! underlying cause and reported as `false` or `None`.
//!
//! A key is used with one value type per store. The first descriptor to touch
//! a key fixes its type (or the registry does, if the key is registered);
//! descriptors of any other type are refused. A JSON `null` is never stored:
//! writing one removes the key.

use crate::config::StoreConfig;
use crate::descriptor::{DescriptorRegistry, KeyDescriptor, StorableValue};
use crate::storage::cache::{CacheStats, ValueCache};
use crate::storage::persistent::{
    create_backend, BackendKind, StorageBackend, StoredValue, YamlBackend,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Which backend a store ended up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreState {
    /// The configured backend initialized
    PrimaryReady(BackendKind),
    /// The configured backend failed and the file backend took over
    FallbackReady,
    /// No backend could initialize; every operation fails
    Failed,
}

impl std::fmt::Display for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreState::PrimaryReady(kind) => write!(f, "ready ({})", kind),
            StoreState::FallbackReady => write!(f, "ready (file fallback)"),
            StoreState::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of a backup run
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    /// Keys whose current value (or absence) was written to the snapshot
    pub backed_up: Vec<String>,
    /// Keys that could not be read from the active backend
    pub skipped: Vec<String>,
    /// Keys that were read but could not be written to the snapshot
    pub failed: Vec<String>,
    /// Snapshot file
    pub target: PathBuf,
    pub completed_at: DateTime<Utc>,
}

impl BackupReport {
    fn aborted(target: PathBuf, keys: Vec<String>) -> Self {
        Self {
            backed_up: Vec::new(),
            skipped: Vec::new(),
            failed: keys,
            target,
            completed_at: Utc::now(),
        }
    }

    /// Whether every registered key made it into the snapshot
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Typed key-value store
pub struct Store {
    config: StoreConfig,
    registry: Arc<DescriptorRegistry>,
    /// Types of every key this store has served, registered or not
    claims: DescriptorRegistry,
    /// `None` exactly when the store is `Failed`
    backend: Option<Box<dyn StorageBackend>>,
    state: StoreState,
    cache: Option<ValueCache>,
    /// Orders backend calls with the cache updates that follow them
    cache_gate: AsyncMutex<()>,
}

impl Store {
    /// Open a store, falling back to the file backend if the configured one
    /// cannot initialize
    ///
    /// Never fails; check [`Store::state`] to see which backend is active.
    pub async fn open(config: StoreConfig, registry: Arc<DescriptorRegistry>) -> Self {
        let subpath = config.subpath.as_deref();
        info!(
            "Opening store '{}' with {} backend under {:?}",
            config.store_name, config.backend, config.data_root
        );

        let primary = create_backend(config.backend, &config);
        let (backend, state) = if primary.initialize(&config.store_name, subpath).await {
            (Some(primary), StoreState::PrimaryReady(config.backend))
        } else if config.backend == BackendKind::File {
            error!(
                "Store '{}': file backend failed to initialize, store is unusable",
                config.store_name
            );
            (None, StoreState::Failed)
        } else {
            warn!(
                "Store '{}': {} backend failed to initialize, falling back to file backend",
                config.store_name, config.backend
            );
            let fallback = create_backend(BackendKind::File, &config);
            if fallback.initialize(&config.store_name, subpath).await {
                (Some(fallback), StoreState::FallbackReady)
            } else {
                error!(
                    "Store '{}': fallback file backend failed to initialize, store is unusable",
                    config.store_name
                );
                (None, StoreState::Failed)
            }
        };

        debug!("Store '{}' is {}", config.store_name, state);
        let cache = config.use_cache.then(ValueCache::new);
        Self {
            config,
            registry,
            claims: DescriptorRegistry::new(),
            backend,
            state,
            cache,
            cache_gate: AsyncMutex::new(()),
        }
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Kind of the backend serving requests, `None` when failed
    pub fn active_backend(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|backend| backend.kind())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    /// Cache counters, `None` when caching is disabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Read the value stored under a descriptor
    ///
    /// Absent keys, unreadable values and a failed store all yield `None`.
    pub async fn get<T: StorableValue>(&self, desc: &KeyDescriptor<T>) -> Option<T> {
        let backend = self.active("get", desc.key())?;
        if !self.admit(desc) {
            return None;
        }

        let _gate = match &self.cache {
            Some(cache) => {
                if let Some(value) = cache.get(desc.key()) {
                    debug!("Key '{}' found in cache", desc.key());
                    return decode(desc.key(), value);
                }
                Some(self.cache_gate.lock().await)
            }
            None => None,
        };

        match backend.get(desc.key()).await {
            Ok(Some(value)) if !value.is_null() => {
                let decoded = decode(desc.key(), value.clone())?;
                if let Some(cache) = &self.cache {
                    cache.insert(desc.key(), value);
                }
                Some(decoded)
            }
            Ok(_) => None,
            Err(e) => {
                error!("Failed to read key '{}': {}", desc.key(), e);
                None
            }
        }
    }

    /// Store a value under a descriptor, replacing any previous value
    pub async fn set<T: StorableValue>(&self, desc: &KeyDescriptor<T>, value: &T) -> bool {
        self.set_or_remove(desc, Some(value)).await
    }

    /// Remove the value stored under a descriptor
    ///
    /// Removing an absent key succeeds.
    pub async fn remove<T: StorableValue>(&self, desc: &KeyDescriptor<T>) -> bool {
        self.set_or_remove(desc, None).await
    }

    /// Store `Some(value)` or delete on `None`
    ///
    /// A value that serializes to `null` is removed instead. The cache is only
    /// updated once the backend has confirmed the write, and every cached
    /// entry above or below the key is dropped with it.
    pub async fn set_or_remove<T: StorableValue>(
        &self,
        desc: &KeyDescriptor<T>,
        value: Option<&T>,
    ) -> bool {
        let Some(backend) = self.active("set", desc.key()) else {
            return false;
        };
        if !self.admit(desc) {
            return false;
        }

        let encoded = match value.map(serde_json::to_value).transpose() {
            Ok(encoded) => encoded.filter(|value| !value.is_null()),
            Err(e) => {
                error!(
                    "Failed to serialize {} for key '{}': {}",
                    std::any::type_name::<T>(),
                    desc.key(),
                    e
                );
                return false;
            }
        };

        let _gate = match &self.cache {
            Some(_) => Some(self.cache_gate.lock().await),
            None => None,
        };
        if let Err(e) = backend.set(desc.key(), encoded.clone()).await {
            error!("Failed to write key '{}': {}", desc.key(), e);
            return false;
        }

        if let Some(cache) = &self.cache {
            cache.evict_tree(desc.key());
            if let Some(value) = encoded {
                cache.insert(desc.key(), value);
            }
        }
        true
    }

    /// Whether the store holds a readable value for `desc`
    pub async fn exists<T: StorableValue>(&self, desc: &KeyDescriptor<T>) -> bool {
        desc.exists(self).await
    }

    /// Write the descriptor's default if absent; returns whether it was written
    pub async fn initialize_default<T: StorableValue>(&self, desc: &KeyDescriptor<T>) -> bool {
        desc.initialize_default(self).await
    }

    /// Snapshot every registered key; returns whether all of them made it
    pub async fn backup(&self) -> bool {
        self.backup_report().await.is_complete()
    }

    /// Snapshot every registered key into the backup file
    ///
    /// The snapshot is cleared first, so afterwards it holds exactly the
    /// registered keys that currently have a value. Keys that cannot be read
    /// are skipped and logged; the run continues.
    pub async fn backup_report(&self) -> BackupReport {
        let keys = self.registry.keys();
        let target = match YamlBackend::document_path(
            &self.config.data_root,
            &self.config.store_name,
            Some(&self.config.backup_subpath),
        ) {
            Ok(path) => path,
            Err(e) => {
                error!("Backup of store '{}' failed: {}", self.config.store_name, e);
                return BackupReport::aborted(PathBuf::new(), keys);
            }
        };

        let Some(backend) = self.backend.as_ref() else {
            error!(
                "Store '{}' is unusable, cannot back up {} keys",
                self.config.store_name,
                keys.len()
            );
            return BackupReport::aborted(target, keys);
        };

        if backend.kind() == BackendKind::File
            && self.config.file_subpath() == self.config.backup_subpath
        {
            error!(
                "Backup target {:?} is the live store file, refusing to overwrite it",
                target
            );
            return BackupReport::aborted(target, keys);
        }

        let snapshot = YamlBackend::new(&self.config.data_root);
        if !snapshot
            .initialize(&self.config.store_name, Some(&self.config.backup_subpath))
            .await
        {
            error!("Backup target {:?} could not be opened", target);
            return BackupReport::aborted(target, keys);
        }
        if let Err(e) = snapshot.clear().await {
            error!("Failed to reset backup target {:?}: {}", target, e);
            snapshot.close();
            return BackupReport::aborted(target, keys);
        }

        info!("Backing up {} keys to {:?}", keys.len(), target);
        let mut report = BackupReport::aborted(target, Vec::new());
        for key in keys {
            let value: Option<StoredValue> = match backend.get(&key).await {
                Ok(value) => value,
                Err(e) => {
                    error!("Skipping key '{}' in backup, read failed: {}", key, e);
                    report.skipped.push(key);
                    continue;
                }
            };
            match snapshot.set(&key, value).await {
                Ok(()) => report.backed_up.push(key),
                Err(e) => {
                    error!("Failed to write key '{}' to backup: {}", key, e);
                    report.failed.push(key);
                }
            }
        }
        snapshot.close();
        report.completed_at = Utc::now();

        info!(
            "Backup finished: {} backed up, {} skipped, {} failed",
            report.backed_up.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    /// Release the backend; later operations fail and log
    pub fn close(&self) {
        if let Some(backend) = &self.backend {
            backend.close();
            debug!("Store '{}' closed", self.config.store_name);
        }
    }

    /// Whether `desc` may use its key with its value type
    fn admit<T: StorableValue>(&self, desc: &KeyDescriptor<T>) -> bool {
        let checked = self
            .registry
            .check::<T>(desc.key())
            .and_then(|()| self.claims.claim::<T>(desc.key()).map(|_| ()));
        match checked {
            Ok(()) => true,
            Err(e) => {
                error!("Store '{}' refused descriptor: {}", self.config.store_name, e);
                false
            }
        }
    }

    fn active(&self, operation: &str, key: &str) -> Option<&dyn StorageBackend> {
        match &self.backend {
            Some(backend) => Some(backend.as_ref()),
            None => {
                error!(
                    "Store '{}' is unusable, cannot {} key '{}'",
                    self.config.store_name, operation, key
                );
                None
            }
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.close();
    }
}

fn decode<T: StorableValue>(key: &str, value: StoredValue) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            error!(
                "Failed to deserialize key '{}' as {}: {}",
                key,
                std::any::type_name::<T>(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir, kind: BackendKind, cache: bool) -> Store {
        let config = StoreConfig::new(dir.path(), kind, "unit").with_cache(cache);
        Store::open(config, Arc::new(DescriptorRegistry::new())).await
    }

    #[tokio::test]
    async fn test_primary_ready() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, BackendKind::Relational, false).await;
        assert_eq!(store.state(), StoreState::PrimaryReady(BackendKind::Relational));
        assert_eq!(store.active_backend(), Some(BackendKind::Relational));
        assert!(store.cache_stats().is_none());
    }

    #[tokio::test]
    async fn test_cache_fills_on_read_and_evicts_on_remove() {
        let dir = TempDir::new().unwrap();
        let desc = KeyDescriptor::new("motd", String::new);
        {
            let store = open_store(&dir, BackendKind::File, false).await;
            assert!(store.set(&desc, &"hello".to_string()).await);
        }

        let store = open_store(&dir, BackendKind::File, true).await;
        assert_eq!(store.get(&desc).await.as_deref(), Some("hello"));
        assert_eq!(store.get(&desc).await.as_deref(), Some("hello"));
        let stats = store.cache_stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);

        assert!(store.remove(&desc).await);
        assert!(store.get(&desc).await.is_none());
        assert_eq!(store.cache_stats().unwrap().evictions, 1);
    }

    #[tokio::test]
    async fn test_descriptor_with_conflicting_type_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, BackendKind::File, false).await;
        let text = KeyDescriptor::new("value", String::new);
        let number = KeyDescriptor::new("value", || 0_i64);

        assert!(store.set(&text, &"not a number".to_string()).await);
        assert!(!store.set(&number, &5).await);
        assert!(!store.remove(&number).await);
        assert!(store.get(&number).await.is_none());
        assert_eq!(store.get(&text).await.as_deref(), Some("not a number"));
    }

    #[tokio::test]
    async fn test_registered_type_wins_over_ad_hoc_descriptor() {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(DescriptorRegistry::new());
        let counter = registry.register("counter", || 0_i64).unwrap();
        let config = StoreConfig::new(dir.path(), BackendKind::Relational, "unit");
        let store = Store::open(config, Arc::clone(&registry)).await;

        let text = KeyDescriptor::new("counter", String::new);
        assert!(!store.set(&text, &"seven".to_string()).await);
        assert!(store.get(&text).await.is_none());

        assert!(store.set(&counter, &7).await);
        assert_eq!(store.get(&counter).await, Some(7));
        assert_eq!(registry.keys(), vec!["counter"]);
    }

    #[tokio::test]
    async fn test_null_write_removes_key() {
        for kind in [BackendKind::File, BackendKind::Relational] {
            let dir = TempDir::new().unwrap();
            let store = open_store(&dir, kind, true).await;
            let nickname = KeyDescriptor::new("nickname", || Some("steve".to_string()));

            assert!(store.set(&nickname, &Some("alex".to_string())).await);
            assert!(store.set(&nickname, &None).await);
            assert_eq!(store.get(&nickname).await, None, "{}", kind);
            assert_eq!(store.cache_stats().unwrap().insertions, 1);
        }
    }

    #[tokio::test]
    async fn test_operations_after_close_fail() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, BackendKind::Relational, false).await;
        let desc = KeyDescriptor::new("counter", || 0_i64);
        store.close();
        assert!(!store.set(&desc, &1).await);
        assert!(store.get(&desc).await.is_none());
    }

    #[tokio::test]
    async fn test_backup_refuses_to_overwrite_live_file() {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(DescriptorRegistry::new());
        let desc = registry.register("counter", || 0_i64).unwrap();
        let config = StoreConfig::new(dir.path(), BackendKind::File, "unit")
            .with_subpath("shared")
            .with_backup_subpath("shared");
        let store = Store::open(config, registry).await;
        assert!(store.set(&desc, &7).await);

        let report = store.backup_report().await;
        assert!(!report.is_complete());
        assert_eq!(report.failed, vec!["counter"]);
        assert_eq!(store.get(&desc).await, Some(7));
    }
}
