//! Store fixture for KvLite integration tests
//!
//! Uses ONLY the public crate API.

#![allow(dead_code)]

use kvlite::{BackendKind, DescriptorRegistry, Store, StoreConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Nested record used across tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub level: u32,
    pub position: Position,
    pub inventory: Vec<String>,
    pub flags: BTreeMap<String, bool>,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub fn sample_profile(name: &str) -> PlayerProfile {
    let mut flags = BTreeMap::new();
    flags.insert("muted".to_string(), false);
    flags.insert("vip".to_string(), true);
    PlayerProfile {
        name: name.to_string(),
        level: 17,
        position: Position {
            world: "overworld".to_string(),
            x: 12.5,
            y: 64.0,
            z: -3.25,
        },
        inventory: vec!["sword".to_string(), "torch".to_string()],
        flags,
        nickname: None,
    }
}

/// Route library logs through the test harness; `RUST_LOG=debug` shows them
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Store with an isolated data root
pub struct StoreFixture {
    pub store: Store,
    pub registry: Arc<DescriptorRegistry>,
    pub config: StoreConfig,
    temp_dir: TempDir,
}

impl StoreFixture {
    /// Open a store of `kind` named `store_name` in a fresh data root
    pub async fn new(kind: BackendKind, store_name: &str) -> Self {
        Self::with_config(kind, store_name, |config| config).await
    }

    /// Like [`StoreFixture::new`], letting the test adjust the config first
    pub async fn with_config<F>(kind: BackendKind, store_name: &str, adjust: F) -> Self
    where
        F: FnOnce(StoreConfig) -> StoreConfig,
    {
        init_logging();
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = adjust(StoreConfig::new(temp_dir.path(), kind, store_name));
        let registry = Arc::new(DescriptorRegistry::new());
        let store = Store::open(config.clone(), Arc::clone(&registry)).await;
        Self {
            store,
            registry,
            config,
            temp_dir,
        }
    }

    pub fn data_root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Close the store and open it again from disk
    pub async fn reopen(&mut self) {
        self.store.close();
        self.store = Store::open(self.config.clone(), Arc::clone(&self.registry)).await;
    }

    /// Open a second store over the backup snapshot of this one
    pub async fn open_backup(&self) -> Store {
        let config = StoreConfig::new(
            self.data_root(),
            BackendKind::File,
            self.config.store_name.clone(),
        )
        .with_subpath(self.config.backup_subpath.clone());
        Store::open(config, Arc::new(DescriptorRegistry::new())).await
    }
}
