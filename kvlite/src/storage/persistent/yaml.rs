// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! YAML file backend implementation
//!
//! One YAML document per store, at `<data_root>/<subpath>/<store_name>.yml`.
//! Keys are dotted paths into the document tree. Reads are served from the
//! in-memory document; every write mutates it and rewrites the whole file
//! while holding the document's write lock, so two writers on one instance
//! can never interleave their rewrites.

use super::traits::{StorageBackend, StoredValue};
use super::types::{validate_key, BackendError, BackendKind, BackendResult};
use async_trait::async_trait;
use log::{debug, error, trace, warn};
use parking_lot::RwLock;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Subdirectory of the data root used when no subpath is given
pub const DEFAULT_SUBPATH: &str = "yml-storage";

/// Document written when a store file does not exist yet
const DEFAULT_TEMPLATE: &str = include_str!("../../../resources/default_store.yml");

/// Loaded document and the file it came from
struct YamlDocument {
    path: PathBuf,
    root: Value,
}

impl YamlDocument {
    /// Open the document at `path`, seeding it from the template if missing
    fn open(path: PathBuf) -> BackendResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            debug!("Creating {:?} from default template", path);
            std::fs::write(&path, DEFAULT_TEMPLATE)?;
        }
        let root = Self::parse(&path)?;
        Ok(Self { path, root })
    }

    fn parse(path: &Path) -> BackendResult<Value> {
        let text = std::fs::read_to_string(path)?;
        match serde_yaml::from_str::<Value>(&text)? {
            Value::Null => Ok(Value::Mapping(Mapping::new())),
            root @ Value::Mapping(_) => Ok(root),
            _ => Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{:?} does not contain a YAML mapping", path),
            ))),
        }
    }

    /// Rewrite the whole file from the in-memory document
    fn save(&self) -> BackendResult<()> {
        let text = serde_yaml::to_string(&self.root)?;
        let staging = self.path.with_extension("yml.tmp");
        std::fs::write(&staging, text)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn reload(&mut self) -> BackendResult<()> {
        let fresh = Self::open(self.path.clone())?;
        self.root = fresh.root;
        Ok(())
    }

    /// Apply `mutate` and save; on a failed save the mutation is undone
    fn commit<F>(&mut self, mutate: F) -> BackendResult<()>
    where
        F: FnOnce(&mut Value),
    {
        let snapshot = self.root.clone();
        mutate(&mut self.root);
        if let Err(e) = self.save() {
            self.root = snapshot;
            return Err(e);
        }
        Ok(())
    }
}

/// File backend storing one YAML document per store
pub struct YamlBackend {
    data_root: PathBuf,
    document: Arc<RwLock<Option<YamlDocument>>>,
}

impl YamlBackend {
    /// Create an uninitialized backend rooted at `data_root`
    pub fn new<P: Into<PathBuf>>(data_root: P) -> Self {
        Self {
            data_root: data_root.into(),
            document: Arc::new(RwLock::new(None)),
        }
    }

    /// Resolve the file a store lives in
    ///
    /// A store name without an extension gets `.yml` appended.
    pub fn document_path(
        data_root: &Path,
        store_name: &str,
        subpath: Option<&str>,
    ) -> BackendResult<PathBuf> {
        if store_name.is_empty() || store_name.contains(['/', '\\']) || store_name == ".." {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid store name '{}'", store_name),
            )));
        }
        let dir = data_root.join(subpath.unwrap_or(DEFAULT_SUBPATH));
        let file = if Path::new(store_name).extension().is_some() {
            store_name.to_string()
        } else {
            format!("{}.yml", store_name)
        };
        Ok(dir.join(file))
    }

    /// Path of the open document, if initialized
    pub fn path(&self) -> Option<PathBuf> {
        self.document.read().as_ref().map(|doc| doc.path.clone())
    }

    /// Rewrite the file from the in-memory document
    pub async fn save(&self) -> BackendResult<()> {
        self.with_document(|doc| doc.save()).await
    }

    /// Discard in-memory state and re-read the file, picking up external edits
    pub async fn reload(&self) -> BackendResult<()> {
        self.with_document(|doc| doc.reload()).await
    }

    /// Get the mapping at a dotted path, creating (and saving) it if absent
    ///
    /// A non-mapping value already at `path` is replaced by an empty mapping.
    pub async fn section(&self, path: &str) -> BackendResult<Mapping> {
        validate_key(path)?;
        let path = path.to_string();
        self.with_document(move |doc| {
            match lookup(&doc.root, &path) {
                Some(Value::Mapping(section)) => return Ok(section.clone()),
                Some(Value::Null) | None => {}
                Some(_) => warn!("Replacing non-mapping value at '{}' with a section", path),
            }
            doc.commit(|root| {
                assign(root, &path, Value::Mapping(Mapping::new()));
            })?;
            Ok(Mapping::new())
        })
        .await
    }

    /// Run `f` on the document under the write lock, off the async executor
    async fn with_document<R, F>(&self, f: F) -> BackendResult<R>
    where
        F: FnOnce(&mut YamlDocument) -> BackendResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let document = Arc::clone(&self.document);
        tokio::task::spawn_blocking(move || {
            let mut guard = document.write();
            let doc = guard.as_mut().ok_or(BackendError::NotInitialized)?;
            f(doc)
        })
        .await?
    }

    async fn try_initialize(&self, path: PathBuf) -> BackendResult<()> {
        let document = Arc::clone(&self.document);
        tokio::task::spawn_blocking(move || {
            let mut guard = document.write();
            if let Some(existing) = guard.as_ref() {
                if existing.path == path {
                    return Ok(());
                }
                existing.save()?;
            }
            *guard = Some(YamlDocument::open(path)?);
            Ok(())
        })
        .await?
    }
}

#[async_trait]
impl StorageBackend for YamlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    async fn initialize(&self, store_name: &str, subpath: Option<&str>) -> bool {
        let path = match Self::document_path(&self.data_root, store_name, subpath) {
            Ok(path) => path,
            Err(e) => {
                error!("[YamlBackend] Failed to initialize '{}': {}", store_name, e);
                return false;
            }
        };
        debug!("[YamlBackend] Initializing store '{}' at {:?}", store_name, path);
        match self.try_initialize(path.clone()).await {
            Ok(()) => {
                trace!("[YamlBackend] {:?} loaded successfully", path);
                true
            }
            Err(e) => {
                error!("[YamlBackend] {:?} failed to load: {}", path, e);
                false
            }
        }
    }

    async fn set(&self, key: &str, value: Option<StoredValue>) -> BackendResult<()> {
        validate_key(key)?;
        let key = key.to_string();
        let value = value
            .filter(|v| !v.is_null())
            .map(|v| serde_yaml::to_value(&v))
            .transpose()?;
        self.with_document(move |doc| {
            doc.commit(|root| match value {
                Some(value) => {
                    assign(root, &key, value);
                }
                None => {
                    unassign(root, &key);
                }
            })
        })
        .await
    }

    async fn get(&self, key: &str) -> BackendResult<Option<StoredValue>> {
        validate_key(key)?;
        let key = key.to_string();
        let document = Arc::clone(&self.document);
        tokio::task::spawn_blocking(move || {
            let guard = document.read();
            let doc = guard.as_ref().ok_or(BackendError::NotInitialized)?;
            match lookup(&doc.root, &key) {
                None | Some(Value::Null) => Ok(None),
                Some(value) => Ok(Some(serde_json::to_value(value)?)),
            }
        })
        .await?
    }

    async fn clear(&self) -> BackendResult<()> {
        self.with_document(|doc| doc.commit(|root| *root = Value::Mapping(Mapping::new())))
            .await
    }

    fn is_ready(&self) -> bool {
        self.document.read().is_some()
    }

    fn close(&self) {
        let mut guard = self.document.write();
        if let Some(doc) = guard.take() {
            match doc.save() {
                Ok(()) => debug!("[YamlBackend] Closed {:?}", doc.path),
                Err(e) => error!("[YamlBackend] Final save of {:?} failed: {}", doc.path, e),
            }
        }
    }
}

/// Follow a dotted path; `None` if any segment is missing or not a mapping
fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(root, |node, segment| node.as_mapping()?.get(segment))
}

/// Turn `node` into a mapping if it is anything else, and borrow it as one
fn ensure_mapping(node: &mut Value) -> &mut Mapping {
    if !node.is_mapping() {
        *node = Value::Mapping(Mapping::new());
    }
    match node {
        Value::Mapping(map) => map,
        _ => unreachable!("node was just replaced by a mapping"),
    }
}

/// Write `value` at a dotted path, creating intermediate mappings
///
/// Returns the value previously stored at the path.
fn assign(root: &mut Value, key: &str, value: Value) -> Option<Value> {
    let mut node = root;
    let mut segments = key.split('.').peekable();
    while let Some(segment) = segments.next() {
        let map = ensure_mapping(node);
        let segment = Value::String(segment.to_string());
        if segments.peek().is_none() {
            return map.insert(segment, value);
        }
        node = map.entry(segment).or_insert(Value::Null);
    }
    None
}

/// Remove the value at a dotted path, leaving parent mappings in place
fn unassign(root: &mut Value, key: &str) -> Option<Value> {
    let mut node = root;
    let mut segments = key.split('.').peekable();
    while let Some(segment) = segments.next() {
        let map = node.as_mapping_mut()?;
        if segments.peek().is_none() {
            return map.remove(segment);
        }
        node = map.get_mut(segment)?;
    }
    None
}
