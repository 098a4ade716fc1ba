// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! SQLite backend implementation
//!
//! Stores every key in a single two-column table:
//!
//! ```text
//! key_value(key VARCHAR(255) PRIMARY KEY, value TEXT NOT NULL)
//! ```
//!
//! Values are stored as JSON text so the on-disk format is readable with any
//! SQLite client and independent of in-memory layout. The database is a
//! single embedded file; there is no server and no authentication.

use super::traits::{StorageBackend, StoredValue};
use super::types::{validate_key, BackendError, BackendKind, BackendResult};
use async_trait::async_trait;
use log::{debug, error, trace};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the only table the backend uses
pub const TABLE_NAME: &str = "key_value";

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS key_value (\
     key VARCHAR(255) NOT NULL PRIMARY KEY, \
     value TEXT NOT NULL)";
const TABLE_EXISTS_SQL: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";
const UPSERT_SQL: &str = "INSERT INTO key_value (key, value) VALUES (?1, ?2) \
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";
const DELETE_SQL: &str = "DELETE FROM key_value WHERE key = ?1";
const SELECT_SQL: &str = "SELECT value FROM key_value WHERE key = ?1";
const CLEAR_SQL: &str = "DELETE FROM key_value";
const COUNT_SQL: &str = "SELECT COUNT(*) FROM key_value";

/// Relational backend over an embedded SQLite file
pub struct SqliteBackend {
    database_dir: PathBuf,
    connection: Arc<Mutex<Option<Connection>>>,
}

impl SqliteBackend {
    /// Create an uninitialized backend whose database lives in `database_dir`
    pub fn new<P: Into<PathBuf>>(database_dir: P) -> Self {
        Self {
            database_dir: database_dir.into(),
            connection: Arc::new(Mutex::new(None)),
        }
    }

    /// Resolve the database file for a store
    ///
    /// A store name without an extension gets `.db` appended.
    pub fn database_path(database_dir: &Path, store_name: &str) -> BackendResult<PathBuf> {
        if store_name.is_empty() || store_name.contains(['/', '\\']) || store_name == ".." {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid store name '{}'", store_name),
            )));
        }
        let file = if Path::new(store_name).extension().is_some() {
            store_name.to_string()
        } else {
            format!("{}.db", store_name)
        };
        Ok(database_dir.join(file))
    }

    /// Delete every row, returning how many were removed
    pub async fn clear_rows(&self) -> BackendResult<usize> {
        self.with_connection(|conn| Ok(conn.execute(CLEAR_SQL, [])?))
            .await
    }

    /// Number of stored keys
    pub async fn len(&self) -> BackendResult<usize> {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row(COUNT_SQL, [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    /// Whether the table holds no rows
    pub async fn is_empty(&self) -> BackendResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Run `f` against the connection under its lock, off the async executor
    async fn with_connection<R, F>(&self, f: F) -> BackendResult<R>
    where
        F: FnOnce(&Connection) -> BackendResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let guard = connection.lock();
            let conn = guard.as_ref().ok_or(BackendError::NotInitialized)?;
            f(conn)
        })
        .await?
    }

    /// Open the database if needed and create the table; returns whether
    /// the table was newly created
    async fn try_initialize(&self, path: PathBuf) -> BackendResult<bool> {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let mut guard = connection.lock();
            if guard.is_none() {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(&path)?;
                let mode: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                trace!("[SqliteBackend] {:?} journal mode: {}", path, mode);
                *guard = Some(conn);
            }
            let conn = guard.as_ref().ok_or(BackendError::NotInitialized)?;
            let existing: i64 = conn.query_row(TABLE_EXISTS_SQL, params![TABLE_NAME], |row| {
                row.get(0)
            })?;
            conn.execute(CREATE_TABLE_SQL, [])?;
            Ok(existing == 0)
        })
        .await?
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn initialize(&self, store_name: &str, _subpath: Option<&str>) -> bool {
        let path = match Self::database_path(&self.database_dir, store_name) {
            Ok(path) => path,
            Err(e) => {
                error!("[SqliteBackend] Failed to initialize '{}': {}", store_name, e);
                return false;
            }
        };
        debug!("[SqliteBackend] Opening database at {:?}", path);
        match self.try_initialize(path.clone()).await {
            Ok(true) => {
                debug!("[SqliteBackend] Created table `{}` in {:?}", TABLE_NAME, path);
                true
            }
            Ok(false) => {
                trace!("[SqliteBackend] Found table `{}` in {:?}", TABLE_NAME, path);
                true
            }
            Err(e) => {
                error!(
                    "[SqliteBackend] Initializing the database at {:?} failed: {}",
                    path, e
                );
                false
            }
        }
    }

    async fn set(&self, key: &str, value: Option<StoredValue>) -> BackendResult<()> {
        validate_key(key)?;
        let key = key.to_string();
        let text = value
            .filter(|v| !v.is_null())
            .map(|v| serde_json::to_string(&v))
            .transpose()?;
        self.with_connection(move |conn| {
            match text {
                Some(text) => conn.prepare_cached(UPSERT_SQL)?.execute(params![key, text])?,
                None => conn.prepare_cached(DELETE_SQL)?.execute(params![key])?,
            };
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &str) -> BackendResult<Option<StoredValue>> {
        validate_key(key)?;
        let key = key.to_string();
        let text = self
            .with_connection(move |conn| {
                let text = conn
                    .prepare_cached(SELECT_SQL)?
                    .query_row(params![key], |row| row.get::<_, String>(0))
                    .optional()?;
                Ok(text)
            })
            .await?;
        match text {
            Some(text) => match serde_json::from_str(&text)? {
                StoredValue::Null => Ok(None),
                value => Ok(Some(value)),
            },
            None => Ok(None),
        }
    }

    async fn clear(&self) -> BackendResult<()> {
        let removed = self.clear_rows().await?;
        debug!("[SqliteBackend] Cleared {} rows", removed);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connection.lock().is_some()
    }

    fn close(&self) {
        let mut guard = self.connection.lock();
        if let Some(conn) = guard.take() {
            match conn.close() {
                Ok(()) => debug!("[SqliteBackend] Connection closed"),
                Err((_, e)) => error!("[SqliteBackend] Closing the connection failed: {}", e),
            }
        }
    }
}
