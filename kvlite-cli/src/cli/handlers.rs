// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Command handlers
//!
//! Every key handled here is a JSON value, so any stored shape can be
//! printed or replaced.

use super::output;
use colored::Colorize;
use kvlite::{DescriptorRegistry, KeyDescriptor, Store, StoreConfig, StoreState};
use serde_json::Value;
use std::sync::Arc;

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

/// Open the configured store, refusing to continue if it failed
pub async fn open_store(
    config: StoreConfig,
    registry: Arc<DescriptorRegistry>,
) -> Result<Store, Box<dyn std::error::Error>> {
    let store = Store::open(config, registry).await;
    if store.state() == StoreState::Failed {
        return Err(format!(
            "store '{}' could not be opened under {:?}",
            store.config().store_name,
            store.config().data_root
        )
        .into());
    }
    if store.state() == StoreState::FallbackReady {
        eprintln!(
            "{}",
            format!(
                "warning: {} backend unavailable, using the file backend",
                store.config().backend
            )
            .yellow()
        );
    }
    Ok(store)
}

fn json_key(
    registry: &DescriptorRegistry,
    key: &str,
) -> Result<KeyDescriptor<Value>, Box<dyn std::error::Error>> {
    Ok(registry.register(key, || Value::Null)?)
}

/// Parse a command-line value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub async fn handle_get(config: StoreConfig, key: String) -> HandlerResult {
    let registry = Arc::new(DescriptorRegistry::new());
    let desc = json_key(&registry, &key)?;
    let store = open_store(config, registry).await?;
    match store.get(&desc).await {
        Some(value) => {
            println!("{}", output::format_value(&value)?);
            Ok(())
        }
        None => Err(format!("key '{}' not found", key).into()),
    }
}

pub async fn handle_set(config: StoreConfig, key: String, raw: String) -> HandlerResult {
    let registry = Arc::new(DescriptorRegistry::new());
    let desc = json_key(&registry, &key)?;
    let store = open_store(config, registry).await?;
    if store.set(&desc, &parse_value(&raw)).await {
        println!("{} {}", "✓ Stored".green(), key.bold());
        Ok(())
    } else {
        Err(format!("failed to store '{}'", key).into())
    }
}

pub async fn handle_remove(config: StoreConfig, key: String) -> HandlerResult {
    let registry = Arc::new(DescriptorRegistry::new());
    let desc = json_key(&registry, &key)?;
    let store = open_store(config, registry).await?;
    if store.remove(&desc).await {
        println!("{} {}", "✓ Removed".green(), key.bold());
        Ok(())
    } else {
        Err(format!("failed to remove '{}'", key).into())
    }
}

pub async fn handle_backup(config: StoreConfig, keys: Vec<String>) -> HandlerResult {
    let registry = Arc::new(DescriptorRegistry::new());
    for key in &keys {
        json_key(&registry, key)?;
    }
    let store = open_store(config, registry).await?;
    let report = store.backup_report().await;
    print!("{}", output::format_backup_report(&report));
    if report.is_complete() {
        Ok(())
    } else {
        Err("backup incomplete".into())
    }
}

pub async fn handle_info(config: StoreConfig) -> HandlerResult {
    let store = Store::open(config, Arc::new(DescriptorRegistry::new())).await;
    print!("{}", output::format_info(&store));
    Ok(())
}
