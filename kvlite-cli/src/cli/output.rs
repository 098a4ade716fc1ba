// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Formatting for CLI output

use colored::*;
use kvlite::{BackupReport, Store, StoreState};
use serde_json::Value;

/// Pretty-print a stored value as JSON
pub fn format_value(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

pub fn format_backup_report(report: &BackupReport) -> String {
    let mut output = String::new();
    let title = if report.is_complete() {
        "Backup complete".bold().green()
    } else {
        "Backup incomplete".bold().yellow()
    };
    output.push_str(&format!("{}\n", title));
    output.push_str(&format!("Target: {}\n", report.target.display()));
    output.push_str(&format!(
        "Finished at: {}\n",
        report.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Backed up: {}\n", report.backed_up.len()));

    if !report.skipped.is_empty() {
        output.push_str(&format!("\n{}\n", "Skipped (unreadable):".bold().yellow()));
        for key in &report.skipped {
            output.push_str(&format!("  - {}\n", key.yellow()));
        }
    }
    if !report.failed.is_empty() {
        output.push_str(&format!("\n{}\n", "Failed:".bold().red()));
        for key in &report.failed {
            output.push_str(&format!("  - {}\n", key.red()));
        }
    }
    output
}

pub fn format_info(store: &Store) -> String {
    let config = store.config();
    let state = match store.state() {
        StoreState::Failed => store.state().to_string().red(),
        StoreState::FallbackReady => store.state().to_string().yellow(),
        StoreState::PrimaryReady(_) => store.state().to_string().green(),
    };
    let active = store
        .active_backend()
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "none".to_string());

    let mut output = String::new();
    output.push_str(&format!("{} {}\n", "KvLite".bold().green(), kvlite::VERSION));
    output.push_str(&format!("Store:      {}\n", config.store_name.bold()));
    output.push_str(&format!("State:      {}\n", state));
    output.push_str(&format!("Configured: {}\n", config.backend));
    output.push_str(&format!("Active:     {}\n", active));
    output.push_str(&format!("Data root:  {}\n", config.data_root.display()));
    output.push_str(&format!(
        "Cache:      {}\n",
        if config.use_cache { "on" } else { "off" }
    ));
    output
}
