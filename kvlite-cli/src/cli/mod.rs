// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for KvLite
//!
//! Provides one-off get/set/remove commands, backups and store inspection.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands};
pub use handlers::{handle_backup, handle_get, handle_info, handle_remove, handle_set};
