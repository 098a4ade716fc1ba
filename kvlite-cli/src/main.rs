// Copyright (c) 2025 KvLite Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! KvLite CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments first to get log level
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        // Default to Warn (can still be overridden by RUST_LOG env var)
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if cli.command == Commands::Version {
        println!("{} {}", "KvLite".bold().green(), kvlite::VERSION);
        println!("Typed embedded key-value store");
        return Ok(());
    }

    let config = cli.store_config()?;
    match cli.command {
        Commands::Get { key } => cli::handle_get(config, key).await,
        Commands::Set { key, value } => cli::handle_set(config, key, value).await,
        Commands::Remove { key } => cli::handle_remove(config, key).await,
        Commands::Backup { keys } => cli::handle_backup(config, keys).await,
        Commands::Info => cli::handle_info(config).await,
        Commands::Version => Ok(()),
    }
}
