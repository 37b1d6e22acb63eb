// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use super::print_json;
use crate::cli::{ConfigCommand, OutputFormat};
use crate::config::Config;
use crate::error::Result;

pub fn run(command: ConfigCommand, data_dir: &Path, output: OutputFormat) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = effective(Config::load(data_dir)?);
            match output {
                OutputFormat::Json => print_json(&config),
                OutputFormat::Text => {
                    print!("{}", config.to_toml()?);
                    Ok(())
                }
            }
        }
        ConfigCommand::Path => {
            match output {
                OutputFormat::Json => print_json(&serde_json::json!({ "data_dir": data_dir }))?,
                OutputFormat::Text => println!("{}", data_dir.display()),
            }
            Ok(())
        }
    }
}

/// The loaded config with the built-in rate limits filled in.
pub(crate) fn effective(mut config: Config) -> Config {
    config.rate_limits = config.effective_rate_limits();
    config
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
