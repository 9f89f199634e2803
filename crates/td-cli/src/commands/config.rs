//! Config command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use td_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "mirror_dir": config.mirror_dir,
                    "server": config.server,
                    "token": config.token.as_ref().map(|_| "(set)"),
                    "timeout_secs": config.timeout_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.mirror_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  mirror_dir:   {}", config.mirror_dir.display());
            println!(
                "  server:       {}",
                config.server.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  token:        {}",
                if config.token.is_some() {
                    "(set)"
                } else {
                    "(not set)"
                }
            );
            println!("  timeout_secs: {}", config.timeout_secs);
            println!(
                "  log_file:     {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
///
/// Only the file is rewritten; `TD_*` environment values are left out.
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    let mut config = Config::load_file(&save_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "token" { "(set)" } else { value.as_str() };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

/// Forget the session token, keeping the rest of the configuration
pub fn clear_token(config_path: Option<&PathBuf>) -> Result<()> {
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    if !save_path.exists() {
        return Ok(());
    }

    let mut config = Config::load_file(&save_path).context("Failed to load configuration")?;
    if config.token.take().is_some() {
        config
            .save_to_path(&save_path)
            .context("Failed to save configuration")?;
    }
    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "mirror_dir" => {
            config.mirror_dir = Path::new(value).to_path_buf();
        }
        "server" => {
            config.server = optional(value);
        }
        "token" => {
            config.token = optional(value);
        }
        "timeout_secs" => {
            let secs: u64 = value
                .parse()
                .context("Invalid value for timeout_secs. Use a number of seconds.")?;
            if secs == 0 {
                bail!("timeout_secs must be at least 1");
            }
            config.timeout_secs = secs;
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: mirror_dir, server, token, timeout_secs, log_file",
                key
            );
        }
    }
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}
