//! td CLI
//!
//! Command-line interface for td - a local mirror of your topics.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use td_core::{Config, HttpTopicServer, Mirror, MirrorError, StorageError};

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "td")]
#[command(about = "td - Edit your topics locally and keep them in sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log debug information to stderr (or the configured log file)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, edit the topics in your editor, then push (default)
    Edit,
    /// Fetch all the topics from the server
    Fetch,
    /// Push all the local topics to the server
    Push,
    /// List the available topics
    #[command(alias = "ls")]
    List,
    /// Show the topics with unpushed changes
    Status,
    /// Create a new topic
    #[command(alias = "add")]
    Create {
        /// Name of the topic
        name: String,
    },
    /// Delete a topic
    #[command(alias = "rm")]
    Delete {
        /// Name of the topic
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Rename a topic
    #[command(alias = "mv")]
    Rename {
        /// Current name of the topic
        old_name: String,
        /// New name of the topic
        new_name: String,
    },
    /// Remove the local mirror and forget the session token
    Logout,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (mirror_dir, server, token, timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &output) {
        eprintln!("td: {:#}", e);
        if let Some(hint) = error_hint(&e) {
            eprintln!("hint: {}", hint);
        }
        std::process::exit(1);
    }
}

/// Suggestion printed after an error, when td knows of one
fn error_hint(error: &anyhow::Error) -> Option<&'static str> {
    if let Some(e) = error.downcast_ref::<MirrorError>() {
        return e.hint();
    }
    if let Some(e) = error.downcast_ref::<StorageError>() {
        return e.recovery_suggestion();
    }
    None
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands must work even with a broken config file
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let config = Config::load_with_cli_override(config_path)?;
    init_logging(&config, cli.verbose);
    debug!(mirror_dir = ?config.mirror_dir, "configuration loaded");

    match cli.command.unwrap_or(Commands::Edit) {
        Commands::Config { .. } => Ok(()), // Handled above
        Commands::Status => commands::status::show(&config, output),
        Commands::List => commands::topic::list(&config, output),
        Commands::Logout => logout(&config, config_path, output),
        Commands::Edit => commands::sync::edit(&commands::open_mirror(&config)?, output),
        Commands::Fetch => commands::sync::fetch(&commands::open_mirror(&config)?, output),
        Commands::Push => commands::sync::push(&commands::open_mirror(&config)?, output),
        Commands::Create { name } => {
            commands::topic::create(&commands::open_mirror(&config)?, name, output)
        }
        Commands::Delete { name, yes } => {
            commands::topic::delete(&commands::open_mirror(&config)?, name, yes, output)
        }
        Commands::Rename { old_name, new_name } => commands::topic::rename(
            &commands::open_mirror(&config)?,
            old_name,
            new_name,
            output,
        ),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Remove the local mirror and the stored token
fn logout(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let mirror = Mirror::new(config, HttpTopicServer::from_config(config)?);
    mirror.destroy()?;
    commands::config::clear_token(config_path)?;
    output.success("Logged out");
    Ok(())
}

/// Initialize logging
///
/// `TD_LOG` takes full filter directives; otherwise only td's own crates
/// log, at `warn` (or `debug` with --verbose). Logs go to stderr unless a
/// log file is configured.
fn init_logging(config: &Config, verbose: bool) {
    let env_filter = match std::env::var("TD_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => {
            let level = if verbose { "debug" } else { "warn" };
            EnvFilter::new(format!("td_core={},td_cli={}", level, level))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if let Some(ref log_path) = config.log_file {
        match File::create(log_path) {
            Ok(file) => {
                let _ = builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = builder.with_writer(std::io::stderr).try_init();
}
