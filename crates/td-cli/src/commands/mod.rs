//! Command handlers

pub mod config;
pub mod status;
pub mod sync;
pub mod topic;

use anyhow::{Context, Result};

use td_core::{Config, HttpTopicServer, Mirror};

/// Open the mirror against the configured server
pub fn open_mirror(config: &Config) -> Result<Mirror<HttpTopicServer>> {
    let server = HttpTopicServer::from_config(config)?;
    let mirror = Mirror::new(config, server);
    mirror
        .initialize()
        .context("Failed to initialize the local mirror")?;
    Ok(mirror)
}
