//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/td/config.toml)
//! 3. Environment variables (TD_* prefix)
//!
//! Environment variables take precedence over config file values.
//! The resulting value is built once at startup and handed to the
//! server client and the mirror.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::storage::Snapshot;

/// Environment variable prefix
const ENV_PREFIX: &str = "TD";

/// Name of the Topic Index file inside the mirror directory
const TOPICS_FILE: &str = "topics.json";

/// Default per-request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the local mirror (snapshots and topic index)
    #[serde(default = "default_mirror_dir")]
    pub mirror_dir: PathBuf,

    /// Server base URL
    #[serde(default)]
    pub server: Option<String>,

    /// Session token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Timeout for a single server request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Write logs here instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror_dir: default_mirror_dir(),
            server: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TD_MIRROR_DIR, TD_SERVER, TD_TOKEN, ...)
    /// 2. Config file (~/.config/td/config.toml or TD_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load only what the config file says, ignoring the environment
    ///
    /// Use this before rewriting the file so values that only live in
    /// `TD_*` variables (such as a token) are never written to disk.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_MIRROR_DIR", ENV_PREFIX)) {
            if !val.is_empty() {
                self.mirror_dir = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SERVER", ENV_PREFIX)) {
            self.server = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_TOKEN", ENV_PREFIX)) {
            self.token = if val.is_empty() { None } else { Some(val) };
        }

        // Unparsable values keep whatever the file said
        if let Ok(val) = std::env::var(format!("{}_TIMEOUT_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.trim().parse() {
                self.timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with TD_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("td")
            .join("config.toml")
    }

    /// Get the path to the Topic Index
    pub fn topics_path(&self) -> PathBuf {
        self.mirror_dir.join(TOPICS_FILE)
    }

    /// Get the directory of one of the three snapshots
    pub fn snapshot_path(&self, snapshot: Snapshot) -> PathBuf {
        self.mirror_dir.join(snapshot.dir_name())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the server URL, failing with a hint when none is configured
    pub fn require_server(&self) -> Result<&str> {
        match self.server.as_deref() {
            Some(server) if !server.is_empty() => Ok(server),
            _ => bail!(
                "Server not configured. Set it with:\n  \
                 td config set server https://your-server"
            ),
        }
    }
}

/// Get the default mirror directory
fn default_mirror_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("td")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "TD_MIRROR_DIR",
        "TD_SERVER",
        "TD_TOKEN",
        "TD_TIMEOUT_SECS",
        "TD_LOG_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.server.is_none());
        assert!(config.token.is_none());
        assert_eq!(config.timeout_secs, 10);
        assert!(config.mirror_dir.ends_with("td"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config {
            mirror_dir: PathBuf::from("/data/td"),
            ..Config::default()
        };

        assert_eq!(config.topics_path(), PathBuf::from("/data/td/topics.json"));
        assert_eq!(
            config.snapshot_path(Snapshot::Baseline),
            PathBuf::from("/data/td/old")
        );
        assert_eq!(
            config.snapshot_path(Snapshot::Working),
            PathBuf::from("/data/td/new")
        );
        assert_eq!(
            config.snapshot_path(Snapshot::Staging),
            PathBuf::from("/data/td/tmp")
        );
    }

    #[test]
    fn test_env_override_mirror_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TD_MIRROR_DIR", "/tmp/td-test");
        config.apply_env_overrides();

        assert_eq!(config.mirror_dir, PathBuf::from("/tmp/td-test"));
    }

    #[test]
    fn test_env_override_server_and_token() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TD_SERVER", "http://localhost:3000");
        env::set_var("TD_TOKEN", "1234");
        config.apply_env_overrides();
        assert_eq!(config.server.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.token.as_deref(), Some("1234"));

        // Empty string clears it
        env::set_var("TD_TOKEN", "");
        config.apply_env_overrides();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_env_override_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("TD_TIMEOUT_SECS", "3");
        config.apply_env_overrides();
        assert_eq!(config.timeout(), Duration::from_secs(3));

        env::set_var("TD_TIMEOUT_SECS", "soon");
        config.apply_env_overrides();
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_require_server() {
        let mut config = Config::default();
        let err = config.require_server().unwrap_err();
        assert!(err.to_string().contains("td config set server"));

        config.server = Some("http://example.com".to_string());
        assert_eq!(config.require_server().unwrap(), "http://example.com");
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            mirror_dir: PathBuf::from("/data/td"),
            server: Some("https://td.example.com".to_string()),
            token: Some("secret".to_string()),
            timeout_secs: 5,
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("mirror_dir"));
        assert!(toml_str.contains("server"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.mirror_dir, config.mirror_dir);
        assert_eq!(parsed.server, config.server);
        assert_eq!(parsed.token, config.token);
        assert_eq!(parsed.timeout_secs, 5);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            mirror_dir = "/custom/td"
            server = "http://example.com"
            token = "abc"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.mirror_dir, PathBuf::from("/custom/td"));
        assert_eq!(config.server.as_deref(), Some("http://example.com"));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.server.is_none());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_load_file_ignores_env() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "server = \"http://file.example.com\"\n").unwrap();

        env::set_var("TD_SERVER", "http://env.example.com");
        env::set_var("TD_TOKEN", "env-only");

        let effective = Config::load_from_path(&path).unwrap();
        assert_eq!(effective.server.as_deref(), Some("http://env.example.com"));
        assert_eq!(effective.token.as_deref(), Some("env-only"));

        let on_disk = Config::load_file(&path).unwrap();
        assert_eq!(on_disk.server.as_deref(), Some("http://file.example.com"));
        assert!(on_disk.token.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            server: Some("http://localhost:4000".to_string()),
            timeout_secs: 2,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.server.as_deref(), Some("http://localhost:4000"));
        assert_eq!(loaded.timeout_secs, 2);
    }
}
