//! Server configuration.
//!
//! Loaded once at startup from a YAML file and shared read-only (behind an
//! `Arc`) with every component that needs it. Every field has a default, so a
//! missing file or an empty document yields a working server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::server_log::Severity;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "LANTERN_CONFIG";

/// Configuration file used when `LANTERN_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "./lantern.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TCP port to listen on (all interfaces).
    pub port: u16,
    /// Runtime worker threads, and the maximum number of concurrent connections.
    pub num_threads: usize,
    pub keep_alive: KeepAliveConfig,
    /// Directory requested targets are resolved under.
    pub root_directory: PathBuf,
    /// Document served when the bare root `/` is requested.
    pub default_document: String,
    /// Adds diagnostic response headers and raises console verbosity.
    pub debug_mode: bool,
    pub logging: LoggingConfig,
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    pub max_requests: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Lines with a severity above this threshold are discarded.
    pub level: Severity,
    pub file: PathBuf,
}

/// Caps on what a single request may make the server read.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_header_line_bytes: usize,
    pub max_header_count: usize,
    pub max_body_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            num_threads: 10,
            keep_alive: KeepAliveConfig::default(),
            root_directory: PathBuf::from("./content"),
            default_document: "index.html".to_string(),
            debug_mode: false,
            logging: LoggingConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 3,
            max_requests: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Severity::Connection,
            file: PathBuf::from("./server_log.txt"),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_header_line_bytes: 8 * 1024,
            max_header_count: 100,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl KeepAliveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Loads the configuration named by `LANTERN_CONFIG`, falling back to
    /// `./lantern.yaml`. A missing file yields the defaults; a file that
    /// exists but does not parse is an error.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml_str(&text)
                .with_context(|| format!("invalid configuration in {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.num_threads > 0, "num_threads must be at least 1");
        anyhow::ensure!(
            !self.default_document.is_empty() && !self.default_document.contains('/'),
            "default_document must be a plain file name"
        );
        anyhow::ensure!(
            self.keep_alive.max_requests > 0,
            "keep_alive.max_requests must be at least 1"
        );
        Ok(())
    }

    /// Emits the effective configuration, one event per section.
    pub fn log_effective(&self) {
        tracing::info!(port = self.port, num_threads = self.num_threads, "CONFIG: listener");
        tracing::info!(
            enabled = self.keep_alive.enabled,
            timeout_secs = self.keep_alive.timeout_secs,
            max_requests = self.keep_alive.max_requests,
            "CONFIG: keep-alive"
        );
        tracing::info!(
            root = %self.root_directory.display(),
            default_document = %self.default_document,
            "CONFIG: content"
        );
        tracing::info!(
            severity = ?self.logging.level,
            file = %self.logging.file.display(),
            debug_mode = self.debug_mode,
            "CONFIG: logging"
        );
        tracing::info!(
            max_header_line_bytes = self.limits.max_header_line_bytes,
            max_header_count = self.limits.max_header_count,
            max_body_bytes = self.limits.max_body_bytes,
            "CONFIG: limits"
        );
    }
}
