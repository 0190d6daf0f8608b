// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for Barker.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! keys at parse time; the diagnostic layer turns those rejections into
//! "did you mean" suggestions.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarkerConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Local SQLite ledger.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP API served by `barker serve`.
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote ledger client used by worker commands.
    #[serde(default)]
    pub client: ClientConfig,

    /// Bot rotation deprioritization.
    #[serde(default)]
    pub rotation: RotationConfig,

    /// Delivery reporting.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default level for Barker crates when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Local ledger database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Use WAL journal mode so several worker processes can share the file.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("barker").join("barker.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("barker.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP API listener settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Required `Authorization: Bearer` token. `None` disables auth.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Remote ledger client settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of a `barker serve` instance, e.g. `http://10.0.0.5:8080`.
    /// When set, worker commands use the remote ledger.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub bearer_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            bearer_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Turns a bot forfeits in rotation after trouble. `0` disables a trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationConfig {
    /// After a delivery of the bot is reported as failed.
    #[serde(default = "default_fail_penalty")]
    pub fail_penalty: u32,

    /// After a bot-wide claim found nothing left to send. Off by default.
    #[serde(default = "default_exhausted_penalty")]
    pub exhausted_penalty: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            fail_penalty: default_fail_penalty(),
            exhausted_penalty: default_exhausted_penalty(),
        }
    }
}

fn default_fail_penalty() -> u32 {
    1
}

fn default_exhausted_penalty() -> u32 {
    0
}

/// Delivery reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// A delivery still in `progress` after this many seconds counts as stale.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

fn default_stale_after_secs() -> u64 {
    3600
}
