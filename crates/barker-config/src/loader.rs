// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./barker.toml` > `~/.config/barker/barker.toml` > `/etc/barker/barker.toml`,
//! with `BARKER_` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BarkerConfig;

/// Sections of [`BarkerConfig`], used to split env var names into dotted keys.
const SECTIONS: &[&str] = &["log", "storage", "server", "client", "rotation", "delivery"];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/barker/barker.toml";
pub(crate) const LOCAL_CONFIG: &str = "barker.toml";

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("barker").join("barker.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/barker/barker.toml`
/// 3. `~/.config/barker/barker.toml`
/// 4. `./barker.toml`
/// 5. `BARKER_*` environment variables
pub fn load_config() -> Result<BarkerConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BarkerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BarkerConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honouring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<BarkerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BarkerConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BarkerConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider mapping `BARKER_SECTION_KEY` to `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `BARKER_SERVER_BEARER_TOKEN` lands on `server.bearer_token`.
fn env_provider() -> Env {
    Env::prefixed("BARKER_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("server_bearer_token"), "server.bearer_token");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("delivery_stale_after_secs"), "delivery.stale_after_secs");
        assert_eq!(map_env_key("log_level"), "log.level");
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }
}
