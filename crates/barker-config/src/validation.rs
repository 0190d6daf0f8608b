// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::BarkerConfig;

/// Highest accepted rotation penalty. Each forfeited turn costs one extra
/// step inside the rotation transaction.
pub const MAX_ROTATION_PENALTY: u32 = 16;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration, collecting every problem found.
pub fn validate_config(config: &BarkerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::invalid(
            "log.level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path", "must not be empty"));
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::invalid("server.host", "must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::invalid(
            "server.host",
            format!("`{host}` is not an IP address or hostname"),
        ));
    }

    if config
        .server
        .bearer_token
        .as_deref()
        .is_some_and(|t| t.trim().is_empty())
    {
        errors.push(ConfigError::invalid(
            "server.bearer_token",
            "must not be blank; remove the key to disable auth",
        ));
    }

    if let Some(url) = config.client.base_url.as_deref()
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(ConfigError::invalid(
            "client.base_url",
            format!("`{url}` must be an absolute http(s) URL"),
        ));
    }

    if config.client.timeout_secs == 0 {
        errors.push(ConfigError::invalid("client.timeout_secs", "must be positive"));
    }

    for (key, value) in [
        ("rotation.fail_penalty", config.rotation.fail_penalty),
        ("rotation.exhausted_penalty", config.rotation.exhausted_penalty),
    ] {
        if value > MAX_ROTATION_PENALTY {
            errors.push(ConfigError::invalid(
                key,
                format!("must be at most {MAX_ROTATION_PENALTY}, got {value}"),
            ));
        }
    }

    if config.delivery.stale_after_secs == 0 {
        errors.push(ConfigError::invalid(
            "delivery.stale_after_secs",
            "must be positive",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        assert!(validate_config(&BarkerConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_problem() {
        let mut config = BarkerConfig::default();
        config.storage.database_path = "  ".into();
        config.server.host = "bad host!".into();
        config.rotation.fail_penalty = 99;
        config.delivery.stale_after_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn client_url_needs_scheme() {
        let mut config = BarkerConfig::default();
        config.client.base_url = Some("localhost:8080".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("client.base_url"));
    }
}
