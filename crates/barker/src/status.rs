// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `barker status`: probe a running gateway's health endpoint.
//!
//! Reports the backend, version and uptime of the gateway, or that nothing
//! is listening.

use std::io::IsTerminal;
use std::time::Duration;

use barker_config::model::BarkerConfig;
use barker_core::BarkerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    backend: Option<String>,
    #[serde(default)]
    version: Option<String>,
    uptime_secs: u64,
    #[serde(default)]
    detail: Option<String>,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub backend: Option<String>,
    pub version: Option<String>,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub detail: Option<String>,
    pub endpoint: String,
}

/// Health URL of the gateway this configuration points at.
///
/// A configured `[client] base_url` wins. Otherwise the local `[server]`
/// listener is probed, with wildcard hosts rewritten to loopback.
pub fn health_url(config: &BarkerConfig) -> String {
    if let Some(base) = &config.client.base_url {
        return format!("{}/health", base.trim_end_matches('/'));
    }
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "" => "127.0.0.1",
        "::" | "[::]" => "[::1]",
        other => other,
    };
    format!("http://{host}:{}/health", config.server.port)
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Run the `barker status` command.
///
/// `--json` prints a [`StatusResponse`]. `--plain`, or a non-TTY stdout,
/// disables colors.
pub async fn run_status(config: &BarkerConfig, json: bool, plain: bool) -> Result<(), BarkerError> {
    let url = health_url(config);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| BarkerError::Internal(format!("failed to create HTTP client: {e}")))?;

    // The gateway answers 503 with a body when the ledger is unhealthy.
    let health = match client.get(&url).send().await {
        Ok(resp) => match resp.json::<HealthResponse>().await {
            Ok(health) => Some(health),
            Err(e) => {
                tracing::debug!(error = %e, "health response was not JSON");
                None
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, %url, "gateway unreachable");
            None
        }
    };

    let response = match health {
        Some(health) => StatusResponse {
            running: true,
            uptime_human: Some(format_uptime(health.uptime_secs)),
            status: health.status,
            backend: health.backend,
            version: health.version,
            uptime_secs: Some(health.uptime_secs),
            detail: health.detail,
            endpoint: url,
        },
        None => StatusResponse {
            running: false,
            status: "not running".to_string(),
            backend: None,
            version: None,
            uptime_secs: None,
            uptime_human: None,
            detail: None,
            endpoint: url,
        },
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        if response.running {
            print_status_running(&response, use_color);
        } else {
            print_status_offline(&response.endpoint, use_color);
        }
    }

    Ok(())
}

fn print_status_running(status: &StatusResponse, use_color: bool) {
    let uptime = status.uptime_human.as_deref().unwrap_or("-");
    println!();
    println!("  barker status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        let state = if status.status == "ok" {
            format!("{} {}", "✓".green(), status.status.green())
        } else {
            format!("{} {}", "!".yellow(), status.status.yellow())
        };
        println!("    State:    {state} (uptime: {uptime})");
    } else if status.status == "ok" {
        println!("    State:    [OK] {} (uptime: {uptime})", status.status);
    } else {
        println!("    State:    [WARN] {} (uptime: {uptime})", status.status);
    }

    if let Some(backend) = &status.backend {
        println!("    Backend:  {backend}");
    }
    if let Some(version) = &status.version {
        println!("    Version:  {version}");
    }
    if let Some(detail) = &status.detail {
        println!("    Detail:   {detail}");
    }
    println!();
}

fn print_status_offline(endpoint: &str, use_color: bool) {
    println!();
    println!("  barker status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        println!("    State:    {} {}", "✗".red(), "not running".red());
    } else {
        println!("    State:    [FAIL] not running");
    }

    println!("    Endpoint: {endpoint}");
    println!();
    println!("  Start with: barker serve");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(120), "2m");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(3720), "1h 2m");
    }

    #[test]
    fn format_uptime_days() {
        assert_eq!(format_uptime(90060), "1d 1h 1m");
    }

    #[test]
    fn health_url_prefers_client_base_url() {
        let mut config = BarkerConfig::default();
        config.server.port = 4000;
        assert_eq!(health_url(&config), "http://127.0.0.1:4000/health");

        config.client.base_url = Some("https://barker.internal/".to_string());
        assert_eq!(health_url(&config), "https://barker.internal/health");
    }

    #[test]
    fn health_url_keeps_explicit_host() {
        let mut config = BarkerConfig::default();
        config.server.host = "10.0.0.5".to_string();
        config.server.port = 8080;
        assert_eq!(health_url(&config), "http://10.0.0.5:8080/health");
    }

    #[test]
    fn offline_status_serializes() {
        let resp = StatusResponse {
            running: false,
            status: "not running".to_string(),
            backend: None,
            version: None,
            uptime_secs: None,
            uptime_human: None,
            detail: None,
            endpoint: "http://127.0.0.1:3000/health".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"running\":false"));
        assert!(json.contains("\"endpoint\""));
    }
}
