// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `barker serve`: expose the local SQLite ledger over HTTP.

use std::sync::Arc;

use barker_config::model::BarkerConfig;
use barker_core::{Backend, BarkerError, Ledger};
use barker_gateway::GatewayConfig;
use barker_storage::SqliteLedger;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::shutdown;

/// Listener settings for the gateway, taken from `[server]`.
pub fn gateway_config(config: &BarkerConfig) -> GatewayConfig {
    GatewayConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        bearer_token: config.server.bearer_token.clone(),
    }
}

/// Run the gateway until SIGINT/SIGTERM, then checkpoint the ledger.
pub async fn run_serve(config: BarkerConfig) -> Result<(), BarkerError> {
    let cancel = shutdown::install_signal_handler();
    serve_until(config, cancel).await
}

/// Run the gateway until `cancel` fires.
pub async fn serve_until(config: BarkerConfig, cancel: CancellationToken) -> Result<(), BarkerError> {
    let ledger = SqliteLedger::from_config(&config);
    ledger.initialize().await?;
    let ledger = Arc::new(ledger);

    if config.server.bearer_token.is_none() {
        tracing::warn!("server.bearer_token is not set, the API is unauthenticated");
    }

    let shared: Arc<dyn Ledger> = ledger.clone();
    let result = barker_gateway::start_server(&gateway_config(&config), shared, async move {
        cancel.cancelled().await;
    })
    .await;

    ledger.shutdown().await?;
    info!("barker serve shutdown complete");
    result
}
