// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the ledger API.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use barker_core::{BarkerError, Ledger};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Ledger every handler operates on.
    pub ledger: Arc<dyn Ledger>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            start_time: Instant::now(),
        }
    }
}

/// Listener settings (mirrors `ServerConfig` from barker-config).
#[derive(Clone)]
pub struct GatewayConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,
    /// Bearer token for auth (None = auth disabled).
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Build the API router.
///
/// `/health` is public; every other route sits behind the bearer-token layer.
pub fn router(state: GatewayState, auth: AuthConfig) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/bot", post(handlers::create_bot).get(handlers::list_bots))
        .route("/bot/next", post(handlers::next_bot))
        .route(
            "/bot/{bot_id}",
            get(handlers::get_bot).put(handlers::update_bot),
        )
        .route(
            "/bot/{bot_id}/user",
            get(handlers::list_users).put(handlers::put_user),
        )
        .route("/bot/{bot_id}/user/{telegram_id}", get(handlers::get_user))
        .route(
            "/bot/{bot_id}/campaign",
            get(handlers::list_campaigns).post(handlers::create_campaign),
        )
        .route(
            "/bot/{bot_id}/campaign/{campaign_id}",
            get(handlers::get_campaign).put(handlers::update_campaign),
        )
        .route(
            "/bot/{bot_id}/campaign/{campaign_id}/aggregatedStatistics",
            get(handlers::aggregated_statistics),
        )
        .route("/bot/{bot_id}/delivery", post(handlers::claim_for_bot))
        .route(
            "/bot/{bot_id}/campaign/{campaign_id}/delivery",
            post(handlers::claim_for_campaign),
        )
        .route(
            "/bot/{bot_id}/campaign/{campaign_id}/delivery/{telegram_id}/state",
            get(handlers::get_delivery_state),
        )
        .route(
            "/bot/{bot_id}/campaign/{campaign_id}/delivery/{telegram_id}/state/{state}",
            put(handlers::set_delivery_state),
        )
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the listener described by `config`.
pub async fn bind(config: &GatewayConfig) -> Result<TcpListener, BarkerError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| BarkerError::Internal(format!("failed to bind gateway to {addr}: {e}")))
}

/// Serve `app` on `listener` until `shutdown` resolves, then drain
/// in-flight requests.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), BarkerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| BarkerError::Internal(format!("gateway listener has no address: {e}")))?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BarkerError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

/// Bind, build the router, and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &GatewayConfig,
    ledger: Arc<dyn Ledger>,
    shutdown: F,
) -> Result<(), BarkerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = bind(config).await?;
    let auth = AuthConfig {
        bearer_token: config.bearer_token.clone(),
    };
    serve(listener, router(GatewayState::new(ledger), auth), shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_config_debug_redacts_token() {
        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            bearer_token: Some("hunter2".to_string()),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let listener = bind(&GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            bearer_token: None,
        })
        .await
        .unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
