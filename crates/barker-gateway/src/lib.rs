// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway exposing a delivery ledger as a JSON REST API.
//!
//! The router is generic over `Arc<dyn Ledger>`, so it serves a local SQLite
//! ledger in production and any other implementation in tests. Workers that
//! cannot share the database file reach it through this API with the remote
//! client.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use handlers::{DataResponse, ErrorResponse, HealthResponse, ListResponse};
pub use server::{GatewayConfig, GatewayState, bind, router, serve, start_server};
