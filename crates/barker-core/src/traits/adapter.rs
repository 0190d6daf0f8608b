// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait every ledger backend implements.

use async_trait::async_trait;

use crate::error::BarkerError;
use crate::types::{BackendKind, HealthStatus};

/// Identity, lifecycle, and health of a ledger backend.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Returns the human-readable name of this backend instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this backend.
    fn version(&self) -> semver::Version;

    /// Returns which implementation this is.
    fn kind(&self) -> BackendKind;

    /// Opens connections and prepares the backend. Must be called once before use.
    async fn initialize(&self) -> Result<(), BarkerError>;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, BarkerError>;

    /// Flushes pending state and releases held resources.
    async fn shutdown(&self) -> Result<(), BarkerError>;
}
