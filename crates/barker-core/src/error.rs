// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Barker dispatch engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::state::DeliveryState;

/// The primary error type used across all Barker ledger traits and core operations.
///
/// Exhaustion is never an error: operations that can run out of eligible work
/// return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum BarkerError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced bot, campaign, recipient, or delivery does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// A delivery state change that the state machine does not allow.
    #[error("invalid delivery transition from {from} to {to}")]
    InvalidTransition {
        from: DeliveryState,
        to: DeliveryState,
    },

    /// Caller supplied malformed input (bad paging, empty title, unknown state name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A remote ledger answered with an unexpected status or could not be reached.
    #[error("remote ledger error: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Machine-readable error category carried across the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Storage,
    NotFound,
    InvalidTransition,
    InvalidInput,
    Remote,
    Internal,
    /// Rejected by the gateway's bearer-token check. No [`BarkerError`]
    /// variant maps here.
    Unauthorized,
}

impl BarkerError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for a [`BarkerError::NotFound`] error.
    pub fn not_found(entity: impl Into<String>, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    /// Returns true when the error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
