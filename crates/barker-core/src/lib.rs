// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Barker delivery dispatch engine.
//!
//! Provides the domain types, the error type, the delivery state machine,
//! the rotation policy, and the ledger traits that the SQLite and remote
//! implementations share.

pub mod error;
pub mod rotation;
pub mod state;
pub mod traits;
pub mod types;

pub use error::{BarkerError, ErrorKind};
pub use rotation::{PenaltyPolicy, RotationPolicy, StrictRoundRobin};
pub use state::{DeliveryState, Transition};
pub use types::{BackendKind, HealthStatus};

pub use traits::{Backend, BotStore, CampaignStore, DeliveryStore, Ledger, UserStore};
