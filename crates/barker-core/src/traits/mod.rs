// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger trait definitions.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod ledger;

pub use adapter::Backend;
pub use ledger::{BotStore, CampaignStore, DeliveryStore, Ledger, UserStore};
