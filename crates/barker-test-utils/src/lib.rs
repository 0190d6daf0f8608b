// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Barker integration tests.
//!
//! Provides a temp-database ledger harness and fixture seeding so tests can
//! run the whole dispatch engine without a shared database.
//!
//! # Components
//!
//! - [`TestHarness`] - Initialized [`SqliteLedger`](barker_storage::SqliteLedger) over a temp file
//! - [`fixtures`] - Helpers that seed bots, recipients, and campaigns through any ledger

pub mod fixtures;
pub mod harness;

pub use harness::{SeededBot, TestHarness};
