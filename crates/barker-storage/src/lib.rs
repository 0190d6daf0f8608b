// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite ledger for the Barker delivery dispatch engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! connection via `tokio-rusqlite`, and the bot, recipient, campaign, and
//! delivery queries behind [`SqliteLedger`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::{SqliteLedger, DEFAULT_STALE_AFTER};
pub use database::Database;
