// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote ledger over HTTP.
//!
//! [`RemoteLedger`] implements the same capability traits as the SQLite
//! ledger by calling a `barker serve` gateway, so workers on other hosts can
//! rotate bots and claim deliveries against one shared database.

pub mod client;
mod wire;

pub use client::RemoteLedger;
