// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per ledger concern.
//!
//! Public functions take `&Database` and run a single closure on the
//! connection thread. Multi-statement operations open a `BEGIN IMMEDIATE`
//! transaction so the write lock is held from the first read.

pub mod bots;
pub mod campaigns;
pub mod deliveries;
pub mod rotation;
pub mod selectors;
pub mod statistics;
pub mod users;

use barker_core::types::{Bot, Campaign, User};
use rusqlite::Row;

/// Current time in the ledger's timestamp format.
pub(crate) const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

pub(crate) const BOT_COLUMNS: &str = "id, title, token, rr_access_seq, rr_penalty";

pub(crate) const CAMPAIGN_COLUMNS: &str = "id, bot_id, title, message, active";

pub(crate) const USER_COLUMNS: &str =
    "bot_id, telegram_id, first_name, last_name, display_name, user_name";

pub(crate) fn bot_from_row(row: &Row<'_>) -> rusqlite::Result<Bot> {
    Ok(Bot {
        id: row.get(0)?,
        title: row.get(1)?,
        token: row.get(2)?,
        rr_access_seq: row.get(3)?,
        rr_penalty: row.get(4)?,
    })
}

pub(crate) fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<Campaign> {
    Ok(Campaign {
        id: row.get(0)?,
        bot_id: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        active: row.get(4)?,
    })
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        bot_id: row.get(0)?,
        telegram_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        display_name: row.get(4)?,
        user_name: row.get(5)?,
    })
}
