// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient and campaign selection for delivery claims.
//!
//! These run inside the claim transaction, so they take a plain
//! `&rusqlite::Connection` (a `Transaction` derefs to one) and never commit.
//! "Unclaimed" always means no delivery row exists for the pair, whatever its
//! state.

use barker_core::types::{BotId, Campaign, CampaignId, TelegramId, User};
use rusqlite::{params, Connection, OptionalExtension};

use crate::queries::{campaign_from_row, user_from_row};

/// The bot's unclaimed recipient for `campaign_id` with the smallest
/// creation-order key.
pub fn next_recipient(
    conn: &Connection,
    bot_id: BotId,
    campaign_id: CampaignId,
) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT u.bot_id, u.telegram_id, u.first_name, u.last_name, u.display_name, u.user_name
         FROM users u
         WHERE u.bot_id = ?1
           AND NOT EXISTS (
               SELECT 1 FROM deliveries d
               WHERE d.bot_id = u.bot_id AND d.campaign_id = ?2 AND d.telegram_id = u.telegram_id
           )
         ORDER BY u.id ASC
         LIMIT 1",
        params![bot_id, campaign_id],
        user_from_row,
    )
    .optional()
}

/// The bot's newest active campaign that `telegram_id` has not been claimed for.
pub fn next_campaign_for_recipient(
    conn: &Connection,
    bot_id: BotId,
    telegram_id: TelegramId,
) -> rusqlite::Result<Option<Campaign>> {
    conn.query_row(
        "SELECT c.id, c.bot_id, c.title, c.message, c.active
         FROM campaigns c
         WHERE c.bot_id = ?1 AND c.active = 1
           AND NOT EXISTS (
               SELECT 1 FROM deliveries d
               WHERE d.bot_id = c.bot_id AND d.campaign_id = c.id AND d.telegram_id = ?2
           )
         ORDER BY c.id DESC
         LIMIT 1",
        params![bot_id, telegram_id],
        campaign_from_row,
    )
    .optional()
}

/// The bot's newest active campaign that still has at least one unclaimed
/// recipient. Older campaigns are only reached once newer ones are exhausted.
pub fn next_open_campaign(conn: &Connection, bot_id: BotId) -> rusqlite::Result<Option<Campaign>> {
    conn.query_row(
        "SELECT c.id, c.bot_id, c.title, c.message, c.active
         FROM campaigns c
         WHERE c.bot_id = ?1 AND c.active = 1
           AND EXISTS (
               SELECT 1 FROM users u
               WHERE u.bot_id = c.bot_id
                 AND NOT EXISTS (
                     SELECT 1 FROM deliveries d
                     WHERE d.bot_id = u.bot_id
                       AND d.campaign_id = c.id
                       AND d.telegram_id = u.telegram_id
                 )
           )
         ORDER BY c.id DESC
         LIMIT 1",
        params![bot_id],
        campaign_from_row,
    )
    .optional()
}
