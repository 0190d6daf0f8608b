// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin bot rotation.
//!
//! Bots are ordered by `rr_access_seq` (never-served first) then id. Serving
//! a bot moves it to the back with `MAX(rr_access_seq) + 1`. A bot at the
//! head with a positive `rr_penalty` is moved to the back with its penalty
//! decremented instead of being served, so a penalized bot sits out whole
//! rounds without ever being starved.

use barker_core::types::{Bot, BotId};
use barker_core::BarkerError;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use crate::database::{map_tr_err, Database};
use crate::queries::{bot_from_row, BOT_COLUMNS, NOW};

/// Pick the next bot to serve and advance the rotation.
pub async fn rr_take(db: &Database) -> Result<Bot, BarkerError> {
    let taken = db
        .connection()
        .call(|conn| -> Result<Option<(Bot, u32)>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let head_sql = format!(
                "SELECT {BOT_COLUMNS} FROM bots
                 ORDER BY COALESCE(rr_access_seq, 0) ASC, id ASC
                 LIMIT 1"
            );
            let advance_sql = format!(
                "UPDATE bots SET
                     rr_access_seq = (SELECT COALESCE(MAX(rr_access_seq), 0) + 1 FROM bots),
                     rr_penalty = MAX(rr_penalty - 1, 0),
                     updated_at = {NOW}
                 WHERE id = ?1
                 RETURNING {BOT_COLUMNS}"
            );

            let mut passed_over = 0u32;
            loop {
                let Some(head) = tx.query_row(&head_sql, [], bot_from_row).optional()? else {
                    return Ok(None);
                };
                let advanced = tx.query_row(&advance_sql, params![head.id], bot_from_row)?;
                if head.rr_penalty == 0 {
                    tx.commit()?;
                    return Ok(Some((advanced, passed_over)));
                }
                passed_over += 1;
            }
        })
        .await
        .map_err(map_tr_err)?;

    let (bot, passed_over) = taken.ok_or_else(|| BarkerError::not_found("bot", "any"))?;
    debug!(
        bot_id = bot.id,
        rr_access_seq = bot.rr_access_seq,
        passed_over,
        "bot taken"
    );
    Ok(bot)
}

/// Raise a bot's penalty to at least `penalty`. Penalties never stack.
pub(crate) fn raise_penalty(
    conn: &Connection,
    bot_id: BotId,
    penalty: u32,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE bots SET rr_penalty = MAX(rr_penalty, ?2) WHERE id = ?1",
        params![bot_id, penalty],
    )?;
    Ok(())
}
