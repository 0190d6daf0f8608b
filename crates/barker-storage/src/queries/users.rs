// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient queries.

use barker_core::types::{BotId, Page, PageRequest, Paging, TelegramId, User};
use barker_core::BarkerError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};
use crate::queries::{user_from_row, NOW, USER_COLUMNS};

/// Insert a recipient or merge into the existing (bot, telegram id) row.
///
/// Profile fields that are `None` or empty keep their stored value. Creation
/// order is preserved on merge. Fails with `NotFound` for an unknown bot.
pub async fn put_user(db: &Database, user: &User) -> Result<User, BarkerError> {
    let user = user.clone();
    let bot_id = user.bot_id;
    let stored = db
        .connection()
        .call(move |conn| -> Result<Option<User>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let bot_exists = tx
                .query_row("SELECT 1 FROM bots WHERE id = ?1", params![user.bot_id], |_| {
                    Ok(())
                })
                .optional()?
                .is_some();
            if !bot_exists {
                return Ok(None);
            }

            let sql = format!(
                "INSERT INTO users
                     (bot_id, telegram_id, first_name, last_name, display_name, user_name)
                 VALUES (?1, ?2, NULLIF(?3, ''), NULLIF(?4, ''), NULLIF(?5, ''), NULLIF(?6, ''))
                 ON CONFLICT (bot_id, telegram_id) DO UPDATE SET
                     first_name   = COALESCE(excluded.first_name, users.first_name),
                     last_name    = COALESCE(excluded.last_name, users.last_name),
                     display_name = COALESCE(excluded.display_name, users.display_name),
                     user_name    = COALESCE(excluded.user_name, users.user_name),
                     updated_at   = {NOW}
                 RETURNING {USER_COLUMNS}"
            );
            let stored = tx.query_row(
                &sql,
                params![
                    user.bot_id,
                    user.telegram_id,
                    user.first_name,
                    user.last_name,
                    user.display_name,
                    user.user_name,
                ],
                user_from_row,
            )?;
            tx.commit()?;
            Ok(Some(stored))
        })
        .await
        .map_err(map_tr_err)?;
    stored.ok_or_else(|| BarkerError::not_found("bot", bot_id))
}

pub async fn get_user(
    db: &Database,
    bot_id: BotId,
    telegram_id: TelegramId,
) -> Result<Option<User>, BarkerError> {
    db.connection()
        .call(move |conn| -> Result<Option<User>, rusqlite::Error> {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE bot_id = ?1 AND telegram_id = ?2"
            );
            conn.query_row(&sql, params![bot_id, telegram_id], user_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Recipients of one bot in creation order.
pub async fn list_users(
    db: &Database,
    bot_id: BotId,
    page: &PageRequest,
) -> Result<Page<User>, BarkerError> {
    page.validate()?;
    let request = *page;
    let (items, total_items) = db
        .connection()
        .call(move |conn| -> Result<(Vec<User>, u64), rusqlite::Error> {
            let total: u64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE bot_id = ?1",
                params![bot_id],
                |r| r.get(0),
            )?;
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE bot_id = ?1
                 ORDER BY id ASC LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(
                    params![bot_id, request.limit(), request.offset()],
                    user_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok((items, total))
        })
        .await
        .map_err(map_tr_err)?;
    Ok(Page {
        items,
        paging: Paging::new(page, total_items),
    })
}
