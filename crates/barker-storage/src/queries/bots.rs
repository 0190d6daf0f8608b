// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot administration queries.

use barker_core::types::{Bot, BotId, NewBot, Page, PageRequest, Paging};
use barker_core::BarkerError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};
use crate::queries::{bot_from_row, BOT_COLUMNS, NOW};

/// Insert a bot and return it with its issued id.
pub async fn create_bot(db: &Database, bot: &NewBot) -> Result<Bot, BarkerError> {
    let title = bot.title.clone();
    let token = bot.token.clone();
    db.connection()
        .call(move |conn| -> Result<Bot, rusqlite::Error> {
            conn.execute(
                "INSERT INTO bots (title, token) VALUES (?1, ?2)",
                params![title, token],
            )?;
            Ok(Bot {
                id: conn.last_insert_rowid(),
                title,
                token,
                rr_access_seq: None,
                rr_penalty: 0,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Replace title and token. Rotation bookkeeping is left alone.
pub async fn update_bot(db: &Database, bot: &Bot) -> Result<Bot, BarkerError> {
    let id = bot.id;
    let title = bot.title.clone();
    let token = bot.token.clone();
    let updated = db
        .connection()
        .call(move |conn| -> Result<Option<Bot>, rusqlite::Error> {
            let sql = format!(
                "UPDATE bots SET title = ?1, token = ?2, updated_at = {NOW}
                 WHERE id = ?3
                 RETURNING {BOT_COLUMNS}"
            );
            conn.query_row(&sql, params![title, token, id], bot_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)?;
    updated.ok_or_else(|| BarkerError::not_found("bot", id))
}

pub async fn get_bot(db: &Database, id: BotId) -> Result<Option<Bot>, BarkerError> {
    db.connection()
        .call(move |conn| -> Result<Option<Bot>, rusqlite::Error> {
            let sql = format!("SELECT {BOT_COLUMNS} FROM bots WHERE id = ?1");
            conn.query_row(&sql, params![id], bot_from_row).optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Newest bots first.
pub async fn list_bots(db: &Database, page: &PageRequest) -> Result<Page<Bot>, BarkerError> {
    page.validate()?;
    let request = *page;
    let (items, total_items) = db
        .connection()
        .call(move |conn| -> Result<(Vec<Bot>, u64), rusqlite::Error> {
            let total: u64 = conn.query_row("SELECT COUNT(*) FROM bots", [], |r| r.get(0))?;
            let sql = format!(
                "SELECT {BOT_COLUMNS} FROM bots ORDER BY id DESC LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params![request.limit(), request.offset()], bot_from_row)?
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    fn new_bot(title: &str) -> NewBot {
        NewBot {
            title: title.to_string(),
            token: format!("{title}-token"),
        }
    }

    #[tokio::test]
    async fn ids_are_issued_in_order() {
        let (db, _dir) = setup_db().await;
        let first = create_bot(&db, &new_bot("alpha")).await.unwrap();
        let second = create_bot(&db, &new_bot("beta")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let fetched = get_bot(&db, 2).await.unwrap().unwrap();
        assert_eq!(fetched.title, "beta");
        assert_eq!(fetched.token, "beta-token");
        assert!(get_bot(&db, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_changes_title_and_token() {
        let (db, _dir) = setup_db().await;
        let mut bot = create_bot(&db, &new_bot("alpha")).await.unwrap();
        bot.title = "renamed".into();
        bot.token = "fresh".into();
        bot.rr_penalty = 9;

        let updated = update_bot(&db, &bot).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.token, "fresh");
        assert_eq!(updated.rr_penalty, 0, "rotation fields are not writable");
    }

    #[tokio::test]
    async fn update_unknown_bot_is_not_found() {
        let (db, _dir) = setup_db().await;
        let bot = Bot {
            id: 42,
            title: "ghost".into(),
            token: "t".into(),
            rr_access_seq: None,
            rr_penalty: 0,
        };
        let err = update_bot(&db, &bot).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let (db, _dir) = setup_db().await;
        for i in 0..5 {
            create_bot(&db, &new_bot(&format!("bot-{i}"))).await.unwrap();
        }

        let page = list_bots(&db, &PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.paging.total_items, 5);
        assert_eq!(page.paging.total, 3);
        let ids: Vec<_> = page.items.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![5, 4]);

        let last = list_bots(&db, &PageRequest::new(3, 2)).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].id, 1);

        assert!(list_bots(&db, &PageRequest::new(0, 2)).await.is_err());
    }
}
