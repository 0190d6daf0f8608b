// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign administration queries.

use barker_core::types::{
    validate_campaign_text, BotId, Campaign, CampaignId, NewCampaign, Page, PageRequest, Paging,
};
use barker_core::BarkerError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};
use crate::queries::{campaign_from_row, CAMPAIGN_COLUMNS, NOW};

/// Insert a campaign. Fails with `NotFound` if its bot does not exist.
pub async fn create_campaign(
    db: &Database,
    campaign: &NewCampaign,
) -> Result<Campaign, BarkerError> {
    validate_campaign_text(&campaign.title, &campaign.message)?;
    let campaign = campaign.clone();
    let bot_id = campaign.bot_id;
    let created = db
        .connection()
        .call(move |conn| -> Result<Option<Campaign>, rusqlite::Error> {
            let sql = format!(
                "INSERT INTO campaigns (bot_id, title, message, active)
                 SELECT id, ?2, ?3, ?4 FROM bots WHERE id = ?1
                 RETURNING {CAMPAIGN_COLUMNS}"
            );
            conn.query_row(
                &sql,
                params![
                    campaign.bot_id,
                    campaign.title,
                    campaign.message,
                    campaign.active
                ],
                campaign_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    created.ok_or_else(|| BarkerError::not_found("bot", bot_id))
}

/// Update title, message, and active flag. The owning bot is part of the
/// lookup key and is never changed.
pub async fn update_campaign(db: &Database, campaign: &Campaign) -> Result<Campaign, BarkerError> {
    validate_campaign_text(&campaign.title, &campaign.message)?;
    let campaign = campaign.clone();
    let id = campaign.id;
    let updated = db
        .connection()
        .call(move |conn| -> Result<Option<Campaign>, rusqlite::Error> {
            let sql = format!(
                "UPDATE campaigns SET title = ?1, message = ?2, active = ?3, updated_at = {NOW}
                 WHERE id = ?4 AND bot_id = ?5
                 RETURNING {CAMPAIGN_COLUMNS}"
            );
            conn.query_row(
                &sql,
                params![
                    campaign.title,
                    campaign.message,
                    campaign.active,
                    campaign.id,
                    campaign.bot_id
                ],
                campaign_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    updated.ok_or_else(|| BarkerError::not_found("campaign", id))
}

/// `None` when the campaign is missing or owned by a different bot.
pub async fn get_campaign(
    db: &Database,
    bot_id: BotId,
    id: CampaignId,
) -> Result<Option<Campaign>, BarkerError> {
    db.connection()
        .call(move |conn| -> Result<Option<Campaign>, rusqlite::Error> {
            let sql =
                format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1 AND bot_id = ?2");
            conn.query_row(&sql, params![id, bot_id], campaign_from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Campaigns of one bot, newest first.
pub async fn list_campaigns(
    db: &Database,
    bot_id: BotId,
    page: &PageRequest,
) -> Result<Page<Campaign>, BarkerError> {
    page.validate()?;
    let request = *page;
    let (items, total_items) = db
        .connection()
        .call(move |conn| -> Result<(Vec<Campaign>, u64), rusqlite::Error> {
            let total: u64 = conn.query_row(
                "SELECT COUNT(*) FROM campaigns WHERE bot_id = ?1",
                params![bot_id],
                |r| r.get(0),
            )?;
            let sql = format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE bot_id = ?1
                 ORDER BY id DESC LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(
                    params![bot_id, request.limit(), request.offset()],
                    campaign_from_row,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::bots::create_bot;
    use crate::queries::test_support::setup_db;
    use barker_core::types::NewBot;

    async fn seed_bot(db: &Database, title: &str) -> BotId {
        create_bot(
            db,
            &NewBot {
                title: title.into(),
                token: "t".into(),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_campaign(bot_id: BotId, title: &str) -> NewCampaign {
        NewCampaign {
            bot_id,
            title: title.into(),
            message: format!("{title} body"),
            active: true,
        }
    }

    #[tokio::test]
    async fn create_and_get_scoped_by_bot() {
        let (db, _dir) = setup_db().await;
        let owner = seed_bot(&db, "owner").await;
        let other = seed_bot(&db, "other").await;

        let campaign = create_campaign(&db, &new_campaign(owner, "spring")).await.unwrap();
        assert_eq!(campaign.bot_id, owner);
        assert!(campaign.active);

        assert_eq!(
            get_campaign(&db, owner, campaign.id).await.unwrap(),
            Some(campaign.clone())
        );
        assert!(get_campaign(&db, other, campaign.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_for_unknown_bot_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = create_campaign(&db, &new_campaign(9, "orphan")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_requires_title_and_message() {
        let (db, _dir) = setup_db().await;
        let bot_id = seed_bot(&db, "owner").await;
        let mut campaign = new_campaign(bot_id, "x");
        campaign.message = "   ".into();
        let err = create_campaign(&db, &campaign).await.unwrap_err();
        assert!(matches!(err, BarkerError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn update_through_wrong_bot_is_not_found() {
        let (db, _dir) = setup_db().await;
        let owner = seed_bot(&db, "owner").await;
        let other = seed_bot(&db, "other").await;
        let mut campaign = create_campaign(&db, &new_campaign(owner, "spring")).await.unwrap();

        campaign.active = false;
        campaign.title = "spring sale".into();
        let updated = update_campaign(&db, &campaign).await.unwrap();
        assert!(!updated.active);
        assert_eq!(updated.title, "spring sale");

        let mut hijack = updated.clone();
        hijack.bot_id = other;
        let err = update_campaign(&db, &hijack).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            get_campaign(&db, owner, campaign.id).await.unwrap().unwrap().bot_id,
            owner
        );
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (db, _dir) = setup_db().await;
        let bot_id = seed_bot(&db, "owner").await;
        for title in ["c1", "c2", "c3"] {
            create_campaign(&db, &new_campaign(bot_id, title)).await.unwrap();
        }
        let page = list_campaigns(&db, bot_id, &PageRequest::new(1, 2)).await.unwrap();
        let titles: Vec<_> = page.items.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["c3", "c2"]);
        assert_eq!(page.paging.total, 2);
    }
}
