// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-campaign delivery counters.

use std::time::Duration;

use barker_core::types::{BotId, CampaignId, CampaignStatistics};
use barker_core::BarkerError;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};

/// Render the instant `age` ago in the ledger's timestamp format.
pub(crate) fn cutoff_timestamp(age: Duration) -> String {
    let age = chrono::Duration::from_std(age).unwrap_or(chrono::Duration::MAX);
    let cutoff = Utc::now()
        .checked_sub_signed(age)
        .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
    cutoff.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Counters for one campaign. `stale` counts `progress` rows untouched for
/// longer than `stale_after`.
pub async fn aggregated_statistics(
    db: &Database,
    bot_id: BotId,
    campaign_id: CampaignId,
    stale_after: Duration,
) -> Result<CampaignStatistics, BarkerError> {
    let cutoff = cutoff_timestamp(stale_after);
    let stats = db
        .connection()
        .call(move |conn| -> Result<Option<CampaignStatistics>, rusqlite::Error> {
            let owned = conn
                .query_row(
                    "SELECT 1 FROM campaigns WHERE id = ?1 AND bot_id = ?2",
                    params![campaign_id, bot_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !owned {
                return Ok(None);
            }

            let recipients: u64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE bot_id = ?1",
                params![bot_id],
                |r| r.get(0),
            )?;
            let (delivered, errors, in_progress, stale): (u64, u64, u64, u64) = conn.query_row(
                "SELECT
                     COALESCE(SUM(state = 'success'), 0),
                     COALESCE(SUM(state = 'fail'), 0),
                     COALESCE(SUM(state = 'progress'), 0),
                     COALESCE(SUM(state = 'progress' AND updated_at < ?3), 0)
                 FROM deliveries
                 WHERE bot_id = ?1 AND campaign_id = ?2",
                params![bot_id, campaign_id, cutoff],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )?;
            let pending: u64 = conn.query_row(
                "SELECT COUNT(*) FROM users u
                 WHERE u.bot_id = ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM deliveries d
                       WHERE d.bot_id = u.bot_id AND d.campaign_id = ?2
                         AND d.telegram_id = u.telegram_id
                   )",
                params![bot_id, campaign_id],
                |r| r.get(0),
            )?;

            Ok(Some(CampaignStatistics {
                recipients,
                delivered,
                errors,
                pending,
                in_progress,
                stale,
            }))
        })
        .await
        .map_err(map_tr_err)?;
    stats.ok_or_else(|| BarkerError::not_found("campaign", campaign_id))
}
