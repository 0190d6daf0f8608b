// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery claim and state transitions.
//!
//! A claim runs as one `BEGIN IMMEDIATE` transaction: pick the target, then
//! insert the `progress` row with `ON CONFLICT DO NOTHING`. The primary key on
//! (bot, campaign, recipient) makes a second claim of the same triple a no-op,
//! so a caller that loses a race sees exhaustion rather than a duplicate.

use std::str::FromStr;

use barker_core::types::{
    BotId, Campaign, CampaignId, ClaimMode, Delivery, DeliveryKey, DeliveryTakeResult,
    DeliveryTarget, TelegramId, User,
};
use barker_core::{BarkerError, DeliveryState, Transition};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use crate::database::{map_tr_err, Database};
use crate::queries::rotation::raise_penalty;
use crate::queries::selectors::{next_campaign_for_recipient, next_open_campaign, next_recipient};
use crate::queries::{campaign_from_row, user_from_row, CAMPAIGN_COLUMNS, NOW, USER_COLUMNS};

const DELIVERY_COLUMNS: &str = "bot_id, campaign_id, telegram_id, state, created_at, updated_at";

enum ClaimOutcome {
    Claimed(DeliveryTakeResult),
    Exhausted,
    MissingBot,
    MissingCampaign(CampaignId),
}

fn state_from_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DeliveryState> {
    let raw: String = row.get(idx)?;
    DeliveryState::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn delivery_from_row(row: &Row<'_>) -> rusqlite::Result<Delivery> {
    Ok(Delivery {
        bot_id: row.get(0)?,
        campaign_id: row.get(1)?,
        telegram_id: row.get(2)?,
        state: state_from_column(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Claim the next delivery for `target`.
///
/// `exhausted_penalty` is charged to the bot when a bot-wide claim finds
/// nothing left to send.
pub async fn take(
    db: &Database,
    target: &DeliveryTarget,
    exhausted_penalty: u32,
) -> Result<Option<DeliveryTakeResult>, BarkerError> {
    let target = *target;
    let outcome = db
        .connection()
        .call(move |conn| -> Result<ClaimOutcome, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let outcome = claim(&tx, &target, exhausted_penalty)?;
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        ClaimOutcome::Claimed(result) => {
            debug!(
                bot_id = result.delivery.bot_id,
                campaign_id = result.delivery.campaign_id,
                telegram_id = result.delivery.telegram_id,
                "delivery claimed"
            );
            Ok(Some(result))
        }
        ClaimOutcome::Exhausted => {
            debug!(bot_id = target.bot_id, mode = ?target.mode(), "nothing left to claim");
            Ok(None)
        }
        ClaimOutcome::MissingBot => Err(BarkerError::not_found("bot", target.bot_id)),
        ClaimOutcome::MissingCampaign(id) => Err(BarkerError::not_found("campaign", id)),
    }
}

fn claim(
    conn: &Connection,
    target: &DeliveryTarget,
    exhausted_penalty: u32,
) -> rusqlite::Result<ClaimOutcome> {
    let bot_id = target.bot_id;
    let bot_exists = conn
        .query_row("SELECT 1 FROM bots WHERE id = ?1", params![bot_id], |_| Ok(()))
        .optional()?
        .is_some();
    if !bot_exists {
        return Ok(ClaimOutcome::MissingBot);
    }

    let pair = match target.mode() {
        ClaimMode::Exact {
            campaign_id,
            telegram_id,
        } => match owned_campaign(conn, bot_id, campaign_id)? {
            Err(outcome) => return Ok(outcome),
            Ok(None) => None,
            Ok(Some(campaign)) => bot_user(conn, bot_id, telegram_id)?.map(|u| (campaign, u)),
        },
        ClaimMode::Campaign { campaign_id } => match owned_campaign(conn, bot_id, campaign_id)? {
            Err(outcome) => return Ok(outcome),
            Ok(None) => None,
            Ok(Some(campaign)) => {
                next_recipient(conn, bot_id, campaign.id)?.map(|u| (campaign, u))
            }
        },
        ClaimMode::Recipient { telegram_id } => match bot_user(conn, bot_id, telegram_id)? {
            None => None,
            Some(user) => {
                next_campaign_for_recipient(conn, bot_id, telegram_id)?.map(|c| (c, user))
            }
        },
        ClaimMode::Bot => match next_open_campaign(conn, bot_id)? {
            None => None,
            Some(campaign) => next_recipient(conn, bot_id, campaign.id)?.map(|u| (campaign, u)),
        },
    };

    let Some((campaign, user)) = pair else {
        if target.mode() == ClaimMode::Bot && exhausted_penalty > 0 {
            raise_penalty(conn, bot_id, exhausted_penalty)?;
        }
        return Ok(ClaimOutcome::Exhausted);
    };

    let sql = format!(
        "INSERT INTO deliveries (bot_id, campaign_id, telegram_id, state)
         VALUES (?1, ?2, ?3, 'progress')
         ON CONFLICT (bot_id, campaign_id, telegram_id) DO NOTHING
         RETURNING {DELIVERY_COLUMNS}"
    );
    let inserted = conn
        .query_row(
            &sql,
            params![bot_id, campaign.id, user.telegram_id],
            delivery_from_row,
        )
        .optional()?;

    Ok(match inserted {
        Some(delivery) => ClaimOutcome::Claimed(DeliveryTakeResult {
            delivery,
            campaign,
            user,
        }),
        None => ClaimOutcome::Exhausted,
    })
}

/// Load an explicitly addressed campaign.
///
/// `Err` carries the outcome for an id that does not exist at all;
/// `Ok(None)` means it exists under a different bot.
fn owned_campaign(
    conn: &Connection,
    bot_id: BotId,
    campaign_id: CampaignId,
) -> rusqlite::Result<Result<Option<Campaign>, ClaimOutcome>> {
    let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1");
    let campaign = conn
        .query_row(&sql, params![campaign_id], campaign_from_row)
        .optional()?;
    Ok(match campaign {
        None => Err(ClaimOutcome::MissingCampaign(campaign_id)),
        Some(c) if c.bot_id != bot_id => Ok(None),
        Some(c) => Ok(Some(c)),
    })
}

fn bot_user(
    conn: &Connection,
    bot_id: BotId,
    telegram_id: TelegramId,
) -> rusqlite::Result<Option<User>> {
    let sql =
        format!("SELECT {USER_COLUMNS} FROM users WHERE bot_id = ?1 AND telegram_id = ?2");
    conn.query_row(&sql, params![bot_id, telegram_id], user_from_row)
        .optional()
}

/// Apply a state machine transition to an existing delivery.
///
/// `penalty` is charged to the delivery's bot in the same transaction when
/// the state actually changes.
pub async fn set_state(
    db: &Database,
    key: &DeliveryKey,
    target: DeliveryState,
    penalty: u32,
) -> Result<Transition, BarkerError> {
    let key = *key;
    let result = db
        .connection()
        .call(
            move |conn| -> Result<Result<Transition, BarkerError>, rusqlite::Error> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                let Some(current) = read_state(&tx, &key)? else {
                    return Ok(Err(BarkerError::not_found("delivery", key)));
                };
                let transition = match current.transition(target) {
                    Ok(t) => t,
                    Err(e) => return Ok(Err(e)),
                };
                if let Transition::Changed { from, to } = transition {
                    let sql = format!(
                        "UPDATE deliveries SET state = ?1, updated_at = {NOW}
                         WHERE bot_id = ?2 AND campaign_id = ?3 AND telegram_id = ?4
                           AND state = ?5"
                    );
                    tx.execute(
                        &sql,
                        params![
                            to.as_str(),
                            key.bot_id,
                            key.campaign_id,
                            key.telegram_id,
                            from.as_str()
                        ],
                    )?;
                    if penalty > 0 {
                        raise_penalty(&tx, key.bot_id, penalty)?;
                    }
                }
                tx.commit()?;
                Ok(Ok(transition))
            },
        )
        .await
        .map_err(map_tr_err)?;

    if let Ok(Transition::Changed { from, to }) = &result {
        debug!(%key, %from, %to, "delivery state changed");
    }
    result
}

pub async fn get_state(db: &Database, key: &DeliveryKey) -> Result<DeliveryState, BarkerError> {
    let key = *key;
    db.connection()
        .call(move |conn| -> Result<Option<DeliveryState>, rusqlite::Error> {
            read_state(conn, &key)
        })
        .await
        .map_err(map_tr_err)?
        .ok_or_else(|| BarkerError::not_found("delivery", key))
}

fn read_state(conn: &Connection, key: &DeliveryKey) -> rusqlite::Result<Option<DeliveryState>> {
    conn.query_row(
        "SELECT state FROM deliveries
         WHERE bot_id = ?1 AND campaign_id = ?2 AND telegram_id = ?3",
        params![key.bot_id, key.campaign_id, key.telegram_id],
        |row| state_from_column(row, 0),
    )
    .optional()
}
