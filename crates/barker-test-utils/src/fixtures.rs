// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seeding helpers that work against any [`Ledger`], local or remote.

use barker_core::types::{Bot, BotId, Campaign, NewBot, NewCampaign, TelegramId, User};
use barker_core::{BarkerError, BotStore, CampaignStore, Ledger, UserStore};

/// First recipient id handed out by [`seed_users`] callers that use [`recipient_ids`].
pub const FIRST_TELEGRAM_ID: TelegramId = 1001;

/// `count` consecutive recipient ids starting at [`FIRST_TELEGRAM_ID`].
pub fn recipient_ids(count: usize) -> Vec<TelegramId> {
    (0..count as i64).map(|i| FIRST_TELEGRAM_ID + i).collect()
}

pub async fn seed_bot(ledger: &dyn Ledger, title: &str) -> Result<Bot, BarkerError> {
    ledger
        .create_bot(&NewBot {
            title: title.to_string(),
            token: format!("{title}-token"),
        })
        .await
}

/// Register recipients in the given order, which becomes their creation order.
pub async fn seed_users(
    ledger: &dyn Ledger,
    bot_id: BotId,
    telegram_ids: &[TelegramId],
) -> Result<Vec<User>, BarkerError> {
    let mut users = Vec::with_capacity(telegram_ids.len());
    for &telegram_id in telegram_ids {
        let user = ledger
            .put_user(&User {
                bot_id,
                telegram_id,
                first_name: Some(format!("user{telegram_id}")),
                ..Default::default()
            })
            .await?;
        users.push(user);
    }
    Ok(users)
}

pub async fn seed_campaign(
    ledger: &dyn Ledger,
    bot_id: BotId,
    title: &str,
    active: bool,
) -> Result<Campaign, BarkerError> {
    ledger
        .create_campaign(&NewCampaign {
            bot_id,
            title: title.to_string(),
            message: format!("{title} message"),
            active,
        })
        .await
}
