// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker and admin subcommands.
//!
//! Each command runs one ledger operation and prints its result as JSON.
//! The ledger is the remote gateway when `[client] base_url` is configured
//! (or `--remote` is passed) and the local SQLite database otherwise.

use std::sync::Arc;

use barker_client::RemoteLedger;
use barker_config::model::BarkerConfig;
use barker_core::types::{
    BotId, CampaignId, DeliveryKey, DeliveryTarget, NewBot, NewCampaign, PageRequest, TelegramId,
    User,
};
use barker_core::{
    Backend, BarkerError, BotStore, CampaignStore, DeliveryState, DeliveryStore, Ledger, UserStore,
};
use barker_storage::SqliteLedger;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Pick the next bot in the rotation.
    NextBot,
    /// Claim the next delivery for a bot.
    Take {
        #[arg(long)]
        bot: BotId,
        /// Restrict the claim to one campaign.
        #[arg(long)]
        campaign: Option<CampaignId>,
        /// Restrict the claim to one recipient.
        #[arg(long)]
        telegram_id: Option<TelegramId>,
    },
    /// Report a delivery outcome.
    SetState {
        #[arg(long)]
        bot: BotId,
        #[arg(long)]
        campaign: CampaignId,
        #[arg(long)]
        telegram_id: TelegramId,
        /// State name (`success`, `fail`, ...) or numeric code.
        #[arg(long, value_parser = parse_state_arg)]
        state: DeliveryState,
    },
    /// Read a delivery's state.
    GetState {
        #[arg(long)]
        bot: BotId,
        #[arg(long)]
        campaign: CampaignId,
        #[arg(long)]
        telegram_id: TelegramId,
    },
    /// Aggregated delivery counters of a campaign.
    Stats {
        #[arg(long)]
        bot: BotId,
        #[arg(long)]
        campaign: CampaignId,
    },
    /// Register a bot.
    AddBot {
        #[arg(long)]
        title: String,
        #[arg(long)]
        token: String,
    },
    /// List registered bots.
    Bots {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// Create a campaign for a bot.
    AddCampaign {
        #[arg(long)]
        bot: BotId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
        /// Create the campaign switched off.
        #[arg(long)]
        inactive: bool,
    },
    /// Insert a recipient, or merge profile fields into an existing one.
    PutUser {
        #[arg(long)]
        bot: BotId,
        #[arg(long)]
        telegram_id: TelegramId,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        user_name: Option<String>,
    },
}

/// Accept a state name (case-insensitive) or its numeric code.
pub fn parse_state_arg(raw: &str) -> Result<DeliveryState, String> {
    if let Ok(code) = raw.parse::<u8>() {
        return DeliveryState::from_code(code).ok_or_else(|| format!("unknown state code {code}"));
    }
    raw.parse::<DeliveryState>()
        .map_err(|_| format!("unknown state '{raw}'"))
}

/// Open and initialize the ledger a worker command talks to.
pub async fn open_ledger(config: &BarkerConfig, remote: bool) -> Result<Arc<dyn Ledger>, BarkerError> {
    let ledger: Arc<dyn Ledger> = if remote || config.client.base_url.is_some() {
        Arc::new(RemoteLedger::from_config(&config.client)?)
    } else {
        Arc::new(SqliteLedger::from_config(config))
    };
    ledger.initialize().await?;
    debug!(backend = ledger.name(), "ledger ready");
    Ok(ledger)
}

/// Run `command` against `ledger` and return its JSON rendering.
pub async fn execute(ledger: &dyn Ledger, command: &WorkerCommand) -> Result<Value, BarkerError> {
    match command {
        WorkerCommand::NextBot => to_json(&ledger.rr_take().await?),
        WorkerCommand::Take {
            bot,
            campaign,
            telegram_id,
        } => {
            let mut target = DeliveryTarget::bot(*bot);
            if let Some(campaign) = campaign {
                target = target.with_campaign(*campaign);
            }
            if let Some(telegram_id) = telegram_id {
                target = target.with_recipient(*telegram_id);
            }
            to_json(&ledger.take(&target).await?)
        }
        WorkerCommand::SetState {
            bot,
            campaign,
            telegram_id,
            state,
        } => {
            let key = delivery_key(*bot, *campaign, *telegram_id);
            ledger.set_state(&key, *state).await?;
            to_json(state)
        }
        WorkerCommand::GetState {
            bot,
            campaign,
            telegram_id,
        } => to_json(&ledger.get_state(&delivery_key(*bot, *campaign, *telegram_id)).await?),
        WorkerCommand::Stats { bot, campaign } => {
            to_json(&ledger.aggregated_statistics(*bot, *campaign).await?)
        }
        WorkerCommand::AddBot { title, token } => {
            let bot = NewBot {
                title: title.clone(),
                token: token.clone(),
            };
            to_json(&ledger.create_bot(&bot).await?)
        }
        WorkerCommand::Bots { page, size } => {
            to_json(&ledger.list_bots(&PageRequest::new(*page, *size)).await?)
        }
        WorkerCommand::AddCampaign {
            bot,
            title,
            message,
            inactive,
        } => {
            let campaign = NewCampaign {
                bot_id: *bot,
                title: title.clone(),
                message: message.clone(),
                active: !inactive,
            };
            to_json(&ledger.create_campaign(&campaign).await?)
        }
        WorkerCommand::PutUser {
            bot,
            telegram_id,
            first_name,
            last_name,
            display_name,
            user_name,
        } => {
            let user = User {
                bot_id: *bot,
                telegram_id: *telegram_id,
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                display_name: display_name.clone(),
                user_name: user_name.clone(),
            };
            to_json(&ledger.put_user(&user).await?)
        }
    }
}

fn delivery_key(bot_id: BotId, campaign_id: CampaignId, telegram_id: TelegramId) -> DeliveryKey {
    DeliveryKey {
        bot_id,
        campaign_id,
        telegram_id,
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, BarkerError> {
    serde_json::to_value(value)
        .map_err(|e| BarkerError::Internal(format!("failed to render output: {e}")))
}
