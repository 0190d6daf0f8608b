// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits of the delivery ledger.
//!
//! Each trait covers one entity. [`Ledger`] bundles them so callers can hold a
//! single `Arc<dyn Ledger>` and stay unaware of whether the ledger is a local
//! database or a remote service.

use async_trait::async_trait;

use crate::error::BarkerError;
use crate::state::DeliveryState;
use crate::traits::adapter::Backend;
use crate::types::{
    Bot, BotId, Campaign, CampaignId, CampaignStatistics, DeliveryKey, DeliveryTakeResult,
    DeliveryTarget, NewBot, NewCampaign, Page, PageRequest, TelegramId, User,
};

/// Bot administration and round-robin rotation.
#[async_trait]
pub trait BotStore: Send + Sync {
    async fn create_bot(&self, bot: &NewBot) -> Result<Bot, BarkerError>;

    /// Replaces title and token. Fails with `NotFound` for an unknown id.
    async fn update_bot(&self, bot: &Bot) -> Result<Bot, BarkerError>;

    async fn get_bot(&self, id: BotId) -> Result<Option<Bot>, BarkerError>;

    /// Newest bots first.
    async fn list_bots(&self, page: &PageRequest) -> Result<Page<Bot>, BarkerError>;

    /// Hands out the next bot in rotation and records the turn.
    ///
    /// Fails with `NotFound` only when no bot exists.
    async fn rr_take(&self) -> Result<Bot, BarkerError>;
}

/// Recipient administration.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the recipient or merges set profile fields into the stored one.
    async fn put_user(&self, user: &User) -> Result<User, BarkerError>;

    async fn get_user(
        &self,
        bot_id: BotId,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, BarkerError>;

    /// Recipients in creation order.
    async fn list_users(&self, bot_id: BotId, page: &PageRequest)
    -> Result<Page<User>, BarkerError>;
}

/// Campaign administration and reporting.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Fails with `NotFound` if the owning bot does not exist.
    async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, BarkerError>;

    /// Updates title, message, and active flag of the campaign matching both
    /// `id` and `bot_id`.
    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, BarkerError>;

    /// Returns `None` when the campaign is missing or owned by another bot.
    async fn get_campaign(
        &self,
        bot_id: BotId,
        id: CampaignId,
    ) -> Result<Option<Campaign>, BarkerError>;

    /// Newest campaigns first.
    async fn list_campaigns(
        &self,
        bot_id: BotId,
        page: &PageRequest,
    ) -> Result<Page<Campaign>, BarkerError>;

    async fn aggregated_statistics(
        &self,
        bot_id: BotId,
        campaign_id: CampaignId,
    ) -> Result<CampaignStatistics, BarkerError>;
}

/// Delivery claim and the delivery state machine.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Atomically claims the next eligible delivery for `target`.
    ///
    /// Returns `Ok(None)` when nothing is left to claim, including when the
    /// campaign or recipient belongs to a different bot.
    async fn take(&self, target: &DeliveryTarget)
    -> Result<Option<DeliveryTakeResult>, BarkerError>;

    async fn set_state(&self, key: &DeliveryKey, state: DeliveryState) -> Result<(), BarkerError>;

    async fn get_state(&self, key: &DeliveryKey) -> Result<DeliveryState, BarkerError>;
}

/// Everything a dispatch worker or the HTTP gateway needs from a ledger.
pub trait Ledger: Backend + BotStore + UserStore + CampaignStore + DeliveryStore {}

impl<T> Ledger for T where T: Backend + BotStore + UserStore + CampaignStore + DeliveryStore {}
