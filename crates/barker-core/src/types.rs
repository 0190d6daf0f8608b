// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by every ledger implementation and the HTTP API.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BarkerError;
use crate::state::DeliveryState;

/// Ledger-issued bot identity.
pub type BotId = i64;

/// Ledger-issued campaign identity. Issuance order is creation order.
pub type CampaignId = i64;

/// Platform-side recipient id. Only unique within one bot.
pub type TelegramId = i64;

/// Largest page size accepted by list operations.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Health status reported by backend health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// Identifies which ledger implementation sits behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local SQLite database.
    Sqlite,
    /// HTTP client talking to a `barker serve` instance.
    Remote,
}

/// A broadcasting bot.
///
/// `rr_access_seq` and `rr_penalty` are rotation bookkeeping. They are
/// reported for diagnostics and ignored on update.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    #[serde(default)]
    pub id: BotId,
    pub title: String,
    pub token: String,
    #[serde(default)]
    pub rr_access_seq: Option<i64>,
    #[serde(default)]
    pub rr_penalty: u32,
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("token", &"[redacted]")
            .field("rr_access_seq", &self.rr_access_seq)
            .field("rr_penalty", &self.rr_penalty)
            .finish()
    }
}

/// Input for creating a bot.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewBot {
    pub title: String,
    pub token: String,
}

impl std::fmt::Debug for NewBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewBot")
            .field("title", &self.title)
            .field("token", &"[redacted]")
            .finish()
    }
}

/// A broadcast campaign owned by exactly one bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default)]
    pub id: CampaignId,
    #[serde(default)]
    pub bot_id: BotId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub active: bool,
}

/// Input for creating a campaign. The owning bot cannot change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    #[serde(default)]
    pub bot_id: BotId,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub active: bool,
}

/// Checks the fields every campaign write requires.
pub fn validate_campaign_text(title: &str, message: &str) -> Result<(), BarkerError> {
    if title.trim().is_empty() {
        return Err(BarkerError::InvalidInput(
            "campaign title must not be empty".into(),
        ));
    }
    if message.trim().is_empty() {
        return Err(BarkerError::InvalidInput(
            "campaign message must not be empty".into(),
        ));
    }
    Ok(())
}

/// A recipient, scoped to one bot.
///
/// Profile fields left `None` (or empty) on upsert keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub bot_id: BotId,
    pub telegram_id: TelegramId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Identity of one delivery row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryKey {
    pub bot_id: BotId,
    pub campaign_id: CampaignId,
    pub telegram_id: TelegramId,
}

impl std::fmt::Display for DeliveryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bot {} / campaign {} / recipient {}",
            self.bot_id, self.campaign_id, self.telegram_id
        )
    }
}

/// A claimed (bot, campaign, recipient) triple and its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub bot_id: BotId,
    pub campaign_id: CampaignId,
    pub telegram_id: TelegramId,
    pub state: DeliveryState,
    pub created_at: String,
    pub updated_at: String,
}

impl Delivery {
    pub fn key(&self) -> DeliveryKey {
        DeliveryKey {
            bot_id: self.bot_id,
            campaign_id: self.campaign_id,
            telegram_id: self.telegram_id,
        }
    }
}

/// What a worker asks the claim operation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub bot_id: BotId,
    #[serde(default)]
    pub campaign_id: Option<CampaignId>,
    #[serde(default)]
    pub telegram_id: Option<TelegramId>,
}

/// How a [`DeliveryTarget`] is resolved, derived from which parts are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMode {
    /// Campaign and recipient both fixed.
    Exact {
        campaign_id: CampaignId,
        telegram_id: TelegramId,
    },
    /// Next unclaimed recipient of one campaign.
    Campaign { campaign_id: CampaignId },
    /// Newest active campaign the recipient has not been claimed for.
    Recipient { telegram_id: TelegramId },
    /// Newest active campaign with work left, then its next recipient.
    Bot,
}

impl DeliveryTarget {
    pub fn bot(bot_id: BotId) -> Self {
        Self {
            bot_id,
            campaign_id: None,
            telegram_id: None,
        }
    }

    pub fn with_campaign(mut self, campaign_id: CampaignId) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    pub fn with_recipient(mut self, telegram_id: TelegramId) -> Self {
        self.telegram_id = Some(telegram_id);
        self
    }

    pub fn mode(&self) -> ClaimMode {
        match (self.campaign_id, self.telegram_id) {
            (Some(campaign_id), Some(telegram_id)) => ClaimMode::Exact {
                campaign_id,
                telegram_id,
            },
            (Some(campaign_id), None) => ClaimMode::Campaign { campaign_id },
            (None, Some(telegram_id)) => ClaimMode::Recipient { telegram_id },
            (None, None) => ClaimMode::Bot,
        }
    }
}

/// Result of a successful claim: the new delivery plus what a worker needs to send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTakeResult {
    pub delivery: Delivery,
    pub campaign: Campaign,
    pub user: User,
}

/// Per-campaign delivery counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStatistics {
    /// Recipients registered for the campaign's bot.
    pub recipients: u64,
    /// Deliveries in `Success`.
    pub delivered: u64,
    /// Deliveries in `Fail`.
    pub errors: u64,
    /// Recipients without a delivery row for this campaign.
    pub pending: u64,
    /// Deliveries in `Progress`, stale or not.
    pub in_progress: u64,
    /// Deliveries left in `Progress` past the staleness threshold.
    pub stale: u64,
}

/// 1-based page selection for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_page_size(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn validate(&self) -> Result<(), BarkerError> {
        if self.page == 0 {
            return Err(BarkerError::InvalidInput("page starts at 1".into()));
        }
        if self.size == 0 || self.size > MAX_PAGE_SIZE {
            return Err(BarkerError::InvalidInput(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.size
            )));
        }
        Ok(())
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// Paging metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub page: u32,
    pub size: u32,
    /// Number of pages.
    pub total: u64,
    pub total_items: u64,
}

impl Paging {
    pub fn new(request: &PageRequest, total_items: u64) -> Self {
        let size = u64::from(request.size.max(1));
        Self {
            page: request.page,
            size: request.size,
            total: total_items.div_ceil(size),
            total_items,
        }
    }
}

/// One page of a list operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub paging: Paging,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_mode_follows_present_parts() {
        let target = DeliveryTarget::bot(1);
        assert_eq!(target.mode(), ClaimMode::Bot);
        assert_eq!(
            target.with_campaign(3).mode(),
            ClaimMode::Campaign { campaign_id: 3 }
        );
        assert_eq!(
            target.with_recipient(42).mode(),
            ClaimMode::Recipient { telegram_id: 42 }
        );
        assert_eq!(
            target.with_campaign(3).with_recipient(42).mode(),
            ClaimMode::Exact {
                campaign_id: 3,
                telegram_id: 42
            }
        );
    }

    #[test]
    fn paging_counts_partial_last_page() {
        let paging = Paging::new(&PageRequest::new(1, 2), 5);
        assert_eq!(paging.total, 3);
        assert_eq!(paging.total_items, 5);

        let empty = Paging::new(&PageRequest::default(), 0);
        assert_eq!(empty.total, 0);
    }

    #[test]
    fn page_request_bounds() {
        assert!(PageRequest::default().validate().is_ok());
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert!(PageRequest::new(1, MAX_PAGE_SIZE + 1).validate().is_err());
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn bot_debug_redacts_token() {
        let bot = Bot {
            id: 1,
            title: "news".into(),
            token: "123:secret".into(),
            rr_access_seq: None,
            rr_penalty: 0,
        };
        let debug = format!("{bot:?}");
        assert!(!debug.contains("123:secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn user_omits_unset_profile_fields() {
        let user = User {
            bot_id: 1,
            telegram_id: 7,
            last_name: Some("Doe".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["last_name"], "Doe");
        assert!(json.get("first_name").is_none());
    }
}
