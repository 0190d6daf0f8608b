// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of the ledger traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use barker_config::model::ClientConfig;
use barker_core::types::{
    BackendKind, Bot, BotId, Campaign, CampaignId, CampaignStatistics, DeliveryKey,
    DeliveryTakeResult, DeliveryTarget, HealthStatus, NewBot, NewCampaign, Page, PageRequest,
    TelegramId, User,
};
use barker_core::{
    Backend, BarkerError, BotStore, CampaignStore, DeliveryState, DeliveryStore, UserStore,
};

use crate::wire::{BotBody, CampaignBody, Envelope, HealthBody, ListEnvelope, decode_error};

/// Ledger backed by a remote `barker serve` gateway.
#[derive(Debug, Clone)]
pub struct RemoteLedger {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteLedger {
    /// Creates a client for the gateway at `base_url`.
    ///
    /// `bearer_token` is sent with every request when present.
    pub fn new(
        base_url: &str,
        bearer_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BarkerError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                BarkerError::Config(format!("invalid bearer token header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BarkerError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client from the `[client]` section. `base_url` is required.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BarkerError> {
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            BarkerError::Config("client.base_url is required for the remote ledger".into())
        })?;
        Self::new(
            base_url,
            config.bearer_token.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
    }

    /// Send and return the raw body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, BarkerError> {
        let response = request.send().await.map_err(|e| BarkerError::Remote {
            status: None,
            message: format!("HTTP request failed: {e}"),
        })?;
        let status = response.status();
        debug!(status = %status, url = %response.url(), "gateway response received");

        let body = response.text().await.map_err(|e| BarkerError::Remote {
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {e}"),
        })?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(decode_error(status.as_u16(), &body))
        }
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BarkerError> {
        let body = self.execute(request).await?;
        let envelope: Envelope<T> = parse(&body)?;
        Ok(envelope.data)
    }

    /// Like [`Self::data`] but maps `NotFound` to `None`.
    async fn optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, BarkerError> {
        match self.data(request).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: &PageRequest,
    ) -> Result<Page<T>, BarkerError> {
        let path = format!("{path}?page={}&size={}", page.page, page.size);
        let body = self.execute(self.request(Method::GET, &path)).await?;
        let envelope: ListEnvelope<T> = parse(&body)?;
        Ok(envelope.into_page())
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, BarkerError> {
    serde_json::from_str(body).map_err(|e| BarkerError::Remote {
        status: None,
        message: format!("failed to parse gateway response: {e}"),
    })
}

fn claim_path(target: &DeliveryTarget) -> String {
    let mut path = match target.campaign_id {
        Some(campaign_id) => format!("/bot/{}/campaign/{campaign_id}/delivery", target.bot_id),
        None => format!("/bot/{}/delivery", target.bot_id),
    };
    if let Some(telegram_id) = target.telegram_id {
        path.push_str(&format!("?telegram_id={telegram_id}"));
    }
    path
}

fn state_path(key: &DeliveryKey) -> String {
    format!(
        "/bot/{}/campaign/{}/delivery/{}/state",
        key.bot_id, key.campaign_id, key.telegram_id
    )
}

#[async_trait]
impl Backend for RemoteLedger {
    fn name(&self) -> &str {
        "remote"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    /// Verifies the gateway is reachable.
    async fn initialize(&self) -> Result<(), BarkerError> {
        match self.health_check().await? {
            HealthStatus::Unhealthy(reason) => Err(BarkerError::Remote {
                status: None,
                message: format!("gateway at {} is unhealthy: {reason}", self.base_url),
            }),
            _ => {
                info!(base_url = %self.base_url, "remote ledger connected");
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> Result<HealthStatus, BarkerError> {
        let response = self
            .request(Method::GET, "/health")
            .send()
            .await
            .map_err(|e| BarkerError::Remote {
                status: None,
                message: format!("health request failed: {e}"),
            })?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let health = serde_json::from_str::<HealthBody>(&body).ok();

        Ok(match health {
            Some(h) if h.status == "ok" => HealthStatus::Healthy,
            Some(h) if h.status == "degraded" => {
                HealthStatus::Degraded(h.detail.unwrap_or_default())
            }
            Some(h) => HealthStatus::Unhealthy(h.detail.unwrap_or(h.status)),
            None => HealthStatus::Unhealthy(format!("gateway returned {status}")),
        })
    }

    async fn shutdown(&self) -> Result<(), BarkerError> {
        Ok(())
    }
}

#[async_trait]
impl BotStore for RemoteLedger {
    async fn create_bot(&self, bot: &NewBot) -> Result<Bot, BarkerError> {
        let body = BotBody {
            title: &bot.title,
            token: &bot.token,
        };
        self.data(self.request(Method::POST, "/bot").json(&body)).await
    }

    async fn update_bot(&self, bot: &Bot) -> Result<Bot, BarkerError> {
        let body = BotBody {
            title: &bot.title,
            token: &bot.token,
        };
        self.data(
            self.request(Method::PUT, &format!("/bot/{}", bot.id))
                .json(&body),
        )
        .await
    }

    async fn get_bot(&self, id: BotId) -> Result<Option<Bot>, BarkerError> {
        self.optional(self.request(Method::GET, &format!("/bot/{id}")))
            .await
    }

    async fn list_bots(&self, page: &PageRequest) -> Result<Page<Bot>, BarkerError> {
        self.page("/bot", page).await
    }

    async fn rr_take(&self) -> Result<Bot, BarkerError> {
        self.data(self.request(Method::POST, "/bot/next")).await
    }
}

#[async_trait]
impl UserStore for RemoteLedger {
    async fn put_user(&self, user: &User) -> Result<User, BarkerError> {
        self.data(
            self.request(Method::PUT, &format!("/bot/{}/user", user.bot_id))
                .json(user),
        )
        .await
    }

    async fn get_user(
        &self,
        bot_id: BotId,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, BarkerError> {
        self.optional(self.request(Method::GET, &format!("/bot/{bot_id}/user/{telegram_id}")))
            .await
    }

    async fn list_users(&self, bot_id: BotId, page: &PageRequest) -> Result<Page<User>, BarkerError> {
        self.page(&format!("/bot/{bot_id}/user"), page).await
    }
}

#[async_trait]
impl CampaignStore for RemoteLedger {
    async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, BarkerError> {
        let body = CampaignBody {
            title: &campaign.title,
            message: &campaign.message,
            active: campaign.active,
        };
        self.data(
            self.request(Method::POST, &format!("/bot/{}/campaign", campaign.bot_id))
                .json(&body),
        )
        .await
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, BarkerError> {
        let body = CampaignBody {
            title: &campaign.title,
            message: &campaign.message,
            active: campaign.active,
        };
        let path = format!("/bot/{}/campaign/{}", campaign.bot_id, campaign.id);
        self.data(self.request(Method::PUT, &path).json(&body)).await
    }

    async fn get_campaign(
        &self,
        bot_id: BotId,
        id: CampaignId,
    ) -> Result<Option<Campaign>, BarkerError> {
        self.optional(self.request(Method::GET, &format!("/bot/{bot_id}/campaign/{id}")))
            .await
    }

    async fn list_campaigns(
        &self,
        bot_id: BotId,
        page: &PageRequest,
    ) -> Result<Page<Campaign>, BarkerError> {
        self.page(&format!("/bot/{bot_id}/campaign"), page).await
    }

    async fn aggregated_statistics(
        &self,
        bot_id: BotId,
        campaign_id: CampaignId,
    ) -> Result<CampaignStatistics, BarkerError> {
        let path = format!("/bot/{bot_id}/campaign/{campaign_id}/aggregatedStatistics");
        self.data(self.request(Method::GET, &path)).await
    }
}

#[async_trait]
impl DeliveryStore for RemoteLedger {
    async fn take(&self, target: &DeliveryTarget) -> Result<Option<DeliveryTakeResult>, BarkerError> {
        self.data(self.request(Method::POST, &claim_path(target)))
            .await
    }

    async fn set_state(&self, key: &DeliveryKey, state: DeliveryState) -> Result<(), BarkerError> {
        let path = format!("{}/{}", state_path(key), state.as_str());
        let _: DeliveryState = self.data(self.request(Method::PUT, &path)).await?;
        Ok(())
    }

    async fn get_state(&self, key: &DeliveryKey) -> Result<DeliveryState, BarkerError> {
        self.data(self.request(Method::GET, &state_path(key))).await
    }
}
