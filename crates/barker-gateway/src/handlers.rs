// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the ledger REST API.
//!
//! Successful responses are wrapped as `{"data": ...}`, list responses add
//! `"paging"`, and errors are `{"error": "..."}`.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use barker_core::types::{
    Bot, BotId, Campaign, CampaignId, CampaignStatistics, DeliveryKey, DeliveryTakeResult,
    DeliveryTarget, HealthStatus, NewBot, NewCampaign, Page, PageRequest, Paging, TelegramId, User,
};
use barker_core::{
    Backend, BarkerError, BotStore, CampaignStore, DeliveryState, DeliveryStore, ErrorKind,
    UserStore,
};

use crate::server::GatewayState;

/// Success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Success envelope for paged lists.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub paging: Paging,
}

impl<T> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            paging: page.paging,
        }
    }
}

/// Error response body.
///
/// `error` is for humans. Clients switch on `kind` and read the structured
/// fields that belong to it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    pub kind: ErrorKind,
    /// Missing entity, for `not_found`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Key of the missing entity, for `not_found`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Current state, for `invalid_transition`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DeliveryState>,
    /// Rejected target state, for `invalid_transition`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DeliveryState>,
    /// Reason without the category prefix, for `invalid_input`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    fn bare(kind: ErrorKind, error: String) -> Self {
        Self {
            error,
            kind,
            entity: None,
            key: None,
            from: None,
            to: None,
            detail: None,
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::bare(ErrorKind::Unauthorized, message.to_string())
    }
}

impl From<&BarkerError> for ErrorResponse {
    fn from(err: &BarkerError) -> Self {
        let mut body = Self::bare(err.kind(), err.to_string());
        match err {
            BarkerError::NotFound { entity, key } => {
                body.entity = Some(entity.clone());
                body.key = Some(key.clone());
            }
            BarkerError::InvalidTransition { from, to } => {
                body.from = Some(*from);
                body.to = Some(*to);
            }
            BarkerError::InvalidInput(detail) => body.detail = Some(detail.clone()),
            _ => {}
        }
        body
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, `degraded`, or `unhealthy`.
    pub status: String,
    /// Ledger backend behind the API.
    pub backend: String,
    /// Binary version.
    pub version: String,
    pub uptime_secs: u64,
    /// Reason for a degraded or unhealthy status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Title and token accepted by bot create and update.
#[derive(Debug, Deserialize)]
pub struct BotBody {
    pub title: String,
    pub token: String,
}

/// Mutable campaign fields accepted by campaign create and update.
#[derive(Debug, Deserialize)]
pub struct CampaignBody {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub active: bool,
}

/// Recipient profile accepted by PUT /bot/{bot_id}/user.
#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub telegram_id: TelegramId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimQuery {
    #[serde(default)]
    pub telegram_id: Option<TelegramId>,
}

/// A [`BarkerError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub BarkerError);

impl From<BarkerError> for ApiError {
    fn from(err: BarkerError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &BarkerError) -> StatusCode {
    match err {
        BarkerError::NotFound { .. } => StatusCode::NOT_FOUND,
        BarkerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        BarkerError::InvalidTransition { .. } => StatusCode::CONFLICT,
        BarkerError::Remote { .. } => StatusCode::BAD_GATEWAY,
        BarkerError::Config(_) | BarkerError::Storage { .. } | BarkerError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn data<T>(data: T) -> ApiResult<DataResponse<T>> {
    Ok(Json(DataResponse { data }))
}

/// Accepts a state name (`success`) or its numeric code (`2`).
fn parse_state(raw: &str) -> Result<DeliveryState, BarkerError> {
    if let Ok(code) = raw.parse::<u8>() {
        return DeliveryState::from_code(code)
            .ok_or_else(|| BarkerError::InvalidInput(format!("unknown delivery state code: {code}")));
    }
    DeliveryState::from_str(raw)
        .map_err(|_| BarkerError::InvalidInput(format!("unknown delivery state: {raw}")))
}

/// GET /health
///
/// Unauthenticated. 503 when the ledger is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (status, detail) = match state.ledger.health_check().await {
        Ok(HealthStatus::Healthy) => ("ok", None),
        Ok(HealthStatus::Degraded(reason)) => ("degraded", Some(reason)),
        Ok(HealthStatus::Unhealthy(reason)) => ("unhealthy", Some(reason)),
        Err(e) => ("unhealthy", Some(e.to_string())),
    };
    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = HealthResponse {
        status: status.to_string(),
        backend: state.ledger.kind().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        detail,
    };
    (code, Json(body)).into_response()
}

// --- Bots ---

pub async fn create_bot(
    State(state): State<GatewayState>,
    Json(body): Json<BotBody>,
) -> ApiResult<DataResponse<Bot>> {
    let bot = state
        .ledger
        .create_bot(&NewBot {
            title: body.title,
            token: body.token,
        })
        .await?;
    tracing::info!(bot_id = bot.id, "bot created");
    data(bot)
}

pub async fn list_bots(
    State(state): State<GatewayState>,
    Query(page): Query<PageRequest>,
) -> ApiResult<ListResponse<Bot>> {
    Ok(Json(state.ledger.list_bots(&page).await?.into()))
}

/// POST /bot/next
pub async fn next_bot(State(state): State<GatewayState>) -> ApiResult<DataResponse<Bot>> {
    data(state.ledger.rr_take().await?)
}

pub async fn get_bot(
    State(state): State<GatewayState>,
    Path(bot_id): Path<BotId>,
) -> ApiResult<DataResponse<Bot>> {
    let bot = state
        .ledger
        .get_bot(bot_id)
        .await?
        .ok_or_else(|| BarkerError::not_found("bot", bot_id))?;
    data(bot)
}

pub async fn update_bot(
    State(state): State<GatewayState>,
    Path(bot_id): Path<BotId>,
    Json(body): Json<BotBody>,
) -> ApiResult<DataResponse<Bot>> {
    let bot = state
        .ledger
        .update_bot(&Bot {
            id: bot_id,
            title: body.title,
            token: body.token,
            rr_access_seq: None,
            rr_penalty: 0,
        })
        .await?;
    data(bot)
}

// --- Recipients ---

pub async fn list_users(
    State(state): State<GatewayState>,
    Path(bot_id): Path<BotId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<ListResponse<User>> {
    Ok(Json(state.ledger.list_users(bot_id, &page).await?.into()))
}

pub async fn put_user(
    State(state): State<GatewayState>,
    Path(bot_id): Path<BotId>,
    Json(body): Json<UserBody>,
) -> ApiResult<DataResponse<User>> {
    let user = state
        .ledger
        .put_user(&User {
            bot_id,
            telegram_id: body.telegram_id,
            first_name: body.first_name,
            last_name: body.last_name,
            display_name: body.display_name,
            user_name: body.user_name,
        })
        .await?;
    data(user)
}

pub async fn get_user(
    State(state): State<GatewayState>,
    Path((bot_id, telegram_id)): Path<(BotId, TelegramId)>,
) -> ApiResult<DataResponse<User>> {
    let user = state
        .ledger
        .get_user(bot_id, telegram_id)
        .await?
        .ok_or_else(|| BarkerError::not_found("user", telegram_id))?;
    data(user)
}

// --- Campaigns ---

pub async fn list_campaigns(
    State(state): State<GatewayState>,
    Path(bot_id): Path<BotId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<ListResponse<Campaign>> {
    Ok(Json(state.ledger.list_campaigns(bot_id, &page).await?.into()))
}

pub async fn create_campaign(
    State(state): State<GatewayState>,
    Path(bot_id): Path<BotId>,
    Json(body): Json<CampaignBody>,
) -> ApiResult<DataResponse<Campaign>> {
    let campaign = state
        .ledger
        .create_campaign(&NewCampaign {
            bot_id,
            title: body.title,
            message: body.message,
            active: body.active,
        })
        .await?;
    tracing::info!(bot_id, campaign_id = campaign.id, "campaign created");
    data(campaign)
}

pub async fn get_campaign(
    State(state): State<GatewayState>,
    Path((bot_id, campaign_id)): Path<(BotId, CampaignId)>,
) -> ApiResult<DataResponse<Campaign>> {
    let campaign = state
        .ledger
        .get_campaign(bot_id, campaign_id)
        .await?
        .ok_or_else(|| BarkerError::not_found("campaign", campaign_id))?;
    data(campaign)
}

pub async fn update_campaign(
    State(state): State<GatewayState>,
    Path((bot_id, campaign_id)): Path<(BotId, CampaignId)>,
    Json(body): Json<CampaignBody>,
) -> ApiResult<DataResponse<Campaign>> {
    let campaign = state
        .ledger
        .update_campaign(&Campaign {
            id: campaign_id,
            bot_id,
            title: body.title,
            message: body.message,
            active: body.active,
        })
        .await?;
    data(campaign)
}

pub async fn aggregated_statistics(
    State(state): State<GatewayState>,
    Path((bot_id, campaign_id)): Path<(BotId, CampaignId)>,
) -> ApiResult<DataResponse<CampaignStatistics>> {
    data(state.ledger.aggregated_statistics(bot_id, campaign_id).await?)
}

// --- Deliveries ---

/// POST /bot/{bot_id}/delivery?telegram_id=
///
/// `data` is `null` when there is nothing left to claim.
pub async fn claim_for_bot(
    State(state): State<GatewayState>,
    Path(bot_id): Path<BotId>,
    Query(query): Query<ClaimQuery>,
) -> ApiResult<DataResponse<Option<DeliveryTakeResult>>> {
    let target = DeliveryTarget {
        bot_id,
        campaign_id: None,
        telegram_id: query.telegram_id,
    };
    data(state.ledger.take(&target).await?)
}

/// POST /bot/{bot_id}/campaign/{campaign_id}/delivery?telegram_id=
pub async fn claim_for_campaign(
    State(state): State<GatewayState>,
    Path((bot_id, campaign_id)): Path<(BotId, CampaignId)>,
    Query(query): Query<ClaimQuery>,
) -> ApiResult<DataResponse<Option<DeliveryTakeResult>>> {
    let target = DeliveryTarget {
        bot_id,
        campaign_id: Some(campaign_id),
        telegram_id: query.telegram_id,
    };
    data(state.ledger.take(&target).await?)
}

pub async fn set_delivery_state(
    State(state): State<GatewayState>,
    Path((bot_id, campaign_id, telegram_id, raw_state)): Path<(
        BotId,
        CampaignId,
        TelegramId,
        String,
    )>,
) -> ApiResult<DataResponse<DeliveryState>> {
    let target = parse_state(&raw_state)?;
    let key = DeliveryKey {
        bot_id,
        campaign_id,
        telegram_id,
    };
    state.ledger.set_state(&key, target).await?;
    data(target)
}

pub async fn get_delivery_state(
    State(state): State<GatewayState>,
    Path((bot_id, campaign_id, telegram_id)): Path<(BotId, CampaignId, TelegramId)>,
) -> ApiResult<DataResponse<DeliveryState>> {
    let key = DeliveryKey {
        bot_id,
        campaign_id,
        telegram_id,
    };
    data(state.ledger.get_state(&key).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_statuses() {
        assert_eq!(
            status_for(&BarkerError::not_found("bot", 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&BarkerError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&BarkerError::InvalidTransition {
                from: DeliveryState::Success,
                to: DeliveryState::Fail,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&BarkerError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn state_accepts_names_and_codes() {
        assert_eq!(parse_state("success").unwrap(), DeliveryState::Success);
        assert_eq!(parse_state("FAIL").unwrap(), DeliveryState::Fail);
        assert_eq!(parse_state("2").unwrap(), DeliveryState::Success);
        assert!(matches!(
            parse_state("9"),
            Err(BarkerError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_state("sent"),
            Err(BarkerError::InvalidInput(_))
        ));
    }

    #[test]
    fn error_body_carries_kind_and_fields() {
        let body = serde_json::to_value(ErrorResponse::from(&BarkerError::not_found("campaign", 7)))
            .unwrap();
        assert_eq!(body["kind"], "not_found");
        assert_eq!(body["entity"], "campaign");
        assert_eq!(body["key"], "7");
        assert!(body.get("from").is_none());

        let body = serde_json::to_value(ErrorResponse::from(&BarkerError::InvalidTransition {
            from: DeliveryState::Success,
            to: DeliveryState::Fail,
        }))
        .unwrap();
        assert_eq!(body["kind"], "invalid_transition");
        assert_eq!(body["from"], "success");
        assert_eq!(body["to"], "fail");

        let body =
            serde_json::to_value(ErrorResponse::from(&BarkerError::InvalidInput("page".into())))
                .unwrap();
        assert_eq!(body["kind"], "invalid_input");
        assert_eq!(body["detail"], "page");
        assert_eq!(body["error"], "invalid input: page");
    }

    #[test]
    fn exhausted_claim_serializes_as_null() {
        let body = DataResponse::<Option<DeliveryTakeResult>> { data: None };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"data":null}"#);
    }

    #[test]
    fn health_response_omits_empty_detail() {
        let resp = HealthResponse {
            status: "ok".to_string(),
            backend: "sqlite".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 42,
            detail: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
        assert!(!json.contains("detail"));
    }
}
