// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway response envelopes and error decoding.

use barker_core::types::{Page, Paging};
use barker_core::{BarkerError, DeliveryState, ErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope<T> {
    pub data: Vec<T>,
    pub paging: Paging,
}

impl<T> ListEnvelope<T> {
    pub fn into_page(self) -> Page<T> {
        Page {
            items: self.data,
            paging: self.paging,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub kind: Option<ErrorKind>,
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub from: Option<DeliveryState>,
    #[serde(default)]
    pub to: Option<DeliveryState>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthBody {
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BotBody<'a> {
    pub title: &'a str,
    pub token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CampaignBody<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub active: bool,
}

/// Rebuild a typed error from a non-2xx gateway response.
///
/// The gateway tags errors with a `kind` and its structured fields. Bodies
/// without a usable kind (auth rejections, proxies, unknown routes) stay
/// [`BarkerError::Remote`].
pub(crate) fn decode_error(status: u16, body: &str) -> BarkerError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();

    let typed = parsed.as_ref().and_then(|b| match b.kind? {
        ErrorKind::NotFound => Some(BarkerError::NotFound {
            entity: b.entity.clone()?,
            key: b.key.clone()?,
        }),
        ErrorKind::InvalidTransition => Some(BarkerError::InvalidTransition {
            from: b.from?,
            to: b.to?,
        }),
        ErrorKind::InvalidInput => Some(BarkerError::InvalidInput(
            b.detail.clone().unwrap_or_else(|| b.error.clone()),
        )),
        _ => None,
    });

    typed.unwrap_or_else(|| {
        let message = match parsed {
            Some(b) => b.error,
            None => body.trim().to_string(),
        };
        BarkerError::Remote {
            status: Some(status),
            message: if message.is_empty() {
                format!("gateway returned {status}")
            } else {
                message
            },
        }
    })
}
