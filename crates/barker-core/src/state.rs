// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery state machine.
//!
//! A delivery starts out `Pending`, which is never stored: it is the absence
//! of a ledger row. A successful claim records it as `Progress`, and the
//! worker later reports `Success` or `Fail`. Both outcomes are terminal.
//!
//! ```text
//! Pending --claim--> Progress --SetState--> Success
//!                             \-SetState--> Fail
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::BarkerError;

/// Lifecycle state of a single (bot, campaign, recipient) delivery.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    /// No delivery row exists yet.
    Pending,
    /// Claimed by a worker, outcome not yet reported.
    Progress,
    /// Message delivered.
    Success,
    /// Delivery attempt failed.
    Fail,
}

/// Outcome of applying a transition to a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals the current state; nothing to write.
    Unchanged,
    /// The state moves from `from` to `to`.
    Changed {
        from: DeliveryState,
        to: DeliveryState,
    },
}

impl DeliveryState {
    /// Numeric wire code used by older worker clients.
    pub const fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Progress => 1,
            Self::Success => 2,
            Self::Fail => 3,
        }
    }

    /// Inverse of [`DeliveryState::code`].
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Progress),
            2 => Some(Self::Success),
            3 => Some(Self::Fail),
            _ => None,
        }
    }

    /// Lowercase name as stored in the ledger and used on the wire.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// `Success` and `Fail` accept no further changes.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }

    /// States that exist as ledger rows.
    pub const fn is_recorded(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Checks whether moving from `self` to `target` is legal.
    ///
    /// Re-applying the current state is accepted as [`Transition::Unchanged`]
    /// so that workers can safely retry outcome reports.
    pub fn transition(self, target: DeliveryState) -> Result<Transition, BarkerError> {
        let illegal = || BarkerError::InvalidTransition {
            from: self,
            to: target,
        };

        if target == Self::Pending {
            return Err(illegal());
        }
        if self == target {
            return Ok(Transition::Unchanged);
        }
        match (self, target) {
            (Self::Pending, Self::Progress)
            | (Self::Progress, Self::Success)
            | (Self::Progress, Self::Fail) => Ok(Transition::Changed {
                from: self,
                to: target,
            }),
            _ => Err(illegal()),
        }
    }
}
