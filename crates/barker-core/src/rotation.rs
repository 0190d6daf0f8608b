// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot rotation deprioritization policy.
//!
//! Rotation hands out bots round-robin. A policy decides how many turns a bot
//! forfeits after something went wrong with it. A forfeited turn is spent when
//! the bot reaches the head of the queue: it is moved to the back and the next
//! bot is handed out instead, so a penalised bot is still revisited once its
//! penalty has been served.

use crate::state::DeliveryState;

/// Decides how strongly a bot is deprioritized after an event.
///
/// Returned values are turn counts. Ledgers raise a bot's pending penalty to
/// at least the returned value; penalties never accumulate past it.
pub trait RotationPolicy: Send + Sync + 'static {
    /// Turns forfeited after one of the bot's deliveries moved to `state`.
    fn penalty_for_outcome(&self, state: DeliveryState) -> u32;

    /// Turns forfeited after a bot-wide claim found no eligible work.
    fn penalty_for_exhaustion(&self) -> u32;
}

/// Fixed-penalty policy, the default.
///
/// By default only failures cost turns. Charging idle bots for exhaustion is
/// opt-in through `exhausted_penalty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyPolicy {
    pub fail_penalty: u32,
    pub exhausted_penalty: u32,
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            fail_penalty: 1,
            exhausted_penalty: 0,
        }
    }
}

impl RotationPolicy for PenaltyPolicy {
    fn penalty_for_outcome(&self, state: DeliveryState) -> u32 {
        match state {
            DeliveryState::Fail => self.fail_penalty,
            _ => 0,
        }
    }

    fn penalty_for_exhaustion(&self) -> u32 {
        self.exhausted_penalty
    }
}

/// Plain round-robin: nothing is ever deprioritized.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictRoundRobin;

impl RotationPolicy for StrictRoundRobin {
    fn penalty_for_outcome(&self, _state: DeliveryState) -> u32 {
        0
    }

    fn penalty_for_exhaustion(&self) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failures_cost_turns() {
        let policy = PenaltyPolicy::default();
        assert_eq!(policy.penalty_for_outcome(DeliveryState::Fail), 1);
        assert_eq!(policy.penalty_for_outcome(DeliveryState::Success), 0);
        assert_eq!(policy.penalty_for_outcome(DeliveryState::Progress), 0);
        assert_eq!(policy.penalty_for_exhaustion(), 0);
    }

    #[test]
    fn exhaustion_penalty_is_opt_in() {
        let policy = PenaltyPolicy {
            exhausted_penalty: 2,
            ..PenaltyPolicy::default()
        };
        assert_eq!(policy.penalty_for_exhaustion(), 2);
        assert_eq!(policy.penalty_for_outcome(DeliveryState::Fail), 1);
    }

    #[test]
    fn strict_round_robin_never_penalises() {
        let policy = StrictRoundRobin;
        assert_eq!(policy.penalty_for_outcome(DeliveryState::Fail), 0);
        assert_eq!(policy.penalty_for_exhaustion(), 0);
    }
}
