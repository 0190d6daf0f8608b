// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration tests.
//!
//! `TestHarness` opens a [`SqliteLedger`] over a temp database and seeds a
//! configurable number of bots, each with the same recipients and campaigns.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use barker_config::model::{BarkerConfig, StorageConfig};
use barker_core::types::{Bot, Campaign, User};
use barker_core::{Backend, BarkerError, Ledger, RotationPolicy};
use barker_storage::SqliteLedger;
use tracing::debug;

use crate::fixtures::{recipient_ids, seed_bot, seed_campaign, seed_users};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    bots: usize,
    users_per_bot: usize,
    campaigns_per_bot: usize,
    policy: Option<Arc<dyn RotationPolicy>>,
    stale_after: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            bots: 0,
            users_per_bot: 0,
            campaigns_per_bot: 0,
            policy: None,
            stale_after: None,
        }
    }

    /// Number of bots to create, titled `B1`, `B2`, ...
    pub fn with_bots(mut self, count: usize) -> Self {
        self.bots = count;
        self
    }

    /// Recipients registered for every seeded bot.
    pub fn with_users(mut self, per_bot: usize) -> Self {
        self.users_per_bot = per_bot;
        self
    }

    /// Active campaigns created for every seeded bot, titled `C1`, `C2`, ...
    pub fn with_campaigns(mut self, per_bot: usize) -> Self {
        self.campaigns_per_bot = per_bot;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn RotationPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    /// Build the harness: open the temp database and seed fixtures.
    pub async fn build(self) -> Result<TestHarness, BarkerError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| BarkerError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = BarkerConfig {
            storage: StorageConfig {
                database_path: db_path.to_string_lossy().into_owned(),
                wal_mode: true,
            },
            ..BarkerConfig::default()
        };
        if let Some(stale_after) = self.stale_after {
            config.delivery.stale_after_secs = stale_after.as_secs();
        }

        let mut ledger = SqliteLedger::from_config(&config);
        if let Some(policy) = self.policy {
            ledger = ledger.with_policy(policy);
        }
        if let Some(stale_after) = self.stale_after {
            ledger = ledger.with_stale_after(stale_after);
        }
        ledger.initialize().await?;
        let ledger = Arc::new(ledger);

        let mut bots = Vec::with_capacity(self.bots);
        for n in 1..=self.bots {
            let bot = seed_bot(ledger.as_ref(), &format!("B{n}")).await?;
            let users =
                seed_users(ledger.as_ref(), bot.id, &recipient_ids(self.users_per_bot)).await?;
            let mut campaigns = Vec::with_capacity(self.campaigns_per_bot);
            for c in 1..=self.campaigns_per_bot {
                campaigns.push(seed_campaign(ledger.as_ref(), bot.id, &format!("C{c}"), true).await?);
            }
            bots.push(SeededBot {
                bot,
                users,
                campaigns,
            });
        }
        debug!(path = %db_path.display(), bots = bots.len(), "test harness ready");

        Ok(TestHarness {
            ledger,
            bots,
            config,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A bot created by the harness together with its fixtures, in creation order.
#[derive(Debug, Clone)]
pub struct SeededBot {
    pub bot: Bot,
    pub users: Vec<User>,
    pub campaigns: Vec<Campaign>,
}

/// A ready ledger over a temp database, removed on drop.
pub struct TestHarness {
    /// The initialized SQLite ledger.
    pub ledger: Arc<SqliteLedger>,
    /// Seeded bots in creation order.
    pub bots: Vec<SeededBot>,
    /// Configuration the ledger was built from.
    pub config: BarkerConfig,
    db_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The ledger as a trait object, the way the gateway and binary hold it.
    pub fn ledger(&self) -> Arc<dyn Ledger> {
        self.ledger.clone()
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    pub fn bot(&self, index: usize) -> &SeededBot {
        &self.bots[index]
    }
}
