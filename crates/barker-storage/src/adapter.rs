// SPDX-FileCopyrightText: 2026 Barker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ledger traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use barker_config::model::{BarkerConfig, StorageConfig};
use barker_core::types::{
    BackendKind, Bot, BotId, Campaign, CampaignId, CampaignStatistics, DeliveryKey,
    DeliveryTakeResult, DeliveryTarget, HealthStatus, NewBot, NewCampaign, Page, PageRequest,
    TelegramId, User,
};
use barker_core::{
    Backend, BarkerError, BotStore, CampaignStore, DeliveryState, DeliveryStore, PenaltyPolicy,
    RotationPolicy, UserStore,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// Default age after which a `progress` delivery counts as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(3600);

/// SQLite-backed ledger.
///
/// The database is opened by [`Backend::initialize`]; every other call fails
/// with a storage error until then.
pub struct SqliteLedger {
    config: StorageConfig,
    policy: Arc<dyn RotationPolicy>,
    stale_after: Duration,
    db: OnceCell<Database>,
}

impl SqliteLedger {
    /// Create a ledger with the default penalty policy.
    ///
    /// The database connection is not opened until [`Backend::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            policy: Arc::new(PenaltyPolicy::default()),
            stale_after: DEFAULT_STALE_AFTER,
            db: OnceCell::new(),
        }
    }

    /// Build from the full configuration: storage, rotation penalties, and
    /// the stale threshold.
    pub fn from_config(config: &BarkerConfig) -> Self {
        Self::new(config.storage.clone())
            .with_policy(Arc::new(PenaltyPolicy {
                fail_penalty: config.rotation.fail_penalty,
                exhausted_penalty: config.rotation.exhausted_penalty,
            }))
            .with_stale_after(Duration::from_secs(config.delivery.stale_after_secs))
    }

    pub fn with_policy(mut self, policy: Arc<dyn RotationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, BarkerError> {
        self.db.get().ok_or_else(|| BarkerError::Storage {
            source: "ledger not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Backend for SqliteLedger {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn initialize(&self) -> Result<(), BarkerError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BarkerError::Storage {
            source: "ledger already initialized".into(),
        })?;
        info!(path = %self.config.database_path, "sqlite ledger initialized");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus, BarkerError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BarkerError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl BotStore for SqliteLedger {
    async fn create_bot(&self, bot: &NewBot) -> Result<Bot, BarkerError> {
        queries::bots::create_bot(self.database()?, bot).await
    }

    async fn update_bot(&self, bot: &Bot) -> Result<Bot, BarkerError> {
        queries::bots::update_bot(self.database()?, bot).await
    }

    async fn get_bot(&self, id: BotId) -> Result<Option<Bot>, BarkerError> {
        queries::bots::get_bot(self.database()?, id).await
    }

    async fn list_bots(&self, page: &PageRequest) -> Result<Page<Bot>, BarkerError> {
        queries::bots::list_bots(self.database()?, page).await
    }

    async fn rr_take(&self) -> Result<Bot, BarkerError> {
        queries::rotation::rr_take(self.database()?).await
    }
}

#[async_trait]
impl UserStore for SqliteLedger {
    async fn put_user(&self, user: &User) -> Result<User, BarkerError> {
        queries::users::put_user(self.database()?, user).await
    }

    async fn get_user(
        &self,
        bot_id: BotId,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, BarkerError> {
        queries::users::get_user(self.database()?, bot_id, telegram_id).await
    }

    async fn list_users(&self, bot_id: BotId, page: &PageRequest) -> Result<Page<User>, BarkerError> {
        queries::users::list_users(self.database()?, bot_id, page).await
    }
}

#[async_trait]
impl CampaignStore for SqliteLedger {
    async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, BarkerError> {
        queries::campaigns::create_campaign(self.database()?, campaign).await
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<Campaign, BarkerError> {
        queries::campaigns::update_campaign(self.database()?, campaign).await
    }

    async fn get_campaign(
        &self,
        bot_id: BotId,
        id: CampaignId,
    ) -> Result<Option<Campaign>, BarkerError> {
        queries::campaigns::get_campaign(self.database()?, bot_id, id).await
    }

    async fn list_campaigns(
        &self,
        bot_id: BotId,
        page: &PageRequest,
    ) -> Result<Page<Campaign>, BarkerError> {
        queries::campaigns::list_campaigns(self.database()?, bot_id, page).await
    }

    async fn aggregated_statistics(
        &self,
        bot_id: BotId,
        campaign_id: CampaignId,
    ) -> Result<CampaignStatistics, BarkerError> {
        queries::statistics::aggregated_statistics(
            self.database()?,
            bot_id,
            campaign_id,
            self.stale_after,
        )
        .await
    }
}

#[async_trait]
impl DeliveryStore for SqliteLedger {
    async fn take(&self, target: &DeliveryTarget) -> Result<Option<DeliveryTakeResult>, BarkerError> {
        let penalty = self.policy.penalty_for_exhaustion();
        queries::deliveries::take(self.database()?, target, penalty).await
    }

    async fn set_state(&self, key: &DeliveryKey, state: DeliveryState) -> Result<(), BarkerError> {
        let penalty = self.policy.penalty_for_outcome(state);
        queries::deliveries::set_state(self.database()?, key, state, penalty).await?;
        Ok(())
    }

    async fn get_state(&self, key: &DeliveryKey) -> Result<DeliveryState, BarkerError> {
        queries::deliveries::get_state(self.database()?, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barker_core::{Ledger, StrictRoundRobin};
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }

    async fn ready(dir: &tempfile::TempDir) -> SqliteLedger {
        let ledger = SqliteLedger::new(make_config(&dir.path().join("ledger.db")));
        ledger.initialize().await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn identifies_as_sqlite() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::new(make_config(&dir.path().join("ledger.db")));
        assert_eq!(ledger.name(), "sqlite");
        assert_eq!(ledger.kind(), BackendKind::Sqlite);
        assert_eq!(ledger.version(), semver::Version::new(0, 1, 0));
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::new(make_config(&dir.path().join("ledger.db")));
        assert!(ledger.health_check().await.is_err());
        assert!(ledger.rr_take().await.is_err());
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let ledger = ready(&dir).await;
        assert!(ledger.initialize().await.is_err());
        assert_eq!(ledger.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn failed_delivery_penalizes_bot() {
        let dir = tempdir().unwrap();
        let ledger = ready(&dir).await;
        let bot = ledger
            .create_bot(&NewBot {
                title: "b".into(),
                token: "t".into(),
            })
            .await
            .unwrap();
        ledger
            .put_user(&User {
                bot_id: bot.id,
                telegram_id: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        ledger
            .create_campaign(&NewCampaign {
                bot_id: bot.id,
                title: "c".into(),
                message: "m".into(),
                active: true,
            })
            .await
            .unwrap();

        let claimed = ledger.take(&DeliveryTarget::bot(bot.id)).await.unwrap().unwrap();
        ledger
            .set_state(&claimed.delivery.key(), DeliveryState::Fail)
            .await
            .unwrap();
        assert_eq!(ledger.get_bot(bot.id).await.unwrap().unwrap().rr_penalty, 1);
        assert_eq!(
            ledger.get_state(&claimed.delivery.key()).await.unwrap(),
            DeliveryState::Fail
        );
    }

    #[tokio::test]
    async fn strict_policy_never_penalizes() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::new(make_config(&dir.path().join("ledger.db")))
            .with_policy(Arc::new(StrictRoundRobin));
        ledger.initialize().await.unwrap();
        let bot = ledger
            .create_bot(&NewBot {
                title: "b".into(),
                token: "t".into(),
            })
            .await
            .unwrap();

        assert!(ledger.take(&DeliveryTarget::bot(bot.id)).await.unwrap().is_none());
        assert_eq!(ledger.get_bot(bot.id).await.unwrap().unwrap().rr_penalty, 0);
    }

    #[tokio::test]
    async fn concurrent_claims_never_share_a_recipient() {
        let dir = tempdir().unwrap();
        let ledger: Arc<dyn Ledger> = Arc::new(ready(&dir).await);
        let bot = ledger
            .create_bot(&NewBot {
                title: "b".into(),
                token: "t".into(),
            })
            .await
            .unwrap();
        for telegram_id in 1..=20 {
            ledger
                .put_user(&User {
                    bot_id: bot.id,
                    telegram_id,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let campaign = ledger
            .create_campaign(&NewCampaign {
                bot_id: bot.id,
                title: "c".into(),
                message: "m".into(),
                active: true,
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            let target = DeliveryTarget::bot(bot.id).with_campaign(campaign.id);
            handles.push(tokio::spawn(async move {
                let mut claimed = Vec::new();
                while let Some(result) = ledger.take(&target).await.unwrap() {
                    claimed.push(result.user.telegram_id);
                }
                claimed
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort_unstable();
        assert_eq!(all, (1..=20).collect::<Vec<_>>());
    }

    async fn bot_with_work(ledger: &SqliteLedger, title: &str, users: i64, campaigns: usize) -> Bot {
        let bot = ledger
            .create_bot(&NewBot {
                title: title.into(),
                token: format!("{title}-token"),
            })
            .await
            .unwrap();
        for telegram_id in 1..=users {
            ledger
                .put_user(&User {
                    bot_id: bot.id,
                    telegram_id,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        for n in 0..campaigns {
            ledger
                .create_campaign(&NewCampaign {
                    bot_id: bot.id,
                    title: format!("c{n}"),
                    message: "m".into(),
                    active: true,
                })
                .await
                .unwrap();
        }
        bot
    }

    #[tokio::test]
    async fn claims_for_one_triple_succeed_once_across_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let first = SqliteLedger::new(make_config(&path));
        first.initialize().await.unwrap();
        let bot = bot_with_work(&first, "b", 1, 1).await;
        let campaign = first
            .list_campaigns(bot.id, &PageRequest::default())
            .await
            .unwrap()
            .items[0]
            .id;

        // One ledger per connection, like separate worker processes.
        let mut ledgers = vec![Arc::new(first)];
        for _ in 1..8 {
            let ledger = SqliteLedger::new(make_config(&path));
            ledger.initialize().await.unwrap();
            ledgers.push(Arc::new(ledger));
        }

        let target = DeliveryTarget::bot(bot.id)
            .with_campaign(campaign)
            .with_recipient(1);
        let mut handles = Vec::new();
        for i in 0..32 {
            let ledger = Arc::clone(&ledgers[i % ledgers.len()]);
            handles.push(tokio::spawn(async move { ledger.take(&target).await }));
        }

        let mut claimed = 0;
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                Some(_) => claimed += 1,
                None => exhausted += 1,
            }
        }
        assert_eq!(claimed, 1);
        assert_eq!(exhausted, 31);
    }

    #[tokio::test]
    async fn failing_bot_skips_the_rest_of_its_cycle() {
        let dir = tempdir().unwrap();
        let ledger = ready(&dir).await;
        let mut ids = Vec::new();
        for n in 1..=10 {
            ids.push(bot_with_work(&ledger, &format!("B{n}"), 1, 1).await.id);
        }

        let first = ledger.rr_take().await.unwrap();
        assert_eq!(first.id, ids[0]);
        let claimed = ledger
            .take(&DeliveryTarget::bot(first.id))
            .await
            .unwrap()
            .unwrap();
        ledger
            .set_state(&claimed.delivery.key(), DeliveryState::Fail)
            .await
            .unwrap();

        for expected in &ids[1..] {
            assert_eq!(ledger.rr_take().await.unwrap().id, *expected);
        }
        let eleventh = ledger.rr_take().await.unwrap();
        assert_ne!(eleventh.id, ids[0]);
        assert_eq!(eleventh.id, ids[1]);
    }

    #[tokio::test]
    async fn idle_bot_keeps_its_turns_under_default_policy() {
        let dir = tempdir().unwrap();
        let ledger = ready(&dir).await;
        let idle = bot_with_work(&ledger, "idle", 0, 0).await.id;
        let busy_a = bot_with_work(&ledger, "a", 3, 2).await.id;
        let busy_b = bot_with_work(&ledger, "b", 3, 2).await.id;

        let mut order = Vec::new();
        for _ in 0..12 {
            let bot = ledger.rr_take().await.unwrap();
            order.push(bot.id);
            if let Some(claimed) = ledger.take(&DeliveryTarget::bot(bot.id)).await.unwrap() {
                ledger
                    .set_state(&claimed.delivery.key(), DeliveryState::Success)
                    .await
                    .unwrap();
            }
        }

        let cycle = [idle, busy_a, busy_b];
        let expected: Vec<_> = cycle.iter().copied().cycle().take(12).collect();
        assert_eq!(order, expected);
        assert_eq!(ledger.get_bot(idle).await.unwrap().unwrap().rr_penalty, 0);
    }
}
