//! Postgres 存储实现
//!
//! 在单事件事务内组合各仓储的 `_in_tx` 静态方法完成原子写入。
//! 串行化依据是用户行的 FOR UPDATE 行锁：同一用户的并发事件在锁上
//! 排队，后到者读到的 `xp` 已包含先到者的增量；不同用户互不阻塞。
//! 事务内任何存储错误都整体回滚，不留部分写入。

use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use async_trait::async_trait;

use crate::error::Result;
use crate::level;
use crate::models::{EarnedBadge, Rule, User};
use crate::repository::{RuleRepository, UserBadgeRepository, UserRepository, XpEventRepository};
use crate::store::{AwardBatch, AwardReceipt, GamifyStore, LeaderboardRow};

/// Postgres 存储
pub struct PgStore {
    pool: PgPool,
    rules: RuleRepository,
    users: UserRepository,
    xp_events: XpEventRepository,
    user_badges: UserBadgeRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            rules: RuleRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            xp_events: XpEventRepository::new(pool.clone()),
            user_badges: UserBadgeRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl GamifyStore for PgStore {
    async fn active_rules(&self, company_id: &str, event_type: &str) -> Result<Vec<Rule>> {
        self.rules
            .find_active_by_company_and_type(company_id, event_type)
            .await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    async fn get_or_create_user(&self, user_id: &str, company_id: &str) -> Result<User> {
        self.users.get_or_create(user_id, company_id).await
    }

    #[instrument(skip(self, batch), fields(user_id = %batch.user_id, company_id = %batch.company_id))]
    async fn apply_awards(&self, batch: &AwardBatch) -> Result<AwardReceipt> {
        let mut tx = self.pool.begin().await?;

        UserRepository::ensure_company_in_tx(&mut tx, &batch.company_id).await?;
        let user =
            UserRepository::get_or_create_for_update(&mut tx, &batch.user_id, &batch.company_id)
                .await?;

        let mut total_xp = 0i64;
        let mut granted_badge_ids = Vec::new();

        for award in &batch.awards {
            XpEventRepository::append_in_tx(
                &mut tx,
                &batch.user_id,
                award.rule_id,
                award.xp_amount,
                &batch.event_data,
            )
            .await?;
            total_xp += award.xp_amount;

            let Some(badge_id) = award.badge_id else {
                continue;
            };

            // 规则配置与徽章删除是带外操作，匹配到发放之间徽章可能已消失
            if !UserBadgeRepository::badge_exists_in_tx(&mut tx, badge_id).await? {
                warn!(badge_id, rule_id = award.rule_id, "规则引用的徽章不存在，按无徽章处理");
                continue;
            }

            if UserBadgeRepository::try_insert_in_tx(&mut tx, &batch.user_id, badge_id).await? {
                granted_badge_ids.push(badge_id);
            } else {
                debug!(badge_id, user_id = %batch.user_id, "用户已持有该徽章，幂等跳过");
            }
        }

        let new_xp = user.xp + total_xp;
        let new_level = level::level_for_xp(new_xp);
        UserRepository::update_xp_and_level_in_tx(&mut tx, &batch.user_id, new_xp, new_level)
            .await?;

        tx.commit().await?;

        Ok(AwardReceipt {
            previous_level: user.level,
            new_xp,
            new_level,
            granted_badge_ids,
        })
    }

    async fn leaderboard_page(
        &self,
        company_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardRow>> {
        self.users.leaderboard_page(company_id, limit, offset).await
    }

    async fn rank_of(&self, user_id: &str, company_id: &str) -> Result<i64> {
        self.users.rank_of(user_id, company_id).await
    }

    async fn ledger_total(&self, user_id: &str) -> Result<i64> {
        self.xp_events.sum_for_user(user_id).await
    }

    async fn user_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
        self.user_badges.list_for_user(user_id).await
    }
}
