//! 账本写入
//!
//! 把一组匹配规则落成一次原子写入：XP 账本流水、徽章发放、
//! 用户 xp/等级更新，全部成功或全部不生效。原子性由存储实现
//! 承担（见 `store` 模块），本组件负责批次组装与结果摘要。

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{EngineError, Result};
use crate::models::{ProcessOutcome, Rule};
use crate::store::{AwardBatch, GamifyStore, RuleAward};

/// 账本写入器
pub struct LedgerWriter {
    store: Arc<dyn GamifyStore>,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn GamifyStore>) -> Self {
        Self { store }
    }

    /// 应用一个事件的全部匹配规则
    ///
    /// XP 不做去重——同一事件重复投递会重复加 XP，由传输层的投递
    /// 语义约束；徽章发放是幂等的，已持有的徽章不会出现在
    /// `badges_earned` 中。
    #[instrument(skip(self, rules, event_data), fields(rule_count = rules.len()))]
    pub async fn apply(
        &self,
        user_id: &str,
        company_id: &str,
        rules: &[Rule],
        event_data: &Value,
    ) -> Result<ProcessOutcome> {
        let batch = AwardBatch {
            user_id: user_id.to_string(),
            company_id: company_id.to_string(),
            awards: rules.iter().map(RuleAward::from).collect(),
            event_data: event_data.clone(),
        };

        let receipt = self.store.apply_awards(&batch).await?;

        // 回执里只有徽章 id，名称取自匹配时 JOIN 出的投影；
        // 能发放成功说明徽章当时存在，正常情况下必有名称
        let badges_earned: Vec<String> = receipt
            .granted_badge_ids
            .iter()
            .map(|badge_id| {
                rules
                    .iter()
                    .find(|r| r.badge_id == Some(*badge_id))
                    .and_then(|r| r.badge_name.clone())
                    .unwrap_or_else(|| format!("badge-{badge_id}"))
            })
            .collect();

        let xp_awarded: i64 = batch.awards.iter().map(|a| a.xp_amount).sum();
        let level_up = receipt.new_level > receipt.previous_level;

        info!(
            user_id,
            xp_awarded,
            badges = badges_earned.len(),
            previous_level = receipt.previous_level,
            new_level = receipt.new_level,
            "事件记账完成"
        );

        Ok(ProcessOutcome {
            xp_awarded,
            badges_earned,
            level_up,
            new_level: level_up.then_some(receipt.new_level),
        })
    }

    /// 审计：用户账本流水合计必须等于当前 XP
    ///
    /// 失衡说明原子性被破坏，返回不可重试的 `LedgerDrift`，
    /// 调用方应当大声失败而不是带病运行。
    pub async fn verify_balance(&self, user_id: &str) -> Result<()> {
        let Some(user) = self.store.find_user(user_id).await? else {
            return Err(EngineError::UserNotFound(user_id.to_string()));
        };
        let ledger_sum = self.store.ledger_total(user_id).await?;

        if ledger_sum != user.xp {
            return Err(EngineError::LedgerDrift {
                user_id: user_id.to_string(),
                ledger_sum,
                user_xp: user.xp,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AwardReceipt, MockGamifyStore};
    use chrono::Utc;
    use serde_json::json;

    fn rule(id: i64, xp: i64, badge: Option<(i64, &str)>) -> Rule {
        Rule {
            id,
            company_id: "C1".to_string(),
            event_type: "chat.message.created".to_string(),
            xp_amount: xp,
            badge_id: badge.map(|(bid, _)| bid),
            badge_name: badge.map(|(_, name)| name.to_string()),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_outcome_maps_granted_ids_to_names() {
        let mut store = MockGamifyStore::new();
        store.expect_apply_awards().returning(|batch| {
            assert_eq!(batch.awards.len(), 2);
            Ok(AwardReceipt {
                previous_level: 1,
                new_xp: 15,
                new_level: 1,
                granted_badge_ids: vec![7],
            })
        });

        let writer = LedgerWriter::new(Arc::new(store));
        let rules = vec![rule(1, 10, None), rule(2, 5, Some((7, "B1")))];
        let outcome = writer
            .apply("U1", "C1", &rules, &json!({"user_id": "U1"}))
            .await
            .unwrap();

        assert_eq!(outcome.xp_awarded, 15);
        assert_eq!(outcome.badges_earned, vec!["B1".to_string()]);
        assert!(!outcome.level_up);
        assert_eq!(outcome.new_level, None);
    }

    #[tokio::test]
    async fn test_level_up_carries_new_level() {
        let mut store = MockGamifyStore::new();
        store.expect_apply_awards().returning(|_| {
            Ok(AwardReceipt {
                previous_level: 1,
                new_xp: 105,
                new_level: 2,
                granted_badge_ids: vec![],
            })
        });

        let writer = LedgerWriter::new(Arc::new(store));
        let outcome = writer
            .apply("U1", "C1", &[rule(1, 10, None)], &json!({}))
            .await
            .unwrap();

        assert!(outcome.level_up);
        assert_eq!(outcome.new_level, Some(2));
    }

    #[tokio::test]
    async fn test_verify_balance_detects_drift() {
        let mut store = MockGamifyStore::new();
        store.expect_find_user().returning(|user_id| {
            let now = Utc::now();
            Ok(Some(crate::models::User {
                id: user_id.to_string(),
                company_id: "C1".to_string(),
                display_name: None,
                xp: 100,
                level: 2,
                created_at: now,
                updated_at: now,
            }))
        });
        store.expect_ledger_total().returning(|_| Ok(85));

        let writer = LedgerWriter::new(Arc::new(store));
        let err = writer.verify_balance("U1").await.unwrap_err();
        assert_eq!(err.error_code(), "LEDGER_DRIFT");
        assert!(!err.is_retryable());
    }
}
