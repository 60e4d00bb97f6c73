//! XP 账本仓储
//!
//! 账本只追加，不提供更新和删除。每行记录一次规则触发的 XP 发放，
//! 原始事件数据随行保存用于审计追溯。

use serde_json::Value;
use sqlx::{PgConnection, PgPool, Row};

use crate::error::Result;

/// XP 账本仓储
pub struct XpEventRepository {
    pool: PgPool,
}

impl XpEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 用户账本流水的 XP 合计
    ///
    /// 审计契约：合计必须等于用户当前 `xp`。
    pub async fn sum_for_user(&self, user_id: &str) -> Result<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(xp_amount), 0)::BIGINT FROM xp_events WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// 在事务中追加一行账本流水
    ///
    /// 返回新流水的 ID
    pub async fn append_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        rule_id: i64,
        xp_amount: i64,
        event_data: &Value,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO xp_events (user_id, rule_id, xp_amount, event_data)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(rule_id)
        .bind(xp_amount)
        .bind(event_data)
        .fetch_one(tx)
        .await?;

        Ok(row.get("id"))
    }
}
