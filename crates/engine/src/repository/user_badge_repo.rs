//! 用户徽章仓储
//!
//! 徽章发放的幂等性建立在 `(user_id, badge_id)` 唯一约束之上：
//! 重复发放通过 `ON CONFLICT DO NOTHING` 落为布尔返回值，
//! 而不是依赖异常匹配。

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::EarnedBadge;

/// 用户徽章仓储
pub struct UserBadgeRepository {
    pool: PgPool,
}

impl UserBadgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 列出用户已获得的徽章（含展示信息），按获得时间倒序
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
        let badges = sqlx::query_as::<_, EarnedBadge>(
            r#"
            SELECT ub.badge_id, b.name, b.description, b.icon, ub.earned_at
            FROM user_badges ub
            JOIN badges b ON b.id = ub.badge_id
            WHERE ub.user_id = $1
            ORDER BY ub.earned_at DESC, ub.badge_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    // ==================== 事务操作 ====================

    /// 在事务中检查徽章定义是否存在
    ///
    /// 发放前置检查：Postgres 事务内任何语句报错（如外键违反）都会使
    /// 整个事务进入中止态，悬空的 `rule.badge_id` 必须在 INSERT 之前
    /// 识别出来降级为"无徽章"，而不能靠捕获外键错误。
    pub async fn badge_exists_in_tx(tx: &mut PgConnection, badge_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM badges WHERE id = $1)")
                .bind(badge_id)
                .fetch_one(tx)
                .await?;

        Ok(exists)
    }

    /// 在事务中尝试发放徽章
    ///
    /// 返回是否真正插入：`false` 表示该用户已持有此徽章（幂等跳过，
    /// 不是错误），调用方据此把徽章排除在"本次获得"结果之外。
    pub async fn try_insert_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        badge_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_id, badge_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
