//! 规则仓储
//!
//! 引擎视角下规则是只读配置（增删改由管理端带外完成），
//! 因此只提供匹配查询。

use sqlx::PgPool;

use crate::error::Result;
use crate::models::Rule;

/// 规则仓储
pub struct RuleRepository {
    pool: PgPool,
}

impl RuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 查询公司内匹配事件类型的激活规则
    ///
    /// LEFT JOIN 徽章表投影出 `badge_name`，规则引用的徽章已被删除时为 NULL。
    /// 按创建顺序排序，保证匹配结果确定。
    pub async fn find_active_by_company_and_type(
        &self,
        company_id: &str,
        event_type: &str,
    ) -> Result<Vec<Rule>> {
        let rules = sqlx::query_as::<_, Rule>(
            r#"
            SELECT r.id, r.company_id, r.event_type, r.xp_amount, r.badge_id,
                   b.name AS badge_name, r.is_active, r.created_at
            FROM rules r
            LEFT JOIN badges b ON b.id = r.badge_id
            WHERE r.company_id = $1 AND r.event_type = $2 AND r.is_active
            ORDER BY r.created_at, r.id
            "#,
        )
        .bind(company_id)
        .bind(event_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }
}
