//! 用户仓储
//!
//! 提供用户行的惰性创建、行级锁读取和 xp/等级更新，
//! 以及排行榜与个体名次的只读查询。

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::User;
use crate::store::LeaderboardRow;

const USER_COLUMNS: &str = "id, company_id, display_name, xp, level, created_at, updated_at";

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 按 id 查找用户
    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// 获取用户，不存在则以 `xp=0, level=1` 惰性创建
    ///
    /// 首个档案访问也会走到这里，所以公司同样需要惰性创建。
    /// 非事务路径：两次 INSERT 都幂等，无需行锁。
    pub async fn get_or_create(&self, user_id: &str, company_id: &str) -> Result<User> {
        sqlx::query(
            "INSERT INTO companies (id, name) VALUES ($1, $1) ON CONFLICT (id) DO NOTHING",
        )
        .bind(company_id)
        .execute(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, company_id)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        match user {
            Some(user) => Ok(user),
            // 冲突说明用户已存在，读现有行
            None => {
                let user = sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
                ))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
                Ok(user)
            }
        }
    }

    /// 排行榜分页
    ///
    /// `xp DESC` 为主序，并列时按创建时间和 id 稳定排序，
    /// 保证跨请求分页不重不漏。
    pub async fn leaderboard_page(
        &self,
        company_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT u.id AS user_id, u.display_name, u.xp, u.level,
                   (SELECT COUNT(*) FROM user_badges ub WHERE ub.user_id = u.id) AS badge_count
            FROM users u
            WHERE u.company_id = $1
            ORDER BY u.xp DESC, u.created_at ASC, u.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// 个体名次：`1 + 公司内 xp 严格更高的用户数`
    ///
    /// 用户不存在时 COALESCE 到 0，与惰性创建前的档案视图一致。
    pub async fn rank_of(&self, user_id: &str, company_id: &str) -> Result<i64> {
        let rank: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) + 1
            FROM users
            WHERE company_id = $1
              AND xp > COALESCE((SELECT xp FROM users WHERE id = $2), 0)
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(rank)
    }

    // ==================== 事务操作 ====================

    /// 在事务中惰性创建公司
    pub async fn ensure_company_in_tx(tx: &mut PgConnection, company_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO companies (id, name) VALUES ($1, $1) ON CONFLICT (id) DO NOTHING",
        )
        .bind(company_id)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中获取或创建用户并锁定行
    ///
    /// FOR UPDATE 行锁是单用户并发事件串行化的依据：第二个事务会
    /// 阻塞到第一个提交，之后读到的 `xp` 已包含前者的增量，
    /// 读-改-写不会丢失更新。
    pub async fn get_or_create_for_update(
        tx: &mut PgConnection,
        user_id: &str,
        company_id: &str,
    ) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, company_id)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_one(tx)
        .await?;

        Ok(user)
    }

    /// 在事务中更新用户的 xp 与等级
    ///
    /// 两列必须一起写入，保持 `level == level_for_xp(xp)` 不变量。
    pub async fn update_xp_and_level_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        new_xp: i64,
        new_level: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET xp = $2, level = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(new_xp)
        .bind(new_level)
        .execute(tx)
        .await?;

        Ok(())
    }
}
