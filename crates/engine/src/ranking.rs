//! 排名服务
//!
//! 从用户表的 XP 列只读派生排行榜与个体名次，反映最新已提交数据，
//! 组件内部不做缓存（需要缓存时由外部承担）。
//!
//! ## 两种名次定义的分歧
//!
//! 排行榜名次按页内位置推导（`offset + 位置 + 1`），并列 XP 用创建
//! 顺序打破，因此并列用户名次各不相同；个体名次按"严格更高的人数 + 1"
//! 计算，并列用户得到相同名次。两种定义对并列用户会给出不同数字，
//! 这是沿袭原有行为的既定分歧，刻意不做统一——调用方不应假设
//! `rank()` 等于该用户在排行榜里的位置。

use std::sync::Arc;

use tracing::instrument;

use crate::error::{EngineError, Result};
use crate::models::LeaderboardEntry;
use crate::store::GamifyStore;

/// 排名服务
pub struct RankingService {
    store: Arc<dyn GamifyStore>,
}

impl RankingService {
    pub fn new(store: Arc<dyn GamifyStore>) -> Self {
        Self { store }
    }

    /// 排行榜分页
    ///
    /// `xp DESC` 为主序，并列按用户创建顺序稳定排序：连续翻页
    /// 不重不漏。无展示名的用户回退为 "Anonymous"。
    #[instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        company_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>> {
        if limit < 0 || offset < 0 {
            return Err(EngineError::Validation(format!(
                "limit/offset 不可为负: limit={limit}, offset={offset}"
            )));
        }

        let rows = self.store.leaderboard_page(company_id, limit, offset).await?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(position, row)| LeaderboardEntry {
                rank: offset + position as i64 + 1,
                user_id: row.user_id,
                display_name: row
                    .display_name
                    .unwrap_or_else(|| "Anonymous".to_string()),
                xp: row.xp,
                level: row.level,
                badge_count: row.badge_count,
            })
            .collect())
    }

    /// 个体名次：`1 + 公司内 xp 严格更高的用户数`
    ///
    /// 未入库的用户按 XP 0 计算（与档案视图的惰性创建语义一致）。
    #[instrument(skip(self))]
    pub async fn rank(&self, user_id: &str, company_id: &str) -> Result<i64> {
        self.store.rank_of(user_id, company_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LeaderboardRow, MockGamifyStore};

    #[tokio::test]
    async fn test_rank_numbers_continue_across_pages() {
        let mut store = MockGamifyStore::new();
        store
            .expect_leaderboard_page()
            .returning(|_, limit, offset| {
                Ok((0..limit)
                    .map(|i| LeaderboardRow {
                        user_id: format!("U{}", offset + i),
                        display_name: None,
                        xp: 1000 - (offset + i) * 10,
                        level: 1,
                        badge_count: 0,
                    })
                    .collect())
            });

        let ranking = RankingService::new(Arc::new(store));
        let page = ranking.leaderboard("C1", 5, 5).await.unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].rank, 6);
        assert_eq!(page[4].rank, 10);
        assert_eq!(page[0].display_name, "Anonymous");
    }

    #[tokio::test]
    async fn test_negative_pagination_rejected() {
        let store = MockGamifyStore::new();
        let ranking = RankingService::new(Arc::new(store));
        let err = ranking.leaderboard("C1", -1, 0).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
