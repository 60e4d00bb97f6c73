//! 存储契约
//!
//! 定义引擎组件依赖的唯一存储接口 `GamifyStore`，便于依赖抽象而非
//! 具体实现，支持 mock 测试。存储句柄在构造时显式注入各组件，
//! 不存在进程级单例。
//!
//! 单事件的全部写入（建用户、追加流水、发徽章、改 xp/等级）收拢为
//! 一个 `apply_awards` 方法：原子性由实现负责（Postgres 行锁事务 /
//! 内存互斥锁），调用方无法绕过。两个并发事件命中同一用户时，
//! 效果必须等价于某种串行顺序，不得丢失增量。

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{EarnedBadge, Rule, User};

/// 单条规则产生的奖励
#[derive(Debug, Clone)]
pub struct RuleAward {
    pub rule_id: i64,
    pub xp_amount: i64,
    pub badge_id: Option<i64>,
}

impl From<&Rule> for RuleAward {
    fn from(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id,
            xp_amount: rule.xp_amount,
            badge_id: rule.badge_id,
        }
    }
}

/// 单个事件的奖励批次（一次原子写入的输入）
#[derive(Debug, Clone)]
pub struct AwardBatch {
    pub user_id: String,
    pub company_id: String,
    pub awards: Vec<RuleAward>,
    /// 原始事件数据，原样写入每条账本流水用于审计
    pub event_data: Value,
}

/// 原子写入的回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardReceipt {
    /// 写入前的等级（用于推导是否升级）
    pub previous_level: i32,
    pub new_xp: i64,
    pub new_level: i32,
    /// 本次真正新发放的徽章 id；重复发放与悬空引用都不在其中
    pub granted_badge_ids: Vec<i64>,
}

/// 排行榜数据行（名次由 `RankingService` 按页内位置补齐）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub display_name: Option<String>,
    pub xp: i64,
    pub level: i32,
    pub badge_count: i64,
}

/// 游戏化存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GamifyStore: Send + Sync {
    /// 查询公司内匹配事件类型的激活规则，按创建顺序返回（顺序需确定，
    /// 保证测试断言与账本流水的可复现性）
    async fn active_rules(&self, company_id: &str, event_type: &str) -> Result<Vec<Rule>>;

    /// 按 id 查找用户
    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;

    /// 获取用户，不存在则以 `xp=0, level=1` 惰性创建（公司一并惰性创建）
    async fn get_or_create_user(&self, user_id: &str, company_id: &str) -> Result<User>;

    /// 原子应用一个事件的全部奖励
    ///
    /// 全部成功或全部回滚：
    /// 1. 惰性创建公司与用户；
    /// 2. 每条奖励追加一行账本流水并累计 XP；
    /// 3. 携带徽章的奖励尝试发放——`(user_id, badge_id)` 已存在时静默跳过
    ///    （幂等语义，不是错误）；徽章定义已被删除时记日志按无徽章处理；
    /// 4. 以 `level::level_for_xp` 推导新等级，与新 XP 一起落盘。
    ///
    /// 并发保证：同一用户的并发调用必须串行化生效，任何交错下
    /// 最终 XP 等于初始值加全部增量之和。
    async fn apply_awards(&self, batch: &AwardBatch) -> Result<AwardReceipt>;

    /// 排行榜分页：按 `xp` 降序，并列时按用户创建顺序稳定排序
    async fn leaderboard_page(
        &self,
        company_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardRow>>;

    /// 个体名次：`1 + 公司内 xp 严格更高的用户数`；
    /// 用户不存在时按 XP 0 计算
    async fn rank_of(&self, user_id: &str, company_id: &str) -> Result<i64>;

    /// 用户账本流水的 XP 合计（审计用）
    async fn ledger_total(&self, user_id: &str) -> Result<i64>;

    /// 用户已获得的徽章列表（含展示信息）
    async fn user_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>>;
}
