//! 引擎数据模型
//!
//! 与数据库表一一对应的实体行，以及引擎对外返回的结果类型。
//! 所有权关系：公司拥有用户、规则、徽章（级联删除范围）；
//! 用户拥有自己的账本流水与徽章获得记录。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 公司（租户），首次被事件引用时惰性创建
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// 社区成员
///
/// `xp` 在正常运行下单调非减；`level` 必须始终等于
/// `level::level_for_xp(xp)`，两者只在 `GamifyStore::apply_awards`
/// 的原子单元内一起更新。
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub company_id: String,
    pub display_name: Option<String>,
    pub xp: i64,
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 激励规则：事件类型 -> XP 奖励 + 可选徽章
///
/// 同一事件类型允许多条规则并存，全部独立触发。
/// `badge_name` 是查询时 LEFT JOIN 徽章表得到的投影，
/// 规则引用的徽章被删除时为 `None`。
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Rule {
    pub id: i64,
    pub company_id: String,
    pub event_type: String,
    pub xp_amount: i64,
    pub badge_id: Option<i64>,
    pub badge_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// 徽章定义，身份以 id 为准（名称等展示字段允许编辑）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Badge {
    pub id: i64,
    pub company_id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 用户已获得的徽章（含展示信息）
///
/// 底层表对 `(user_id, badge_id)` 有唯一约束：
/// 一枚徽章无论触发规则命中多少次都只能获得一次。
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    pub badge_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub earned_at: DateTime<Utc>,
}

/// XP 账本流水（只追加）
///
/// 不变量：用户所有流水的 `xp_amount` 之和等于该用户当前 `xp`，
/// 由 `LedgerWriter::verify_balance` 审计。
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct XpEvent {
    pub id: i64,
    pub user_id: String,
    pub rule_id: Option<i64>,
    pub xp_amount: i64,
    pub event_data: Value,
    pub created_at: DateTime<Utc>,
}

/// 单个事件的处理结果摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    /// 本事件累计发放的 XP
    pub xp_awarded: i64,
    /// 本事件新获得的徽章名称（重复发放被幂等跳过的不在其中）
    pub badges_earned: Vec<String>,
    /// 是否触发升级
    pub level_up: bool,
    /// 升级后的新等级，仅升级时存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_level: Option<i32>,
}

impl ProcessOutcome {
    /// 零结果：事件缺少用户、无匹配规则等跳过场景的统一返回值
    pub fn skipped() -> Self {
        Self {
            xp_awarded: 0,
            badges_earned: Vec::new(),
            level_up: false,
            new_level: None,
        }
    }
}

/// 排行榜条目
///
/// `rank` 是页内位置推导的名次（`offset + 位置 + 1`），
/// 与 `RankingService::rank` 的个体名次在并列 XP 时可能不同，
/// 见 `ranking` 模块文档。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: String,
    pub display_name: String,
    pub xp: i64,
    pub level: i32,
    pub badge_count: i64,
}
