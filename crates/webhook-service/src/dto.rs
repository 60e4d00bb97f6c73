//! API 响应 DTO 定义

use engageforge_engine::models::{EarnedBadge, LeaderboardEntry};
use serde::Serialize;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建错误响应
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
}

/// 分页信息
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    /// 返回数量填满 limit 时可能还有下一页
    pub has_more: bool,
}

/// 排行榜响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub pagination: Pagination,
}

/// 用户档案响应
///
/// 等级进度字段全部由共享的等级计算模块推导，
/// 与事件处理路径使用同一实现。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    pub user_id: String,
    pub company_id: String,
    pub display_name: Option<String>,
    pub xp: i64,
    pub level: i32,
    /// 当前等级的累计 XP 下界
    pub level_floor_xp: i64,
    /// 升到下一级所需的累计 XP
    pub next_level_xp: i64,
    pub progress_percent: f64,
    /// 个体名次（并列 XP 时与排行榜位置可能不同，见引擎文档）
    pub rank: i64,
    pub badges: Vec<EarnedBadge>,
}
