//! 排行榜 API 处理器

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use crate::dto::{ApiResponse, LeaderboardResponse, Pagination};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// 排行榜查询参数
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    #[serde(alias = "companyId")]
    pub company_id: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 获取公司排行榜
///
/// GET /api/leaderboard?company_id=xxx&limit=10&offset=0
#[instrument(skip(state, params), fields(company_id = %params.company_id))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<ApiResponse<LeaderboardResponse>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let leaderboard = state
        .ranking
        .leaderboard(&params.company_id, limit, offset)
        .await?;

    let has_more = leaderboard.len() as i64 == limit;
    Ok(Json(ApiResponse::success(LeaderboardResponse {
        leaderboard,
        pagination: Pagination {
            limit,
            offset,
            has_more,
        },
    })))
}
