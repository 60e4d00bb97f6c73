//! 用户档案 API 处理器

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::instrument;

use engageforge_engine::level;

use crate::dto::{ApiResponse, UserProfileDto};
use crate::error::ApiError;
use crate::state::AppState;

/// 档案查询参数
#[derive(Debug, Deserialize)]
pub struct ProfileParams {
    #[serde(alias = "companyId")]
    pub company_id: String,
}

/// 获取用户档案
///
/// GET /api/users/{user_id}?company_id=xxx
///
/// 首次访问即惰性创建用户（xp=0, level=1），与事件路径的
/// 创建语义一致。
#[instrument(skip(state, params), fields(company_id = %params.company_id))]
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ProfileParams>,
) -> Result<Json<ApiResponse<UserProfileDto>>, ApiError> {
    let user = state
        .store
        .get_or_create_user(&user_id, &params.company_id)
        .await?;
    let rank = state.ranking.rank(&user_id, &params.company_id).await?;
    let badges = state.store.user_badges(&user_id).await?;

    Ok(Json(ApiResponse::success(UserProfileDto {
        user_id: user.id,
        company_id: user.company_id,
        display_name: user.display_name,
        xp: user.xp,
        level: user.level,
        level_floor_xp: level::xp_floor(user.level),
        next_level_xp: level::xp_ceil(user.level),
        progress_percent: level::progress_percent(user.xp),
        rank,
        badges,
    })))
}
