//! 健康检查处理器

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// 健康检查
///
/// GET /health
///
/// 有数据库连接时附带一次 ping；失败返回 503 供负载均衡摘除。
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, StatusCode> {
    if let Some(db) = &state.db {
        if db.health_check().await.is_err() {
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    Ok(Json(HealthStatus {
        status: "healthy",
        service: "webhook-service",
        timestamp: chrono::Utc::now(),
    }))
}
