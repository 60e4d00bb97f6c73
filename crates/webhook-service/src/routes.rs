//! 路由配置模块
//!
//! 定义 webhook 接入端点与只读 API 端点的路由映射

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// 构建 webhook 接入路由
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks", post(handlers::webhook::receive_webhook))
}

/// 构建只读 API 路由
///
/// 包含排行榜、用户档案和事件类型目录
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(handlers::leaderboard::get_leaderboard))
        .route("/users/{user_id}", get(handlers::user::get_user_profile))
        .route("/event-types", get(handlers::event_type::list_event_types))
}

/// 构建完整的应用路由（不含中间件层，由 main.rs 挂载）
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(webhook_routes())
        .nest("/api", api_routes())
        .route("/health", get(handlers::health::health_check))
}
