//! 事件类型目录 API 处理器

use axum::Json;

use engageforge_shared::events::{EventTypeInfo, SUPPORTED_EVENT_TYPES};

use crate::dto::ApiResponse;

/// 列出平台推送的事件类型
///
/// GET /api/event-types
///
/// 供仪表盘在配置规则时展示候选项；规则本身不限定在此目录内。
pub async fn list_event_types() -> Json<ApiResponse<&'static [EventTypeInfo]>> {
    Json(ApiResponse::success(SUPPORTED_EVENT_TYPES))
}
