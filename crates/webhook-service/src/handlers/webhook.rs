//! Webhook 接入处理器
//!
//! 事件以 fire-and-forget 方式派发：先回 200 防止平台侧重投，
//! 引擎处理在独立任务中进行，失败只落日志（引擎内部的原子性
//! 与调度方式无关，见引擎文档）。

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, error, info};

use engageforge_shared::events::ActivityEvent;

use crate::state::AppState;

/// 接收 webhook 事件
///
/// POST /webhooks
///
/// 始终快速返回 200；缺少 `company_id` 的事件直接跳过。
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(event): Json<ActivityEvent>,
) -> StatusCode {
    info!(event_type = %event.event_type, "收到 webhook 事件");

    let Some(company_id) = event.company_id().map(str::to_string) else {
        debug!(event_type = %event.event_type, "事件不携带 company_id，跳过");
        return StatusCode::OK;
    };

    let processor = state.processor.clone();
    tokio::spawn(async move {
        match processor.process(&event, &company_id).await {
            Ok(outcome) if outcome.xp_awarded > 0 => {
                info!(
                    company_id,
                    xp_awarded = outcome.xp_awarded,
                    badges = outcome.badges_earned.len(),
                    level_up = outcome.level_up,
                    "事件处理完成"
                );
            }
            Ok(_) => debug!(company_id, "事件未命中任何规则"),
            Err(e) => {
                // 失败是可观测性事件，不回传给事件源；重试由平台侧投递策略决定
                error!(
                    company_id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "事件处理失败"
                );
            }
        }
    });

    StatusCode::OK
}
