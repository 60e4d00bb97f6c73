//! 活动事件信封
//!
//! 定义进入规则引擎的统一事件格式。webhook 送达的各类社区活动
//! （支付、聊天、课程完成等）都以此信封表示：`type` 是事件类型标签，
//! `data` 是不透明的业务字段，其中按约定可能携带 `user_id` 与 `company_id`。
//!
//! 信封刻意不为每种事件类型定义独立结构：规则只按 `type` 匹配，
//! `data` 原样写入 XP 账本用于审计。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 活动事件信封
///
/// 缺少 `user_id` 或 `company_id` 不是错误：系统级事件（如公司配置变更）
/// 天然没有触发用户，引擎对这类事件返回零结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// 事件类型标签（如 `chat.message.created`）
    #[serde(rename = "type")]
    pub event_type: String,
    /// 事件业务数据（JSON 对象，不同事件类型携带不同字段）
    #[serde(default)]
    pub data: Value,
}

impl ActivityEvent {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// 触发事件的用户 ID（约定字段 `data.user_id`）
    pub fn user_id(&self) -> Option<&str> {
        self.data.get("user_id").and_then(Value::as_str)
    }

    /// 事件所属公司 ID（约定字段 `data.company_id`）
    pub fn company_id(&self) -> Option<&str> {
        self.data.get("company_id").and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// 事件类型目录
// ---------------------------------------------------------------------------

/// 事件类型元信息，供仪表盘在配置规则时展示
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeInfo {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// 平台当前推送的事件类型
///
/// 规则的 `event_type` 是自由字符串，不强制限定在此目录内；
/// 目录只作为配置界面的提示数据。
pub const SUPPORTED_EVENT_TYPES: &[EventTypeInfo] = &[
    EventTypeInfo {
        value: "payment.succeeded",
        label: "Payment Succeeded",
        description: "When a user makes a purchase",
    },
    EventTypeInfo {
        value: "membership.activated",
        label: "Membership Activated",
        description: "When a user joins or renews",
    },
    EventTypeInfo {
        value: "chat.message.created",
        label: "Chat Message",
        description: "When a user posts in chat",
    },
    EventTypeInfo {
        value: "challenge.completed",
        label: "Challenge Completed",
        description: "When a user completes a challenge",
    },
    EventTypeInfo {
        value: "content.viewed",
        label: "Content Viewed",
        description: "When a user views content",
    },
    EventTypeInfo {
        value: "poll.voted",
        label: "Poll Vote",
        description: "When a user votes in a poll",
    },
];
