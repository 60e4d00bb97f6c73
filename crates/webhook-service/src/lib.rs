//! Webhook 接入与只读 API 服务
//!
//! 职责刻意很薄：接收 webhook 投递，快速回 200，把事件异步派发给
//! 规则引擎；另提供排行榜 / 用户档案 / 事件类型目录的只读端点。
//! 签名校验与重试退避属于上游平台的职责，不在本服务内。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
