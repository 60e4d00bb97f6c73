//! API 错误类型
//!
//! 引擎错误到 HTTP 响应的映射。系统级错误只返回通用提示，
//! 详细信息仅记录日志，防止信息泄露。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use engageforge_engine::EngineError;

use crate::dto::ApiResponse;

/// API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("参数错误: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(e) => match e {
                EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                EngineError::UserNotFound(_) | EngineError::CompanyNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                // 可重试的存储故障提示调用方稍后再试
                e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Engine(e) => e.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "请求处理失败");
            "服务内部错误，请稍后重试".to_string()
        } else {
            self.to_string()
        };

        let body = ApiResponse::<()>::error(self.error_code(), message);
        (status, Json(body)).into_response()
    }
}
