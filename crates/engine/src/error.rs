//! 引擎错误类型
//!
//! 定义规则引擎的业务错误和系统错误

use thiserror::Error;

/// 引擎错误类型
#[derive(Debug, Error)]
pub enum EngineError {
    // === 存储错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    // === 配置不一致 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("公司不存在: {0}")]
    CompanyNotFound(String),

    // === 不变量破坏 ===
    /// 用户 XP 与账本流水之和不一致，说明原子性被破坏，属于程序错误而非运行时状况
    #[error("XP 账本失衡: user_id={user_id}, 账本合计={ledger_sum}, 用户 xp={user_xp}")]
    LedgerDrift {
        user_id: String,
        ledger_sum: i64,
        user_xp: i64,
    },

    // === 系统错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// 检查是否为可重试的错误
    ///
    /// 事件处理失败时由传输层决定是否重试；账本失衡等不变量破坏重试无意义
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// 获取错误码（用于 API 响应和日志聚合）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::LedgerDrift { .. } => "LEDGER_DRIFT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(EngineError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(
            !EngineError::LedgerDrift {
                user_id: "U1".to_string(),
                ledger_sum: 30,
                user_xp: 15,
            }
            .is_retryable()
        );
        assert!(!EngineError::Validation("bad limit".to_string()).is_retryable());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            EngineError::UserNotFound("U1".to_string()).error_code(),
            "USER_NOT_FOUND"
        );
        assert_eq!(
            EngineError::LedgerDrift {
                user_id: "U1".to_string(),
                ledger_sum: 1,
                user_xp: 2,
            }
            .error_code(),
            "LEDGER_DRIFT"
        );
    }

    #[test]
    fn test_ledger_drift_display_carries_both_sides() {
        let err = EngineError::LedgerDrift {
            user_id: "U7".to_string(),
            ledger_sum: 120,
            user_xp: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("U7"));
        assert!(msg.contains("120"));
        assert!(msg.contains("100"));
    }
}
