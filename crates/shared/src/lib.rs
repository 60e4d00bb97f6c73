//! 共享库
//!
//! 包含引擎与服务共用的配置、错误处理、数据库连接、事件信封、日志初始化等基础设施代码。

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod observability;
