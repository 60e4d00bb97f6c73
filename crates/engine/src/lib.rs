//! 游戏化规则引擎
//!
//! 接收归一化的活动事件，按公司配置的规则累加用户 XP、推导等级，
//! 并幂等地发放徽章；同时从同一份 XP 数据派生排行榜和用户排名。
//!
//! 模块划分与依赖方向（自底向上）：
//! - [`level`] — 纯函数等级计算，无依赖
//! - [`store`] — 存储契约（`GamifyStore`）及 Postgres / 内存两种实现
//! - [`matcher`] — 规则匹配
//! - [`ledger`] — 单事件的原子记账（XP 账本 + 徽章发放 + 等级更新）
//! - [`processor`] — 单事件编排入口
//! - [`ranking`] — 排行榜与排名的只读派生
//!
//! 引擎的唯一可变共享资源是用户行的 `xp`/`level`，其并发安全由
//! `GamifyStore::apply_awards` 的原子性保证（Postgres 行锁事务或
//! 内存实现的互斥锁），详见 [`store`] 模块文档。

pub mod error;
pub mod ledger;
pub mod level;
pub mod matcher;
pub mod models;
pub mod processor;
pub mod ranking;
pub mod repository;
pub mod store;

pub use error::{EngineError, Result};
pub use ledger::LedgerWriter;
pub use matcher::RuleMatcher;
pub use models::{LeaderboardEntry, ProcessOutcome};
pub use processor::EventProcessor;
pub use ranking::RankingService;
pub use store::{GamifyStore, memory::MemoryStore, postgres::PgStore};
