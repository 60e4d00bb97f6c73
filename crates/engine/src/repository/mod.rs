//! Postgres 仓储
//!
//! 每个实体一个仓储：连接池方法服务只读路径，`_in_tx` 静态方法
//! 服务事务路径（由 `PgStore` 在单事件事务内组合调用）。

mod rule_repo;
mod user_badge_repo;
mod user_repo;
mod xp_event_repo;

pub use rule_repo::RuleRepository;
pub use user_badge_repo::UserBadgeRepository;
pub use user_repo::UserRepository;
pub use xp_event_repo::XpEventRepository;
