//! API 处理器

pub mod event_type;
pub mod health;
pub mod leaderboard;
pub mod user;
pub mod webhook;
