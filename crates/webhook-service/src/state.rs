//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态。存储句柄与引擎组件在启动时
//! 显式构造注入，不存在进程级单例。

use std::sync::Arc;

use engageforge_engine::{EventProcessor, RankingService, store::GamifyStore};
use engageforge_shared::database::Database;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 事件处理入口（写路径）
    pub processor: Arc<EventProcessor>,
    /// 排名服务（读路径）
    pub ranking: Arc<RankingService>,
    /// 存储句柄，档案视图等直接读取
    pub store: Arc<dyn GamifyStore>,
    /// 数据库连接（健康检查用；内存存储驱动时为 None）
    pub db: Option<Database>,
}

impl AppState {
    /// 从存储句柄构建全部引擎组件
    pub fn new(store: Arc<dyn GamifyStore>) -> Self {
        Self {
            processor: Arc::new(EventProcessor::new(store.clone())),
            ranking: Arc::new(RankingService::new(store.clone())),
            store,
            db: None,
        }
    }

    /// 附加数据库连接用于健康检查
    pub fn with_database(mut self, db: Database) -> Self {
        self.db = Some(db);
        self
    }
}
