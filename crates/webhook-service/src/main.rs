//! Webhook 接入与只读 API 服务
//!
//! 接收平台事件投递，驱动规则引擎发放 XP 和徽章，
//! 并提供排行榜 / 用户档案等只读端点。

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use engageforge_engine::PgStore;
use engageforge_shared::{config::AppConfig, database::Database, observability};
use webhook_service::{routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/{default,env,webhook-service}.toml + ENGAGE_* 环境变量
    let config = AppConfig::load("webhook-service").unwrap_or_default();
    observability::init(&config.observability)?;

    info!("Starting webhook-service on {}", config.server_addr());

    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        sqlx::migrate!("../../migrations").run(db.pool()).await?;
        info!("Database migrations applied");
    }

    let store = Arc::new(PgStore::new(db.pool().clone()));
    let state = AppState::new(store).with_database(db);

    // CORS 放开：只读端点供仪表盘前端跨域访问，webhook 端点无浏览器来源
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::app_routes()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )))
        .layer(cors)
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM（K8s 停止 Pod）或 Ctrl+C 时，
    // 停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
