//! Web服务器实现
//!
//! 提供HTTP服务器和路由管理

use super::{handlers, WebAppState};
use crate::error::Result;
use crate::health::Registry;
use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// 构建路由
///
/// * `GET /healthcheck` - 存活检查
/// * `GET /v1/health/{service}` - 对配置中的服务执行检查
pub fn build_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/healthcheck", get(handlers::liveness))
        .route("/v1/health/{service}", get(handlers::service_health))
        .layer(TraceLayer::new_for_http())
        .with_state(WebAppState::new(registry))
}

/// Web服务器
pub struct WebServer {
    addr: SocketAddr,
    registry: Arc<Registry>,
}

impl WebServer {
    /// 创建新的Web服务器
    ///
    /// # 参数
    /// * `addr` - 监听地址
    /// * `registry` - 服务注册表
    pub fn new(addr: SocketAddr, registry: Arc<Registry>) -> Self {
        Self { addr, registry }
    }

    /// 启动服务器，直到 `shutdown` 完成后优雅退出
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("HTTP服务已启动，监听地址: {}", listener.local_addr()?);
        for key in self.registry.keys() {
            info!("健康检查端点: /v1/health/{}", key);
        }

        axum::serve(listener, build_router(self.registry))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP服务已停止");
        Ok(())
    }
}
