//! Web 接口模块
//!
//! 提供存活检查和按服务划分的健康检查 HTTP 端点

pub mod handlers;
pub mod server;

pub use server::{build_router, WebServer};

use crate::health::Registry;
use std::sync::Arc;

/// Web 应用共享状态
#[derive(Debug, Clone)]
pub struct WebAppState {
    /// 服务注册表，启动后只读
    pub registry: Arc<Registry>,
}

impl WebAppState {
    /// 创建新的共享状态
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}
