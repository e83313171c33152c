//! Healthpose - 服务依赖健康检查端点
//!
//! 为每个配置的服务暴露一个 HTTP 健康检查端点，支持：
//! - DNS、ICMP、HTTP、InfluxDB、Memcached、NATS、PostgreSQL、MySQL、Redis 探针
//! - 每个探针独立超时与 panic 隔离
//! - 可跳过探针失败时降级而不是不可用
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod probe;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use error::HealthposeError;
pub use health::{OverallStatus, ProbeRegistration, Registry, ServiceEngine, ServiceReport};
pub use probe::{Probe, ProbeContext, ProbeKind};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
