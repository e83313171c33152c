//! 健康检查模块
//!
//! 提供探针注册、并发执行、状态聚合和服务注册表

pub mod aggregator;
pub mod engine;
pub mod registration;
pub mod registry;
pub mod result;

// 重新导出主要类型
pub use aggregator::aggregate;
pub use engine::ServiceEngine;
pub use registration::{ProbeRegistration, DEFAULT_PROBE_TIMEOUT};
pub use registry::Registry;
pub use result::{CheckState, OverallStatus, ProbeOutcome, ServiceReport};
