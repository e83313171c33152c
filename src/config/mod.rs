//! 配置管理模块
//!
//! 提供配置文件查找、解析和验证功能

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{resolve_config_path, ConfigLoader, TomlConfigLoader};
pub use types::{parse_listen, validate_config, CheckSpec, Config, HttpServerConfig, ServiceSpec};
