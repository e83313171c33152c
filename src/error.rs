//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use std::time::Duration;
use thiserror::Error;

/// Healthpose 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum HealthposeError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 服务注册表构建错误
    #[error("注册表错误: {0}")]
    Registry(#[from] RegistryError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 没有找到任何候选配置文件
    #[error("未找到配置文件，已尝试: {tried}")]
    NoConfigFile { tried: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 监听地址无效
    #[error("无效的监听地址: {0}")]
    InvalidListen(String),
}

/// 注册表构建错误，任何一种都会阻止进程开始服务
#[derive(Error, Debug)]
pub enum RegistryError {
    /// 未配置任何服务
    #[error("没有配置任何服务")]
    NoServices,

    /// 同一服务内探针名称重复
    #[error("服务 \"{service}\" 中存在重复的探针名称: {probe}")]
    DuplicateProbe { service: String, probe: String },

    /// 探针配置未匹配任何已知类型
    #[error("服务 \"{service}\" 的探针 \"{probe}\" 配置无效: {reason}")]
    UnknownProbeKind {
        service: String,
        probe: String,
        reason: String,
    },

    /// 探针构建失败
    #[error("服务 \"{service}\" 的探针 \"{probe}\" 构建失败: {source}")]
    ProbeBuild {
        service: String,
        probe: String,
        #[source]
        source: ProbeBuildError,
    },
}

/// 探针构建错误
#[derive(Error, Debug)]
pub enum ProbeBuildError {
    /// DNS 记录类型无效
    #[error("invalid domain record type: {0}")]
    InvalidRecordType(String),

    /// 地址无效
    #[error("invalid address \"{address}\": {reason}")]
    InvalidAddress { address: String, reason: String },

    /// 必填字段缺失
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// 客户端构建失败
    #[error("client setup failed: {0}")]
    Client(String),
}

/// 探针执行错误，只会被记录到报告中，不会逃逸出执行引擎
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// 超过探针自身的超时时间
    #[error("probe timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// 探针任务发生 panic
    #[error("probe panicked: {0}")]
    Panicked(String),

    /// 探针任务在完成前被取消
    #[error("probe task was cancelled")]
    Cancelled,

    /// 依赖检测失败
    #[error("{0}")]
    Failed(String),
}

impl ProbeError {
    /// 以统一前缀包装底层错误
    pub fn failed(context: &str, err: impl std::fmt::Display) -> Self {
        ProbeError::Failed(format!("{context}: {err}"))
    }

    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout(_))
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, HealthposeError>;
