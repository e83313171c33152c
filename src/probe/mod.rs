//! 探针模块
//!
//! 定义探针执行接口，以及每种后端协议对应的探针实现。
//! 每种探针类型由 [`ProbeKind`] 的一个变体加一个构建函数组成，
//! 在启动时一次性解析为统一的 [`Probe`] 能力。

pub mod dns;
pub mod http;
pub mod icmp;
pub mod memcached;
pub mod nats;
pub mod redis;
pub mod sql;

use crate::error::{ProbeBuildError, ProbeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub use dns::{DnsConfig, DnsProbe, RecordType};
pub use http::{HttpConfig, HttpProbe, InfluxDbConfig, InfluxDbProbe};
pub use icmp::{IcmpConfig, IcmpProbe};
pub use memcached::MemcachedProbe;
pub use nats::NatsProbe;
pub use self::redis::RedisProbe;
pub use sql::{MySqlProbe, PostgresProbe};

/// 单次探针执行的上下文
#[derive(Debug, Clone)]
pub struct ProbeContext {
    /// 探针名称
    pub name: String,
    /// 本次执行的截止时间，由该探针自身的超时时间推导
    pub deadline: Instant,
}

impl ProbeContext {
    /// 创建新的执行上下文
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            deadline: deadline_after(timeout),
        }
    }

    /// 距离截止时间的剩余时长
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// 在探针自身的请求超时和剩余预算之间取较小值
    pub fn budget(&self, request_timeout: Duration) -> Duration {
        request_timeout.min(self.remaining())
    }
}

/// 探针trait，对一个依赖执行一次检测
///
/// 实现者只报告成功或 [`ProbeError`]，不应 panic；
/// 超时由执行引擎在外部强制，探针自身的请求超时只是更细的约束。
#[async_trait]
pub trait Probe: Send + Sync {
    /// 探针类型名称，用于日志
    fn kind(&self) -> &'static str;

    /// 执行一次检测
    async fn execute(&self, ctx: &ProbeContext) -> Result<(), ProbeError>;
}

/// 由闭包实现的探针
pub struct FnProbe<F> {
    kind: &'static str,
    check: F,
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn(ProbeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send,
{
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn execute(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        (self.check)(ctx.clone()).await
    }
}

/// 用闭包创建探针
///
/// # 参数
/// * `check` - 接收执行上下文并返回检测结果的异步闭包
pub fn from_fn<F, Fut>(check: F) -> Arc<dyn Probe>
where
    F: Fn(ProbeContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
{
    Arc::new(FnProbe {
        kind: "custom",
        check,
    })
}

/// 只包含连接串的探针配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DsnConfig {
    /// 连接串
    #[serde(default)]
    pub dsn: String,
}

/// 探针类型及其专属配置
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeKind {
    Dns(DnsConfig),
    Icmp(IcmpConfig),
    Http(HttpConfig),
    InfluxDb(InfluxDbConfig),
    Memcached(DsnConfig),
    Nats(DsnConfig),
    Postgres(DsnConfig),
    MySql(DsnConfig),
    Redis(DsnConfig),
}

impl ProbeKind {
    /// 配置文件中使用的类型名称
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Dns(_) => "dns",
            ProbeKind::Icmp(_) => "icmp",
            ProbeKind::Http(_) => "http",
            ProbeKind::InfluxDb(_) => "influxdb",
            ProbeKind::Memcached(_) => "memcached",
            ProbeKind::Nats(_) => "nats",
            ProbeKind::Postgres(_) => "postgres",
            ProbeKind::MySql(_) => "mysql",
            ProbeKind::Redis(_) => "redis",
        }
    }

    /// 将类型配置解析为可执行的探针
    pub fn build(&self) -> Result<Arc<dyn Probe>, ProbeBuildError> {
        let probe: Arc<dyn Probe> = match self {
            ProbeKind::Dns(config) => Arc::new(DnsProbe::new(config)?),
            ProbeKind::Icmp(config) => Arc::new(IcmpProbe::new(config)?),
            ProbeKind::Http(config) => Arc::new(HttpProbe::new(config)?),
            ProbeKind::InfluxDb(config) => Arc::new(InfluxDbProbe::new(config)?),
            ProbeKind::Memcached(config) => Arc::new(MemcachedProbe::new(config)?),
            ProbeKind::Nats(config) => Arc::new(NatsProbe::new(config)?),
            ProbeKind::Postgres(config) => Arc::new(PostgresProbe::new(config)?),
            ProbeKind::MySql(config) => Arc::new(MySqlProbe::new(config)?),
            ProbeKind::Redis(config) => Arc::new(RedisProbe::new(config)?),
        };
        Ok(probe)
    }
}

/// 配置中任何时长字段允许的最大秒数（一天）
pub const MAX_CONFIG_SECONDS: f64 = 86_400.0;

/// 截止时间无法表示时使用的远期偏移，约30年
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// 将配置中的秒数转换为时长，非正数、非法值或溢出返回 None
pub fn seconds_to_duration(seconds: Option<f64>) -> Option<Duration> {
    match seconds {
        Some(secs) if secs.is_finite() && secs > 0.0 => Duration::try_from_secs_f64(secs).ok(),
        _ => None,
    }
}

/// 从当前时刻起经过 `timeout` 的截止时间，溢出时退化为远期截止时间
pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// 拆分 `host[:port]` 形式的地址，缺省端口使用 `default_port`
pub(crate) fn split_host_port(
    address: &str,
    default_port: u16,
) -> Result<(String, u16), ProbeBuildError> {
    let invalid = |reason: &str| ProbeBuildError::InvalidAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    if address.trim().is_empty() {
        return Err(invalid("empty address"));
    }

    // [v6]:port 或裸 IPv6
    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| invalid("unclosed '['"))?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().map_err(|_| invalid("bad port"))?,
            None if tail.is_empty() => default_port,
            None => return Err(invalid("unexpected characters after ']'")),
        };
        return Ok((host.to_string(), port));
    }

    if address.parse::<std::net::Ipv6Addr>().is_ok() {
        return Ok((address.to_string(), default_port));
    }

    match address.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().map_err(|_| invalid("bad port"))?;
            Ok((host.to_string(), port))
        }
        None => Ok((address.to_string(), default_port)),
    }
}
