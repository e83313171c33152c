//! DNS 探针实现
//!
//! 检测域名记录能否被解析，支持 A/CNAME/PTR/TXT 记录和自定义解析服务器

use super::{seconds_to_duration, split_host_port, Probe, ProbeContext};
use crate::error::{ProbeBuildError, ProbeError};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RecordType as WireRecordType;
use hickory_resolver::TokioAsyncResolver;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

/// 默认单次请求超时时间
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(300);

/// 默认 DNS 端口
const DEFAULT_DNS_PORT: u16 = 53;

/// DNS 记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordType {
    /// 主机地址记录（同时查询 A/AAAA）
    #[default]
    A,
    /// 别名记录
    Cname,
    /// 反向解析记录
    Ptr,
    /// 文本记录
    Txt,
}

impl FromStr for RecordType {
    type Err = ProbeBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "a" => Ok(RecordType::A),
            "cname" => Ok(RecordType::Cname),
            "ptr" => Ok(RecordType::Ptr),
            "txt" => Ok(RecordType::Txt),
            _ => Err(ProbeBuildError::InvalidRecordType(s.to_string())),
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::A => write!(f, "a"),
            RecordType::Cname => write!(f, "cname"),
            RecordType::Ptr => write!(f, "ptr"),
            RecordType::Txt => write!(f, "txt"),
        }
    }
}

/// DNS 探针配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DnsConfig {
    /// 被检测的域名或 IP 地址
    pub address: String,
    /// 解析服务器 `host[:port]`，为空时使用系统配置
    pub server: Option<String>,
    /// 记录类型，默认 A 记录
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    /// 单次请求超时（秒），默认 0.3 秒
    pub request_timeout: Option<f64>,
    /// 重试间隔提示（秒）
    pub fallback_delay: Option<f64>,
}

/// DNS 探针
pub struct DnsProbe {
    address: String,
    record_type: RecordType,
    reverse_ip: Option<IpAddr>,
    resolver: TokioAsyncResolver,
}

impl DnsProbe {
    /// 根据配置创建 DNS 探针
    ///
    /// # 参数
    /// * `config` - DNS 探针配置
    ///
    /// # 返回
    /// * `Result<Self, ProbeBuildError>` - 记录类型或服务器地址无效时返回错误
    pub fn new(config: &DnsConfig) -> Result<Self, ProbeBuildError> {
        if config.address.trim().is_empty() {
            return Err(ProbeBuildError::MissingField("address"));
        }

        let record_type = config
            .record_type
            .as_deref()
            .map(RecordType::from_str)
            .transpose()?
            .unwrap_or_default();

        let reverse_ip = if record_type == RecordType::Ptr {
            let ip = config.address.parse::<IpAddr>().map_err(|e| {
                ProbeBuildError::InvalidAddress {
                    address: config.address.clone(),
                    reason: format!("ptr lookup requires an IP address: {e}"),
                }
            })?;
            Some(ip)
        } else {
            None
        };

        let mut opts = ResolverOpts::default();
        opts.timeout = seconds_to_duration(config.request_timeout).unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        opts.attempts = 1;
        // 健康检测需要每次真实查询
        opts.cache_size = 0;

        let resolver_config = match config.server.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(server) => {
                let addr = resolve_server(server)?;
                ResolverConfig::from_parts(
                    None,
                    vec![],
                    NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true),
                )
            }
            None => match hickory_resolver::system_conf::read_system_conf() {
                Ok((system_config, _)) => system_config,
                Err(e) => {
                    tracing::warn!("读取系统DNS配置失败，使用默认解析服务器: {}", e);
                    ResolverConfig::default()
                }
            },
        };

        Ok(Self {
            address: config.address.clone(),
            record_type,
            reverse_ip,
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        })
    }

    /// 当前探针的记录类型
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    async fn lookup(&self) -> Result<(), hickory_resolver::error::ResolveError> {
        match self.record_type {
            RecordType::A => self.resolver.lookup_ip(self.address.as_str()).await.map(|_| ()),
            RecordType::Cname => self
                .resolver
                .lookup(self.address.as_str(), WireRecordType::CNAME)
                .await
                .map(|_| ()),
            RecordType::Ptr => match self.reverse_ip {
                Some(ip) => self.resolver.reverse_lookup(ip).await.map(|_| ()),
                None => Ok(()),
            },
            RecordType::Txt => self.resolver.txt_lookup(self.address.as_str()).await.map(|_| ()),
        }
    }
}

/// 解析 `host[:port]` 形式的解析服务器地址
fn resolve_server(server: &str) -> Result<SocketAddr, ProbeBuildError> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let (host, port) = split_host_port(server, DEFAULT_DNS_PORT)?;
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    (host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| ProbeBuildError::InvalidAddress {
            address: server.to_string(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| ProbeBuildError::InvalidAddress {
            address: server.to_string(),
            reason: "no address resolved".to_string(),
        })
}

#[async_trait]
impl Probe for DnsProbe {
    fn kind(&self) -> &'static str {
        "dns"
    }

    async fn execute(&self, _ctx: &ProbeContext) -> Result<(), ProbeError> {
        self.lookup()
            .await
            .map_err(|e| ProbeError::failed("domain health check failed", e))
    }
}
