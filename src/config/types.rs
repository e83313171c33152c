//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::error::ConfigError;
use crate::probe::{
    DnsConfig, DsnConfig, HttpConfig, IcmpConfig, InfluxDbConfig, ProbeKind, MAX_CONFIG_SECONDS,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// 主配置结构，包含HTTP监听配置和服务表
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP服务配置
    #[serde(default)]
    pub http: HttpServerConfig,
    /// 服务表，键为服务标识，同时用作路由 `/v1/health/<key>`
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
}

/// HTTP服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpServerConfig {
    /// 监听地址，`:8080` 表示监听所有网卡
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl HttpServerConfig {
    /// 解析监听地址
    ///
    /// # 返回
    /// * `Result<SocketAddr, ConfigError>` - 解析后的套接字地址
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_listen(&self.listen)
    }
}

/// 单个服务的配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSpec {
    /// 服务名称
    pub name: String,
    /// 服务版本
    #[serde(default)]
    pub version: String,
    /// 健康检查列表，顺序即报告中的输出顺序
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

/// 单个健康检查的配置
///
/// 每个检查必须且只能设置一种探针类型的子表
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckSpec {
    /// 检查名称，在同一服务内唯一
    pub name: String,
    /// 超时时间（秒），缺失或非正数时使用60秒
    #[serde(default)]
    pub timeout: Option<f64>,
    /// 失败时只降级而不判定服务不可用
    #[serde(default, alias = "skip_on_error")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp: Option<IcmpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influxdb: Option<InfluxDbConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memcached: Option<DsnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nats: Option<DsnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres: Option<DsnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysql: Option<DsnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis: Option<DsnConfig>,
    // 以下类型可被识别但不支持，启动时报错
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cassandra: Option<toml::Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo: Option<toml::Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rabbitmq: Option<toml::Table>,
}

impl CheckSpec {
    /// 该检查中所有以秒为单位的配置项
    fn seconds_fields(&self) -> Vec<(&'static str, Option<f64>)> {
        let mut fields = vec![("timeout", self.timeout)];
        if let Some(dns) = &self.dns {
            fields.push(("dns.request_timeout", dns.request_timeout));
            fields.push(("dns.fallback_delay", dns.fallback_delay));
        }
        if let Some(icmp) = &self.icmp {
            fields.push(("icmp.interval", icmp.interval));
            fields.push(("icmp.request_timeout", icmp.request_timeout));
        }
        if let Some(http) = &self.http {
            fields.push(("http.request_timeout", http.request_timeout));
        }
        fields
    }

    /// 解析该检查的探针类型
    ///
    /// # 返回
    /// * `Result<ProbeKind, String>` - 未设置、设置多个或设置了不支持的类型时返回原因
    pub fn kind(&self) -> Result<ProbeKind, String> {
        let unsupported: Vec<&str> = [
            ("cassandra", self.cassandra.is_some()),
            ("mongo", self.mongo.is_some()),
            ("rabbitmq", self.rabbitmq.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        if !unsupported.is_empty() {
            return Err(format!("不支持的探针类型: {}", unsupported.join(", ")));
        }

        let mut kinds: Vec<ProbeKind> = Vec::new();
        if let Some(c) = &self.dns {
            kinds.push(ProbeKind::Dns(c.clone()));
        }
        if let Some(c) = &self.icmp {
            kinds.push(ProbeKind::Icmp(c.clone()));
        }
        if let Some(c) = &self.http {
            kinds.push(ProbeKind::Http(c.clone()));
        }
        if let Some(c) = &self.influxdb {
            kinds.push(ProbeKind::InfluxDb(c.clone()));
        }
        if let Some(c) = &self.memcached {
            kinds.push(ProbeKind::Memcached(c.clone()));
        }
        if let Some(c) = &self.nats {
            kinds.push(ProbeKind::Nats(c.clone()));
        }
        if let Some(c) = &self.postgres {
            kinds.push(ProbeKind::Postgres(c.clone()));
        }
        if let Some(c) = &self.mysql {
            kinds.push(ProbeKind::MySql(c.clone()));
        }
        if let Some(c) = &self.redis {
            kinds.push(ProbeKind::Redis(c.clone()));
        }

        match kinds.len() {
            0 => Err("未指定探针类型".to_string()),
            1 => Ok(kinds.remove(0)),
            _ => {
                let names: Vec<&str> = kinds.iter().map(ProbeKind::name).collect();
                Err(format!("指定了多个探针类型: {}", names.join(", ")))
            }
        }
    }
}

/// 默认监听地址
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

/// 解析监听地址，`:port` 形式补全为 `0.0.0.0:port`
pub fn parse_listen(listen: &str) -> Result<SocketAddr, ConfigError> {
    let listen = listen.trim();
    let normalized = if listen.starts_with(':') {
        format!("0.0.0.0{listen}")
    } else {
        listen.to_string()
    };

    normalized
        .parse()
        .map_err(|_| ConfigError::InvalidListen(listen.to_string()))
}

/// 验证配置的有效性
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.services.is_empty() {
        return Err("至少需要配置一个服务".to_string());
    }

    parse_listen(&config.http.listen).map_err(|e| e.to_string())?;

    // 服务标识会成为路由的一段
    let key_regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$")
        .map_err(|e| format!("正则表达式错误: {e}"))?;

    for (key, service) in &config.services {
        if !key_regex.is_match(key) {
            return Err(format!(
                "服务标识 \"{key}\" 无效，只能包含字母、数字、'.'、'_'、'-'"
            ));
        }

        if service.name.trim().is_empty() {
            return Err(format!("服务 \"{key}\" 的名称不能为空"));
        }

        for (index, check) in service.checks.iter().enumerate() {
            if check.name.trim().is_empty() {
                return Err(format!("服务 \"{key}\" 的第 {} 个检查名称不能为空", index + 1));
            }

            check
                .kind()
                .map_err(|reason| format!("服务 \"{key}\" 的检查 \"{}\": {reason}", check.name))?;

            for (field, seconds) in check.seconds_fields() {
                if seconds.is_some_and(|secs| secs.is_nan() || secs > MAX_CONFIG_SECONDS) {
                    return Err(format!(
                        "服务 \"{key}\" 的检查 \"{}\": {field} 不能超过 {MAX_CONFIG_SECONDS} 秒",
                        check.name
                    ));
                }
            }
        }
    }

    Ok(())
}
