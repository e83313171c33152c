//! HTTP 探针实现
//!
//! 提供 HTTP 端点探针和基于 HTTP `/ping` 接口的 InfluxDB 探针

use super::{seconds_to_duration, Probe, ProbeContext};
use crate::error::{ProbeBuildError, ProbeError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 默认请求超时时间
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP 探针配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// 被检测的URL
    pub url: String,
    /// 请求超时（秒），默认 5 秒
    pub request_timeout: Option<f64>,
}

/// InfluxDB 探针配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InfluxDbConfig {
    /// InfluxDB 服务地址
    pub url: String,
}

/// 构建HTTP客户端
fn build_client(timeout: Duration) -> Result<Client, ProbeBuildError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
        .build()
        .map_err(|e| ProbeBuildError::Client(e.to_string()))
}

/// 校验URL格式
fn validate_url(url: &str) -> Result<(), ProbeBuildError> {
    if url.trim().is_empty() {
        return Err(ProbeBuildError::MissingField("url"));
    }
    reqwest::Url::parse(url)
        .map(|_| ())
        .map_err(|e| ProbeBuildError::InvalidAddress {
            address: url.to_string(),
            reason: e.to_string(),
        })
}

/// 格式化请求错误信息，使其更加清晰易读
fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else if error.is_request() {
        format!("invalid request: {error}")
    } else {
        format!("request failed: {error}")
    }
}

/// HTTP 探针
pub struct HttpProbe {
    client: Client,
    url: String,
    request_timeout: Duration,
}

impl HttpProbe {
    /// 根据配置创建 HTTP 探针
    pub fn new(config: &HttpConfig) -> Result<Self, ProbeBuildError> {
        validate_url(&config.url)?;
        let request_timeout =
            seconds_to_duration(config.request_timeout).unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            client: build_client(request_timeout)?,
            url: config.url.clone(),
            request_timeout,
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn kind(&self) -> &'static str {
        "http"
    }

    async fn execute(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(ctx.budget(self.request_timeout))
            .send()
            .await
            .map_err(|e| ProbeError::Failed(describe_request_error(&e)))?;

        let status = response.status();
        if status.as_u16() >= StatusCode::INTERNAL_SERVER_ERROR.as_u16() {
            return Err(ProbeError::Failed(format!(
                "remote service is not available at the moment: HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        Ok(())
    }
}

/// InfluxDB 探针，请求 `/ping` 接口
pub struct InfluxDbProbe {
    client: Client,
    ping_url: String,
}

impl InfluxDbProbe {
    /// 根据配置创建 InfluxDB 探针
    pub fn new(config: &InfluxDbConfig) -> Result<Self, ProbeBuildError> {
        validate_url(&config.url)?;

        Ok(Self {
            client: build_client(DEFAULT_REQUEST_TIMEOUT)?,
            ping_url: format!("{}/ping", config.url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Probe for InfluxDbProbe {
    fn kind(&self) -> &'static str {
        "influxdb"
    }

    async fn execute(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(&self.ping_url)
            .timeout(ctx.budget(DEFAULT_REQUEST_TIMEOUT))
            .send()
            .await
            .map_err(|e| ProbeError::failed("influxdb ping failed", describe_request_error(&e)))?;

        if !response.status().is_success() {
            return Err(ProbeError::Failed(format!(
                "influxdb ping failed: HTTP {}",
                response.status().as_u16()
            )));
        }

        Ok(())
    }
}
