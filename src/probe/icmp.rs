//! ICMP 探针实现
//!
//! 发送 ICMP echo 请求并等待响应，主机名会在每次执行时重新解析

use super::{seconds_to_duration, Probe, ProbeContext};
use crate::error::{ProbeBuildError, ProbeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use surge_ping::{Client, Config as PingConfig, PingIdentifier, PingSequence, ICMP};

/// 默认发送的报文数量
pub const DEFAULT_COUNT: u16 = 1;
/// 默认报文发送间隔
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
/// 默认单个报文的等待时间
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const PAYLOAD: [u8; 56] = [0; 56];

static NEXT_IDENTIFIER: AtomicU16 = AtomicU16::new(0);

/// ICMP 探针配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IcmpConfig {
    /// 被检测的 IP 地址或主机名
    pub address: String,
    /// 发送的报文数量，默认 1
    pub count: Option<u16>,
    /// 报文发送间隔（秒），默认 1 秒
    pub interval: Option<f64>,
    /// 单个报文的等待时间（秒），默认 5 秒
    pub request_timeout: Option<f64>,
}

/// ICMP 探针
pub struct IcmpProbe {
    address: String,
    count: u16,
    interval: Duration,
    request_timeout: Duration,
}

impl IcmpProbe {
    /// 根据配置创建 ICMP 探针
    pub fn new(config: &IcmpConfig) -> Result<Self, ProbeBuildError> {
        if config.address.trim().is_empty() {
            return Err(ProbeBuildError::MissingField("address"));
        }

        Ok(Self {
            address: config.address.clone(),
            count: config.count.filter(|c| *c > 0).unwrap_or(DEFAULT_COUNT),
            interval: seconds_to_duration(config.interval).unwrap_or(DEFAULT_INTERVAL),
            request_timeout: seconds_to_duration(config.request_timeout)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }

    /// 配置的报文数量
    pub fn count(&self) -> u16 {
        self.count
    }

    async fn resolve(&self) -> Result<IpAddr, ProbeError> {
        if let Ok(ip) = self.address.parse::<IpAddr>() {
            return Ok(ip);
        }

        tokio::net::lookup_host((self.address.as_str(), 0))
            .await
            .map_err(|e| ProbeError::failed("ping address resolve error", e))?
            .map(|addr| addr.ip())
            .next()
            .ok_or_else(|| {
                ProbeError::failed("ping address resolve error", "no address found")
            })
    }
}

#[async_trait]
impl Probe for IcmpProbe {
    fn kind(&self) -> &'static str {
        "icmp"
    }

    async fn execute(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let ip = self.resolve().await?;

        let config = match ip {
            IpAddr::V4(_) => PingConfig::default(),
            IpAddr::V6(_) => PingConfig::builder().kind(ICMP::V6).build(),
        };
        let client = Client::new(&config).map_err(|e| ProbeError::failed("ping error", e))?;

        let identifier = PingIdentifier(NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed));
        let mut pinger = client.pinger(ip, identifier).await;

        let mut received = 0u16;
        let mut last_error = None;
        for seq in 0..self.count {
            pinger.timeout(ctx.budget(self.request_timeout));
            match pinger.ping(PingSequence(seq), &PAYLOAD).await {
                Ok(_) => received += 1,
                Err(e) => last_error = Some(e.to_string()),
            }

            if seq + 1 < self.count {
                tokio::time::sleep(self.interval).await;
            }
        }

        if received == 0 {
            return Err(ProbeError::failed(
                "ping error",
                last_error.unwrap_or_else(|| format!("no reply from {ip}")),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icmp_defaults() {
        let probe = IcmpProbe::new(&IcmpConfig {
            address: "127.0.0.1".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(probe.count(), 1);
        assert_eq!(probe.interval, DEFAULT_INTERVAL);
        assert_eq!(probe.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_icmp_zero_count_uses_default() {
        let probe = IcmpProbe::new(&IcmpConfig {
            address: "127.0.0.1".to_string(),
            count: Some(0),
            interval: Some(0.5),
            request_timeout: Some(2.0),
        })
        .unwrap();

        assert_eq!(probe.count(), 1);
        assert_eq!(probe.interval, Duration::from_millis(500));
        assert_eq!(probe.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_icmp_missing_address() {
        assert!(matches!(
            IcmpProbe::new(&IcmpConfig::default()),
            Err(ProbeBuildError::MissingField("address"))
        ));
    }

    #[tokio::test]
    async fn test_icmp_unresolvable_host() {
        let probe = IcmpProbe::new(&IcmpConfig {
            address: "unresolvable.invalid".to_string(),
            ..Default::default()
        })
        .unwrap();

        let err = probe.resolve().await.unwrap_err();
        assert!(err.to_string().starts_with("ping address resolve error"));
    }
}
