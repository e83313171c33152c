//! NATS 探针实现

use super::{split_host_port, DsnConfig, Probe, ProbeContext};
use crate::error::{ProbeBuildError, ProbeError};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_PORT: u16 = 4222;

/// NATS 探针，连接后等待服务器的 `INFO` 问候行
pub struct NatsProbe {
    host: String,
    port: u16,
}

impl NatsProbe {
    /// 根据配置创建 NATS 探针，`dsn` 形如 `nats://[user:pass@]host[:port]`
    pub fn new(config: &DsnConfig) -> Result<Self, ProbeBuildError> {
        let dsn = config.dsn.trim();
        if dsn.is_empty() {
            return Err(ProbeBuildError::MissingField("dsn"));
        }

        let without_scheme = dsn
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(dsn);
        let without_auth = without_scheme
            .rsplit_once('@')
            .map(|(_, rest)| rest)
            .unwrap_or(without_scheme);
        // 多个服务器时只检测第一个
        let first = without_auth.split(',').next().unwrap_or(without_auth);
        let first = first.trim_end_matches('/');

        let (host, port) = split_host_port(first, DEFAULT_PORT)?;
        Ok(Self { host, port })
    }
}

#[async_trait]
impl Probe for NatsProbe {
    fn kind(&self) -> &'static str {
        "nats"
    }

    async fn execute(&self, _ctx: &ProbeContext) -> Result<(), ProbeError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| ProbeError::failed("nats connect failed", e))?;

        let mut line = String::new();
        BufReader::new(stream)
            .read_line(&mut line)
            .await
            .map_err(|e| ProbeError::failed("nats read failed", e))?;

        if !line.starts_with("INFO") {
            return Err(ProbeError::failed("nats unexpected greeting", line.trim_end()));
        }

        Ok(())
    }
}
