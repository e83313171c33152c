//! Memcached 探针实现

use super::{split_host_port, DsnConfig, Probe, ProbeContext};
use crate::error::{ProbeBuildError, ProbeError};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const DEFAULT_PORT: u16 = 11211;

/// Memcached 探针，发送 `version` 命令并校验响应
pub struct MemcachedProbe {
    host: String,
    port: u16,
}

impl MemcachedProbe {
    /// 根据配置创建 Memcached 探针，`dsn` 形如 `host:port`
    pub fn new(config: &DsnConfig) -> Result<Self, ProbeBuildError> {
        if config.dsn.trim().is_empty() {
            return Err(ProbeBuildError::MissingField("dsn"));
        }
        let (host, port) = split_host_port(config.dsn.trim(), DEFAULT_PORT)?;
        Ok(Self { host, port })
    }
}

#[async_trait]
impl Probe for MemcachedProbe {
    fn kind(&self) -> &'static str {
        "memcached"
    }

    async fn execute(&self, _ctx: &ProbeContext) -> Result<(), ProbeError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| ProbeError::failed("memcached connect failed", e))?;
        let (reader, mut writer) = stream.into_split();

        writer
            .write_all(b"version\r\n")
            .await
            .map_err(|e| ProbeError::failed("memcached write failed", e))?;

        let mut line = String::new();
        BufReader::new(reader)
            .read_line(&mut line)
            .await
            .map_err(|e| ProbeError::failed("memcached read failed", e))?;

        if !line.starts_with("VERSION") {
            return Err(ProbeError::failed(
                "memcached unexpected response",
                line.trim_end(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn fake_server(reply: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(reply).await;
        });
        addr.to_string()
    }

    #[tokio::test]
    async fn test_memcached_version_reply() {
        let dsn = fake_server(b"VERSION 1.6.21\r\n").await;
        let probe = MemcachedProbe::new(&DsnConfig { dsn }).unwrap();
        let ctx = ProbeContext::new("cache", Duration::from_secs(2));
        assert!(probe.execute(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_memcached_unexpected_reply() {
        let dsn = fake_server(b"ERROR\r\n").await;
        let probe = MemcachedProbe::new(&DsnConfig { dsn }).unwrap();
        let ctx = ProbeContext::new("cache", Duration::from_secs(2));
        let err = probe.execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("ERROR"));
    }

    #[test]
    fn test_memcached_default_port() {
        let probe = MemcachedProbe::new(&DsnConfig {
            dsn: "cache.local".to_string(),
        })
        .unwrap();
        assert_eq!(probe.port, 11211);
    }
}
