//! Redis 探针实现

use super::{DsnConfig, Probe, ProbeContext};
use crate::error::{ProbeBuildError, ProbeError};
use async_trait::async_trait;

/// Redis 探针，发送 `PING` 并校验 `PONG`
pub struct RedisProbe {
    client: ::redis::Client,
}

impl RedisProbe {
    /// 根据配置创建 Redis 探针，`dsn` 形如 `redis://host:port/db`
    pub fn new(config: &DsnConfig) -> Result<Self, ProbeBuildError> {
        let dsn = config.dsn.trim();
        if dsn.is_empty() {
            return Err(ProbeBuildError::MissingField("dsn"));
        }

        let client = ::redis::Client::open(dsn).map_err(|e| ProbeBuildError::InvalidAddress {
            address: dsn.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for RedisProbe {
    fn kind(&self) -> &'static str {
        "redis"
    }

    async fn execute(&self, _ctx: &ProbeContext) -> Result<(), ProbeError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ProbeError::failed("redis connect failed", e))?;

        let pong: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ProbeError::failed("redis ping failed", e))?;

        if pong != "PONG" {
            return Err(ProbeError::failed("redis ping failed", format!("unexpected reply {pong}")));
        }

        Ok(())
    }
}
