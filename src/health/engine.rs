//! 服务检查执行引擎
//!
//! 每次调用 [`ServiceEngine::run`] 时为每个探针启动一个独立任务，
//! 每个任务受自身超时约束。超时的任务会被中止，panic 会被隔离为该探针的失败，
//! 所有结果写入与注册顺序一一对应的结果槽后再聚合为 [`ServiceReport`]。

use super::aggregator::aggregate;
use super::registration::ProbeRegistration;
use super::result::{ProbeOutcome, ServiceReport};
use crate::error::{ProbeError, RegistryError};
use crate::probe::{deadline_after, ProbeContext};
use chrono::Utc;
use futures::future::join_all;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 一个服务的检查引擎，持有该服务的全部探针注册信息
///
/// 构建后不可变，可在多个并发请求间共享。
#[derive(Debug)]
pub struct ServiceEngine {
    name: String,
    version: String,
    registrations: Vec<ProbeRegistration>,
}

impl ServiceEngine {
    /// 创建服务引擎
    ///
    /// # 参数
    /// * `name` - 服务名称
    /// * `version` - 服务版本
    /// * `registrations` - 探针注册信息，顺序即报告中的输出顺序
    ///
    /// # 返回
    /// * `Result<Self, RegistryError>` - 存在重复探针名称时返回错误
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        registrations: Vec<ProbeRegistration>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();

        let mut seen = HashSet::with_capacity(registrations.len());
        for reg in &registrations {
            if !seen.insert(reg.name.as_str()) {
                return Err(RegistryError::DuplicateProbe {
                    service: name,
                    probe: reg.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            version: version.into(),
            registrations,
        })
    }

    /// 服务名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 服务版本
    pub fn version(&self) -> &str {
        &self.version
    }

    /// 探针注册信息
    pub fn registrations(&self) -> &[ProbeRegistration] {
        &self.registrations
    }

    /// 所有探针中最长的超时，即一次检查耗时的上界
    pub fn max_timeout(&self) -> Duration {
        self.registrations
            .iter()
            .map(|reg| reg.timeout)
            .max()
            .unwrap_or_default()
    }

    /// 执行一次完整检查
    ///
    /// 所有探针并发执行，耗时上界为最长的探针超时。
    /// 返回前所有探针都已得到结果：完成、失败、panic 或超时被中止。
    pub async fn run(&self) -> ServiceReport {
        let id = Uuid::new_v4();
        let timestamp = Utc::now();
        let started = Instant::now();

        debug!(
            service = %self.name,
            check_id = %id,
            "开始执行服务检查，共 {} 个探针",
            self.registrations.len()
        );

        // 先全部启动再统一等待，保证探针之间真正并发；
        // run 被取消时句柄随之析构，尚未结束的任务一并中止
        let running: Vec<_> = self
            .registrations
            .iter()
            .map(|reg| {
                let deadline = deadline_after(reg.timeout);
                (reg, deadline, spawn_probe(reg, deadline))
            })
            .collect();

        let outcomes: Vec<ProbeOutcome> = join_all(
            running
                .into_iter()
                .map(|(reg, deadline, handle)| supervise(reg, deadline, handle)),
        )
        .await;

        let status = aggregate(&outcomes);

        info!(
            service = %self.name,
            check_id = %id,
            status = %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "服务检查完成"
        );

        ServiceReport {
            id,
            service: self.name.clone(),
            version: self.version.clone(),
            status,
            timestamp,
            outcomes,
        }
    }
}

/// 析构时中止任务的句柄
struct AbortOnDrop(JoinHandle<Result<(), ProbeError>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn spawn_probe(reg: &ProbeRegistration, deadline: Instant) -> AbortOnDrop {
    let probe = Arc::clone(&reg.probe);
    let ctx = ProbeContext {
        name: reg.name.clone(),
        deadline,
    };
    AbortOnDrop(tokio::spawn(async move { probe.execute(&ctx).await }))
}

/// 等待单个探针任务，超时则中止任务
async fn supervise(
    reg: &ProbeRegistration,
    deadline: Instant,
    mut task: AbortOnDrop,
) -> ProbeOutcome {
    let timestamp = Utc::now();
    let started = Instant::now();

    let result = match tokio::time::timeout_at(deadline, &mut task.0).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(join_error_to_probe_error(join_error)),
        Err(_) => {
            task.0.abort();
            Err(ProbeError::Timeout(reg.timeout))
        }
    };
    let duration = started.elapsed();

    let outcome = match result {
        Ok(()) => {
            debug!(probe = %reg.name, kind = reg.probe.kind(), "探针检查成功，耗时 {:?}", duration);
            ProbeOutcome::success(&reg.name, duration, reg.skip_on_error)
        }
        Err(error) => {
            warn!(
                probe = %reg.name,
                kind = reg.probe.kind(),
                skip_on_error = reg.skip_on_error,
                "探针检查失败: {}",
                error
            );
            ProbeOutcome::failure(&reg.name, duration, error, reg.skip_on_error)
        }
    };

    outcome.with_timestamp(timestamp)
}

fn join_error_to_probe_error(error: JoinError) -> ProbeError {
    if error.is_panic() {
        ProbeError::Panicked(panic_message(error.into_panic()))
    } else {
        ProbeError::Cancelled
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
