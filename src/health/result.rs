//! 健康检测结果数据结构
//!
//! 定义单个探针的执行结果、服务整体状态以及对外输出的服务报告

use crate::error::ProbeError;
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// 服务整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    /// 所有探针均成功
    Ok,
    /// 只有可跳过的探针失败
    Degraded,
    /// 至少一个必需探针失败
    Unavailable,
}

impl OverallStatus {
    /// 对外输出使用的小写名称
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Ok => "ok",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Unavailable => "unavailable",
        }
    }

    /// 服务是否仍可对外提供能力（正常或降级）
    pub fn is_available(&self) -> bool {
        !matches!(self, OverallStatus::Unavailable)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个探针在输出中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Ok,
    Failed,
    Timeout,
}

/// 单个探针的执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// 探针名称
    pub name: String,
    /// 执行耗时
    pub duration: Duration,
    /// 失败原因，成功时为 None
    pub error: Option<ProbeError>,
    /// 失败时是否只降级而不判定为不可用
    pub skip_on_error: bool,
    /// 开始执行的时间
    pub timestamp: DateTime<Utc>,
}

impl ProbeOutcome {
    /// 创建成功结果
    pub fn success(name: impl Into<String>, duration: Duration, skip_on_error: bool) -> Self {
        Self {
            name: name.into(),
            duration,
            error: None,
            skip_on_error,
            timestamp: Utc::now(),
        }
    }

    /// 创建失败结果
    pub fn failure(
        name: impl Into<String>,
        duration: Duration,
        error: ProbeError,
        skip_on_error: bool,
    ) -> Self {
        Self {
            name: name.into(),
            duration,
            error: Some(error),
            skip_on_error,
            timestamp: Utc::now(),
        }
    }

    /// 设置开始时间
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 是否失败（包括超时）
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// 是否因超时失败
    pub fn timed_out(&self) -> bool {
        self.error.as_ref().is_some_and(ProbeError::is_timeout)
    }

    /// 输出用的探针状态
    pub fn state(&self) -> CheckState {
        match &self.error {
            None => CheckState::Ok,
            Some(e) if e.is_timeout() => CheckState::Timeout,
            Some(_) => CheckState::Failed,
        }
    }
}

/// 一次服务健康检查的完整报告
///
/// `outcomes` 按探针注册顺序排列，每个注册的探针恰好对应一个结果
#[derive(Debug, Clone)]
pub struct ServiceReport {
    /// 本次检查的唯一标识
    pub id: Uuid,
    /// 服务名称
    pub service: String,
    /// 服务版本
    pub version: String,
    /// 聚合后的整体状态
    pub status: OverallStatus,
    /// 检查开始时间
    pub timestamp: DateTime<Utc>,
    /// 各探针结果
    pub outcomes: Vec<ProbeOutcome>,
}

impl ServiceReport {
    /// 按名称查找探针结果
    pub fn outcome(&self, name: &str) -> Option<&ProbeOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// 失败探针的名称和错误描述，按注册顺序
    pub fn failures(&self) -> Vec<(&str, String)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| (o.name.as_str(), e.to_string())))
            .collect()
    }

    /// 序列化为格式化的JSON字符串
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ServiceReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let failures = self.failures();
        let fields = if failures.is_empty() { 5 } else { 6 };

        let mut state = serializer.serialize_struct("ServiceReport", fields)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field(
            "component",
            &Component {
                name: &self.service,
                version: &self.version,
            },
        )?;
        state.serialize_field("checks", &Checks(&self.outcomes))?;
        if failures.is_empty() {
            state.skip_field("failures")?;
        } else {
            state.serialize_field("failures", &Failures(&failures))?;
        }
        state.end()
    }
}

#[derive(Serialize)]
struct Component<'a> {
    name: &'a str,
    version: &'a str,
}

// 以 map 形式输出且保持注册顺序
struct Checks<'a>(&'a [ProbeOutcome]);

impl Serialize for Checks<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|o| (o.name.as_str(), CheckView::from(o))))
    }
}

struct Failures<'a>(&'a [(&'a str, String)]);

impl Serialize for Failures<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(name, error)| (*name, error)))
    }
}

#[derive(Serialize)]
struct CheckView<'a> {
    status: CheckState,
    #[serde(rename = "duration_ms", with = "duration_serde")]
    duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    skip_on_error: bool,
    timestamp: &'a DateTime<Utc>,
}

impl<'a> From<&'a ProbeOutcome> for CheckView<'a> {
    fn from(outcome: &'a ProbeOutcome) -> Self {
        Self {
            status: outcome.state(),
            duration: outcome.duration,
            error: outcome.error.as_ref().map(ToString::to_string),
            skip_on_error: outcome.skip_on_error,
            timestamp: &outcome.timestamp,
        }
    }
}

/// Duration 以毫秒数序列化
mod duration_serde {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }
}
