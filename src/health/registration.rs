//! 探针注册信息

use crate::probe::{seconds_to_duration, Probe};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// 未配置或配置为非正数时使用的探针超时
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// 一个已注册到服务上的探针
#[derive(Clone)]
pub struct ProbeRegistration {
    /// 探针名称，在同一服务内唯一
    pub name: String,
    /// 该探针的执行超时
    pub timeout: Duration,
    /// 失败时是否只降级
    pub skip_on_error: bool,
    /// 探针实现
    pub probe: Arc<dyn Probe>,
}

impl ProbeRegistration {
    /// 创建注册信息，超时为默认的60秒
    ///
    /// # 参数
    /// * `name` - 探针名称
    /// * `probe` - 探针实现
    pub fn new(name: impl Into<String>, probe: Arc<dyn Probe>) -> Self {
        Self {
            name: name.into(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            skip_on_error: false,
            probe,
        }
    }

    /// 设置超时，零值回落到默认超时
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            DEFAULT_PROBE_TIMEOUT
        } else {
            timeout
        };
        self
    }

    /// 以秒为单位设置超时，缺失、非正数或非法值回落到默认超时
    pub fn with_timeout_secs(mut self, seconds: Option<f64>) -> Self {
        self.timeout = seconds_to_duration(seconds).unwrap_or(DEFAULT_PROBE_TIMEOUT);
        self
    }

    /// 设置失败时是否只降级
    pub fn skip_on_error(mut self, skip: bool) -> Self {
        self.skip_on_error = skip;
        self
    }
}

impl fmt::Debug for ProbeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistration")
            .field("name", &self.name)
            .field("kind", &self.probe.kind())
            .field("timeout", &self.timeout)
            .field("skip_on_error", &self.skip_on_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::from_fn;

    fn noop() -> Arc<dyn Probe> {
        from_fn(|_ctx| async { Ok(()) })
    }

    #[test]
    fn test_default_timeout() {
        let reg = ProbeRegistration::new("db", noop());
        assert_eq!(reg.timeout, DEFAULT_PROBE_TIMEOUT);
        assert!(!reg.skip_on_error);
    }

    #[test]
    fn test_non_positive_timeout_falls_back() {
        assert_eq!(
            ProbeRegistration::new("db", noop())
                .with_timeout_secs(Some(0.0))
                .timeout,
            DEFAULT_PROBE_TIMEOUT
        );
        assert_eq!(
            ProbeRegistration::new("db", noop())
                .with_timeout_secs(Some(-3.0))
                .timeout,
            DEFAULT_PROBE_TIMEOUT
        );
        assert_eq!(
            ProbeRegistration::new("db", noop())
                .with_timeout(Duration::ZERO)
                .timeout,
            DEFAULT_PROBE_TIMEOUT
        );
        assert_eq!(
            ProbeRegistration::new("db", noop())
                .with_timeout_secs(Some(1.5))
                .timeout,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_debug_shows_kind() {
        let reg = ProbeRegistration::new("db", noop()).skip_on_error(true);
        let text = format!("{reg:?}");
        assert!(text.contains("custom"));
        assert!(text.contains("skip_on_error: true"));
    }
}
