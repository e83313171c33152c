//! 状态聚合
//!
//! 根据各探针结果及其可跳过标记计算服务整体状态。
//! 超时与其他失败一视同仁。

use super::result::{OverallStatus, ProbeOutcome};

/// 聚合探针结果
///
/// * 任一必需探针失败 => `Unavailable`
/// * 仅有可跳过探针失败 => `Degraded`
/// * 否则（包括没有任何探针）=> `Ok`
pub fn aggregate<'a, I>(outcomes: I) -> OverallStatus
where
    I: IntoIterator<Item = &'a ProbeOutcome>,
{
    let mut status = OverallStatus::Ok;
    for outcome in outcomes {
        if !outcome.failed() {
            continue;
        }
        if !outcome.skip_on_error {
            return OverallStatus::Unavailable;
        }
        status = OverallStatus::Degraded;
    }
    status
}
