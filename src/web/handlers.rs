//! Web 路由处理函数

use super::WebAppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::debug;

/// 存活检查，只要进程能响应就返回 `OK`
pub async fn liveness() -> &'static str {
    "OK"
}

/// 对指定服务执行一次完整检查
///
/// 正常或降级返回 200，不可用返回 503，未知服务返回 404
pub async fn service_health(
    State(state): State<WebAppState>,
    Path(service): Path<String>,
) -> Response {
    let Some(engine) = state.registry.get(&service) else {
        debug!("请求了未配置的服务: {}", service);
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown service: {service}") })),
        )
            .into_response();
    };

    let report = engine.run().await;
    let code = if report.status.is_available() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(report)).into_response()
}
