//! HTTP 路由集成测试

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use healthpose::config::{ConfigLoader, TomlConfigLoader};
use healthpose::error::ProbeError;
use healthpose::health::{ProbeRegistration, Registry, ServiceEngine};
use healthpose::probe::from_fn;
use healthpose::web::{build_router, WebServer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

fn registry() -> Arc<Registry> {
    let healthy = ServiceEngine::new(
        "orders",
        "1.4.2",
        vec![
            ProbeRegistration::new("db", from_fn(|_ctx| async { Ok(()) })),
            ProbeRegistration::new(
                "cache",
                from_fn(|_ctx| async { Err(ProbeError::Failed("cache down".to_string())) }),
            )
            .skip_on_error(true),
        ],
    )
    .unwrap();

    let broken = ServiceEngine::new(
        "billing",
        "0.9.0",
        vec![ProbeRegistration::new(
            "ledger",
            from_fn(|_ctx| async { Err(ProbeError::Failed("connection refused".to_string())) }),
        )],
    )
    .unwrap();

    let mut services = BTreeMap::new();
    services.insert("orders".to_string(), healthy);
    services.insert("billing".to_string(), broken);
    Arc::new(Registry::new(services).unwrap())
}

async fn get(uri: &str) -> (StatusCode, Vec<u8>) {
    let response = build_router(registry())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let (status, body) = get("/healthcheck").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_degraded_service_returns_200() {
    let (status, body) = get("/v1/health/orders").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["component"]["name"], "orders");
    assert_eq!(json["component"]["version"], "1.4.2");
    assert_eq!(json["checks"]["db"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "failed");
    assert_eq!(json["failures"]["cache"], "cache down");
}

#[tokio::test]
async fn test_unavailable_service_returns_503() {
    let (status, body) = get("/v1/health/billing").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "unavailable");
    assert_eq!(json["failures"]["ledger"], "connection refused");
}

#[tokio::test]
async fn test_unknown_service_returns_404() {
    let (status, _) = get("/v1/health/inventory").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_router_from_config() {
    let loader = TomlConfigLoader::new(false);
    let config = loader
        .load_from_string(
            r#"
[services.edge]
name = "edge"
version = "3.0"

[[services.edge.checks]]
name = "origin"
timeout = 1
optional = true
[services.edge.checks.http]
url = "http://127.0.0.1:1/health"
"#,
        )
        .await
        .unwrap();

    let registry = Arc::new(Registry::from_config(&config).unwrap());
    let response = build_router(registry)
        .oneshot(
            Request::builder()
                .uri("/v1/health/edge")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // 唯一的探针是可跳过的，连接失败只会降级
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "degraded");
}

#[tokio::test]
async fn test_server_graceful_shutdown() {
    // 先占用一个空闲端口再释放，交给服务器绑定
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap();
    drop(probe);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(WebServer::new(addr, registry()).run(async move {
        let _ = rx.await;
    }));

    let mut stream = None;
    for _ in 0..50 {
        match tokio::net::TcpStream::connect(addr).await {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(_) => tokio::time::sleep(std::time::Duration::from_millis(20)).await,
        }
    }
    let mut stream = stream.expect("server did not start");
    stream
        .write_all(b"GET /healthcheck HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("OK"));

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
