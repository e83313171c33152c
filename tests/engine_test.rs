//! 执行引擎集成测试
//!
//! 使用闭包探针模拟依赖，在暂停的时钟下验证超时、并发和结果顺序

use healthpose::error::ProbeError;
use healthpose::health::{CheckState, OverallStatus, ProbeRegistration, ServiceEngine};
use healthpose::probe::{from_fn, Probe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn succeed() -> Arc<dyn Probe> {
    from_fn(|_ctx| async { Ok(()) })
}

fn fail(message: &'static str) -> Arc<dyn Probe> {
    from_fn(move |_ctx| async move { Err(ProbeError::Failed(message.to_string())) })
}

/// 析构时置位，用于观察任务是否被丢弃
struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn sleep_then_succeed(delay: Duration) -> Arc<dyn Probe> {
    from_fn(move |_ctx| async move {
        tokio::time::sleep(delay).await;
        Ok(())
    })
}

#[tokio::test]
async fn test_optional_failure_degrades_service() {
    let engine = ServiceEngine::new(
        "db",
        "1.0.0",
        vec![
            ProbeRegistration::new("ping", succeed()).with_timeout(Duration::from_secs(2)),
            ProbeRegistration::new("cache", fail("cache unreachable"))
                .with_timeout(Duration::from_secs(1))
                .skip_on_error(true),
        ],
    )
    .unwrap();

    let report = engine.run().await;

    assert_eq!(report.status, OverallStatus::Degraded);
    assert!(report.outcome("ping").unwrap().error.is_none());
    assert_eq!(
        report.outcome("cache").unwrap().error,
        Some(ProbeError::Failed("cache unreachable".to_string()))
    );
}

#[tokio::test]
async fn test_required_failure_makes_service_unavailable() {
    let engine = ServiceEngine::new(
        "db",
        "1.0.0",
        vec![
            ProbeRegistration::new("ping", fail("no route to host"))
                .with_timeout(Duration::from_secs(2)),
            ProbeRegistration::new("cache", succeed())
                .with_timeout(Duration::from_secs(1))
                .skip_on_error(true),
        ],
    )
    .unwrap();

    let report = engine.run().await;

    assert_eq!(report.status, OverallStatus::Unavailable);
    assert!(report.outcome("ping").unwrap().failed());
    assert!(!report.outcome("cache").unwrap().failed());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_recorded_and_task_aborted() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let hanging = from_fn(move |_ctx| {
        let flag = Arc::clone(&flag);
        async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }
    });

    let engine = ServiceEngine::new(
        "search",
        "2.1.0",
        vec![
            ProbeRegistration::new("index", hanging).with_timeout(Duration::from_millis(50)),
            ProbeRegistration::new("ping", succeed()),
        ],
    )
    .unwrap();

    let started = Instant::now();
    let report = engine.run().await;
    assert!(started.elapsed() < Duration::from_secs(1));

    let index = report.outcome("index").unwrap();
    assert!(index.timed_out());
    assert_eq!(index.state(), CheckState::Timeout);
    assert_eq!(
        index.error,
        Some(ProbeError::Timeout(Duration::from_millis(50)))
    );
    assert_eq!(report.status, OverallStatus::Unavailable);
    assert!(!report.outcome("ping").unwrap().failed());

    // 被放弃的任务不会再继续执行
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_optional_timeout_only_degrades() {
    let engine = ServiceEngine::new(
        "search",
        "2.1.0",
        vec![
            ProbeRegistration::new("ping", succeed()),
            ProbeRegistration::new("replica", sleep_then_succeed(Duration::from_secs(10)))
                .with_timeout(Duration::from_secs(1))
                .skip_on_error(true),
        ],
    )
    .unwrap();

    let report = engine.run().await;
    assert_eq!(report.status, OverallStatus::Degraded);
    assert!(report.outcome("replica").unwrap().timed_out());
}

#[tokio::test(start_paused = true)]
async fn test_probes_run_concurrently() {
    let engine = ServiceEngine::new(
        "api",
        "1.0.0",
        vec![
            ProbeRegistration::new("a", sleep_then_succeed(Duration::from_secs(1))),
            ProbeRegistration::new("b", sleep_then_succeed(Duration::from_secs(1))),
            ProbeRegistration::new("c", sleep_then_succeed(Duration::from_secs(1))),
        ],
    )
    .unwrap();

    let started = Instant::now();
    let report = engine.run().await;
    let elapsed = started.elapsed();

    assert_eq!(report.status, OverallStatus::Ok);
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(2), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_report_follows_registration_order() {
    // 完成顺序与注册顺序相反
    let engine = ServiceEngine::new(
        "api",
        "1.0.0",
        vec![
            ProbeRegistration::new("slow", sleep_then_succeed(Duration::from_millis(300))),
            ProbeRegistration::new("medium", sleep_then_succeed(Duration::from_millis(200))),
            ProbeRegistration::new("fast", sleep_then_succeed(Duration::from_millis(100))),
        ],
    )
    .unwrap();

    let report = engine.run().await;
    let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["slow", "medium", "fast"]);
}

#[tokio::test]
async fn test_panicking_probe_does_not_affect_siblings() {
    let panicking = from_fn(|_ctx| async {
        if true {
            panic!("driver bug");
        }
        Ok(())
    });

    let engine = ServiceEngine::new(
        "api",
        "1.0.0",
        vec![
            ProbeRegistration::new("broken", panicking).skip_on_error(true),
            ProbeRegistration::new("ping", succeed()),
        ],
    )
    .unwrap();

    let report = engine.run().await;
    assert_eq!(report.status, OverallStatus::Degraded);
    assert_eq!(
        report.outcome("broken").unwrap().error,
        Some(ProbeError::Panicked("driver bug".to_string()))
    );
    assert!(!report.outcome("ping").unwrap().failed());
}

#[tokio::test]
async fn test_every_registration_has_exactly_one_outcome() {
    let registrations: Vec<_> = (0..20)
        .map(|i| {
            let probe = if i % 3 == 0 { fail("down") } else { succeed() };
            ProbeRegistration::new(format!("probe-{i}"), probe).skip_on_error(true)
        })
        .collect();
    let engine = ServiceEngine::new("fleet", "1.0.0", registrations).unwrap();

    let report = engine.run().await;
    assert_eq!(report.outcomes.len(), 20);
    for (i, outcome) in report.outcomes.iter().enumerate() {
        assert_eq!(outcome.name, format!("probe-{i}"));
        assert_eq!(outcome.failed(), i % 3 == 0);
    }
    assert_eq!(report.status, OverallStatus::Degraded);
}

#[tokio::test]
async fn test_concurrent_runs_share_engine() {
    let engine = Arc::new(
        ServiceEngine::new(
            "api",
            "1.0.0",
            vec![ProbeRegistration::new("ping", succeed())],
        )
        .unwrap(),
    );

    let (first, second) = tokio::join!(engine.run(), engine.run());
    tokio_test::assert_ok!(first.to_json());
    assert_ne!(first.id, second.id);
    assert_eq!(first.status, second.status);
}

#[tokio::test]
async fn test_probe_context_carries_deadline() {
    let probe = from_fn(|ctx| async move {
        let remaining = ctx.remaining();
        if ctx.name == "budget" && remaining <= Duration::from_secs(5) && !remaining.is_zero() {
            Ok(())
        } else {
            Err(ProbeError::Failed(format!("unexpected context: {ctx:?}")))
        }
    });

    let engine = ServiceEngine::new(
        "api",
        "1.0.0",
        vec![ProbeRegistration::new("budget", probe).with_timeout(Duration::from_secs(5))],
    )
    .unwrap();

    assert_eq!(engine.run().await.status, OverallStatus::Ok);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_aborts_probe_tasks() {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dropped);
    let hanging = from_fn(move |_ctx| {
        let guard = SetOnDrop(Arc::clone(&flag));
        async move {
            let _guard = guard;
            std::future::pending::<()>().await;
            Ok(())
        }
    });

    let engine = ServiceEngine::new(
        "search",
        "2.1.0",
        vec![ProbeRegistration::new("index", hanging).with_timeout(Duration::from_secs(5))],
    )
    .unwrap();

    // 调用方在探针超时之前放弃本次检查
    let outer = tokio::time::timeout(Duration::from_secs(1), engine.run()).await;
    assert!(outer.is_err());

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_oversized_timeout_from_config_still_reports() {
    let engine = ServiceEngine::new(
        "search",
        "2.1.0",
        vec![
            ProbeRegistration::new("ping", succeed()).with_timeout_secs(Some(1e19)),
            ProbeRegistration::new("replica", fail("lagging"))
                .with_timeout_secs(Some(1e20))
                .skip_on_error(true),
        ],
    )
    .unwrap();

    let report = engine.run().await;
    assert_eq!(report.status, OverallStatus::Degraded);
    assert_eq!(report.outcomes.len(), 2);
    tokio_test::assert_ok!(report.to_json());
}
