// ABOUTME: Integration tests for the boot orchestrator state machine
// ABOUTME: Validates deadline bounds, failsafe ordering, timer cancellation, and retry reset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Stride Labs
#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stride_boot::{BootConfig, BootFaults, BootOrchestrator, BootState};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEADLINE: Duration = Duration::from_millis(200);
const FAILSAFE: Duration = Duration::from_millis(600);

fn test_config(dir: &tempfile::TempDir, base_url: Option<Url>) -> BootConfig {
    BootConfig {
        api_base_url: base_url,
        probe_timeout: Duration::from_millis(3_000),
        deadline: DEADLINE,
        failsafe: FAILSAFE,
        health_retry_backoff: Duration::from_millis(50),
        session_path: dir.path().join("session.json"),
    }
}

async fn wait_for_state(
    rx: &mut tokio::sync::watch::Receiver<BootState>,
    wanted: BootState,
) {
    tokio::time::timeout(Duration::from_secs(3), async {
        while *rx.borrow() != wanted {
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap_or_else(|_| panic!("state never reached {wanted}"));
}

#[tokio::test]
async fn deadline_releases_shell_with_no_backend_configured() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BootOrchestrator::new(test_config(&dir, None)).unwrap();
    let mut state = orchestrator.subscribe();

    let start = Instant::now();
    orchestrator.start();

    // The deadline, not probe completion, decides when to release: the
    // vacuous probes settle almost immediately, yet the state holds
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(orchestrator.state(), BootState::Booting);

    wait_for_state(&mut state, BootState::Ready).await;
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(180), "released early: {elapsed:?}");

    // Vacuous outcomes were still recorded for telemetry: with no backend
    // configured, both probes short-circuit to healthy
    let status = orchestrator.background_status();
    assert!(status.health_checked && status.health_ok);
    assert!(status.token_restored && status.token_valid);

    // The canceled failsafe must not fire into the resolved state
    tokio::time::sleep(FAILSAFE + Duration::from_millis(100)).await;
    assert_eq!(orchestrator.state(), BootState::Ready);
}

#[tokio::test]
async fn happy_path_releases_on_deadline_with_all_checks_green() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let base = Url::parse(&server.uri()).unwrap();
    let config = test_config(&dir, Some(base));
    std::fs::write(
        &config.session_path,
        br#"{"token":"stored-session","is_guest":false}"#,
    )
    .unwrap();

    let orchestrator = BootOrchestrator::new(config).unwrap();
    let mut state = orchestrator.subscribe();

    let start = Instant::now();
    orchestrator.start();
    wait_for_state(&mut state, BootState::Ready).await;

    // Both probes settled long before the deadline, yet release waited
    // for the deadline, not for them
    assert!(start.elapsed() >= Duration::from_millis(180));
    let status = orchestrator.background_status();
    assert!(status.health_checked && status.health_ok);
    assert!(status.token_restored && status.token_valid);
}

#[tokio::test]
async fn ready_signal_fires_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    let orchestrator = BootOrchestrator::with_ready_signal(
        test_config(&dir, None),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .unwrap();
    let mut state = orchestrator.subscribe();

    orchestrator.start();
    wait_for_state(&mut state, BootState::Ready).await;

    tokio::time::sleep(FAILSAFE + Duration::from_millis(100)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deadline_wins_while_probes_still_hang() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let base = Url::parse(&server.uri()).unwrap();
    let orchestrator = BootOrchestrator::new(test_config(&dir, Some(base))).unwrap();
    let mut state = orchestrator.subscribe();

    let start = Instant::now();
    orchestrator.start();
    wait_for_state(&mut state, BootState::Ready).await;

    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_millis(500),
        "deadline did not bound time-to-interactive: {elapsed:?}"
    );
    assert!(
        !orchestrator.background_status().settled(),
        "probes were still outstanding at handoff by design"
    );
}

#[tokio::test]
async fn unreachable_backend_reaches_ready_and_records_failure() {
    // Connection refused: both probes fail fast, health earns its retry
    let dead = Url::parse("http://127.0.0.1:1/").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BootOrchestrator::new(test_config(&dir, Some(dead))).unwrap();
    let mut state = orchestrator.subscribe();
    let mut background = orchestrator.subscribe_background();

    orchestrator.start();
    wait_for_state(&mut state, BootState::Ready).await;

    // The runner keeps settling after release so telemetry is complete
    tokio::time::timeout(Duration::from_secs(3), async {
        while !background.borrow().health_checked {
            background.changed().await.unwrap();
        }
    })
    .await
    .expect("health check should settle after its single retry");

    let status = orchestrator.background_status();
    assert!(!status.health_ok);
    assert!(!status.token_valid);
    assert_eq!(orchestrator.state(), BootState::Ready);
}

#[tokio::test]
async fn failsafe_fires_when_deadline_callback_is_lost() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let base = Url::parse(&server.uri()).unwrap();
    let orchestrator = BootOrchestrator::new(test_config(&dir, Some(base))).unwrap();
    let mut state = orchestrator.subscribe();

    let start = Instant::now();
    orchestrator.start_with_faults(BootFaults {
        drop_deadline: true,
    });

    wait_for_state(&mut state, BootState::Recovery).await;
    let elapsed = start.elapsed();
    assert!(
        elapsed >= FAILSAFE - Duration::from_millis(20),
        "failsafe fired before its duration: {elapsed:?}"
    );
    assert_eq!(orchestrator.attempt(), 1);

    // User-initiated retry re-enters booting with a fresh record and a
    // working deadline timer
    let recovery = orchestrator.recovery();
    assert!(recovery.retry());
    assert_eq!(orchestrator.state(), BootState::Booting);
    assert_eq!(orchestrator.attempt(), 2);
    assert!(
        !orchestrator.background_status().health_checked,
        "retry must start from an all-false status record"
    );

    wait_for_state(&mut state, BootState::Ready).await;
    assert_eq!(orchestrator.attempt(), 2);
}

#[tokio::test]
async fn second_start_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = BootOrchestrator::new(test_config(&dir, None)).unwrap();
    let mut state = orchestrator.subscribe();

    orchestrator.start();
    orchestrator.start();
    assert_eq!(orchestrator.attempt(), 1);

    wait_for_state(&mut state, BootState::Ready).await;
    assert_eq!(orchestrator.attempt(), 1);
}

#[tokio::test]
async fn config_rejects_failsafe_not_above_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir, None);
    config.failsafe = config.deadline;

    assert!(BootOrchestrator::new(config).is_err());
}
