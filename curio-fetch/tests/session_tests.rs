//! Tests for session.rs: the search session lifecycle every fetcher shares.

use curio_fetch::{FetchEvent, FetcherCore, MessageLevel};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn core() -> (FetcherCore, UnboundedReceiver<FetchEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FetcherCore::new("Test Source", tx), rx)
}

async fn next_event(rx: &mut UnboundedReceiver<FetchEvent>) -> FetchEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("channel closed")
}

fn is_done(event: &FetchEvent) -> bool {
    matches!(event, FetchEvent::Done { .. })
}

// ── stop ────────────────────────────────────────────────────────

#[test]
fn stop_before_start_emits_nothing() {
    let (core, mut rx) = core();
    core.stop();
    core.stop();
    assert!(rx.try_recv().is_err());
    assert!(!core.is_searching());
}

#[tokio::test]
async fn search_then_stop_emits_one_done() {
    let (core, mut rx) = core();
    core.start(|_session| std::future::pending::<()>());
    assert!(core.is_searching());

    core.stop();
    core.stop();

    let event = next_event(&mut rx).await;
    assert_eq!(event, FetchEvent::Done { fetcher: core.id() });
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
    assert!(!core.is_searching());
}

#[tokio::test]
async fn stop_after_completion_does_not_repeat_done() {
    let (core, mut rx) = core();
    core.start(|_session| async {});

    assert!(is_done(&next_event(&mut rx).await));
    core.stop();
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

// ── start ───────────────────────────────────────────────────────

#[tokio::test]
async fn completed_body_finishes_the_session() {
    let (core, mut rx) = core();
    core.start(|session| async move {
        let result = session.make_result("Dune", "Frank Herbert", "");
        session.result(result);
        session.message(MessageLevel::Status, "one found");
    });

    match next_event(&mut rx).await {
        FetchEvent::ResultFound(result) => {
            assert_eq!(result.title, "Dune");
            assert_eq!(result.fetcher, core.id());
        }
        other => panic!("expected a result, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut rx).await,
        FetchEvent::Message { level: MessageLevel::Status, .. }
    ));
    assert!(is_done(&next_event(&mut rx).await));
    assert!(!core.is_searching());
}

#[tokio::test]
async fn starting_again_stops_the_running_session() {
    let (core, mut rx) = core();
    core.start(|_session| std::future::pending::<()>());
    core.start(|session| async move {
        let result = session.make_result("Second", "", "");
        session.result(result);
    });

    assert!(is_done(&next_event(&mut rx).await));
    assert!(matches!(next_event(&mut rx).await, FetchEvent::ResultFound(_)));
    assert!(is_done(&next_event(&mut rx).await));
}

#[tokio::test]
async fn events_after_finish_are_dropped() {
    let (core, mut rx) = core();
    core.start(|session| async move {
        session.finish();
        let result = session.make_result("Late", "", "");
        session.result(result);
        session.message(MessageLevel::Error, "too late");
    });

    assert!(is_done(&next_event(&mut rx).await));
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[test]
fn start_outside_a_runtime_finishes_immediately() {
    let (core, mut rx) = core();
    core.start(|_session| async {});
    assert!(matches!(rx.try_recv(), Ok(FetchEvent::Done { .. })));
    assert!(!core.is_searching());
}

// ── uids ────────────────────────────────────────────────────────

#[tokio::test]
async fn uids_keep_increasing_across_sessions() {
    let (core, mut rx) = core();
    let mut uids = Vec::new();
    for _ in 0..2 {
        core.start(|session| async move {
            for title in ["A", "B"] {
                let result = session.make_result(title, "", "");
                session.result(result);
            }
        });
        loop {
            match next_event(&mut rx).await {
                FetchEvent::ResultFound(result) => uids.push(result.uid),
                FetchEvent::Done { .. } => break,
                FetchEvent::Message { .. } => {}
            }
        }
    }
    assert_eq!(uids.len(), 4);
    assert!(uids.windows(2).all(|pair| pair[0] < pair[1]));
}
