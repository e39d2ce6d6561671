//! Tests for the run/reload loop

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gde_config::AgentConfig;

use super::Lifecycle;
use crate::agent::Agent;
use crate::control::ControlHandle;
use crate::error::AgentError;
use crate::plan::{Plan, RunningInput, RunningOutput};
use crate::testing::{RecordingOutput, ScriptedInput, dashboard};

fn agent() -> Agent {
    Agent::new(Plan {
        agent: AgentConfig {
            round_interval: false,
            shutdown_timeout: Duration::from_secs(1),
            ..Default::default()
        },
        inputs: vec![RunningInput::new(
            "mock",
            Arc::new(ScriptedInput::emitting(vec![dashboard("A")])),
        )],
        outputs: vec![RunningOutput::new("out", Box::new(RecordingOutput::default()))],
    })
}

/// Run `action` on the control handle shortly after the current cycle starts
fn after_start(control: &ControlHandle, action: fn(&ControlHandle)) {
    let control = control.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        action(&control);
    });
}

#[tokio::test]
async fn test_reload_starts_a_new_cycle() {
    let lifecycle = Lifecycle::new(ControlHandle::new());
    let control = lifecycle.control().clone();
    let starts = Arc::new(AtomicUsize::new(0));

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        lifecycle.run(|| {
            let n = starts.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                after_start(&control, |c| {
                    c.request_reload();
                });
            } else {
                after_start(&control, ControlHandle::request_shutdown);
            }
            async { Ok(agent()) }
        }),
    )
    .await
    .expect("lifecycle should end after shutdown");

    let snapshot = result.unwrap();
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_eq!(snapshot.items_accepted, 1);
}

#[tokio::test]
async fn test_repeated_reload_requests_coalesce() {
    let lifecycle = Lifecycle::new(ControlHandle::new());
    let control = lifecycle.control().clone();
    let starts = Arc::new(AtomicUsize::new(0));

    tokio::time::timeout(
        Duration::from_secs(2),
        lifecycle.run(|| {
            let n = starts.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                after_start(&control, |c| {
                    assert!(c.request_reload());
                    assert!(!c.request_reload());
                });
            } else {
                after_start(&control, ControlHandle::request_shutdown);
            }
            async { Ok(agent()) }
        }),
    )
    .await
    .expect("lifecycle should end after shutdown")
    .unwrap();

    assert_eq!(starts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_shutdown_before_start() {
    let control = ControlHandle::new();
    control.request_shutdown();
    let lifecycle = Lifecycle::new(control);
    let starts = AtomicUsize::new(0);

    lifecycle
        .run(|| {
            starts.fetch_add(1, Ordering::SeqCst);
            async { Ok(agent()) }
        })
        .await
        .unwrap();

    assert_eq!(starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_error_ends_loop() {
    let lifecycle = Lifecycle::new(ControlHandle::new());

    let err = lifecycle
        .run(|| async { Err(AgentError::NoInputs) })
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::NoInputs));
}
