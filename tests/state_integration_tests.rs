//! Integration tests for the shell Lifecycle and its cancel token
//!
//! These tests verify that the Lifecycle:
//! - Reaches Terminating from every trigger
//! - Wakes tasks waiting on the cancel token
//! - Treats repeated and concurrent triggers as a single shutdown

use rigpanel::{Lifecycle, ShellState, ShutdownTrigger};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn test_cancel_token_wakes_waiter() {
    let lifecycle = Arc::new(Lifecycle::new());
    let mut token = lifecycle.cancel_token();

    let waiter = tokio::spawn(async move {
        token.changed().await.expect("Lifecycle dropped");
        *token.borrow()
    });

    lifecycle.request_shutdown(ShutdownTrigger::Interrupt);

    let cancelled = timeout(Duration::from_millis(500), waiter)
        .await
        .expect("Timeout waiting for cancel")
        .expect("Waiter panicked");
    assert!(cancelled);
}

#[tokio::test]
async fn test_interrupt_from_background_task() {
    let lifecycle = Arc::new(Lifecycle::new());
    let token = lifecycle.cancel_token();

    let lifecycle_clone = Arc::clone(&lifecycle);
    let first = tokio::spawn(async move { lifecycle_clone.request_shutdown(ShutdownTrigger::Interrupt) })
        .await
        .unwrap();

    assert!(first);
    assert_eq!(lifecycle.state(), ShellState::Terminating);
    assert!(*token.borrow());

    // Closing the window during teardown does nothing further
    assert!(!lifecycle.request_shutdown(ShutdownTrigger::WindowClose));
}

#[tokio::test]
async fn test_all_triggers_reach_same_state() {
    for trigger in [
        ShutdownTrigger::WindowClose,
        ShutdownTrigger::KeyboardShortcut,
        ShutdownTrigger::Interrupt,
    ] {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.is_running());

        assert!(lifecycle.request_shutdown(trigger));
        assert!(!lifecycle.is_running());
        assert_eq!(lifecycle.state(), ShellState::Terminating);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_triggers_single_transition() {
    let lifecycle = Arc::new(Lifecycle::new());
    let triggers = [
        ShutdownTrigger::WindowClose,
        ShutdownTrigger::KeyboardShortcut,
        ShutdownTrigger::Interrupt,
    ];

    let mut handles = Vec::new();
    for i in 0..30 {
        let lifecycle = Arc::clone(&lifecycle);
        let trigger = triggers[i % triggers.len()];
        handles.push(tokio::spawn(async move { lifecycle.request_shutdown(trigger) }));
    }

    let mut transitions = 0;
    for handle in handles {
        if handle.await.unwrap() {
            transitions += 1;
        }
    }

    assert_eq!(transitions, 1);
    assert_eq!(lifecycle.state(), ShellState::Terminating);
}

#[test]
fn test_trigger_display() {
    assert_eq!(ShutdownTrigger::KeyboardShortcut.to_string(), "Ctrl+Q");
    assert_eq!(ShutdownTrigger::Interrupt.to_string(), "interrupt signal");
    assert_eq!(ShutdownTrigger::WindowClose.to_string(), "window close");
}
