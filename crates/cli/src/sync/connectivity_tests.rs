// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[tokio::test]
async fn test_subscriber_sees_initial_state() {
    let handle = ConnectivityHandle::new(false);
    let rx = handle.subscribe();
    assert!(!*rx.borrow());
    assert!(!handle.is_online());
}

#[tokio::test]
async fn test_subscriber_is_woken_on_change() {
    let handle = ConnectivityHandle::new(false);
    let mut rx = handle.subscribe();

    handle.set_online(true);

    rx.changed().await.unwrap();
    assert!(*rx.borrow_and_update());
    assert!(handle.is_online());
}

#[tokio::test]
async fn test_repeated_state_does_not_wake() {
    let handle = ConnectivityHandle::new(true);
    let mut rx = handle.subscribe();

    handle.set_online(true);

    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_clones_share_state() {
    let handle = ConnectivityHandle::new(false);
    let other = handle.clone();

    other.set_online(true);
    assert!(handle.is_online());
}

#[tokio::test]
async fn test_dropping_receiver_unsubscribes() {
    let handle = ConnectivityHandle::new(false);
    let rx = handle.subscribe();
    drop(rx);

    // Publishing with no subscribers is fine
    handle.set_online(true);
    assert!(handle.is_online());
}

#[tokio::test]
async fn test_probe_reports_offline_for_closed_port() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpProbe::new(format!("http://{}/health", addr), Duration::from_secs(1), Duration::from_secs(1))
        .unwrap();
    assert!(!probe.probe().await);
}

#[tokio::test]
async fn test_probe_task_publishes_result() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handle = ConnectivityHandle::new(true);
    let mut rx = handle.subscribe();
    let probe = HttpProbe::new(format!("http://{}/health", addr), Duration::from_millis(10), Duration::from_secs(1))
        .unwrap();
    let task = probe.spawn(handle.clone());

    rx.changed().await.unwrap();
    assert!(!*rx.borrow());

    task.abort();
}

#[tokio::test]
async fn test_zero_interval_is_clamped() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpProbe::new(format!("http://{}/health", addr), Duration::ZERO, Duration::from_secs(1)).unwrap();
    assert!(probe.interval() > Duration::ZERO);

    let handle = ConnectivityHandle::new(true);
    let mut rx = handle.subscribe();
    let task = probe.spawn(handle.clone());

    rx.changed().await.unwrap();
    assert!(!*rx.borrow());
    assert!(!task.is_finished());
    task.abort();
}
