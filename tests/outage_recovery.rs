//! Outage gate behavior against a real HTTP backend.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use request_gateway::gateway::{Method, OutageEvent, NO_BODY};
use serde::Deserialize;

mod common;

#[derive(Debug, Deserialize, PartialEq)]
struct Player {
    name: String,
}

fn shown_count(events: &[OutageEvent]) -> usize {
    events.iter().filter(|e| matches!(e, OutageEvent::Shown(_))).count()
}

#[tokio::test]
async fn test_three_calls_share_one_prompt_and_replay_together() {
    let backend_addr: SocketAddr = "127.0.0.1:28481".parse().unwrap();
    let (gateway, mut events) = common::gateway_for(backend_addr);

    // Backend is down: nothing listens on the port yet.
    let calls: Vec<_> = ["alice", "bob", "carol"]
        .into_iter()
        .map(|name| {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.get::<Player>(&format!("/players/{}", name)).await })
        })
        .collect();

    common::wait_for_suspended(&gateway, 3).await;
    assert!(gateway.is_blocking());
    assert!(!gateway.session().is_connected());

    let backend = common::start_programmable_backend(backend_addr, |req| async move {
        let name = req.path.trim_start_matches("/players/").to_string();
        (200, format!(r#"{{"name":"{}"}}"#, name))
    })
    .await;

    assert_eq!(gateway.retry_outage(), 3);

    let results = tokio::time::timeout(Duration::from_secs(10), join_all(calls))
        .await
        .expect("replayed calls did not finish");
    let names: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().unwrap().name)
        .collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);

    let seen = common::drain_events(&mut events);
    assert_eq!(shown_count(&seen), 1, "exactly one outage notice: {:?}", seen);
    assert_eq!(seen.last(), Some(&OutageEvent::Dismissed));
    assert!(gateway.session().last_sync_time().is_some());
    assert!(gateway.session().is_connected());

    backend.stop().await;
}

#[tokio::test]
async fn test_server_error_blocks_until_user_retries() {
    let backend_addr: SocketAddr = "127.0.0.1:28482".parse().unwrap();

    let healthy = Arc::new(AtomicBool::new(false));
    let hits = Arc::new(AtomicU32::new(0));
    let (h, c) = (healthy.clone(), hits.clone());
    let backend = common::start_programmable_backend(backend_addr, move |req| {
        let (h, c) = (h.clone(), c.clone());
        async move {
            if req.path == "/health" {
                return if h.load(Ordering::SeqCst) {
                    (200, r#"{"status":"healthy"}"#.into())
                } else {
                    (503, r#"{"status":"maintenance"}"#.into())
                };
            }
            c.fetch_add(1, Ordering::SeqCst);
            if h.load(Ordering::SeqCst) {
                (200, r#"{"name":"dora"}"#.into())
            } else {
                (503, r#"{"detail":"Realm under maintenance"}"#.into())
            }
        }
    })
    .await;

    let (gateway, mut events) = common::gateway_for(backend_addr);
    let call = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.get::<Player>("/players/dora").await })
    };

    common::wait_for_suspended(&gateway, 1).await;
    assert_eq!(
        common::drain_events(&mut events),
        vec![OutageEvent::Shown("Realm under maintenance".into())]
    );

    // No automatic resume, however long the outage lasts.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!call.is_finished());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // The probe bypasses the gate.
    assert!(!gateway.check_health().await.unwrap());
    healthy.store(true, Ordering::SeqCst);
    assert!(gateway.check_health().await.unwrap());
    assert!(gateway.is_blocking());

    gateway.retry_outage();
    let player = call.await.unwrap().unwrap();
    assert_eq!(player, Player { name: "dora".into() });
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    backend.stop().await;
}

#[tokio::test]
async fn test_late_call_parks_without_reaching_backend() {
    let backend_addr: SocketAddr = "127.0.0.1:28483".parse().unwrap();

    let up = Arc::new(AtomicBool::new(false));
    let hits = Arc::new(AtomicU32::new(0));
    let (u, c) = (up.clone(), hits.clone());
    let backend = common::start_programmable_backend(backend_addr, move |_req| {
        let (u, c) = (u.clone(), c.clone());
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            if u.load(Ordering::SeqCst) {
                (200, r#"{"name":"late"}"#.into())
            } else {
                (502, String::new())
            }
        }
    })
    .await;

    let (gateway, mut events) = common::gateway_for(backend_addr);
    let first = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.get::<Player>("/players/first").await })
    };
    common::wait_for_suspended(&gateway, 1).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let late = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.get::<Player>("/players/late").await })
    };
    common::wait_for_suspended(&gateway, 2).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1, "late call must not reach the backend");

    up.store(true, Ordering::SeqCst);
    assert_eq!(gateway.retry_outage(), 2);
    assert_eq!(first.await.unwrap().unwrap().name, "late");
    assert_eq!(late.await.unwrap().unwrap().name, "late");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(shown_count(&common::drain_events(&mut events)), 1);

    backend.stop().await;
}

#[tokio::test]
async fn test_replay_sends_current_token() {
    let backend_addr: SocketAddr = "127.0.0.1:28484".parse().unwrap();

    let seen_tokens = Arc::new(Mutex::new(Vec::new()));
    let hits = Arc::new(AtomicU32::new(0));
    let (seen, c) = (seen_tokens.clone(), hits.clone());
    let backend = common::start_programmable_backend(backend_addr, move |req| {
        let (seen, c) = (seen.clone(), c.clone());
        async move {
            seen.lock()
                .unwrap()
                .push(req.header("authorization").map(str::to_string));
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                (500, String::new())
            } else {
                (200, r#"{"name":"eve"}"#.into())
            }
        }
    })
    .await;

    let (gateway, _events) = common::gateway_for(backend_addr);
    gateway.session().login("stale-token");

    let request = gateway
        .build_request("/players/eve", Method::Get, NO_BODY)
        .unwrap();
    let call = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.execute::<Player>(&request).await })
    };
    common::wait_for_suspended(&gateway, 1).await;

    gateway.session().login("fresh-token");
    gateway.retry_outage();
    assert_eq!(call.await.unwrap().unwrap().name, "eve");

    let tokens = seen_tokens.lock().unwrap().clone();
    assert_eq!(
        tokens,
        vec![
            Some("Bearer stale-token".to_string()),
            Some("Bearer fresh-token".to_string()),
        ]
    );

    backend.stop().await;
}

#[tokio::test]
async fn test_dropped_connection_retries_without_notice() {
    let backend_addr: SocketAddr = "127.0.0.1:28485".parse().unwrap();

    let hits = Arc::new(AtomicU32::new(0));
    let c = hits.clone();
    let backend = common::start_programmable_backend(backend_addr, move |_req| {
        let c = c.clone();
        async move {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                (common::DROP_CONNECTION, String::new())
            } else {
                (200, r#"{"name":"frank"}"#.into())
            }
        }
    })
    .await;

    let (gateway, mut events) = common::gateway_for(backend_addr);
    let player = tokio::time::timeout(Duration::from_secs(5), gateway.get::<Player>("/players/frank"))
        .await
        .expect("silent retry did not finish")
        .unwrap();

    assert_eq!(player.name, "frank");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(!gateway.is_blocking());
    assert!(common::drain_events(&mut events).is_empty());

    backend.stop().await;
}
