//! Broadcast delivery tests.

use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use service_orchestrator::broadcast::{event_data, ClientRegistry, EventType, EventValue};

mod common;

#[tokio::test]
async fn test_broadcast_without_clients_is_noop() {
    let registry = ClientRegistry::default();
    let report = registry
        .broadcast(EventType::NewEvent, &event_data([("k", 1)]))
        .await;
    assert_eq!(report.delivered, 0);
    assert!(report.pruned.is_empty());
}

#[tokio::test]
async fn test_nested_timestamps_are_canonical_on_the_wire() {
    let registry = ClientRegistry::default();
    let (_, mut rx) = common::channel_client(&registry);

    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let data = event_data([
        ("k", EventValue::from(1)),
        (
            "inner",
            EventValue::from(event_data([
                ("at", EventValue::from(at)),
                ("history", EventValue::from(vec![at, at])),
            ])),
        ),
    ]);
    let report = registry.broadcast(EventType::NewEvent, &data).await;
    assert_eq!(report.delivered, 1);

    let wire: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(wire["event_type"], "new_event");
    assert_eq!(wire["data"]["k"], 1);
    assert_eq!(wire["data"]["inner"]["at"], "2024-03-01T12:30:00+00:00");
    assert_eq!(wire["data"]["inner"]["history"][1], "2024-03-01T12:30:00+00:00");
    assert!(wire["timestamp"].as_str().unwrap().ends_with("+00:00"));
}

#[tokio::test]
async fn test_failing_client_is_pruned_others_receive() {
    let registry = ClientRegistry::default();
    let (d, mut rx_d) = common::channel_client(&registry);
    let c = registry.add_client(Arc::new(common::BrokenClient));
    let (e, mut rx_e) = common::channel_client(&registry);

    let report = registry
        .broadcast(EventType::Heartbeat, &event_data([("beat", 1)]))
        .await;

    assert_eq!(report.delivered, 2);
    assert_eq!(report.pruned, vec![c]);
    assert!(!registry.contains(&c));
    assert!(registry.contains(&d));
    assert!(registry.contains(&e));
    assert!(rx_d.recv().await.is_some());
    assert!(rx_e.recv().await.is_some());

    let second = registry
        .broadcast(EventType::Heartbeat, &event_data([("beat", 2)]))
        .await;
    assert_eq!(second.delivered, 2);
    assert!(second.pruned.is_empty());
}

#[tokio::test]
async fn test_disconnected_channel_client_is_pruned() {
    let registry = ClientRegistry::default();
    let (gone, rx) = common::channel_client(&registry);
    drop(rx);

    let report = registry
        .broadcast(EventType::NewEvent, &event_data([("k", "v")]))
        .await;
    assert_eq!(report.pruned, vec![gone]);
    assert_eq!(registry.count(), 0);
}

#[tokio::test]
async fn test_membership_changes_during_broadcast_stay_consistent() {
    let registry = Arc::new(ClientRegistry::new(Some(Duration::from_secs(5))));
    let received = Arc::new(Mutex::new(Vec::new()));
    let slow = registry.add_client(Arc::new(common::SlowClient {
        delay: Duration::from_millis(200),
        received: Arc::clone(&received),
    }));
    let (leaving, _rx_leaving) = common::channel_client(&registry);
    let broken = registry.add_client(Arc::new(common::BrokenClient));

    let churn = {
        let registry = Arc::clone(&registry);
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let mut joined = Vec::new();
            for _ in 0..10 {
                joined.push(common::channel_client(&registry));
            }
            assert!(registry.remove_client(&leaving));
            joined
        }
    };

    let data = event_data([("k", "v")]);
    let (report, joined) = tokio::join!(
        registry.broadcast(EventType::NewEvent, &data),
        churn
    );

    // The in-flight broadcast covers exactly its snapshot: slow, leaving, broken.
    assert_eq!(report.delivered, 2);
    assert_eq!(report.pruned, vec![broken]);
    assert_eq!(received.lock().unwrap().len(), 1);

    assert!(registry.contains(&slow));
    assert!(!registry.contains(&leaving));
    assert!(!registry.contains(&broken));
    assert_eq!(registry.count(), 11);
    for (id, _) in &joined {
        assert!(registry.contains(id));
    }

    let next = registry
        .broadcast(EventType::NewEvent, &event_data([("k", "again")]))
        .await;
    assert_eq!(next.delivered, 11);
    assert!(next.pruned.is_empty());
}
