//! HTTP and WebSocket shell tests.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tower::ServiceExt;

use service_orchestrator::broadcast::{event_data, ClientRegistry, EventType};
use service_orchestrator::config::{LifecycleConfig, OrchestratorConfig};
use service_orchestrator::http::{build_router, AppState, HttpServer};
use service_orchestrator::lifecycle::{Orchestrator, Shutdown};
use service_orchestrator::services::DemoService;

mod common;
use common::{CallLog, FakeService};

struct Harness {
    config: OrchestratorConfig,
    orchestrator: Arc<Orchestrator>,
    state: AppState,
}

async fn harness() -> Harness {
    let mut config = OrchestratorConfig::default();
    config.auth.api_token = "test-token".to_string();

    let clients = Arc::new(ClientRegistry::from_config(&config.broadcast));
    let orchestrator = Arc::new(Orchestrator::new(LifecycleConfig::unbounded(), Arc::clone(&clients)));

    let log = CallLog::default();
    let demo = Arc::new(DemoService::new(Arc::clone(&clients)));
    orchestrator.register_shared(demo.clone(), vec![]).unwrap();
    orchestrator.register_service(FakeService::new("good", &log), &[]).unwrap();
    orchestrator
        .register_service(FakeService::new("flaky", &log).failing_status(), &[])
        .unwrap();
    orchestrator.start_all().await.unwrap();

    let state = AppState::new(&config, Arc::clone(&orchestrator), demo);
    Harness {
        config,
        orchestrator,
        state,
    }
}

fn router(h: &Harness) -> Router {
    build_router(&h.config, h.state.clone())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_reports_online() {
    let h = harness().await;
    let response = router(&h)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "online");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_lists_every_service_with_inline_errors() {
    let h = harness().await;

    for method in [Method::GET, Method::POST] {
        let response = router(&h)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["service"], "ok");
        let services = &body["services"]["services"];
        assert_eq!(services["good"]["status"], "online");
        assert_eq!(services["demoservice"]["status"], "online");
        assert_eq!(services["flaky"]["status"], "error");
        assert_eq!(services["flaky"]["error"], "status unavailable");
        assert!(body["services"]["uptime"].as_f64().unwrap() >= 0.0);
    }
}

fn demo_request(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/v1/demo/demo").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(json!({ "demo": "ping" }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_demo_requires_bearer_token() {
    let h = harness().await;

    let missing = router(&h).oneshot(demo_request(None)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = router(&h).oneshot(demo_request(Some("nope"))).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = router(&h).oneshot(demo_request(Some("test-token"))).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = json_body(ok).await;
    assert_eq!(body["demo"], "ping");
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let h = harness().await;

    for header_value in ["bearer test-token", "BEARER test-token"] {
        let request = Request::post("/api/v1/demo/demo")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, header_value)
            .body(Body::from(json!({ "demo": "ping" }).to_string()))
            .unwrap();
        let response = router(&h).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{header_value}");
    }

    let wrong_scheme = Request::post("/api/v1/demo/demo")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Basic test-token")
        .body(Body::from(json!({ "demo": "ping" }).to_string()))
        .unwrap();
    let response = router(&h).oneshot(wrong_scheme).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_demo_after_stop_is_unavailable() {
    let h = harness().await;
    h.orchestrator.stop_all().await;

    let response = router(&h).oneshot(demo_request(Some("test-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_websocket_echo_and_broadcast() {
    let h = harness().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&h.config, h.state.clone());
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    socket.send(Message::Text("hi".into())).await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reply.into_text().unwrap().as_str(), "Message received: hi");
    assert_eq!(h.orchestrator.clients().count(), 1);

    let report = h
        .orchestrator
        .broadcast(EventType::NewEvent, &event_data([("k", 1)]))
        .await;
    assert_eq!(report.delivered, 1);

    // Lifecycle notifications from the harness may still be in flight.
    let event = loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let event: Value = serde_json::from_str(frame.into_text().unwrap().as_str()).unwrap();
        if event["event_type"] == "new_event" {
            break event;
        }
    };
    assert_eq!(event["data"]["k"], 1);

    socket.close(None).await.unwrap();
    for _ in 0..50 {
        if h.orchestrator.clients().count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(h.orchestrator.clients().count(), 0);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}
