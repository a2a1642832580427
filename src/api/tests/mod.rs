use super::*;
use crate::Config;
use crate::config::SecretString;
use crate::test_helpers::{
    FakeFetcher, FakePublisher, ScriptedHistory, ScriptedJobs, snapshot, test_config, test_orchestrator,
};
use crate::types::JobStatus;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;


/// Orchestrator whose job finishes on the second poll and whose history gains `new-1`
fn orchestrator(config: Config) -> Arc<Orchestrator> {
    let jobs = Arc::new(
        ScriptedJobs::new([JobStatus::Running, JobStatus::Finished])
            .with_output("[cheerful] Welcome back to the show!"),
    );
    let history = Arc::new(ScriptedHistory::new([
        snapshot(&["old-1"]),
        snapshot(&["new-1", "old-1"]),
    ]));
    Arc::new(test_orchestrator(
        config,
        jobs,
        history,
        Arc::new(FakeFetcher::succeeding()),
        Arc::new(FakePublisher::succeeding()),
    ))
}

fn router(config: Config) -> Router {
    create_router(orchestrator(config))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = router(test_config()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn cors_echoes_only_listed_origins() {
    let mut config = test_config();
    config.api.cors_origins = vec!["https://studio.example.com".into()];
    let app = router(config);

    let allowed = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "https://studio.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "https://studio.example.com"
    );

    let other = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "https://elsewhere.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(other.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn cors_disabled_sends_no_headers() {
    let mut config = test_config();
    config.api.cors_enabled = false;

    let response = router(config)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn configured_api_key_guards_every_route() {
    let mut config = test_config();
    config.api.api_key = Some(SecretString::new("service-key"));
    let app = router(config);

    let rejected = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let accepted = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Api-Key", "service-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn swagger_ui_can_be_disabled() {
    let mut config = test_config();
    config.api.swagger_ui = false;

    let response = router(config)
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn server_stops_when_shutdown_resolves() {
    let mut config = test_config();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();

    let result = start_api_server(orchestrator(config), async {}).await;

    assert!(result.is_ok(), "server should exit cleanly: {result:?}");
}

#[tokio::test]
async fn occupied_port_is_an_io_error() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config();
    config.api.bind_address = taken.local_addr().unwrap();

    let result = start_api_server(orchestrator(config), async {}).await;

    assert!(matches!(result, Err(crate::error::Error::Io(_))));
}
