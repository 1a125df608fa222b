use std::path::Path;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use jobagg_adapters::{adapter_for_provider, AdapterContext, AdapterError};
use jobagg_core::{PROVIDER_ONE, PROVIDER_TWO};
use jobagg_storage::{FetchError, HttpClientConfig, HttpFetcher};
use serde_json::Value as JsonValue;
use tokio::net::TcpListener;
use uuid::Uuid;

fn load_fixture(provider: &str) -> JsonValue {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(provider)
        .join("jobs.json");
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn http() -> HttpFetcher {
    HttpFetcher::new(HttpClientConfig {
        timeout: Duration::from_secs(5),
        ..HttpClientConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn both_providers_collect_over_http() {
    let p1 = load_fixture(PROVIDER_ONE);
    let p2 = load_fixture(PROVIDER_TWO);
    let router = Router::new()
        .route("/provider1/jobs", get(move || async move { Json(p1) }))
        .route("/provider2/jobs", get(move || async move { Json(p2) }));
    let base = spawn_server(router).await;
    let http = http();
    let ctx = AdapterContext::new(Uuid::new_v4());

    let one = adapter_for_provider(PROVIDER_ONE, &format!("{base}/provider1/jobs")).unwrap();
    let listings = one.collect(&http, &ctx).await.unwrap();
    assert_eq!(listings.len(), 3);
    assert!(listings.iter().all(|l| l.external_id.starts_with("provider1_")));

    let two = adapter_for_provider(PROVIDER_TWO, &format!("{base}/provider2/jobs")).unwrap();
    let listings = two.collect(&http, &ctx).await.unwrap();
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].title, "Software Engineer");
    assert!(listings.iter().all(|l| l.provider == PROVIDER_TWO));
}

#[tokio::test]
async fn upstream_failures_surface_as_adapter_errors() {
    let router = Router::new()
        .route(
            "/provider1/jobs",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/provider2/jobs",
            get(|| async { Json(serde_json::json!({ "status": "error" })) }),
        );
    let base = spawn_server(router).await;
    let http = http();
    let ctx = AdapterContext::new(Uuid::new_v4());

    let one = adapter_for_provider(PROVIDER_ONE, &format!("{base}/provider1/jobs")).unwrap();
    let err = one.collect(&http, &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        AdapterError::Fetch(FetchError::HttpStatus { status, .. }) if status == 500
    ));

    let two = adapter_for_provider(PROVIDER_TWO, &format!("{base}/provider2/jobs")).unwrap();
    let err = two.collect(&http, &ctx).await.unwrap_err();
    assert!(matches!(err, AdapterError::ProviderStatus(_)));
}
