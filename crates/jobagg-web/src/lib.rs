//! HTTP trigger surface for the aggregator.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use jobagg_storage::PgListingStore;
use jobagg_sync::{AggregationError, Aggregator, AggregatorConfig, TriggerSource};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobagg-web";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    triggered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    version: &'static str,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/jobs/trigger", post(trigger_handler))
        .with_state(Arc::new(state))
}

/// Connects storage, starts the scheduler when enabled and serves on `JOBAGG_PORT`.
pub async fn serve_from_env() -> anyhow::Result<()> {
    let port: u16 = std::env::var("JOBAGG_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5001);
    let config = AggregatorConfig::from_env();
    let store = PgListingStore::connect(&config.database_url).await?;
    let aggregator = Aggregator::from_config(&config, Arc::new(store)).await?;

    let scheduler = aggregator.maybe_build_scheduler().await?;
    if let Some(scheduler) = &scheduler {
        scheduler.start().await?;
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, providers = ?aggregator.provider_ids(), "listening");
    axum::serve(listener, app(AppState::new(aggregator))).await?;
    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn trigger_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.aggregator.trigger(TriggerSource::Manual) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(TriggerResponse {
                success: true,
                message: "Job aggregation triggered".to_string(),
                run_id: Some(receipt.run_id),
                triggered_at: Some(receipt.triggered_at),
            }),
        )
            .into_response(),
        Err(AggregationError::RunInProgress) => (
            StatusCode::CONFLICT,
            Json(TriggerResponse {
                success: false,
                message: "Job aggregation is already running".to_string(),
                run_id: None,
                triggered_at: None,
            }),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "failed to trigger aggregation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TriggerResponse {
                    success: false,
                    message: "Failed to trigger job aggregation".to_string(),
                    run_id: None,
                    triggered_at: None,
                }),
            )
                .into_response()
        }
    }
}
