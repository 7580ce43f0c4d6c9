//! Readiness endpoint

use axum::{Json, Router, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use serde_json::Value;

use crate::state::AppState;

type ReadyResponse = (StatusCode, Json<Value>);

async fn ready(state: AppState) -> Result<ReadyResponse, ReadyResponse> {
    let mongodb: HealthCheckFuture = Box::pin(async move {
        let health = database::mongodb::check_health_detailed(&state.mongo_client).await;
        tracing::debug!(response_time_ms = health.response_time_ms, "MongoDB ping");
        if health.healthy {
            Ok(())
        } else {
            Err(health.message.unwrap_or_else(|| "ping failed".to_string()))
        }
    });

    run_health_checks(vec![("mongodb", mongodb)]).await
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/ready", get(move || ready(state)))
}
