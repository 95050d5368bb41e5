use crate::cache::CacheBackend;
use crate::openapi::HEALTH_TAG;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Basic health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Health {
    status: &'static str,
    details: Option<Value>,
    #[serde(skip)]
    status_code: StatusCode,
}

impl IntoResponse for Health {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "status": self.status
        });

        if let Some(Value::Object(obj)) = self.details {
            for (key, value) in obj {
                body[key] = value;
            }
        }

        (self.status_code, axum::Json(body)).into_response()
    }
}

fn component_status(component: &str, result: Result<(), String>) -> (bool, &'static str) {
    match result {
        Ok(()) => (true, "healthy"),
        Err(e) => {
            warn!("{component} health check failed: {e}");
            (false, "unhealthy")
        }
    }
}

/// Liveness check handler
#[utoipa::path(
    get,
    path = "/health",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "Service is running", body = Health)
    )
)]
pub(crate) async fn health_check() -> impl IntoResponse {
    Health {
        status: "ok",
        details: None,
        status_code: StatusCode::OK,
    }
}

/// Component health handler
#[utoipa::path(
    get,
    path = "/healthy",
    tag = HEALTH_TAG,
    responses(
        (status = 200, description = "All components are healthy", body = Health),
        (status = 503, description = "One or more components are unhealthy", body = Health)
    )
)]
pub(crate) async fn healthy_check(State(state): State<AppState>) -> impl IntoResponse {
    let (store_ok, store_status) = component_status("store", state.store.health_check().await);
    let (cache_ok, cache_status) = component_status("cache", state.cache.health_check().await);
    let details = Some(serde_json::json!({
        "store_status": store_status,
        "cache_status": cache_status,
    }));

    if store_ok && cache_ok {
        Health {
            status: "ok",
            details,
            status_code: StatusCode::OK,
        }
    } else {
        Health {
            status: "error",
            details,
            status_code: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthy", get(healthy_check))
}
