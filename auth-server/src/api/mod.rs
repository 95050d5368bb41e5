pub(crate) mod admin;
pub(crate) mod health;
mod interceptor;
pub(crate) mod oauth;

use crate::api::interceptor::credential_interceptor;
use crate::config::InterceptorMode;
use crate::state::AppState;
use axum::{middleware, Router};
use log::warn;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(oauth::router())
        .merge(protected_routes(state))
}

/// Routes reserved for admin-tier applications
fn protected_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .merge(oauth::protected_router())
        .merge(admin::router());

    match state.config.interceptor.mode {
        InterceptorMode::Enforce => router.route_layer(middleware::from_fn_with_state(
            state.clone(),
            credential_interceptor,
        )),
        InterceptorMode::Disabled => {
            warn!("Credential interceptor disabled, service routes are unauthenticated");
            router
        }
    }
}
