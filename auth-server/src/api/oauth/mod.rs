//! OAuth 2.0 token endpoints
//!
//! ## Supported flows
//! - Client Credentials Grant (RFC 6749 Section 4.4)
//! - Resource Owner Password Credentials Grant (RFC 6749 Section 4.3)
//! - Refresh exchange through an HttpOnly refresh cookie
//! - Id token exchange for configured external identity providers
//! - Scope introspection (RFC 7662 style), admin applications only
//!
//! Every issued scope is checked against the principal's grants before a
//! token is signed. Denials carry a generic OAuth error body.

pub mod handlers;
pub mod models;

use crate::state::AppState;
use axum::routing::{post, Router};

/// Token endpoints reachable without a bearer credential
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token", post(handlers::token))
        .route("/token/refresh", post(handlers::refresh))
        .route("/token/external/{provider}", post(handlers::external_token))
}

/// Endpoints only admin applications may call
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/introspect", post(handlers::introspect))
}
