//! Inbound credential interceptor for service-to-service routes.
//!
//! A hard gate: a request without a verifiable bearer token issued to an
//! admin-tier application never reaches the handler.

use crate::errors::ApiError;
use crate::headers::bearer_token;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::{debug, warn};
use token_engine::{
    Application, ApplicationStore, AuthError, ClientContext, RepositoryError, SignedToken,
};

/// The application a request was authenticated as, added to request extensions
#[derive(Debug, Clone)]
pub struct CallerApplication(pub Application);

pub(super) async fn credential_interceptor(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match authorize_caller(&state, request.headers()).await {
        Ok(application) => {
            debug!("Caller '{}' passed the interceptor", application.client_id);
            request
                .extensions_mut()
                .insert(CallerApplication(application));
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn authorize_caller(
    state: &AppState,
    headers: &http::HeaderMap,
) -> Result<Application, AuthError> {
    let token = bearer_token(headers).ok_or_else(|| {
        warn!("Missing or malformed Authorization header");
        AuthError::Unauthenticated
    })?;

    let guard = state.call_guard();
    let claims = state
        .tokens
        .verify(&SignedToken::new(token), &guard)
        .await?;

    let client_id = match claims.context() {
        ClientContext::Application(context) => &context.client_id,
        ClientContext::User(_) => {
            return Err(AuthError::Forbidden(
                "user tokens cannot call service routes".to_string(),
            ));
        }
    };

    let application = guard
        .run(
            "application lookup",
            state.store.find_application_by_client_id(client_id),
        )
        .await
        .map_err(|e| match e {
            AuthError::Repository(RepositoryError::NotFound(_)) => {
                AuthError::Forbidden(format!("unknown application '{client_id}'"))
            }
            other => other,
        })?;

    if !application.privilege_class.is_highest_tier() {
        return Err(AuthError::Forbidden(format!(
            "application '{}' has privilege class {:?}",
            application.client_id, application.privilege_class
        )));
    }
    Ok(application)
}
