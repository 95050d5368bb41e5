use crate::api::interceptor::CallerApplication;
use crate::errors::ApiError;
use crate::openapi::ADMIN_TAG;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use log::info;
use token_engine::{Application, ApplicationStore, AuthError, RepositoryError};

/// Look up a registered application by client id
#[utoipa::path(
    get,
    path = "/admin/applications/{client_id}",
    tag = ADMIN_TAG,
    params(("client_id" = String, Path, description = "Client identifier")),
    responses(
        (status = 200, description = "Registered application"),
        (status = 401, description = "Caller not authenticated"),
        (status = 403, description = "Caller not an admin application"),
        (status = 404, description = "No such application")
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get_application(
    State(state): State<AppState>,
    caller: Option<Extension<CallerApplication>>,
    Path(client_id): Path<String>,
) -> Result<Json<Application>, ApiError> {
    if let Some(Extension(CallerApplication(caller))) = caller {
        info!("'{}' looked up application '{client_id}'", caller.client_id);
    }
    let guard = state.call_guard();
    match guard
        .run(
            "application lookup",
            state.store.find_application_by_client_id(&client_id),
        )
        .await
    {
        Ok(application) => Ok(Json(application)),
        Err(AuthError::Repository(RepositoryError::NotFound(_))) => Err(ApiError::not_found(
            format!("Application '{client_id}' not found"),
        )),
        Err(e) => Err(e.into()),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/applications/{client_id}", get(get_application))
}
