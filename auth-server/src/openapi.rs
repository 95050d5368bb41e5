use crate::api::oauth::models::{
    ExternalTokenRequest, IntrospectionRequest, IntrospectionResponse, OAuthError,
    TokenRequest, TokenResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const OAUTH_TAG: &str = "OAuth API";
pub(crate) const ADMIN_TAG: &str = "Admin API";

/// Registers the bearer scheme referenced by the admin-only routes
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::health::health_check,
        crate::api::health::healthy_check,
        crate::api::oauth::handlers::token,
        crate::api::oauth::handlers::refresh,
        crate::api::oauth::handlers::external_token,
        crate::api::oauth::handlers::introspect,
        crate::api::admin::get_application,
    ),
    components(schemas(
        TokenRequest,
        ExternalTokenRequest,
        TokenResponse,
        IntrospectionRequest,
        IntrospectionResponse,
        OAuthError,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = OAUTH_TAG, description = "Token issuance, refresh and introspection"),
        (name = ADMIN_TAG, description = "Service-to-service endpoints for admin applications"),
    ),
    info(
        title = "Auth Server API",
        description = "OAuth2 token and scope authorization service",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
