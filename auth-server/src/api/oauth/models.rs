//! OAuth 2.0 request and response structures

use crate::errors::status_for;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use token_engine::{AuthError, TokenClaims};
use utoipa::ToSchema;

/// Token Request (form encoded)
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// "client_credentials" or "password"
    pub grant_type: String,
    /// Client identifier
    pub client_id: Option<String>,
    /// Client secret (client_credentials grant)
    pub client_secret: Option<String>,
    /// Resource owner username (password grant)
    pub username: Option<String>,
    /// Resource owner password (password grant)
    pub password: Option<String>,
    /// Requested scopes, space separated `<policy>.<LEVEL>` entries
    pub scope: Option<String>,
}

/// Exchange of an external identity provider's id token
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExternalTokenRequest {
    /// Id token issued by the provider
    pub id_token: String,
    /// Client the token is requested for
    pub client_id: String,
    /// Requested scopes, space separated
    pub scope: Option<String>,
}

/// Token Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// The access token string
    pub access_token: String,
    /// Token type - always "Bearer"
    pub token_type: String,
    /// Granted scopes
    pub scope: Vec<String>,
    /// Token expiration in seconds
    pub expires_in: u64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, claims: &TokenClaims) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            scope: claims.scopes().iter().map(ToString::to_string).collect(),
            expires_in: claims.expires_in_seconds(Utc::now()),
        }
    }
}

/// Token Introspection Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct IntrospectionRequest {
    /// The token to introspect
    pub token: String,
}

/// Scope introspection of an active token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IntrospectionResponse {
    pub active: bool,
    /// User or application id the token was issued to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<String>>,
}

impl IntrospectionResponse {
    pub fn inactive() -> Self {
        Self {
            active: false,
            principal: None,
            client_id: None,
            expires_at: None,
            scope: None,
        }
    }

    pub fn for_claims(claims: &TokenClaims) -> Self {
        Self {
            active: true,
            principal: Some(claims.effective_subject()),
            client_id: Some(claims.client_id().to_string()),
            expires_at: Some(claims.expires_at()),
            scope: Some(claims.scopes().iter().map(ToString::to_string).collect()),
        }
    }
}

/// OAuth 2.0 Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OAuthError {
    /// Error code
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthError {
    fn new(error: &str, description: &str) -> Self {
        Self {
            error: error.to_string(),
            error_description: Some(description.to_string()),
        }
    }

    pub fn invalid_request(description: &str) -> Self {
        Self::new("invalid_request", description)
    }

    pub fn invalid_client(description: &str) -> Self {
        Self::new("invalid_client", description)
    }

    pub fn unsupported_grant_type() -> Self {
        Self::new(
            "unsupported_grant_type",
            "Supported grant types: client_credentials, password",
        )
    }
}

/// An OAuth error together with its HTTP status
#[derive(Debug)]
pub struct OAuthRejection {
    pub status: StatusCode,
    pub body: OAuthError,
}

impl OAuthRejection {
    pub fn bad_request(body: OAuthError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body,
        }
    }

    pub fn invalid_client() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: OAuthError::invalid_client("Client authentication failed"),
        }
    }
}

impl From<AuthError> for OAuthRejection {
    fn from(error: AuthError) -> Self {
        crate::errors::log_rejection(&error);
        let status = status_for(&error);
        let body = match &error {
            AuthError::MissingUser => OAuthError::invalid_request("A username is required"),
            AuthError::MissingScope
            | AuthError::MalformedScope(_)
            | AuthError::UnknownAccessLevel(_) => {
                OAuthError::new("invalid_scope", "The requested scope is invalid")
            }
            _ if status == StatusCode::UNAUTHORIZED => {
                OAuthError::new("invalid_grant", "The presented credentials are not valid")
            }
            _ if status == StatusCode::FORBIDDEN => {
                OAuthError::new("access_denied", "The request was denied")
            }
            _ if status == StatusCode::GATEWAY_TIMEOUT || status == StatusCode::SERVICE_UNAVAILABLE => {
                OAuthError::new("temporarily_unavailable", "Try again later")
            }
            _ => OAuthError::new("server_error", "Internal server error"),
        };
        Self { status, body }
    }
}

impl IntoResponse for OAuthRejection {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        crate::headers::apply_no_store(response.headers_mut());
        response
    }
}
