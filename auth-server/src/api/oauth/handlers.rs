//! OAuth 2.0 endpoint handlers

use crate::api::oauth::models::{
    ExternalTokenRequest, IntrospectionRequest, IntrospectionResponse, OAuthError,
    OAuthRejection, TokenRequest, TokenResponse,
};
use crate::errors::{not_found_as_unauthenticated, ApiError};
use crate::headers::{
    apply_no_store, apply_refresh_cookie, bearer_token, cookie_value, REFRESH_COOKIE,
};
use crate::openapi::OAUTH_TAG;
use crate::state::AppState;
use axum::{
    extract::{Form, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use token_engine::refresh::{CLAIMS_MISMATCH, USER_NOT_APPROVED};
use token_engine::{
    parse_refresh_cookie, parse_scope_list, Application, ApplicationContext, ApplicationStore,
    AuthError, CallGuard, ClientContext, GrantType, RefreshContext, RefreshTokenStore,
    RepositoryError, ScopeName, SignedToken, TokenClaims, TokenClaimsBuilder, User, UserContext,
    UserStore, ValidatedRefresh,
};

/// Token endpoint for the client_credentials and password grants
#[utoipa::path(
    post,
    path = "/token",
    tag = OAUTH_TAG,
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request or scope", body = OAuthError),
        (status = 401, description = "Client or user authentication failed", body = OAuthError),
        (status = 403, description = "Requested scope not granted", body = OAuthError)
    )
)]
pub async fn token(
    State(state): State<AppState>,
    Form(request): Form<TokenRequest>,
) -> Result<Response, OAuthRejection> {
    match request.grant_type.as_str() {
        "client_credentials" => client_credentials(&state, &request).await,
        "password" => password(&state, &request).await,
        other => {
            warn!("Unsupported grant type '{other}'");
            Err(OAuthRejection::bad_request(
                OAuthError::unsupported_grant_type(),
            ))
        }
    }
}

async fn client_credentials(
    state: &AppState,
    request: &TokenRequest,
) -> Result<Response, OAuthRejection> {
    let (Some(client_id), Some(secret)) =
        (request.client_id.as_deref(), request.client_secret.as_deref())
    else {
        return Err(OAuthRejection::bad_request(OAuthError::invalid_request(
            "client_id and client_secret are required",
        )));
    };

    let guard = state.call_guard();
    let application = guard
        .run(
            "client authentication",
            state.store.authenticate_client(client_id, secret),
        )
        .await?
        .ok_or_else(|| {
            warn!("Client credentials rejected for '{client_id}'");
            OAuthRejection::invalid_client()
        })?;

    let scope = parse_scope_list(request.scope.as_deref().unwrap_or_default())?;
    state
        .resolver
        .authorize(Some(&application.client_id), &scope, &guard)
        .await?;

    let context = ApplicationContext::for_application(&application, scope);
    let claims = claims_builder(state, ClientContext::Application(context))
        .grant_type(GrantType::ClientCredentials)
        .build()?;
    let token = state.tokens.issue(&claims, &guard).await?;

    info!("Issued client token to '{}'", application.client_id);
    Ok(token_response(token, &claims))
}

async fn password(state: &AppState, request: &TokenRequest) -> Result<Response, OAuthRejection> {
    let (Some(client_id), Some(username), Some(password)) = (
        request.client_id.as_deref(),
        request.username.as_deref(),
        request.password.as_deref(),
    ) else {
        return Err(OAuthRejection::bad_request(OAuthError::invalid_request(
            "client_id, username and password are required",
        )));
    };

    let guard = state.call_guard();
    let application = find_client(state, &guard, client_id).await?;
    let user = guard
        .run(
            "user authentication",
            state.store.authenticate_user(username, password),
        )
        .await?
        .ok_or_else(|| {
            warn!("Password grant rejected for '{username}'");
            OAuthRejection::from(AuthError::Unauthenticated)
        })?;

    let scope = parse_scope_list(request.scope.as_deref().unwrap_or_default())?;
    issue_user_session(state, &guard, &user, &application, scope, GrantType::Password).await
}

/// Exchange an id token from an external identity provider
#[utoipa::path(
    post,
    path = "/token/external/{provider}",
    tag = OAUTH_TAG,
    params(("provider" = String, Path, description = "Configured identity provider name")),
    request_body(content = ExternalTokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Unknown provider or invalid scope", body = OAuthError),
        (status = 401, description = "Id token rejected", body = OAuthError),
        (status = 403, description = "User not approved or scope not granted", body = OAuthError)
    )
)]
pub async fn external_token(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Form(request): Form<ExternalTokenRequest>,
) -> Result<Response, OAuthRejection> {
    let verifier = state.identity.get(&provider).ok_or_else(|| {
        warn!("Id token presented for unknown provider '{provider}'");
        OAuthRejection::bad_request(OAuthError::invalid_request("Unknown identity provider"))
    })?;
    let identity = verifier.decode(&request.id_token)?;

    let guard = state.call_guard();
    let application = find_client(&state, &guard, &request.client_id).await?;
    let user = guard
        .run("user lookup", state.store.find_user_by_email(&identity.email))
        .await
        .map_err(not_found_as_unauthenticated)?;

    debug!("{provider} identity resolved to user {}", user.id);
    let scope = parse_scope_list(request.scope.as_deref().unwrap_or_default())?;
    issue_user_session(&state, &guard, &user, &application, scope, GrantType::IdToken).await
}

/// Refresh exchange: refresh cookie plus the (possibly expired) access token
#[utoipa::path(
    post,
    path = "/token/refresh",
    tag = OAUTH_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer access token, may be expired"),
        ("refresh_token" = String, Cookie, description = "Refresh token id")
    ),
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Missing or invalid credentials", body = OAuthError),
        (status = 403, description = "Refresh exchange rejected", body = OAuthError)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, OAuthRejection> {
    let refresh_id = cookie_value(&headers, REFRESH_COOKIE)
        .ok_or_else(|| {
            warn!("Refresh attempted without a refresh cookie");
            AuthError::Unauthenticated
        })
        .and_then(parse_refresh_cookie)?;
    let bearer = bearer_token(&headers).ok_or_else(|| {
        warn!("Refresh attempted without a bearer token");
        AuthError::Unauthenticated
    })?;

    let guard = state.call_guard();
    let presented = state
        .tokens
        .verify_allow_expired(&SignedToken::new(bearer), &guard)
        .await?;
    let ValidatedRefresh {
        refresh_token,
        user,
        claims,
    } = RefreshContext::load(state.store.as_ref(), refresh_id, presented, &guard)
        .await
        .map_err(not_found_as_unauthenticated)?
        .validate()?;

    // grants may have been revoked since the original token was issued
    let scope = claims.scopes().clone();
    state
        .resolver
        .authorize(Some(&user.username), &scope, &guard)
        .await?;

    let context = UserContext::for_user(&user, claims.client_id(), scope);
    let mut builder = claims_builder(&state, ClientContext::User(context));
    for grant_type in claims.authorized_grant_types() {
        builder = builder.grant_type(*grant_type);
    }
    let new_claims = builder.grant_type(GrantType::RefreshToken).build()?;
    let token = state.tokens.issue(&new_claims, &guard).await?;

    let rotated = guard
        .run(
            "refresh token rotation",
            state.store.rotate_refresh_token(
                refresh_token.id,
                refresh_token.jti,
                new_claims.token_id(),
            ),
        )
        .await
        .map_err(|e| match e {
            AuthError::Repository(RepositoryError::Conflict(reason)) => {
                warn!("Refresh replay detected: {reason}");
                AuthError::Forbidden(CLAIMS_MISMATCH.to_string())
            }
            other => other,
        })?;

    info!("Refreshed session of user {}", user.id);
    let mut response = token_response(token, &new_claims);
    apply_refresh_cookie(
        response.headers_mut(),
        &rotated.id.to_string(),
        rotated.seconds_until_expiry,
    );
    Ok(response)
}

/// Scope introspection of an access token
#[utoipa::path(
    post,
    path = "/introspect",
    tag = OAUTH_TAG,
    request_body(content = IntrospectionRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Introspection result", body = IntrospectionResponse),
        (status = 401, description = "Caller not authenticated"),
        (status = 403, description = "Caller not an admin application")
    ),
    security(("bearer" = []))
)]
pub async fn introspect(
    State(state): State<AppState>,
    Form(request): Form<IntrospectionRequest>,
) -> Result<Json<IntrospectionResponse>, ApiError> {
    let guard = state.call_guard();
    match state
        .tokens
        .verify(&SignedToken::new(request.token), &guard)
        .await
    {
        Ok(claims) => Ok(Json(IntrospectionResponse::for_claims(&claims))),
        Err(e) if e.is_credential_failure() => {
            debug!("Introspected token is not active: {e}");
            Ok(Json(IntrospectionResponse::inactive()))
        }
        Err(e) => Err(e.into()),
    }
}

fn claims_builder(state: &AppState, context: ClientContext) -> TokenClaimsBuilder {
    let signing = &state.config.signing;
    TokenClaims::builder(context)
        .issuer(&signing.issuer)
        .audience(signing.audience.iter())
        .lifetime(Duration::seconds(signing.access_token_ttl))
}

fn token_response(token: SignedToken, claims: &TokenClaims) -> Response {
    let mut response = Json(TokenResponse::bearer(token.into_inner(), claims)).into_response();
    apply_no_store(response.headers_mut());
    response
}

/// Registered client a user session is requested for
async fn find_client(
    state: &AppState,
    guard: &CallGuard,
    client_id: &str,
) -> Result<Application, OAuthRejection> {
    guard
        .run(
            "application lookup",
            state.store.find_application_by_client_id(client_id),
        )
        .await
        .map_err(|e| match e {
            AuthError::Repository(RepositoryError::NotFound(_)) => {
                warn!("Token requested for unknown client '{client_id}'");
                OAuthRejection::invalid_client()
            }
            other => other.into(),
        })
}

/// Issue an access token for an authenticated user and start a refreshable
/// session bound to that token
async fn issue_user_session(
    state: &AppState,
    guard: &CallGuard,
    user: &User,
    application: &Application,
    scope: BTreeSet<ScopeName>,
    grant_type: GrantType,
) -> Result<Response, OAuthRejection> {
    if !user.is_approved() {
        return Err(AuthError::Forbidden(USER_NOT_APPROVED.to_string()).into());
    }
    state
        .resolver
        .authorize(Some(&user.username), &scope, guard)
        .await?;

    let context = UserContext::for_user(user, application.client_id.clone(), scope);
    let claims = claims_builder(state, ClientContext::User(context))
        .grant_type(grant_type)
        .grant_type(GrantType::RefreshToken)
        .build()?;
    let token = state.tokens.issue(&claims, guard).await?;
    let refresh_token = guard
        .run(
            "refresh token creation",
            state.store.create_refresh_token(
                user.id,
                claims.token_id(),
                state.config.signing.refresh_token_ttl,
            ),
        )
        .await?;

    info!(
        "Issued {} token to user {} via '{}'",
        grant_type.as_str(),
        user.id,
        application.client_id
    );
    let mut response = token_response(token, &claims);
    apply_refresh_cookie(
        response.headers_mut(),
        &refresh_token.id.to_string(),
        refresh_token.seconds_until_expiry,
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::api::oauth::models::{IntrospectionResponse, TokenResponse};
    use crate::config::InterceptorMode;
    use crate::test_utils::{
        test_config, TestFixture, ADMIN_CLIENT, ADMIN_SECRET, ALICE_ID, ALICE_PASSWORD,
        PENDING_PASSWORD, SERVICE_CLIENT, SERVICE_SECRET, WEB_CLIENT,
    };
    use http::header::{CACHE_CONTROL, SET_COOKIE};
    use http::StatusCode;
    use serde_json::json;
    use std::collections::HashSet;

    async fn refresh(
        fixture: &TestFixture,
        token: &str,
        cookie: &str,
    ) -> crate::test_utils::TestResponse {
        let bearer = format!("Bearer {token}");
        let cookie = format!("refresh_token={cookie}");
        fixture
            .post_form(
                "/token/refresh",
                &[],
                &[("Authorization", bearer.as_str()), ("Cookie", cookie.as_str())],
            )
            .await
    }

    async fn introspect(fixture: &TestFixture, token: &str) -> IntrospectionResponse {
        let admin = fixture
            .client_token(ADMIN_CLIENT, ADMIN_SECRET, "admin.READ")
            .await;
        let bearer = format!("Bearer {admin}");
        let response = fixture
            .post_form(
                "/introspect",
                &[("token", token)],
                &[("Authorization", bearer.as_str())],
            )
            .await;
        response.assert_ok();
        response.json_as()
    }

    #[tokio::test]
    async fn test_client_credentials_grant() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .post_form(
                "/token",
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", SERVICE_CLIENT),
                    ("client_secret", SERVICE_SECRET),
                    ("scope", "reports.READ"),
                ],
                &[],
            )
            .await;

        response.assert_ok();
        assert_eq!(response.header(CACHE_CONTROL), Some("no-store"));
        assert!(response.headers.get(SET_COOKIE).is_none());
        let body: TokenResponse = response.json_as();
        assert_eq!(body.token_type, "Bearer");
        assert_eq!(body.scope, vec!["reports.READ"]);
        assert!(body.expires_in > 3500 && body.expires_in <= 3600);
    }

    #[tokio::test]
    async fn test_client_credentials_rejects_bad_secret() {
        let fixture = TestFixture::new().await;
        for secret in ["wrong", ""] {
            let response = fixture
                .post_form(
                    "/token",
                    &[
                        ("grant_type", "client_credentials"),
                        ("client_id", SERVICE_CLIENT),
                        ("client_secret", secret),
                        ("scope", "reports.READ"),
                    ],
                    &[],
                )
                .await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.json["error"], json!("invalid_client"));
        }

        // public clients have no secret to match
        let response = fixture
            .post_form(
                "/token",
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", WEB_CLIENT),
                    ("client_secret", "anything"),
                    ("scope", "reports.READ"),
                ],
                &[],
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ungranted_scope_is_denied_generically() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .post_form(
                "/token",
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", SERVICE_CLIENT),
                    ("client_secret", SERVICE_SECRET),
                    ("scope", "reports.READ billing.WRITE"),
                ],
                &[],
            )
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(
            response.json,
            json!({"error": "access_denied", "error_description": "The request was denied"})
        );
        assert!(!response.json.to_string().contains("billing"));
    }

    #[tokio::test]
    async fn test_invalid_scope_requests() {
        let fixture = TestFixture::new().await;
        for scope in [None, Some(""), Some("reports"), Some("reports.ADMIN")] {
            let mut form = vec![
                ("grant_type", "client_credentials"),
                ("client_id", SERVICE_CLIENT),
                ("client_secret", SERVICE_SECRET),
            ];
            if let Some(scope) = scope {
                form.push(("scope", scope));
            }
            let response = fixture.post_form("/token", &form, &[]).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.json["error"], json!("invalid_scope"), "{scope:?}");
        }
    }

    #[tokio::test]
    async fn test_unsupported_grant_type() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .post_form("/token", &[("grant_type", "authorization_code")], &[])
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json["error"], json!("unsupported_grant_type"));

        let response = fixture
            .post_form("/token", &[("grant_type", "client_credentials")], &[])
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json["error"], json!("invalid_request"));
    }

    #[tokio::test]
    async fn test_password_grant_starts_session() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .post_form(
                "/token",
                &[
                    ("grant_type", "password"),
                    ("client_id", WEB_CLIENT),
                    ("username", "alice"),
                    ("password", ALICE_PASSWORD),
                    ("scope", "study1.READ study1.WRITE"),
                ],
                &[],
            )
            .await;

        response.assert_ok();
        let cookie = response.header(SET_COOKIE).unwrap();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/token"));
        assert!(response.refresh_cookie().is_some());

        let introspection = introspect(&fixture, &response.access_token()).await;
        assert!(introspection.active);
        assert_eq!(introspection.principal.as_deref(), Some(ALICE_ID));
        assert_eq!(introspection.client_id.as_deref(), Some(WEB_CLIENT));
        assert_eq!(
            introspection.scope,
            Some(vec!["study1.READ".to_string(), "study1.WRITE".to_string()])
        );
    }

    #[tokio::test]
    async fn test_password_grant_rejections() {
        let fixture = TestFixture::new().await;
        let cases = [
            ("alice", "wrong password", WEB_CLIENT, "study1.READ", StatusCode::UNAUTHORIZED),
            ("nobody", ALICE_PASSWORD, WEB_CLIENT, "study1.READ", StatusCode::UNAUTHORIZED),
            ("carol", "", WEB_CLIENT, "study2.READ", StatusCode::UNAUTHORIZED),
            ("bob", PENDING_PASSWORD, WEB_CLIENT, "study1.READ", StatusCode::FORBIDDEN),
            // DENY on study2 overrides anything else
            ("alice", ALICE_PASSWORD, WEB_CLIENT, "study2.READ", StatusCode::FORBIDDEN),
            ("alice", ALICE_PASSWORD, "unknown-client", "study1.READ", StatusCode::UNAUTHORIZED),
        ];

        for (username, password, client_id, scope, expected) in cases {
            let response = fixture
                .post_form(
                    "/token",
                    &[
                        ("grant_type", "password"),
                        ("client_id", client_id),
                        ("username", username),
                        ("password", password),
                        ("scope", scope),
                    ],
                    &[],
                )
                .await;
            response.assert_status(expected);
            assert!(response.refresh_cookie().is_none(), "{username}");
        }
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_replay() {
        let fixture = TestFixture::new().await;
        let (first, cookie) = fixture.password_token("alice", "study1.WRITE").await;

        let response = refresh(&fixture, &first, &cookie).await;
        response.assert_ok();
        let second = response.access_token();
        assert_ne!(second, first);
        assert_eq!(response.refresh_cookie().as_deref(), Some(cookie.as_str()));
        let body: TokenResponse = response.json_as();
        assert_eq!(body.scope, vec!["study1.WRITE"]);

        // the refresh token now belongs to the second access token
        let replay = refresh(&fixture, &first, &cookie).await;
        replay.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(replay.json["error"], json!("access_denied"));

        refresh(&fixture, &second, &cookie).await.assert_ok();
    }

    #[tokio::test]
    async fn test_expired_token_only_accepted_by_refresh() {
        let fixture = TestFixture::new().await;
        let (expired, cookie) = fixture.expired_session("study1.READ").await;

        let introspection = introspect(&fixture, &expired).await;
        assert!(!introspection.active);

        let response = refresh(&fixture, &expired, &cookie).await;
        response.assert_ok();
        let introspection = introspect(&fixture, &response.access_token()).await;
        assert!(introspection.active);
        assert_eq!(introspection.principal.as_deref(), Some(ALICE_ID));
    }

    #[tokio::test]
    async fn test_refresh_rechecks_current_grants() {
        let fixture = TestFixture::new().await;
        let (token, cookie) = fixture.password_token("alice", "study1.WRITE").await;
        fixture
            .state
            .store
            .replace_grants("alice", HashSet::new())
            .await;

        let response = refresh(&fixture, &token, &cookie).await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert!(response.refresh_cookie().is_none());
    }

    #[tokio::test]
    async fn test_refresh_requires_both_credentials() {
        let fixture = TestFixture::new().await;
        let (token, cookie) = fixture.password_token("alice", "study1.READ").await;

        let bearer = format!("Bearer {token}");
        let cookie_header = format!("refresh_token={cookie}");
        let cases: [&[(&str, &str)]; 4] = [
            &[("Authorization", bearer.as_str())],
            &[("Cookie", cookie_header.as_str())],
            &[("Authorization", bearer.as_str()), ("Cookie", "refresh_token=not-a-uuid")],
            &[
                ("Authorization", bearer.as_str()),
                ("Cookie", "refresh_token=4a8e2a55-0f5e-4c1b-9a61-2f7c0d3e9b10"),
            ],
        ];
        for headers in cases {
            let response = fixture.post_form("/token/refresh", &[], headers).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.json["error"], json!("invalid_grant"));
        }
    }

    #[tokio::test]
    async fn test_external_token_exchange() {
        let fixture = TestFixture::new().await;
        let id_token = fixture.id_token("carol@example.com");

        let response = fixture
            .post_form(
                "/token/external/google",
                &[
                    ("id_token", id_token.as_str()),
                    ("client_id", WEB_CLIENT),
                    ("scope", "study2.READ"),
                ],
                &[],
            )
            .await;
        response.assert_ok();
        let cookie = response.refresh_cookie().unwrap();

        // sessions started from an id token refresh like any other
        refresh(&fixture, &response.access_token(), &cookie)
            .await
            .assert_ok();
    }

    #[tokio::test]
    async fn test_external_token_rejections() {
        let fixture = TestFixture::new().await;
        let unknown_user = fixture.id_token("mallory@example.com");
        let carol = fixture.id_token("carol@example.com");
        let cases = [
            ("/token/external/github", carol.as_str(), StatusCode::BAD_REQUEST),
            ("/token/external/google", unknown_user.as_str(), StatusCode::UNAUTHORIZED),
            ("/token/external/google", "not.an.id-token", StatusCode::UNAUTHORIZED),
        ];

        for (uri, id_token, expected) in cases {
            let response = fixture
                .post_form(
                    uri,
                    &[
                        ("id_token", id_token),
                        ("client_id", WEB_CLIENT),
                        ("scope", "study2.READ"),
                    ],
                    &[],
                )
                .await;
            response.assert_status(expected);
        }
    }

    #[tokio::test]
    async fn test_introspection_of_invalid_token() {
        let fixture = TestFixture::new().await;
        let introspection = introspect(&fixture, "garbage").await;
        assert!(!introspection.active);
        assert!(introspection.principal.is_none());
        assert!(introspection.scope.is_none());
    }

    #[tokio::test]
    async fn test_introspection_is_admin_only() {
        let fixture = TestFixture::new().await;
        let service = fixture
            .client_token(SERVICE_CLIENT, SERVICE_SECRET, "reports.READ")
            .await;

        let response = fixture
            .post_form("/introspect", &[("token", service.as_str())], &[])
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let bearer = format!("Bearer {service}");
        let response = fixture
            .post_form(
                "/introspect",
                &[("token", service.as_str())],
                &[("Authorization", bearer.as_str())],
            )
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_disabled_interceptor_opens_service_routes() {
        let mut config = test_config();
        config.interceptor.mode = InterceptorMode::Disabled;
        let fixture = TestFixture::with_config(config).await;

        let response = fixture
            .post_form("/introspect", &[("token", "garbage")], &[])
            .await;
        response.assert_ok();
        assert_eq!(response.json, json!({"active": false}));
    }
}
