use crate::config::{ServerConfig, SigningConfig};
use crate::create_app;
use crate::state::AppState;
use crate::store::memory::{hash_secret, Seed, SeedApplication, SeedUser};
use crate::store::MemoryStore;
use axum::body::Body;
use axum::Router;
use chrono::{Duration, Utc};
use http::header::{AUTHORIZATION, CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use token_engine::{
    parse_scope_list, Application, ApplicationType, ClientContext, GrantType,
    IdentityProviderConfig, PrivilegeClass, RefreshTokenStore, ScopeName, TokenClaims, User,
    UserContext, UserStatus,
};
use tower::ServiceExt;
use uuid::Uuid;

/// Base64 of the shared secret test tokens are signed with
pub const SIGNING_SECRET: &str = "YXV0aC1zZXJ2ZXItdGVzdC1zaWduaW5nLXNlY3JldC0wMTIzNDU2Nzg5";

/// Admin-tier application allowed through the credential interceptor
pub const ADMIN_CLIENT: &str = "ops-console";
pub const ADMIN_SECRET: &str = "ops-console-secret";

/// Trusted application below the admin tier
pub const SERVICE_CLIENT: &str = "report-service";
pub const SERVICE_SECRET: &str = "report-service-secret";

/// Public web client users sign in through
pub const WEB_CLIENT: &str = "web-portal";

pub const ALICE_ID: &str = "0b7c56de-5b8e-4d5c-9a65-0f3a1c2e7d01";
pub const ALICE_PASSWORD: &str = "correct horse battery staple";
pub const PENDING_PASSWORD: &str = "pending-password";

pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";
pub const GOOGLE_AUDIENCE: &str = "auth-server-test";
pub const GOOGLE_SECRET: &str = "google-id-token-test-secret";

/// Seed secrets hashed once per test binary
static SECRET_HASHES: LazyLock<HashMap<&'static str, String>> = LazyLock::new(|| {
    [ALICE_PASSWORD, PENDING_PASSWORD, ADMIN_SECRET, SERVICE_SECRET]
        .into_iter()
        .map(|secret| (secret, hash_secret(secret).unwrap()))
        .collect()
});

fn hashed(secret: &str) -> String {
    SECRET_HASHES[secret].clone()
}

fn user(id: &str, username: &str, email: &str, status: UserStatus) -> User {
    User {
        id: Uuid::parse_str(id).unwrap(),
        username: username.to_string(),
        email: Some(email.to_string()),
        given_name: None,
        family_name: None,
        status,
        roles: vec!["analyst".to_string()],
    }
}

fn application(
    client_id: &str,
    application_type: ApplicationType,
    privilege_class: PrivilegeClass,
    secret: Option<&str>,
) -> SeedApplication {
    SeedApplication {
        application: Application {
            id: Uuid::new_v4(),
            client_id: client_id.to_string(),
            name: client_id.replace('-', " "),
            application_type,
            privilege_class,
        },
        secret_hash: secret.map(hashed),
    }
}

fn scopes(text: &str) -> Vec<ScopeName> {
    parse_scope_list(text).unwrap().into_iter().collect()
}

/// Users, applications and grants every fixture starts with
pub fn test_seed() -> Seed {
    let users = vec![
        SeedUser {
            user: user(ALICE_ID, "alice", "alice@example.com", UserStatus::Approved),
            password_hash: Some(hashed(ALICE_PASSWORD)),
        },
        SeedUser {
            user: user(
                "7d2f0e4a-8c1b-4f3e-b6a2-94c5d8e1f302",
                "bob",
                "bob@example.com",
                UserStatus::Pending,
            ),
            password_hash: Some(hashed(PENDING_PASSWORD)),
        },
        SeedUser {
            user: user(
                "c41e9a70-3d2b-4e8f-a1c6-5b7d9f0e2a03",
                "carol",
                "Carol@Example.com",
                UserStatus::Approved,
            ),
            password_hash: None,
        },
    ];

    let applications = vec![
        application(
            ADMIN_CLIENT,
            ApplicationType::Service,
            PrivilegeClass::Admin,
            Some(ADMIN_SECRET),
        ),
        application(
            SERVICE_CLIENT,
            ApplicationType::Service,
            PrivilegeClass::Trusted,
            Some(SERVICE_SECRET),
        ),
        application(
            WEB_CLIENT,
            ApplicationType::Web,
            PrivilegeClass::Standard,
            None,
        ),
    ];

    let grants = HashMap::from([
        ("alice".to_string(), scopes("study1.WRITE study2.DENY")),
        ("bob".to_string(), scopes("study1.READ")),
        ("carol".to_string(), scopes("study2.READ")),
        (ADMIN_CLIENT.to_string(), scopes("admin.READ")),
        (SERVICE_CLIENT.to_string(), scopes("reports.READ")),
    ]);

    Seed {
        users,
        applications,
        grants,
    }
}

/// Configuration used by [`TestFixture::new`]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        signing: SigningConfig {
            secret: SIGNING_SECRET.to_string(),
            ..SigningConfig::default()
        },
        identity_providers: vec![IdentityProviderConfig {
            name: "google".to_string(),
            issuer: GOOGLE_ISSUER.to_string(),
            audience: GOOGLE_AUDIENCE.to_string(),
            secret: Some(GOOGLE_SECRET.to_string()),
            public_key_pem: None,
            leeway_secs: 60,
        }],
        ..ServerConfig::default()
    }
}

/// Test fixture wiring the full router around a seeded in-memory store.
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///     let token = fixture.client_token(ADMIN_CLIENT, ADMIN_SECRET, "admin.READ").await;
///     let response = fixture.get_with_token("/admin/applications/web-portal", &token).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// State shared with the router, for direct access to the store and services
    pub state: AppState,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ServerConfig) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let store = MemoryStore::from_seed(test_seed()).expect("Failed to seed store");
        let state = AppState::with_store(config, store).expect("Failed to build state");
        let app = create_app(state.clone()).await;

        Self { app, state }
    }

    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Non-JSON or empty bodies become an empty object
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| json!({}))
        } else {
            json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn get_with_token(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// POST a form encoded body with extra headers
    pub async fn post_form(
        &self,
        uri: impl AsRef<str>,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri.as_ref())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Access token from the client credentials grant, panics on failure
    pub async fn client_token(&self, client_id: &str, secret: &str, scope: &str) -> String {
        let response = self
            .post_form(
                "/token",
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id),
                    ("client_secret", secret),
                    ("scope", scope),
                ],
                &[],
            )
            .await;
        response.assert_ok();
        response.access_token()
    }

    /// Access token and refresh cookie value from the password grant with
    /// the web client, panics on failure
    pub async fn password_token(&self, username: &str, scope: &str) -> (String, String) {
        let response = self
            .post_form(
                "/token",
                &[
                    ("grant_type", "password"),
                    ("client_id", WEB_CLIENT),
                    ("username", username),
                    ("password", ALICE_PASSWORD),
                    ("scope", scope),
                ],
                &[],
            )
            .await;
        response.assert_ok();
        let cookie = response
            .refresh_cookie()
            .expect("password grant sets a refresh cookie");
        (response.access_token(), cookie)
    }

    /// A session for alice whose access token expired an hour ago, with a
    /// refresh token still bound to it
    pub async fn expired_session(&self, scope: &str) -> (String, String) {
        let alice = user(ALICE_ID, "alice", "alice@example.com", UserStatus::Approved);
        let context = UserContext::for_user(&alice, WEB_CLIENT, parse_scope_list(scope).unwrap());
        let claims = TokenClaims::builder(ClientContext::User(context))
            .issued_at(Utc::now() - Duration::hours(2))
            .lifetime(Duration::hours(1))
            .issuer(&self.state.config.signing.issuer)
            .grant_type(GrantType::Password)
            .grant_type(GrantType::RefreshToken)
            .build()
            .unwrap();
        let guard = self.state.call_guard();
        let token = self.state.tokens.issue(&claims, &guard).await.unwrap();
        let refresh = self
            .state
            .store
            .create_refresh_token(alice.id, claims.token_id(), 3600)
            .await
            .unwrap();
        (token.into_inner(), refresh.id.to_string())
    }

    /// Id token as the "google" provider would issue it
    pub fn id_token(&self, email: &str) -> String {
        let now = Utc::now().timestamp();
        let payload = json!({
            "iss": GOOGLE_ISSUER,
            "aud": GOOGLE_AUDIENCE,
            "iat": now,
            "exp": now + 600,
            "email": email,
            "email_verified": true,
        });
        encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(GOOGLE_SECRET.as_bytes()),
        )
        .unwrap()
    }
}

/// Response from a test request with its status, headers and JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response body")
    }

    pub fn access_token(&self) -> String {
        self.json["access_token"]
            .as_str()
            .expect("response carries an access token")
            .to_string()
    }

    /// Value of the refresh cookie set by this response
    pub fn refresh_cookie(&self) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| value.strip_prefix("refresh_token="))
            .and_then(|rest| rest.split(';').next())
            .map(str::to_string)
    }

    pub fn header(&self, name: http::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
