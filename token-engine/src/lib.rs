//! # token-engine
//!
//! Token and scope authorization engine.
//!
//! ## Components
//!
//! - **Access:** ordered access-level masks and the allow relation between them.
//! - **Scope:** `<policy>.<LEVEL>` scope identifiers.
//! - **Claims:** typed token claims with a user or application context.
//! - **Resolver:** checks requested scopes against a principal's grants.
//! - **Token:** signs and verifies tokens through a pluggable signer.
//! - **Identity:** verifiers for id tokens issued by external providers.
//! - **Refresh:** validation of a refresh exchange against stored state.
//!
//! Persistence and key storage are collaborators described by the traits in
//! [`repository`] and [`token::TokenSigner`].

pub mod access;
pub mod claims;
pub mod error;
pub mod guard;
pub mod identity;
pub mod model;
pub mod refresh;
pub mod repository;
pub mod resolver;
pub mod scope;
pub mod token;

pub use access::{AccessLevel, PolicyAccess};
pub use claims::{
    ApplicationContext, ClientContext, GrantType, TokenClaims, TokenClaimsBuilder, UserContext,
};
pub use error::{AuthError, RepositoryError};
pub use guard::CallGuard;
pub use identity::{IdentityProviderConfig, IdentityVerifier, IdentityVerifiers, JwtIdentityVerifier};
pub use model::{
    Application, ApplicationType, IdentityClaims, PrivilegeClass, RefreshToken, User, UserStatus,
};
pub use refresh::{RefreshContext, ValidatedRefresh, parse_refresh_cookie};
pub use repository::{ApplicationStore, GrantedScopeSource, RefreshTokenStore, UserStore};
pub use resolver::ScopeResolver;
pub use scope::{ScopeName, parse_scope_list, render_scope_list};
pub use token::{JwtSigner, SignedToken, SigningKey, SigningProfile, TokenService, TokenSigner};
