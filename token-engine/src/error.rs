use crate::scope::ScopeName;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised by the repository collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record changed concurrently: {0}")]
    Conflict(String),

    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Every failure the engine can report.
///
/// Credential failures (`InvalidSignature`, `MalformedToken`, `ExpiredCredential`,
/// `Unauthenticated`) must be presented to callers as one generic
/// unauthenticated status. The detail is for server-side logs only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Malformed scope: {0}")]
    MalformedScope(String),

    #[error("Unknown access level: {0}")]
    UnknownAccessLevel(String),

    #[error("No user supplied with the request")]
    MissingUser,

    #[error("No scope supplied with the request")]
    MissingScope,

    #[error("Access denied, missing scopes: {}", render_scopes(.missing))]
    AccessDenied { missing: BTreeSet<ScopeName> },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Expired credential: {0}")]
    ExpiredCredential(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Collaborator call timed out")]
    Timeout,

    #[error("Operation cancelled by the caller")]
    Cancelled,
}

impl AuthError {
    /// True for every error that means "the credential itself is not acceptable"
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidSignature
                | Self::MalformedToken(_)
                | Self::ExpiredCredential(_)
                | Self::Unauthenticated
        )
    }
}

fn render_scopes(scopes: &BTreeSet<ScopeName>) -> String {
    scopes
        .iter()
        .map(ScopeName::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
