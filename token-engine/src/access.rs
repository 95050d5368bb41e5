//! Access-level masks attached to policy grants and scopes.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered permission tier carried by a scope.
///
/// The declaration order is the permission order (`Deny < Read < Write`),
/// so new tiers can be inserted without touching callers of [`AccessLevel::allows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessLevel {
    Deny,
    Read,
    Write,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 3] = [AccessLevel::Deny, AccessLevel::Read, AccessLevel::Write];

    /// Parse a level name, ignoring case
    pub fn from_value(value: &str) -> Result<Self, AuthError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DENY" => Ok(Self::Deny),
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            _ => Err(AuthError::UnknownAccessLevel(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deny => "DENY",
            Self::Read => "READ",
            Self::Write => "WRITE",
        }
    }

    /// Whether a grant at level `have` satisfies a request for level `want`.
    ///
    /// `Deny` only ever matches `Deny`: a denied grant allows nothing else and a
    /// request for `Deny` is satisfied by nothing but a `Deny` grant.
    pub fn allows(have: AccessLevel, want: AccessLevel) -> bool {
        match (have, want) {
            (AccessLevel::Deny, want) => want == AccessLevel::Deny,
            (_, AccessLevel::Deny) => false,
            (have, want) => have >= want,
        }
    }

    /// Method form of [`AccessLevel::allows`]
    pub fn grants(self, want: AccessLevel) -> bool {
        Self::allows(self, want)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(s)
    }
}

/// Mask stored on a policy grant.
///
/// Unlike [`AccessLevel`], a `Deny` policy mask grants nothing at all, not
/// even a request for `Deny`. `None` is the absence of a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAccess {
    None,
    Deny,
    Read,
    Write,
}

impl PolicyAccess {
    pub fn from_value(value: &str) -> Result<Self, AuthError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "deny" => Ok(Self::Deny),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(AuthError::UnknownAccessLevel(value.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deny => "deny",
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    /// Strict grant check: `None` and `Deny` grant nothing
    pub fn grants(self, want: AccessLevel) -> bool {
        match self {
            Self::None | Self::Deny => false,
            other => AccessLevel::allows(other.into(), want),
        }
    }
}

impl From<PolicyAccess> for AccessLevel {
    fn from(mask: PolicyAccess) -> Self {
        match mask {
            PolicyAccess::None | PolicyAccess::Deny => AccessLevel::Deny,
            PolicyAccess::Read => AccessLevel::Read,
            PolicyAccess::Write => AccessLevel::Write,
        }
    }
}

impl fmt::Display for PolicyAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyAccess {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(s)
    }
}
