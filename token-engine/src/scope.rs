//! `<policyName>.<LEVEL>` scope identifiers.

use crate::access::AccessLevel;
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A `(policy, access level)` pair.
///
/// Compared and hashed structurally, never by string, so `study.read` and
/// `study.READ` are the same scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeName {
    policy_name: String,
    access_level: AccessLevel,
}

impl ScopeName {
    pub fn new(policy_name: impl Into<String>, access_level: AccessLevel) -> Self {
        Self {
            policy_name: policy_name.into(),
            access_level,
        }
    }

    /// Parse a scope, splitting on the last `.` since policy names may contain dots
    pub fn parse(text: &str) -> Result<Self, AuthError> {
        let text = text.trim();
        let (policy, level) = text
            .rsplit_once('.')
            .ok_or_else(|| AuthError::MalformedScope(text.to_string()))?;

        if policy.is_empty() {
            return Err(AuthError::MalformedScope(text.to_string()));
        }

        Ok(Self::new(policy, AccessLevel::from_value(level)?))
    }

    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.policy_name, self.access_level)
    }
}

impl FromStr for ScopeName {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ScopeName {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScopeName> for String {
    fn from(scope: ScopeName) -> Self {
        scope.to_string()
    }
}

/// Parse an OAuth style space-separated scope parameter
pub fn parse_scope_list(text: &str) -> Result<BTreeSet<ScopeName>, AuthError> {
    text.split_whitespace().map(ScopeName::parse).collect()
}

/// Render a scope set as a space-separated OAuth scope parameter
pub fn render_scope_list<'a>(scopes: impl IntoIterator<Item = &'a ScopeName>) -> String {
    scopes
        .into_iter()
        .map(ScopeName::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
