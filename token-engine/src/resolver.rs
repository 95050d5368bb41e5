//! Resolution of requested scopes against a principal's grants.

use crate::access::AccessLevel;
use crate::error::AuthError;
use crate::guard::CallGuard;
use crate::repository::GrantedScopeSource;
use crate::scope::ScopeName;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Stateless service deciding whether a principal may obtain a scope set
#[derive(Clone)]
pub struct ScopeResolver {
    grants: Arc<dyn GrantedScopeSource>,
}

impl ScopeResolver {
    pub fn new(grants: Arc<dyn GrantedScopeSource>) -> Self {
        Self { grants }
    }

    /// Requested scopes that the principal's grants do not cover.
    ///
    /// An empty result means the request is fully satisfied.
    pub async fn missing_scopes(
        &self,
        principal: &str,
        requested: &BTreeSet<ScopeName>,
        guard: &CallGuard,
    ) -> Result<BTreeSet<ScopeName>, AuthError> {
        if requested.is_empty() {
            return Err(AuthError::MissingScope);
        }

        let granted = guard
            .run(
                "granted scope lookup",
                self.grants.find_granted_scopes_for_principal(principal),
            )
            .await?;
        let effective = effective_levels(granted.iter());

        let missing: BTreeSet<ScopeName> = requested
            .iter()
            .filter(|scope| {
                effective
                    .get(scope.policy_name())
                    .is_none_or(|have| !AccessLevel::allows(*have, scope.access_level()))
            })
            .cloned()
            .collect();

        debug!(
            "Principal '{}' requested {} scopes, {} missing",
            principal,
            requested.len(),
            missing.len()
        );
        Ok(missing)
    }

    /// Validate a token request: a username must be present and every
    /// requested scope must be covered.
    pub async fn authorize(
        &self,
        username: Option<&str>,
        requested: &BTreeSet<ScopeName>,
        guard: &CallGuard,
    ) -> Result<(), AuthError> {
        let username = username
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(AuthError::MissingUser)?;

        let missing = self.missing_scopes(username, requested, guard).await?;
        if !missing.is_empty() {
            info!(
                "Denying scopes for '{}': {} not granted",
                username,
                missing.len()
            );
            return Err(AuthError::AccessDenied { missing });
        }
        Ok(())
    }
}

/// Fold grants into one level per policy. A `Deny` grant overrides every other
/// grant on the same policy, otherwise the highest level wins.
fn effective_levels<'a>(
    granted: impl Iterator<Item = &'a ScopeName>,
) -> HashMap<&'a str, AccessLevel> {
    let mut levels: HashMap<&str, AccessLevel> = HashMap::new();
    for scope in granted {
        levels
            .entry(scope.policy_name())
            .and_modify(|level| {
                *level = match (*level, scope.access_level()) {
                    (AccessLevel::Deny, _) | (_, AccessLevel::Deny) => AccessLevel::Deny,
                    (current, next) => current.max(next),
                }
            })
            .or_insert(scope.access_level());
    }
    levels
}
