use serde::Deserialize;

/// How service routes authenticate their callers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InterceptorMode {
    /// Bearer token required, caller must be an admin-tier application
    #[default]
    Enforce,
    /// No check at all, for trusted internal deployments only
    Disabled,
}

/// Inbound credential interceptor configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InterceptorConfig {
    /// "enforce" (default) or "disabled"
    #[serde(default)]
    pub mode: InterceptorMode,
}
