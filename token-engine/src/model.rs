//! Records owned by the repository collaborators. The engine only reads them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    pub status: UserStatus,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved
    }
}

/// Stored refresh token record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    /// jti of the access token this refresh token is currently bound to
    pub jti: Uuid,
    pub user_id: Uuid,
    pub seconds_until_expiry: i64,
}

impl RefreshToken {
    pub fn is_expired(&self) -> bool {
        self.seconds_until_expiry <= 0
    }
}

/// Privilege tier of a registered application, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeClass {
    Standard,
    Trusted,
    Admin,
}

impl PrivilegeClass {
    pub const HIGHEST: PrivilegeClass = PrivilegeClass::Admin;

    pub fn is_highest_tier(self) -> bool {
        self == Self::HIGHEST
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    Web,
    Native,
    Service,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub client_id: String,
    pub name: String,
    pub application_type: ApplicationType,
    pub privilege_class: PrivilegeClass,
}

/// Identity asserted by an external identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub email: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}
