use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SecretString;

/// Console roles. The set is closed: an unknown role from the backend is a
/// deserialization error, not a fallback to some default role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Receptionist,
    Technician,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::Manager,
        Role::Receptionist,
        Role::Technician,
    ];

    /// Wire name, as the backend spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Receptionist => "RECEPTIONIST",
            Self::Technician => "TECHNICIAN",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Manager => "Manager",
            Self::Receptionist => "Receptionist",
            Self::Technician => "Technician",
        }
    }

    /// Roles that may change settings and manage other staff.
    pub fn is_administrative(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// The signed-in staff member, as returned by the login call and cached in
/// the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl UserIdentity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Up to two uppercase initials for the avatar placeholder.
    pub fn initials(&self) -> String {
        [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.is_empty() || roles.contains(&self.role)
    }
}

/// Username and password for the credential exchange.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}
