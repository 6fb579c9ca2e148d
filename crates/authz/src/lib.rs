//! Authorization primitives: roles, access tokens, and password hashing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod password;
pub mod token;

pub use token::{Claims, JwtAuthenticator};

/// Error type for authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("failed to issue access token: {0}")]
    Issue(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// Role tag carried by users and their access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Whether holding `self` satisfies a requirement for `required`.
    ///
    /// Administrators hold every user permission.
    pub fn grants(&self, required: Role) -> bool {
        match self {
            Role::Admin => true,
            Role::User => required == Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(Role::User),
            "ROLE_ADMIN" => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

/// Normalize a role set: every account is at least a user, no duplicates.
pub fn effective_roles(roles: &[Role]) -> Vec<Role> {
    let mut effective: Vec<Role> = roles.to_vec();
    effective.push(Role::User);
    effective.sort();
    effective.dedup();
    effective
}

/// Development signing secret. Never accepted in production.
pub const PLACEHOLDER_JWT_SECRET: &str = "change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "AuthSettings::default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthSettings::default_token_ttl_secs")]
    pub token_ttl_secs: i64,
}

impl AuthSettings {
    fn default_jwt_secret() -> String {
        PLACEHOLDER_JWT_SECRET.to_string()
    }

    /// Whether the signing secret is blank or the development placeholder.
    pub fn has_placeholder_secret(&self) -> bool {
        let secret = self.jwt_secret.trim();
        secret.is_empty() || secret == PLACEHOLDER_JWT_SECRET
    }

    fn default_token_ttl_secs() -> i64 {
        3600
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_jwt_secret(),
            token_ttl_secs: Self::default_token_ttl_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_parse_and_print() {
        assert_eq!(Role::Admin.to_string(), "ROLE_ADMIN");
        assert_eq!("ROLE_USER".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            "ROLE_ROOT".parse::<Role>(),
            Err(AuthError::UnknownRole(role)) if role == "ROLE_ROOT"
        ));
    }

    #[test]
    fn placeholder_secrets_are_recognised() {
        assert!(AuthSettings::default().has_placeholder_secret());

        let blank = AuthSettings {
            jwt_secret: "   ".to_string(),
            ..AuthSettings::default()
        };
        assert!(blank.has_placeholder_secret());

        let real = AuthSettings {
            jwt_secret: "9f2c1e7a-deployment-secret".to_string(),
            ..AuthSettings::default()
        };
        assert!(!real.has_placeholder_secret());
    }

    #[test]
    fn admin_grants_user() {
        assert!(Role::Admin.grants(Role::User));
        assert!(Role::Admin.grants(Role::Admin));
        assert!(Role::User.grants(Role::User));
        assert!(!Role::User.grants(Role::Admin));
    }

    #[test]
    fn effective_roles_always_include_user() {
        assert_eq!(effective_roles(&[]), vec![Role::User]);
        assert_eq!(
            effective_roles(&[Role::Admin, Role::User, Role::Admin]),
            vec![Role::User, Role::Admin]
        );
    }
}
