use bookshelf_authz::{effective_roles, Role};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An account able to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Stored roles; `ROLE_USER` is implied and not always present here.
    pub roles: Vec<Role>,
    pub password_hash: String,
}

impl User {
    /// Stored roles plus the implied `ROLE_USER`.
    pub fn roles(&self) -> Vec<Role> {
        effective_roles(&self.roles)
    }
}

/// Row shape of `users`, with roles kept as a JSON array of role names.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    id: i64,
    email: String,
    roles: String,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles: Vec<Role> = serde_json::from_str(&row.roles)
            .map_err(|err| anyhow::anyhow!("user {} has unreadable roles: {err}", row.id))?;
        Ok(Self {
            id: row.id,
            email: row.email,
            roles,
            password_hash: row.password_hash,
        })
    }
}

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// What a user may see about their own account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub roles: Vec<Role>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            roles: user.roles(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(roles: &str) -> UserRow {
        UserRow {
            id: 1,
            email: "admin@bookapi.com".to_string(),
            roles: roles.to_string(),
            password_hash: "$argon2id$...".to_string(),
        }
    }

    #[test]
    fn roles_column_parses_role_names() {
        let user = User::try_from(row(r#"["ROLE_ADMIN"]"#)).unwrap();

        assert_eq!(user.roles, vec![Role::Admin]);
        assert_eq!(user.roles(), vec![Role::User, Role::Admin]);
    }

    #[test]
    fn unknown_role_in_store_is_an_error() {
        let err = User::try_from(row(r#"["ROLE_ROOT"]"#)).unwrap_err();
        assert!(err.to_string().contains("unreadable roles"));
    }

    #[test]
    fn view_hides_password_hash() {
        let user = User::try_from(row("[]")).unwrap();

        let json = serde_json::to_value(UserView::from(&user)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 1, "email": "admin@bookapi.com", "roles": ["ROLE_USER"]})
        );
    }
}
