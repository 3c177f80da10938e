//! User, login and persisted-user models.

use serde::{Deserialize, Serialize};

use crate::authz::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Raw wire role; see [`User::role`].
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// `ACTIVE`, `BLOCKED` or `SUSPENDED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
            image: None,
            phone: None,
            status: None,
            is_active: None,
            created_at: None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

/// The `userData` value kept in the local backing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub token: String,
}

impl UserSnapshot {
    pub fn from_user(user: &User, token: &str) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            token: token.to_string(),
        }
    }

    pub fn into_user(self) -> User {
        User::new(self.id, self.name, self.email, self.role)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `data` payload of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}
