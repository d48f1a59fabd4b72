//! User model and registration payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;
use super::token::RefreshToken;

/// A platform account as it circulates outside the credential store.
///
/// The password hash never leaves the store; verification goes through
/// the store's `check_password`. `version` is the concurrency stamp the
/// store bumps on every successful update — writing a stale copy fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub email_confirmed: bool,
    pub is_deleted: bool,
    pub is_active: bool,
    pub refresh_tokens: Vec<RefreshToken>,
    pub created_on: DateTime<Utc>,
    pub version: u64,
}

impl User {
    /// The single active refresh token, if any.
    pub fn active_refresh_token(&self, now: DateTime<Utc>) -> Option<&RefreshToken> {
        self.refresh_tokens.iter().find(|t| t.is_active(now))
    }

    pub fn refresh_token_mut(&mut self, token: &str) -> Option<&mut RefreshToken> {
        self.refresh_tokens.iter_mut().find(|t| t.token == token)
    }

    /// Garbage-collect every refresh token that is no longer active.
    pub fn prune_inactive_tokens(&mut self, now: DateTime<Utc>) {
        self.refresh_tokens.retain(|t| t.is_active(now));
    }
}

/// Registration payload accepted by the session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Profile fields an account holder (or a higher-ranked actor) may edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
}

/// The authenticated caller, passed explicitly to every orchestration
/// function instead of being read off an ambient principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}
