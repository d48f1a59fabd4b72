//! In-memory credential store
//!
//! Reference implementation of [`CredentialStore`]: a shared map behind a
//! lock, argon2 password hashing, opaque backing tokens, and
//! version-checked writes. Backs the test suite and any embedding that
//! brings no persistence of its own.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use common::{PlatformError, PlatformResult};

use super::CredentialStore;
use crate::models::{NewUser, Role, User};

/// Everything the store holds per account beyond the circulating record.
#[derive(Debug, Clone)]
struct AccountRecord {
    user: User,
    password_hash: String,
    confirmation_token: Option<String>,
    reset_token: Option<String>,
}

/// Shared-map credential store. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    accounts: Arc<Mutex<HashMap<Uuid, AccountRecord>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active-users-only lookup shared by every find.
    async fn find_where<F>(&self, pred: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        let accounts = self.accounts.lock().await;
        accounts
            .values()
            .find(|record| !record.user.is_deleted && pred(&record.user))
            .map(|record| record.user.clone())
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, input: &NewUser, role: Role) -> PlatformResult<User> {
        let mut accounts = self.accounts.lock().await;

        // Uniqueness sees soft-deleted records too: a deleted account's
        // email or username cannot be silently re-registered.
        if accounts
            .values()
            .any(|r| r.user.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(PlatformError::DuplicateValue(format!(
                "email {} is already registered",
                input.email
            )));
        }
        if accounts
            .values()
            .any(|r| r.user.username.eq_ignore_ascii_case(&input.username))
        {
            return Err(PlatformError::DuplicateValue(format!(
                "username {} is already taken",
                input.username
            )));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User {
            id: Uuid::new_v4(),
            username: input.username.clone(),
            email: input.email.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            role,
            email_confirmed: false,
            is_deleted: false,
            is_active: false,
            refresh_tokens: Vec::new(),
            created_on: Utc::now(),
            version: 0,
        };
        accounts.insert(
            user.id,
            AccountRecord {
                user: user.clone(),
                password_hash,
                confirmation_token: None,
                reset_token: None,
            },
        );
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> PlatformResult<Option<User>> {
        Ok(self.find_where(|user| user.id == id).await)
    }

    async fn find_by_email(&self, email: &str) -> PlatformResult<Option<User>> {
        Ok(self
            .find_where(|user| user.email.eq_ignore_ascii_case(email))
            .await)
    }

    async fn find_by_username(&self, username: &str) -> PlatformResult<Option<User>> {
        Ok(self
            .find_where(|user| user.username.eq_ignore_ascii_case(username))
            .await)
    }

    async fn find_by_refresh_token(&self, token: &str) -> PlatformResult<Option<User>> {
        Ok(self
            .find_where(|user| user.refresh_tokens.iter().any(|t| t.token == token))
            .await)
    }

    async fn update(&self, user: &User) -> PlatformResult<User> {
        let mut accounts = self.accounts.lock().await;
        let record = accounts
            .get_mut(&user.id)
            .ok_or_else(|| PlatformError::NotFound("user".to_string()))?;

        if record.user.version != user.version {
            return Err(PlatformError::Conflict);
        }
        let mut stored = user.clone();
        stored.version += 1;
        record.user = stored.clone();
        Ok(stored)
    }

    async fn check_password(&self, id: Uuid, password: &str) -> PlatformResult<bool> {
        let accounts = self.accounts.lock().await;
        match accounts.get(&id) {
            Some(record) if !record.user.is_deleted => {
                verify_password(&record.password_hash, password)
            }
            _ => Ok(false),
        }
    }

    async fn change_password(
        &self,
        id: Uuid,
        current: &str,
        new_password: &str,
    ) -> PlatformResult<bool> {
        let mut accounts = self.accounts.lock().await;
        let record = active_record_mut(&mut accounts, id)?;
        if !verify_password(&record.password_hash, current)? {
            return Ok(false);
        }
        record.password_hash = hash_password(new_password)?;
        Ok(true)
    }

    async fn generate_confirmation_token(&self, id: Uuid) -> PlatformResult<String> {
        let mut accounts = self.accounts.lock().await;
        let record = active_record_mut(&mut accounts, id)?;
        let token = opaque_token();
        record.confirmation_token = Some(token.clone());
        Ok(token)
    }

    async fn confirm_email(&self, id: Uuid, backing_token: &str) -> PlatformResult<bool> {
        let mut accounts = self.accounts.lock().await;
        let record = active_record_mut(&mut accounts, id)?;
        if record.confirmation_token.as_deref() != Some(backing_token) {
            return Ok(false);
        }
        record.confirmation_token = None;
        record.user.email_confirmed = true;
        record.user.version += 1;
        Ok(true)
    }

    async fn generate_reset_token(&self, id: Uuid) -> PlatformResult<String> {
        let mut accounts = self.accounts.lock().await;
        let record = active_record_mut(&mut accounts, id)?;
        let token = opaque_token();
        record.reset_token = Some(token.clone());
        Ok(token)
    }

    async fn verify_reset_token(&self, id: Uuid, token: &str) -> PlatformResult<bool> {
        let accounts = self.accounts.lock().await;
        match accounts.get(&id) {
            Some(record) if !record.user.is_deleted => {
                Ok(record.reset_token.as_deref() == Some(token))
            }
            _ => Ok(false),
        }
    }

    async fn reset_password(
        &self,
        id: Uuid,
        token: &str,
        new_password: &str,
    ) -> PlatformResult<bool> {
        let mut accounts = self.accounts.lock().await;
        let record = active_record_mut(&mut accounts, id)?;
        if record.reset_token.as_deref() != Some(token) {
            return Ok(false);
        }
        record.reset_token = None;
        record.password_hash = hash_password(new_password)?;
        Ok(true)
    }
}

fn active_record_mut(
    accounts: &mut HashMap<Uuid, AccountRecord>,
    id: Uuid,
) -> PlatformResult<&mut AccountRecord> {
    match accounts.get_mut(&id) {
        Some(record) if !record.user.is_deleted => Ok(record),
        _ => Err(PlatformError::NotFound("user".to_string())),
    }
}

fn hash_password(password: &str) -> PlatformResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            PlatformError::Storage(format!("Failed to hash password: {e}"))
        })?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> PlatformResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!("Stored password hash is invalid: {}", e);
        PlatformError::Storage(format!("Stored password hash is invalid: {e}"))
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// 32 random bytes, standard base64 — same shape as a refresh token.
fn opaque_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
