//! Account administration
//!
//! Profile updates, role changes and soft deletion, all gated by the
//! authorization rules in [`crate::authz`].

use tracing::{info, warn};

use common::{PlatformError, PlatformResult};

use crate::authz::{AccountOperation, Decision, authorize};
use crate::models::{Actor, ProfileUpdate, Role, UpdatedProfile, User};
use crate::store::CredentialStore;
use crate::tokens::TokenService;
use crate::validation::require_filled;

/// Administrative operations over existing accounts
#[derive(Clone)]
pub struct AccountService<S> {
    store: S,
    tokens: TokenService<S>,
}

impl<S: CredentialStore> AccountService<S> {
    pub fn new(store: S, tokens: TokenService<S>) -> Self {
        Self { store, tokens }
    }

    async fn find_target(&self, username: &str) -> PlatformResult<User> {
        match self.store.find_by_username(username).await? {
            Some(user) => Ok(user),
            None => Err(PlatformError::NotFound("user".to_string())),
        }
    }

    /// Soft-delete an account.
    ///
    /// Deleting your own account takes your password as confirmation and,
    /// when a refresh token is supplied, closes that session on the way
    /// out. The record stays behind with `is_deleted` set, so its email
    /// and username remain reserved.
    pub async fn delete_account(
        &self,
        actor: &Actor,
        target_username: &str,
        password: Option<&str>,
        refresh_token: Option<&str>,
    ) -> PlatformResult<()> {
        let mut target = self.find_target(target_username).await?;
        let is_self = actor.id == target.id;

        let verdict = authorize(actor.role, target.role, AccountOperation::Delete, is_self);
        if let Decision::Deny(reason) = verdict {
            warn!(
                "{} may not delete {}: {}",
                actor.username, target.username, reason
            );
            return Err(PlatformError::ForbiddenAccess(reason.to_string()));
        }

        if is_self {
            let Some(password) = password else {
                return Err(PlatformError::InvalidInput(
                    "password confirmation is required to delete your own account".to_string(),
                ));
            };
            if !self.store.check_password(target.id, password).await? {
                return Err(PlatformError::InvalidInput(
                    "password confirmation failed".to_string(),
                ));
            }

            // Close the session first; once the record is flagged deleted
            // the token can no longer be resolved.
            if let Some(token) = refresh_token {
                match self.tokens.revoke(token).await {
                    Ok(_) => target = self.find_target(target_username).await?,
                    Err(e) => warn!("Session cleanup before self-deletion failed: {}", e),
                }
            }
        }

        target.is_deleted = true;
        target.is_active = false;
        self.store.update(&target).await?;

        info!(
            "{} deleted the account of {}",
            actor.username, target.username
        );
        Ok(())
    }

    /// Edit the target's name fields. Both fields are required and
    /// replace whatever the profile held before.
    pub async fn update_profile(
        &self,
        actor: &Actor,
        target_username: &str,
        update: ProfileUpdate,
    ) -> PlatformResult<UpdatedProfile> {
        require_filled("first name", &update.first_name)?;
        require_filled("last name", &update.last_name)?;

        let mut target = self.find_target(target_username).await?;
        let is_self = actor.id == target.id;

        let verdict = authorize(actor.role, target.role, AccountOperation::Update, is_self);
        if let Decision::Deny(reason) = verdict {
            warn!(
                "{} may not update {}: {}",
                actor.username, target.username, reason
            );
            return Err(PlatformError::ForbiddenAccess(reason.to_string()));
        }

        target.first_name = Some(update.first_name);
        target.last_name = Some(update.last_name);
        let target = self.store.update(&target).await?;

        info!(
            "{} updated the profile of {}",
            actor.username, target.username
        );
        Ok(UpdatedProfile {
            username: target.username,
            first_name: target.first_name.unwrap_or_default(),
            last_name: target.last_name.unwrap_or_default(),
        })
    }

    /// Replace the target's role. An account holds exactly one role, so
    /// switching replaces it rather than stacking.
    pub async fn change_role(
        &self,
        actor: &Actor,
        target_username: &str,
        new_role: Role,
    ) -> PlatformResult<User> {
        let mut target = self.find_target(target_username).await?;
        let is_self = actor.id == target.id;

        let verdict = authorize(
            actor.role,
            target.role,
            AccountOperation::ChangeRole(new_role),
            is_self,
        );
        if let Decision::Deny(reason) = verdict {
            warn!(
                "{} may not change the role of {}: {}",
                actor.username, target.username, reason
            );
            return Err(PlatformError::ForbiddenAccess(reason.to_string()));
        }
        if target.role == new_role {
            return Err(PlatformError::DuplicateValue(format!(
                "user already holds the {new_role} role"
            )));
        }

        target.role = new_role;
        let target = self.store.update(&target).await?;

        info!(
            "{} set the role of {} to {}",
            actor.username, target.username, target.role
        );
        Ok(target)
    }
}
