//! Credential-store boundary
//!
//! Persistence for user records lives behind this trait. All operations are
//! async; lookups used for authentication or mutation apply the
//! active-users-only predicate, so a soft-deleted account is invisible to
//! every flow in this crate.

use uuid::Uuid;

use common::PlatformResult;

use crate::models::{NewUser, Role, User};

pub mod memory;

/// Persistence boundary for platform accounts.
///
/// `update` is version-checked: writing a record whose `version` no longer
/// matches the stored one fails with [`common::PlatformError::Conflict`]
/// instead of overwriting. Every successful write bumps the stamp.
///
/// The confirmation/reset "backing tokens" are store-native opaque secrets;
/// only their issue/verify/apply primitives are exposed here. The password
/// hash itself never crosses this boundary.
pub trait CredentialStore: Send + Sync {
    /// Create an account with a freshly hashed password.
    ///
    /// Uniqueness of email and username is enforced in here, against all
    /// records including soft-deleted ones, so check-then-create cannot
    /// race.
    fn create(
        &self,
        input: &NewUser,
        role: Role,
    ) -> impl Future<Output = PlatformResult<User>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = PlatformResult<Option<User>>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = PlatformResult<Option<User>>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = PlatformResult<Option<User>>> + Send;

    /// Rotation lookup: the account holding `token` among its refresh
    /// tokens, active accounts only.
    fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> impl Future<Output = PlatformResult<Option<User>>> + Send;

    /// Version-checked write; returns the stored record with its bumped
    /// stamp.
    fn update(&self, user: &User) -> impl Future<Output = PlatformResult<User>> + Send;

    /// Check a plaintext password against the stored hash. Unknown or
    /// soft-deleted accounts simply fail the check.
    fn check_password(
        &self,
        id: Uuid,
        password: &str,
    ) -> impl Future<Output = PlatformResult<bool>> + Send;

    /// Authenticated password change; `false` means the current password
    /// was wrong.
    fn change_password(
        &self,
        id: Uuid,
        current: &str,
        new_password: &str,
    ) -> impl Future<Output = PlatformResult<bool>> + Send;

    /// Mint the opaque token that backs email confirmation. Re-issuing
    /// replaces any previous one.
    fn generate_confirmation_token(
        &self,
        id: Uuid,
    ) -> impl Future<Output = PlatformResult<String>> + Send;

    /// Apply a confirmation backing token; `false` means it was not the
    /// current one. Flips `email_confirmed` on success.
    fn confirm_email(
        &self,
        id: Uuid,
        backing_token: &str,
    ) -> impl Future<Output = PlatformResult<bool>> + Send;

    /// Mint the opaque token that backs a password reset.
    fn generate_reset_token(
        &self,
        id: Uuid,
    ) -> impl Future<Output = PlatformResult<String>> + Send;

    /// Non-consuming validity check for a reset backing token.
    fn verify_reset_token(
        &self,
        id: Uuid,
        token: &str,
    ) -> impl Future<Output = PlatformResult<bool>> + Send;

    /// Apply a reset backing token and replace the stored hash; `false`
    /// means the token was rejected.
    fn reset_password(
        &self,
        id: Uuid,
        token: &str,
        new_password: &str,
    ) -> impl Future<Output = PlatformResult<bool>> + Send;
}
