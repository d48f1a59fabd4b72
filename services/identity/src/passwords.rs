//! Password management
//!
//! Self-service password changes plus the mailed reset flow, which puts
//! the one-time-code ledger in front of the store's reset tokens.

use tracing::{info, warn};

use common::{PlatformError, PlatformResult};

use crate::mailer::Mailer;
use crate::models::User;
use crate::otp::{OtpLedger, Redemption};
use crate::store::CredentialStore;
use crate::validation::validate_password;

/// Password reset and change flows
#[derive(Clone)]
pub struct PasswordService<S, M> {
    store: S,
    otp: OtpLedger,
    mailer: M,
}

impl<S: CredentialStore, M: Mailer> PasswordService<S, M> {
    pub fn new(store: S, otp: OtpLedger, mailer: M) -> Self {
        Self { store, otp, mailer }
    }

    async fn find_account(&self, email: &str) -> PlatformResult<User> {
        match self.store.find_by_email(email).await? {
            Some(user) => Ok(user),
            None => Err(PlatformError::NotFound("user".to_string())),
        }
    }

    /// Mail a reset code to the account's address.
    pub async fn request_reset(&self, email: &str) -> PlatformResult<()> {
        let user = self.find_account(email).await?;
        let backing_token = self.store.generate_reset_token(user.id).await?;
        let code = self.otp.issue(&user.email, &backing_token).await;
        let body = format!(
            "Hello {},\n\nYour password reset code is {}. It expires in {} minutes.",
            user.username,
            code,
            self.otp.config().lifespan.num_minutes()
        );
        self.mailer
            .send(&user.email, "Password reset code", &body)
            .await?;

        info!("Issued a password reset code for {}", user.username);
        Ok(())
    }

    /// Trade a mailed reset code for the backing reset token.
    ///
    /// The code is consumed on its first matched attempt; the returned
    /// token is what `reset_password` expects.
    pub async fn redeem_reset_code(&self, email: &str, code: &str) -> PlatformResult<String> {
        let user = self.find_account(email).await?;
        let backing_token = match self.otp.redeem(email, code).await {
            Redemption::Valid(token) => token,
            Redemption::Expired => {
                return Err(PlatformError::InvalidToken(
                    "reset code expired, request a new one".to_string(),
                ));
            }
            Redemption::Invalid => {
                return Err(PlatformError::InvalidToken(
                    "reset code is not valid".to_string(),
                ));
            }
        };

        if !self.store.verify_reset_token(user.id, &backing_token).await? {
            return Err(PlatformError::InvalidToken(
                "reset token was not accepted".to_string(),
            ));
        }
        Ok(backing_token)
    }

    /// Set a new password using a redeemed reset token.
    pub async fn reset_password(
        &self,
        email: &str,
        backing_token: &str,
        new_password: &str,
    ) -> PlatformResult<()> {
        let user = self.find_account(email).await?;
        validate_password(new_password)?;

        if !self
            .store
            .reset_password(user.id, backing_token, new_password)
            .await?
        {
            return Err(PlatformError::InvalidToken(
                "reset token was not accepted".to_string(),
            ));
        }

        info!("{} reset their password", user.username);
        Ok(())
    }

    /// Change the password of a signed-in account.
    pub async fn change_password(
        &self,
        email: &str,
        current: &str,
        new_password: &str,
    ) -> PlatformResult<()> {
        let user = self.find_account(email).await?;
        if current == new_password {
            return Err(PlatformError::InvalidInput(
                "new password must differ from the current one".to_string(),
            ));
        }
        validate_password(new_password)?;

        if !self
            .store
            .change_password(user.id, current, new_password)
            .await?
        {
            warn!(
                "Password change rejected for {}: wrong current password",
                user.username
            );
            return Err(PlatformError::InvalidInput(
                "current password is wrong".to_string(),
            ));
        }

        info!("{} changed their password", user.username);
        Ok(())
    }
}
