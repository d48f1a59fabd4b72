//! Session lifecycle orchestration
//!
//! Walks an account through registration, email confirmation, login and
//! logout, tying the credential store, token authority, one-time-code
//! ledger and mailer together.

use chrono::Utc;
use tracing::{info, warn};

use common::{PlatformError, PlatformResult};

use crate::authz::{Decision, authorize_grant_at_registration};
use crate::cookies::{LogoutReceipt, clear_session_cookies};
use crate::mailer::Mailer;
use crate::models::{
    Actor, AuthResponse, ConfirmEmailOutcome, NewUser, RegistrationReceipt, ResendOutcome, Role,
    User,
};
use crate::otp::{OtpLedger, Redemption};
use crate::store::CredentialStore;
use crate::tokens::TokenService;
use crate::validation::{validate_email, validate_password, validate_username};

/// Session manager for the account lifecycle
#[derive(Clone)]
pub struct SessionManager<S, M> {
    store: S,
    tokens: TokenService<S>,
    otp: OtpLedger,
    mailer: M,
}

impl<S: CredentialStore, M: Mailer> SessionManager<S, M> {
    /// Create a new session manager over the given collaborators
    pub fn new(store: S, tokens: TokenService<S>, otp: OtpLedger, mailer: M) -> Self {
        Self {
            store,
            tokens,
            otp,
            mailer,
        }
    }

    /// Create an account and mail its confirmation code.
    ///
    /// Privileged roles can only be granted when the acting account is a
    /// super administrator; the check runs against the caller's role, not
    /// the one being requested. No session is opened here, the account
    /// still has to confirm its email and log in.
    pub async fn register(
        &self,
        input: NewUser,
        requested_role: Role,
        actor: Option<&Actor>,
    ) -> PlatformResult<RegistrationReceipt> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;
        validate_password(&input.password)?;

        let grant = authorize_grant_at_registration(actor.map(|a| a.role), requested_role);
        if let Decision::Deny(reason) = grant {
            warn!(
                "Registration of {} as {} denied: {}",
                input.username, requested_role, reason
            );
            return Err(PlatformError::ForbiddenAccess(reason.to_string()));
        }

        let user = self.store.create(&input, requested_role).await?;
        self.send_confirmation_code(&user).await?;

        info!("Registered {} as {}", user.username, user.role);
        Ok(RegistrationReceipt {
            email: user.email,
            username: user.username,
            role: user.role,
            message: "a verification code has been sent to your email address".to_string(),
        })
    }

    /// Open a session for a confirmed account.
    ///
    /// The identifier may be a username or an email address. Missing
    /// accounts, soft-deleted accounts and wrong passwords all fail with
    /// the same error so callers cannot probe which accounts exist.
    /// Logging in again while a refresh token is still active hands back
    /// that token instead of minting a second one.
    pub async fn login(&self, identifier: &str, password: &str) -> PlatformResult<AuthResponse> {
        let user = match self.store.find_by_username(identifier).await? {
            Some(user) => Some(user),
            None => self.store.find_by_email(identifier).await?,
        };
        let Some(mut user) = user else {
            warn!("Login rejected: no account matches the identifier");
            return Err(PlatformError::InvalidCredentials);
        };
        if !self.store.check_password(user.id, password).await? {
            warn!("Login rejected for {}: wrong password", user.username);
            return Err(PlatformError::InvalidCredentials);
        }
        if !user.email_confirmed {
            warn!("Login rejected for {}: email not confirmed", user.username);
            return Err(PlatformError::EmailNotConfirmed);
        }

        user.is_active = true;
        let now = Utc::now();
        let refresh = match user.active_refresh_token(now) {
            Some(existing) => existing.clone(),
            None => {
                user.prune_inactive_tokens(now);
                let minted = self.tokens.generate_refresh_token();
                user.refresh_tokens.push(minted.clone());
                minted
            }
        };
        let user = self.store.update(&user).await?;

        info!("{} signed in", user.username);
        self.tokens.session_response(&user, &refresh)
    }

    /// Close the actor's session.
    ///
    /// The presented refresh token is revoked strictly: a token that is
    /// unknown or already dead fails the whole logout, since that points
    /// at a stale or forged attempt. On success the account is marked
    /// inactive and the caller receives the cookie directives that clear
    /// the session.
    pub async fn logout(&self, actor: &Actor, refresh_token: &str) -> PlatformResult<LogoutReceipt> {
        self.tokens.revoke(refresh_token).await?;

        let Some(mut user) = self.store.find_by_id(actor.id).await? else {
            return Err(PlatformError::NotFound("user".to_string()));
        };
        user.is_active = false;
        self.store.update(&user).await?;

        info!("{} signed out", actor.username);
        Ok(LogoutReceipt {
            cookies: clear_session_cookies(),
        })
    }

    /// Redeem a mailed confirmation code and flip the email flag.
    ///
    /// The code is consumed on its first matched attempt whatever happens
    /// afterwards. An account that is already confirmed reports
    /// [`ConfirmEmailOutcome::AlreadyConfirmed`] instead of failing.
    pub async fn confirm_email(
        &self,
        email: &str,
        code: &str,
    ) -> PlatformResult<ConfirmEmailOutcome> {
        let backing_token = match self.otp.redeem(email, code).await {
            Redemption::Valid(token) => token,
            Redemption::Expired => {
                return Err(PlatformError::InvalidToken(
                    "verification code expired, request a new one".to_string(),
                ));
            }
            Redemption::Invalid => {
                return Err(PlatformError::InvalidToken(
                    "verification code is not valid".to_string(),
                ));
            }
        };

        let Some(user) = self.store.find_by_email(email).await? else {
            return Err(PlatformError::NotFound("user".to_string()));
        };
        if user.email_confirmed {
            return Ok(ConfirmEmailOutcome::AlreadyConfirmed);
        }
        if !self.store.confirm_email(user.id, &backing_token).await? {
            return Err(PlatformError::InvalidToken(
                "verification token was not accepted".to_string(),
            ));
        }

        info!("{} confirmed their email address", user.username);
        Ok(ConfirmEmailOutcome::Confirmed)
    }

    /// Mail a fresh confirmation code, invalidating any previous one.
    pub async fn resend_confirmation(&self, email: &str) -> PlatformResult<ResendOutcome> {
        let Some(user) = self.store.find_by_email(email).await? else {
            return Err(PlatformError::NotFound("user".to_string()));
        };
        if user.email_confirmed {
            return Ok(ResendOutcome::AlreadyConfirmed);
        }

        self.send_confirmation_code(&user).await?;
        info!("Resent confirmation code to {}", user.username);
        Ok(ResendOutcome::Sent)
    }

    async fn send_confirmation_code(&self, user: &User) -> PlatformResult<()> {
        let backing_token = self.store.generate_confirmation_token(user.id).await?;
        let code = self.otp.issue(&user.email, &backing_token).await;
        let body = format!(
            "Hello {},\n\nYour verification code is {}. It expires in {} minutes.",
            user.username,
            code,
            self.otp.config().lifespan.num_minutes()
        );
        self.mailer
            .send(&user.email, "Email verification code", &body)
            .await
    }
}
