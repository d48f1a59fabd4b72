//! Token authority for access and refresh tokens
//!
//! Issues short-lived HS256 access tokens, mints opaque refresh tokens,
//! and handles rotation and revocation against the credential store.

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use percent_encoding::percent_decode_str;
use rand::RngCore;
use rand::rngs::OsRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use common::{PlatformError, PlatformResult};

use crate::models::{AuthResponse, RefreshToken, Role, User};
use crate::store::CredentialStore;

static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

/// Token configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying access tokens
    pub signing_key: String,
    /// Value of the `iss` claim
    pub issuer: String,
    /// Value of the `aud` claim
    pub audience: String,
    /// Access token lifetime in minutes (default: 30)
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days (default: 7)
    pub refresh_token_days: i64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SIGNING_KEY`: Shared secret for signing tokens (required)
    /// - `JWT_ISSUER`: Issuer claim value (default: "blog-platform")
    /// - `JWT_AUDIENCE`: Audience claim value (default: "blog-platform")
    /// - `JWT_ACCESS_TOKEN_MINUTES`: Access token lifetime in minutes (default: 30)
    /// - `JWT_REFRESH_TOKEN_DAYS`: Refresh token lifetime in days (default: 7)
    pub fn from_env() -> Result<Self> {
        let signing_key = std::env::var("JWT_SIGNING_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_SIGNING_KEY environment variable not set"))?;

        let issuer =
            std::env::var("JWT_ISSUER").unwrap_or_else(|_| "blog-platform".to_string());
        let audience =
            std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "blog-platform".to_string());

        let access_token_minutes = std::env::var("JWT_ACCESS_TOKEN_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let refresh_token_days = std::env::var("JWT_REFRESH_TOKEN_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7);

        Ok(JwtConfig {
            signing_key,
            issuer,
            audience,
            access_token_minutes,
            refresh_token_days,
        })
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            signing_key: String::new(),
            issuer: "blog-platform".to_string(),
            audience: "blog-platform".to_string(),
            access_token_minutes: 30,
            refresh_token_days: 7,
        }
    }
}

/// Access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Username
    pub username: String,
    /// Unique token ID
    pub jti: Uuid,
    /// The user's role at issuing time
    pub role: Role,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiration, seconds since the epoch
    pub exp: i64,
}

/// A signed access token together with its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

/// Undo the transport mangling a standard-base64 token picks up in URLs
/// and form bodies: percent-decode, then turn whitespace runs back into
/// the `+` they started as.
pub fn normalize_refresh_token(presented: &str) -> String {
    let decoded = percent_decode_str(presented).decode_utf8_lossy();
    let whitespace = WHITESPACE_RUN
        .get_or_init(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));
    whitespace.replace_all(&decoded, "+").into_owned()
}

/// Token service
#[derive(Clone)]
pub struct TokenService<S> {
    store: S,
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl<S: CredentialStore> TokenService<S> {
    /// Initialize a new token service over the given credential store
    pub fn new(store: S, config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.signing_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.signing_key.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);

        TokenService {
            store,
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Sign an access token for a user
    pub fn issue_access_token(&self, user: &User) -> PlatformResult<AccessToken> {
        let now = Utc::now();
        let expires_on = now + Duration::minutes(self.config.access_token_minutes);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            jti: Uuid::new_v4(),
            role: user.role,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: expires_on.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                error!("Failed to sign access token: {}", e);
                PlatformError::Internal(format!("Failed to sign access token: {e}"))
            })?;
        Ok(AccessToken { token, expires_on })
    }

    /// Verify an access token and return its claims
    pub fn decode_access_token(&self, token: &str) -> PlatformResult<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(
                PlatformError::InvalidToken("access token expired".to_string()),
            ),
            Err(_) => Err(PlatformError::InvalidToken(
                "access token rejected".to_string(),
            )),
        }
    }

    /// Mint a fresh opaque refresh token, not yet attached to any user
    pub fn generate_refresh_token(&self) -> RefreshToken {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let now = Utc::now();

        RefreshToken {
            token: STANDARD.encode(bytes),
            created_on: now,
            expires_on: now + Duration::days(self.config.refresh_token_days),
            revoked_on: None,
        }
    }

    /// Assemble the session payload for a user and their refresh token.
    pub fn session_response(
        &self,
        user: &User,
        refresh: &RefreshToken,
    ) -> PlatformResult<AuthResponse> {
        let access = self.issue_access_token(user)?;
        Ok(AuthResponse {
            access_token: access.token,
            access_expires_on: access.expires_on,
            refresh_token: refresh.token.clone(),
            refresh_expires_on: refresh.expires_on,
            role: user.role,
            username: user.username.clone(),
            email: user.email.clone(),
        })
    }

    /// Exchange an active refresh token for a new session.
    ///
    /// The presented token is revoked, inactive tokens are pruned and the
    /// replacement is appended in a single version-checked write. When two
    /// rotations race, the loser's write conflicts and is reported as an
    /// invalid token so the presented token can never yield two sessions.
    pub async fn rotate(&self, presented: &str) -> PlatformResult<AuthResponse> {
        let token = normalize_refresh_token(presented);
        let Some(mut user) = self.store.find_by_refresh_token(&token).await? else {
            warn!("Refresh token rotation rejected: token not recognized");
            return Err(PlatformError::InvalidToken(
                "refresh token is not recognized".to_string(),
            ));
        };

        let now = Utc::now();
        {
            let Some(entry) = user.refresh_token_mut(&token) else {
                return Err(PlatformError::InvalidToken(
                    "refresh token is not recognized".to_string(),
                ));
            };
            if !entry.is_active(now) {
                warn!(
                    "Refresh token rotation rejected for {}: token no longer active",
                    user.username
                );
                return Err(PlatformError::InvalidToken(
                    "refresh token is no longer active".to_string(),
                ));
            }
            entry.revoke(now);
        }
        user.prune_inactive_tokens(now);
        let replacement = self.generate_refresh_token();
        user.refresh_tokens.push(replacement.clone());

        let user = match self.store.update(&user).await {
            Ok(user) => user,
            Err(PlatformError::Conflict) => {
                warn!(
                    "Refresh token rotation for {} lost a concurrent update",
                    user.username
                );
                return Err(PlatformError::InvalidToken(
                    "refresh token is no longer active".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        info!("Rotated refresh token for {}", user.username);
        self.session_response(&user, &replacement)
    }

    /// Revoke an active refresh token and return its owner.
    ///
    /// Strict: a token that is unknown, already revoked or expired is an
    /// error. Nothing else on the account is touched, dead tokens included.
    pub async fn revoke(&self, presented: &str) -> PlatformResult<User> {
        let token = normalize_refresh_token(presented);
        let Some(mut user) = self.store.find_by_refresh_token(&token).await? else {
            warn!("Refresh token revocation rejected: token not recognized");
            return Err(PlatformError::InvalidToken(
                "refresh token is not recognized".to_string(),
            ));
        };

        let now = Utc::now();
        let Some(entry) = user.refresh_token_mut(&token) else {
            return Err(PlatformError::InvalidToken(
                "refresh token is not recognized".to_string(),
            ));
        };
        if !entry.is_active(now) {
            warn!(
                "Refresh token revocation rejected for {}: token no longer active",
                user.username
            );
            return Err(PlatformError::InvalidToken(
                "refresh token is no longer active".to_string(),
            ));
        }
        entry.revoke(now);

        let user = self.store.update(&user).await?;
        info!("Revoked refresh token for {}", user.username);
        Ok(user)
    }
}
