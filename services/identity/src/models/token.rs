//! Refresh token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque refresh token held on a user record.
///
/// The token string is 32 random bytes, standard base64. A token is active
/// until it is revoked or reaches its expiry, whichever comes first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token: String,
    pub created_on: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
    pub revoked_on: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Active means neither revoked nor past expiry at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_on.is_none() && now < self.expires_on
    }

    pub fn revoke(&mut self, now: DateTime<Utc>) {
        self.revoked_on = Some(now);
    }
}
