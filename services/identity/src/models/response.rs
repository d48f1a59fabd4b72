//! Result shapes produced by the identity flows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// Login/refresh result: everything the caller needs to hold a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub access_expires_on: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_on: DateTime<Utc>,
    pub role: Role,
    pub username: String,
    pub email: String,
}

/// Non-authenticated registration receipt. No session exists yet; the
/// account stays pending until the emailed code is redeemed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub email: String,
    pub username: String,
    pub role: Role,
    pub message: String,
}

/// Profile shape returned after an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Outcome of an email confirmation. `AlreadyConfirmed` is a no-op
/// success, not an error; callers surface it with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEmailOutcome {
    Confirmed,
    AlreadyConfirmed,
}

/// Outcome of a confirmation-code resend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    AlreadyConfirmed,
}
