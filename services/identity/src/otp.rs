//! One-time passcode ledger
//!
//! Bridges "prove you received this email" to the opaque backing token a
//! privileged credential-store operation needs. Codes are six digits,
//! single-use, and live for a short configurable lifespan.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// OTP ledger configuration
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// How long an issued code stays redeemable
    pub lifespan: Duration,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            lifespan: Duration::minutes(10),
        }
    }
}

/// Ledger entry
#[derive(Debug, Clone)]
struct OtpEntry {
    /// Six-digit code as the user will type it
    code: String,
    /// Store-native token the code stands in for
    backing_token: String,
    /// Point at which the code stops being redeemable
    expires_at: DateTime<Utc>,
}

/// Outcome of a redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// Code matched inside its lifespan; carries the backing token
    Valid(String),
    /// Code matched but the entry had expired; the entry is gone either way
    Expired,
    /// Nothing matched the (email, code) pair
    Invalid,
}

/// In-memory OTP ledger keyed by email.
///
/// One live code per email: issuing a new code replaces any previous one,
/// and a matched code is deleted on its first redemption attempt whatever
/// the outcome. Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct OtpLedger {
    /// Ledger configuration
    config: OtpConfig,
    /// Live entries, one per email
    entries: Arc<Mutex<HashMap<String, OtpEntry>>>,
}

impl OtpLedger {
    /// Create a new ledger
    pub fn new(config: OtpConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Issue a code for `email`, replacing any previous entry.
    ///
    /// Returns the code for delivery through the mailer; the ledger never
    /// sends anything itself.
    pub async fn issue(&self, email: &str, backing_token: &str) -> String {
        let code = generate_code();
        let entry = OtpEntry {
            code: code.clone(),
            backing_token: backing_token.to_string(),
            expires_at: Utc::now() + self.config.lifespan,
        };

        let mut entries = self.entries.lock().await;
        entries.insert(ledger_key(email), entry);
        info!("Issued one-time code for {}", email);
        code
    }

    /// Redeem `(email, code)`.
    ///
    /// A matching entry is removed under the ledger lock before the expiry
    /// check, so two concurrent redemptions cannot both succeed and a code
    /// can never be replayed. A code mismatch leaves the entry in place,
    /// mirroring a lookup-by-pair that simply finds nothing.
    pub async fn redeem(&self, email: &str, code: &str) -> Redemption {
        let key = ledger_key(email);
        let mut entries = self.entries.lock().await;

        let matches = entries
            .get(&key)
            .is_some_and(|entry| entry.code == code.trim());
        if !matches {
            return Redemption::Invalid;
        }

        // Single use: delete on first validation attempt regardless of outcome
        let Some(entry) = entries.remove(&key) else {
            return Redemption::Invalid;
        };
        if entry.expires_at <= Utc::now() {
            info!("One-time code for {} had expired", email);
            return Redemption::Expired;
        }
        Redemption::Valid(entry.backing_token)
    }

    /// Get the ledger configuration
    pub fn config(&self) -> &OtpConfig {
        &self.config
    }
}

/// Cryptographically random six-digit code, uniform over [100000, 999999].
fn generate_code() -> String {
    OsRng.gen_range(100_000..=999_999u32).to_string()
}

fn ledger_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expired_ledger() -> OtpLedger {
        OtpLedger::new(OtpConfig {
            lifespan: Duration::seconds(-1),
        })
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..256 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[tokio::test]
    async fn redeem_returns_the_backing_token_once() {
        let ledger = OtpLedger::new(OtpConfig::default());
        let code = ledger.issue("alice@example.com", "backing-1").await;

        assert_eq!(
            ledger.redeem("alice@example.com", &code).await,
            Redemption::Valid("backing-1".to_string())
        );
        // consumed on first success
        assert_eq!(ledger.redeem("alice@example.com", &code).await, Redemption::Invalid);
    }

    #[tokio::test]
    async fn wrong_code_leaves_the_entry_in_place() {
        let ledger = OtpLedger::new(OtpConfig::default());
        let code = ledger.issue("alice@example.com", "backing-1").await;

        assert_eq!(ledger.redeem("alice@example.com", "000000").await, Redemption::Invalid);
        // the real code still works afterwards
        assert!(matches!(
            ledger.redeem("alice@example.com", &code).await,
            Redemption::Valid(_)
        ));
    }

    #[tokio::test]
    async fn expired_code_is_reported_and_consumed() {
        let ledger = expired_ledger();
        let code = ledger.issue("alice@example.com", "backing-1").await;

        assert_eq!(ledger.redeem("alice@example.com", &code).await, Redemption::Expired);
        // consumed even though it had expired
        assert_eq!(ledger.redeem("alice@example.com", &code).await, Redemption::Invalid);
    }

    #[tokio::test]
    async fn issuing_replaces_the_previous_code() {
        let ledger = OtpLedger::new(OtpConfig::default());
        let first = ledger.issue("alice@example.com", "backing-1").await;
        let second = ledger.issue("alice@example.com", "backing-2").await;

        if first != second {
            assert_eq!(ledger.redeem("alice@example.com", &first).await, Redemption::Invalid);
        }
        assert_eq!(
            ledger.redeem("alice@example.com", &second).await,
            Redemption::Valid("backing-2".to_string())
        );
    }

    #[tokio::test]
    async fn emails_are_keyed_case_insensitively() {
        let ledger = OtpLedger::new(OtpConfig::default());
        let code = ledger.issue("Alice@Example.com", "backing-1").await;

        assert!(matches!(
            ledger.redeem("alice@example.com", &code).await,
            Redemption::Valid(_)
        ));
    }
}
