//! Session cookie directives
//!
//! This subsystem does not speak HTTP. Flows that open or close a session
//! hand back a list of cookie directives, and the embedding layer applies
//! them to whatever response is in flight through a [`CookieSink`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::AuthResponse;

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
/// Cookie carrying the signed-in username.
pub const USERNAME_COOKIE: &str = "userName";
/// Cookie carrying the signed-in user id.
pub const USER_ID_COOKIE: &str = "userID";

/// One instruction for the embedding HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    Set {
        name: &'static str,
        value: String,
        expires_on: DateTime<Utc>,
    },
    Clear {
        name: &'static str,
    },
}

/// Sink the embedding layer implements over its response type.
pub trait CookieSink {
    fn set_cookie(&mut self, name: &str, value: &str, expires_on: DateTime<Utc>);
    fn clear_cookie(&mut self, name: &str);
}

/// Directives that install a fresh session. All three cookies share the
/// refresh token's expiry.
pub fn session_cookies(user_id: Uuid, session: &AuthResponse) -> Vec<CookieDirective> {
    vec![
        CookieDirective::Set {
            name: REFRESH_TOKEN_COOKIE,
            value: session.refresh_token.clone(),
            expires_on: session.refresh_expires_on,
        },
        CookieDirective::Set {
            name: USERNAME_COOKIE,
            value: session.username.clone(),
            expires_on: session.refresh_expires_on,
        },
        CookieDirective::Set {
            name: USER_ID_COOKIE,
            value: user_id.to_string(),
            expires_on: session.refresh_expires_on,
        },
    ]
}

/// Directives that tear a session down.
pub fn clear_session_cookies() -> Vec<CookieDirective> {
    vec![
        CookieDirective::Clear {
            name: REFRESH_TOKEN_COOKIE,
        },
        CookieDirective::Clear {
            name: USERNAME_COOKIE,
        },
        CookieDirective::Clear {
            name: USER_ID_COOKIE,
        },
    ]
}

/// Apply a batch of directives to a sink, in order.
pub fn apply(directives: &[CookieDirective], sink: &mut impl CookieSink) {
    for directive in directives {
        match directive {
            CookieDirective::Set {
                name,
                value,
                expires_on,
            } => sink.set_cookie(name, value, *expires_on),
            CookieDirective::Clear { name } => sink.clear_cookie(name),
        }
    }
}

/// Handed back by logout: the directives that clear the session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutReceipt {
    pub cookies: Vec<CookieDirective>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;

    #[derive(Default)]
    struct RecordingSink {
        set: Vec<(String, String)>,
        cleared: Vec<String>,
    }

    impl CookieSink for RecordingSink {
        fn set_cookie(&mut self, name: &str, value: &str, _expires_on: DateTime<Utc>) {
            self.set.push((name.to_string(), value.to_string()));
        }

        fn clear_cookie(&mut self, name: &str) {
            self.cleared.push(name.to_string());
        }
    }

    #[test]
    fn fresh_sessions_set_all_three_cookies() {
        let user_id = Uuid::new_v4();
        let session = AuthResponse {
            access_token: "jwt".to_string(),
            access_expires_on: Utc::now() + Duration::minutes(30),
            refresh_token: "opaque".to_string(),
            refresh_expires_on: Utc::now() + Duration::days(7),
            role: Role::Reader,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        };

        let mut sink = RecordingSink::default();
        apply(&session_cookies(user_id, &session), &mut sink);

        assert_eq!(
            sink.set,
            vec![
                (REFRESH_TOKEN_COOKIE.to_string(), "opaque".to_string()),
                (USERNAME_COOKIE.to_string(), "alice".to_string()),
                (USER_ID_COOKIE.to_string(), user_id.to_string()),
            ]
        );
        assert!(sink.cleared.is_empty());
    }

    #[test]
    fn teardown_clears_all_three_cookies() {
        let mut sink = RecordingSink::default();
        apply(&clear_session_cookies(), &mut sink);

        assert_eq!(
            sink.cleared,
            vec![REFRESH_TOKEN_COOKIE, USERNAME_COOKIE, USER_ID_COOKIE]
        );
        assert!(sink.set.is_empty());
    }
}
