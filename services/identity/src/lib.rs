//! Identity and session lifecycle for the blog platform
//!
//! Registration, email confirmation, login, refresh token rotation,
//! password management and account administration over a pluggable
//! credential store. HTTP, persistence and real mail delivery live in
//! the embedding services; this crate hands them typed results and
//! cookie directives instead.

pub mod accounts;
pub mod authz;
pub mod cookies;
pub mod mailer;
pub mod models;
pub mod otp;
pub mod passwords;
pub mod session;
pub mod store;
pub mod tokens;
pub mod validation;

pub use accounts::AccountService;
pub use authz::{AccountOperation, Decision, authorize, authorize_grant_at_registration};
pub use cookies::{CookieDirective, CookieSink, LogoutReceipt};
pub use mailer::{Mailer, OutboundMail, RecordingMailer};
pub use otp::{OtpConfig, OtpLedger, Redemption};
pub use passwords::PasswordService;
pub use session::SessionManager;
pub use store::CredentialStore;
pub use store::memory::MemoryCredentialStore;
pub use tokens::{AccessToken, Claims, JwtConfig, TokenService, normalize_refresh_token};
