//! Identity service models

pub mod response;
pub mod role;
pub mod token;
pub mod user;

// Re-export for convenience
pub use response::{AuthResponse, ConfirmEmailOutcome, RegistrationReceipt, ResendOutcome, UpdatedProfile};
pub use role::Role;
pub use token::RefreshToken;
pub use user::{Actor, NewUser, ProfileUpdate, User};
