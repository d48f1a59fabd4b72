//! Common library for the blog platform
//!
//! This crate carries the contracts shared across the platform services,
//! starting with the request-level error taxonomy every service maps onto
//! its own transport boundary.

pub mod error;

pub use error::{PlatformError, PlatformResult};
