//! Role hierarchy model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use common::PlatformError;

/// Platform roles, totally ordered Reader/Writer < Admin < SuperAdmin.
///
/// Reader and Writer are peers on the bottom tier (the "User" tier). Each
/// account holds exactly one role at a time; switching replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Reader,
    Writer,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Position in the hierarchy. Reader and Writer share rank 0.
    pub fn rank(self) -> u8 {
        match self {
            Role::Reader | Role::Writer => 0,
            Role::Admin => 1,
            Role::SuperAdmin => 2,
        }
    }

    /// True for the Admin/SuperAdmin tier.
    pub fn is_privileged(self) -> bool {
        self.rank() > 0
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reader => "Reader",
            Role::Writer => "Writer",
            Role::Admin => "Admin",
            Role::SuperAdmin => "SuperAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("reader") {
            Ok(Role::Reader)
        } else if name.eq_ignore_ascii_case("writer") {
            Ok(Role::Writer)
        } else if name.eq_ignore_ascii_case("admin") {
            Ok(Role::Admin)
        } else if name.eq_ignore_ascii_case("superadmin") {
            Ok(Role::SuperAdmin)
        } else {
            Err(PlatformError::InvalidInput(format!("unknown role: {name}")))
        }
    }
}
