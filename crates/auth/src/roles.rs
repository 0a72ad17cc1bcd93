use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Membership role, ordered by privilege: `Member < Admin < Owner`.
///
/// Policy checks go through [`Role::at_least`] rather than matching on variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
    Owner,
}

impl Role {
    pub fn at_least(self, min: Role) -> bool {
        self >= min
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }

    /// The more privileged of two optional roles.
    pub fn strongest(a: Option<Role>, b: Option<Role>) -> Option<Role> {
        a.max(b)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}
