use serde::{Deserialize, Serialize};

use workhub_core::UserId;

/// Identity of the authenticated principal making a request.
///
/// Resolved by the external identity provider before the core is called; the core
/// never parses credentials. Every core operation takes it as an explicit argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(UserId);

impl PrincipalId {
    pub fn new(user_id: UserId) -> Self {
        Self(user_id)
    }

    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<UserId> for PrincipalId {
    fn from(value: UserId) -> Self {
        Self(value)
    }
}

impl From<PrincipalId> for UserId {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}
