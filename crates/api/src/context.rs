use workhub_auth::PrincipalId;
use workhub_workspaces::User;

/// Principal context for a request (authenticated identity + mirrored profile).
///
/// Inserted by the auth middleware; every protected handler takes it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    user: User,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, user: User) -> Self {
        Self { principal_id, user }
    }

    pub fn principal_id(&self) -> &PrincipalId {
        &self.principal_id
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}
