use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workhub_core::{ProjectId, UserId, WorkspaceId};

use crate::Role;

/// What a membership row grants access to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MembershipScope {
    Workspace(WorkspaceId),
    Project(ProjectId),
}

/// A row granting a user a role within a workspace or project.
///
/// Unique per `(user_id, scope)`; the store enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub scope: MembershipScope,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn workspace(user_id: UserId, workspace_id: WorkspaceId, role: Role, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            scope: MembershipScope::Workspace(workspace_id),
            role,
            joined_at,
        }
    }

    pub fn project(user_id: UserId, project_id: ProjectId, role: Role, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            scope: MembershipScope::Project(project_id),
            role,
            joined_at,
        }
    }

    pub fn key(&self) -> (UserId, MembershipScope) {
        (self.user_id.clone(), self.scope)
    }
}
