//! Authorization error taxonomy.

use serde::Serialize;
use thiserror::Error;

use workhub_core::{ProjectId, UserId, WorkspaceId};

use crate::Role;

/// Kind of entity an authorization decision was about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Workspace,
    Project,
    Task,
    Comment,
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            EntityKind::User => "user",
            EntityKind::Workspace => "workspace",
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Comment => "comment",
        })
    }
}

/// Authorization failure.
///
/// Authorization failures are never transient, so nothing at this layer retries them.
/// `NotFound` and `Forbidden` stay distinct internally (logs) but share one external
/// reason code so callers cannot probe which ids exist in other tenants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("principal has no membership granting access to {kind} {id}")]
    Forbidden { kind: EntityKind, id: String },

    #[error("user {assignee} has no membership in project {project}")]
    InvalidAssignee { assignee: UserId, project: ProjectId },

    #[error("role '{actual}' is below the required '{required}'")]
    RoleInsufficient { required: Role, actual: Role },

    #[error("workspace {0} is being deleted")]
    ConflictOnCascade(WorkspaceId),
}

impl AuthzError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn forbidden(kind: EntityKind, id: impl ToString) -> Self {
        Self::Forbidden {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable, externally visible reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuthzError::NotFound { .. } | AuthzError::Forbidden { .. } => "not_found",
            AuthzError::InvalidAssignee { .. } => "invalid_assignee",
            AuthzError::RoleInsufficient { .. } => "role_insufficient",
            AuthzError::ConflictOnCascade(_) => "conflict_on_cascade",
        }
    }

    /// Internal label that keeps `NotFound` and `Forbidden` apart. Logs only.
    pub fn internal_kind(&self) -> &'static str {
        match self {
            AuthzError::NotFound { .. } => "not_found",
            AuthzError::Forbidden { .. } => "forbidden",
            other => other.reason_code(),
        }
    }

    /// True when the error must be surfaced as a generic "not found or inaccessible".
    pub fn is_concealed(&self) -> bool {
        matches!(self, AuthzError::NotFound { .. } | AuthzError::Forbidden { .. })
    }
}
