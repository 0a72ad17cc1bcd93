use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workhub_core::{DomainError, DomainResult, Entity, UserId, WorkspaceId};

use crate::text::normalize_name;

/// Lifecycle state. `Deleting` is set for the duration of a cascading delete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceState {
    #[default]
    Active,
    Deleting,
}

/// Top-level tenant container. Exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub owner_id: UserId,
    pub state: WorkspaceState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspace {
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

impl Workspace {
    pub fn create(owner_id: UserId, cmd: &CreateWorkspace) -> DomainResult<Self> {
        Ok(Self {
            id: cmd.workspace_id,
            name: normalize_name("workspace name", &cmd.name)?,
            owner_id,
            state: WorkspaceState::Active,
            created_at: cmd.occurred_at,
        })
    }

    pub fn is_deleting(&self) -> bool {
        self.state == WorkspaceState::Deleting
    }

    pub fn begin_deletion(&mut self) -> DomainResult<()> {
        if self.is_deleting() {
            return Err(DomainError::conflict("workspace deletion already in progress"));
        }
        self.state = WorkspaceState::Deleting;
        Ok(())
    }

    /// Undo `begin_deletion` after a failed cascade.
    pub fn abort_deletion(&mut self) {
        self.state = WorkspaceState::Active;
    }
}

impl Entity for Workspace {
    type Id = WorkspaceId;

    fn id(&self) -> &WorkspaceId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
