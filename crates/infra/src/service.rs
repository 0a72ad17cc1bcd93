//! Application-level orchestration of reads and guarded writes.
//!
//! `WorkspaceService` is the single entry point the request layer talks to. Every write
//! follows the same pipeline, inside one store transaction:
//!
//! ```text
//! principal + command
//!   ↓
//! 1. authorize_mutation against the live tables
//!   ↓
//! 2. domain constructor / state transition (validation)
//!   ↓
//! 3. apply to tables (referential checks, cascades)
//!   ↓
//! commit (all steps Ok) or discard
//! ```
//!
//! Reads take one snapshot and hand it to the Hierarchy Aggregator.
//!
//! Workspace deletion is the one two-transaction operation: the workspace is first
//! marked `deleting` (child writes now fail with `ConflictOnCascade`), then removed with
//! everything beneath it. A failed removal clears the marker again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use workhub_auth::{
    Access, AccessTarget, Action, AuthzError, EntityKind, Membership, MembershipGraph, MembershipScope, PrincipalId,
    Role, authorize_mutation, has_access,
};
use workhub_core::{CommentId, DomainError, ProjectId, TaskId, UserId, WorkspaceId};
use workhub_workspaces::{
    Comment, CreateComment, CreateProject, CreateTask, CreateWorkspace, Project, Task, UpdateProject, UpdateTask, User,
    UserProfile, Workspace,
};

use crate::hierarchy::{self, ProjectAggregate, TaskAggregate, WorkspaceAggregate};
use crate::store::{CascadeReport, StoreError, Tables, WorkspaceStore};

/// Service-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Label for logs. Keeps `not_found` and `forbidden` apart.
    pub fn internal_kind(&self) -> &'static str {
        match self {
            ServiceError::Authz(e) => e.internal_kind(),
            ServiceError::Domain(DomainError::Validation(_)) | ServiceError::Domain(DomainError::InvalidId(_)) => {
                "validation"
            }
            ServiceError::Domain(DomainError::InvariantViolation(_)) => "invariant_violation",
            ServiceError::Domain(DomainError::Conflict(_)) => "conflict",
            ServiceError::Store(StoreError::UniqueViolation(_)) => "conflict",
            ServiceError::Store(_) => "store",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Grant `role` in a workspace to an existing user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWorkspaceMember {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Grant `role` in a project to an existing user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProjectMember {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Set or clear (`assignee: None`) a task's assignee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTask {
    pub task_id: TaskId,
    pub assignee: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Orchestrates authorization, validation and storage for the workspace graph.
#[derive(Debug, Clone)]
pub struct WorkspaceService<S> {
    store: S,
}

impl<S> WorkspaceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> WorkspaceService<S>
where
    S: WorkspaceStore,
{
    // ── users ────────────────────────────────────────────────────────────────

    /// Mirror a user from the identity provider. Email is kept from the first sighting.
    #[instrument(skip(self, profile), fields(user_id = %profile.user_id), err)]
    pub fn sync_user(&self, profile: &UserProfile) -> ServiceResult<User> {
        // Most sightings change nothing; answer those from a read snapshot.
        if let Some(mut known) = self.store.read(|t| t.user(&profile.user_id).cloned())? {
            if !known.refresh(profile)? {
                return Ok(known);
            }
        }
        self.transact(|t| {
            if let Some(existing) = t.user_mut(&profile.user_id) {
                if existing.refresh(profile)? {
                    tracing::debug!("user profile refreshed");
                }
                return Ok(existing.clone());
            }
            let user = User::from_profile(profile)?;
            t.upsert_user(user.clone());
            tracing::info!("user mirrored on first sight");
            Ok(user)
        })
    }

    // ── reads ────────────────────────────────────────────────────────────────

    pub fn has_access(&self, principal: &PrincipalId, target: AccessTarget) -> ServiceResult<Access> {
        Ok(self.store.read(|t| has_access(t, principal, target))??)
    }

    #[instrument(skip(self), fields(principal = %principal))]
    pub fn list_visible_workspaces(&self, principal: &PrincipalId) -> ServiceResult<Vec<WorkspaceAggregate>> {
        let out = self.store.read(|t| hierarchy::list_visible_workspaces(t, principal))?;
        tracing::debug!(count = out.len(), "visible workspaces listed");
        Ok(out)
    }

    pub fn get_workspace(&self, principal: &PrincipalId, id: WorkspaceId) -> ServiceResult<WorkspaceAggregate> {
        self.read_guarded(principal, |t| hierarchy::workspace_aggregate(t, principal, id))
    }

    pub fn get_project(&self, principal: &PrincipalId, id: ProjectId) -> ServiceResult<ProjectAggregate> {
        self.read_guarded(principal, |t| hierarchy::project_aggregate(t, principal, id))
    }

    pub fn get_task(&self, principal: &PrincipalId, id: TaskId) -> ServiceResult<TaskAggregate> {
        self.read_guarded(principal, |t| hierarchy::task_aggregate(t, principal, id))
    }

    /// One write transaction with the service error type pinned.
    fn transact<T>(&self, f: impl FnOnce(&mut Tables) -> ServiceResult<T>) -> ServiceResult<T> {
        self.store.write(f)
    }

    fn read_guarded<T>(
        &self,
        principal: &PrincipalId,
        f: impl FnOnce(&Tables) -> Result<T, AuthzError>,
    ) -> ServiceResult<T> {
        self.store.read(f)?.map_err(|e| {
            tracing::debug!(principal = %principal, denial = e.internal_kind(), "read denied");
            ServiceError::from(e)
        })
    }

    // ── workspaces ───────────────────────────────────────────────────────────

    /// Create a workspace owned by the principal, who also gets an `owner` membership row.
    #[instrument(skip(self, cmd), fields(principal = %principal, workspace_id = %cmd.workspace_id), err)]
    pub fn create_workspace(&self, principal: &PrincipalId, cmd: &CreateWorkspace) -> ServiceResult<Workspace> {
        self.transact(|t| {
            require_known_user(t, principal.user_id())?;
            let ws = Workspace::create(principal.user_id().clone(), cmd)?;
            t.insert_workspace(ws.clone())?;
            t.insert_membership(Membership::workspace(
                principal.user_id().clone(),
                ws.id,
                Role::Owner,
                cmd.occurred_at,
            ))?;
            Ok(ws)
        })
    }

    /// Delete a workspace and everything beneath it (owner only).
    #[instrument(skip(self), fields(principal = %principal, workspace_id = %id), err)]
    pub fn delete_workspace(&self, principal: &PrincipalId, id: WorkspaceId) -> ServiceResult<CascadeReport> {
        self.transact(|t| {
            authorize_mutation(t, principal, &Action::DeleteWorkspace { workspace: id })?;
            workspace_mut(t, id)?.begin_deletion()?;
            Ok::<_, ServiceError>(())
        })?;

        let removed = self.transact(|t| {
            t.remove_workspace(&id)
                .ok_or_else(|| ServiceError::from(AuthzError::not_found(EntityKind::Workspace, id)))
        });

        match removed {
            Ok(report) => {
                tracing::info!(
                    projects = report.projects,
                    tasks = report.tasks,
                    comments = report.comments,
                    memberships = report.memberships,
                    "workspace deleted"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(error = %err, "workspace removal failed; clearing deletion marker");
                let restored = self.store.write(|t| {
                    if let Some(ws) = t.workspace_mut(&id) {
                        ws.abort_deletion();
                    }
                    Ok::<_, StoreError>(())
                });
                if let Err(restore_err) = restored {
                    tracing::error!(error = %restore_err, "failed to clear deletion marker");
                }
                Err(err)
            }
        }
    }

    #[instrument(
        skip(self, cmd),
        fields(principal = %principal, workspace_id = %cmd.workspace_id, user_id = %cmd.user_id, role = %cmd.role),
        err
    )]
    pub fn add_workspace_member(&self, principal: &PrincipalId, cmd: &AddWorkspaceMember) -> ServiceResult<Membership> {
        if cmd.role == Role::Owner {
            return Err(DomainError::validation("the owner role cannot be granted").into());
        }
        self.transact(|t| {
            authorize_mutation(
                t,
                principal,
                &Action::AddWorkspaceMember {
                    workspace: cmd.workspace_id,
                    role: cmd.role,
                },
            )?;
            require_known_user(t, &cmd.user_id)?;
            let scope = MembershipScope::Workspace(cmd.workspace_id);
            if t.membership(&cmd.user_id, scope).is_some() {
                return Err(DomainError::conflict(format!("{} is already a member", cmd.user_id)).into());
            }
            let membership = Membership::workspace(cmd.user_id.clone(), cmd.workspace_id, cmd.role, cmd.occurred_at);
            t.insert_membership(membership.clone())?;
            Ok(membership)
        })
    }

    /// Remove a user from a workspace, its projects and their task assignments.
    ///
    /// Returns the number of membership rows removed.
    #[instrument(skip(self), fields(principal = %principal, workspace_id = %workspace, user_id = %user), err)]
    pub fn remove_workspace_member(
        &self,
        principal: &PrincipalId,
        workspace: WorkspaceId,
        user: &UserId,
    ) -> ServiceResult<usize> {
        self.transact(|t| {
            authorize_mutation(
                t,
                principal,
                &Action::RemoveWorkspaceMember {
                    workspace,
                    user: user.clone(),
                },
            )?;
            if t.workspace_owner(&workspace).as_ref() == Some(user) {
                return Err(DomainError::invariant("the workspace owner cannot be removed").into());
            }
            if t.membership(user, MembershipScope::Workspace(workspace)).is_none() {
                return Err(AuthzError::not_found(EntityKind::User, user).into());
            }
            Ok(t.remove_member_from_workspace(user, &workspace))
        })
    }

    // ── projects ─────────────────────────────────────────────────────────────

    /// Create a project. The creator becomes its `admin`.
    #[instrument(skip(self, cmd), fields(principal = %principal, workspace_id = %cmd.workspace_id), err)]
    pub fn create_project(&self, principal: &PrincipalId, cmd: &CreateProject) -> ServiceResult<Project> {
        self.transact(|t| {
            authorize_mutation(
                t,
                principal,
                &Action::CreateProject {
                    workspace: cmd.workspace_id,
                },
            )?;
            let project = Project::create(cmd)?;
            t.insert_project(project.clone())?;
            t.insert_membership(Membership::project(
                principal.user_id().clone(),
                project.id,
                Role::Admin,
                cmd.occurred_at,
            ))?;
            Ok(project)
        })
    }

    #[instrument(skip(self, cmd), fields(principal = %principal, project_id = %cmd.project_id), err)]
    pub fn update_project(&self, principal: &PrincipalId, cmd: &UpdateProject) -> ServiceResult<Project> {
        self.transact(|t| {
            authorize_mutation(
                t,
                principal,
                &Action::UpdateProject {
                    project: cmd.project_id,
                },
            )?;
            let project = t
                .project_mut(&cmd.project_id)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Project, cmd.project_id))?;
            project.apply_update(cmd)?;
            Ok(project.clone())
        })
    }

    #[instrument(skip(self), fields(principal = %principal, project_id = %id), err)]
    pub fn delete_project(&self, principal: &PrincipalId, id: ProjectId) -> ServiceResult<CascadeReport> {
        self.transact(|t| {
            authorize_mutation(t, principal, &Action::DeleteProject { project: id })?;
            t.remove_project(&id)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Project, id).into())
        })
    }

    /// Grant project membership. A user outside the workspace is enrolled as a workspace
    /// `member`, which only a workspace admin may do.
    #[instrument(
        skip(self, cmd),
        fields(principal = %principal, project_id = %cmd.project_id, user_id = %cmd.user_id, role = %cmd.role),
        err
    )]
    pub fn add_project_member(&self, principal: &PrincipalId, cmd: &AddProjectMember) -> ServiceResult<Membership> {
        if cmd.role == Role::Owner {
            return Err(DomainError::validation("the owner role cannot be granted").into());
        }
        self.transact(|t| {
            authorize_mutation(
                t,
                principal,
                &Action::AddProjectMember {
                    project: cmd.project_id,
                    role: cmd.role,
                },
            )?;
            require_known_user(t, &cmd.user_id)?;
            let scope = MembershipScope::Project(cmd.project_id);
            if t.membership(&cmd.user_id, scope).is_some() {
                return Err(DomainError::conflict(format!("{} is already a project member", cmd.user_id)).into());
            }

            let workspace = t
                .project_workspace(&cmd.project_id)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Project, cmd.project_id))?;
            let in_workspace = t.workspace_owner(&workspace).as_ref() == Some(&cmd.user_id)
                || t.membership(&cmd.user_id, MembershipScope::Workspace(workspace)).is_some();
            if !in_workspace {
                // Enrolling into the workspace needs workspace admin rights.
                authorize_mutation(
                    t,
                    principal,
                    &Action::AddWorkspaceMember {
                        workspace,
                        role: Role::Member,
                    },
                )?;
                t.insert_membership(Membership::workspace(
                    cmd.user_id.clone(),
                    workspace,
                    Role::Member,
                    cmd.occurred_at,
                ))?;
                tracing::info!(workspace_id = %workspace, "enrolled project member into workspace");
            }

            let membership = Membership::project(cmd.user_id.clone(), cmd.project_id, cmd.role, cmd.occurred_at);
            t.insert_membership(membership.clone())?;
            Ok(membership)
        })
    }

    // ── tasks ────────────────────────────────────────────────────────────────

    #[instrument(skip(self, cmd), fields(principal = %principal, project_id = %cmd.project_id), err)]
    pub fn create_task(&self, principal: &PrincipalId, cmd: &CreateTask) -> ServiceResult<Task> {
        self.transact(|t| {
            authorize_mutation(
                t,
                principal,
                &Action::CreateTask {
                    project: cmd.project_id,
                },
            )?;
            let task = Task::create(cmd)?;
            t.insert_task(task.clone())?;
            Ok(task)
        })
    }

    #[instrument(skip(self, cmd), fields(principal = %principal, task_id = %cmd.task_id), err)]
    pub fn update_task(&self, principal: &PrincipalId, cmd: &UpdateTask) -> ServiceResult<Task> {
        self.transact(|t| {
            authorize_mutation(t, principal, &Action::UpdateTask { task: cmd.task_id })?;
            let task = task_mut(t, cmd.task_id)?;
            task.apply_update(cmd)?;
            Ok(task.clone())
        })
    }

    /// Assign or unassign a task. The assignee must have access to the task's project.
    #[instrument(skip(self, cmd), fields(principal = %principal, task_id = %cmd.task_id), err)]
    pub fn assign_task(&self, principal: &PrincipalId, cmd: &AssignTask) -> ServiceResult<Task> {
        self.transact(|t| {
            authorize_mutation(
                t,
                principal,
                &Action::AssignTask {
                    task: cmd.task_id,
                    assignee: cmd.assignee.clone(),
                },
            )?;
            let task = task_mut(t, cmd.task_id)?;
            task.assign(cmd.assignee.clone(), cmd.occurred_at);
            Ok(task.clone())
        })
    }

    #[instrument(skip(self), fields(principal = %principal, task_id = %id), err)]
    pub fn delete_task(&self, principal: &PrincipalId, id: TaskId) -> ServiceResult<CascadeReport> {
        self.transact(|t| {
            authorize_mutation(t, principal, &Action::DeleteTask { task: id })?;
            t.remove_task(&id)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Task, id).into())
        })
    }

    // ── comments ─────────────────────────────────────────────────────────────

    /// Comment on a task as the principal.
    #[instrument(skip(self, cmd), fields(principal = %principal, task_id = %cmd.task_id), err)]
    pub fn add_comment(&self, principal: &PrincipalId, cmd: &CreateComment) -> ServiceResult<Comment> {
        self.transact(|t| {
            authorize_mutation(t, principal, &Action::CreateComment { task: cmd.task_id })?;
            let comment = Comment::create(principal.user_id().clone(), cmd)?;
            t.insert_comment(comment.clone())?;
            Ok(comment)
        })
    }

    #[instrument(skip(self), fields(principal = %principal, comment_id = %id), err)]
    pub fn delete_comment(&self, principal: &PrincipalId, id: CommentId) -> ServiceResult<Comment> {
        self.transact(|t| {
            authorize_mutation(t, principal, &Action::DeleteComment { comment: id })?;
            t.remove_comment(&id)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Comment, id).into())
        })
    }
}

fn require_known_user(t: &Tables, user: &UserId) -> Result<(), AuthzError> {
    match t.user(user) {
        Some(_) => Ok(()),
        None => Err(AuthzError::not_found(EntityKind::User, user)),
    }
}

fn workspace_mut(t: &mut Tables, id: WorkspaceId) -> Result<&mut Workspace, AuthzError> {
    t.workspace_mut(&id)
        .ok_or_else(|| AuthzError::not_found(EntityKind::Workspace, id))
}

fn task_mut(t: &mut Tables, id: TaskId) -> Result<&mut Task, AuthzError> {
    t.task_mut(&id).ok_or_else(|| AuthzError::not_found(EntityKind::Task, id))
}
