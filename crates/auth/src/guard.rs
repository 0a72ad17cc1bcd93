//! Mutation Guard: authorizes a write before it is applied.
//!
//! Callers must invoke [`authorize_mutation`] against the same graph snapshot the write
//! will be applied to (i.e. inside the write transaction). A decision is never cached.

use serde::Serialize;
use workhub_core::{CommentId, ProjectId, TaskId, UserId, WorkspaceId};

use crate::access::{Access, AccessTarget, MembershipGraph, has_access, require_access};
use crate::{AuthzError, EntityKind, MembershipScope, PrincipalId, Role};

/// A write the principal wants to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreateProject { workspace: WorkspaceId },
    UpdateProject { project: ProjectId },
    DeleteProject { project: ProjectId },
    AddProjectMember { project: ProjectId, role: Role },
    CreateTask { project: ProjectId },
    UpdateTask { task: TaskId },
    DeleteTask { task: TaskId },
    /// `assignee: None` clears the assignment.
    AssignTask { task: TaskId, assignee: Option<UserId> },
    CreateComment { task: TaskId },
    DeleteComment { comment: CommentId },
    AddWorkspaceMember { workspace: WorkspaceId, role: Role },
    RemoveWorkspaceMember { workspace: WorkspaceId, user: UserId },
    DeleteWorkspace { workspace: WorkspaceId },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateProject { .. } => "create_project",
            Action::UpdateProject { .. } => "update_project",
            Action::DeleteProject { .. } => "delete_project",
            Action::AddProjectMember { .. } => "add_project_member",
            Action::CreateTask { .. } => "create_task",
            Action::UpdateTask { .. } => "update_task",
            Action::DeleteTask { .. } => "delete_task",
            Action::AssignTask { .. } => "assign_task",
            Action::CreateComment { .. } => "create_comment",
            Action::DeleteComment { .. } => "delete_comment",
            Action::AddWorkspaceMember { .. } => "add_workspace_member",
            Action::RemoveWorkspaceMember { .. } => "remove_workspace_member",
            Action::DeleteWorkspace { .. } => "delete_workspace",
        }
    }
}

/// Authorize `action` for `principal` against the current graph.
///
/// Check order: existence/membership first (`NotFound`/`Forbidden`), then the
/// pending-cascade marker, then role requirements. A principal with no relation to the
/// target never learns more than "not found".
///
/// Policy:
/// - creating projects needs any workspace membership
/// - updating/deleting a project needs direct project membership or workspace admin
/// - managing project members needs project admin or workspace admin
/// - tasks and comments need project access (direct or inherited)
/// - assignees must themselves have access to the task's project
/// - deleting a comment needs authorship or workspace admin
/// - deleting the workspace is owner-only
pub fn authorize_mutation<G>(graph: &G, principal: &PrincipalId, action: &Action) -> Result<(), AuthzError>
where
    G: MembershipGraph + ?Sized,
{
    let outcome = decide(graph, principal, action);
    if let Err(err) = &outcome {
        tracing::debug!(
            principal = %principal,
            action = action.name(),
            denial = err.internal_kind(),
            "mutation denied"
        );
    }
    outcome
}

fn decide<G>(graph: &G, principal: &PrincipalId, action: &Action) -> Result<(), AuthzError>
where
    G: MembershipGraph + ?Sized,
{
    match action {
        Action::CreateProject { workspace } => {
            let access = writable(graph, principal, AccessTarget::Workspace(*workspace))?;
            require_role(access.workspace_role, Role::Member)
        }
        Action::UpdateProject { project } | Action::DeleteProject { project } => {
            let access = writable(graph, principal, AccessTarget::Project(*project))?;
            if access.project_role.is_some() {
                return Ok(());
            }
            require_role(access.workspace_role, Role::Admin)
        }
        Action::AddProjectMember { project, role } => {
            let access = writable(graph, principal, AccessTarget::Project(*project))?;
            let manager = access.project_role.is_some_and(|r| r.at_least(Role::Admin))
                || access.workspace_role.is_some_and(|r| r.at_least(Role::Admin));
            if !manager {
                return require_role(access.role(), Role::Admin);
            }
            require_role(access.role(), *role)
        }
        Action::CreateTask { project } => {
            writable(graph, principal, AccessTarget::Project(*project))?;
            Ok(())
        }
        Action::UpdateTask { task } | Action::DeleteTask { task } | Action::CreateComment { task } => {
            writable(graph, principal, AccessTarget::Task(*task))?;
            Ok(())
        }
        Action::AssignTask { task, assignee } => {
            writable(graph, principal, AccessTarget::Task(*task))?;
            let Some(assignee) = assignee else {
                return Ok(());
            };
            let assignee_access = has_access(graph, &PrincipalId::new(assignee.clone()), AccessTarget::Task(*task))?;
            if assignee_access.allowed() {
                return Ok(());
            }
            let project = graph
                .task_project(task)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Task, task))?;
            Err(AuthzError::InvalidAssignee {
                assignee: assignee.clone(),
                project,
            })
        }
        Action::DeleteComment { comment } => {
            let (task, author) = graph
                .comment_parent(comment)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Comment, comment))?;
            let access = writable(graph, principal, AccessTarget::Task(task))?;
            if &author == principal.user_id() {
                return Ok(());
            }
            require_role(access.workspace_role, Role::Admin)
        }
        Action::AddWorkspaceMember { workspace, role } => {
            let access = writable(graph, principal, AccessTarget::Workspace(*workspace))?;
            require_role(access.workspace_role, Role::Admin)?;
            require_role(access.workspace_role, *role)
        }
        Action::RemoveWorkspaceMember { workspace, user } => {
            let access = writable(graph, principal, AccessTarget::Workspace(*workspace))?;
            if user == principal.user_id() {
                return Ok(());
            }
            require_role(access.workspace_role, Role::Admin)?;
            match graph.membership_role(user, MembershipScope::Workspace(*workspace)) {
                Some(target_role) => require_role(access.workspace_role, target_role),
                None => Ok(()),
            }
        }
        Action::DeleteWorkspace { workspace } => {
            let access = writable(graph, principal, AccessTarget::Workspace(*workspace))?;
            require_role(access.workspace_role, Role::Owner)
        }
    }
}

/// Membership check plus the pending-cascade check every write needs.
fn writable<G>(graph: &G, principal: &PrincipalId, target: AccessTarget) -> Result<Access, AuthzError>
where
    G: MembershipGraph + ?Sized,
{
    let access = require_access(graph, principal, target)?;
    if graph.workspace_is_deleting(&access.workspace_id) {
        return Err(AuthzError::ConflictOnCascade(access.workspace_id));
    }
    Ok(access)
}

fn require_role(actual: Option<Role>, required: Role) -> Result<(), AuthzError> {
    match actual {
        Some(role) if role.at_least(required) => Ok(()),
        // Reached only with a membership on some path; the weakest role stands in.
        actual => Err(AuthzError::RoleInsufficient {
            required,
            actual: actual.unwrap_or(Role::Member),
        }),
    }
}
