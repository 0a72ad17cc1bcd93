//! Hierarchy Aggregator: the nested workspace graph as a principal is allowed to see it.
//!
//! Every function here takes one [`Tables`] snapshot and never mutates it. Children are
//! ordered by `(created_at, id)`, members by `(joined_at, user_id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workhub_auth::{AccessTarget, AuthzError, EntityKind, MembershipScope, PrincipalId, Role, has_access, require_access};
use workhub_core::{CommentId, ProjectId, TaskId, UserId, WorkspaceId};
use workhub_workspaces::{Comment, Project, Task, TaskStatus, User, Workspace, WorkspaceState};

use crate::store::Tables;

// ─────────────────────────────────────────────────────────────────────────────
// Views
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role_tag: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            role_tag: user.role_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    pub user: UserSummary,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: CommentId,
    pub body: String,
    pub author: UserSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAggregate {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAggregate {
    pub id: ProjectId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub members: Vec<MemberView>,
    pub tasks: Vec<TaskAggregate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceAggregate {
    pub id: WorkspaceId,
    pub name: String,
    pub owner_id: UserId,
    pub state: WorkspaceState,
    pub created_at: DateTime<Utc>,
    /// The viewing principal's role in this workspace.
    pub viewer_role: Role,
    pub members: Vec<MemberView>,
    pub projects: Vec<ProjectAggregate>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Every workspace the principal owns or belongs to, fully expanded.
///
/// An unknown principal simply sees nothing.
pub fn list_visible_workspaces(tables: &Tables, principal: &PrincipalId) -> Vec<WorkspaceAggregate> {
    tables
        .workspaces()
        .into_iter()
        .filter_map(|ws| {
            let access = has_access(tables, principal, AccessTarget::Workspace(ws.id)).ok()?;
            let role = access.role()?;
            Some(build_workspace(tables, ws, role))
        })
        .collect()
}

pub fn workspace_aggregate(
    tables: &Tables,
    principal: &PrincipalId,
    workspace_id: WorkspaceId,
) -> Result<WorkspaceAggregate, AuthzError> {
    let access = require_access(tables, principal, AccessTarget::Workspace(workspace_id))?;
    let ws = tables
        .workspace(&workspace_id)
        .ok_or_else(|| AuthzError::not_found(EntityKind::Workspace, workspace_id))?;
    Ok(build_workspace(tables, ws, access.role().unwrap_or(Role::Member)))
}

pub fn project_aggregate(
    tables: &Tables,
    principal: &PrincipalId,
    project_id: ProjectId,
) -> Result<ProjectAggregate, AuthzError> {
    require_access(tables, principal, AccessTarget::Project(project_id))?;
    let project = tables
        .project(&project_id)
        .ok_or_else(|| AuthzError::not_found(EntityKind::Project, project_id))?;
    Ok(build_project(tables, project))
}

pub fn task_aggregate(tables: &Tables, principal: &PrincipalId, task_id: TaskId) -> Result<TaskAggregate, AuthzError> {
    require_access(tables, principal, AccessTarget::Task(task_id))?;
    let task = tables
        .task(&task_id)
        .ok_or_else(|| AuthzError::not_found(EntityKind::Task, task_id))?;
    Ok(build_task(tables, task))
}

// ─────────────────────────────────────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────────────────────────────────────

fn build_workspace(tables: &Tables, ws: &Workspace, viewer_role: Role) -> WorkspaceAggregate {
    WorkspaceAggregate {
        id: ws.id,
        name: ws.name.clone(),
        owner_id: ws.owner_id.clone(),
        state: ws.state,
        created_at: ws.created_at,
        viewer_role,
        members: members(tables, MembershipScope::Workspace(ws.id)),
        projects: tables
            .projects_in(&ws.id)
            .into_iter()
            .map(|p| build_project(tables, p))
            .collect(),
    }
}

fn build_project(tables: &Tables, project: &Project) -> ProjectAggregate {
    ProjectAggregate {
        id: project.id,
        workspace_id: project.workspace_id,
        name: project.name.clone(),
        description: project.description.clone(),
        created_at: project.created_at,
        updated_at: project.updated_at,
        members: members(tables, MembershipScope::Project(project.id)),
        tasks: tables
            .tasks_in(&project.id)
            .into_iter()
            .map(|t| build_task(tables, t))
            .collect(),
    }
}

fn build_task(tables: &Tables, task: &Task) -> TaskAggregate {
    let assignee = task.assignee_id.as_ref().and_then(|id| {
        let user = tables.user(id);
        if user.is_none() {
            tracing::warn!(task_id = %task.id, assignee = %id, "dropping dangling assignee");
        }
        user.map(UserSummary::from)
    });

    TaskAggregate {
        id: task.id,
        project_id: task.project_id,
        title: task.title.clone(),
        description: task.description.clone(),
        status: task.status,
        assignee,
        created_at: task.created_at,
        updated_at: task.updated_at,
        comments: tables
            .comments_on(&task.id)
            .into_iter()
            .filter_map(|c| comment_view(tables, c))
            .collect(),
    }
}

fn comment_view(tables: &Tables, comment: &Comment) -> Option<CommentView> {
    let Some(author) = tables.user(&comment.author_id) else {
        tracing::warn!(comment_id = %comment.id, author = %comment.author_id, "dropping comment with unknown author");
        return None;
    };
    Some(CommentView {
        id: comment.id,
        body: comment.body.clone(),
        author: author.into(),
        created_at: comment.created_at,
    })
}

fn members(tables: &Tables, scope: MembershipScope) -> Vec<MemberView> {
    tables
        .members_of(scope)
        .into_iter()
        .filter_map(|m| {
            let user = tables.user(&m.user_id)?;
            Some(MemberView {
                user: user.into(),
                role: m.role,
                joined_at: m.joined_at,
            })
        })
        .collect()
}
