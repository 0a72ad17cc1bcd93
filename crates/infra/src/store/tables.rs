//! Relational tables for the workspace graph, with referential integrity.
//!
//! Every insert checks its parent rows; every delete cascades to its children. Callers
//! run these inside a store transaction, so a cascade either completes or is discarded.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use workhub_auth::{Membership, MembershipGraph, MembershipScope, Role};
use workhub_core::{CommentId, Entity, ProjectId, TaskId, UserId, WorkspaceId};
use workhub_workspaces::{Comment, Project, Task, User, Workspace};

use super::StoreError;

/// Rows of one entity type, keyed by id.
#[derive(Debug, Clone)]
pub struct Table<E: Entity> {
    rows: HashMap<E::Id, E>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self { rows: HashMap::new() }
    }
}

impl<E: Entity> Table<E> {
    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.rows.get(id)
    }

    pub fn get_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        self.rows.get_mut(id)
    }

    pub fn contains(&self, id: &E::Id) -> bool {
        self.rows.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows matching `pred`, in creation order (`created_at`, then id).
    pub fn ordered(&self, pred: impl Fn(&E) -> bool) -> Vec<&E> {
        let mut out: Vec<&E> = self.rows.values().filter(|e| pred(e)).collect();
        out.sort_by_key(|e| e.creation_key());
        out
    }

    fn insert_new(&mut self, row: E, label: &str) -> Result<(), StoreError> {
        let id = row.id().clone();
        if self.rows.contains_key(&id) {
            return Err(StoreError::UniqueViolation(format!("{label} {id:?} already exists")));
        }
        self.rows.insert(id, row);
        Ok(())
    }

    fn upsert(&mut self, row: E) {
        self.rows.insert(row.id().clone(), row);
    }

    fn remove(&mut self, id: &E::Id) -> Option<E> {
        self.rows.remove(id)
    }

    /// Remove every row matching `pred`, returning the removed ids.
    fn remove_where(&mut self, pred: impl Fn(&E) -> bool) -> Vec<E::Id> {
        let ids: Vec<E::Id> = self
            .rows
            .values()
            .filter(|e| pred(e))
            .map(|e| e.id().clone())
            .collect();
        for id in &ids {
            self.rows.remove(id);
        }
        ids
    }
}

/// Row counts removed by a cascading delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub workspaces: usize,
    pub projects: usize,
    pub tasks: usize,
    pub comments: usize,
    pub memberships: usize,
}

impl CascadeReport {
    fn absorb(&mut self, other: CascadeReport) {
        self.workspaces += other.workspaces;
        self.projects += other.projects;
        self.tasks += other.tasks;
        self.comments += other.comments;
        self.memberships += other.memberships;
    }
}

/// The full workspace graph.
///
/// Each table sits behind its own `Arc`: cloning `Tables` is cheap, and a write copies
/// only the tables it touches.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    users: Arc<Table<User>>,
    workspaces: Arc<Table<Workspace>>,
    projects: Arc<Table<Project>>,
    tasks: Arc<Table<Task>>,
    comments: Arc<Table<Comment>>,
    memberships: Arc<BTreeMap<(UserId, MembershipScope), Membership>>,
}

// ── reads ────────────────────────────────────────────────────────────────────

impl Tables {
    pub fn users(&self) -> &Table<User> {
        &self.users
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn workspace(&self, id: &WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(id)
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.get(id)
    }

    pub fn workspaces(&self) -> Vec<&Workspace> {
        self.workspaces.ordered(|_| true)
    }

    pub fn projects_in(&self, workspace: &WorkspaceId) -> Vec<&Project> {
        self.projects.ordered(|p| &p.workspace_id == workspace)
    }

    pub fn tasks_in(&self, project: &ProjectId) -> Vec<&Task> {
        self.tasks.ordered(|t| &t.project_id == project)
    }

    pub fn comments_on(&self, task: &TaskId) -> Vec<&Comment> {
        self.comments.ordered(|c| &c.task_id == task)
    }

    pub fn membership(&self, user: &UserId, scope: MembershipScope) -> Option<&Membership> {
        self.memberships.get(&(user.clone(), scope))
    }

    /// Members of a workspace or project, ordered by `(joined_at, user_id)`.
    pub fn members_of(&self, scope: MembershipScope) -> Vec<&Membership> {
        let mut out: Vec<&Membership> = self.memberships.values().filter(|m| m.scope == scope).collect();
        out.sort_by(|a, b| (a.joined_at, &a.user_id).cmp(&(b.joined_at, &b.user_id)));
        out
    }

    pub fn membership_count(&self) -> usize {
        self.memberships.len()
    }

    /// Dangling references, described. Empty when the graph is consistent.
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for ws in self.workspaces.ordered(|_| true) {
            if !self.users.contains(&ws.owner_id) {
                out.push(format!("workspace {} has unknown owner {}", ws.id, ws.owner_id));
            }
        }
        for p in self.projects.ordered(|_| true) {
            if !self.workspaces.contains(&p.workspace_id) {
                out.push(format!("project {} has unknown workspace {}", p.id, p.workspace_id));
            }
        }
        for t in self.tasks.ordered(|_| true) {
            if !self.projects.contains(&t.project_id) {
                out.push(format!("task {} has unknown project {}", t.id, t.project_id));
            }
            if let Some(assignee) = &t.assignee_id {
                if !self.users.contains(assignee) {
                    out.push(format!("task {} has unknown assignee {assignee}", t.id));
                }
            }
        }
        for c in self.comments.ordered(|_| true) {
            if !self.tasks.contains(&c.task_id) {
                out.push(format!("comment {} has unknown task {}", c.id, c.task_id));
            }
            if !self.users.contains(&c.author_id) {
                out.push(format!("comment {} has unknown author {}", c.id, c.author_id));
            }
        }
        for m in self.memberships.values() {
            if !self.users.contains(&m.user_id) || !self.scope_exists(m.scope) {
                out.push(format!("membership {:?} is dangling", m.key()));
            }
        }
        out
    }

    fn scope_exists(&self, scope: MembershipScope) -> bool {
        match scope {
            MembershipScope::Workspace(id) => self.workspaces.contains(&id),
            MembershipScope::Project(id) => self.projects.contains(&id),
        }
    }
}

// ── writes ───────────────────────────────────────────────────────────────────

impl Tables {
    pub fn upsert_user(&mut self, user: User) {
        Arc::make_mut(&mut self.users).upsert(user);
    }

    pub fn user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        Arc::make_mut(&mut self.users).get_mut(id)
    }

    pub fn insert_workspace(&mut self, workspace: Workspace) -> Result<(), StoreError> {
        if !self.users.contains(&workspace.owner_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "workspace owner {} does not exist",
                workspace.owner_id
            )));
        }
        Arc::make_mut(&mut self.workspaces).insert_new(workspace, "workspace")
    }

    pub fn workspace_mut(&mut self, id: &WorkspaceId) -> Option<&mut Workspace> {
        Arc::make_mut(&mut self.workspaces).get_mut(id)
    }

    pub fn insert_membership(&mut self, membership: Membership) -> Result<(), StoreError> {
        if !self.users.contains(&membership.user_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "member {} does not exist",
                membership.user_id
            )));
        }
        if !self.scope_exists(membership.scope) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "membership scope {:?} does not exist",
                membership.scope
            )));
        }
        let key = membership.key();
        if self.memberships.contains_key(&key) {
            return Err(StoreError::UniqueViolation(format!(
                "user {} already has a membership in {:?}",
                key.0, key.1
            )));
        }
        Arc::make_mut(&mut self.memberships).insert(key, membership);
        Ok(())
    }

    pub fn remove_membership(&mut self, user: &UserId, scope: MembershipScope) -> Option<Membership> {
        Arc::make_mut(&mut self.memberships).remove(&(user.clone(), scope))
    }

    pub fn insert_project(&mut self, project: Project) -> Result<(), StoreError> {
        if !self.workspaces.contains(&project.workspace_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "workspace {} does not exist",
                project.workspace_id
            )));
        }
        Arc::make_mut(&mut self.projects).insert_new(project, "project")
    }

    pub fn project_mut(&mut self, id: &ProjectId) -> Option<&mut Project> {
        Arc::make_mut(&mut self.projects).get_mut(id)
    }

    pub fn insert_task(&mut self, task: Task) -> Result<(), StoreError> {
        if !self.projects.contains(&task.project_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "project {} does not exist",
                task.project_id
            )));
        }
        Arc::make_mut(&mut self.tasks).insert_new(task, "task")
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        Arc::make_mut(&mut self.tasks).get_mut(id)
    }

    pub fn insert_comment(&mut self, comment: Comment) -> Result<(), StoreError> {
        if !self.tasks.contains(&comment.task_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "task {} does not exist",
                comment.task_id
            )));
        }
        if !self.users.contains(&comment.author_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "author {} does not exist",
                comment.author_id
            )));
        }
        Arc::make_mut(&mut self.comments).insert_new(comment, "comment")
    }

    pub fn remove_comment(&mut self, id: &CommentId) -> Option<Comment> {
        Arc::make_mut(&mut self.comments).remove(id)
    }

    /// Delete a task and its comments.
    pub fn remove_task(&mut self, id: &TaskId) -> Option<CascadeReport> {
        Arc::make_mut(&mut self.tasks).remove(id)?;
        let comments = Arc::make_mut(&mut self.comments).remove_where(|c| &c.task_id == id).len();
        Some(CascadeReport {
            tasks: 1,
            comments,
            ..CascadeReport::default()
        })
    }

    /// Delete a project, its tasks (and their comments) and its memberships.
    pub fn remove_project(&mut self, id: &ProjectId) -> Option<CascadeReport> {
        Arc::make_mut(&mut self.projects).remove(id)?;
        let mut report = CascadeReport {
            projects: 1,
            ..CascadeReport::default()
        };
        for task in Arc::make_mut(&mut self.tasks).remove_where(|t| &t.project_id == id) {
            report.tasks += 1;
            report.comments += Arc::make_mut(&mut self.comments).remove_where(|c| c.task_id == task).len();
        }
        report.memberships += self.remove_memberships_where(|m| m.scope == MembershipScope::Project(*id));
        Some(report)
    }

    /// Delete a workspace and everything under it.
    pub fn remove_workspace(&mut self, id: &WorkspaceId) -> Option<CascadeReport> {
        Arc::make_mut(&mut self.workspaces).remove(id)?;
        let mut report = CascadeReport {
            workspaces: 1,
            ..CascadeReport::default()
        };
        let projects: Vec<ProjectId> = self.projects_in(id).iter().map(|p| p.id).collect();
        for project in projects {
            if let Some(child) = self.remove_project(&project) {
                report.absorb(child);
            }
        }
        report.memberships += self.remove_memberships_where(|m| m.scope == MembershipScope::Workspace(*id));
        Some(report)
    }

    /// Drop every membership `user` holds in the workspace and its projects, and clear
    /// their task assignments there. Returns the number of memberships removed.
    pub fn remove_member_from_workspace(&mut self, user: &UserId, workspace: &WorkspaceId) -> usize {
        let projects: Vec<ProjectId> = self.projects_in(workspace).iter().map(|p| p.id).collect();
        let removed = self.remove_memberships_where(|m| {
            &m.user_id == user
                && match m.scope {
                    MembershipScope::Workspace(w) => &w == workspace,
                    MembershipScope::Project(p) => projects.contains(&p),
                }
        });
        for task in Arc::make_mut(&mut self.tasks).rows.values_mut() {
            if projects.contains(&task.project_id) && task.assignee_id.as_ref() == Some(user) {
                task.assignee_id = None;
            }
        }
        removed
    }

    fn remove_memberships_where(&mut self, pred: impl Fn(&Membership) -> bool) -> usize {
        let before = self.memberships.len();
        Arc::make_mut(&mut self.memberships).retain(|_, m| !pred(m));
        before - self.memberships.len()
    }
}

impl MembershipGraph for Tables {
    fn workspace_owner(&self, workspace: &WorkspaceId) -> Option<UserId> {
        self.workspaces.get(workspace).map(|w| w.owner_id.clone())
    }

    fn workspace_is_deleting(&self, workspace: &WorkspaceId) -> bool {
        self.workspaces.get(workspace).is_some_and(Workspace::is_deleting)
    }

    fn membership_role(&self, user: &UserId, scope: MembershipScope) -> Option<Role> {
        self.membership(user, scope).map(|m| m.role)
    }

    fn project_workspace(&self, project: &ProjectId) -> Option<WorkspaceId> {
        self.projects.get(project).map(|p| p.workspace_id)
    }

    fn task_project(&self, task: &TaskId) -> Option<ProjectId> {
        self.tasks.get(task).map(|t| t.project_id)
    }

    fn comment_parent(&self, comment: &CommentId) -> Option<(TaskId, UserId)> {
        self.comments.get(comment).map(|c| (c.task_id, c.author_id.clone()))
    }
}
