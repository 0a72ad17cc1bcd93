//! Membership Resolver: "is this principal a member of that entity, and with what role?"
//!
//! Pure and read-only. The answer is computed from a [`MembershipGraph`] snapshot, so
//! repeated and concurrent calls are safe.

use workhub_core::{CommentId, ProjectId, TaskId, UserId, WorkspaceId};

use crate::{AuthzError, EntityKind, MembershipScope, PrincipalId, Role};

/// Read-only view of the relations authorization depends on.
///
/// Implemented by the storage layer over a consistent snapshot (or inside a write
/// transaction). `None` always means "no such entity".
pub trait MembershipGraph {
    fn workspace_owner(&self, workspace: &WorkspaceId) -> Option<UserId>;

    /// True while a cascading delete of the workspace is in progress.
    fn workspace_is_deleting(&self, workspace: &WorkspaceId) -> bool;

    fn membership_role(&self, user: &UserId, scope: MembershipScope) -> Option<Role>;

    fn project_workspace(&self, project: &ProjectId) -> Option<WorkspaceId>;

    fn task_project(&self, task: &TaskId) -> Option<ProjectId>;

    /// Parent task and author of a comment.
    fn comment_parent(&self, comment: &CommentId) -> Option<(TaskId, UserId)>;
}

impl<G> MembershipGraph for &G
where
    G: MembershipGraph + ?Sized,
{
    fn workspace_owner(&self, workspace: &WorkspaceId) -> Option<UserId> {
        (**self).workspace_owner(workspace)
    }

    fn workspace_is_deleting(&self, workspace: &WorkspaceId) -> bool {
        (**self).workspace_is_deleting(workspace)
    }

    fn membership_role(&self, user: &UserId, scope: MembershipScope) -> Option<Role> {
        (**self).membership_role(user, scope)
    }

    fn project_workspace(&self, project: &ProjectId) -> Option<WorkspaceId> {
        (**self).project_workspace(project)
    }

    fn task_project(&self, task: &TaskId) -> Option<ProjectId> {
        (**self).task_project(task)
    }

    fn comment_parent(&self, comment: &CommentId) -> Option<(TaskId, UserId)> {
        (**self).comment_parent(comment)
    }
}

/// Entity an access query is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccessTarget {
    Workspace(WorkspaceId),
    Project(ProjectId),
    /// Resolved through the task's project.
    Task(TaskId),
}

impl AccessTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            AccessTarget::Workspace(_) => EntityKind::Workspace,
            AccessTarget::Project(_) => EntityKind::Project,
            AccessTarget::Task(_) => EntityKind::Task,
        }
    }

    fn id_string(&self) -> String {
        match self {
            AccessTarget::Workspace(id) => id.to_string(),
            AccessTarget::Project(id) => id.to_string(),
            AccessTarget::Task(id) => id.to_string(),
        }
    }
}

/// Outcome of a membership query.
///
/// `workspace_role` includes the implicit `Owner` role of the workspace owner.
/// `project_role` is the direct project membership only (always `None` for
/// workspace targets).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Access {
    pub workspace_id: WorkspaceId,
    pub workspace_role: Option<Role>,
    pub project_role: Option<Role>,
}

impl Access {
    pub fn allowed(&self) -> bool {
        self.role().is_some()
    }

    /// Most privileged role across the direct and inherited paths.
    pub fn role(&self) -> Option<Role> {
        Role::strongest(self.workspace_role, self.project_role)
    }

    pub fn is_workspace_owner(&self) -> bool {
        self.workspace_role == Some(Role::Owner)
    }
}

/// Resolve the principal's access to `target`.
///
/// Fails only with `NotFound` (unknown id). A known entity the principal has no
/// relation to yields `Access` with `allowed() == false`.
pub fn has_access<G>(graph: &G, principal: &PrincipalId, target: AccessTarget) -> Result<Access, AuthzError>
where
    G: MembershipGraph + ?Sized,
{
    match target {
        AccessTarget::Workspace(workspace_id) => workspace_access(graph, principal.user_id(), workspace_id),
        AccessTarget::Project(project_id) => project_access(graph, principal.user_id(), project_id),
        AccessTarget::Task(task_id) => {
            let project_id = graph
                .task_project(&task_id)
                .ok_or_else(|| AuthzError::not_found(EntityKind::Task, task_id))?;
            project_access(graph, principal.user_id(), project_id)
        }
    }
}

/// Like [`has_access`], but a missing relation is an error (`Forbidden`).
pub fn require_access<G>(graph: &G, principal: &PrincipalId, target: AccessTarget) -> Result<Access, AuthzError>
where
    G: MembershipGraph + ?Sized,
{
    let access = has_access(graph, principal, target)?;
    if !access.allowed() {
        tracing::debug!(
            principal = %principal,
            target_kind = %target.kind(),
            target_id = %target.id_string(),
            "no membership on access path"
        );
        return Err(AuthzError::forbidden(target.kind(), target.id_string()));
    }
    Ok(access)
}

fn workspace_access<G>(graph: &G, user: &UserId, workspace_id: WorkspaceId) -> Result<Access, AuthzError>
where
    G: MembershipGraph + ?Sized,
{
    let owner = graph
        .workspace_owner(&workspace_id)
        .ok_or_else(|| AuthzError::not_found(EntityKind::Workspace, workspace_id))?;

    let implicit = (&owner == user).then_some(Role::Owner);
    let explicit = graph.membership_role(user, MembershipScope::Workspace(workspace_id));

    Ok(Access {
        workspace_id,
        workspace_role: Role::strongest(implicit, explicit),
        project_role: None,
    })
}

fn project_access<G>(graph: &G, user: &UserId, project_id: ProjectId) -> Result<Access, AuthzError>
where
    G: MembershipGraph + ?Sized,
{
    let workspace_id = graph
        .project_workspace(&project_id)
        .ok_or_else(|| AuthzError::not_found(EntityKind::Project, project_id))?;

    let inherited = workspace_access(graph, user, workspace_id)?;
    let direct = graph.membership_role(user, MembershipScope::Project(project_id));

    Ok(Access {
        project_role: direct,
        ..inherited
    })
}


#[cfg(test)]
mod tests {
    use super::fixture::{Graph, principal, user};
    use super::*;

    #[test]
    fn owner_has_owner_role_without_a_membership_row() {
        let mut g = Graph::default();
        let ws = g.workspace("alice");
        g.roles.clear();

        let access = has_access(&g, &principal("alice"), AccessTarget::Workspace(ws)).unwrap();
        assert!(access.allowed());
        assert_eq!(access.role(), Some(Role::Owner));
    }

    #[test]
    fn stranger_is_denied_but_not_not_found() {
        let mut g = Graph::default();
        let ws = g.workspace("alice");

        let access = has_access(&g, &principal("mallory"), AccessTarget::Workspace(ws)).unwrap();
        assert!(!access.allowed());
        assert_eq!(access.role(), None);

        let err = require_access(&g, &principal("mallory"), AccessTarget::Workspace(ws)).unwrap_err();
        assert!(matches!(err, AuthzError::Forbidden { kind: EntityKind::Workspace, .. }));
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let g = Graph::default();
        let p = principal("alice");

        for target in [
            AccessTarget::Workspace(WorkspaceId::new()),
            AccessTarget::Project(ProjectId::new()),
            AccessTarget::Task(TaskId::new()),
        ] {
            let err = has_access(&g, &p, target).unwrap_err();
            assert!(matches!(err, AuthzError::NotFound { kind, .. } if kind == target.kind()));
        }
    }

    #[test]
    fn workspace_membership_grants_inherited_project_visibility() {
        let mut g = Graph::default();
        let ws = g.workspace("alice");
        let project = g.project(ws);
        g.grant("bob", MembershipScope::Workspace(ws), Role::Member);

        let access = has_access(&g, &principal("bob"), AccessTarget::Project(project)).unwrap();
        assert!(access.allowed());
        assert_eq!(access.project_role, None);
        assert_eq!(access.role(), Some(Role::Member));
    }

    #[test]
    fn direct_project_membership_alone_is_enough() {
        let mut g = Graph::default();
        let ws = g.workspace("alice");
        let project = g.project(ws);
        g.grant("carol", MembershipScope::Project(project), Role::Member);

        let access = has_access(&g, &principal("carol"), AccessTarget::Project(project)).unwrap();
        assert!(access.allowed());
        assert_eq!(access.workspace_role, None);

        // Does not leak into the workspace itself or sibling projects.
        let sibling = g.project(ws);
        assert!(!has_access(&g, &principal("carol"), AccessTarget::Project(sibling)).unwrap().allowed());
    }

    #[test]
    fn project_role_is_the_strongest_of_both_paths() {
        let mut g = Graph::default();
        let ws = g.workspace("alice");
        let project = g.project(ws);
        g.grant("bob", MembershipScope::Workspace(ws), Role::Member);
        g.grant("bob", MembershipScope::Project(project), Role::Admin);

        let access = has_access(&g, &principal("bob"), AccessTarget::Project(project)).unwrap();
        assert_eq!(access.role(), Some(Role::Admin));

        let owner = has_access(&g, &principal("alice"), AccessTarget::Project(project)).unwrap();
        assert_eq!(owner.role(), Some(Role::Owner));
        assert!(owner.is_workspace_owner());
    }

    #[test]
    fn task_target_resolves_through_its_project() {
        let mut g = Graph::default();
        let ws = g.workspace("alice");
        let project = g.project(ws);
        let task = g.task(project);
        g.grant("bob", MembershipScope::Project(project), Role::Member);

        assert!(has_access(&g, &principal("bob"), AccessTarget::Task(task)).unwrap().allowed());
        assert!(!has_access(&g, &principal("eve"), AccessTarget::Task(task)).unwrap().allowed());
        assert_eq!(g.task_project(&task), Some(project));
        assert_eq!(g.workspace_owner(&ws), Some(user("alice")));
    }
}
