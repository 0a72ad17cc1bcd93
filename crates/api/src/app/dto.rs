use core::str::FromStr;

use serde::Deserialize;

use workhub_auth::{Membership, MembershipScope, Role};
use workhub_core::{DomainError, UserId};
use workhub_infra::CascadeReport;
use workhub_workspaces::TaskStatus;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: UserId,
    #[serde(default = "default_member_role")]
    pub role: Role,
}

fn default_member_role() -> Role {
    Role::Member
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

/// `assignee_id: null` clears the assignment.
#[derive(Debug, Deserialize)]
pub struct AssignTaskRequest {
    pub assignee_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Parse a path id. Unparseable ids are reported exactly like unknown ones.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(|_| errors::not_found())
}

pub fn membership_to_json(m: Membership) -> serde_json::Value {
    let (scope, entity_id) = match m.scope {
        MembershipScope::Workspace(id) => ("workspace", id.to_string()),
        MembershipScope::Project(id) => ("project", id.to_string()),
    };
    serde_json::json!({
        "user_id": m.user_id,
        "scope": scope,
        "entity_id": entity_id,
        "role": m.role,
        "joined_at": m.joined_at,
    })
}

pub fn deleted_to_json(report: CascadeReport) -> serde_json::Value {
    serde_json::json!({ "deleted": report })
}

#[cfg(test)]
mod tests {
    use workhub_core::ProjectId;

    use super::*;

    #[test]
    fn member_role_defaults_to_member() {
        let req: AddMemberRequest = serde_json::from_str(r#"{ "user_id": "user_b" }"#).unwrap();
        assert_eq!(req.role, Role::Member);
        assert!(serde_json::from_str::<AddMemberRequest>(r#"{ "user_id": "" }"#).is_err());
    }

    #[test]
    fn bad_path_ids_look_like_missing_entities() {
        let res = parse_id::<ProjectId>("not-a-uuid").unwrap_err();
        assert_eq!(res.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
