use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::Utc;

use workhub_core::{ProjectId, UserId, WorkspaceId};
use workhub_infra::AddWorkspaceMember;
use workhub_workspaces::{CreateProject, CreateWorkspace};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_workspaces).post(create_workspace))
        .route("/:id", get(get_workspace).delete(delete_workspace))
        .route("/:id/members", post(add_member))
        .route("/:id/members/:user_id", delete(remove_member))
        .route("/:id/projects", post(create_project))
}

/// Every workspace the caller can see, fully expanded.
pub async fn list_workspaces(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.list_visible_workspaces(principal.principal_id()) {
        Ok(list) => Json(list).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateWorkspaceRequest>,
) -> axum::response::Response {
    let cmd = CreateWorkspace {
        workspace_id: WorkspaceId::new(),
        name: body.name,
        occurred_at: Utc::now(),
    };

    match services.create_workspace(principal.principal_id(), &cmd) {
        Ok(ws) => (StatusCode::CREATED, Json(ws)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WorkspaceId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.get_workspace(principal.principal_id(), id) {
        Ok(ws) => Json(ws).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WorkspaceId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.delete_workspace(principal.principal_id(), id) {
        Ok(report) => Json(dto::deleted_to_json(report)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddMemberRequest>,
) -> axum::response::Response {
    let id: WorkspaceId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = AddWorkspaceMember {
        workspace_id: id,
        user_id: body.user_id,
        role: body.role,
        occurred_at: Utc::now(),
    };

    match services.add_workspace_member(principal.principal_id(), &cmd) {
        Ok(m) => (StatusCode::CREATED, Json(dto::membership_to_json(m))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, user_id)): Path<(String, String)>,
) -> axum::response::Response {
    let id: WorkspaceId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let user_id: UserId = match dto::parse_id(&user_id) {
        Ok(u) => u,
        Err(res) => return res,
    };

    match services.remove_workspace_member(principal.principal_id(), id, &user_id) {
        Ok(removed) => Json(serde_json::json!({ "memberships_removed": removed })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> axum::response::Response {
    let id: WorkspaceId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = CreateProject {
        project_id: ProjectId::new(),
        workspace_id: id,
        name: body.name,
        description: body.description,
        occurred_at: Utc::now(),
    };

    match services.create_project(principal.principal_id(), &cmd) {
        Ok(project) => (StatusCode::CREATED, Json(project)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
