use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use workhub_core::{ProjectId, TaskId};
use workhub_infra::AddProjectMember;
use workhub_workspaces::{CreateTask, UpdateProject};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_project).patch(update_project).delete(delete_project))
        .route("/:id/members", post(add_member))
        .route("/:id/tasks", post(create_task))
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProjectId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.get_project(principal.principal_id(), id) {
        Ok(project) => Json(project).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProjectRequest>,
) -> axum::response::Response {
    let id: ProjectId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = UpdateProject {
        project_id: id,
        name: body.name,
        description: body.description,
        occurred_at: Utc::now(),
    };

    match services.update_project(principal.principal_id(), &cmd) {
        Ok(project) => Json(project).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProjectId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.delete_project(principal.principal_id(), id) {
        Ok(report) => Json(dto::deleted_to_json(report)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Add a project member; they join the workspace as `member` if not already in it.
pub async fn add_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddMemberRequest>,
) -> axum::response::Response {
    let id: ProjectId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = AddProjectMember {
        project_id: id,
        user_id: body.user_id,
        role: body.role,
        occurred_at: Utc::now(),
    };

    match services.add_project_member(principal.principal_id(), &cmd) {
        Ok(m) => (StatusCode::CREATED, Json(dto::membership_to_json(m))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateTaskRequest>,
) -> axum::response::Response {
    let id: ProjectId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = CreateTask {
        task_id: TaskId::new(),
        project_id: id,
        title: body.title,
        description: body.description,
        occurred_at: Utc::now(),
    };

    match services.create_task(principal.principal_id(), &cmd) {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
