use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use workhub_core::{CommentId, TaskId};
use workhub_infra::AssignTask;
use workhub_workspaces::{CreateComment, UpdateTask};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_task).patch(update_task).delete(delete_task))
        .route("/:id/assignee", put(assign_task))
        .route("/:id/comments", post(add_comment))
}

/// A task with its assignee and comments.
pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TaskId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.get_task(principal.principal_id(), id) {
        Ok(task) => Json(task).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateTaskRequest>,
) -> axum::response::Response {
    let id: TaskId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = UpdateTask {
        task_id: id,
        title: body.title,
        description: body.description,
        status: body.status,
        occurred_at: Utc::now(),
    };

    match services.update_task(principal.principal_id(), &cmd) {
        Ok(task) => Json(task).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn assign_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignTaskRequest>,
) -> axum::response::Response {
    let id: TaskId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = AssignTask {
        task_id: id,
        assignee: body.assignee_id,
        occurred_at: Utc::now(),
    };

    match services.assign_task(principal.principal_id(), &cmd) {
        Ok(task) => Json(task).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TaskId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.delete_task(principal.principal_id(), id) {
        Ok(report) => Json(dto::deleted_to_json(report)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateCommentRequest>,
) -> axum::response::Response {
    let id: TaskId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    let cmd = CreateComment {
        comment_id: CommentId::new(),
        task_id: id,
        body: body.body,
        occurred_at: Utc::now(),
    };

    match services.add_comment(principal.principal_id(), &cmd) {
        Ok(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
