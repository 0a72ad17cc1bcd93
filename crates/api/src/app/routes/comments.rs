use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::delete,
};

use workhub_core::CommentId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/:id", delete(delete_comment))
}

/// Authors may delete their own comments; workspace admins any comment.
pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CommentId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.delete_comment(principal.principal_id(), id) {
        Ok(comment) => Json(comment).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
