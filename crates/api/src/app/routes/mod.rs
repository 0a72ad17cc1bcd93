use axum::{Router, routing::get};

pub mod comments;
pub mod projects;
pub mod system;
pub mod tasks;
pub mod workspaces;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/workspaces", workspaces::router())
        .nest("/projects", projects::router())
        .nest("/tasks", tasks::router())
        .nest("/comments", comments::router())
}
