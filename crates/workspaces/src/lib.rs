//! `workhub-workspaces` — the project-management entities.
//!
//! Plain records plus the commands that create or change them. Validation lives
//! here; authorization and persistence do not.

pub mod comment;
pub mod project;
pub mod task;
pub mod text;
pub mod user;
pub mod workspace;

pub use comment::{Comment, CreateComment};
pub use project::{CreateProject, Project, UpdateProject};
pub use task::{CreateTask, Task, TaskStatus, UpdateTask};
pub use user::{User, UserProfile};
pub use workspace::{CreateWorkspace, Workspace, WorkspaceState};
