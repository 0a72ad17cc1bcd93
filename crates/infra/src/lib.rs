//! Infrastructure layer: transactional storage, read aggregation and write orchestration.

pub mod hierarchy;
pub mod service;
pub mod store;


pub use hierarchy::{
    CommentView, MemberView, ProjectAggregate, TaskAggregate, UserSummary, WorkspaceAggregate, list_visible_workspaces,
};
pub use service::{AddProjectMember, AddWorkspaceMember, AssignTask, ServiceError, ServiceResult, WorkspaceService};
pub use store::{CascadeReport, InMemoryWorkspaceStore, StoreError, Tables, WorkspaceStore};
