use workhub_infra::{InMemoryWorkspaceStore, WorkspaceService};

/// Service graph shared by all handlers.
pub type AppServices = WorkspaceService<InMemoryWorkspaceStore>;

pub fn build_services() -> AppServices {
    WorkspaceService::new(InMemoryWorkspaceStore::new())
}
