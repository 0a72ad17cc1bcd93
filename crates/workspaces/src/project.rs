use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workhub_core::{DomainResult, Entity, ProjectId, WorkspaceId};

use crate::text::{normalize_name, normalize_optional_body};

/// A project inside exactly one workspace. The parent never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub project_id: ProjectId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a field as is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProject {
    pub project_id: ProjectId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Project {
    pub fn create(cmd: &CreateProject) -> DomainResult<Self> {
        Ok(Self {
            id: cmd.project_id,
            workspace_id: cmd.workspace_id,
            name: normalize_name("project name", &cmd.name)?,
            description: normalize_optional_body("description", cmd.description.as_deref())?,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    pub fn apply_update(&mut self, cmd: &UpdateProject) -> DomainResult<()> {
        let name = match &cmd.name {
            Some(raw) => normalize_name("project name", raw)?,
            None => self.name.clone(),
        };
        let description = match &cmd.description {
            Some(raw) => normalize_optional_body("description", Some(raw.as_str()))?,
            None => self.description.clone(),
        };
        self.name = name;
        self.description = description;
        self.updated_at = cmd.occurred_at;
        Ok(())
    }
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> &ProjectId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::create(&CreateProject {
            project_id: ProjectId::new(),
            workspace_id: WorkspaceId::new(),
            name: "Launch".to_string(),
            description: Some("   ".to_string()),
            occurred_at: Utc::now(),
        })
        .unwrap()
    }

    #[test]
    fn blank_description_is_dropped() {
        assert_eq!(project().description, None);
    }

    #[test]
    fn failed_update_leaves_project_untouched() {
        let mut p = project();
        let before = p.clone();
        let err = p.apply_update(&UpdateProject {
            project_id: p.id,
            name: Some("".to_string()),
            description: Some("new".to_string()),
            occurred_at: Utc::now(),
        });
        assert!(err.is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn empty_description_clears_it() {
        let mut p = project();
        let at = Utc::now();
        p.apply_update(&UpdateProject {
            project_id: p.id,
            name: None,
            description: Some("Ship v1".to_string()),
            occurred_at: at,
        })
        .unwrap();
        assert_eq!(p.description.as_deref(), Some("Ship v1"));

        p.apply_update(&UpdateProject {
            project_id: p.id,
            name: None,
            description: Some(String::new()),
            occurred_at: at,
        })
        .unwrap();
        assert_eq!(p.description, None);
        assert_eq!(p.name, "Launch");
    }
}
