use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workhub_core::{DomainResult, Entity, ProjectId, TaskId, UserId};

use crate::text::{normalize_name, normalize_optional_body};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

/// A unit of work inside one project.
///
/// The assignee, when set, holds membership in the project (directly or through
/// the workspace). Enforced at assignment time by the mutation guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub task_id: TaskId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub occurred_at: DateTime<Utc>,
}

impl Task {
    pub fn create(cmd: &CreateTask) -> DomainResult<Self> {
        Ok(Self {
            id: cmd.task_id,
            project_id: cmd.project_id,
            title: normalize_name("task title", &cmd.title)?,
            description: normalize_optional_body("description", cmd.description.as_deref())?,
            status: TaskStatus::Todo,
            assignee_id: None,
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    pub fn apply_update(&mut self, cmd: &UpdateTask) -> DomainResult<()> {
        let title = match &cmd.title {
            Some(raw) => normalize_name("task title", raw)?,
            None => self.title.clone(),
        };
        let description = match &cmd.description {
            Some(raw) => normalize_optional_body("description", Some(raw.as_str()))?,
            None => self.description.clone(),
        };
        self.title = title;
        self.description = description;
        if let Some(status) = cmd.status {
            self.status = status;
        }
        self.updated_at = cmd.occurred_at;
        Ok(())
    }

    pub fn assign(&mut self, assignee: Option<UserId>, at: DateTime<Utc>) {
        self.assignee_id = assignee;
        self.updated_at = at;
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &TaskId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
