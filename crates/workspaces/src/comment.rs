use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workhub_core::{CommentId, DomainResult, Entity, TaskId, UserId};

use crate::text::normalize_body;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub comment_id: CommentId,
    pub task_id: TaskId,
    pub body: String,
    pub occurred_at: DateTime<Utc>,
}

impl Comment {
    pub fn create(author_id: UserId, cmd: &CreateComment) -> DomainResult<Self> {
        Ok(Self {
            id: cmd.comment_id,
            task_id: cmd.task_id,
            author_id,
            body: normalize_body("comment body", &cmd.body)?,
            created_at: cmd.occurred_at,
        })
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> &CommentId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
