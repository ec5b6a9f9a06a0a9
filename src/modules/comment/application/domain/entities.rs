use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::application::domain::entities::UserSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    /// Set on replies; replies are never parents themselves.
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub likes_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: UserSummary,
    pub replies_count: u64,
    pub is_liked: bool,
    /// First replies, oldest first. Empty for replies and when not requested.
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub post_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub content: String,
}
