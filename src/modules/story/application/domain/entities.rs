use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::media::MediaType;
use crate::user::application::domain::entities::UserSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: Uuid,
    pub author_id: Uuid,
    pub media_url: String,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub views_count: u64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Story {
    /// A story is gone at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A story as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryCard {
    #[serde(flatten)]
    pub story: Story,
    pub author: UserSummary,
    pub is_viewed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryViewer {
    pub user: UserSummary,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateStory {
    pub media_url: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub caption: Option<String>,
    /// Defaults to creation time plus 24 hours.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}
