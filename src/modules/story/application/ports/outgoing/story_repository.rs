use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::media::MediaType;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;
use crate::story::application::domain::entities::{Story, StoryCard, StoryViewer};

#[derive(Debug, Clone, PartialEq)]
pub struct NewStory {
    pub author_id: Uuid,
    pub media_url: String,
    pub media_type: MediaType,
    pub caption: Option<String>,
    /// `None` means the store's clock plus the story lifetime.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Expiry is judged against the store's clock on every read.
#[async_trait]
pub trait StoryRepository: Send + Sync {
    async fn create_story(&self, story: NewStory) -> Result<Story, StoreError>;

    /// Active story regardless of expiry or viewer.
    async fn find_story(&self, story_id: Uuid) -> Result<Option<Story>, StoreError>;

    /// `Invariant("story_expired")` once `expires_at <= now`.
    async fn get_story(
        &self,
        viewer: Option<Uuid>,
        story_id: Uuid,
    ) -> Result<StoryCard, StoreError>;

    async fn stories_by_user(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<Vec<StoryCard>, StoreError>;

    /// Live stories of the viewer and of accounts they follow.
    async fn story_feed(&self, viewer: Uuid) -> Result<Vec<StoryCard>, StoreError>;

    /// Returns whether this was the viewer's first view.
    async fn record_view(&self, viewer: Uuid, story_id: Uuid) -> Result<bool, StoreError>;

    async fn story_viewers(
        &self,
        story_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<StoryViewer>, StoreError>;

    async fn soft_delete_story(&self, story_id: Uuid) -> Result<(), StoreError>;

    /// Tombstones stories with `expires_at <= now`; returns how many.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
