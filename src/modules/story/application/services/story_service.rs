use std::sync::Arc;
use uuid::Uuid;

use crate::shared::constants::{STORY_CAPTION_MAX_LEN, URL_MAX_LEN};
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::validation::{check_len, check_max};
use crate::story::application::domain::entities::{CreateStory, Story, StoryCard, StoryViewer};
use crate::story::application::ports::outgoing::{NewStory, StoryRepository};
use crate::user::application::domain::entities::UserId;

#[derive(Clone)]
pub struct StoryService {
    repository: Arc<dyn StoryRepository>,
}

impl StoryService {
    pub fn new(repository: Arc<dyn StoryRepository>) -> Self {
        Self { repository }
    }

    async fn owned(&self, actor: UserId, story_id: Uuid) -> Result<Story, SocialError> {
        let story = self
            .repository
            .find_story(story_id)
            .await?
            .ok_or(SocialError::StoryNotFound)?;

        if story.author_id != actor.value() {
            tracing::warn!(story_id = %story_id, actor_id = %actor, "Rejected story access by non-owner");
            return Err(SocialError::UnauthorizedAction);
        }
        Ok(story)
    }

    pub async fn create_story(
        &self,
        author: UserId,
        input: CreateStory,
    ) -> Result<Story, SocialError> {
        check_len("media_url", &input.media_url, 1, URL_MAX_LEN)?;
        check_max("caption", input.caption.as_deref(), STORY_CAPTION_MAX_LEN)?;
        if !input.media_type.is_attachment() {
            return Err(SocialError::validation(
                "media_type",
                "stories must be an image or a video",
            ));
        }

        let story = self
            .repository
            .create_story(NewStory {
                author_id: author.value(),
                media_url: input.media_url,
                media_type: input.media_type,
                caption: input.caption,
                expires_at: input.expires_at,
            })
            .await?;

        tracing::info!(
            story_id = %story.id,
            author_id = %author,
            expires_at = %story.expires_at,
            "Story created"
        );
        Ok(story)
    }

    pub async fn get_story(
        &self,
        viewer: Option<UserId>,
        story_id: Uuid,
    ) -> Result<StoryCard, SocialError> {
        Ok(self
            .repository
            .get_story(viewer.map(|v| v.value()), story_id)
            .await?)
    }

    pub async fn stories_by_user(
        &self,
        viewer: Option<UserId>,
        user_id: UserId,
    ) -> Result<Vec<StoryCard>, SocialError> {
        Ok(self
            .repository
            .stories_by_user(viewer.map(|v| v.value()), user_id.value())
            .await?)
    }

    pub async fn story_feed(&self, viewer: UserId) -> Result<Vec<StoryCard>, SocialError> {
        Ok(self.repository.story_feed(viewer.value()).await?)
    }

    /// Repeat views are accepted and change nothing.
    pub async fn view_story(&self, viewer: UserId, story_id: Uuid) -> Result<(), SocialError> {
        let first = self.repository.record_view(viewer.value(), story_id).await?;
        if first {
            tracing::debug!(story_id = %story_id, viewer_id = %viewer, "Story view recorded");
        }
        Ok(())
    }

    pub async fn story_viewers(
        &self,
        owner: UserId,
        story_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<StoryViewer>, SocialError> {
        self.owned(owner, story_id).await?;
        Ok(self.repository.story_viewers(story_id, page).await?)
    }

    pub async fn delete_story(&self, actor: UserId, story_id: Uuid) -> Result<(), SocialError> {
        self.owned(actor, story_id).await?;
        self.repository.soft_delete_story(story_id).await?;
        tracing::info!(story_id = %story_id, actor_id = %actor, "Story soft-deleted");
        Ok(())
    }
}
