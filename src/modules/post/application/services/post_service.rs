use std::sync::Arc;
use uuid::Uuid;

use crate::post::application::domain::entities::{CreatePost, Post, PostView, UpdatePost};
use crate::post::application::ports::outgoing::{NewPost, PostChanges, PostRepository};
use crate::shared::constants::{CAPTION_MAX_LEN, LOCATION_MAX_LEN, URL_MAX_LEN};
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::validation::{check_max, extract_hashtags, extract_mentions};
use crate::user::application::domain::entities::{UserId, UserRole};
use crate::user::application::ports::outgoing::UserRepository;

#[derive(Clone)]
pub struct PostService {
    repository: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(repository: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repository, users }
    }

    pub async fn create_post(&self, author: UserId, input: CreatePost) -> Result<Post, SocialError> {
        check_max("caption", input.caption.as_deref(), CAPTION_MAX_LEN)?;
        check_max("media_url", input.media_url.as_deref(), URL_MAX_LEN)?;
        check_max("location", input.location.as_deref(), LOCATION_MAX_LEN)?;

        if input.media_type.is_attachment() && input.media_url.is_none() {
            return Err(SocialError::validation(
                "media_url",
                "required for image and video posts",
            ));
        }
        let has_caption = input
            .caption
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false);
        if !has_caption && input.media_url.is_none() {
            return Err(SocialError::validation(
                "caption",
                "a post needs a caption or media",
            ));
        }

        let caption = input.caption.unwrap_or_default();
        let new_post = NewPost {
            author_id: author.value(),
            hashtags: extract_hashtags(&caption),
            mentions: extract_mentions(&caption),
            caption: has_caption.then_some(caption),
            media_url: input.media_url,
            media_type: input.media_type,
            location: input.location,
            is_public: input.is_public.unwrap_or(true),
        };

        let post = self.repository.create_post(new_post).await?;
        tracing::info!(post_id = %post.id, author_id = %author, "Post created");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        actor: UserId,
        post_id: Uuid,
        update: UpdatePost,
    ) -> Result<Post, SocialError> {
        check_max(
            "caption",
            update.caption.as_value().map(String::as_str),
            CAPTION_MAX_LEN,
        )?;
        check_max(
            "location",
            update.location.as_value().map(String::as_str),
            LOCATION_MAX_LEN,
        )?;

        let owner = self.post_owner(post_id).await?;
        if owner != actor {
            tracing::warn!(post_id = %post_id, actor_id = %actor, "Rejected post update by non-owner");
            return Err(SocialError::UnauthorizedAction);
        }

        let caption = update.caption.into_change();
        let hashtags = caption.as_ref().map(|c| {
            c.as_deref()
                .map(extract_hashtags)
                .unwrap_or_default()
        });

        let changes = PostChanges {
            caption,
            location: update.location.into_change(),
            is_public: update.is_public,
            hashtags,
        };

        Ok(self.repository.update_post(post_id, changes).await?)
    }

    /// Owner or admin only.
    pub async fn delete_post(&self, actor: UserId, post_id: Uuid) -> Result<(), SocialError> {
        let owner = self.post_owner(post_id).await?;

        if owner != actor {
            let is_admin = self
                .users
                .find_by_id(actor.value())
                .await?
                .map(|u| u.role == UserRole::Admin)
                .unwrap_or(false);
            if !is_admin {
                tracing::warn!(post_id = %post_id, actor_id = %actor, "Rejected post delete");
                return Err(SocialError::UnauthorizedAction);
            }
        }

        self.repository.soft_delete_post(post_id).await?;
        tracing::info!(post_id = %post_id, actor_id = %actor, "Post soft-deleted");
        Ok(())
    }

    pub async fn get_post(
        &self,
        viewer: Option<UserId>,
        post_id: Uuid,
    ) -> Result<PostView, SocialError> {
        self.repository
            .visible_post(viewer.map(|v| v.value()), post_id)
            .await?
            .ok_or(SocialError::PostNotFound)
    }

    pub async fn posts_by_user(
        &self,
        viewer: Option<UserId>,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, SocialError> {
        self.users
            .find_by_id(user_id.value())
            .await?
            .ok_or(SocialError::UserNotFound)?;

        Ok(self
            .repository
            .posts_by_user(viewer.map(|v| v.value()), user_id.value(), page)
            .await?)
    }

    pub async fn post_owner(&self, post_id: Uuid) -> Result<UserId, SocialError> {
        self.repository
            .find_post(post_id)
            .await?
            .map(|p| UserId::from(p.author_id))
            .ok_or(SocialError::PostNotFound)
    }

    pub async fn feed(
        &self,
        viewer: UserId,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, SocialError> {
        Ok(self.repository.feed(viewer.value(), page).await?)
    }

    /// Counts a view; posts the viewer cannot see are `PostNotFound`.
    pub async fn record_view(
        &self,
        viewer: Option<UserId>,
        post_id: Uuid,
    ) -> Result<(), SocialError> {
        Ok(self
            .repository
            .increment_views(viewer.map(|v| v.value()), post_id)
            .await?)
    }

    pub async fn record_share(
        &self,
        viewer: Option<UserId>,
        post_id: Uuid,
    ) -> Result<(), SocialError> {
        Ok(self
            .repository
            .increment_shares(viewer.map(|v| v.value()), post_id)
            .await?)
    }
}
