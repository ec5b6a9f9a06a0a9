use async_trait::async_trait;
use uuid::Uuid;

use crate::post::application::domain::entities::{Post, PostView};
use crate::shared::media::MediaType;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub author_id: Uuid,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub media_type: MediaType,
    pub location: Option<String>,
    pub is_public: bool,
    /// Normalized tag names found in the caption.
    pub hashtags: Vec<String>,
    /// Usernames mentioned in the caption.
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
    pub caption: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub is_public: Option<bool>,
    /// `Some` when the caption changed and links must be re-synced.
    pub hashtags: Option<Vec<String>>,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts the post, links hashtags and sends mention notifications
    /// in one transaction.
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError>;

    /// Active post regardless of visibility.
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError>;

    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Post, StoreError>;

    /// Tombstones the post and its comments, drops likes and hashtag links.
    async fn soft_delete_post(&self, post_id: Uuid) -> Result<(), StoreError>;

    /// `None` when the post is missing or hidden from the viewer.
    async fn visible_post(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
    ) -> Result<Option<PostView>, StoreError>;

    async fn posts_by_user(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, StoreError>;

    async fn feed(&self, viewer: Uuid, page: PageRequest)
        -> Result<PageResult<PostView>, StoreError>;

    async fn posts_by_hashtag(
        &self,
        viewer: Option<Uuid>,
        hashtag: &str,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, StoreError>;

    /// `NotFound("post")` when the post is gone or hidden from `viewer`.
    async fn increment_views(&self, viewer: Option<Uuid>, post_id: Uuid) -> Result<(), StoreError>;
    async fn increment_shares(&self, viewer: Option<Uuid>, post_id: Uuid)
        -> Result<(), StoreError>;
}
