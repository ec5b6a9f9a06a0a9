use async_trait::async_trait;
use uuid::Uuid;

use crate::comment::application::domain::entities::{Comment, CommentView};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub mentions: Vec<String>,
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// One transaction: insert, bump `posts.comments_count`, notify the post
    /// owner and mentioned users. A parent that is missing, on another post,
    /// or itself a reply fails with the `comment_parent` invariant.
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError>;

    async fn update_comment(&self, comment_id: Uuid, content: String)
        -> Result<Comment, StoreError>;

    /// Tombstones the comment and its replies; returns how many were removed.
    async fn soft_delete_comment(&self, comment_id: Uuid) -> Result<u64, StoreError>;

    async fn comment_tree(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
        page: PageRequest,
        replies_preview: u64,
    ) -> Result<PageResult<CommentView>, StoreError>;

    async fn replies(
        &self,
        viewer: Option<Uuid>,
        comment_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<CommentView>, StoreError>;
}
