use async_trait::async_trait;
use uuid::Uuid;

use crate::like::application::domain::entities::{Like, LikeTarget, Liker};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// A second like by the same user fails with a `like` constraint violation.
    /// Targets the user may not see are `NotFound`, like missing ones.
    async fn like(&self, user_id: Uuid, target: LikeTarget) -> Result<Like, StoreError>;

    /// `NotFound("like")` when the user has no active like on the target.
    async fn unlike(&self, user_id: Uuid, target: LikeTarget) -> Result<(), StoreError>;

    async fn is_liked(&self, user_id: Uuid, target: LikeTarget) -> Result<bool, StoreError>;

    async fn likers(
        &self,
        viewer: Option<Uuid>,
        target: LikeTarget,
        page: PageRequest,
    ) -> Result<PageResult<Liker>, StoreError>;
}
