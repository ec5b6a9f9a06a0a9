use async_trait::async_trait;
use uuid::Uuid;

use crate::follow::application::domain::entities::{Follow, FollowEntry, Relationship};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Pending when the target is private. An existing pair, in any state,
    /// fails with a `follow` constraint violation.
    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<Follow, StoreError>;

    /// Removes the pair whatever its state, so it also withdraws a request.
    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<(), StoreError>;

    async fn accept_request(&self, owner_id: Uuid, follower_id: Uuid)
        -> Result<Follow, StoreError>;

    async fn reject_request(&self, owner_id: Uuid, follower_id: Uuid) -> Result<(), StoreError>;

    async fn followers(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, StoreError>;

    async fn following(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, StoreError>;

    async fn pending_requests(
        &self,
        owner_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, StoreError>;

    async fn relationship(&self, viewer: Uuid, other: Uuid) -> Result<Relationship, StoreError>;
}
