use std::sync::Arc;

use crate::follow::application::domain::entities::{Follow, FollowEntry, Relationship};
use crate::follow::application::ports::outgoing::FollowRepository;
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::user::application::domain::entities::UserId;
use crate::user::application::ports::outgoing::UserRepository;

#[derive(Clone)]
pub struct FollowService {
    repository: Arc<dyn FollowRepository>,
    users: Arc<dyn UserRepository>,
}

/// A missing pair on the owner's side is a missing request, not a missing follow.
fn request_error(err: SocialError) -> SocialError {
    match err {
        SocialError::NotFollowing => SocialError::FollowRequestNotFound,
        other => other,
    }
}

impl FollowService {
    pub fn new(repository: Arc<dyn FollowRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repository, users }
    }

    async fn ensure_user(&self, user: UserId) -> Result<(), SocialError> {
        self.users
            .find_by_id(user.value())
            .await?
            .map(|_| ())
            .ok_or(SocialError::UserNotFound)
    }

    pub async fn follow(&self, follower: UserId, following: UserId) -> Result<Follow, SocialError> {
        if follower == following {
            return Err(SocialError::CannotFollowSelf);
        }

        let follow = self
            .repository
            .follow(follower.value(), following.value())
            .await
            .map_err(|e| match SocialError::from(e) {
                SocialError::ConstraintViolation { field: "follow" } => {
                    SocialError::AlreadyFollowing
                }
                other => other,
            })?;

        tracing::info!(
            follower_id = %follower,
            following_id = %following,
            status = ?follow.status,
            "Follow created"
        );
        Ok(follow)
    }

    pub async fn unfollow(&self, follower: UserId, following: UserId) -> Result<(), SocialError> {
        self.repository
            .unfollow(follower.value(), following.value())
            .await?;
        tracing::info!(follower_id = %follower, following_id = %following, "Unfollowed");
        Ok(())
    }

    pub async fn accept_request(
        &self,
        owner: UserId,
        follower: UserId,
    ) -> Result<Follow, SocialError> {
        let follow = self
            .repository
            .accept_request(owner.value(), follower.value())
            .await
            .map_err(|e| request_error(e.into()))?;

        tracing::info!(owner_id = %owner, follower_id = %follower, "Follow request accepted");
        Ok(follow)
    }

    pub async fn reject_request(&self, owner: UserId, follower: UserId) -> Result<(), SocialError> {
        self.repository
            .reject_request(owner.value(), follower.value())
            .await
            .map_err(|e| request_error(e.into()))?;

        tracing::info!(owner_id = %owner, follower_id = %follower, "Follow request rejected");
        Ok(())
    }

    pub async fn followers(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, SocialError> {
        self.ensure_user(user).await?;
        Ok(self.repository.followers(user.value(), page).await?)
    }

    pub async fn following(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, SocialError> {
        self.ensure_user(user).await?;
        Ok(self.repository.following(user.value(), page).await?)
    }

    pub async fn pending_requests(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> Result<PageResult<FollowEntry>, SocialError> {
        Ok(self.repository.pending_requests(owner.value(), page).await?)
    }

    pub async fn relationship(
        &self,
        viewer: UserId,
        other: UserId,
    ) -> Result<Relationship, SocialError> {
        if viewer == other {
            return Ok(Relationship::default());
        }
        Ok(self
            .repository
            .relationship(viewer.value(), other.value())
            .await?)
    }
}
