use std::sync::Arc;

use crate::like::application::domain::entities::{Like, LikeTarget, Liker};
use crate::like::application::ports::outgoing::LikeRepository;
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::user::application::domain::entities::UserId;

#[derive(Clone)]
pub struct LikeService {
    repository: Arc<dyn LikeRepository>,
}

impl LikeService {
    pub fn new(repository: Arc<dyn LikeRepository>) -> Self {
        Self { repository }
    }

    pub async fn like(&self, user: UserId, target: LikeTarget) -> Result<Like, SocialError> {
        let like = self
            .repository
            .like(user.value(), target)
            .await
            .map_err(|e| match SocialError::from(e) {
                SocialError::ConstraintViolation { field: "like" } => SocialError::AlreadyLiked,
                other => other,
            })?;

        tracing::info!(user_id = %user, target = ?target, "Liked");
        Ok(like)
    }

    pub async fn unlike(&self, user: UserId, target: LikeTarget) -> Result<(), SocialError> {
        self.repository.unlike(user.value(), target).await?;
        tracing::info!(user_id = %user, target = ?target, "Unliked");
        Ok(())
    }

    pub async fn is_liked(&self, viewer: UserId, target: LikeTarget) -> Result<bool, SocialError> {
        Ok(self.repository.is_liked(viewer.value(), target).await?)
    }

    pub async fn likers(
        &self,
        viewer: Option<UserId>,
        target: LikeTarget,
        page: PageRequest,
    ) -> Result<PageResult<Liker>, SocialError> {
        Ok(self
            .repository
            .likers(viewer.map(|v| v.value()), target, page)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::store_error::{entity, StoreError};
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::eq;
    use uuid::Uuid;

    mock! {
        LikeRepo {}
        #[async_trait]
        impl LikeRepository for LikeRepo {
            async fn like(&self, user_id: Uuid, target: LikeTarget) -> Result<Like, StoreError>;
            async fn unlike(&self, user_id: Uuid, target: LikeTarget) -> Result<(), StoreError>;
            async fn is_liked(&self, user_id: Uuid, target: LikeTarget) -> Result<bool, StoreError>;
            async fn likers(
                &self,
                viewer: Option<Uuid>,
                target: LikeTarget,
                page: PageRequest,
            ) -> Result<PageResult<Liker>, StoreError>;
        }
    }

    #[tokio::test]
    async fn test_like_returns_row() {
        let user = Uuid::new_v4();
        let target = LikeTarget::Post(Uuid::new_v4());

        let mut repo = MockLikeRepo::new();
        repo.expect_like()
            .with(eq(user), eq(target))
            .times(1)
            .returning(|user_id, target| {
                Ok(Like {
                    id: Uuid::new_v4(),
                    user_id,
                    target,
                    created_at: Utc::now(),
                })
            });

        let service = LikeService::new(Arc::new(repo));
        let like = service.like(UserId::from(user), target).await.unwrap();

        assert_eq!(like.target, target);
    }

    #[tokio::test]
    async fn test_duplicate_like_is_already_liked() {
        let mut repo = MockLikeRepo::new();
        repo.expect_like()
            .returning(|_, _| Err(StoreError::ConstraintViolation { field: "like" }));

        let service = LikeService::new(Arc::new(repo));
        let err = service
            .like(UserId::from(Uuid::new_v4()), LikeTarget::Comment(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::AlreadyLiked);
    }

    #[tokio::test]
    async fn test_like_on_missing_post() {
        let mut repo = MockLikeRepo::new();
        repo.expect_like()
            .returning(|_, _| Err(StoreError::NotFound(entity::POST)));

        let service = LikeService::new(Arc::new(repo));
        let err = service
            .like(UserId::from(Uuid::new_v4()), LikeTarget::Post(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::PostNotFound);
    }

    #[tokio::test]
    async fn test_likers_of_hidden_comment_is_comment_not_found() {
        let viewer = Uuid::new_v4();
        let target = LikeTarget::Comment(Uuid::new_v4());

        let mut repo = MockLikeRepo::new();
        repo.expect_likers()
            .withf(move |v, t, _| *v == Some(viewer) && *t == target)
            .returning(|_, _, _| Err(StoreError::NotFound(entity::COMMENT)));

        let service = LikeService::new(Arc::new(repo));
        let err = service
            .likers(Some(UserId::from(viewer)), target, PageRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::CommentNotFound);
    }

    #[tokio::test]
    async fn test_unlike_without_like_is_not_liked() {
        let mut repo = MockLikeRepo::new();
        repo.expect_unlike()
            .returning(|_, _| Err(StoreError::NotFound(entity::LIKE)));

        let service = LikeService::new(Arc::new(repo));
        let err = service
            .unlike(UserId::from(Uuid::new_v4()), LikeTarget::Post(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::NotLiked);
    }
}
