use std::sync::Arc;

use crate::hashtag::application::domain::entities::{normalize_tag, Hashtag};
use crate::hashtag::application::ports::outgoing::HashtagRepository;
use crate::post::application::domain::entities::PostView;
use crate::post::application::ports::outgoing::PostRepository;
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::user::application::domain::entities::UserId;

#[derive(Clone)]
pub struct HashtagService {
    repository: Arc<dyn HashtagRepository>,
    posts: Arc<dyn PostRepository>,
}

impl HashtagService {
    pub fn new(repository: Arc<dyn HashtagRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { repository, posts }
    }

    pub async fn trending(&self, page: PageRequest) -> Result<PageResult<Hashtag>, SocialError> {
        Ok(self.repository.trending(page).await?)
    }

    pub async fn get_hashtag(&self, name: &str) -> Result<Hashtag, SocialError> {
        self.repository
            .find_by_name(&normalize_tag(name))
            .await?
            .ok_or(SocialError::HashtagNotFound)
    }

    pub async fn posts_by_hashtag(
        &self,
        viewer: Option<UserId>,
        name: &str,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, SocialError> {
        let tag = self.get_hashtag(name).await?;
        Ok(self
            .posts
            .posts_by_hashtag(viewer.map(|v| v.value()), &tag.name, page)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::store_error::StoreError;
    use crate::tests::support::mocks::MockPostRepo;
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use uuid::Uuid;

    mock! {
        pub HashtagRepo {}
        #[async_trait]
        impl HashtagRepository for HashtagRepo {
            async fn trending(&self, page: PageRequest) -> Result<PageResult<Hashtag>, StoreError>;
            async fn find_by_name(&self, name: &str) -> Result<Option<Hashtag>, StoreError>;
        }
    }

    #[tokio::test]
    async fn test_get_hashtag_normalizes_name() {
        let mut repo = MockHashtagRepo::new();
        repo.expect_find_by_name()
            .withf(|name| name == "rust")
            .returning(|name| {
                Ok(Some(Hashtag {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    post_count: 3,
                    created_at: Utc::now(),
                }))
            });

        let service = HashtagService::new(Arc::new(repo), Arc::new(MockPostRepo::new()));
        let tag = service.get_hashtag("#Rust").await.unwrap();

        assert_eq!(tag.post_count, 3);
    }

    #[tokio::test]
    async fn test_posts_by_unknown_hashtag() {
        let mut repo = MockHashtagRepo::new();
        repo.expect_find_by_name().returning(|_| Ok(None));
        let mut posts = MockPostRepo::new();
        posts.expect_posts_by_hashtag().never();

        let service = HashtagService::new(Arc::new(repo), Arc::new(posts));
        let err = service
            .posts_by_hashtag(None, "nothing", PageRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::HashtagNotFound);
    }
}
