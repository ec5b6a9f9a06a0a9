use std::sync::Arc;
use uuid::Uuid;

use crate::comment::application::domain::entities::{Comment, CommentView, CreateComment};
use crate::comment::application::ports::outgoing::{CommentRepository, NewComment};
use crate::post::application::ports::outgoing::PostRepository;
use crate::shared::constants::COMMENT_MAX_LEN;
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::validation::{check_len, extract_mentions};
use crate::user::application::domain::entities::UserId;

#[derive(Clone)]
pub struct CommentService {
    repository: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(repository: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { repository, posts }
    }

    fn check_content(content: &str) -> Result<(), SocialError> {
        if content.trim().is_empty() {
            return Err(SocialError::validation("content", "must not be blank"));
        }
        check_len("content", content, 1, COMMENT_MAX_LEN)
    }

    async fn ensure_visible(&self, viewer: Option<UserId>, post_id: Uuid) -> Result<(), SocialError> {
        self.posts
            .visible_post(viewer.map(|v| v.value()), post_id)
            .await?
            .map(|_| ())
            .ok_or(SocialError::PostNotFound)
    }

    async fn existing(&self, comment_id: Uuid) -> Result<Comment, SocialError> {
        self.repository
            .find_comment(comment_id)
            .await?
            .ok_or(SocialError::CommentNotFound)
    }

    pub async fn create_comment(
        &self,
        author: UserId,
        input: CreateComment,
    ) -> Result<Comment, SocialError> {
        Self::check_content(&input.content)?;
        self.ensure_visible(Some(author), input.post_id).await?;

        let new_comment = NewComment {
            author_id: author.value(),
            post_id: input.post_id,
            parent_id: input.parent_id,
            mentions: extract_mentions(&input.content),
            content: input.content,
        };

        let comment = self.repository.create_comment(new_comment).await?;
        tracing::info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            author_id = %author,
            is_reply = comment.is_reply(),
            "Comment created"
        );
        Ok(comment)
    }

    /// Author only.
    pub async fn update_comment(
        &self,
        actor: UserId,
        comment_id: Uuid,
        content: String,
    ) -> Result<Comment, SocialError> {
        Self::check_content(&content)?;

        let comment = self.existing(comment_id).await?;
        if comment.author_id != actor.value() {
            tracing::warn!(comment_id = %comment_id, actor_id = %actor, "Rejected comment update by non-author");
            return Err(SocialError::UnauthorizedAction);
        }

        Ok(self.repository.update_comment(comment_id, content).await?)
    }

    /// Author or owner of the post. Replies go with their parent.
    pub async fn delete_comment(&self, actor: UserId, comment_id: Uuid) -> Result<(), SocialError> {
        let comment = self.existing(comment_id).await?;

        if comment.author_id != actor.value() {
            let post_owner = self
                .posts
                .find_post(comment.post_id)
                .await?
                .map(|p| p.author_id);
            if post_owner != Some(actor.value()) {
                tracing::warn!(comment_id = %comment_id, actor_id = %actor, "Rejected comment delete");
                return Err(SocialError::UnauthorizedAction);
            }
        }

        let removed = self.repository.soft_delete_comment(comment_id).await?;
        tracing::info!(comment_id = %comment_id, actor_id = %actor, removed, "Comment soft-deleted");
        Ok(())
    }

    pub async fn comment_tree(
        &self,
        viewer: Option<UserId>,
        post_id: Uuid,
        page: PageRequest,
        replies_preview: u64,
    ) -> Result<PageResult<CommentView>, SocialError> {
        self.ensure_visible(viewer, post_id).await?;
        Ok(self
            .repository
            .comment_tree(viewer.map(|v| v.value()), post_id, page, replies_preview)
            .await?)
    }

    pub async fn replies(
        &self,
        viewer: Option<UserId>,
        comment_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<CommentView>, SocialError> {
        let parent = self.existing(comment_id).await?;
        self.ensure_visible(viewer, parent.post_id).await?;

        Ok(self
            .repository
            .replies(viewer.map(|v| v.value()), comment_id, page)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::store_error::{invariant, StoreError};
    use crate::tests::support::fixtures::{post, post_view};
    use crate::tests::support::mocks::MockPostRepo;
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;

    mock! {
        CommentRepo {}
        #[async_trait]
        impl CommentRepository for CommentRepo {
            async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;
            async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError>;
            async fn update_comment(&self, comment_id: Uuid, content: String)
                -> Result<Comment, StoreError>;
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
    }

    fn comment(id: Uuid, post_id: Uuid, author_id: Uuid) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            post_id,
            author_id,
            parent_id: None,
            content: "first".to_string(),
            likes_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn visible_posts() -> MockPostRepo {
        let mut posts = MockPostRepo::new();
        posts
            .expect_visible_post()
            .returning(|_, id| Ok(Some(post_view(id, Uuid::new_v4()))));
        posts
    }

    #[tokio::test]
    async fn test_create_comment_extracts_mentions() {
        let author = Uuid::new_v4();
        let post_id = Uuid::new_v4();

        let mut repo = MockCommentRepo::new();
        repo.expect_create_comment()
            .withf(|c| c.mentions == vec!["alice".to_string()] && c.parent_id.is_none())
            .returning(move |c| Ok(comment(Uuid::new_v4(), c.post_id, c.author_id)));

        let service = CommentService::new(Arc::new(repo), Arc::new(visible_posts()));
        let input = CreateComment {
            post_id,
            parent_id: None,
            content: "hey @alice".to_string(),
        };

        let created = service
            .create_comment(UserId::from(author), input)
            .await
            .unwrap();
        assert_eq!(created.post_id, post_id);
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() {
        let service = CommentService::new(
            Arc::new(MockCommentRepo::new()),
            Arc::new(MockPostRepo::new()),
        );
        let input = CreateComment {
            post_id: Uuid::new_v4(),
            parent_id: None,
            content: "   ".to_string(),
        };

        let err = service
            .create_comment(UserId::from(Uuid::new_v4()), input)
            .await
            .unwrap_err();
        assert!(matches!(err, SocialError::Validation { field: "content", .. }));
    }

    #[tokio::test]
    async fn test_comment_on_hidden_post_is_not_found() {
        let mut posts = MockPostRepo::new();
        posts.expect_visible_post().returning(|_, _| Ok(None));

        let service = CommentService::new(Arc::new(MockCommentRepo::new()), Arc::new(posts));
        let input = CreateComment {
            post_id: Uuid::new_v4(),
            parent_id: None,
            content: "hello".to_string(),
        };

        let err = service
            .create_comment(UserId::from(Uuid::new_v4()), input)
            .await
            .unwrap_err();
        assert_eq!(err, SocialError::PostNotFound);
    }

    #[tokio::test]
    async fn test_reply_to_reply_is_invalid_parent() {
        let mut repo = MockCommentRepo::new();
        repo.expect_create_comment()
            .returning(|_| Err(StoreError::Invariant(invariant::COMMENT_PARENT)));

        let service = CommentService::new(Arc::new(repo), Arc::new(visible_posts()));
        let input = CreateComment {
            post_id: Uuid::new_v4(),
            parent_id: Some(Uuid::new_v4()),
            content: "nested".to_string(),
        };

        let err = service
            .create_comment(UserId::from(Uuid::new_v4()), input)
            .await
            .unwrap_err();
        assert_eq!(err, SocialError::InvalidParentComment);
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_unauthorized() {
        let comment_id = Uuid::new_v4();
        let mut repo = MockCommentRepo::new();
        repo.expect_find_comment()
            .returning(move |id| Ok(Some(comment(id, Uuid::new_v4(), Uuid::new_v4()))));
        repo.expect_update_comment().never();

        let service = CommentService::new(Arc::new(repo), Arc::new(MockPostRepo::new()));
        let err = service
            .update_comment(UserId::from(Uuid::new_v4()), comment_id, "edit".to_string())
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::UnauthorizedAction);
    }

    #[tokio::test]
    async fn test_post_owner_may_delete_comment() {
        let post_owner = Uuid::new_v4();
        let post_id = Uuid::new_v4();

        let mut repo = MockCommentRepo::new();
        repo.expect_find_comment()
            .returning(move |id| Ok(Some(comment(id, post_id, Uuid::new_v4()))));
        repo.expect_soft_delete_comment().times(1).returning(|_| Ok(2));

        let mut posts = MockPostRepo::new();
        posts
            .expect_find_post()
            .returning(move |id| Ok(Some(post(id, post_owner))));

        let service = CommentService::new(Arc::new(repo), Arc::new(posts));
        assert!(service
            .delete_comment(UserId::from(post_owner), Uuid::new_v4())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_stranger_cannot_delete_comment() {
        let mut repo = MockCommentRepo::new();
        repo.expect_find_comment()
            .returning(|id| Ok(Some(comment(id, Uuid::new_v4(), Uuid::new_v4()))));
        repo.expect_soft_delete_comment().never();

        let mut posts = MockPostRepo::new();
        posts
            .expect_find_post()
            .returning(|id| Ok(Some(post(id, Uuid::new_v4()))));

        let service = CommentService::new(Arc::new(repo), Arc::new(posts));
        let err = service
            .delete_comment(UserId::from(Uuid::new_v4()), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::UnauthorizedAction);
    }

    #[tokio::test]
    async fn test_missing_comment_is_not_found() {
        let mut repo = MockCommentRepo::new();
        repo.expect_find_comment().returning(|_| Ok(None));

        let service = CommentService::new(Arc::new(repo), Arc::new(MockPostRepo::new()));
        let err = service
            .replies(None, Uuid::new_v4(), PageRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::CommentNotFound);
    }
}
