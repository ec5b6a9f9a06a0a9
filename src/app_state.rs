use std::sync::Arc;
use std::time::Duration;

use crate::comment::adapter::outgoing::CommentRepositoryPostgres;
use crate::comment::application::services::CommentService;
use crate::follow::adapter::outgoing::FollowRepositoryPostgres;
use crate::follow::application::services::FollowService;
use crate::hashtag::adapter::outgoing::HashtagRepositoryPostgres;
use crate::hashtag::application::services::HashtagService;
use crate::like::adapter::outgoing::LikeRepositoryPostgres;
use crate::like::application::services::LikeService;
use crate::message::adapter::outgoing::MessageRepositoryPostgres;
use crate::message::application::services::MessageService;
use crate::notification::adapter::outgoing::NotificationRepositoryPostgres;
use crate::notification::application::services::NotificationService;
use crate::post::adapter::outgoing::PostRepositoryPostgres;
use crate::post::application::ports::outgoing::PostRepository;
use crate::post::application::services::PostService;
use crate::shared::store::Store;
use crate::story::adapter::outgoing::StoryRepositoryPostgres;
use crate::story::application::ports::outgoing::StoryRepository;
use crate::story::application::services::{StoryExpirySweeper, StoryService};
use crate::user::adapter::outgoing::UserRepositoryPostgres;
use crate::user::application::ports::incoming::IUserUseCases;
use crate::user::application::ports::outgoing::{PasswordHasher, UserRepository};
use crate::user::application::services::UserService;

/// Every service, wired over one `Store`.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub users: Arc<dyn IUserUseCases>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub likes: Arc<LikeService>,
    pub follows: Arc<FollowService>,
    pub stories: Arc<StoryService>,
    pub messages: Arc<MessageService>,
    pub notifications: Arc<NotificationService>,
    pub hashtags: Arc<HashtagService>,
    story_repository: Arc<dyn StoryRepository>,
}

impl AppState {
    pub fn new(store: Store, hasher: Arc<dyn PasswordHasher>) -> Self {
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(UserRepositoryPostgres::new(store.clone()));
        let post_repo: Arc<dyn PostRepository> =
            Arc::new(PostRepositoryPostgres::new(store.clone()));
        let story_repo: Arc<dyn StoryRepository> =
            Arc::new(StoryRepositoryPostgres::new(store.clone()));

        let comment_repo = Arc::new(CommentRepositoryPostgres::new(store.clone()));
        let like_repo = Arc::new(LikeRepositoryPostgres::new(store.clone()));
        let follow_repo = Arc::new(FollowRepositoryPostgres::new(store.clone()));
        let message_repo = Arc::new(MessageRepositoryPostgres::new(store.clone()));
        let notification_repo = Arc::new(NotificationRepositoryPostgres::new(store.clone()));
        let hashtag_repo = Arc::new(HashtagRepositoryPostgres::new(store.clone()));

        Self {
            users: Arc::new(UserService::new(Arc::clone(&user_repo), hasher)),
            posts: Arc::new(PostService::new(Arc::clone(&post_repo), Arc::clone(&user_repo))),
            comments: Arc::new(CommentService::new(comment_repo, Arc::clone(&post_repo))),
            likes: Arc::new(LikeService::new(like_repo)),
            follows: Arc::new(FollowService::new(follow_repo, user_repo)),
            stories: Arc::new(StoryService::new(Arc::clone(&story_repo))),
            messages: Arc::new(MessageService::new(message_repo)),
            notifications: Arc::new(NotificationService::new(notification_repo)),
            hashtags: Arc::new(HashtagService::new(hashtag_repo, post_repo)),
            story_repository: story_repo,
            store,
        }
    }

    /// Sweeper sharing this state's story repository and clock.
    pub fn story_sweeper(&self, period: Duration) -> StoryExpirySweeper {
        StoryExpirySweeper::new(
            Arc::clone(&self.story_repository),
            self.store.clock(),
            period,
        )
    }
}
