use std::sync::Arc;

use crate::notification::application::domain::entities::Notification;
use crate::notification::application::ports::outgoing::NotificationRepository;
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::user::application::domain::entities::UserId;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(
        &self,
        user: UserId,
        page: PageRequest,
        unread_only: bool,
    ) -> Result<PageResult<Notification>, SocialError> {
        Ok(self
            .repository
            .list(user.value(), page, unread_only)
            .await?)
    }

    pub async fn unread_count(&self, user: UserId) -> Result<u64, SocialError> {
        Ok(self.repository.unread_count(user.value()).await?)
    }

    pub async fn mark_read(&self, user: UserId, notification_id: Uuid) -> Result<(), SocialError> {
        Ok(self
            .repository
            .mark_read(user.value(), notification_id)
            .await?)
    }

    pub async fn mark_all_read(&self, user: UserId) -> Result<u64, SocialError> {
        let updated = self.repository.mark_all_read(user.value()).await?;
        tracing::debug!(user_id = %user, updated, "Notifications marked read");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::store_error::{entity, StoreError};
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub NotificationRepo {}
        #[async_trait]
        impl NotificationRepository for NotificationRepo {
            async fn list(
                &self,
                recipient_id: Uuid,
                page: PageRequest,
                unread_only: bool,
            ) -> Result<PageResult<Notification>, StoreError>;
            async fn unread_count(&self, recipient_id: Uuid) -> Result<u64, StoreError>;
            async fn mark_read(&self, recipient_id: Uuid, notification_id: Uuid)
                -> Result<(), StoreError>;
            async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, StoreError>;
        }
    }

    #[tokio::test]
    async fn test_mark_read_maps_not_found() {
        let mut repo = MockNotificationRepo::new();
        repo.expect_mark_read()
            .returning(|_, _| Err(StoreError::NotFound(entity::NOTIFICATION)));

        let service = NotificationService::new(Arc::new(repo));
        let err = service
            .mark_read(UserId::from(Uuid::new_v4()), Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err, SocialError::NotificationNotFound);
    }

    #[tokio::test]
    async fn test_list_forwards_unread_filter() {
        let mut repo = MockNotificationRepo::new();
        repo.expect_list()
            .withf(|_, _, unread_only| *unread_only)
            .returning(|_, page, _| Ok(PageResult::empty(page)));

        let service = NotificationService::new(Arc::new(repo));
        let page = service
            .list(UserId::from(Uuid::new_v4()), PageRequest::default(), true)
            .await
            .unwrap();

        assert_eq!(page.total, 0);
    }
}
