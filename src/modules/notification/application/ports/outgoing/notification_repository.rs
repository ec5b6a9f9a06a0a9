use async_trait::async_trait;
use uuid::Uuid;

use crate::notification::application::domain::entities::Notification;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list(
        &self,
        recipient_id: Uuid,
        page: PageRequest,
        unread_only: bool,
    ) -> Result<PageResult<Notification>, StoreError>;

    async fn unread_count(&self, recipient_id: Uuid) -> Result<u64, StoreError>;

    /// Fails with `NotFound` unless the notification belongs to the recipient.
    async fn mark_read(&self, recipient_id: Uuid, notification_id: Uuid)
        -> Result<(), StoreError>;

    async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, StoreError>;
}
