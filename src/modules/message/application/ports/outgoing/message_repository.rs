use async_trait::async_trait;
use uuid::Uuid;

use crate::message::application::domain::entities::{Conversation, Message};
use crate::shared::media::MediaType;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store_error::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Both participants must be active users.
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    async fn find_message(&self, message_id: Uuid) -> Result<Option<Message>, StoreError>;

    /// Sets `is_read` and `read_at` the first time only.
    async fn mark_read(&self, message_id: Uuid) -> Result<Message, StoreError>;

    /// Marks everything `other` sent to `reader`; returns how many changed.
    async fn mark_conversation_read(&self, reader: Uuid, other: Uuid) -> Result<u64, StoreError>;

    async fn conversation(
        &self,
        viewer: Uuid,
        other: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<Message>, StoreError>;

    async fn conversations(&self, viewer: Uuid) -> Result<Vec<Conversation>, StoreError>;

    async fn unread_count(&self, viewer: Uuid) -> Result<u64, StoreError>;

    async fn soft_delete_message(&self, message_id: Uuid) -> Result<(), StoreError>;
}
