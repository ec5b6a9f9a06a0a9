use std::sync::Arc;
use uuid::Uuid;

use crate::message::application::domain::entities::{Conversation, Message, SendMessage};
use crate::message::application::ports::outgoing::{MessageRepository, NewMessage};
use crate::shared::constants::{MESSAGE_MAX_LEN, URL_MAX_LEN};
use crate::shared::error::SocialError;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::validation::{check_len, check_max};
use crate::user::application::domain::entities::UserId;

#[derive(Clone)]
pub struct MessageService {
    repository: Arc<dyn MessageRepository>,
}

impl MessageService {
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    async fn existing(&self, message_id: Uuid) -> Result<Message, SocialError> {
        self.repository
            .find_message(message_id)
            .await?
            .ok_or(SocialError::MessageNotFound)
    }

    pub async fn send_message(
        &self,
        sender: UserId,
        input: SendMessage,
    ) -> Result<Message, SocialError> {
        if sender.value() == input.receiver_id {
            return Err(SocialError::CannotMessageSelf);
        }

        check_len("content", &input.content, 1, MESSAGE_MAX_LEN)?;
        check_max("media_url", input.media_url.as_deref(), URL_MAX_LEN)?;
        match (&input.media_url, input.media_type) {
            (Some(_), Some(kind)) if !kind.is_attachment() => {
                return Err(SocialError::validation(
                    "media_type",
                    "attachments must be an image or a video",
                ));
            }
            (Some(_), None) => {
                return Err(SocialError::validation(
                    "media_type",
                    "required when media_url is set",
                ));
            }
            (None, Some(_)) => {
                return Err(SocialError::validation(
                    "media_url",
                    "required when media_type is set",
                ));
            }
            _ => {}
        }

        let message = self
            .repository
            .create_message(NewMessage {
                sender_id: sender.value(),
                receiver_id: input.receiver_id,
                content: input.content,
                media_url: input.media_url,
                media_type: input.media_type,
            })
            .await?;

        tracing::info!(
            message_id = %message.id,
            sender_id = %sender,
            receiver_id = %message.receiver_id,
            "Message sent"
        );
        Ok(message)
    }

    /// Receiver only. Reading twice keeps the first `read_at`.
    pub async fn mark_read(&self, reader: UserId, message_id: Uuid) -> Result<Message, SocialError> {
        let message = self.existing(message_id).await?;
        if message.receiver_id != reader.value() {
            tracing::warn!(message_id = %message_id, reader_id = %reader, "Rejected read receipt by non-receiver");
            return Err(SocialError::UnauthorizedAction);
        }
        if message.is_read {
            return Ok(message);
        }

        Ok(self.repository.mark_read(message_id).await?)
    }

    pub async fn mark_conversation_read(
        &self,
        reader: UserId,
        other: UserId,
    ) -> Result<u64, SocialError> {
        Ok(self
            .repository
            .mark_conversation_read(reader.value(), other.value())
            .await?)
    }

    /// Newest first.
    pub async fn conversation(
        &self,
        viewer: UserId,
        other: UserId,
        page: PageRequest,
    ) -> Result<PageResult<Message>, SocialError> {
        Ok(self
            .repository
            .conversation(viewer.value(), other.value(), page)
            .await?)
    }

    pub async fn conversations(&self, viewer: UserId) -> Result<Vec<Conversation>, SocialError> {
        Ok(self.repository.conversations(viewer.value()).await?)
    }

    pub async fn unread_count(&self, viewer: UserId) -> Result<u64, SocialError> {
        Ok(self.repository.unread_count(viewer.value()).await?)
    }

    /// Sender only.
    pub async fn delete_message(&self, actor: UserId, message_id: Uuid) -> Result<(), SocialError> {
        let message = self.existing(message_id).await?;
        if message.sender_id != actor.value() {
            tracing::warn!(message_id = %message_id, actor_id = %actor, "Rejected message delete");
            return Err(SocialError::UnauthorizedAction);
        }

        self.repository.soft_delete_message(message_id).await?;
        tracing::info!(message_id = %message_id, actor_id = %actor, "Message soft-deleted");
        Ok(())
    }
}
