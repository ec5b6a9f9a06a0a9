use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::media::MediaType;
use crate::user::application::domain::entities::UserSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// The other participant, seen from `viewer`.
    pub fn partner_of(&self, viewer: Uuid) -> Uuid {
        if self.sender_id == viewer {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessage {
    pub receiver_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
}

/// Inbox entry: one per partner, latest message first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub partner: UserSummary,
    pub last_message: Message,
    pub unread_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_of_either_side() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: a,
            receiver_id: b,
            content: "hi".to_string(),
            media_url: None,
            media_type: None,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };

        assert_eq!(message.partner_of(a), b);
        assert_eq!(message.partner_of(b), a);
    }
}
