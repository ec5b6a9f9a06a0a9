use sea_orm::entity::prelude::*;

use crate::message::application::domain::entities::Message;
use crate::shared::media::MediaType;
use crate::shared::tombstone::{RowStatus, SoftDelete};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub is_read: bool,
    pub read_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub status: RowStatus,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl SoftDelete for Entity {
    fn status_column() -> Column {
        Column::Status
    }

    fn deleted_at_column() -> Column {
        Column::DeletedAt
    }
}

impl Model {
    pub fn to_domain(self) -> Message {
        Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            media_url: self.media_url,
            media_type: self.media_type,
            is_read: self.is_read,
            read_at: self.read_at.map(|at| at.to_utc()),
            created_at: self.created_at.to_utc(),
        }
    }
}
