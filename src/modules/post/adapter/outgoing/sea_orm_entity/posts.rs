use sea_orm::entity::prelude::*;

use crate::post::application::domain::entities::Post;
use crate::shared::media::MediaType;
use crate::shared::tombstone::{RowStatus, SoftDelete};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub media_type: MediaType,
    pub location: Option<String>,
    pub is_public: bool,
    pub likes_count: i32,
    pub comments_count: i32,
    pub shares_count: i32,
    pub views_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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

fn counter(value: i32) -> u64 {
    value.max(0) as u64
}

impl Model {
    pub fn to_domain(self) -> Post {
        Post {
            id: self.id,
            author_id: self.user_id,
            caption: self.caption,
            media_url: self.media_url,
            media_type: self.media_type,
            location: self.location,
            is_public: self.is_public,
            likes_count: counter(self.likes_count),
            comments_count: counter(self.comments_count),
            shares_count: counter(self.shares_count),
            views_count: counter(self.views_count),
            created_at: self.created_at.to_utc(),
            updated_at: self.updated_at.to_utc(),
        }
    }
}
