use sea_orm::entity::prelude::*;

use crate::shared::media::MediaType;
use crate::shared::tombstone::{RowStatus, SoftDelete};
use crate::story::application::domain::entities::Story;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_url: String,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub views_count: i32,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub status: RowStatus,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::story_views::Entity")]
    StoryViews,
}

impl Related<super::story_views::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoryViews.def()
    }
}

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
    pub fn to_domain(self) -> Story {
        Story {
            id: self.id,
            author_id: self.user_id,
            media_url: self.media_url,
            media_type: self.media_type,
            caption: self.caption,
            views_count: self.views_count.max(0) as u64,
            expires_at: self.expires_at.to_utc(),
            created_at: self.created_at.to_utc(),
        }
    }
}
