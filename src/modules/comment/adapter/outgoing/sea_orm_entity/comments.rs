use sea_orm::entity::prelude::*;

use crate::comment::application::domain::entities::Comment;
use crate::shared::tombstone::{RowStatus, SoftDelete};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub likes_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub status: RowStatus,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
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
    pub fn to_domain(self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            author_id: self.user_id,
            parent_id: self.parent_id,
            content: self.content,
            likes_count: self.likes_count.max(0) as u64,
            created_at: self.created_at.to_utc(),
            updated_at: self.updated_at.to_utc(),
        }
    }
}
