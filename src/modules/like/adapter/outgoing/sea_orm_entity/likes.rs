use sea_orm::entity::prelude::*;

use crate::like::application::domain::entities::{Like, LikeTarget};
use crate::shared::store_error::StoreError;
use crate::shared::tombstone::{RowStatus, SoftDelete};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "likes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
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
    /// Rows always carry exactly one target; anything else is corruption.
    pub fn to_domain(self) -> Result<Like, StoreError> {
        let target = LikeTarget::from_parts(self.post_id, self.comment_id).map_err(|_| {
            StoreError::DatabaseError(format!("like {} has no single target", self.id))
        })?;
        Ok(Like {
            id: self.id,
            user_id: self.user_id,
            target,
            created_at: self.created_at.to_utc(),
        })
    }
}
