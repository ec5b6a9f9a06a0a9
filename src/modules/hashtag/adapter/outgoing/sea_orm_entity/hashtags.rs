use sea_orm::entity::prelude::*;

use crate::hashtag::application::domain::entities::Hashtag;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hashtags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub post_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_hashtags::Entity")]
    PostHashtags,
}

impl Related<super::post_hashtags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostHashtags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn to_domain(self) -> Hashtag {
        Hashtag {
            id: self.id,
            name: self.name,
            post_count: self.post_count.max(0) as u64,
            created_at: self.created_at.to_utc(),
        }
    }
}
