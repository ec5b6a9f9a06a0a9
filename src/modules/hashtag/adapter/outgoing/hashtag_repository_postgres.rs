use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::sea_orm_entity::{hashtags, post_hashtags};
use crate::hashtag::application::domain::entities::Hashtag;
use crate::hashtag::application::ports::outgoing::HashtagRepository;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::Store;
use crate::shared::store_error::StoreError;

async fn ensure_hashtag<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    now: DateTimeWithTimeZone,
) -> Result<Uuid, DbErr> {
    hashtags::Entity::insert(hashtags::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        post_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(hashtags::Column::Name)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    hashtags::Entity::find()
        .filter(hashtags::Column::Name.eq(name))
        .one(conn)
        .await?
        .map(|h| h.id)
        .ok_or_else(|| DbErr::RecordNotFound(format!("hashtag {name}")))
}

async fn bump_post_count<C: ConnectionTrait>(
    conn: &C,
    hashtag_id: Uuid,
    delta: i64,
    now: DateTimeWithTimeZone,
) -> Result<(), DbErr> {
    let mut update = hashtags::Entity::update_many()
        .col_expr(
            hashtags::Column::PostCount,
            Expr::col(hashtags::Column::PostCount).add(delta),
        )
        .col_expr(hashtags::Column::UpdatedAt, Expr::value(now))
        .filter(hashtags::Column::Id.eq(hashtag_id));
    if delta < 0 {
        update = update.filter(hashtags::Column::PostCount.gte(-delta));
    }
    update.exec(conn).await?;
    Ok(())
}

/// Makes the post's links match `names` (already normalized): new links
/// increment `post_count`, dropped links decrement it.
pub(crate) async fn sync_post_hashtags<C: ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
    names: &[String],
    now: DateTimeWithTimeZone,
) -> Result<(), DbErr> {
    let linked: Vec<(Uuid, String)> = post_hashtags::Entity::find()
        .select_only()
        .column(post_hashtags::Column::HashtagId)
        .column(hashtags::Column::Name)
        .inner_join(hashtags::Entity)
        .filter(post_hashtags::Column::PostId.eq(post_id))
        .into_tuple()
        .all(conn)
        .await?;

    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    let current: HashSet<&str> = linked.iter().map(|(_, n)| n.as_str()).collect();

    for (hashtag_id, name) in &linked {
        if wanted.contains(name.as_str()) {
            continue;
        }
        post_hashtags::Entity::delete_many()
            .filter(post_hashtags::Column::PostId.eq(post_id))
            .filter(post_hashtags::Column::HashtagId.eq(*hashtag_id))
            .exec(conn)
            .await?;
        bump_post_count(conn, *hashtag_id, -1, now).await?;
    }

    for name in names {
        if current.contains(name.as_str()) {
            continue;
        }
        let hashtag_id = ensure_hashtag(conn, name, now).await?;
        post_hashtags::Entity::insert(post_hashtags::ActiveModel {
            post_id: Set(post_id),
            hashtag_id: Set(hashtag_id),
            created_at: Set(now),
        })
        .exec_without_returning(conn)
        .await?;
        bump_post_count(conn, hashtag_id, 1, now).await?;
    }

    Ok(())
}

/// Drops every link of the selected posts, decrementing counts per hashtag.
pub(crate) async fn detach_posts<C: ConnectionTrait>(
    conn: &C,
    post_ids: &[Uuid],
    now: DateTimeWithTimeZone,
) -> Result<(), DbErr> {
    if post_ids.is_empty() {
        return Ok(());
    }

    let per_tag: Vec<(Uuid, i64)> = post_hashtags::Entity::find()
        .select_only()
        .column(post_hashtags::Column::HashtagId)
        .column_as(Expr::col(post_hashtags::Column::PostId).count(), "links")
        .filter(post_hashtags::Column::PostId.is_in(post_ids.iter().copied()))
        .group_by(post_hashtags::Column::HashtagId)
        .into_tuple()
        .all(conn)
        .await?;

    if per_tag.is_empty() {
        return Ok(());
    }

    let counts: HashMap<Uuid, i64> = per_tag.into_iter().collect();
    for (hashtag_id, links) in counts {
        bump_post_count(conn, hashtag_id, -links, now).await?;
    }

    post_hashtags::Entity::delete_many()
        .filter(post_hashtags::Column::PostId.is_in(post_ids.iter().copied()))
        .exec(conn)
        .await?;

    Ok(())
}

#[derive(Clone)]
pub struct HashtagRepositoryPostgres {
    store: Store,
}

impl HashtagRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HashtagRepository for HashtagRepositoryPostgres {
    async fn trending(&self, page: PageRequest) -> Result<PageResult<Hashtag>, StoreError> {
        let conn = self.store.conn();
        let query = hashtags::Entity::find().filter(hashtags::Column::PostCount.gt(0));

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_desc(hashtags::Column::PostCount)
            .order_by_asc(hashtags::Column::Name)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        Ok(PageResult::new(
            rows.into_iter().map(hashtags::Model::to_domain).collect(),
            page,
            total,
        ))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Hashtag>, StoreError> {
        let found = hashtags::Entity::find()
            .filter(hashtags::Column::Name.eq(name))
            .one(self.store.conn())
            .await?;
        Ok(found.map(hashtags::Model::to_domain))
    }
}
