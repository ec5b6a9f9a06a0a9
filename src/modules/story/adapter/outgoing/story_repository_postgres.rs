use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::collections::HashSet;
use uuid::Uuid;

use super::sea_orm_entity::{stories, story_views};
use crate::follow::adapter::outgoing::accepted_following_ids;
use crate::shared::constants::STORY_LIFETIME_HOURS;
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::{finish, Store};
use crate::shared::store_error::{entity, invariant, StoreError};
use crate::shared::tombstone::{ActiveOnly, RowStatus, SoftDelete};
use crate::story::application::domain::entities::{Story, StoryCard, StoryViewer};
use crate::story::application::ports::outgoing::{NewStory, StoryRepository};
use crate::user::adapter::outgoing::{
    active_user_ids, find_active_user, load_user_summaries, public_user_ids,
};

/// Stories the viewer may see: their own, those of accounts they follow
/// (accepted), and those of public accounts. Authors must be active.
fn visibility(viewer: Option<Uuid>) -> Condition {
    let mut allowed =
        Condition::any().add(stories::Column::UserId.in_subquery(public_user_ids()));

    if let Some(viewer) = viewer {
        allowed = allowed
            .add(stories::Column::UserId.eq(viewer))
            .add(stories::Column::UserId.in_subquery(accepted_following_ids(viewer)));
    }

    Condition::all()
        .add(allowed)
        .add(stories::Column::UserId.in_subquery(active_user_ids()))
}

fn live_stories(viewer: Option<Uuid>, now: DateTimeWithTimeZone) -> Select<stories::Entity> {
    stories::Entity::find()
        .active()
        .filter(stories::Column::ExpiresAt.gt(now))
        .filter(visibility(viewer))
}

async fn build_story_cards<C: ConnectionTrait>(
    conn: &C,
    viewer: Option<Uuid>,
    rows: Vec<stories::Model>,
) -> Result<Vec<StoryCard>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|s| s.id).collect();
    let authors = load_user_summaries(conn, rows.iter().map(|s| s.user_id)).await?;

    let viewed: HashSet<Uuid> = match viewer {
        Some(viewer) => story_views::Entity::find()
            .filter(story_views::Column::UserId.eq(viewer))
            .filter(story_views::Column::StoryId.is_in(ids))
            .select_only()
            .column(story_views::Column::StoryId)
            .into_tuple::<Uuid>()
            .all(conn)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let author = authors.get(&row.user_id)?.clone();
            let id = row.id;
            Some(StoryCard {
                story: row.to_domain(),
                author,
                is_viewed: viewed.contains(&id),
            })
        })
        .collect())
}

#[derive(Clone)]
pub struct StoryRepositoryPostgres {
    store: Store,
}

impl StoryRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn insert_view(
        txn: &DatabaseTransaction,
        viewer: Uuid,
        story_id: Uuid,
        now: DateTimeWithTimeZone,
    ) -> Result<bool, StoreError> {
        let story = stories::Entity::find_by_id(story_id)
            .active()
            .filter(visibility(Some(viewer)))
            .one(txn)
            .await?
            .ok_or(StoreError::NotFound(entity::STORY))?;

        if story.expires_at <= now {
            return Err(StoreError::Invariant(invariant::STORY_EXPIRED));
        }
        if story.user_id == viewer {
            return Ok(false);
        }

        let inserted = story_views::Entity::insert(story_views::ActiveModel {
            id: Set(Uuid::new_v4()),
            story_id: Set(story_id),
            user_id: Set(viewer),
            viewed_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([story_views::Column::StoryId, story_views::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

        if inserted == 0 {
            return Ok(false);
        }

        stories::Entity::update_many()
            .col_expr(
                stories::Column::ViewsCount,
                Expr::col(stories::Column::ViewsCount).add(1),
            )
            .filter(stories::Column::Id.eq(story_id))
            .exec(txn)
            .await?;

        Ok(true)
    }
}

#[async_trait]
impl StoryRepository for StoryRepositoryPostgres {
    async fn create_story(&self, story: NewStory) -> Result<Story, StoreError> {
        let conn = self.store.conn();
        let now = self.store.now();

        find_active_user(conn, story.author_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;

        let expires_at = story
            .expires_at
            .map(|at| at.fixed_offset())
            .unwrap_or(now + Duration::hours(STORY_LIFETIME_HOURS));

        let model = stories::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(story.author_id),
            media_url: Set(story.media_url),
            media_type: Set(story.media_type),
            caption: Set(story.caption),
            views_count: Set(0),
            expires_at: Set(expires_at),
            created_at: Set(now),
            status: Set(RowStatus::Active),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await?;

        Ok(model.to_domain())
    }

    async fn find_story(&self, story_id: Uuid) -> Result<Option<Story>, StoreError> {
        let found = stories::Entity::find_by_id(story_id)
            .active()
            .one(self.store.conn())
            .await?;
        Ok(found.map(stories::Model::to_domain))
    }

    async fn get_story(
        &self,
        viewer: Option<Uuid>,
        story_id: Uuid,
    ) -> Result<StoryCard, StoreError> {
        let conn = self.store.conn();
        let row = stories::Entity::find_by_id(story_id)
            .active()
            .filter(visibility(viewer))
            .one(conn)
            .await?
            .ok_or(StoreError::NotFound(entity::STORY))?;

        if row.expires_at <= self.store.now() {
            return Err(StoreError::Invariant(invariant::STORY_EXPIRED));
        }

        build_story_cards(conn, viewer, vec![row])
            .await?
            .pop()
            .ok_or(StoreError::NotFound(entity::STORY))
    }

    async fn stories_by_user(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<Vec<StoryCard>, StoreError> {
        let conn = self.store.conn();
        let rows = live_stories(viewer, self.store.now())
            .filter(stories::Column::UserId.eq(user_id))
            .order_by_asc(stories::Column::CreatedAt)
            .order_by_asc(stories::Column::Id)
            .all(conn)
            .await?;

        Ok(build_story_cards(conn, viewer, rows).await?)
    }

    async fn story_feed(&self, viewer: Uuid) -> Result<Vec<StoryCard>, StoreError> {
        let conn = self.store.conn();
        let rows = live_stories(Some(viewer), self.store.now())
            .filter(
                Condition::any()
                    .add(stories::Column::UserId.eq(viewer))
                    .add(stories::Column::UserId.in_subquery(accepted_following_ids(viewer))),
            )
            .order_by_desc(stories::Column::CreatedAt)
            .order_by_desc(stories::Column::Id)
            .all(conn)
            .await?;

        Ok(build_story_cards(conn, Some(viewer), rows).await?)
    }

    async fn record_view(&self, viewer: Uuid, story_id: Uuid) -> Result<bool, StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::insert_view(&txn, viewer, story_id, now).await;
        finish(txn, result).await
    }

    async fn story_viewers(
        &self,
        story_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<StoryViewer>, StoreError> {
        let conn = self.store.conn();
        let query = story_views::Entity::find()
            .filter(story_views::Column::StoryId.eq(story_id))
            .filter(story_views::Column::UserId.in_subquery(active_user_ids()));

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_desc(story_views::Column::ViewedAt)
            .order_by_desc(story_views::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let users = load_user_summaries(conn, rows.iter().map(|v| v.user_id)).await?;
        let items = rows
            .into_iter()
            .filter_map(|row| {
                users.get(&row.user_id).map(|user| StoryViewer {
                    user: user.clone(),
                    viewed_at: row.viewed_at.to_utc(),
                })
            })
            .collect();

        Ok(PageResult::new(items, page, total))
    }

    async fn soft_delete_story(&self, story_id: Uuid) -> Result<(), StoreError> {
        let removed = stories::Entity::soft_delete_many(self.store.now())
            .filter(stories::Column::Id.eq(story_id))
            .exec(self.store.conn())
            .await?;

        if removed.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::STORY));
        }
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let now = now.fixed_offset();
        let swept = stories::Entity::soft_delete_many(now)
            .filter(stories::Column::ExpiresAt.lte(now))
            .exec(self.store.conn())
            .await?;
        Ok(swept.rows_affected)
    }
}
