use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::sea_orm_entity::posts;
use crate::comment::adapter::outgoing::sea_orm_entity::comments;
use crate::comment::adapter::outgoing::soft_delete_comments;
use crate::follow::adapter::outgoing::accepted_following_ids;
use crate::hashtag::adapter::outgoing::sea_orm_entity::{hashtags, post_hashtags};
use crate::hashtag::adapter::outgoing::{detach_posts, sync_post_hashtags};
use crate::like::adapter::outgoing::sea_orm_entity::likes;
use crate::notification::adapter::outgoing::notify_mentions;
use crate::post::application::domain::entities::{Post, PostView};
use crate::post::application::ports::outgoing::{NewPost, PostChanges, PostRepository};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::{finish, Store};
use crate::shared::store_error::{entity, StoreError};
use crate::shared::tombstone::{ActiveOnly, RowStatus, SoftDelete};
use crate::user::adapter::outgoing::{
    active_user_ids, find_active_user, load_user_summaries, public_user_ids,
};

// =====================================================
// Shared helpers (used by comment, like and user adapters)
// =====================================================

pub(crate) async fn find_active_post<C: ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
) -> Result<Option<posts::Model>, DbErr> {
    posts::Entity::find_by_id(post_id)
        .active()
        .one(conn)
        .await
}

/// In-place `col = col + delta`; decrements never go below zero.
pub(crate) async fn adjust_post_counter<C: ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
    column: posts::Column,
    delta: i64,
) -> Result<u64, DbErr> {
    let mut update = posts::Entity::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(posts::Column::Id.eq(post_id));
    if delta < 0 {
        update = update.filter(column.gte(-delta));
    }
    Ok(update.exec(conn).await?.rows_affected)
}

/// Posts the viewer may see: their own, those of accounts they follow
/// (accepted), and public posts of public accounts. Authors must be active.
pub(crate) fn visibility(viewer: Option<Uuid>) -> Condition {
    let mut allowed = Condition::any().add(
        Condition::all()
            .add(posts::Column::IsPublic.eq(true))
            .add(posts::Column::UserId.in_subquery(public_user_ids())),
    );

    if let Some(viewer) = viewer {
        allowed = allowed
            .add(posts::Column::UserId.eq(viewer))
            .add(posts::Column::UserId.in_subquery(accepted_following_ids(viewer)));
    }

    Condition::all()
        .add(allowed)
        .add(posts::Column::UserId.in_subquery(active_user_ids()))
}

/// Ids of active posts the viewer may see, for `IN` filters on child rows.
pub(crate) fn visible_post_ids(viewer: Option<Uuid>) -> SelectStatement {
    Query::select()
        .column(posts::Column::Id)
        .from(posts::Entity)
        .cond_where(
            Condition::all()
                .add(posts::Column::Status.eq(RowStatus::Active))
                .add(visibility(viewer)),
        )
        .to_owned()
}

/// In-place `col = col + 1` on an active post the viewer may see. Zero rows
/// when the post is gone or hidden from them.
pub(crate) async fn increment_visible_post<C: ConnectionTrait>(
    conn: &C,
    viewer: Option<Uuid>,
    post_id: Uuid,
    column: posts::Column,
) -> Result<u64, DbErr> {
    let updated = posts::Entity::update_many()
        .col_expr(column, Expr::col(column).add(1))
        .filter(posts::Column::Id.eq(post_id))
        .filter(posts::Column::Status.eq(RowStatus::Active))
        .filter(visibility(viewer))
        .exec(conn)
        .await?;
    Ok(updated.rows_affected)
}

pub(crate) async fn build_post_views<C: ConnectionTrait>(
    conn: &C,
    viewer: Option<Uuid>,
    rows: Vec<posts::Model>,
) -> Result<Vec<PostView>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
    let authors = load_user_summaries(conn, rows.iter().map(|p| p.user_id)).await?;

    let liked: HashSet<Uuid> = match viewer {
        Some(viewer) => likes::Entity::find()
            .active()
            .filter(likes::Column::UserId.eq(viewer))
            .filter(likes::Column::PostId.is_in(ids.clone()))
            .select_only()
            .column(likes::Column::PostId)
            .into_tuple::<Option<Uuid>>()
            .all(conn)
            .await?
            .into_iter()
            .flatten()
            .collect(),
        None => HashSet::new(),
    };

    let links: Vec<(Uuid, String)> = post_hashtags::Entity::find()
        .select_only()
        .column(post_hashtags::Column::PostId)
        .column(hashtags::Column::Name)
        .inner_join(hashtags::Entity)
        .filter(post_hashtags::Column::PostId.is_in(ids))
        .order_by_asc(hashtags::Column::Name)
        .into_tuple()
        .all(conn)
        .await?;

    let mut tags: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (post_id, name) in links {
        tags.entry(post_id).or_default().push(name);
    }

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let author = authors.get(&row.user_id)?.clone();
            let id = row.id;
            Some(PostView {
                post: row.to_domain(),
                author,
                hashtags: tags.remove(&id).unwrap_or_default(),
                is_liked: liked.contains(&id),
            })
        })
        .collect())
}

/// Tombstones every active post matching `condition` together with its
/// comments and likes, and releases its hashtag links. Returns posts removed.
pub(crate) async fn soft_delete_posts<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
    now: DateTimeWithTimeZone,
) -> Result<u64, DbErr> {
    let ids: Vec<Uuid> = posts::Entity::find()
        .active()
        .filter(condition)
        .select_only()
        .column(posts::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    if ids.is_empty() {
        return Ok(0);
    }

    detach_posts(conn, &ids, now).await?;

    soft_delete_comments(
        conn,
        Condition::all().add(comments::Column::PostId.is_in(ids.clone())),
        now,
    )
    .await?;

    likes::Entity::soft_delete_many(now)
        .filter(likes::Column::PostId.is_in(ids.clone()))
        .exec(conn)
        .await?;

    let result = posts::Entity::soft_delete_many(now)
        .col_expr(posts::Column::UpdatedAt, Expr::value(now))
        .filter(posts::Column::Id.is_in(ids))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

// =====================================================
// Repository
// =====================================================

#[derive(Clone)]
pub struct PostRepositoryPostgres {
    store: Store,
}

impl PostRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn page_of_views(
        &self,
        viewer: Option<Uuid>,
        query: Select<posts::Entity>,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, StoreError> {
        let conn = self.store.conn();

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_desc(posts::Column::CreatedAt)
            .order_by_desc(posts::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let items = build_post_views(conn, viewer, rows).await?;
        Ok(PageResult::new(items, page, total))
    }

    async fn insert_post(
        txn: &DatabaseTransaction,
        post: NewPost,
        now: DateTimeWithTimeZone,
    ) -> Result<posts::Model, StoreError> {
        find_active_user(txn, post.author_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;

        let model = posts::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(post.author_id),
            caption: Set(post.caption),
            media_url: Set(post.media_url),
            media_type: Set(post.media_type),
            location: Set(post.location),
            is_public: Set(post.is_public),
            likes_count: Set(0),
            comments_count: Set(0),
            shares_count: Set(0),
            views_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            status: Set(RowStatus::Active),
            deleted_at: Set(None),
        }
        .insert(txn)
        .await?;

        sync_post_hashtags(txn, model.id, &post.hashtags, now).await?;
        notify_mentions(txn, now, post.author_id, &post.mentions, model.id, None).await?;

        Ok(model)
    }

    async fn apply_changes(
        txn: &DatabaseTransaction,
        post_id: Uuid,
        changes: PostChanges,
        now: DateTimeWithTimeZone,
    ) -> Result<posts::Model, StoreError> {
        let existing = find_active_post(txn, post_id)
            .await?
            .ok_or(StoreError::NotFound(entity::POST))?;

        let mut active: posts::ActiveModel = existing.into();
        if let Some(caption) = changes.caption {
            active.caption = Set(caption);
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(is_public) = changes.is_public {
            active.is_public = Set(is_public);
        }
        active.updated_at = Set(now);

        let updated = active.update(txn).await?;

        if let Some(tags) = changes.hashtags {
            sync_post_hashtags(txn, post_id, &tags, now).await?;
        }

        Ok(updated)
    }

    async fn bump(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
        column: posts::Column,
    ) -> Result<(), StoreError> {
        let updated = increment_visible_post(self.store.conn(), viewer, post_id, column).await?;
        if updated == 0 {
            return Err(StoreError::NotFound(entity::POST));
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostRepositoryPostgres {
    async fn create_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::insert_post(&txn, post, now).await;
        finish(txn, result).await.map(posts::Model::to_domain)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, StoreError> {
        let found = find_active_post(self.store.conn(), post_id).await?;
        Ok(found.map(posts::Model::to_domain))
    }

    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Post, StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::apply_changes(&txn, post_id, changes, now).await;
        finish(txn, result).await.map(posts::Model::to_domain)
    }

    async fn soft_delete_post(&self, post_id: Uuid) -> Result<(), StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;

        let result = soft_delete_posts(
            &txn,
            Condition::all().add(posts::Column::Id.eq(post_id)),
            now,
        )
        .await
        .map_err(StoreError::from)
        .and_then(|removed| {
            if removed == 0 {
                Err(StoreError::NotFound(entity::POST))
            } else {
                Ok(())
            }
        });

        finish(txn, result).await
    }

    async fn visible_post(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
    ) -> Result<Option<PostView>, StoreError> {
        let conn = self.store.conn();
        let found = posts::Entity::find_by_id(post_id)
            .active()
            .filter(visibility(viewer))
            .one(conn)
            .await?;

        match found {
            Some(row) => Ok(build_post_views(conn, viewer, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn posts_by_user(
        &self,
        viewer: Option<Uuid>,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, StoreError> {
        let query = posts::Entity::find()
            .active()
            .filter(posts::Column::UserId.eq(user_id))
            .filter(visibility(viewer));

        self.page_of_views(viewer, query, page).await
    }

    async fn feed(
        &self,
        viewer: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, StoreError> {
        let query = posts::Entity::find()
            .active()
            .filter(
                Condition::any()
                    .add(posts::Column::UserId.eq(viewer))
                    .add(posts::Column::UserId.in_subquery(accepted_following_ids(viewer))),
            )
            .filter(visibility(Some(viewer)));

        self.page_of_views(Some(viewer), query, page).await
    }

    async fn posts_by_hashtag(
        &self,
        viewer: Option<Uuid>,
        hashtag: &str,
        page: PageRequest,
    ) -> Result<PageResult<PostView>, StoreError> {
        let tag = hashtags::Entity::find()
            .filter(hashtags::Column::Name.eq(hashtag))
            .one(self.store.conn())
            .await?;

        let Some(tag) = tag else {
            return Ok(PageResult::empty(page));
        };

        let tagged = Query::select()
            .column(post_hashtags::Column::PostId)
            .from(post_hashtags::Entity)
            .and_where(post_hashtags::Column::HashtagId.eq(tag.id))
            .to_owned();

        let query = posts::Entity::find()
            .active()
            .filter(posts::Column::Id.in_subquery(tagged))
            .filter(visibility(viewer));

        self.page_of_views(viewer, query, page).await
    }

    async fn increment_views(&self, viewer: Option<Uuid>, post_id: Uuid) -> Result<(), StoreError> {
        self.bump(viewer, post_id, posts::Column::ViewsCount).await
    }

    async fn increment_shares(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
    ) -> Result<(), StoreError> {
        self.bump(viewer, post_id, posts::Column::SharesCount).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::media::MediaType;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, QueryTrait};
    use std::sync::Arc;

    fn post_model(id: Uuid, user_id: Uuid) -> posts::Model {
        let now = Utc::now().fixed_offset();
        posts::Model {
            id,
            user_id,
            caption: Some("hello".to_string()),
            media_url: None,
            media_type: MediaType::Text,
            location: None,
            is_public: true,
            likes_count: 2,
            comments_count: 1,
            shares_count: 0,
            views_count: 10,
            created_at: now,
            updated_at: now,
            status: RowStatus::Active,
            deleted_at: None,
        }
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    #[test]
    fn test_visibility_for_anonymous_viewer_only_allows_public() {
        let sql = posts::Entity::find()
            .filter(visibility(None))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("is_public"), "{sql}");
        assert!(sql.contains("is_private"), "{sql}");
        assert!(!sql.contains("follows"), "{sql}");
    }

    #[test]
    fn test_visibility_for_viewer_includes_follows() {
        let viewer = Uuid::new_v4();
        let sql = posts::Entity::find()
            .filter(visibility(Some(viewer)))
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains("follows"), "{sql}");
        assert!(sql.contains(&viewer.to_string()), "{sql}");
    }

    #[tokio::test]
    async fn test_find_post_maps_counters() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post_model(id, Uuid::new_v4())]])
            .into_connection();

        let repo = PostRepositoryPostgres::new(Store::with_system_clock(Arc::new(db)));
        let post = repo.find_post(id).await.unwrap().unwrap();

        assert_eq!(post.likes_count, 2);
        assert_eq!(post.views_count, 10);
    }

    fn logged_sql(db: Arc<DatabaseConnection>) -> String {
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        log.iter()
            .flat_map(|t| t.statements().iter().map(|s| s.to_string()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_increment_views_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();

        let repo = PostRepositoryPostgres::new(Store::with_system_clock(Arc::new(db)));
        let err = repo
            .increment_views(None, Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::POST));
    }

    #[tokio::test]
    async fn test_increment_shares_is_in_place_arithmetic() {
        let viewer = Uuid::new_v4();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1)])
                .into_connection(),
        );

        let repo = PostRepositoryPostgres::new(Store::with_system_clock(Arc::clone(&db)));
        repo.increment_shares(Some(viewer), Uuid::new_v4())
            .await
            .unwrap();
        drop(repo);

        let sql = logged_sql(db);
        assert!(
            sql.contains(r#""shares_count" = "shares_count" + 1"#),
            "{sql}"
        );
        // hidden posts never match
        assert!(sql.contains(r#""is_public""#), "{sql}");
        assert!(sql.contains(&viewer.to_string()), "{sql}");
    }

    #[tokio::test]
    async fn test_adjust_post_counter_updates_in_place() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );
        let post_id = Uuid::new_v4();

        adjust_post_counter(db.as_ref(), post_id, posts::Column::LikesCount, 1)
            .await
            .unwrap();
        adjust_post_counter(db.as_ref(), post_id, posts::Column::LikesCount, -1)
            .await
            .unwrap();

        let sql = logged_sql(db);
        assert!(
            sql.contains(r#""likes_count" = "likes_count" + 1"#),
            "{sql}"
        );
        assert!(
            sql.contains(r#""likes_count" = "likes_count" + -1"#),
            "{sql}"
        );
        assert!(sql.contains(r#""likes_count" >= 1"#), "{sql}");
    }

    #[tokio::test]
    async fn test_soft_delete_post_missing_rolls_back() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<posts::Model>::new()])
            .into_connection();

        let repo = PostRepositoryPostgres::new(Store::with_system_clock(Arc::new(db)));
        let err = repo.soft_delete_post(Uuid::new_v4()).await.unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::POST));
    }
}
