use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::sea_orm_entity::comments;
use crate::comment::application::domain::entities::{Comment, CommentView};
use crate::comment::application::ports::outgoing::{CommentRepository, NewComment};
use crate::like::adapter::outgoing::sea_orm_entity::likes;
use crate::notification::adapter::outgoing::{notify, notify_mentions};
use crate::notification::application::domain::entities::{NewNotification, NotificationType};
use crate::post::adapter::outgoing::sea_orm_entity::posts;
use crate::post::adapter::outgoing::{adjust_post_counter, find_active_post, visible_post_ids};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::{finish, Store};
use crate::shared::store_error::{entity, invariant, StoreError};
use crate::shared::tombstone::{ActiveOnly, RowStatus, SoftDelete};
use crate::user::adapter::outgoing::{active_user_ids, find_active_user, load_user_summaries};

pub(crate) async fn find_active_comment<C: ConnectionTrait>(
    conn: &C,
    comment_id: Uuid,
) -> Result<Option<comments::Model>, DbErr> {
    comments::Entity::find_by_id(comment_id)
        .active()
        .one(conn)
        .await
}

/// In-place `likes_count = likes_count + delta`, never below zero.
pub(crate) async fn adjust_comment_likes<C: ConnectionTrait>(
    conn: &C,
    comment_id: Uuid,
    delta: i64,
) -> Result<u64, DbErr> {
    let column = comments::Column::LikesCount;
    let mut update = comments::Entity::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(comments::Column::Id.eq(comment_id));
    if delta < 0 {
        update = update.filter(column.gte(-delta));
    }
    Ok(update.exec(conn).await?.rows_affected)
}

/// `likes_count + 1` on an active comment whose post `viewer` may see.
pub(crate) async fn increment_visible_comment_likes<C: ConnectionTrait>(
    conn: &C,
    viewer: Uuid,
    comment_id: Uuid,
) -> Result<u64, DbErr> {
    let column = comments::Column::LikesCount;
    let updated = comments::Entity::update_many()
        .col_expr(column, Expr::col(column).add(1))
        .filter(comments::Column::Id.eq(comment_id))
        .filter(comments::Column::Status.eq(RowStatus::Active))
        .filter(comments::Column::PostId.in_subquery(visible_post_ids(Some(viewer))))
        .exec(conn)
        .await?;
    Ok(updated.rows_affected)
}

/// Tombstones the active comments matching `condition` plus their active
/// replies, tombstones likes on them and lowers `posts.comments_count` by
/// the number removed per post. Returns the number of comments removed.
pub(crate) async fn soft_delete_comments<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
    now: DateTimeWithTimeZone,
) -> Result<u64, DbErr> {
    let targets: Vec<Uuid> = comments::Entity::find()
        .active()
        .filter(condition)
        .select_only()
        .column(comments::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    if targets.is_empty() {
        return Ok(0);
    }

    let doomed: Vec<(Uuid, Uuid)> = comments::Entity::find()
        .active()
        .filter(
            Condition::any()
                .add(comments::Column::Id.is_in(targets.clone()))
                .add(comments::Column::ParentId.is_in(targets)),
        )
        .select_only()
        .column(comments::Column::Id)
        .column(comments::Column::PostId)
        .into_tuple()
        .all(conn)
        .await?;

    let mut per_post: HashMap<Uuid, i64> = HashMap::new();
    for (_, post_id) in &doomed {
        *per_post.entry(*post_id).or_default() += 1;
    }
    for (post_id, removed) in per_post {
        adjust_post_counter(conn, post_id, posts::Column::CommentsCount, -removed).await?;
    }

    let ids: Vec<Uuid> = doomed.into_iter().map(|(id, _)| id).collect();

    likes::Entity::soft_delete_many(now)
        .filter(likes::Column::CommentId.is_in(ids.clone()))
        .exec(conn)
        .await?;

    let result = comments::Entity::soft_delete_many(now)
        .col_expr(comments::Column::UpdatedAt, Expr::value(now))
        .filter(comments::Column::Id.is_in(ids))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Views for `rows`, dropping comments whose author is gone.
async fn build_comment_views<C: ConnectionTrait>(
    conn: &C,
    viewer: Option<Uuid>,
    rows: Vec<comments::Model>,
) -> Result<Vec<CommentView>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = rows.iter().map(|c| c.id).collect();
    let authors = load_user_summaries(conn, rows.iter().map(|c| c.user_id)).await?;

    let liked: HashSet<Uuid> = match viewer {
        Some(viewer) => likes::Entity::find()
            .active()
            .filter(likes::Column::UserId.eq(viewer))
            .filter(likes::Column::CommentId.is_in(ids.clone()))
            .select_only()
            .column(likes::Column::CommentId)
            .into_tuple::<Option<Uuid>>()
            .all(conn)
            .await?
            .into_iter()
            .flatten()
            .collect(),
        None => HashSet::new(),
    };

    let reply_counts: HashMap<Uuid, u64> = comments::Entity::find()
        .active()
        .filter(comments::Column::ParentId.is_in(ids))
        .filter(comments::Column::UserId.in_subquery(active_user_ids()))
        .select_only()
        .column(comments::Column::ParentId)
        .column_as(Expr::col(comments::Column::Id).count(), "replies")
        .group_by(comments::Column::ParentId)
        .into_tuple::<(Option<Uuid>, i64)>()
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(parent, n)| parent.map(|p| (p, n.max(0) as u64)))
        .collect();

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let author = authors.get(&row.user_id)?.clone();
            let id = row.id;
            Some(CommentView {
                comment: row.to_domain(),
                author,
                replies_count: reply_counts.get(&id).copied().unwrap_or(0),
                is_liked: liked.contains(&id),
                replies: Vec::new(),
            })
        })
        .collect())
}

fn visible_comments() -> Select<comments::Entity> {
    comments::Entity::find()
        .active()
        .filter(comments::Column::UserId.in_subquery(active_user_ids()))
}

#[derive(Clone)]
pub struct CommentRepositoryPostgres {
    store: Store,
}

impl CommentRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn insert_comment(
        txn: &DatabaseTransaction,
        comment: NewComment,
        now: DateTimeWithTimeZone,
    ) -> Result<comments::Model, StoreError> {
        let post = find_active_post(txn, comment.post_id)
            .await?
            .ok_or(StoreError::NotFound(entity::POST))?;

        find_active_user(txn, comment.author_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;

        let parent_author = match comment.parent_id {
            Some(parent_id) => {
                let parent = find_active_comment(txn, parent_id)
                    .await?
                    .filter(|p| p.post_id == post.id && p.parent_id.is_none())
                    .ok_or(StoreError::Invariant(invariant::COMMENT_PARENT))?;
                Some(parent.user_id)
            }
            None => None,
        };

        let model = comments::ActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(post.id),
            user_id: Set(comment.author_id),
            parent_id: Set(comment.parent_id),
            content: Set(comment.content),
            likes_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            status: Set(RowStatus::Active),
            deleted_at: Set(None),
        }
        .insert(txn)
        .await?;

        adjust_post_counter(txn, post.id, posts::Column::CommentsCount, 1).await?;

        notify(
            txn,
            now,
            NewNotification::new(post.user_id, comment.author_id, NotificationType::Comment)
                .on_post(post.id)
                .on_comment(model.id),
        )
        .await?;

        if let Some(parent_author) = parent_author.filter(|a| *a != post.user_id) {
            notify(
                txn,
                now,
                NewNotification::new(parent_author, comment.author_id, NotificationType::Comment)
                    .on_post(post.id)
                    .on_comment(model.id),
            )
            .await?;
        }

        notify_mentions(
            txn,
            now,
            comment.author_id,
            &comment.mentions,
            post.id,
            Some(model.id),
        )
        .await?;

        Ok(model)
    }
}

#[async_trait]
impl CommentRepository for CommentRepositoryPostgres {
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::insert_comment(&txn, comment, now).await;
        finish(txn, result).await.map(comments::Model::to_domain)
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, StoreError> {
        let found = find_active_comment(self.store.conn(), comment_id).await?;
        Ok(found.map(comments::Model::to_domain))
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: String,
    ) -> Result<Comment, StoreError> {
        let conn = self.store.conn();
        let existing = find_active_comment(conn, comment_id)
            .await?
            .ok_or(StoreError::NotFound(entity::COMMENT))?;

        let mut active: comments::ActiveModel = existing.into();
        active.content = Set(content);
        active.updated_at = Set(self.store.now());

        let updated = active.update(conn).await?;
        Ok(updated.to_domain())
    }

    async fn soft_delete_comment(&self, comment_id: Uuid) -> Result<u64, StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;

        let result = soft_delete_comments(
            &txn,
            Condition::all().add(comments::Column::Id.eq(comment_id)),
            now,
        )
        .await
        .map_err(StoreError::from)
        .and_then(|removed| {
            if removed == 0 {
                Err(StoreError::NotFound(entity::COMMENT))
            } else {
                Ok(removed)
            }
        });

        finish(txn, result).await
    }

    async fn comment_tree(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
        page: PageRequest,
        replies_preview: u64,
    ) -> Result<PageResult<CommentView>, StoreError> {
        let conn = self.store.conn();
        let query = visible_comments()
            .filter(comments::Column::PostId.eq(post_id))
            .filter(comments::Column::ParentId.is_null());

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let mut views = build_comment_views(conn, viewer, rows).await?;

        if replies_preview > 0 && !views.is_empty() {
            let parents: Vec<Uuid> = views.iter().map(|v| v.comment.id).collect();
            let replies = visible_comments()
                .filter(comments::Column::ParentId.is_in(parents))
                .order_by_asc(comments::Column::CreatedAt)
                .order_by_asc(comments::Column::Id)
                .all(conn)
                .await?;

            let mut grouped: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
            for reply in build_comment_views(conn, viewer, replies).await? {
                let Some(parent_id) = reply.comment.parent_id else {
                    continue;
                };
                let bucket = grouped.entry(parent_id).or_default();
                if (bucket.len() as u64) < replies_preview {
                    bucket.push(reply);
                }
            }

            for view in &mut views {
                view.replies = grouped.remove(&view.comment.id).unwrap_or_default();
            }
        }

        Ok(PageResult::new(views, page, total))
    }

    async fn replies(
        &self,
        viewer: Option<Uuid>,
        comment_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResult<CommentView>, StoreError> {
        let conn = self.store.conn();
        let query = visible_comments().filter(comments::Column::ParentId.eq(comment_id));

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let items = build_comment_views(conn, viewer, rows).await?;
        Ok(PageResult::new(items, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn comment_model(id: Uuid, post_id: Uuid, parent_id: Option<Uuid>) -> comments::Model {
        let now = Utc::now().fixed_offset();
        comments::Model {
            id,
            post_id,
            user_id: Uuid::new_v4(),
            parent_id,
            content: "nice".to_string(),
            likes_count: 3,
            created_at: now,
            updated_at: now,
            status: RowStatus::Active,
            deleted_at: None,
        }
    }

    fn repo(db: MockDatabase) -> CommentRepositoryPostgres {
        CommentRepositoryPostgres::new(Store::with_system_clock(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_comment_like_counter_is_guarded_in_place_update() {
        let viewer = Uuid::new_v4();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let updated = increment_visible_comment_likes(db.as_ref(), viewer, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = log[0].statements()[0].to_string();
        assert!(sql.contains(r#""likes_count" = "likes_count" + 1"#), "{sql}");
        assert!(sql.contains(r#""post_id" IN (SELECT"#), "{sql}");
        assert!(sql.contains(&viewer.to_string()), "{sql}");
    }

    #[tokio::test]
    async fn test_find_comment_maps_row() {
        let id = Uuid::new_v4();
        let post_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![comment_model(id, post_id, None)]]);

        let comment = repo(db).find_comment(id).await.unwrap().unwrap();

        assert_eq!(comment.post_id, post_id);
        assert_eq!(comment.likes_count, 3);
        assert!(!comment.is_reply());
    }

    #[tokio::test]
    async fn test_update_missing_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comments::Model>::new()]);

        let err = repo(db)
            .update_comment(Uuid::new_v4(), "edited".to_string())
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::COMMENT));
    }

    #[tokio::test]
    async fn test_create_comment_on_missing_post_rolls_back() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<posts::Model>::new()]);

        let err = repo(db)
            .create_comment(NewComment {
                author_id: Uuid::new_v4(),
                post_id: Uuid::new_v4(),
                parent_id: None,
                content: "hello".to_string(),
                mentions: Vec::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::POST));
    }

    #[tokio::test]
    async fn test_soft_delete_missing_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comments::Model>::new()]);

        let err = repo(db)
            .soft_delete_comment(Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(entity::COMMENT));
    }

    #[tokio::test]
    async fn test_adjust_comment_likes_guards_decrement() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let id = Uuid::new_v4();
        adjust_comment_likes(&db, id, -1).await.unwrap();

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains(r#""likes_count" + "#), "{sql}");
        assert!(sql.contains(r#""likes_count" >="#), "{sql}");
    }
}
