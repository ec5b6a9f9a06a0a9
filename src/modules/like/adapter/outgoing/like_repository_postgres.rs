use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::sea_orm_entity::likes;
use crate::comment::adapter::outgoing::sea_orm_entity::comments;
use crate::comment::adapter::outgoing::{
    adjust_comment_likes, find_active_comment, increment_visible_comment_likes,
};
use crate::like::application::domain::entities::{Like, LikeTarget, Liker};
use crate::like::application::ports::outgoing::LikeRepository;
use crate::notification::adapter::outgoing::notify;
use crate::notification::application::domain::entities::{NewNotification, NotificationType};
use crate::post::adapter::outgoing::sea_orm_entity::posts;
use crate::post::adapter::outgoing::{
    adjust_post_counter, find_active_post, increment_visible_post, visibility, visible_post_ids,
};
use crate::shared::pagination::{PageRequest, PageResult};
use crate::shared::store::{finish, Store};
use crate::shared::store_error::{entity, ConstraintKey, StoreError};
use crate::shared::tombstone::{ActiveOnly, RowStatus, SoftDelete};
use crate::user::adapter::outgoing::{active_user_ids, find_active_user, load_user_summaries};

const LIKE_KEYS: &[ConstraintKey] = &[
    ConstraintKey {
        field: "like",
        index: "idx_likes_user_post",
        columns: "likes.user_id, likes.post_id",
    },
    ConstraintKey {
        field: "like",
        index: "idx_likes_user_comment",
        columns: "likes.user_id, likes.comment_id",
    },
];

const ALREADY_LIKED: StoreError = StoreError::ConstraintViolation { field: "like" };

fn target_filter(target: LikeTarget) -> Condition {
    match target {
        LikeTarget::Post(id) => Condition::all().add(likes::Column::PostId.eq(id)),
        LikeTarget::Comment(id) => Condition::all().add(likes::Column::CommentId.eq(id)),
    }
}

fn target_missing(target: LikeTarget) -> StoreError {
    match target {
        LikeTarget::Post(_) => StoreError::NotFound(entity::POST),
        LikeTarget::Comment(_) => StoreError::NotFound(entity::COMMENT),
    }
}

async fn adjust_target_likes<C: ConnectionTrait>(
    conn: &C,
    target: LikeTarget,
    delta: i64,
) -> Result<u64, DbErr> {
    match target {
        LikeTarget::Post(id) => {
            adjust_post_counter(conn, id, posts::Column::LikesCount, delta).await
        }
        LikeTarget::Comment(id) => adjust_comment_likes(conn, id, delta).await,
    }
}

/// Tombstones every active like by `user_id` and lowers the counters of the
/// liked posts and comments.
pub(crate) async fn remove_likes_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    now: DateTimeWithTimeZone,
) -> Result<u64, DbErr> {
    let targets: Vec<(Option<Uuid>, Option<Uuid>)> = likes::Entity::find()
        .active()
        .filter(likes::Column::UserId.eq(user_id))
        .select_only()
        .column(likes::Column::PostId)
        .column(likes::Column::CommentId)
        .into_tuple()
        .all(conn)
        .await?;

    for target in targets
        .into_iter()
        .filter_map(|(post_id, comment_id)| LikeTarget::from_parts(post_id, comment_id).ok())
    {
        adjust_target_likes(conn, target, -1).await?;
    }

    let result = likes::Entity::soft_delete_many(now)
        .filter(likes::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

#[derive(Clone)]
pub struct LikeRepositoryPostgres {
    store: Store,
}

impl LikeRepositoryPostgres {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Author of the liked row, together with the post it belongs to.
    async fn target_owner(
        txn: &DatabaseTransaction,
        target: LikeTarget,
    ) -> Result<(Uuid, Uuid), StoreError> {
        let owner = match target {
            LikeTarget::Post(id) => find_active_post(txn, id)
                .await?
                .map(|p| (p.user_id, p.id)),
            LikeTarget::Comment(id) => find_active_comment(txn, id)
                .await?
                .map(|c| (c.user_id, c.post_id)),
        };
        owner.ok_or_else(|| target_missing(target))
    }

    /// Whether `viewer` may see the target, through the post it belongs to.
    async fn target_visible<C: ConnectionTrait>(
        conn: &C,
        viewer: Option<Uuid>,
        target: LikeTarget,
    ) -> Result<bool, DbErr> {
        let count = match target {
            LikeTarget::Post(id) => {
                posts::Entity::find_by_id(id)
                    .active()
                    .filter(visibility(viewer))
                    .count(conn)
                    .await?
            }
            LikeTarget::Comment(id) => {
                comments::Entity::find_by_id(id)
                    .active()
                    .filter(comments::Column::PostId.in_subquery(visible_post_ids(viewer)))
                    .count(conn)
                    .await?
            }
        };
        Ok(count > 0)
    }

    async fn insert_like(
        txn: &DatabaseTransaction,
        user_id: Uuid,
        target: LikeTarget,
        now: DateTimeWithTimeZone,
    ) -> Result<likes::Model, StoreError> {
        // Counter first: it takes the write lock before any read and only
        // matches targets the liker may see.
        let bumped = match target {
            LikeTarget::Post(id) => {
                increment_visible_post(txn, Some(user_id), id, posts::Column::LikesCount).await?
            }
            LikeTarget::Comment(id) => increment_visible_comment_likes(txn, user_id, id).await?,
        };
        if bumped == 0 {
            return Err(target_missing(target));
        }

        find_active_user(txn, user_id)
            .await?
            .ok_or(StoreError::NotFound(entity::USER))?;
        let (owner_id, post_id) = Self::target_owner(txn, target).await?;

        // Unique indexes span tombstones, so an earlier unlike is revived.
        let previous = likes::Entity::find()
            .filter(likes::Column::UserId.eq(user_id))
            .filter(target_filter(target))
            .one(txn)
            .await?;

        let model = match previous {
            Some(row) if row.status == RowStatus::Active => return Err(ALREADY_LIKED),
            Some(row) => {
                let revived = likes::Entity::update_many()
                    .col_expr(likes::Column::Status, Expr::value(RowStatus::Active))
                    .col_expr(
                        likes::Column::DeletedAt,
                        Expr::value(Option::<DateTimeWithTimeZone>::None),
                    )
                    .col_expr(likes::Column::CreatedAt, Expr::value(now))
                    .filter(likes::Column::Id.eq(row.id))
                    .filter(likes::Column::Status.eq(RowStatus::Deleted))
                    .exec(txn)
                    .await?;
                if revived.rows_affected == 0 {
                    return Err(ALREADY_LIKED);
                }
                likes::Model {
                    status: RowStatus::Active,
                    deleted_at: None,
                    created_at: now,
                    ..row
                }
            }
            None => likes::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                post_id: Set(target.post_id()),
                comment_id: Set(target.comment_id()),
                created_at: Set(now),
                status: Set(RowStatus::Active),
                deleted_at: Set(None),
            }
            .insert(txn)
            .await
            .map_err(|e| StoreError::classify(e, LIKE_KEYS))?,
        };

        let mut notification = NewNotification::new(owner_id, user_id, NotificationType::Like)
            .on_post(post_id);
        if let LikeTarget::Comment(comment_id) = target {
            notification = notification.on_comment(comment_id);
        }
        notify(txn, now, notification).await?;

        Ok(model)
    }

    async fn delete_like(
        txn: &DatabaseTransaction,
        user_id: Uuid,
        target: LikeTarget,
        now: DateTimeWithTimeZone,
    ) -> Result<(), StoreError> {
        let removed = likes::Entity::soft_delete_many(now)
            .filter(likes::Column::UserId.eq(user_id))
            .filter(target_filter(target))
            .exec(txn)
            .await?;

        if removed.rows_affected == 0 {
            return Err(StoreError::NotFound(entity::LIKE));
        }

        adjust_target_likes(txn, target, -1).await?;
        Ok(())
    }
}

#[async_trait]
impl LikeRepository for LikeRepositoryPostgres {
    async fn like(&self, user_id: Uuid, target: LikeTarget) -> Result<Like, StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::insert_like(&txn, user_id, target, now).await;
        finish(txn, result).await?.to_domain()
    }

    async fn unlike(&self, user_id: Uuid, target: LikeTarget) -> Result<(), StoreError> {
        let now = self.store.now();
        let txn = self.store.begin().await?;
        let result = Self::delete_like(&txn, user_id, target, now).await;
        finish(txn, result).await
    }

    async fn is_liked(&self, user_id: Uuid, target: LikeTarget) -> Result<bool, StoreError> {
        let count = likes::Entity::find()
            .active()
            .filter(likes::Column::UserId.eq(user_id))
            .filter(target_filter(target))
            .count(self.store.conn())
            .await?;
        Ok(count > 0)
    }

    async fn likers(
        &self,
        viewer: Option<Uuid>,
        target: LikeTarget,
        page: PageRequest,
    ) -> Result<PageResult<Liker>, StoreError> {
        let conn = self.store.conn();
        if !Self::target_visible(conn, viewer, target).await? {
            return Err(target_missing(target));
        }

        let query = likes::Entity::find()
            .active()
            .filter(target_filter(target))
            .filter(likes::Column::UserId.in_subquery(active_user_ids()));

        let total = query.clone().count(conn).await?;
        let rows = query
            .order_by_desc(likes::Column::CreatedAt)
            .order_by_desc(likes::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let users = load_user_summaries(conn, rows.iter().map(|l| l.user_id)).await?;
        let items = rows
            .into_iter()
            .filter_map(|row| {
                users.get(&row.user_id).map(|user| Liker {
                    user: user.clone(),
                    liked_at: row.created_at.to_utc(),
                })
            })
            .collect();

        Ok(PageResult::new(items, page, total))
    }
}
