// ============================================================================
// LocalHub Infrastructure - PostgreSQL Follow Repository
// File: crates/localhub-infrastructure/src/database/postgres/follow_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use localhub_core::domain::{Follow, FollowableKind};
use localhub_core::error::DomainError;
use localhub_core::repositories::FollowRepository;

use super::support::{db_error, decode, into_page};

const COLUMNS: &str = "user_id, kind, target_id, created_at";

/// Table carrying the `follower_count` for each kind of target.
fn target_table(kind: FollowableKind) -> &'static str {
    match kind {
        FollowableKind::Business => "businesses",
        FollowableKind::Calendar => "calendars",
        FollowableKind::Organization => "organizations",
    }
}

pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn bump_followers(
        tx: &mut Transaction<'_, Postgres>,
        kind: FollowableKind,
        target_id: &Uuid,
        delta: i64,
    ) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "UPDATE {} SET follower_count = GREATEST(follower_count + $2, 0) WHERE id = $1",
            target_table(kind)
        ))
        .bind(target_id)
        .bind(delta)
        .execute(&mut **tx)
        .await
        .map_err(db_error("updating follower count"))?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct FollowRow {
    user_id: Uuid,
    kind: String,
    target_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<FollowRow> for Follow {
    type Error = DomainError;

    fn try_from(row: FollowRow) -> Result<Self, Self::Error> {
        Ok(Follow {
            user_id: row.user_id,
            kind: decode("kind", &row.kind, FollowableKind::from_str)?,
            target_id: row.target_id,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn follow(&self, follow: &Follow) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting follow transaction"))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO follows (user_id, kind, target_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, kind, target_id) DO NOTHING
            "#,
        )
        .bind(follow.user_id)
        .bind(follow.kind.as_str())
        .bind(follow.target_id)
        .bind(follow.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("inserting follow"))?
        .rows_affected()
            > 0;

        if inserted {
            Self::bump_followers(&mut tx, follow.kind, &follow.target_id, 1).await?;
        }

        tx.commit().await.map_err(db_error("committing follow"))?;
        Ok(inserted)
    }

    async fn unfollow(&self, user_id: &Uuid, kind: FollowableKind, target_id: &Uuid) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting unfollow transaction"))?;

        let removed = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND kind = $2 AND target_id = $3")
            .bind(user_id)
            .bind(kind.as_str())
            .bind(target_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deleting follow"))?
            .rows_affected()
            > 0;

        if removed {
            Self::bump_followers(&mut tx, kind, target_id, -1).await?;
        }

        tx.commit().await.map_err(db_error("committing unfollow"))?;
        Ok(removed)
    }

    async fn is_following(&self, user_id: &Uuid, kind: FollowableKind, target_id: &Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND kind = $2 AND target_id = $3)",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(target_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("checking follow"))
    }

    async fn list_for_user(&self, user_id: &Uuid, kind: Option<FollowableKind>, pagination: Pagination) -> Result<Page<Follow>, DomainError> {
        const FILTER: &str = "user_id = $1 AND ($2::text IS NULL OR kind = $2)";
        let kind = kind.map(|k| k.as_str());

        let rows: Vec<FollowRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM follows WHERE {FILTER} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(kind)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing follows"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM follows WHERE {FILTER}"))
            .bind(user_id)
            .bind(kind)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting follows"))?;

        into_page(rows, pagination, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_counter_table() {
        for kind in FollowableKind::ALL {
            assert!(!target_table(*kind).is_empty());
        }
        assert_eq!(target_table(FollowableKind::Calendar), "calendars");
    }
}
