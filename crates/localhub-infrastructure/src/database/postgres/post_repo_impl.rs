// ============================================================================
// LocalHub Infrastructure - PostgreSQL Post Repository
// File: crates/localhub-infrastructure/src/database/postgres/post_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use localhub_shared::types::{Page, Pagination};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use localhub_core::domain::{Post, PostFilter, PostStatus};
use localhub_core::error::DomainError;
use localhub_core::repositories::PostRepository;

use super::support::{db_error, decode, into_page, like_pattern};

const COLUMNS: &str = "id, workspace_id, author_id, title, slug, excerpt, body, category, featured_image, \
    region_ids, status, rejection_reason, published_at, created_at, modified_at, removed_at";

const FILTER: &str = r#"
    workspace_id = $1 AND removed_at IS NULL
    AND ($2::text IS NULL OR status = $2)
    AND ($3::uuid IS NULL OR $3 = ANY(region_ids))
    AND ($4::text IS NULL OR category = $4)
    AND ($5::uuid IS NULL OR author_id = $5)
    AND ($6::text IS NULL OR title ILIKE $6 OR body ILIKE $6)
"#;

pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    workspace_id: Uuid,
    author_id: Uuid,
    title: String,
    slug: String,
    excerpt: Option<String>,
    body: String,
    category: Option<String>,
    featured_image: Option<String>,
    region_ids: Vec<Uuid>,
    status: String,
    rejection_reason: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
    removed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PostRow> for Post {
    type Error = DomainError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            workspace_id: row.workspace_id,
            author_id: row.author_id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            body: row.body,
            category: row.category,
            featured_image: row.featured_image,
            region_ids: row.region_ids,
            status: decode("status", &row.status, PostStatus::from_str)?,
            rejection_reason: row.rejection_reason,
            published_at: row.published_at,
            created_at: row.created_at,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        })
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Post>, DomainError> {
        let row: Option<PostRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM posts WHERE id = $1 AND removed_at IS NULL"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("finding post by id"))?;

        row.map(Post::try_from).transpose()
    }

    async fn list(&self, workspace_id: &Uuid, filter: &PostFilter, pagination: Pagination) -> Result<Page<Post>, DomainError> {
        let status = filter.status.map(|s| s.as_str());
        let search = like_pattern(&filter.search);

        // Published posts read newest-first by publication; drafts by creation.
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM posts WHERE {FILTER} \
             ORDER BY COALESCE(published_at, created_at) DESC LIMIT $7 OFFSET $8"
        ))
        .bind(workspace_id)
        .bind(status)
        .bind(filter.region_id)
        .bind(&filter.category)
        .bind(filter.author_id)
        .bind(&search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing posts"))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM posts WHERE {FILTER}"))
            .bind(workspace_id)
            .bind(status)
            .bind(filter.region_id)
            .bind(&filter.category)
            .bind(filter.author_id)
            .bind(&search)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting posts"))?;

        into_page(rows, pagination, total)
    }

    async fn create(&self, post: &Post) -> Result<Post, DomainError> {
        let row: PostRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO posts (
                id, workspace_id, author_id, title, slug, excerpt, body, category, featured_image,
                region_ids, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(post.workspace_id)
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(&post.category)
        .bind(&post.featured_image)
        .bind(&post.region_ids)
        .bind(post.status.as_str())
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating post"))?;

        row.try_into()
    }

    async fn update(&self, post: &Post) -> Result<Post, DomainError> {
        let row: PostRow = sqlx::query_as(&format!(
            r#"
            UPDATE posts
            SET title = $2, excerpt = $3, body = $4, category = $5, featured_image = $6,
                region_ids = $7, status = $8, rejection_reason = $9, published_at = $10,
                modified_at = $11
            WHERE id = $1 AND removed_at IS NULL
            RETURNING {COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(&post.category)
        .bind(&post.featured_image)
        .bind(&post.region_ids)
        .bind(post.status.as_str())
        .bind(&post.rejection_reason)
        .bind(post.published_at)
        .bind(post.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating post"))?
        .ok_or_else(|| DomainError::not_found("post", post.id))?;

        row.try_into()
    }

    async fn delete(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE posts SET removed_at = NOW() WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting post"))?;

        Ok(())
    }
}
