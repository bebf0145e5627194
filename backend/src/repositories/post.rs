//! Post repository for database operations

use crate::auth::Owned;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Post record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl Owned for PostRecord {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LikeRecord {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl Owned for CommentRecord {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Input for creating a post or a comment.
///
/// `name` and `avatar` are copied from the author at write time.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub text: String,
    pub name: String,
    pub avatar: String,
}

/// Post repository for database operations
pub struct PostRepository;

impl PostRepository {
    pub async fn create(pool: &PgPool, user_id: Uuid, input: CreatePost) -> Result<PostRecord> {
        let post = sqlx::query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts (user_id, text, name, avatar)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, text, name, avatar, created_at
            "#,
        )
        .bind(user_id)
        .bind(&input.text)
        .bind(&input.name)
        .bind(&input.avatar)
        .fetch_one(pool)
        .await?;

        Ok(post)
    }

    /// All posts, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<PostRecord>> {
        let posts = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, user_id, text, name, avatar, created_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(posts)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PostRecord>> {
        let post = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, user_id, text, name, avatar, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(post)
    }

    /// Delete a post only if `owner` still owns it
    pub async fn delete_owned(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Likes for a set of posts, newest first
    pub async fn likes_for(pool: &PgPool, post_ids: &[Uuid]) -> Result<Vec<LikeRecord>> {
        let likes = sqlx::query_as::<_, LikeRecord>(
            r#"
            SELECT post_id, user_id, created_at
            FROM post_likes
            WHERE post_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(post_ids)
        .fetch_all(pool)
        .await?;

        Ok(likes)
    }

    /// Comments for a set of posts, newest first
    pub async fn comments_for(pool: &PgPool, post_ids: &[Uuid]) -> Result<Vec<CommentRecord>> {
        let comments = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, post_id, user_id, text, name, avatar, created_at
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(post_ids)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    /// Record a like. Returns `false` when the user already liked the post.
    pub async fn add_like(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove a like. Returns `false` when there was nothing to remove.
    pub async fn remove_like(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn add_comment(
        pool: &PgPool,
        post_id: Uuid,
        user_id: Uuid,
        input: CreatePost,
    ) -> Result<CommentRecord> {
        let comment = sqlx::query_as::<_, CommentRecord>(
            r#"
            INSERT INTO post_comments (post_id, user_id, text, name, avatar)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, user_id, text, name, avatar, created_at
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(&input.text)
        .bind(&input.name)
        .bind(&input.avatar)
        .fetch_one(pool)
        .await?;

        Ok(comment)
    }

    pub async fn find_comment(
        pool: &PgPool,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Option<CommentRecord>> {
        let comment = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, post_id, user_id, text, name, avatar, created_at
            FROM post_comments
            WHERE id = $1 AND post_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Delete a comment only if `owner` wrote it
    pub async fn delete_comment(pool: &PgPool, comment_id: Uuid, owner: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_comments WHERE id = $1 AND user_id = $2")
            .bind(comment_id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
