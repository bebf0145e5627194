//! Post service - posts, likes and comments
//!
//! Deletes check ownership with [`ensure_owner`] before any write, and the
//! repository delete is scoped to the owner as well.

use crate::auth::{ensure_owner, AuthUser};
use crate::error::ApiError;
use crate::repositories::{CommentRecord, CreatePost, LikeRecord, PostRecord, PostRepository};
use crate::services::UserService;
use devconnector_shared::{CommentResponse, LikeResponse, PostResponse, ResourceError};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Post service for post operations
pub struct PostService;

impl PostService {
    /// Publish a post under the caller's current name and avatar
    pub async fn create(
        pool: &PgPool,
        author: AuthUser,
        text: &str,
    ) -> Result<PostResponse, ApiError> {
        let user = UserService::find(pool, author.user_id).await?;

        let post = PostRepository::create(
            pool,
            author.user_id,
            CreatePost {
                text: text.trim().to_string(),
                name: user.name,
                avatar: user.avatar,
            },
        )
        .await?;

        metrics::counter!("posts_created_total").increment(1);
        Ok(to_response(post, Vec::new(), Vec::new()))
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<PostResponse>, ApiError> {
        let posts = PostRepository::list_all(pool).await?;
        Self::assemble(pool, posts).await
    }

    pub async fn get(pool: &PgPool, post_id: Uuid) -> Result<PostResponse, ApiError> {
        let post = Self::find(pool, post_id).await?;
        Self::assemble_one(pool, post).await
    }

    /// Delete a post the caller owns
    pub async fn delete(pool: &PgPool, caller: AuthUser, post_id: Uuid) -> Result<(), ApiError> {
        let post = Self::find(pool, post_id).await?;
        ensure_owner(&caller, &post)?;

        if !PostRepository::delete_owned(pool, post.id, caller.user_id).await? {
            return Err(ApiError::NotFound(ResourceError::PostNotFound.to_string()));
        }

        info!(post_id = %post.id, user_id = %caller.user_id, "Post removed");
        Ok(())
    }

    /// Like a post once. Returns the post's likes, newest first.
    pub async fn like(
        pool: &PgPool,
        caller: AuthUser,
        post_id: Uuid,
    ) -> Result<Vec<LikeResponse>, ApiError> {
        let post = Self::find(pool, post_id).await?;

        if !PostRepository::add_like(pool, post.id, caller.user_id).await? {
            return Err(ApiError::BadRequest(ResourceError::AlreadyLiked.to_string()));
        }

        Self::likes(pool, post.id).await
    }

    pub async fn unlike(
        pool: &PgPool,
        caller: AuthUser,
        post_id: Uuid,
    ) -> Result<Vec<LikeResponse>, ApiError> {
        let post = Self::find(pool, post_id).await?;

        if !PostRepository::remove_like(pool, post.id, caller.user_id).await? {
            return Err(ApiError::BadRequest(ResourceError::NotYetLiked.to_string()));
        }

        Self::likes(pool, post.id).await
    }

    /// Comment on a post. Returns the post's comments, newest first.
    pub async fn comment(
        pool: &PgPool,
        caller: AuthUser,
        post_id: Uuid,
        text: &str,
    ) -> Result<Vec<CommentResponse>, ApiError> {
        let post = Self::find(pool, post_id).await?;
        let user = UserService::find(pool, caller.user_id).await?;

        PostRepository::add_comment(
            pool,
            post.id,
            caller.user_id,
            CreatePost {
                text: text.trim().to_string(),
                name: user.name,
                avatar: user.avatar,
            },
        )
        .await?;

        Self::comments(pool, post.id).await
    }

    /// Delete a comment the caller wrote
    pub async fn delete_comment(
        pool: &PgPool,
        caller: AuthUser,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Vec<CommentResponse>, ApiError> {
        let post = Self::find(pool, post_id).await?;
        let comment = PostRepository::find_comment(pool, post.id, comment_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(ResourceError::CommentNotFound.to_string()))?;
        ensure_owner(&caller, &comment)?;

        if !PostRepository::delete_comment(pool, comment.id, caller.user_id).await? {
            return Err(ApiError::NotFound(ResourceError::CommentNotFound.to_string()));
        }

        Self::comments(pool, post.id).await
    }

    async fn find(pool: &PgPool, post_id: Uuid) -> Result<PostRecord, ApiError> {
        PostRepository::find_by_id(pool, post_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(ResourceError::PostNotFound.to_string()))
    }

    async fn likes(pool: &PgPool, post_id: Uuid) -> Result<Vec<LikeResponse>, ApiError> {
        let likes = PostRepository::likes_for(pool, &[post_id]).await?;
        Ok(likes.into_iter().map(like_response).collect())
    }

    async fn comments(pool: &PgPool, post_id: Uuid) -> Result<Vec<CommentResponse>, ApiError> {
        let comments = PostRepository::comments_for(pool, &[post_id]).await?;
        Ok(comments.into_iter().map(comment_response).collect())
    }

    async fn assemble_one(pool: &PgPool, post: PostRecord) -> Result<PostResponse, ApiError> {
        Self::assemble(pool, vec![post])
            .await?
            .pop()
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("post vanished during assembly")))
    }

    async fn assemble(
        pool: &PgPool,
        posts: Vec<PostRecord>,
    ) -> Result<Vec<PostResponse>, ApiError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut likes: HashMap<Uuid, Vec<LikeRecord>> = HashMap::new();
        for like in PostRepository::likes_for(pool, &ids).await? {
            likes.entry(like.post_id).or_default().push(like);
        }
        let mut comments: HashMap<Uuid, Vec<CommentRecord>> = HashMap::new();
        for comment in PostRepository::comments_for(pool, &ids).await? {
            comments.entry(comment.post_id).or_default().push(comment);
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let post_likes = likes.remove(&post.id).unwrap_or_default();
                let post_comments = comments.remove(&post.id).unwrap_or_default();
                to_response(post, post_likes, post_comments)
            })
            .collect())
    }
}

fn like_response(like: LikeRecord) -> LikeResponse {
    LikeResponse {
        user: like.user_id.to_string(),
    }
}

fn comment_response(comment: CommentRecord) -> CommentResponse {
    CommentResponse {
        id: comment.id.to_string(),
        user: comment.user_id.to_string(),
        text: comment.text,
        name: comment.name,
        avatar: comment.avatar,
        date: comment.created_at,
    }
}

fn to_response(
    post: PostRecord,
    likes: Vec<LikeRecord>,
    comments: Vec<CommentRecord>,
) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        user: post.user_id.to_string(),
        text: post.text,
        name: post.name,
        avatar: post.avatar,
        likes: likes.into_iter().map(like_response).collect(),
        comments: comments.into_iter().map(comment_response).collect(),
        date: post.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_post_response_carries_author_snapshot() {
        let author = Uuid::new_v4();
        let post = PostRecord {
            id: Uuid::new_v4(),
            user_id: author,
            text: "First post".to_string(),
            name: "Ada".to_string(),
            avatar: "https://www.gravatar.com/avatar/x".to_string(),
            created_at: Utc::now(),
        };
        let like = LikeRecord {
            post_id: post.id,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let response = to_response(post, vec![like.clone()], Vec::new());
        assert_eq!(response.user, author.to_string());
        assert_eq!(response.name, "Ada");
        assert_eq!(response.likes, vec![LikeResponse { user: like.user_id.to_string() }]);
        assert!(response.comments.is_empty());
    }
}
