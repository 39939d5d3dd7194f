//! SQL implementation of the post repository

use chrono::{DateTime, Utc};
use portal_common::models::{NewPost, Post, PostCategory};
use portal_common::services::BoxFuture;
use portal_common::time::to_storage;
use sqlx::any::AnyRow;
use tracing::{debug, error, info};

use super::{integer, opt_text, text, timestamp};
use crate::error::DbError;
use crate::repository::{new_id, PostRepository};
use crate::DbClient;

const TABLE: &str = "posts";

#[derive(Debug, Clone)]
pub struct SqlPostRepository {
    db_client: DbClient,
}

impl SqlPostRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing post schema");
        let query = r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                author TEXT NOT NULL,
                author_email TEXT NOT NULL,
                image_url TEXT,
                duration INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        info!("Post schema initialized successfully");
        Ok(())
    }
}

fn post_from_row(row: &AnyRow) -> Result<Post, DbError> {
    let category: String = text(row, TABLE, "category")?;
    Ok(Post {
        id: text(row, TABLE, "id")?,
        title: text(row, TABLE, "title")?,
        content: text(row, TABLE, "content")?,
        category: category
            .parse::<PostCategory>()
            .map_err(|message| DbError::DecodeError { table: TABLE, message })?,
        author: text(row, TABLE, "author")?,
        author_email: text(row, TABLE, "author_email")?,
        image_url: opt_text(row, TABLE, "image_url")?.filter(|url| !url.is_empty()),
        duration: integer(row, TABLE, "duration")?,
        created_at: timestamp(row, TABLE, "created_at")?,
        expires_at: timestamp(row, TABLE, "expires_at")?,
    })
}

impl PostRepository for SqlPostRepository {
    fn list_active(&self, now: DateTime<Utc>) -> BoxFuture<'_, Vec<Post>, DbError> {
        Box::pin(async move {
            let query = r#"
                SELECT id, title, content, category, author, author_email, image_url,
                    duration, created_at, expires_at
                FROM posts
                WHERE expires_at > $1
                ORDER BY expires_at DESC
            "#;
            let rows = sqlx::query(query)
                .bind(to_storage(&now))
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to list posts: {}", e);
                    DbError::QueryError(e.to_string())
                })?;
            rows.iter().map(post_from_row).collect()
        })
    }

    fn create(&self, post: NewPost) -> BoxFuture<'_, Post, DbError> {
        Box::pin(async move {
            let record = Post {
                id: new_id(),
                title: post.title,
                content: post.content,
                category: post.category,
                author: post.author,
                author_email: post.author_email,
                image_url: post.image_url,
                duration: post.duration,
                created_at: post.created_at,
                expires_at: post.expires_at,
            };
            let query = r#"
                INSERT INTO posts (id, title, content, category, author, author_email, image_url,
                    duration, created_at, expires_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#;
            sqlx::query(query)
                .bind(&record.id)
                .bind(&record.title)
                .bind(&record.content)
                .bind(record.category.as_str())
                .bind(&record.author)
                .bind(&record.author_email)
                // stored as '' rather than binding NULL through the Any driver
                .bind(record.image_url.clone().unwrap_or_default())
                .bind(record.duration)
                .bind(to_storage(&record.created_at))
                .bind(to_storage(&record.expires_at))
                .execute(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to insert post: {}", e);
                    DbError::QueryError(e.to_string())
                })?;
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, bool, DbError> {
        let id = id.to_string();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(&id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            Ok(result.rows_affected() > 0)
        })
    }
}
