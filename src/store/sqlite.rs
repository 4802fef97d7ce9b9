use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{
    db,
    models::{BlogPost, Comment, Group, GroupMessageRecord, PrivateMessageRecord, User},
};

use super::{NewBlog, Store, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn in_memory() -> StoreResult<Self> {
        Ok(Self::new(db::connect_in_memory().await?))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (username,password_hash,created_at) VALUES (?,?,?) RETURNING username,created_at",
        )
        .bind(username)
        .bind(password_hash)
        .bind(db::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Conflict(format!("username {username} is taken")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn password_hash(&self, username: &str) -> StoreResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE username=?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(hash,)| hash))
    }

    async fn create_blog(&self, blog: NewBlog<'_>) -> StoreResult<BlogPost> {
        let post = sqlx::query_as::<_, BlogPost>(
            "INSERT INTO blogs (username,content,image,likes,created_at) VALUES (?,?,?,0,?) RETURNING *",
        )
        .bind(blog.username)
        .bind(blog.content)
        .bind(blog.image)
        .bind(db::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn list_blogs(&self) -> StoreResult<Vec<BlogPost>> {
        Ok(sqlx::query_as("SELECT * FROM blogs ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn toggle_like(&self, blog_id: i64, username: &str) -> StoreResult<BlogPost> {
        let mut tx = self.pool.begin().await?;

        let liked = sqlx::query(
            "INSERT INTO likes (blog_id,username) SELECT ?,? WHERE EXISTS (SELECT 1 FROM blogs WHERE id=?) \
             ON CONFLICT (blog_id,username) DO NOTHING",
        )
        .bind(blog_id)
        .bind(username)
        .bind(blog_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if liked == 0 {
            // either already liked or the blog doesn't exist
            sqlx::query("DELETE FROM likes WHERE blog_id=? AND username=?")
                .bind(blog_id)
                .bind(username)
                .execute(&mut *tx)
                .await?;
        }

        let post: Option<BlogPost> = sqlx::query_as(
            "UPDATE blogs SET likes=(SELECT COUNT(*) FROM likes WHERE blog_id=?) WHERE id=? RETURNING *",
        )
        .bind(blog_id)
        .bind(blog_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(post) = post else {
            return Err(StoreError::not_found("blog", blog_id));
        };

        tx.commit().await?;
        Ok(post)
    }

    async fn add_comment(&self, blog_id: i64, username: &str, comment: &str) -> StoreResult<Comment> {
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (blog_id,username,comment,created_at) \
             SELECT ?,?,?,? WHERE EXISTS (SELECT 1 FROM blogs WHERE id=?) RETURNING *",
        )
        .bind(blog_id)
        .bind(username)
        .bind(comment)
        .bind(db::now())
        .bind(blog_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("blog", blog_id))
    }

    async fn list_comments(&self, blog_id: i64) -> StoreResult<Vec<Comment>> {
        Ok(sqlx::query_as("SELECT * FROM comments WHERE blog_id=? ORDER BY id")
            .bind(blog_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_group(&self, group_name: &str, created_by: &str) -> StoreResult<Group> {
        Ok(sqlx::query_as(
            "INSERT INTO chat_groups (group_name,created_by,created_at) VALUES (?,?,?) RETURNING *",
        )
        .bind(group_name)
        .bind(created_by)
        .bind(db::now())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        Ok(sqlx::query_as("SELECT * FROM chat_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn append_private_message(
        &self,
        sender: &str,
        recipient: &str,
        message: &str,
    ) -> StoreResult<PrivateMessageRecord> {
        Ok(sqlx::query_as(
            "INSERT INTO private_messages (sender,recipient,message,created_at) VALUES (?,?,?,?) RETURNING *",
        )
        .bind(sender)
        .bind(recipient)
        .bind(message)
        .bind(db::now())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn private_history(&self, a: &str, b: &str) -> StoreResult<Vec<PrivateMessageRecord>> {
        Ok(sqlx::query_as(
            "SELECT * FROM private_messages \
             WHERE (sender=? AND recipient=?) OR (sender=? AND recipient=?) ORDER BY id",
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn append_group_message(
        &self,
        group_id: i64,
        username: &str,
        message: &str,
    ) -> StoreResult<GroupMessageRecord> {
        sqlx::query_as::<_, GroupMessageRecord>(
            "INSERT INTO group_messages (group_id,username,message,created_at) \
             SELECT ?,?,?,? WHERE EXISTS (SELECT 1 FROM chat_groups WHERE id=?) RETURNING *",
        )
        .bind(group_id)
        .bind(username)
        .bind(message)
        .bind(db::now())
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("group", group_id))
    }

    async fn group_history(&self, group_id: i64) -> StoreResult<Vec<GroupMessageRecord>> {
        Ok(sqlx::query_as("SELECT * FROM group_messages WHERE group_id=? ORDER BY id")
            .bind(group_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
