use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};

use super::{parse_key, PostFilter, Store, StoreResult};
use crate::models::post::{AuthorSummary, NewPost, Post, PostChanges, PostWithAuthor};
use crate::models::user::{NewUser, User, UserChanges};
use crate::models::RecordId;

const USER_COLUMNS: &str =
    "id, username, email, password, role, first_name, last_name, created_at, updated_at";

const POST_SELECT: &str = "
    SELECT p.id, p.title, p.content, p.author_id, p.tags, p.likes, p.views,
           p.created_at, p.updated_at,
           u.username AS author_username, u.email AS author_email
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_id";

#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password: String,
    role: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: RecordId::Key(row.id),
            username: row.username,
            email: row.email,
            password: row.password,
            // The column is only ever written from `Role::as_str`.
            role: row.role.parse().unwrap_or_default(),
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: String,
    title: String,
    content: String,
    author_id: String,
    tags: Json<Vec<String>>,
    likes: u64,
    views: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_username: Option<String>,
    author_email: Option<String>,
}

impl From<PostRow> for PostWithAuthor {
    fn from(row: PostRow) -> Self {
        let author = match (row.author_username, row.author_email) {
            (Some(username), Some(email)) => Some(AuthorSummary {
                id: RecordId::Key(row.author_id.clone()),
                username,
                email,
            }),
            _ => None,
        };
        PostWithAuthor {
            post: Post {
                id: RecordId::Key(row.id),
                title: row.title,
                content: row.content,
                author: RecordId::Key(row.author_id),
                tags: row.tags.0,
                likes: row.likes,
                views: row.views,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author,
        }
    }
}

/// MySQL-backed store. Email uniqueness is the `users.email` unique index.
#[derive(Clone, Debug)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_user(&self, key: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn fetch_post(&self, key: &str) -> StoreResult<Option<PostWithAuthor>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = ?"))
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(PostWithAuthor::from))
    }
}

#[async_trait]
impl Store for MySqlStore {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let key = parse_key("id", id)?;
        self.fetch_user(&key).await
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let record = User::from_new(RecordId::new_key(), user, Utc::now());

        sqlx::query(
            "INSERT INTO users
                (id, username, email, password, role, first_name, last_name, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.password)
        .bind(record.role.as_str())
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> StoreResult<Option<User>> {
        let key = parse_key("id", id)?;

        let result = sqlx::query(
            "UPDATE users
             SET username = COALESCE(?, username),
                 email = COALESCE(?, email),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(Utc::now())
        .bind(&key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_user(&key).await
    }

    async fn delete_user(&self, id: &str) -> StoreResult<bool> {
        let key = parse_key("id", id)?;
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, filter: PostFilter) -> StoreResult<Vec<PostWithAuthor>> {
        let order = "ORDER BY p.created_at DESC";
        let rows = match filter {
            PostFilter::All => {
                sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} {order}"))
                    .fetch_all(&self.pool)
                    .await?
            }
            PostFilter::Author(author) => {
                let author = parse_key("author", &author)?;
                sqlx::query_as::<_, PostRow>(&format!(
                    "{POST_SELECT} WHERE p.author_id = ? {order}"
                ))
                .bind(author)
                .fetch_all(&self.pool)
                .await?
            }
            PostFilter::Tag(tag) => {
                sqlx::query_as::<_, PostRow>(&format!(
                    "{POST_SELECT} WHERE JSON_CONTAINS(p.tags, JSON_QUOTE(?)) {order}"
                ))
                .bind(tag)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    async fn get_post(&self, id: &str) -> StoreResult<Option<PostWithAuthor>> {
        let key = parse_key("id", id)?;
        self.fetch_post(&key).await
    }

    async fn create_post(&self, mut post: NewPost) -> StoreResult<Post> {
        post.author = RecordId::Key(parse_key("author", &post.author.to_string())?);
        let record = Post::from_new(RecordId::new_key(), post, Utc::now());

        sqlx::query(
            "INSERT INTO posts
                (id, title, content, author_id, tags, likes, views, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.title)
        .bind(&record.content)
        .bind(record.author.to_string())
        .bind(Json(&record.tags))
        .bind(record.likes)
        .bind(record.views)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_post(&self, id: &str, changes: PostChanges) -> StoreResult<Option<Post>> {
        let key = parse_key("id", id)?;

        let result = sqlx::query(
            "UPDATE posts
             SET title = COALESCE(?, title),
                 content = COALESCE(?, content),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(Utc::now())
        .bind(&key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(self.fetch_post(&key).await?.map(|entry| entry.post))
    }

    async fn delete_post(&self, id: &str) -> StoreResult<bool> {
        let key = parse_key("id", id)?;
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(&key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
