use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;

const CREATE_USERS: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id CHAR(36) NOT NULL PRIMARY KEY,
        username VARCHAR(50) NOT NULL,
        email VARCHAR(255) NOT NULL,
        password VARCHAR(255) NOT NULL,
        role VARCHAR(16) NOT NULL DEFAULT 'user',
        first_name VARCHAR(100) NULL,
        last_name VARCHAR(100) NULL,
        created_at DATETIME(3) NOT NULL,
        updated_at DATETIME(3) NOT NULL,
        UNIQUE KEY users_email_unique (email)
    )";

const CREATE_POSTS: &str = "
    CREATE TABLE IF NOT EXISTS posts (
        id CHAR(36) NOT NULL PRIMARY KEY,
        title VARCHAR(100) NOT NULL,
        content TEXT NOT NULL,
        author_id CHAR(36) NOT NULL,
        tags JSON NOT NULL,
        likes BIGINT UNSIGNED NOT NULL DEFAULT 0,
        views BIGINT UNSIGNED NOT NULL DEFAULT 0,
        created_at DATETIME(3) NOT NULL,
        updated_at DATETIME(3) NOT NULL,
        KEY posts_author_idx (author_id),
        KEY posts_created_idx (created_at)
    )";

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Creates the tables on first start. Existing tables are left alone.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_USERS, CREATE_POSTS] {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
