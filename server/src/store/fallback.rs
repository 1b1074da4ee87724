//! Dummy data served when the store is skipped.
//!
//! Nothing here is persisted: writes echo what a real store would have
//! returned, and reads return fixed records or records synthesized from the
//! requested id.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::{PostFilter, Store, StoreResult};
use crate::models::post::{AuthorSummary, NewPost, Post, PostChanges, PostWithAuthor};
use crate::models::user::{NewUser, Role, User, UserChanges};
use crate::models::RecordId;

const FIXED_POSTS: [(u64, &str, &str, &[&str]); 3] = [
    (
        1,
        "First post",
        "This is the content of the first post. It was generated as dummy data.",
        &["sample", "welcome"],
    ),
    (
        2,
        "Second post",
        "This is the content of the second post. It was generated as dummy data.",
        &["sample"],
    ),
    (
        3,
        "Third post",
        "This is the content of the third post. It was generated as dummy data.",
        &["sample", "archive"],
    ),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackStore;

impl FallbackStore {
    pub fn new() -> Self {
        FallbackStore
    }
}

fn random_id() -> RecordId {
    RecordId::Seq(rand::thread_rng().gen_range(1..=u64::from(u32::MAX)))
}

fn dummy_user(id: RecordId, username: String, email: String, role: Role, at: DateTime<Utc>) -> User {
    User {
        id,
        username,
        email,
        password: String::new(),
        role,
        first_name: None,
        last_name: None,
        created_at: at,
        updated_at: at,
    }
}

fn user_for(id: &str, now: DateTime<Utc>) -> User {
    dummy_user(
        RecordId::from(id),
        format!("User{}", id),
        format!("user{}@example.com", id),
        Role::User,
        now,
    )
}

fn summary_for(id: RecordId) -> AuthorSummary {
    AuthorSummary {
        username: format!("User{}", id),
        email: format!("user{}@example.com", id),
        id,
    }
}

fn dummy_post(
    id: RecordId,
    title: String,
    content: String,
    author: RecordId,
    tags: Vec<String>,
    at: DateTime<Utc>,
) -> Post {
    Post {
        id,
        title,
        content,
        author,
        tags,
        likes: 0,
        views: 0,
        created_at: at,
        updated_at: at,
    }
}

fn fixed_posts(now: DateTime<Utc>) -> Vec<PostWithAuthor> {
    FIXED_POSTS
        .iter()
        .map(|(n, title, content, tags)| {
            let author = RecordId::Seq(*n);
            let at = now - Duration::days(*n as i64 - 1);
            PostWithAuthor {
                post: dummy_post(
                    RecordId::Seq(*n),
                    title.to_string(),
                    content.to_string(),
                    author.clone(),
                    tags.iter().map(|t| t.to_string()).collect(),
                    at,
                ),
                author: Some(summary_for(author)),
            }
        })
        .collect()
}

fn post_for(id: &str, now: DateTime<Utc>) -> Post {
    dummy_post(
        RecordId::from(id),
        format!("Post {}", id),
        format!("This is the content of post {}. It was generated as dummy data.", id),
        RecordId::Seq(1),
        Vec::new(),
        now,
    )
}

fn posts_by(author: &str, now: DateTime<Utc>) -> Vec<PostWithAuthor> {
    [(1, "The user's first post"), (2, "The user's second post")]
        .into_iter()
        .map(|(n, title)| {
            let author_id = RecordId::from(author);
            PostWithAuthor {
                post: dummy_post(
                    RecordId::Seq(n),
                    title.to_string(),
                    format!("This is {}.", title.to_lowercase()),
                    author_id.clone(),
                    Vec::new(),
                    now - Duration::days(n as i64 - 1),
                ),
                author: Some(summary_for(author_id)),
            }
        })
        .collect()
}

#[async_trait]
impl Store for FallbackStore {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let now = Utc::now();
        Ok([(1, Role::User), (2, Role::Admin), (3, Role::User)]
            .into_iter()
            .map(|(n, role)| {
                dummy_user(
                    RecordId::Seq(n),
                    format!("User{}", n),
                    format!("user{}@example.com", n),
                    role,
                    now,
                )
            })
            .collect())
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(Some(user_for(id, Utc::now())))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        Ok(User::from_new(random_id(), user, Utc::now()))
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> StoreResult<Option<User>> {
        let now = Utc::now();
        let mut user = user_for(id, now);
        user.apply(changes, now);
        Ok(Some(user))
    }

    async fn delete_user(&self, _id: &str) -> StoreResult<bool> {
        Ok(true)
    }

    async fn list_posts(&self, filter: PostFilter) -> StoreResult<Vec<PostWithAuthor>> {
        let now = Utc::now();
        Ok(match filter {
            PostFilter::Author(author) => posts_by(&author, now),
            filter => fixed_posts(now)
                .into_iter()
                .filter(|entry| filter.matches(&entry.post))
                .collect(),
        })
    }

    async fn get_post(&self, id: &str) -> StoreResult<Option<PostWithAuthor>> {
        let post = post_for(id, Utc::now());
        let author = Some(summary_for(post.author.clone()));
        Ok(Some(PostWithAuthor { post, author }))
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        Ok(Post::from_new(random_id(), post, Utc::now()))
    }

    async fn update_post(&self, id: &str, changes: PostChanges) -> StoreResult<Option<Post>> {
        let now = Utc::now();
        let mut post = post_for(id, now);
        post.apply(changes, now);
        Ok(Some(post))
    }

    async fn delete_post(&self, _id: &str) -> StoreResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_exactly_the_fixed_posts() {
        let store = FallbackStore::new();
        let posts = store.list_posts(PostFilter::All).await.unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.post.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::Seq(1), RecordId::Seq(2), RecordId::Seq(3)]);
        assert!(posts[0].post.created_at > posts[1].post.created_at);
        assert!(posts[1].post.created_at > posts[2].post.created_at);
    }

    #[tokio::test]
    async fn writes_are_not_persisted() {
        let store = FallbackStore::new();
        store
            .create_post(NewPost {
                title: "another".into(),
                content: "content that is long".into(),
                author: RecordId::Seq(1),
                tags: vec!["sample".into()],
            })
            .await
            .unwrap();
        assert_eq!(store.list_posts(PostFilter::All).await.unwrap().len(), 3);
        assert_eq!(
            store.list_posts(PostFilter::Tag("sample".into())).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn reads_are_synthesized_from_the_id() {
        let store = FallbackStore::new();
        let user = store.get_user("42").await.unwrap().unwrap();
        assert_eq!(user.username, "User42");
        assert_eq!(user.email, "user42@example.com");

        let posts = store.list_posts(PostFilter::Author("7".into())).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.post.author == RecordId::from("7")));

        let tagged = store.list_posts(PostFilter::Tag("welcome".into())).await.unwrap();
        assert_eq!(tagged.len(), 1);
    }

    #[tokio::test]
    async fn fixed_users_include_one_admin() {
        let users = FallbackStore::new().list_users().await.unwrap();
        let admins: Vec<_> = users.iter().filter(|u| u.role == Role::Admin).collect();
        assert_eq!(users.len(), 3);
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].username, "User2");
    }
}
