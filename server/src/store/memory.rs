use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{parse_key, PostFilter, Store, StoreError, StoreResult};
use crate::models::post::{AuthorSummary, NewPost, Post, PostChanges, PostWithAuthor};
use crate::models::user::{NewUser, User, UserChanges};
use crate::models::RecordId;

/// In-process store with the same semantics as the MySQL backend.
///
/// `emails` maps each taken email to the id of its owner, so reserving an
/// email is a single entry operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    emails: DashMap<String, String>,
    posts: DashMap<String, Post>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve_email(&self, email: &str, owner: &str) -> StoreResult<()> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate { field: "email" }),
            Entry::Vacant(slot) => {
                slot.insert(owner.to_string());
                Ok(())
            }
        }
    }

    fn release_email(&self, email: &str, owner: &str) {
        self.emails.remove_if(email, |_, holder| holder == owner);
    }

    fn resolve(&self, post: Post) -> PostWithAuthor {
        let author = self.users.get(&post.author.to_string()).map(|user| AuthorSummary {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        });
        PostWithAuthor { post, author }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let key = parse_key("id", id)?;
        Ok(self.users.get(&key).map(|u| u.value().clone()))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let id = RecordId::new_key();
        let key = id.to_string();
        self.reserve_email(&user.email, &key)?;

        let record = User::from_new(id, user, Utc::now());
        self.users.insert(key, record.clone());
        Ok(record)
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> StoreResult<Option<User>> {
        let key = parse_key("id", id)?;
        // The entry guard serializes updates of one user, so the email read
        // here is still current when the new one is reserved.
        let Some(mut user) = self.users.get_mut(&key) else {
            return Ok(None);
        };

        let previous = user.email.clone();
        let new_email = changes.email.clone().filter(|email| *email != previous);
        if let Some(email) = &new_email {
            self.reserve_email(email, &key)?;
        }

        user.apply(changes, Utc::now());
        let updated = user.clone();
        drop(user);

        if new_email.is_some() {
            self.release_email(&previous, &key);
        }
        Ok(Some(updated))
    }

    async fn delete_user(&self, id: &str) -> StoreResult<bool> {
        let key = parse_key("id", id)?;
        match self.users.remove(&key) {
            Some((_, user)) => {
                self.release_email(&user.email, &key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_posts(&self, filter: PostFilter) -> StoreResult<Vec<PostWithAuthor>> {
        let filter = match filter {
            PostFilter::Author(author) => PostFilter::Author(parse_key("author", &author)?),
            other => other,
        };

        let matching: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| filter.matches(p.value()))
            .map(|p| p.value().clone())
            .collect();

        let mut posts: Vec<PostWithAuthor> = matching.into_iter().map(|p| self.resolve(p)).collect();
        posts.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(posts)
    }

    async fn get_post(&self, id: &str) -> StoreResult<Option<PostWithAuthor>> {
        let key = parse_key("id", id)?;
        let post = self.posts.get(&key).map(|p| p.value().clone());
        Ok(post.map(|p| self.resolve(p)))
    }

    async fn create_post(&self, mut post: NewPost) -> StoreResult<Post> {
        post.author = RecordId::Key(parse_key("author", &post.author.to_string())?);

        let id = RecordId::new_key();
        let record = Post::from_new(id.clone(), post, Utc::now());
        self.posts.insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn update_post(&self, id: &str, changes: PostChanges) -> StoreResult<Option<Post>> {
        let key = parse_key("id", id)?;
        Ok(self.posts.get_mut(&key).map(|mut post| {
            post.apply(changes, Utc::now());
            post.clone()
        }))
    }

    async fn delete_post(&self, id: &str) -> StoreResult<bool> {
        let key = parse_key("id", id)?;
        Ok(self.posts.remove(&key).is_some())
    }
}
