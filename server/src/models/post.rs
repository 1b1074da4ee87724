use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{char_len, check_length, format_timestamp, require, FieldViolation, RecordId};

pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MIN_CONTENT_LENGTH: usize = 10;
pub const EXCERPT_LENGTH: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    /// Weak reference to a user; existence is never checked.
    pub author: RecordId,
    pub tags: Vec<String>,
    pub likes: u64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn from_new(id: RecordId, new: NewPost, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            content: new.content,
            author: new.author,
            tags: new.tags,
            likes: 0,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: PostChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.content = content;
        }
        self.updated_at = now;
    }

    pub fn excerpt(&self) -> String {
        excerpt(&self.content)
    }
}

/// The subset of a user embedded in a post when its author is looked up.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthorSummary {
    pub id: RecordId,
    pub username: String,
    pub email: String,
}

/// A post as read back from a store, with its author resolved when the
/// referenced user exists.
#[derive(Clone, Debug, PartialEq)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Option<AuthorSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePostPayload {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<RecordId>,
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: RecordId,
    pub tags: Vec<String>,
}

impl From<CreatePostPayload> for NewPost {
    fn from(payload: CreatePostPayload) -> Self {
        Self {
            title: payload.title.map(|t| t.trim().to_string()).unwrap_or_default(),
            content: payload.content.unwrap_or_default(),
            author: payload.author.unwrap_or_else(|| RecordId::Key(String::new())),
            tags: payload
                .tags
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostPayload {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl From<UpdatePostPayload> for PostChanges {
    fn from(payload: UpdatePostPayload) -> Self {
        Self {
            title: payload.title.map(|t| t.trim().to_string()),
            content: payload.content,
        }
    }
}

pub fn validate_new_post(post: &NewPost) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if let Some(title) = require(&mut violations, "title", Some(post.title.as_str())) {
        check_title(&mut violations, title);
    }
    if let Some(content) = require(&mut violations, "content", Some(post.content.as_str())) {
        check_content(&mut violations, content);
    }
    if post.author == RecordId::Key(String::new()) {
        violations.push(FieldViolation::new("author", "author is required"));
    }

    violations
}

pub fn validate_post_changes(changes: &PostChanges) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if let Some(title) = &changes.title {
        if let Some(title) = require(&mut violations, "title", Some(title.as_str())) {
            check_title(&mut violations, title);
        }
    }
    if let Some(content) = &changes.content {
        if let Some(content) = require(&mut violations, "content", Some(content.as_str())) {
            check_content(&mut violations, content);
        }
    }

    violations
}

fn check_title(violations: &mut Vec<FieldViolation>, title: &str) {
    check_length(
        violations,
        "title",
        title,
        MIN_TITLE_LENGTH,
        Some(MAX_TITLE_LENGTH),
    );
}

fn check_content(violations: &mut Vec<FieldViolation>, content: &str) {
    check_length(violations, "content", content, MIN_CONTENT_LENGTH, None);
}

/// First [`EXCERPT_LENGTH`] characters of `content`, with `...` appended
/// when anything was cut.
pub fn excerpt(content: &str) -> String {
    if char_len(content) <= EXCERPT_LENGTH {
        return content.to_string();
    }
    let mut out: String = content.chars().take(EXCERPT_LENGTH).collect();
    out.push_str("...");
    out
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuthorView {
    Summary(AuthorSummary),
    Id(RecordId),
}

/// Response shape of a post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: AuthorView,
    pub tags: Vec<String>,
    pub likes: u64,
    pub views: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl PostView {
    fn build(post: &Post, author: AuthorView) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt(),
            author,
            tags: post.tags.clone(),
            likes: post.likes,
            views: post.views,
            created_at: format_timestamp(&post.created_at),
            updated_at: format_timestamp(&post.updated_at),
        }
    }
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        PostView::build(post, AuthorView::Id(post.author.clone()))
    }
}

impl From<&PostWithAuthor> for PostView {
    fn from(entry: &PostWithAuthor) -> Self {
        let author = match &entry.author {
            Some(summary) => AuthorView::Summary(summary.clone()),
            None => AuthorView::Id(entry.post.author.clone()),
        };
        PostView::build(&entry.post, author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(title: &str, content: &str) -> NewPost {
        NewPost::from(CreatePostPayload {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            author: Some(RecordId::new_key()),
            tags: None,
        })
    }

    #[test]
    fn title_boundaries() {
        let content = "long enough content";
        assert!(validate_new_post(&new_post(&"t".repeat(3), content)).is_empty());
        assert!(validate_new_post(&new_post(&"t".repeat(100), content)).is_empty());

        let short = validate_new_post(&new_post(&"t".repeat(2), content));
        assert_eq!(short, vec![FieldViolation::new("title", "title must be at least 3 characters")]);

        let long = validate_new_post(&new_post(&"t".repeat(101), content));
        assert_eq!(long, vec![FieldViolation::new("title", "title must be at most 100 characters")]);
    }

    #[test]
    fn content_and_author_are_required() {
        let post = NewPost::from(CreatePostPayload {
            title: Some("hello".into()),
            ..Default::default()
        });
        let fields: Vec<_> = validate_new_post(&post).iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["content", "author"]);

        let short = validate_new_post(&new_post("hello", "too short"));
        assert_eq!(short[0].message, "content must be at least 10 characters");
    }

    #[test]
    fn tags_are_trimmed_and_blank_ones_dropped() {
        let post = NewPost::from(CreatePostPayload {
            tags: Some(vec![" rust ".into(), "".into(), "web".into()]),
            ..Default::default()
        });
        assert_eq!(post.tags, vec!["rust".to_string(), "web".to_string()]);
    }

    #[test]
    fn excerpt_truncates_long_content() {
        let long = "a".repeat(150);
        let out = excerpt(&long);
        assert_eq!(out, format!("{}...", "a".repeat(100)));

        let exact = "b".repeat(100);
        assert_eq!(excerpt(&exact), exact);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn excerpt_respects_multibyte_characters() {
        let long = "가".repeat(101);
        assert_eq!(excerpt(&long), format!("{}...", "가".repeat(100)));
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let created = Utc::now() - chrono::Duration::hours(1);
        let mut post = Post::from_new(RecordId::Seq(1), new_post("hello", "0123456789"), created);
        let now = Utc::now();
        post.apply(
            PostChanges {
                title: Some("updated".into()),
                content: None,
            },
            now,
        );
        assert_eq!(post.title, "updated");
        assert_eq!(post.content, "0123456789");
        assert_eq!(post.updated_at, now);
        assert_eq!(post.created_at, created);
    }

    #[test]
    fn view_embeds_author_summary_when_resolved() {
        let post = Post::from_new(RecordId::Seq(1), new_post("hello", "0123456789"), Utc::now());
        let entry = PostWithAuthor {
            post: post.clone(),
            author: Some(AuthorSummary {
                id: post.author.clone(),
                username: "alice".into(),
                email: "alice@example.com".into(),
            }),
        };
        let json = serde_json::to_value(PostView::from(&entry)).unwrap();
        assert_eq!(json["author"]["username"], "alice");

        let bare = serde_json::to_value(PostView::from(&post)).unwrap();
        assert_eq!(bare["author"], serde_json::to_value(&post.author).unwrap());
        assert_eq!(bare["likes"], 0);
        assert!(bare["createdAt"].is_string());
    }
}
