use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{check_length, format_timestamp, require, FieldViolation, RecordId};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("`{}` is not a valid role", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    // Stored as received. Never serialized into a response.
    pub password: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_new(id: RecordId, new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new.username,
            email: new.email,
            password: new.password,
            role: Role::default(),
            first_name: new.first_name,
            last_name: new.last_name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) {
        if let Some(username) = changes.username {
            self.username = username;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        self.updated_at = now;
    }

    pub fn full_name(&self) -> Option<String> {
        full_name(self.first_name.as_deref(), self.last_name.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A normalized user that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<CreateUserPayload> for NewUser {
    fn from(payload: CreateUserPayload) -> Self {
        Self {
            username: payload.username.map(|u| u.trim().to_string()).unwrap_or_default(),
            email: payload.email.map(|e| normalize_email(&e)).unwrap_or_default(),
            password: payload.password.unwrap_or_default(),
            first_name: non_blank(payload.first_name),
            last_name: non_blank(payload.last_name),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserPayload {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// The mutable subset of a user. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl From<UpdateUserPayload> for UserChanges {
    fn from(payload: UpdateUserPayload) -> Self {
        Self {
            username: payload.username.map(|u| u.trim().to_string()),
            email: payload.email.map(|e| normalize_email(&e)),
        }
    }
}

pub fn validate_new_user(user: &NewUser) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if let Some(username) = require(&mut violations, "username", Some(user.username.as_str())) {
        check_username(&mut violations, username);
    }
    if let Some(email) = require(&mut violations, "email", Some(user.email.as_str())) {
        check_email(&mut violations, email);
    }
    if let Some(password) = require(&mut violations, "password", Some(user.password.as_str())) {
        check_length(&mut violations, "password", password, MIN_PASSWORD_LENGTH, None);
    }

    violations
}

pub fn validate_user_changes(changes: &UserChanges) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if let Some(username) = &changes.username {
        if let Some(username) = require(&mut violations, "username", Some(username.as_str())) {
            check_username(&mut violations, username);
        }
    }
    if let Some(email) = &changes.email {
        if let Some(email) = require(&mut violations, "email", Some(email.as_str())) {
            check_email(&mut violations, email);
        }
    }

    violations
}

fn check_username(violations: &mut Vec<FieldViolation>, username: &str) {
    check_length(
        violations,
        "username",
        username,
        MIN_USERNAME_LENGTH,
        Some(MAX_USERNAME_LENGTH),
    );
}

fn check_email(violations: &mut Vec<FieldViolation>, email: &str) {
    if !email_regex().is_match(email) {
        violations.push(FieldViolation::new(
            "email",
            "please enter a valid email address",
        ));
    }
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // (?-u:\w) keeps word characters ASCII-only
        Regex::new(r"^(?-u:\w)+([.-]?(?-u:\w)+)*@(?-u:\w)+([.-]?(?-u:\w)+)*(\.(?-u:\w){2,3})+$")
            .expect("email regex should compile")
    })
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    match (first, last) {
        (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Response shape of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            full_name: user.full_name(),
            created_at: format_timestamp(&user.created_at),
            updated_at: format_timestamp(&user.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(username: &str, email: &str, password: &str) -> NewUser {
        NewUser::from(CreateUserPayload {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn accepts_a_well_formed_user() {
        let user = payload("alice", "alice@example.com", "secret1");
        assert!(validate_new_user(&user).is_empty());
    }

    #[test]
    fn normalizes_email_before_validation() {
        let user = payload("  alice ", "  Alice@Example.COM ", "secret1");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(validate_new_user(&user).is_empty());
    }

    #[test]
    fn reports_every_violated_field() {
        let user = NewUser::from(CreateUserPayload::default());
        let fields: Vec<_> = validate_new_user(&user).iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["username", "email", "password"]);
    }

    #[test]
    fn username_and_password_bounds() {
        let short = payload("ab", "a@b.io", "12345");
        let messages: Vec<_> = validate_new_user(&short)
            .into_iter()
            .map(|v| v.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "username must be at least 3 characters".to_string(),
                "password must be at least 6 characters".to_string(),
            ]
        );

        let long = payload(&"x".repeat(51), "a@b.io", "123456");
        assert_eq!(validate_new_user(&long).len(), 1);
        let edge = payload(&"x".repeat(50), "a@b.io", "123456");
        assert!(validate_new_user(&edge).is_empty());
    }

    #[test]
    fn rejects_malformed_email() {
        for email in [
            "plainaddress",
            "a@b",
            "a@b.toolong",
            "@example.com",
            "사용자@example.com",
            "user@exämple.com",
        ] {
            let user = payload("alice", email, "secret1");
            let violations = validate_new_user(&user);
            assert_eq!(violations.len(), 1, "{email} should be rejected");
            assert_eq!(violations[0].field, "email");
        }
    }

    #[test]
    fn changes_validate_only_supplied_fields() {
        assert!(validate_user_changes(&UserChanges::default()).is_empty());
        let changes = UserChanges::from(UpdateUserPayload {
            username: Some("zz".into()),
            email: None,
        });
        let violations = validate_user_changes(&changes);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "username");
    }

    #[test]
    fn full_name_joins_present_parts() {
        assert_eq!(full_name(Some("Ada"), Some("Lovelace")).as_deref(), Some("Ada Lovelace"));
        assert_eq!(full_name(None, Some("Lovelace")).as_deref(), Some("Lovelace"));
        assert_eq!(full_name(None, None), None);
    }

    #[test]
    fn view_omits_password() {
        let user = User::from_new(
            RecordId::new_key(),
            payload("alice", "alice@example.com", "secret1"),
            Utc::now(),
        );
        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "user");
        assert!(json.get("fullName").is_none());
    }

    #[test]
    fn role_parses_known_values() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
    }
}
