//! User identity model and its validation rules.
//!
//! Emails and usernames are unique case-insensitively; comparisons go
//! through the `normalized()` accessors so adapters never reimplement the
//! folding rules.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::experience::Experience;

/// Sentinel stored instead of a password hash for OAuth-provisioned accounts.
///
/// Local password login is impossible for these accounts: verification
/// rejects the sentinel before any hash comparison.
pub const OAUTH_SENTINEL: &str = "GOOGLE_OAUTH_USER";

/// Validation errors for user identity fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The id was not a valid UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// The email did not look like an address.
    #[error("invalid email format")]
    InvalidEmail,
    /// The username was shorter than 5 or longer than 20 characters.
    #[error("username must be 5-20 characters")]
    UsernameLength,
    /// The username held characters outside letters, digits, `_` and `-`.
    #[error("username can only contain letters, numbers, underscores, and hyphens")]
    UsernameCharacters,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse an id from its string form.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static username pattern"))
}

/// Email address, stored as entered but compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an email address.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if !email_regex().is_match(trimmed) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Address as entered by the user.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used for uniqueness checks and lookups.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Username: 5-20 characters from letters, digits, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a username.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < 5 || trimmed.chars().count() > 20 {
            return Err(UserValidationError::UsernameLength);
        }
        if !username_regex().is_match(trimmed) {
            return Err(UserValidationError::UsernameCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Username as entered.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used for uniqueness checks and lookups.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered account.
///
/// `password_hash` is either an argon2 PHC string or [`OAUTH_SENTINEL`] for
/// accounts provisioned through Google sign-in. Experience only ever grows;
/// level is derived on read and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub username: Username,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub avatar_url: String,
    pub experience: Experience,
}

impl User {
    /// Whether this account was provisioned through OAuth.
    pub fn is_oauth(&self) -> bool {
        self.password_hash == OAUTH_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("reader_01")]
    #[case("a-b-c-d")]
    #[case("five5")]
    fn accepts_valid_usernames(#[case] raw: &str) {
        assert!(Username::parse(raw).is_ok());
    }

    #[rstest]
    #[case("ab", UserValidationError::UsernameLength)]
    #[case("", UserValidationError::UsernameLength)]
    #[case("twenty-one-chars-xxxx", UserValidationError::UsernameLength)]
    #[case("has space", UserValidationError::UsernameCharacters)]
    #[case("emoji😀name", UserValidationError::UsernameCharacters)]
    fn rejects_invalid_usernames(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(Username::parse(raw), Err(expected));
    }

    #[rstest]
    #[case("user@example.com")]
    #[case("first.last@sub.domain.org")]
    fn accepts_valid_emails(#[case] raw: &str) {
        assert!(Email::parse(raw).is_ok());
    }

    #[rstest]
    #[case("not-an-email")]
    #[case("a@b")]
    #[case("white space@example.com")]
    fn rejects_invalid_emails(#[case] raw: &str) {
        assert_eq!(Email::parse(raw), Err(UserValidationError::InvalidEmail));
    }

    #[test]
    fn normalization_folds_case_only() {
        let email = Email::parse("Reader@Example.COM").expect("valid email");
        assert_eq!(email.as_str(), "Reader@Example.COM");
        assert_eq!(email.normalized(), "reader@example.com");

        let username = Username::parse("Reader_01").expect("valid username");
        assert_eq!(username.normalized(), "reader_01");
    }

    #[test]
    fn user_id_rejects_garbage() {
        assert_eq!(UserId::parse("nope"), Err(UserValidationError::InvalidId));
        let id = UserId::random();
        assert_eq!(UserId::parse(&id.to_string()), Ok(id));
    }
}
