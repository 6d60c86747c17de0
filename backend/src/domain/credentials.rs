//! Authentication payload validation.
//!
//! Keep inbound payload parsing outside the domain services by exposing
//! constructors that validate string inputs before a handler talks to a
//! port or service. Passwords are held in [`Zeroizing`] buffers so they are
//! wiped when dropped.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::user::{Email, Username, UserValidationError};

/// Shortest password accepted at registration.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Validation errors for authentication payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialValidationError {
    /// Email, username, or password was missing or blank.
    #[error("all fields are required")]
    MissingField,
    /// The password was shorter than [`PASSWORD_MIN_LEN`].
    #[error("password must be at least {PASSWORD_MIN_LEN} characters")]
    PasswordTooShort,
    /// The email or username failed its own validation.
    #[error("{0}")]
    Identity(#[from] UserValidationError),
}

/// Validated registration payload.
#[derive(Clone)]
pub struct RegistrationDetails {
    email: Email,
    username: Username,
    password: Zeroizing<String>,
}

impl RegistrationDetails {
    /// Validate raw registration fields.
    pub fn try_from_parts(
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        if email.trim().is_empty() || username.trim().is_empty() || password.is_empty() {
            return Err(CredentialValidationError::MissingField);
        }
        let email = Email::parse(email)?;
        let username = Username::parse(username)?;
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(CredentialValidationError::PasswordTooShort);
        }
        Ok(Self {
            email,
            username,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for RegistrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationDetails")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated login payload.
///
/// The identifier is an email or a username; resolution order is decided by
/// the identity service, not here.
#[derive(Clone)]
pub struct LoginCredentials {
    identifier: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw login fields.
    pub fn try_from_parts(
        identifier: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(CredentialValidationError::MissingField);
        }
        Ok(Self {
            identifier: identifier.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email or username, trimmed.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn registration_accepts_valid_fields() {
        let details = RegistrationDetails::try_from_parts("a@b.com", "reader_01", "hunter2")
            .expect("valid registration");
        assert_eq!(details.email().as_str(), "a@b.com");
        assert_eq!(details.username().as_str(), "reader_01");
    }

    #[rstest]
    #[case("", "reader_01", "hunter2", CredentialValidationError::MissingField)]
    #[case("a@b.com", "", "hunter2", CredentialValidationError::MissingField)]
    #[case("a@b.com", "reader_01", "", CredentialValidationError::MissingField)]
    #[case("a@b.com", "reader_01", "short", CredentialValidationError::PasswordTooShort)]
    #[case(
        "a@b.com",
        "ab",
        "hunter2",
        CredentialValidationError::Identity(UserValidationError::UsernameLength)
    )]
    #[case(
        "not-an-email",
        "reader_01",
        "hunter2",
        CredentialValidationError::Identity(UserValidationError::InvalidEmail)
    )]
    fn registration_rejects_invalid_fields(
        #[case] email: &str,
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: CredentialValidationError,
    ) {
        let result = RegistrationDetails::try_from_parts(email, username, password);
        assert_eq!(result.err(), Some(expected));
    }

    #[test]
    fn login_requires_both_fields() {
        assert!(LoginCredentials::try_from_parts("  ", "pw").is_err());
        assert!(LoginCredentials::try_from_parts("reader", "").is_err());
        let creds = LoginCredentials::try_from_parts(" reader ", "pw").expect("valid login");
        assert_eq!(creds.identifier(), "reader");
    }

    #[test]
    fn debug_never_prints_passwords() {
        let creds = LoginCredentials::try_from_parts("reader", "secret").expect("valid login");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret"));
    }
}
