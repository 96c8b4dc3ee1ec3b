//! Credential Value Objects
//!
//! Light validation of what users type into the auth forms. The identity
//! provider has the final say; these checks only catch obvious mistakes
//! before a round trip.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

const PASSWORD_MIN_LENGTH: usize = 8;
const PASSWORD_MAX_LENGTH: usize = 72;

const NAME_MIN_LENGTH: usize = 2;
const NAME_MAX_LENGTH: usize = 100;

/// Email address value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create a new email with validation
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::bad_request("Email cannot be empty"));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(AppError::bad_request("Invalid email format"));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || domain.contains('@') {
            return false;
        }

        if domain.is_empty() || !domain.contains('.') {
            return false;
        }

        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return false;
        }

        !(domain.starts_with('.')
            || domain.ends_with('.')
            || domain.starts_with('-')
            || domain.ends_with('-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Password being chosen by the user (sign-up, reset).
///
/// Sign-in passwords are passed through untouched; only new ones are held
/// to the policy: 8 to 72 characters with an uppercase letter, a lowercase
/// letter and a digit.
pub struct NewPassword(String);

impl NewPassword {
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        let length = raw.chars().count();

        if raw.trim().is_empty() {
            return Err(AppError::bad_request("Password cannot be empty")
                .with_action("Please enter a password"));
        }
        if length < PASSWORD_MIN_LENGTH {
            return Err(AppError::bad_request(format!(
                "Password must be at least {PASSWORD_MIN_LENGTH} characters"
            ))
            .with_action("Please choose a longer password"));
        }
        if length > PASSWORD_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Password must be at most {PASSWORD_MAX_LENGTH} characters"
            )));
        }
        if !raw.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::bad_request(
                "Password must contain at least one uppercase letter",
            ));
        }
        if !raw.chars().any(|c| c.is_lowercase()) {
            return Err(AppError::bad_request(
                "Password must contain at least one lowercase letter",
            ));
        }
        if !raw.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::bad_request(
                "Password must contain at least one digit",
            ));
        }

        Ok(Self(raw))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword([REDACTED])")
    }
}

/// First or last name given at sign-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    pub fn new(field: &'static str, raw: impl Into<String>) -> AppResult<Self> {
        let name = raw.into().trim().to_string();
        let length = name.chars().count();

        if length < NAME_MIN_LENGTH {
            return Err(AppError::bad_request(format!("{field} is required")));
        }
        if length > NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "{field} must be at most {NAME_MAX_LENGTH} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::bad_request(format!(
                "{field} contains invalid characters"
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("user@example.com").is_ok());
        assert!(Email::new("User@Example.COM").is_ok());
        assert!(Email::new("user.name@example.co.jp").is_ok());
        assert!(Email::new("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("userexample.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@@example.com").is_err());
        assert!(Email::new("user@example").is_err());
        assert!(Email::new("user@-example.com").is_err());
    }

    #[test]
    fn test_email_case_normalization() {
        let email = Email::new("  User@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_new_password_policy() {
        assert!(NewPassword::new("Sekret123").is_ok());
        assert!(NewPassword::new("").is_err());
        assert!(NewPassword::new("Ab1").is_err());
        assert!(NewPassword::new("alllowercase1").is_err());
        assert!(NewPassword::new("ALLUPPERCASE1").is_err());
        assert!(NewPassword::new("NoDigitsHere").is_err());
        assert!(NewPassword::new(format!("Aa1{}", "x".repeat(70))).is_err());
    }

    #[test]
    fn test_new_password_debug_is_redacted() {
        let password = NewPassword::new("Sekret123").unwrap();
        assert!(!format!("{password:?}").contains("Sekret123"));
        assert_eq!(password.expose(), "Sekret123");
    }

    #[test]
    fn test_person_name() {
        assert_eq!(
            PersonName::new("First name", " Anna ").unwrap().as_str(),
            "Anna"
        );
        let err = PersonName::new("First name", "A").unwrap_err();
        assert_eq!(err.message(), "First name is required");
        assert!(PersonName::new("Last name", "Kowal\u{0007}ska").is_err());
    }
}
