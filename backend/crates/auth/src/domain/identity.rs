//! Verified user identity as reported by the identity provider

use kernel::id::UserId;
use serde::{Deserialize, Serialize};

/// Authenticated user handle.
///
/// Only the fields the gate and the auth endpoints need are kept; the rest
/// of the provider's user object is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "id")]
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            role: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Parse the provider's user object
    pub fn from_user_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Identity::deserialize(value)
    }
}
