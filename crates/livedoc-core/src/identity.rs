//! Identity of an authenticated caller.
//!
//! The identity provider owns sign-in and sessions; LiveDoc only receives the
//! verified result. Access maps are keyed by email, so `email` is the field
//! that matters for authorization. `id` is recorded as the room creator.

use serde::{Deserialize, Serialize};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Identity-provider user id.
    pub id: String,
    /// Primary email address.
    pub email: String,
    /// Display name, possibly empty.
    #[serde(default)]
    pub name: String,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserIdentity {
    /// Name to show to other users, falling back to the email.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = UserIdentity {
            id: "user_1".to_string(),
            email: "a@example.com".to_string(),
            name: "  ".to_string(),
            avatar: None,
        };
        assert_eq!(user.display_name(), "a@example.com");
    }

    #[test]
    fn test_display_name_prefers_name() {
        let user = UserIdentity {
            id: "user_1".to_string(),
            email: "a@example.com".to_string(),
            name: "Ada".to_string(),
            avatar: None,
        };
        assert_eq!(user.display_name(), "Ada");
    }
}
