use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Role assigned to a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular contributor: uploads and downloads documents.
    Member,
    /// Reviews pending submissions and approves or rejects them.
    Moderator,
}

impl Role {
    /// Return a string representation of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's ledger record.
///
/// `credits` is unsigned: a negative balance is unrepresentable. The record
/// is only ever mutated through the credit protocol's balance-adjustment
/// primitive; no other code path writes `credits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    /// Identity-provider-issued id.
    pub id: UserId,
    /// Email address from the identity provider.
    pub email: String,
    /// Display name shown alongside contributions.
    pub display_name: String,
    /// Role on the platform.
    pub role: Role,
    /// Current credit balance.
    pub credits: u64,
    /// When the ledger record was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serde_is_snake_case() {
        let json = serde_json::to_string(&Role::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");
        let back: Role = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(back, Role::Member);
    }

    #[test]
    fn user_roundtrip() {
        let user = User {
            id: UserId::new("uid-1"),
            email: "a@example.edu".to_owned(),
            display_name: "a".to_owned(),
            role: Role::Member,
            credits: 3,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
