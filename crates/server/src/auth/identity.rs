use campusdocs_core::UserId;

/// Caller identity extracted from a validated token.
///
/// Carries only what the identity provider asserts. The role lives in the
/// ledger record, not the token, so a role change takes effect without
/// re-issuing tokens.
#[derive(Debug, Clone)]
pub struct Identity {
    /// The identity-provider-issued user id (token `sub`).
    pub user_id: UserId,
    /// Email address from the token.
    pub email: String,
}
