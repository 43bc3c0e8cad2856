/// Row ownership checks
///
/// Every task and thread belongs to exactly one user. Handlers load the row
/// first (a missing row is a 404) and then call [`require_owner`], so a row
/// that exists but belongs to someone else is a 403.

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Not authorized to access this resource")]
    Forbidden,
}

/// Ensures the authenticated user owns the row
pub fn require_owner(owner_id: Uuid, auth: &AuthContext) -> Result<(), AuthzError> {
    if owner_id == auth.user_id {
        Ok(())
    } else {
        tracing::debug!(user_id = %auth.user_id, owner_id = %owner_id, "Ownership check failed");
        Err(AuthzError::Forbidden)
    }
}
