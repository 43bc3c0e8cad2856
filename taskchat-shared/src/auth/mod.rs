/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access token issuing and validation
/// - [`middleware`]: Bearer token extraction and the request `AuthContext`
/// - [`authorization`]: Row ownership checks
///
/// # Example
///
/// ```no_run
/// use taskchat_shared::auth::password::{hash_password, verify_password};
/// use taskchat_shared::auth::jwt::TokenIssuer;
/// use chrono::Duration;
/// use jsonwebtoken::Algorithm;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let issuer = TokenIssuer::new("secret-key", Algorithm::HS256, Duration::minutes(30));
/// let token = issuer.issue(Uuid::new_v4())?;
/// let claims = issuer.validate(&token)?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
