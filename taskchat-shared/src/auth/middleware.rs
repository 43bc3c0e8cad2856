/// Request authentication
///
/// The API's JWT layer calls [`authenticate`] on every protected request and
/// inserts the resulting [`AuthContext`] into the request extensions.
/// Handlers read it with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskchat_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{JwtError, TokenIssuer};

/// Identity of the caller, added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (the token's `sub`)
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error(transparent)]
    InvalidToken(#[from] JwtError),
}

/// Extracts the token from an `Authorization: Bearer <token>` header
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not valid ASCII".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidFormat("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Validates the bearer token in `headers` and returns the caller's context
pub fn authenticate(issuer: &TokenIssuer, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let claims = issuer.validate(token)?;
    Ok(AuthContext::new(claims.sub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use jsonwebtoken::Algorithm;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers_with("bearer abc")).unwrap(), "abc");

        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            bearer_token(&headers_with("Basic dXNlcjpwYXNz")),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            bearer_token(&headers_with("Bearer ")),
            Err(AuthError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_authenticate() {
        let issuer = TokenIssuer::new("secret", Algorithm::HS256, Duration::minutes(30));
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id).unwrap();

        let context = authenticate(&issuer, &headers_with(&format!("Bearer {}", token))).unwrap();
        assert_eq!(context.user_id, user_id);

        assert!(matches!(
            authenticate(&issuer, &headers_with("Bearer garbage")),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
