/// Access token issuing and validation
///
/// Tokens are HMAC-signed JWTs carrying the user id as `sub`. The signing
/// algorithm and lifetime come from settings (`ALGORITHM`,
/// `ACCESS_TOKEN_EXPIRE_MINUTES`).
///
/// Expiry is checked by this module rather than by `jsonwebtoken`, against a
/// caller-supplied clock and with no leeway, so a token issued with a
/// 30-minute lifetime is rejected at minute 30 exactly.
///
/// # Example
///
/// ```
/// use taskchat_shared::auth::jwt::{JwtError, TokenIssuer};
/// use chrono::{Duration, Utc};
/// use jsonwebtoken::Algorithm;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new("secret", Algorithm::HS256, Duration::minutes(30));
/// let now = Utc::now();
/// let user_id = Uuid::new_v4();
///
/// let token = issuer.issue_at(user_id, now)?;
/// assert_eq!(issuer.validate_at(&token, now)?.sub, user_id);
///
/// let later = now + Duration::minutes(31);
/// assert!(matches!(issuer.validate_at(&token, later), Err(JwtError::Expired)));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Value of the `iss` claim
pub const TOKEN_ISSUER: &str = "taskchat";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Bad signature, wrong algorithm or malformed claims
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Only HMAC algorithms are supported
    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,

    /// Issuer (always [`TOKEN_ISSUER`])
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, expires_in: Duration) -> Self {
        Self {
            sub: user_id,
            iss: TOKEN_ISSUER.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + expires_in).timestamp(),
        }
    }

    /// True once `now` has reached the expiration time
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Parses an algorithm name, accepting only HS256, HS384 and HS512
pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| JwtError::UnsupportedAlgorithm(name.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(JwtError::UnsupportedAlgorithm(name.to_string())),
    }
}

/// Signs and validates access tokens with one secret and algorithm
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expires_in: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, algorithm: Algorithm, expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            expires_in,
        }
    }

    /// Token lifetime
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issues a token for `user_id` valid from now
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `now`
    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, now, self.expires_in);

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Validates a token against the current time
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_at(token, Utc::now())
    }

    /// Validates signature, algorithm and issuer, then checks expiry against `now`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                    JwtError::InvalidFormat(e.to_string())
                }
                _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
            })?;

        let claims = token_data.claims;
        if claims.is_expired_at(now) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Algorithm::HS256, Duration::minutes(30))
    }

    #[test]
    fn test_issue_and_validate() {
        let user_id = Uuid::new_v4();
        let token = issuer().issue(user_id).unwrap();

        let claims = issuer().validate(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_token_expires_after_lifetime() {
        let now = Utc::now();
        let token = issuer().issue_at(Uuid::new_v4(), now).unwrap();

        assert!(issuer().validate_at(&token, now).is_ok());
        assert!(issuer()
            .validate_at(&token, now + Duration::minutes(29))
            .is_ok());
        assert!(matches!(
            issuer().validate_at(&token, now + Duration::minutes(31)),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_expiry_has_no_leeway() {
        let now = Utc::now();
        let token = issuer().issue_at(Uuid::new_v4(), now).unwrap();

        assert!(matches!(
            issuer().validate_at(&token, now + Duration::minutes(30)),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = issuer().issue(Uuid::new_v4()).unwrap();
        let other = TokenIssuer::new("another-secret", Algorithm::HS256, Duration::minutes(30));

        assert!(matches!(
            other.validate(&token),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_other_algorithm() {
        let token = TokenIssuer::new(SECRET, Algorithm::HS512, Duration::minutes(30))
            .issue(Uuid::new_v4())
            .unwrap();

        assert!(issuer().validate(&token).is_err());
    }

    #[test]
    fn test_validate_garbage() {
        assert!(issuer().validate("not.a.token").is_err());
        assert!(issuer().validate("").is_err());
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS384").unwrap(), Algorithm::HS384);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(matches!(
            parse_algorithm("RS256"),
            Err(JwtError::UnsupportedAlgorithm(_))
        ));
        assert!(parse_algorithm("nope").is_err());
    }
}
