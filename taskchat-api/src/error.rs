/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts to an HTTP
/// status and a JSON body:
///
/// ```json
/// { "error": "task_not_found", "message": "Task not found" }
/// ```
///
/// # Example
///
/// ```
/// use taskchat_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(found: bool) -> ApiResult<Json<serde_json::Value>> {
///     if !found {
///         return Err(ApiError::TaskNotFound);
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskchat_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    constants::{
        ERROR_FORBIDDEN, ERROR_INVALID_CREDENTIALS, ERROR_TASK_NOT_FOUND, ERROR_UNAUTHORIZED,
        ERROR_USER_NOT_FOUND,
    },
    llm::LlmError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Wrong email or password (401)
    InvalidCredentials,

    /// Missing or invalid token (401)
    Unauthorized(String),

    /// Row belongs to another user (403)
    Forbidden(String),

    /// User not found (404)
    UserNotFound,

    /// Task not found (404)
    TaskNotFound,

    /// Other resource not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email
    Conflict(String),

    /// Unprocessable entity (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Language model provider failed (502)
    BadGateway(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::TaskNotFound | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::UserNotFound => "user_not_found",
            ApiError::TaskNotFound => "task_not_found",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
            ApiError::BadGateway(_) => "bad_gateway",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::InvalidCredentials => write!(f, "{}", ERROR_INVALID_CREDENTIALS),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::UserNotFound => write!(f, "{}", ERROR_USER_NOT_FOUND),
            ApiError::TaskNotFound => write!(f, "{}", ERROR_TASK_NOT_FOUND),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.code().to_string();

        let (message, details) = match self {
            ApiError::InvalidCredentials => (ERROR_INVALID_CREDENTIALS.to_string(), None),
            ApiError::UserNotFound => (ERROR_USER_NOT_FOUND.to_string(), None),
            ApiError::TaskNotFound => (ERROR_TASK_NOT_FOUND.to_string(), None),
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::InternalError(msg) => {
                // Details stay in the log
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream model error: {}", msg);
                ("The language model provider failed to respond".to_string(), None)
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
        };

        let body = Json(ErrorResponse {
            error,
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already registered".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator errors into field-level details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized(ERROR_UNAUTHORIZED.to_string()),
            AuthError::InvalidFormat(msg) => ApiError::Unauthorized(msg),
            AuthError::InvalidToken(err) => err.into(),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden => ApiError::Forbidden(ERROR_FORBIDDEN.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) | JwtError::UnsupportedAlgorithm(msg) => {
                ApiError::InternalError(msg)
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => {
                ApiError::ServiceUnavailable("Chat model is not configured".to_string())
            }
            other => ApiError::BadGateway(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        assert_eq!(ApiError::TaskNotFound.to_string(), "Task not found");
        assert_eq!(ApiError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest(String::new()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ApiError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden(String::new()), StatusCode::FORBIDDEN),
            (ApiError::UserNotFound, StatusCode::NOT_FOUND),
            (ApiError::TaskNotFound, StatusCode::NOT_FOUND),
            (ApiError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (ApiError::Conflict(String::new()), StatusCode::CONFLICT),
            (ApiError::ValidationError(vec![]), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::InternalError(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::BadGateway(String::new()), StatusCode::BAD_GATEWAY),
            (ApiError::ServiceUnavailable(String::new()), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_library_error_conversions() {
        match ApiError::from(AuthError::MissingCredentials) {
            ApiError::Unauthorized(msg) => assert_eq!(msg, ERROR_UNAUTHORIZED),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(
            ApiError::from(AuthError::InvalidToken(JwtError::Expired)),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(ApiError::from(AuthzError::Forbidden), ApiError::Forbidden(_)));
        assert!(matches!(
            ApiError::from(LlmError::NotConfigured),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(LlmError::EmptyResponse),
            ApiError::BadGateway(_)
        ));
        assert!(matches!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::NotFound(_)
        ));
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,
    }

    #[test]
    fn test_validation_errors_conversion() {
        let errors = Sample {
            title: String::new(),
        }
        .validate()
        .unwrap_err();

        match ApiError::from(errors) {
            ApiError::ValidationError(details) => {
                assert_eq!(
                    details,
                    vec![ValidationErrorDetail {
                        field: "title".to_string(),
                        message: "Title is required".to_string(),
                    }]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
