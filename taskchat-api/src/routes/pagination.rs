/// Pagination for list endpoints
///
/// Lists accept `?limit=&offset=` and answer with a [`Page`]:
///
/// ```json
/// { "items": [...], "total": 42, "limit": 10, "offset": 0 }
/// ```

use crate::error::{ApiError, ValidationErrorDetail};
use serde::Serialize;
use taskchat_shared::constants::{DEFAULT_LIMIT, DEFAULT_OFFSET, MAX_LIMIT};

/// Validated limit and offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Applies defaults and checks bounds (`1..=100` for limit, `>= 0` for offset)
    pub fn resolve(limit: Option<i64>, offset: Option<i64>) -> Result<Self, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let offset = offset.unwrap_or(DEFAULT_OFFSET);

        let mut errors = Vec::new();
        if !(1..=MAX_LIMIT).contains(&limit) {
            errors.push(ValidationErrorDetail {
                field: "limit".to_string(),
                message: format!("Limit must be between 1 and {}", MAX_LIMIT),
            });
        }
        if offset < 0 {
            errors.push(ValidationErrorDetail {
                field: "offset".to_string(),
                message: "Offset must not be negative".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(Self { limit, offset })
        } else {
            Err(ApiError::ValidationError(errors))
        }
    }
}

/// One page of a list response
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }
}
