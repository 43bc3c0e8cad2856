/// Request extractors that reject with [`ApiError`]
///
/// Drop-in replacements for `axum::Json`, `axum::extract::Query` and
/// `axum::extract::Path`. A body, query string or path segment that does not
/// parse answers with the usual `{error, message, details}` body instead of
/// axum's plain-text rejection.
///
/// | rejection | status | code |
/// |---|---|---|
/// | JSON of the wrong shape (bad enum value, missing field) | 422 | validation_error |
/// | malformed JSON, missing `Content-Type` | 400 | bad_request |
/// | query string of the wrong shape | 422 | validation_error |
/// | path segment that does not parse (e.g. not a UUID) | 400 | bad_request |

use crate::error::{ApiError, ValidationErrorDetail};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::ValidationError(vec![ValidationErrorDetail {
                field: "body".to_string(),
                message: err.body_text(),
            }]),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "query".to_string(),
            message: rejection.body_text(),
        }])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Debug, Deserialize, Serialize)]
    struct Counter {
        count: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Filter {
        #[allow(dead_code)]
        limit: Option<i64>,
    }

    async fn echo(
        Path(id): Path<Uuid>,
        Query(_filter): Query<Filter>,
        Json(body): Json<Counter>,
    ) -> Json<(Uuid, u32)> {
        Json((id, body.count))
    }

    async fn call(uri: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route("/items/:id", post(echo));
        let response = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_accepts_well_formed_request() {
        let id = Uuid::new_v4();
        let (status, body) = call(&format!("/items/{}?limit=3", id), r#"{"count": 2}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([id, 2]));
    }

    #[tokio::test]
    async fn test_rejections_render_as_api_errors() {
        let id = Uuid::new_v4();

        let (status, body) = call("/items/not-a-uuid", r#"{"count": 2}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let (status, body) = call(&format!("/items/{}?limit=many", id), r#"{"count": 2}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "query");

        let (status, body) = call(&format!("/items/{}", id), r#"{"count": "two"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "body");

        let (status, body) = call(&format!("/items/{}", id), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }
}
