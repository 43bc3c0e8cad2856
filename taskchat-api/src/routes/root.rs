/// Welcome endpoint
///
/// ```text
/// GET /
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("Welcome to {}", state.settings.app_name),
    })
}
