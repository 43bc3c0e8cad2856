/// Thread and message endpoints
///
/// # Endpoints
///
/// - `POST {prefix}/threads` - Create a thread
/// - `GET {prefix}/threads` - List own threads, most recently active first
/// - `GET {prefix}/threads/:id` - Get a thread
/// - `PATCH {prefix}/threads/:id` - Rename
/// - `DELETE {prefix}/threads/:id` - Delete with all messages
/// - `GET {prefix}/threads/:id/messages` - List messages, oldest first
/// - `POST {prefix}/threads/:id/messages` - Append a message
/// - `PATCH {prefix}/threads/:id/messages/:message_id` - Edit content
/// - `DELETE {prefix}/threads/:id/messages/:message_id` - Delete a message

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Path, Query},
    routes::pagination::{Page, Pagination},
};
use axum::{extract::State, http::StatusCode, Extension};
use serde::Deserialize;
use taskchat_shared::{
    auth::{authorization::require_owner, middleware::AuthContext},
    constants::{ERROR_MESSAGE_NOT_FOUND, ERROR_THREAD_NOT_FOUND},
    models::{
        message::{CreateMessage, Message, MessageRead, UpdateMessage},
        thread::{CreateThread, Thread, ThreadRead, UpdateThread},
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Loads a thread and checks the caller owns it
pub(crate) async fn load_owned_thread(
    state: &AppState,
    id: Uuid,
    auth: &AuthContext,
) -> ApiResult<Thread> {
    let thread = Thread::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERROR_THREAD_NOT_FOUND.to_string()))?;

    require_owner(thread.user_id, auth)?;

    Ok(thread)
}

fn message_not_found() -> ApiError {
    ApiError::NotFound(ERROR_MESSAGE_NOT_FOUND.to_string())
}

pub async fn create_thread(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateThread>,
) -> ApiResult<(StatusCode, Json<ThreadRead>)> {
    req.validate()?;

    let thread = Thread::create(&state.db, auth.user_id, req).await?;

    Ok((StatusCode::CREATED, Json(thread.into())))
}

pub async fn list_threads(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<ThreadRead>>> {
    let pagination = Pagination::resolve(query.limit, query.offset)?;

    let threads =
        Thread::list_for_user(&state.db, auth.user_id, pagination.limit, pagination.offset)
            .await?;
    let total = Thread::count_for_user(&state.db, auth.user_id).await?;

    Ok(Json(Page::new(
        threads.into_iter().map(ThreadRead::from).collect(),
        total,
        pagination,
    )))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ThreadRead>> {
    let thread = load_owned_thread(&state, id, &auth).await?;
    Ok(Json(thread.into()))
}

pub async fn update_thread(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateThread>,
) -> ApiResult<Json<ThreadRead>> {
    req.validate()?;

    let thread = load_owned_thread(&state, id, &auth).await?;
    if req.is_empty() {
        return Ok(Json(thread.into()));
    }

    let thread = Thread::update(&state.db, id, auth.user_id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERROR_THREAD_NOT_FOUND.to_string()))?;

    Ok(Json(thread.into()))
}

pub async fn delete_thread(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_owned_thread(&state, id, &auth).await?;

    if !Thread::delete(&state.db, id, auth.user_id).await? {
        return Err(ApiError::NotFound(ERROR_THREAD_NOT_FOUND.to_string()));
    }

    tracing::info!(thread_id = %id, user_id = %auth.user_id, "Thread deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<MessageRead>>> {
    let pagination = Pagination::resolve(query.limit, query.offset)?;
    load_owned_thread(&state, id, &auth).await?;

    let messages =
        Message::list_for_thread(&state.db, id, pagination.limit, pagination.offset).await?;
    let total = Message::count_for_thread(&state.db, id).await?;

    Ok(Json(Page::new(
        messages.into_iter().map(MessageRead::from).collect(),
        total,
        pagination,
    )))
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateMessage>,
) -> ApiResult<(StatusCode, Json<MessageRead>)> {
    req.validate()?;
    load_owned_thread(&state, id, &auth).await?;

    let message = Message::create(&state.db, id, req).await?;

    Ok((StatusCode::CREATED, Json(message.into())))
}

pub async fn update_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateMessage>,
) -> ApiResult<Json<MessageRead>> {
    req.validate()?;
    load_owned_thread(&state, id, &auth).await?;

    let message = if req.is_empty() {
        Message::find_for_thread(&state.db, message_id, id).await?
    } else {
        Message::update(&state.db, message_id, id, req).await?
    }
    .ok_or_else(message_not_found)?;

    Ok(Json(message.into()))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, message_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    load_owned_thread(&state, id, &auth).await?;

    if !Message::delete(&state.db, message_id, id).await? {
        return Err(message_not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
