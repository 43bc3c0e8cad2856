/// Task endpoints
///
/// # Endpoints
///
/// - `POST {prefix}/tasks` - Create a task (always starts `pending`)
/// - `GET {prefix}/tasks?status=&priority=&limit=&offset=` - List own tasks
/// - `GET {prefix}/tasks/:id` - Get a task
/// - `PATCH {prefix}/tasks/:id` - Partial update
/// - `POST {prefix}/tasks/:id/complete` - Mark completed
/// - `DELETE {prefix}/tasks/:id` - Delete
///
/// A task id that doesn't exist is a 404; one that belongs to another user
/// is a 403.

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
    models::task::{CreateTask, Task, TaskFilter, TaskPriority, TaskRead, TaskStatus, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for task listings
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Loads a task and checks the caller owns it
async fn load_owned_task(state: &AppState, id: Uuid, auth: &AuthContext) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::TaskNotFound)?;

    require_owner(task.user_id, auth)?;

    Ok(task)
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<TaskRead>)> {
    req.validate()?;

    let task = Task::create(&state.db, auth.user_id, req).await?;

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// Lists the caller's tasks, highest priority and soonest due first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Page<TaskRead>>> {
    let pagination = Pagination::resolve(query.limit, query.offset)?;
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
    };

    let tasks = Task::list_for_user(
        &state.db,
        auth.user_id,
        filter,
        pagination.limit,
        pagination.offset,
    )
    .await?;
    let total = Task::count_for_user(&state.db, auth.user_id, filter).await?;

    Ok(Json(Page::new(
        tasks.into_iter().map(TaskRead::from).collect(),
        total,
        pagination,
    )))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskRead>> {
    let task = load_owned_task(&state, id, &auth).await?;
    Ok(Json(task.into()))
}

/// Applies a partial update; absent fields keep their values
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTask>,
) -> ApiResult<Json<TaskRead>> {
    req.validate()?;

    let task = load_owned_task(&state, id, &auth).await?;
    if req.is_empty() {
        return Ok(Json(task.into()));
    }

    let task = Task::update(&state.db, id, auth.user_id, req)
        .await?
        .ok_or(ApiError::TaskNotFound)?;

    tracing::debug!(task_id = %task.id, status = %task.status, "Task updated");

    Ok(Json(task.into()))
}

pub async fn complete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskRead>> {
    load_owned_task(&state, id, &auth).await?;

    let task = Task::complete(&state.db, id, auth.user_id)
        .await?
        .ok_or(ApiError::TaskNotFound)?;

    Ok(Json(task.into()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    load_owned_task(&state, id, &auth).await?;

    if !Task::delete(&state.db, id, auth.user_id).await? {
        return Err(ApiError::TaskNotFound);
    }

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
