/// Task endpoints
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task owned by the caller
/// - `GET /tasks` - List own tasks (filter, sort, paginate)
/// - `GET /tasks/:id` - Fetch one own task
/// - `PATCH /tasks/:id` - Update one own task
/// - `DELETE /tasks/:id` - Delete one own task
///
/// Every handler resolves the caller from the auth guard and scopes the
/// query by `(id, owner)`. A task owned by someone else yields the same
/// 404 as a missing task, so task IDs leak nothing across accounts.

use crate::{
    app::{AppState, AuthSession},
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use taskdeck_shared::models::task::{
    CreateTask, Task, TaskFilter, TaskPage, TaskSort, UpdateTask,
};
use uuid::Uuid;

/// Create-task request body
///
/// Only title, description, and completed are read; anything else in the
/// body (including an owner field) is ignored, and the owner is always
/// the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Task title (required, non-empty)
    pub title: Option<String>,

    /// Optional description
    pub description: Option<String>,

    /// Optional initial completion flag
    pub completed: Option<bool>,
}

/// Listing query parameters
///
/// Wire format: `GET /tasks?completed=true&limit=10&skip=20&sortBy=createdAt:desc`
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Filter by completion state
    pub completed: Option<bool>,

    /// Page size (unset means all)
    pub limit: Option<i64>,

    /// Offset into the result set
    pub skip: Option<i64>,

    /// Sort spec, `field:asc|desc`
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

impl TaskListQuery {
    /// Resolves the sort spec against the column whitelist
    fn sort(&self) -> Result<TaskSort, ApiError> {
        match self.sort_by {
            Some(ref spec) => TaskSort::parse(spec).map_err(ApiError::Validation),
            None => Ok(TaskSort::default()),
        }
    }
}

/// Create a task
///
/// # Errors
///
/// - `400`: missing or empty title
/// - `500`: server error
pub async fn create_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Validation("Title is required".to_string()))?;

    let task = Task::create(
        &state.db,
        CreateTask {
            owner: session.user.id,
            title: title.to_string(),
            description: req.description,
            completed: req.completed,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
///
/// Supports `completed` filtering, `limit`/`skip` pagination, and
/// `sortBy=field:dir` ordering over a fixed column set. An empty result
/// is reported as 404, matching a lookup for data that is not there.
///
/// # Errors
///
/// - `400`: unknown sort field or direction
/// - `404`: no tasks matched
/// - `500`: server error
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiQuery(query): ApiQuery<TaskListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let sort = query.sort()?;

    let tasks = Task::list_for_owner(
        &state.db,
        session.user.id,
        TaskFilter {
            completed: query.completed,
        },
        sort,
        TaskPage {
            limit: query.limit,
            skip: query.skip,
        },
    )
    .await?;

    if tasks.is_empty() {
        return Err(ApiError::NotFound("Data not found".to_string()));
    }

    Ok(Json(tasks))
}

/// Fetch a single owned task
///
/// # Errors
///
/// - `404`: no task with this id belongs to the caller
pub async fn get_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::find_owned(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Data not found".to_string()))?;

    Ok(Json(task))
}

/// Update a single owned task
///
/// The allowed field set is exactly {title, description, completed}; any
/// other key in the body rejects the whole request before any write.
///
/// # Errors
///
/// - `400`: unknown field in the body ("Invalid update")
/// - `404`: no task with this id belongs to the caller
pub async fn update_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<Task>> {
    let update: UpdateTask = serde_json::from_value(body)
        .map_err(|_| ApiError::Validation("Invalid update".to_string()))?;

    let task = Task::update_owned(&state.db, id, session.user.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Data not found".to_string()))?;

    Ok(Json(task))
}

/// Delete a single owned task, returning the deleted row
///
/// # Errors
///
/// - `404`: no task with this id belongs to the caller
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = Task::delete_owned(&state.db, id, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Data not found".to_string()))?;

    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use taskdeck_shared::models::task::SortColumn;

    #[test]
    fn test_list_query_sort_default() {
        let query = TaskListQuery::default();
        let sort = query.sort().unwrap();
        assert_eq!(sort.column, SortColumn::CreatedAt);
        assert!(!sort.descending);
    }

    #[test]
    fn test_list_query_sort_parse() {
        let query = TaskListQuery {
            sort_by: Some("updatedAt:desc".to_string()),
            ..Default::default()
        };
        let sort = query.sort().unwrap();
        assert_eq!(sort.column, SortColumn::UpdatedAt);
        assert!(sort.descending);
    }

    #[test]
    fn test_list_query_sort_rejects_unknown_field() {
        let query = TaskListQuery {
            sort_by: Some("owner:desc".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.sort(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_list_query_wire_names() {
        let query: TaskListQuery = serde_json::from_value(json!({
            "completed": true,
            "limit": 10,
            "skip": 20,
            "sortBy": "createdAt:desc"
        }))
        .unwrap();

        assert_eq!(query.completed, Some(true));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.skip, Some(20));
        assert_eq!(query.sort_by.as_deref(), Some("createdAt:desc"));
    }

    #[test]
    fn test_create_request_ignores_owner_field() {
        // An owner in the body must not reach the model; only the three
        // creation fields are read.
        let req: CreateTaskRequest = serde_json::from_value(json!({
            "title": "T",
            "owner": "11111111-1111-1111-1111-111111111111"
        }))
        .unwrap();

        assert_eq!(req.title.as_deref(), Some("T"));
    }
}
