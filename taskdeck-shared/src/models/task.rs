/// Task model and owner-scoped database operations
///
/// Tasks are the owner-scoped resource at the heart of Taskdeck. Every
/// read, update, and delete is keyed by `(id, owner)`, so a task owned by
/// another user behaves exactly like a task that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description VARCHAR(1024) NOT NULL DEFAULT 'Description is not specified...',
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default description when a task is created without one
pub const DEFAULT_DESCRIPTION: &str = "Description is not specified...";

/// Task model
///
/// The owner is set at creation from the authenticated caller and never
/// reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user, immutable after creation
    pub owner: Uuid,

    /// Task title
    pub title: String,

    /// Task description (placeholder default when unset)
    pub description: String,

    /// Completion flag
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owning user (the authenticated caller)
    pub owner: Uuid,

    /// Task title (required)
    pub title: String,

    /// Optional description; the database default applies when None
    pub description: Option<String>,

    /// Optional initial completion flag (defaults to false)
    pub completed: Option<bool>,
}

/// Partial update for a task
///
/// The allowed field set is exactly {title, description, completed};
/// the HTTP boundary rejects anything else before this type is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

impl UpdateTask {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Filter applied when listing a caller's tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    /// Only return tasks with this completion state
    pub completed: Option<bool>,
}

/// Pagination window for task listings
///
/// Unset limit means unbounded; unset skip means zero offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskPage {
    /// Maximum number of tasks to return
    pub limit: Option<i64>,

    /// Number of tasks to skip
    pub skip: Option<i64>,
}

/// Sortable task columns
///
/// The whitelist keeps user-supplied sort fields out of raw SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    CreatedAt,
    UpdatedAt,
    Title,
    Description,
    Completed,
}

impl SortColumn {
    /// Parses a wire-format field name (camelCase as in `sortBy=createdAt:desc`)
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "createdAt" => Some(SortColumn::CreatedAt),
            "updatedAt" => Some(SortColumn::UpdatedAt),
            "title" => Some(SortColumn::Title),
            "description" => Some(SortColumn::Description),
            "completed" => Some(SortColumn::Completed),
            _ => None,
        }
    }

    /// The corresponding SQL column name
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
            SortColumn::Title => "title",
            SortColumn::Description => "description",
            SortColumn::Completed => "completed",
        }
    }
}

/// Sort order for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    /// Column to sort by
    pub column: SortColumn,

    /// Descending when true, ascending otherwise
    pub descending: bool,
}

impl Default for TaskSort {
    fn default() -> Self {
        Self {
            column: SortColumn::CreatedAt,
            descending: false,
        }
    }
}

impl TaskSort {
    /// Parses the wire format `field:dir`, e.g. `createdAt:desc`
    ///
    /// Direction is matched case-insensitively; a missing direction
    /// defaults to ascending. Unknown fields are rejected so they never
    /// reach SQL interpolation.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut parts = spec.splitn(2, ':');
        let field = parts.next().unwrap_or_default();

        let column =
            SortColumn::parse(field).ok_or_else(|| format!("Invalid sort field: {}", field))?;

        let descending = match parts.next() {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
            None => false,
            Some(other) => return Err(format!("Invalid sort direction: {}", other)),
        };

        Ok(Self { column, descending })
    }

    /// Renders the ORDER BY fragment
    pub fn as_sql(&self) -> String {
        format!(
            "{} {}",
            self.column.as_sql(),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

impl Task {
    /// Creates a task owned by the given user
    ///
    /// The owner always comes from the authenticated caller; any owner
    /// value in a request body has been discarded before this point.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner, title, description, completed)
            VALUES ($1, $2, COALESCE($3, 'Description is not specified...'), COALESCE($4, FALSE))
            RETURNING id, owner, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(data.owner)
        .bind(data.title)
        .bind(data.description)
        .bind(data.completed)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by id, scoped to its owner
    ///
    /// Returns None both when the task does not exist and when it exists
    /// but belongs to someone else.
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner, title, description, completed, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a caller's tasks with filtering, sorting, and pagination
    ///
    /// Only tasks where `owner` matches are ever returned. A NULL limit
    /// binds to `LIMIT NULL` (unbounded) and a NULL skip to `OFFSET NULL`
    /// (zero), so unset parameters need no special casing.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner: Uuid,
        filter: TaskFilter,
        sort: TaskSort,
        page: TaskPage,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = String::from(
            "SELECT id, owner, title, description, completed, created_at, updated_at \
             FROM tasks WHERE owner = $1",
        );

        if filter.completed.is_some() {
            query.push_str(" AND completed = $2");
        }

        // Sort column comes from the SortColumn whitelist, never from
        // user input directly.
        query.push_str(&format!(" ORDER BY {}", sort.as_sql()));

        if filter.completed.is_some() {
            query.push_str(" LIMIT $3 OFFSET $4");
        } else {
            query.push_str(" LIMIT $2 OFFSET $3");
        }

        let mut q = sqlx::query_as::<_, Task>(&query).bind(owner);

        if let Some(completed) = filter.completed {
            q = q.bind(completed);
        }

        let tasks = q.bind(page.limit).bind(page.skip).fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Applies a partial update to an owned task
    ///
    /// Only non-None fields are written. Returns None when the task is
    /// absent or owned by someone else.
    pub async fn update_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND owner = $2 \
             RETURNING id, owner, title, description, completed, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes an owned task, returning the deleted row
    ///
    /// Same ownership semantics as [`Task::find_owned`].
    pub async fn delete_owned(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner = $2
            RETURNING id, owner, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes every task owned by a user
    ///
    /// Called before account deletion as the explicit cascade step.
    /// Returns the number of tasks removed.
    pub async fn delete_by_owner(pool: &PgPool, owner: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner = $1")
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse_field_and_direction() {
        let sort = TaskSort::parse("createdAt:desc").unwrap();
        assert_eq!(sort.column, SortColumn::CreatedAt);
        assert!(sort.descending);

        let sort = TaskSort::parse("title:asc").unwrap();
        assert_eq!(sort.column, SortColumn::Title);
        assert!(!sort.descending);
    }

    #[test]
    fn test_sort_parse_defaults_to_ascending() {
        let sort = TaskSort::parse("completed").unwrap();
        assert_eq!(sort.column, SortColumn::Completed);
        assert!(!sort.descending);
    }

    #[test]
    fn test_sort_parse_rejects_unknown_field() {
        assert!(TaskSort::parse("owner:desc").is_err());
        assert!(TaskSort::parse("; DROP TABLE tasks").is_err());
        assert!(TaskSort::parse("").is_err());
    }

    #[test]
    fn test_sort_parse_direction_case_insensitive() {
        assert!(TaskSort::parse("title:DESC").unwrap().descending);
        assert!(TaskSort::parse("title:Desc").unwrap().descending);
        assert!(!TaskSort::parse("title:ASC").unwrap().descending);
    }

    #[test]
    fn test_sort_parse_rejects_unknown_direction() {
        assert!(TaskSort::parse("title:sideways").is_err());
    }

    #[test]
    fn test_sort_sql_rendering() {
        assert_eq!(TaskSort::parse("createdAt:desc").unwrap().as_sql(), "created_at DESC");
        assert_eq!(TaskSort::default().as_sql(), "created_at ASC");
    }

    #[test]
    fn test_update_task_rejects_unknown_fields() {
        // The allow-list is {title, description, completed}; anything else
        // fails deserialization outright.
        let err = serde_json::from_str::<UpdateTask>(r#"{"owner": "abc"}"#);
        assert!(err.is_err());

        let err = serde_json::from_str::<UpdateTask>(r#"{"title": "ok", "priority": 3}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_update_task_accepts_allowed_fields() {
        let update: UpdateTask =
            serde_json::from_str(r#"{"title": "T", "description": "D", "completed": true}"#)
                .unwrap();

        assert_eq!(update.title.as_deref(), Some("T"));
        assert_eq!(update.description.as_deref(), Some("D"));
        assert_eq!(update.completed, Some(true));
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_task_empty() {
        let update: UpdateTask = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());
    }
}
