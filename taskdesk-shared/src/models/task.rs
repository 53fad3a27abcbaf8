/// Task model and database operations
///
/// Tasks are the core entity of Taskdesk: a unit of work with a status,
/// priority, optional due date, a creator, an optional assignee, and up to
/// [`MAX_TASK_DOCUMENTS`] attached documents.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in-progress', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_documents (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     url VARCHAR(1024) NOT NULL,
///     storage_key VARCHAR(512) NOT NULL,
///     content_type VARCHAR(100) NOT NULL,
///     size_bytes BIGINT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::task::{Task, CreateTask, TaskStatus, TaskPriority};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Ship release".to_string(),
///     description: None,
///     status: TaskStatus::Todo,
///     priority: TaskPriority::High,
///     due_date: None,
///     assigned_to: None,
///     created_by: Uuid::new_v4(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user::{total_pages, UserRef};

/// Maximum number of documents attachable to one task
pub const MAX_TASK_DOCUMENTS: usize = 3;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!("Invalid priority: {}", other)),
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task title (required, non-empty)
    pub title: String,

    /// Free-text description
    pub description: Option<String>,

    /// Workflow status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Assignee (resolved from an email at write time)
    pub assigned_to: Option<Uuid>,

    /// Creator, fixed at creation (nulled if the creator is deleted)
    pub created_by: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// A document attached to a task, hosted in remote object storage
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    /// Unique document ID
    pub id: Uuid,

    /// Owning task
    pub task_id: Uuid,

    /// Display name (original file name)
    pub name: String,

    /// Public URL of the stored object
    pub url: String,

    /// Remote storage identifier, used for deletion
    pub storage_key: String,

    /// Declared content type (always `application/pdf`)
    pub content_type: String,

    /// Payload size in bytes
    pub size_bytes: i64,

    /// When the document was attached
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Title (required, non-empty)
    pub title: String,

    /// Description
    pub description: Option<String>,

    /// Initial status
    pub status: TaskStatus,

    /// Initial priority
    pub priority: TaskPriority,

    /// Due date
    pub due_date: Option<NaiveDate>,

    /// Resolved assignee id
    pub assigned_to: Option<Uuid>,

    /// Creator id (the authenticated admin)
    pub created_by: Uuid,
}

/// Partial update for a task
///
/// All fields are optional: omitted fields are left unchanged (partial
/// merge). Due date and assignee use a nested Option so that "clear the
/// field" is distinct from "leave it alone".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New due date; `Some(None)` clears it
    pub due_date: Option<Option<NaiveDate>>,

    /// New assignee; `Some(None)` clears it
    pub assigned_to: Option<Option<Uuid>>,
}

impl TaskPatch {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }
}

/// Optional exact-match filters for list queries
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Filter by status
    pub status: Option<TaskStatus>,

    /// Filter by priority
    pub priority: Option<TaskPriority>,

    /// Restrict to tasks assigned to this user (self-scoped listing)
    pub assigned_to: Option<Uuid>,
}

/// Sort order for list queries
///
/// Only due-date sorting is supported; anything else falls back to
/// insertion order, which is deterministic (created_at, then id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    /// Due date ascending, nulls last
    DueDateAsc,

    /// Due date descending, nulls last
    DueDateDesc,

    /// Insertion order
    Unsorted,
}

impl TaskSort {
    /// Parses the `sort` query parameter
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("dueDate:asc") => TaskSort::DueDateAsc,
            Some("dueDate:desc") => TaskSort::DueDateDesc,
            _ => TaskSort::Unsorted,
        }
    }

    fn order_by_clause(&self) -> &'static str {
        // Secondary keys keep pagination stable under equal due dates.
        match self {
            TaskSort::DueDateAsc => " ORDER BY due_date ASC NULLS LAST, created_at ASC, id ASC",
            TaskSort::DueDateDesc => " ORDER BY due_date DESC NULLS LAST, created_at ASC, id ASC",
            TaskSort::Unsorted => " ORDER BY created_at ASC, id ASC",
        }
    }
}

/// Task with its references expanded and documents included
///
/// This is the response shape: `assigned_to`/`created_by` are projected to
/// `{id, email}`, or null when unset or when the referenced user has been
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<UserRef>,
    pub created_by: Option<UserRef>,
    pub documents: Vec<TaskDocument>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of populated tasks plus paging metadata
#[derive(Debug, Clone, Serialize)]
pub struct TaskPage {
    /// Tasks on this page
    pub tasks: Vec<TaskView>,

    /// Total matching tasks across all pages
    pub total: i64,

    /// Requested page number (1-based)
    pub page: i64,

    /// Total number of pages
    pub pages: i64,
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, \
                            assigned_to, created_by, created_at, updated_at";

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, assigned_to, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks matching a filter, with sorting and offset pagination
    ///
    /// The count and the page fetch are two independent reads with no
    /// snapshot isolation; pagination is best-effort under concurrent
    /// writes.
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        sort: TaskSort,
        page: i64,
        limit: i64,
    ) -> Result<TaskPage, sqlx::Error> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        // Shared WHERE clause for the count and the page fetch
        let mut where_sql = String::new();
        let mut bind_count = 0;
        let mut push_condition = |cond: &str| {
            bind_count += 1;
            if where_sql.is_empty() {
                where_sql.push_str(" WHERE ");
            } else {
                where_sql.push_str(" AND ");
            }
            where_sql.push_str(&format!("{} = ${}", cond, bind_count));
        };

        if filter.status.is_some() {
            push_condition("status");
        }
        if filter.priority.is_some() {
            push_condition("priority");
        }
        if filter.assigned_to.is_some() {
            push_condition("assigned_to");
        }

        let count_sql = format!("SELECT COUNT(*) FROM tasks{where_sql}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
        }
        if let Some(priority) = filter.priority {
            count_query = count_query.bind(priority);
        }
        if let Some(assigned_to) = filter.assigned_to {
            count_query = count_query.bind(assigned_to);
        }
        let (total,) = count_query.fetch_one(pool).await?;

        let fetch_sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks{where_sql}{} LIMIT ${} OFFSET ${}",
            sort.order_by_clause(),
            bind_count + 1,
            bind_count + 2,
        );
        let mut fetch_query = sqlx::query_as::<_, Task>(&fetch_sql);
        if let Some(status) = filter.status {
            fetch_query = fetch_query.bind(status);
        }
        if let Some(priority) = filter.priority {
            fetch_query = fetch_query.bind(priority);
        }
        if let Some(assigned_to) = filter.assigned_to {
            fetch_query = fetch_query.bind(assigned_to);
        }
        let tasks = fetch_query.bind(limit).bind(offset).fetch_all(pool).await?;

        let mut views = Vec::with_capacity(tasks.len());
        for task in tasks {
            views.push(task.into_view(pool).await?);
        }

        Ok(TaskPage {
            tasks: views,
            total,
            page,
            pages: total_pages(total, limit),
        })
    }

    /// Applies a partial update
    ///
    /// Only the fields set in the patch are written. Returns the updated
    /// task, or None if the task doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        if patch.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if patch.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if patch.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if patch.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if patch.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if patch.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if patch.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = patch.title {
            q = q.bind(title);
        }
        if let Some(description) = patch.description {
            q = q.bind(description);
        }
        if let Some(status) = patch.status {
            q = q.bind(status);
        }
        if let Some(priority) = patch.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = patch.due_date {
            q = q.bind(due_date);
        }
        if let Some(assigned_to) = patch.assigned_to {
            q = q.bind(assigned_to);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task by ID
    ///
    /// Document rows cascade with the task; remote objects are the caller's
    /// responsibility (the API deletes them best-effort first).
    ///
    /// # Returns
    ///
    /// True if the task was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Expands this task into its response shape
    ///
    /// Loads the `{id, email}` projections for assignee and creator plus the
    /// attached documents. A referenced user that has been deleted renders
    /// as null.
    pub async fn into_view(self, pool: &PgPool) -> Result<TaskView, sqlx::Error> {
        let assigned_to = match self.assigned_to {
            Some(user_id) => load_user_ref(pool, user_id).await?,
            None => None,
        };
        let created_by = match self.created_by {
            Some(user_id) => load_user_ref(pool, user_id).await?,
            None => None,
        };
        let documents = TaskDocument::list_by_task(pool, self.id).await?;

        Ok(TaskView {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            assigned_to,
            created_by,
            documents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

async fn load_user_ref(pool: &PgPool, id: Uuid) -> Result<Option<UserRef>, sqlx::Error> {
    sqlx::query_as::<_, UserRef>("SELECT id, email FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Input for attaching a document record to a task
#[derive(Debug, Clone)]
pub struct CreateDocument {
    /// Owning task
    pub task_id: Uuid,

    /// Display name
    pub name: String,

    /// Public URL
    pub url: String,

    /// Remote storage identifier
    pub storage_key: String,

    /// Declared content type
    pub content_type: String,

    /// Payload size in bytes
    pub size_bytes: i64,
}

impl TaskDocument {
    /// Attaches a document record to a task
    pub async fn create(pool: &PgPool, data: CreateDocument) -> Result<Self, sqlx::Error> {
        let document = sqlx::query_as::<_, TaskDocument>(
            r#"
            INSERT INTO task_documents (task_id, name, url, storage_key, content_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, task_id, name, url, storage_key, content_type, size_bytes, created_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.name)
        .bind(data.url)
        .bind(data.storage_key)
        .bind(data.content_type)
        .bind(data.size_bytes)
        .fetch_one(pool)
        .await?;

        Ok(document)
    }

    /// Lists a task's documents in attachment order
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskDocument>(
            r#"
            SELECT id, task_id, name, url, storage_key, content_type, size_bytes, created_at
            FROM task_documents
            WHERE task_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a document on a specific task
    pub async fn find_on_task(
        pool: &PgPool,
        task_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskDocument>(
            r#"
            SELECT id, task_id, name, url, storage_key, content_type, size_bytes, created_at
            FROM task_documents
            WHERE task_id = $1 AND id = $2
            "#,
        )
        .bind(task_id)
        .bind(document_id)
        .fetch_optional(pool)
        .await
    }

    /// Counts a task's documents
    pub async fn count_for_task(pool: &PgPool, task_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM task_documents WHERE task_id = $1")
                .bind(task_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Removes a document record
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_documents WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_default() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }

    #[test]
    fn test_priority_default() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_status_serde_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");

        let status: TaskStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
    }

    #[test]
    fn test_priority_serde() {
        let json = serde_json::to_string(&TaskPriority::High).unwrap();
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("todo".parse::<TaskStatus>(), Ok(TaskStatus::Todo));
        assert!("doing".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("high".parse::<TaskPriority>(), Ok(TaskPriority::High));
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(TaskSort::parse(Some("dueDate:asc")), TaskSort::DueDateAsc);
        assert_eq!(TaskSort::parse(Some("dueDate:desc")), TaskSort::DueDateDesc);
        assert_eq!(TaskSort::parse(Some("title:asc")), TaskSort::Unsorted);
        assert_eq!(TaskSort::parse(Some("")), TaskSort::Unsorted);
        assert_eq!(TaskSort::parse(None), TaskSort::Unsorted);
    }

    #[test]
    fn test_sort_order_by_is_deterministic() {
        // Every variant carries a tiebreak on id
        for sort in [
            TaskSort::DueDateAsc,
            TaskSort::DueDateDesc,
            TaskSort::Unsorted,
        ] {
            assert!(sort.order_by_clause().contains("id ASC"));
        }
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());

        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        // Clearing a field still counts as a change
        let patch = TaskPatch {
            assigned_to: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
