/// Task endpoints
///
/// Reading a single task and the self-scoped listing are open to any
/// authenticated user; everything else is admin-only (enforced by the
/// router's gates).
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create a task (multipart, up to 3 PDFs)
/// - `GET /v1/tasks` - List all tasks with filters and paging (admin)
/// - `GET /v1/tasks/my` - List tasks assigned to the caller
/// - `GET /v1/tasks/:id` - Get one populated task
/// - `PUT /v1/tasks/:id` - Partially update a task (multipart)
/// - `DELETE /v1/tasks/:id` - Delete a task
///
/// # Write semantics
///
/// Updates are partial merges: omitted fields are left unchanged. The
/// `assignedTo` field distinguishes absent (unchanged) from present-but-
/// empty (cleared) from an email (re-resolved). Document removals are
/// processed before new uploads so the attachment count check sees the
/// post-removal state.
///
/// Multi-step writes are not transactional across the object store and the
/// database; each step compensates on failure (uploaded objects are deleted
/// if a later step fails) rather than relying on a cross-system commit.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    multipart::TaskForm,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskdesk_shared::{
    auth::middleware::CurrentUser,
    models::{
        task::{
            CreateDocument, CreateTask, Task, TaskDocument, TaskFilter, TaskPage, TaskPatch,
            TaskSort, TaskView,
        },
        user::User,
    },
    storage::attachments::UploadedDocument,
};
use uuid::Uuid;

use super::users::MessageResponse;

/// Default page size for task listings
const DEFAULT_PAGE_LIMIT: i64 = 10;

/// List query parameters
///
/// `status` and `priority` are exact-match filters; an unknown value is a
/// 400. `sort` accepts `dueDate:asc` / `dueDate:desc`; anything else falls
/// back to insertion order.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl TaskListQuery {
    fn filter(&self) -> Result<TaskFilter, ApiError> {
        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse().map_err(ApiError::BadRequest)?),
        };
        let priority = match self.priority.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(raw.parse().map_err(ApiError::BadRequest)?),
        };

        Ok(TaskFilter {
            status,
            priority,
            assigned_to: None,
        })
    }

    fn sort(&self) -> TaskSort {
        TaskSort::parse(self.sort.as_deref())
    }

    fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }
}

/// Resolves an assignee email to a user id
///
/// # Errors
///
/// - `400 Bad Request`: no user with that email
async fn resolve_assignee(state: &AppState, email: &str) -> Result<Uuid, ApiError> {
    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Assigned user does not exist".to_string()))?;

    Ok(user.id)
}

/// Records uploaded documents on a task
///
/// If a row insert fails, the rows already written for this batch are
/// removed again and every uploaded object of the batch is deleted
/// best-effort, so a failed batch leaves nothing behind on either side.
async fn record_documents(
    state: &AppState,
    task_id: Uuid,
    uploaded: &[UploadedDocument],
) -> Result<(), ApiError> {
    let mut recorded: Vec<Uuid> = Vec::with_capacity(uploaded.len());

    for doc in uploaded {
        let result = TaskDocument::create(
            &state.db,
            CreateDocument {
                task_id,
                name: doc.name.clone(),
                url: doc.url.clone(),
                storage_key: doc.storage_key.clone(),
                content_type: doc.content_type.clone(),
                size_bytes: doc.size_bytes,
            },
        )
        .await;

        match result {
            Ok(row) => recorded.push(row.id),
            Err(e) => {
                // Compensate: undo the rows of this batch, then drop every
                // uploaded object (rows and objects go together)
                for id in recorded {
                    TaskDocument::delete(&state.db, id).await.ok();
                }
                for doc in uploaded {
                    state.attachments.delete_remote(&doc.storage_key).await;
                }
                return Err(e.into());
            }
        }
    }

    Ok(())
}

/// Create a task (admin, multipart)
///
/// Resolves `assignedTo` by email, validates and uploads attachments, and
/// persists with the creator fixed to the caller. If uploads fail, the
/// freshly created row is removed again.
///
/// # Errors
///
/// - `400 Bad Request`: empty title, unknown assignee, bad files
/// - `500 Internal Server Error`: storage or save failure
pub async fn create_task(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let form = TaskForm::parse(multipart).await?;

    let title = form
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    let assigned_to = match form.assigned_to.as_deref() {
        None | Some("") => None,
        Some(email) => Some(resolve_assignee(&state, email).await?),
    };

    // Attachment validation runs before the row exists so an invalid batch
    // leaves no trace at all
    state.attachments.validate(0, &form.files)?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title,
            description: form.description.clone(),
            status: form.status()?.unwrap_or_default(),
            priority: form.priority()?.unwrap_or_default(),
            due_date: form.due_date()?.flatten(),
            assigned_to,
            created_by: caller.id,
        },
    )
    .await?;

    if !form.files.is_empty() {
        let uploaded = match state.attachments.upload(task.id, 0, form.files).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                // Compensate: the row without its documents is useless
                Task::delete(&state.db, task.id).await.ok();
                return Err(e.into());
            }
        };

        if let Err(e) = record_documents(&state, task.id, &uploaded).await {
            Task::delete(&state.db, task.id).await.ok();
            return Err(e);
        }
    }

    tracing::info!(task_id = %task.id, created_by = %caller.id, "Task created");

    let view = task.into_view(&state.db).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// List all tasks with filters, sorting, and paging (admin)
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskPage>> {
    let filter = query.filter()?;
    let page = Task::list(&state.db, &filter, query.sort(), query.page(), query.limit()).await?;

    Ok(Json(page))
}

/// List tasks assigned to the caller
pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskPage>> {
    let mut filter = query.filter()?;
    filter.assigned_to = Some(caller.id);

    let page = Task::list(&state.db, &filter, query.sort(), query.page(), query.limit()).await?;

    Ok(Json(page))
}

/// Get one populated task
///
/// # Errors
///
/// - `404 Not Found`: no such task
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskView>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let view = task.into_view(&state.db).await?;
    Ok(Json(view))
}

/// Partially update a task (admin, multipart)
///
/// Omitted fields are left unchanged. Document removals run first, then new
/// uploads (so the count limit sees the post-removal state), then the field
/// patch.
///
/// # Errors
///
/// - `400 Bad Request`: empty title, unknown assignee, bad files
/// - `404 Not Found`: task or listed document absent
/// - `500 Internal Server Error`: storage or save failure
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<TaskView>> {
    let mut form = TaskForm::parse(multipart).await?;

    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    // A present-but-empty title would wipe a required field
    if let Some(title) = &form.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
        }
    }

    let assigned_to = match form.assigned_to.as_deref() {
        None => None,
        Some("") => Some(None),
        Some(email) => Some(Some(resolve_assignee(&state, email).await?)),
    };

    // Detach listed documents first
    for document_id in &form.files_to_delete {
        let document = TaskDocument::find_on_task(&state.db, task.id, *document_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

        // Remote delete is best-effort; the local record goes either way
        state.attachments.delete_remote(&document.storage_key).await;
        TaskDocument::delete(&state.db, document.id).await?;
    }

    // Then attach new uploads against the post-removal count
    let files = std::mem::take(&mut form.files);
    if !files.is_empty() {
        let existing = TaskDocument::count_for_task(&state.db, task.id).await? as usize;
        let uploaded = state.attachments.upload(task.id, existing, files).await?;
        record_documents(&state, task.id, &uploaded).await?;
    }

    let patch = TaskPatch {
        title: form.title.clone(),
        description: form.description.clone(),
        status: form.status()?,
        priority: form.priority()?,
        due_date: form.due_date()?,
        assigned_to,
    };

    let task = Task::update(&state.db, task.id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task.id, "Task updated");

    let view = task.into_view(&state.db).await?;
    Ok(Json(view))
}

/// Delete a task (admin)
///
/// Remote documents are deleted best-effort before the row goes; document
/// rows cascade with the task.
///
/// # Errors
///
/// - `404 Not Found`: no such task
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    for document in TaskDocument::list_by_task(&state.db, task.id).await? {
        state.attachments.delete_remote(&document.storage_key).await;
    }

    Task::delete(&state.db, task.id).await?;

    tracing::info!(task_id = %task.id, "Task deleted");

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
