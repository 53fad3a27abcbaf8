/// Multipart form intake for the task write endpoints
///
/// `POST /v1/tasks` and `PUT /v1/tasks/:id` accept `multipart/form-data`
/// with text fields (`title`, `description`, `status`, `priority`,
/// `dueDate`, `assignedTo`), up to 3 `documents` file parts, and (on
/// update) repeated `filesToDelete` parts carrying document ids.
///
/// Parsing collects raw fields first; all validation and typing happens
/// before any upload is attempted. Presence is tracked per field so that
/// update handlers can distinguish "leave unchanged" (absent) from "clear"
/// (present but empty).

use axum::extract::Multipart;
use chrono::NaiveDate;
use taskdesk_shared::{
    models::task::{TaskPriority, TaskStatus},
    storage::attachments::UploadFile,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Per-file size cap (5 MB)
const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

/// Raw task form, as submitted
///
/// Text fields stay as strings here; [`TaskForm::status`],
/// [`TaskForm::priority`], and [`TaskForm::due_date`] produce the typed
/// values with 400s for malformed input.
#[derive(Debug, Default)]
pub struct TaskForm {
    /// Title field, if present
    pub title: Option<String>,

    /// Description field, if present
    pub description: Option<String>,

    /// Raw status field, if present
    pub status_raw: Option<String>,

    /// Raw priority field, if present
    pub priority_raw: Option<String>,

    /// Raw due date field (`YYYY-MM-DD`), if present
    pub due_date_raw: Option<String>,

    /// Assignee email field; `Some("")` means "clear the assignee"
    pub assigned_to: Option<String>,

    /// Uploaded document files
    pub files: Vec<UploadFile>,

    /// Document ids to detach (update only)
    pub files_to_delete: Vec<Uuid>,
}

impl TaskForm {
    /// Reads and collects a multipart request body
    ///
    /// # Errors
    ///
    /// Returns 400 for a malformed body, an oversized file, or an invalid
    /// `filesToDelete` id.
    pub async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = TaskForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                "title" => form.title = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "status" => form.status_raw = Some(field.text().await?),
                "priority" => form.priority_raw = Some(field.text().await?),
                "dueDate" => form.due_date_raw = Some(field.text().await?),
                "assignedTo" => form.assigned_to = Some(field.text().await?),
                "filesToDelete" => {
                    let raw = field.text().await?;
                    let id = raw.parse::<Uuid>().map_err(|_| {
                        ApiError::BadRequest(format!("Invalid document id: {}", raw))
                    })?;
                    form.files_to_delete.push(id);
                }
                "documents" => {
                    let file_name = field
                        .file_name()
                        .unwrap_or("document.pdf")
                        .to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;

                    if bytes.len() > MAX_FILE_BYTES {
                        return Err(ApiError::BadRequest(format!(
                            "File {} exceeds the 5 MB limit",
                            file_name
                        )));
                    }

                    form.files.push(UploadFile {
                        name: file_name,
                        content_type,
                        bytes,
                    });
                }
                // Unknown fields are ignored
                _ => {}
            }
        }

        Ok(form)
    }

    /// Typed status, if the field was present
    pub fn status(&self) -> Result<Option<TaskStatus>, ApiError> {
        parse_present(&self.status_raw)
    }

    /// Typed priority, if the field was present
    pub fn priority(&self) -> Result<Option<TaskPriority>, ApiError> {
        parse_present(&self.priority_raw)
    }

    /// Typed due date
    ///
    /// Absent field → `None` (leave unchanged); present empty → `Some(None)`
    /// (clear); present `YYYY-MM-DD` → `Some(Some(date))`.
    pub fn due_date(&self) -> Result<Option<Option<NaiveDate>>, ApiError> {
        match self.due_date_raw.as_deref() {
            None => Ok(None),
            Some("") => Ok(Some(None)),
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| ApiError::BadRequest(format!("Invalid due date: {}", raw)))?;
                Ok(Some(Some(date)))
            }
        }
    }
}

fn parse_present<T: std::str::FromStr<Err = String>>(
    raw: &Option<String>,
) -> Result<Option<T>, ApiError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(ApiError::BadRequest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_status_and_priority() {
        let form = TaskForm {
            status_raw: Some("in-progress".to_string()),
            priority_raw: Some("high".to_string()),
            ..Default::default()
        };

        assert_eq!(form.status().unwrap(), Some(TaskStatus::InProgress));
        assert_eq!(form.priority().unwrap(), Some(TaskPriority::High));
    }

    #[test]
    fn test_absent_fields_are_none() {
        let form = TaskForm::default();

        assert_eq!(form.status().unwrap(), None);
        assert_eq!(form.priority().unwrap(), None);
        assert_eq!(form.due_date().unwrap(), None);
    }

    #[test]
    fn test_invalid_status_is_bad_request() {
        let form = TaskForm {
            status_raw: Some("doing".to_string()),
            ..Default::default()
        };

        assert!(matches!(form.status(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_due_date_parsing() {
        let form = TaskForm {
            due_date_raw: Some("2025-01-01".to_string()),
            ..Default::default()
        };
        let date = form.due_date().unwrap().flatten().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        // Present but empty clears the date
        let form = TaskForm {
            due_date_raw: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(form.due_date().unwrap(), Some(None));

        let form = TaskForm {
            due_date_raw: Some("01/01/2025".to_string()),
            ..Default::default()
        };
        assert!(matches!(form.due_date(), Err(ApiError::BadRequest(_))));
    }
}
