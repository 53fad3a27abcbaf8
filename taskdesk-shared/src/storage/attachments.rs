/// Task attachment manager
///
/// Sits between the API handlers and the object store. All validation (file
/// type, per-task count) happens before the first byte is uploaded, and a
/// batch that fails partway compensates by deleting the objects it already
/// uploaded.
///
/// Detach is best-effort on the remote side: the local record is removed
/// even if the remote delete fails, and the orphaned object is logged.

use bytes::Bytes;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use super::object_store::{ObjectStore, StorageError};
use crate::models::task::MAX_TASK_DOCUMENTS;

/// Required content type for task documents
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Magic prefix of a PDF payload
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Error type for attachment operations
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// Combined existing + new document count would exceed the limit
    #[error("Maximum {MAX_TASK_DOCUMENTS} documents allowed ({existing} attached, {new} new)")]
    TooManyDocuments { existing: usize, new: usize },

    /// File is not a PDF (declared type or payload magic mismatch)
    #[error("Only PDF files are allowed: {0}")]
    NotPdf(String),

    /// Remote storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// An incoming file from a multipart request
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name
    pub name: String,

    /// Declared content type
    pub content_type: String,

    /// Raw payload
    pub bytes: Bytes,
}

/// A successfully uploaded attachment, ready to be recorded on the task
#[derive(Debug, Clone)]
pub struct UploadedDocument {
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

/// Uploads and deletes task documents against an [`ObjectStore`]
#[derive(Clone)]
pub struct AttachmentManager {
    store: Arc<dyn ObjectStore>,
}

impl AttachmentManager {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Validates a batch of files against a task's existing document count
    ///
    /// Checks run before any I/O:
    /// - combined existing + new count must not exceed [`MAX_TASK_DOCUMENTS`]
    /// - every file must declare `application/pdf` AND start with `%PDF-`
    ///   (the declared MIME type alone is not trusted)
    pub fn validate(&self, existing_count: usize, files: &[UploadFile]) -> Result<(), AttachmentError> {
        if existing_count + files.len() > MAX_TASK_DOCUMENTS {
            return Err(AttachmentError::TooManyDocuments {
                existing: existing_count,
                new: files.len(),
            });
        }

        for file in files {
            if file.content_type != PDF_CONTENT_TYPE || !file.bytes.starts_with(PDF_MAGIC) {
                return Err(AttachmentError::NotPdf(file.name.clone()));
            }
        }

        Ok(())
    }

    /// Validates and uploads a batch of files under a task-scoped folder
    ///
    /// Uploads run sequentially. If one fails, objects already uploaded in
    /// this batch are deleted best-effort before the error is returned, so a
    /// failed batch leaves nothing behind.
    pub async fn upload(
        &self,
        task_id: Uuid,
        existing_count: usize,
        files: Vec<UploadFile>,
    ) -> Result<Vec<UploadedDocument>, AttachmentError> {
        self.validate(existing_count, &files)?;

        let mut uploaded: Vec<UploadedDocument> = Vec::with_capacity(files.len());

        for file in files {
            let key = object_key(task_id, &file.name);
            let size_bytes = file.bytes.len() as i64;

            match self.store.put(&key, &file.content_type, file.bytes).await {
                Ok(stored) => uploaded.push(UploadedDocument {
                    name: file.name,
                    url: stored.url,
                    storage_key: stored.key,
                    content_type: file.content_type,
                    size_bytes,
                }),
                Err(e) => {
                    // Compensate: undo the uploads that already succeeded
                    for doc in &uploaded {
                        if let Err(del_err) = self.store.delete(&doc.storage_key).await {
                            warn!(
                                key = %doc.storage_key,
                                error = %del_err,
                                "Failed to roll back uploaded object"
                            );
                        }
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(uploaded)
    }

    /// Deletes a remote object, best-effort
    ///
    /// A remote failure is logged, not propagated: the caller removes the
    /// local record either way and the object is left for reconciliation.
    pub async fn delete_remote(&self, storage_key: &str) {
        if let Err(e) = self.store.delete(storage_key).await {
            warn!(key = %storage_key, error = %e, "Remote document delete failed, object orphaned");
        }
    }
}

/// Builds a task-scoped storage key for a file
///
/// A random component keeps same-named uploads from colliding.
fn object_key(task_id: Uuid, file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("tasks/{}/{}-{}", task_id, Uuid::new_v4(), sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::object_store::MemoryObjectStore;

    fn pdf_file(name: &str) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes: Bytes::from_static(b"%PDF-1.7 content"),
        }
    }

    fn manager_with_store() -> (AttachmentManager, Arc<MemoryObjectStore>) {
        let store = Arc::new(MemoryObjectStore::new());
        (AttachmentManager::new(store.clone()), store)
    }

    #[test]
    fn test_validate_rejects_over_limit() {
        let (manager, _) = manager_with_store();
        let files = vec![pdf_file("a.pdf"), pdf_file("b.pdf")];

        // 2 existing + 2 new = 4 > 3
        let result = manager.validate(2, &files);
        assert!(matches!(
            result,
            Err(AttachmentError::TooManyDocuments { existing: 2, new: 2 })
        ));

        // 1 existing + 2 new = 3 is fine
        assert!(manager.validate(1, &files).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_content_type() {
        let (manager, _) = manager_with_store();
        let files = vec![UploadFile {
            name: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: Bytes::from_static(b"%PDF-fake"),
        }];

        assert!(matches!(
            manager.validate(0, &files),
            Err(AttachmentError::NotPdf(_))
        ));
    }

    #[test]
    fn test_validate_rejects_spoofed_mime_type() {
        // Declared application/pdf but payload is not a PDF
        let (manager, _) = manager_with_store();
        let files = vec![UploadFile {
            name: "evil.pdf".to_string(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes: Bytes::from_static(b"MZ\x90\x00"),
        }];

        assert!(matches!(
            manager.validate(0, &files),
            Err(AttachmentError::NotPdf(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_stores_all_files() {
        let (manager, store) = manager_with_store();
        let task_id = Uuid::new_v4();

        let docs = manager
            .upload(task_id, 0, vec![pdf_file("a.pdf"), pdf_file("b.pdf")])
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(store.len(), 2);
        for doc in &docs {
            assert!(doc.storage_key.starts_with(&format!("tasks/{}/", task_id)));
            assert!(doc.storage_key.ends_with("a.pdf") || doc.storage_key.ends_with("b.pdf"));
            assert_eq!(doc.content_type, PDF_CONTENT_TYPE);
            assert!(doc.size_bytes > 0);
            assert!(store.contains(&doc.storage_key));
        }
    }

    #[tokio::test]
    async fn test_upload_over_limit_performs_no_storage_calls() {
        let (manager, store) = manager_with_store();
        let files = vec![
            pdf_file("a.pdf"),
            pdf_file("b.pdf"),
            pdf_file("c.pdf"),
            pdf_file("d.pdf"),
        ];

        let result = manager.upload(Uuid::new_v4(), 0, files).await;

        assert!(matches!(
            result,
            Err(AttachmentError::TooManyDocuments { .. })
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_nothing_behind() {
        let (manager, store) = manager_with_store();

        // First batch succeeds, pre-populating one object
        let kept = manager
            .upload(Uuid::new_v4(), 0, vec![pdf_file("kept.pdf")])
            .await
            .unwrap();
        assert_eq!(store.len(), 1);

        // Second batch fails on its second file; the first file of the
        // batch must be rolled back, the pre-existing object kept
        store.fail_after(1);
        let result = manager
            .upload(Uuid::new_v4(), 0, vec![pdf_file("x.pdf"), pdf_file("y.pdf")])
            .await;

        assert!(matches!(result, Err(AttachmentError::Storage(_))));
        assert_eq!(store.len(), 1);
        assert!(store.contains(&kept[0].storage_key));
    }

    #[tokio::test]
    async fn test_delete_remote_never_panics() {
        let (manager, _) = manager_with_store();
        manager.delete_remote("tasks/none/missing.pdf").await;
    }

    #[test]
    fn test_object_key_sanitizes_name() {
        let task_id = Uuid::new_v4();
        let key = object_key(task_id, "my report (final)!.pdf");

        assert!(key.starts_with(&format!("tasks/{}/", task_id)));
        assert!(key.ends_with("my_report__final__.pdf"));
    }
}
