/// Remote object storage for task documents
///
/// # Modules
///
/// - [`object_store`]: the [`object_store::ObjectStore`] trait plus the HTTP
///   implementation used in production and an in-memory implementation for
///   tests
/// - [`attachments`]: the attachment manager enforcing the per-task document
///   limit and PDF validation before any upload happens
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_shared::storage::object_store::{HttpObjectStore, StorageConfig};
/// use taskdesk_shared::storage::attachments::AttachmentManager;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = HttpObjectStore::new(StorageConfig {
///     endpoint: "https://files.internal".to_string(),
///     public_base_url: "https://cdn.example.com".to_string(),
///     api_key: "secret".to_string(),
///     timeout_seconds: 30,
/// })?;
///
/// let attachments = AttachmentManager::new(Arc::new(store));
/// # Ok(())
/// # }
/// ```

pub mod attachments;
pub mod object_store;
