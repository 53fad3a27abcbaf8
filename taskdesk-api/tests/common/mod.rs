/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test admin/member user creation
/// - Session token generation
/// - Multipart request body construction
///
/// Tests run against a real Postgres instance (`DATABASE_URL`) with the
/// object store swapped for an in-memory double, so stored documents can be
/// inspected without a remote service.

use std::sync::Arc;

use sqlx::PgPool;
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::{ApiConfig, Config, JwtConfig};
use taskdesk_shared::auth::jwt::{create_token, Claims};
use taskdesk_shared::auth::password::hash_password;
use taskdesk_shared::db::pool::DatabaseConfig;
use taskdesk_shared::models::user::{CreateUser, User, UserRole};
use taskdesk_shared::storage::object_store::{MemoryObjectStore, StorageConfig};
use uuid::Uuid;

/// Password used for every test account
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub store: Arc<MemoryObjectStore>,
    pub admin: User,
    pub admin_token: String,
    pub member: User,
    pub member_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh admin and member account
    pub async fn new() -> anyhow::Result<Self> {
        let config = test_config()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let password_hash = hash_password(TEST_PASSWORD)?;

        let admin = User::create(
            &db,
            CreateUser {
                email: format!("admin-{}@example.com", Uuid::new_v4()),
                password_hash: password_hash.clone(),
                role: UserRole::Admin,
            },
        )
        .await?;

        let member = User::create(
            &db,
            CreateUser {
                email: format!("member-{}@example.com", Uuid::new_v4()),
                password_hash,
                role: UserRole::User,
            },
        )
        .await?;

        let admin_token = create_token(&Claims::new(admin.id), &config.jwt.secret)?;
        let member_token = create_token(&Claims::new(member.id), &config.jwt.secret)?;

        let store = Arc::new(MemoryObjectStore::new());
        let state = AppState::new(db.clone(), store.clone(), config);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            store,
            admin,
            admin_token,
            member,
            member_token,
        })
    }

    /// Returns the admin authorization header value
    pub fn admin_auth(&self) -> String {
        format!("Bearer {}", self.admin_token)
    }

    /// Returns the member authorization header value
    pub fn member_auth(&self) -> String {
        format!("Bearer {}", self.member_token)
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        // Document rows cascade with their tasks
        sqlx::query("DELETE FROM tasks WHERE created_by = $1 OR created_by IS NULL")
            .bind(self.admin.id)
            .execute(&self.db)
            .await?;

        User::delete(&self.db, self.admin.id).await?;
        User::delete(&self.db, self.member.id).await?;
        Ok(())
    }
}

/// Builds a configuration for tests
///
/// Only `DATABASE_URL` comes from the environment; everything else is
/// fixed, and the storage section is never used because the tests inject an
/// in-memory store.
fn test_config() -> anyhow::Result<Config> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set for integration tests"))?;

    Ok(Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url,
            ..Default::default()
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
        },
        storage: StorageConfig {
            endpoint: "http://localhost:9000/uploads".to_string(),
            public_base_url: "http://localhost:9000/public".to_string(),
            api_key: "unused".to_string(),
            timeout_seconds: 5,
        },
    })
}

/// A multipart form field
pub enum Part<'a> {
    /// Plain text field
    Text(&'a str, &'a str),
    /// File field: (name, filename, content type, bytes)
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

/// Builds a multipart/form-data body by hand
///
/// Returns the content-type header value and the encoded body.
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let boundary = format!("----taskdesk-test-{}", Uuid::new_v4().simple());
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// A minimal but structurally valid PDF payload
pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n"
        .to_vec()
}
