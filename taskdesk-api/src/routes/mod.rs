/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login, credential self-service, and admin user management
/// - `tasks`: Task CRUD, list queries, and document attachment

pub mod health;
pub mod tasks;
pub mod users;
