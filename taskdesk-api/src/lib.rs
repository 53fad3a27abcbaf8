//! # Taskdesk API Server Library
//!
//! This library provides the core functionality for the Taskdesk API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `multipart`: Multipart form intake for the task write endpoints
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod multipart;
pub mod routes;
