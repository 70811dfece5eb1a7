// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route Prefix: /api/*
// Middleware: JWT validation puts an AuthUser in request extensions; every
// handler then checks the capability it needs before touching a store.

use uuid::Uuid;

use crate::error::ApiError;

pub mod auth; // whoami
pub mod files; // documents and images, stored as files
pub mod groups; // group membership records
pub mod json; // JSON documents
pub mod snapshots; // device snapshots

/// Path ids are UUIDs; anything else is a 400 rather than a 404
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::invalid_field("id", format!("Invalid UUID format: {}", raw)))
}
