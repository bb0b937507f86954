//! Caller context extraction
//!
//! Authentication itself belongs to the upstream identity service; handlers
//! here only need to know which teacher is calling so papers and history can
//! be scoped per owner.

use crate::errors::{AppError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Extracted caller context available to handlers
#[derive(Debug, Clone)]
pub struct OwnerContext {
    /// Authenticated caller id, as asserted by the upstream identity layer
    pub owner_id: String,

    /// Request ID for tracing
    pub request_id: String,
}

/// Axum extractor for OwnerContext
impl<S> FromRequestParts<S> for OwnerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Extract caller id
        let owner_id = parts
            .headers
            .get("x-teacher-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.trim().is_empty())
            .map(String::from)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing or invalid X-Teacher-ID header".to_string(),
            })?;

        Ok(OwnerContext {
            owner_id,
            request_id,
        })
    }
}
