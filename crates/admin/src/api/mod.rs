//! Commerce backend admin REST API client.
//!
//! # Architecture
//!
//! - Same backend as the storefront, scoped to the `/api/admin/*` surface
//! - NO caching: operator views must always show fresh data
//! - Every call past login carries the admin session token as a bearer
//!   credential; the backend enforces the admin flag on its side
//!
//! # Example
//!
//! ```rust,ignore
//! use merlion_admin::api::AdminApiClient;
//!
//! let client = AdminApiClient::new(&config.backend)?;
//!
//! let auth = client.admin_login("ops@merliongifts.sg", "...").await?;
//! let stats = client.dashboard_stats(&auth.session_token).await?;
//! ```

mod client;
pub mod types;

pub use client::AdminApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token missing, expired, or rejected (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status, with the backend's `detail` message.
    #[error("Backend returned {status}: {detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },
}

impl ApiError {
    /// The backend's own message for this failure, when it sent one.
    ///
    /// Mutation rejections ("Coupon code already exists", "Invalid status")
    /// are written to be shown to the operator as-is.
    #[must_use]
    pub fn user_detail(&self) -> Option<&str> {
        match self {
            Self::NotFound(detail) | Self::Unauthorized(detail) | Self::Status { detail, .. } => {
                Some(detail)
            }
            Self::Http(_) | Self::Parse(_) => None,
        }
    }

    /// Whether the failure is an auth rejection.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Unauthorized("Admin access required".to_string());
        assert_eq!(err.to_string(), "Unauthorized: Admin access required");
    }

    #[test]
    fn test_mutation_rejection_detail() {
        let err = ApiError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            detail: "Coupon code already exists".to_string(),
        };
        assert_eq!(err.user_detail(), Some("Coupon code already exists"));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_transport_errors_have_no_detail() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::Parse(json_err);
        assert_eq!(err.user_detail(), None);
    }
}
