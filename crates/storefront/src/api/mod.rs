//! Commerce backend REST API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//! - Account-scoped calls authenticate with the backend session token as a
//!   bearer credential; the token itself lives in the visitor's session
//!
//! # Example
//!
//! ```rust,ignore
//! use merlion_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.backend)?;
//!
//! // Browse the catalog
//! let products = client.products(&ProductQuery::default()).await?;
//!
//! // Act on a signed-in visitor's cart
//! client.add_to_cart(&token, &product_id, 2, None).await?;
//! let cart = client.cart(&token).await?;
//! ```

mod client;
pub mod types;

pub use client::ApiClient;
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
    /// These are written for end users ("Invalid coupon code", "Coupon has
    /// expired") and are safe to render inline on a form.
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
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("Product not found".to_string());
        assert_eq!(err.to_string(), "Not found: Product not found");
    }

    #[test]
    fn test_status_error_display() {
        let err = ApiError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            detail: "Coupon has expired".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend returned 400 Bad Request: Coupon has expired"
        );
    }

    #[test]
    fn test_user_detail() {
        let err = ApiError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            detail: "Coupon has expired".to_string(),
        };
        assert_eq!(err.user_detail(), Some("Coupon has expired"));

        let err = ApiError::Unauthorized("Not authenticated".to_string());
        assert!(err.is_unauthorized());
        assert_eq!(err.user_detail(), Some("Not authenticated"));
    }
}
