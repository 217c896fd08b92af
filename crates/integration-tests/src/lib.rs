//! Integration tests for Merlion Gifts.
//!
//! These tests drive real HTTP requests against running services, so every
//! test is `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Terminal 1: the commerce backend
//! # Terminal 2: cargo run -p merlion-storefront
//! # Terminal 3: cargo run -p merlion-admin
//!
//! cargo test -p merlion-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - storefront base URL (default: `http://localhost:3000`)
//! - `ADMIN_BASE_URL` - admin console base URL (default: `http://localhost:3001`)
//! - `BACKEND_API_URL` - commerce backend base URL (default: `http://localhost:8000`)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - unlock the signed-in admin flows

#![forbid(unsafe_code)]

use reqwest::Client;
use serde_json::Value;

/// Shared state for one test: an HTTP client plus the service base URLs.
///
/// The client holds a cookie store, so session state (guest carts, admin
/// sign-ins) persists across requests made through the same context.
pub struct TestContext {
    pub http: Client,
    pub storefront_url: String,
    pub admin_url: String,
    pub backend_url: String,
}

impl TestContext {
    /// Builds a context from the environment, with localhost defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            http: Self::client(),
            storefront_url: env_or("STOREFRONT_BASE_URL", "http://localhost:3000"),
            admin_url: env_or("ADMIN_BASE_URL", "http://localhost:3001"),
            backend_url: env_or("BACKEND_API_URL", "http://localhost:8000"),
        }
    }

    /// A cookie-holding client that follows redirects.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// A cookie-holding client that reports redirects instead of following
    /// them, for asserting on `Location` headers.
    #[must_use]
    pub fn manual_redirect_client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Joins a path onto the backend's `/api` prefix.
    #[must_use]
    pub fn backend(&self, path: &str) -> String {
        format!("{}/api{path}", self.backend_url)
    }

    /// Fetches one product from the backend catalog, for flows that need a
    /// real product id. Returns `None` when the backend is unreachable or
    /// the catalog is empty, so callers can skip instead of failing.
    pub async fn any_product(&self) -> Option<Value> {
        let rows: Vec<Value> = self
            .http
            .get(self.backend("/products"))
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;
        rows.into_iter().next()
    }

    /// Admin operator credentials, when the environment provides them.
    #[must_use]
    pub fn admin_credentials() -> Option<(String, String)> {
        let email = std::env::var("ADMIN_EMAIL").ok()?;
        let password = std::env::var("ADMIN_PASSWORD").ok()?;
        Some((email, password))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_urls() -> TestContext {
        TestContext {
            http: TestContext::client(),
            storefront_url: "http://shop.test".to_owned(),
            admin_url: "http://admin.test".to_owned(),
            backend_url: "http://api.test".to_owned(),
        }
    }

    #[test]
    fn test_storefront_joins_path() {
        let ctx = context_with_urls();
        assert_eq!(ctx.storefront("/cart/count"), "http://shop.test/cart/count");
    }

    #[test]
    fn test_backend_adds_api_prefix() {
        let ctx = context_with_urls();
        assert_eq!(ctx.backend("/products"), "http://api.test/api/products");
    }

    #[test]
    fn test_admin_joins_path() {
        let ctx = context_with_urls();
        assert_eq!(ctx.admin("/login"), "http://admin.test/login");
    }
}
