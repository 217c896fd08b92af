//! Backend admin REST client implementation.
//!
//! Thin typed wrapper over `reqwest`. Unlike the storefront client this one
//! never caches: the operator is usually looking at a list they just
//! mutated, and a stale row would read as a lost write.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use merlion_core::{CouponId, OrderId, OrderStatus, UserId};

use crate::api::ApiError;
use crate::api::types::{
    Acknowledgement, AdminOrder, AuthResponse, CustomersPage, DashboardStats, EntityPage,
    OrderQuery, OrdersPage, ToggleResponse,
};
use crate::config::BackendConfig;

/// Client for the commerce backend's admin REST surface.
#[derive(Clone)]
pub struct AdminApiClient {
    inner: Arc<AdminApiClientInner>,
}

struct AdminApiClientInner {
    http: reqwest::Client,
    api_base: String,
}

impl AdminApiClient {
    /// Create a new admin API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminApiClientInner {
                http,
                api_base: format!("{}/api", config.api_url),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    /// Check status, then parse the body as JSON.
    ///
    /// Reads the body as text first so parse failures can log what the
    /// backend actually sent.
    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = extract_detail(&text, status);
            return Err(match status {
                reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(detail),
                reqwest::StatusCode::UNAUTHORIZED => ApiError::Unauthorized(detail),
                _ => ApiError::Status { status, detail },
            });
        }

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    async fn get_json_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.inner.http.post(self.url(path)).json(body).send().await?;
        Self::handle(response).await
    }

    async fn post_json_authed<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::handle(response).await
    }

    async fn put_json_authed<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::handle(response).await
    }

    async fn delete_json_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .http
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Sign in as an operator.
    ///
    /// The backend checks the password and the admin flag in one step;
    /// no OTP round-trip for admin accounts.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for a wrong password; a 403 `Status` when the account
    /// exists but is not an admin.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post_json(
            "/auth/admin-login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Counters, recent orders, and low-stock products for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn dashboard_stats(&self, token: &str) -> Result<DashboardStats, ApiError> {
        self.get_json_authed("/admin/dashboard/stats", token).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// One page of orders, filtered per `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn orders(&self, token: &str, query: &OrderQuery) -> Result<OrdersPage, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url("/admin/orders"))
            .query(&query.to_pairs())
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, token), fields(order_id = %order_id))]
    pub async fn order(&self, token: &str, order_id: &OrderId) -> Result<AdminOrder, ApiError> {
        self.get_json_authed(&format!("/admin/orders/{order_id}"), token)
            .await
    }

    /// Move an order to a new lifecycle status.
    ///
    /// The backend takes the status as a query parameter and validates it
    /// against the same five values as [`OrderStatus`].
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &str,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Acknowledgement, ApiError> {
        let response = self
            .inner
            .http
            .put(self.url(&format!("/admin/orders/{order_id}/status")))
            .query(&[("status", status.as_str())])
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Customers with their paid-order counts, optionally filtered by a
    /// name/email search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn customers(
        &self,
        token: &str,
        search: Option<&str>,
    ) -> Result<CustomersPage, ApiError> {
        let mut request = self
            .inner
            .http
            .get(self.url("/admin/customers"))
            .bearer_auth(token);
        if let Some(search) = search {
            request = request.query(&[("search", search)]);
        }
        let response = request.send().await?;
        Self::handle(response).await
    }

    /// A customer's full order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(customer_id = %customer_id))]
    pub async fn customer_orders(
        &self,
        token: &str,
        customer_id: &UserId,
    ) -> Result<Vec<AdminOrder>, ApiError> {
        #[derive(serde::Deserialize)]
        struct OrdersEnvelope {
            orders: Vec<AdminOrder>,
        }

        let envelope: OrdersEnvelope = self
            .get_json_authed(&format!("/admin/customers/{customer_id}/orders"), token)
            .await?;
        Ok(envelope.orders)
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Flip a coupon's active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(coupon_id = %coupon_id))]
    pub async fn toggle_coupon(
        &self,
        token: &str,
        coupon_id: &CouponId,
    ) -> Result<ToggleResponse, ApiError> {
        let response = self
            .inner
            .http
            .put(self.url(&format!("/admin/coupons/{coupon_id}/toggle")))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle(response).await
    }

    // =========================================================================
    // Scaffold entities
    // =========================================================================

    /// List rows for a scaffold-managed entity.
    ///
    /// `path` is the full list path including any query string. With a
    /// `response_key` the body is an envelope (`{"products": [...],
    /// "total": n}`); without one it is a bare JSON array.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` when the body does not hold an array where
    /// one is expected.
    #[instrument(skip(self, token), fields(path = %path))]
    pub async fn list_entities(
        &self,
        token: &str,
        path: &str,
        response_key: Option<&str>,
    ) -> Result<EntityPage, ApiError> {
        let mut body: Value = self.get_json_authed(path, token).await?;

        let (items_value, total) = match response_key {
            Some(key) => {
                let total = body.get("total").and_then(Value::as_i64);
                let items = body.get_mut(key).map_or(Value::Null, Value::take);
                (items, total)
            }
            None => (body, None),
        };

        let items: Vec<Value> = serde_json::from_value(items_value)?;
        Ok(EntityPage { items, total })
    }

    /// Create an entity row.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; validation rejections
    /// carry the backend's `detail` message.
    #[instrument(skip(self, token, payload), fields(path = %path))]
    pub async fn create_entity(
        &self,
        token: &str,
        path: &str,
        payload: &Value,
    ) -> Result<Value, ApiError> {
        self.post_json_authed(path, token, payload).await
    }

    /// Update an entity row.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, payload), fields(path = %path, id = %id))]
    pub async fn update_entity(
        &self,
        token: &str,
        path: &str,
        id: &str,
        payload: &Value,
    ) -> Result<Value, ApiError> {
        self.put_json_authed(&format!("{path}/{id}"), token, payload)
            .await
    }

    /// Delete an entity row.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id.
    #[instrument(skip(self, token), fields(path = %path, id = %id))]
    pub async fn delete_entity(
        &self,
        token: &str,
        path: &str,
        id: &str,
    ) -> Result<Acknowledgement, ApiError> {
        self.delete_json_authed(&format!("{path}/{id}"), token).await
    }

    // =========================================================================
    // CSV import
    // =========================================================================

    /// Forward an uploaded CSV to the backend's bulk import.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, bytes), fields(import_type = %import_type, size = bytes.len()))]
    pub async fn import_csv(
        &self,
        token: &str,
        import_type: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Acknowledgement, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new()
            .text("import_type", import_type.to_string())
            .part("file", part);

        let response = self
            .inner
            .http
            .post(self.url("/admin/import-csv"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        Self::handle(response).await
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Cheap reachability probe for the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not reachable or unhealthy.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let response = self.inner.http.get(self.url("/categories")).send().await?;
        let _: Vec<Value> = Self::handle(response).await?;
        Ok(())
    }
}

/// Pull the `detail` string out of a FastAPI-style error body.
///
/// Falls back to the status line when the body is not that shape.
fn extract_detail(body: &str, status: reqwest::StatusCode) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| match e.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_string() {
        let detail = extract_detail(
            r#"{"detail": "Admin access required"}"#,
            reqwest::StatusCode::FORBIDDEN,
        );
        assert_eq!(detail, "Admin access required");
    }

    #[test]
    fn test_extract_detail_falls_back_to_status() {
        let detail = extract_detail("<html>teapot</html>", reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(detail, "Bad Gateway");
    }

    #[test]
    fn test_url_joins_api_base() {
        let client = AdminApiClient::new(&BackendConfig {
            api_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        })
        .unwrap();
        assert_eq!(
            client.url("/admin/orders"),
            "http://localhost:8000/api/admin/orders"
        );
    }
}
