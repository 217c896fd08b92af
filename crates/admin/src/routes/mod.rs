//! HTTP route handlers for the admin console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Dashboard overview
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (probes the backend)
//!
//! # Auth
//! GET  /login                         - Login page
//! POST /login                         - Sign in against the backend
//! POST /logout                        - Sign out
//!
//! # Managed entities (products, categories, landmarks, coupons)
//! GET  /entities/{slug}               - Listing; ?search=, ?new=1, ?edit={id},
//!                                       ?confirm_delete={id} drive the form state
//! POST /entities/{slug}               - Create, or update when the form carries an id
//! POST /entities/{slug}/{id}/delete   - Delete after the confirm step
//! POST /entities/{slug}/{id}/toggle   - Flip a coupon active or inactive
//!
//! # Orders
//! GET  /orders                        - Paged listing with status and guest filters
//! GET  /orders/{id}                   - Order detail
//! POST /orders/{id}/status            - Move the order to a new status
//!
//! # Customers
//! GET  /customers                     - Listing with search
//! GET  /customers/{id}/orders         - One customer's order history
//!
//! # Deals
//! GET  /deals                         - Read-only view of products on deal
//!
//! # CSV import
//! GET  /imports                       - Import page
//! POST /imports                       - Upload a CSV to the backend
//! GET  /imports/template/{kind}       - Downloadable CSV template
//! ```
//!
//! Everything except `/login` and the health checks requires an admin
//! session; handlers take [`RequireAdminAuth`](crate::middleware::RequireAdminAuth)
//! and unauthenticated requests are redirected to the login page.

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod deals;
pub mod entities;
pub mod imports;
pub mod orders;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// CSV uploads are capped at 5 MB.
const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the managed entity routes router.
pub fn entity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/entities/{slug}",
            get(entities::index).post(entities::save),
        )
        .route("/entities/{slug}/{id}/delete", post(entities::delete))
        .route("/entities/{slug}/{id}/toggle", post(entities::toggle))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(customers::index))
        .route("/customers/{id}/orders", get(customers::orders))
}

/// Create the CSV import routes router.
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/imports", get(imports::index).post(imports::upload))
        .route("/imports/template/{kind}", get(imports::template))
        .layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES))
}

/// Create all routes for the admin console.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/deals", get(deals::index))
        .merge(auth_routes())
        .merge(entity_routes())
        .merge(order_routes())
        .merge(customer_routes())
        .merge(import_routes())
}
