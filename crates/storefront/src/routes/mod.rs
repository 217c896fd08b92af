//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (probes the backend)
//!
//! # Catalog
//! GET  /products                - Product listing (search, filter, sort, pages)
//! GET  /products/{id}           - Product detail with reviews
//! POST /products/{id}/reviews   - Submit a review (requires auth)
//! GET  /new-arrivals            - Latest products
//! GET  /deals                   - Active deals
//! GET  /explore                 - Singapore landmarks
//! GET  /explore/{slug}          - One landmark and its souvenirs
//!
//! # Cart (HTMX fragments)
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add a product (returns count badge, triggers cart-updated)
//! POST /cart/update             - Change a line's quantity (returns cart items fragment)
//! POST /cart/remove             - Remove a line (returns cart items fragment)
//! GET  /cart/count              - Cart count badge fragment
//!
//! # Checkout
//! GET  /checkout                - Address, payment method and totals
//! POST /checkout                - Start a hosted payment session or place the order
//! POST /checkout/coupon         - Re-price with a coupon (totals fragment, rate limited)
//! GET  /order-success           - Confirmation after payment or placement
//!
//! # Auth (rate limited)
//! GET  /login                   - Login page
//! POST /login                   - Request a one-time code
//! POST /login/verify            - Verify the code, establish the session
//! GET  /register                - Registration page
//! POST /register                - Create the account, request its code
//! POST /register/verify         - Verify the code, sign the account in
//! POST /logout                  - Sign out
//!
//! # Account (requires auth)
//! GET  /account                 - Redirects to the order history
//! GET  /account/orders          - Order history
//!
//! # Wishlist (requires auth, HTMX fragments)
//! GET  /wishlist                - Saved products
//! POST /wishlist/add            - Save a product (button fragment)
//! POST /wishlist/remove         - Drop a product (grid fragment)
//!
//! # Assistant
//! POST /chat/message            - Relay a message to the shopping assistant (rate limited)
//!
//! # Currency
//! POST /currency                - Switch the display currency
//!
//! # Layout fragments
//! GET  /partials/navbar         - Session-aware navbar content
//! GET  /partials/flash          - Pending flash notice
//! GET  /partials/currency       - Currency dropdown
//!
//! # SEO
//! GET  /sitemap.xml             - XML sitemap over the public catalog
//! GET  /robots.txt              - Crawler directives
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod chat;
pub mod checkout;
pub mod currency;
pub mod deals;
pub mod explore;
pub mod home;
pub mod layout;
pub mod products;
pub mod seo;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, chat_rate_limiter};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/new-arrivals", get(products::new_arrivals))
        .route("/deals", get(deals::index))
        .route("/explore", get(explore::index))
        .route("/explore/{slug}", get(explore::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/count", get(cart::count))
        .merge(
            Router::new()
                .route("/cart/add", post(cart::add))
                .route("/cart/update", post(cart::update))
                .route("/cart/remove", post(cart::remove))
                .layer(api_rate_limiter()),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/order-success", get(checkout::success))
        .merge(
            // Coupon validation is a guessing surface, throttled like auth.
            Router::new()
                .route("/checkout/coupon", post(checkout::apply_coupon))
                .layer(auth_rate_limiter()),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/login/verify", post(auth::verify_login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/register/verify", post(auth::verify_registration))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(account::index))
        .route("/account/orders", get(account::orders))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(wishlist::index))
        .merge(
            Router::new()
                .route("/wishlist/add", post(wishlist::add))
                .route("/wishlist/remove", post(wishlist::remove))
                .layer(api_rate_limiter()),
        )
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/products/{id}/reviews", post(products::submit_review))
        .layer(api_rate_limiter())
}

/// Create the assistant routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/message", post(chat::message))
        .layer(chat_rate_limiter())
}

/// Create the layout fragment and currency routes router.
pub fn fragment_routes() -> Router<AppState> {
    Router::new()
        .route("/partials/navbar", get(layout::navbar))
        .route("/partials/flash", get(layout::flash))
        .route("/partials/currency", get(currency::picker))
        .route("/currency", post(currency::switch))
}

/// Create the SEO routes router.
pub fn seo_routes() -> Router<AppState> {
    Router::new()
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/robots.txt", get(seo::robots))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .merge(review_routes())
        .merge(cart_routes())
        .merge(checkout_routes())
        .merge(auth_routes())
        .merge(account_routes())
        .merge(wishlist_routes())
        .merge(chat_routes())
        .merge(fragment_routes())
        .merge(seo_routes())
}
