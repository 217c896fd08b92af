//! Guest cart lifecycle against a running storefront.
//!
//! The guest cart lives in the visitor's session, so each test reuses one
//! cookie-holding client for every step. Tests that render the cart page
//! need at least one product in the backend catalog and skip when it is
//! empty.
//!
//! Prerequisites:
//! - Storefront running (default: <http://localhost:3000>)
//! - Commerce backend running for the page-render tests
//!
//! Run with: `cargo test -p merlion-integration-tests --test storefront_cart -- --ignored`

use merlion_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::Value;

/// Pulls the first cart line id out of rendered cart markup.
fn first_line_id(body: &str) -> Option<String> {
    let marker = "name=\"line_id\" value=\"";
    let start = body.find(marker)? + marker.len();
    let rest = body.get(start..)?;
    let end = rest.find('"')?;
    Some(rest.get(..end)?.to_owned())
}

async fn cart_count(ctx: &TestContext) -> String {
    let resp = ctx
        .http
        .get(ctx.storefront("/cart/count"))
        .send()
        .await
        .expect("Failed to fetch cart count");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.text()
        .await
        .expect("Failed to read cart count")
        .trim()
        .to_owned()
}

// ============================================================
// Counting and merging
// ============================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_guest_cart_starts_empty() {
    let ctx = TestContext::from_env();
    assert_eq!(cart_count(&ctx).await, "0");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_adding_same_product_merges_into_one_line() {
    let ctx = TestContext::from_env();

    // Guest adds are not validated against the catalog, so a synthetic id
    // keeps this test independent of backend data.
    let resp = ctx
        .http
        .post(ctx.storefront("/cart/add"))
        .form(&[("product_id", "itest-plush"), ("quantity", "2")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("hx-trigger")
            .and_then(|v| v.to_str().ok()),
        Some("cart-updated")
    );
    let body = resp.text().await.expect("Failed to read response body");
    assert_eq!(body.trim(), "2");

    // Same product again merges quantities instead of opening a new line.
    let resp = ctx
        .http
        .post(ctx.storefront("/cart/add"))
        .form(&[("product_id", "itest-plush"), ("quantity", "1")])
        .send()
        .await
        .expect("Failed to add to cart");
    let body = resp.text().await.expect("Failed to read response body");
    assert_eq!(body.trim(), "3");

    // Omitted quantity defaults to one.
    let resp = ctx
        .http
        .post(ctx.storefront("/cart/add"))
        .form(&[("product_id", "itest-plush")])
        .send()
        .await
        .expect("Failed to add to cart");
    let body = resp.text().await.expect("Failed to read response body");
    assert_eq!(body.trim(), "4");

    assert_eq!(cart_count(&ctx).await, "4");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_add_rejects_zero_quantity() {
    let ctx = TestContext::from_env();

    let resp = ctx
        .http
        .post(ctx.storefront("/cart/add"))
        .form(&[("product_id", "itest-plush"), ("quantity", "0")])
        .send()
        .await
        .expect("Failed to post to cart");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("Failed to read response body");
    assert!(body.contains("Quantity must be at least 1"));
    assert_eq!(cart_count(&ctx).await, "0");
}

// ============================================================
// Cart page rendering
// ============================================================

#[tokio::test]
#[ignore = "Requires running storefront server and backend"]
async fn test_cart_page_lists_added_product() {
    let ctx = TestContext::from_env();
    let Some(product) = ctx.any_product().await else {
        // Empty catalog: nothing to render.
        return;
    };
    let product_id = product
        .get("id")
        .and_then(Value::as_str)
        .expect("catalog product has an id");
    let name = product
        .get("name")
        .and_then(Value::as_str)
        .expect("catalog product has a name");

    let resp = ctx
        .http
        .post(ctx.storefront("/cart/add"))
        .form(&[("product_id", product_id), ("quantity", "1")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .http
        .get(ctx.storefront("/cart"))
        .send()
        .await
        .expect("Failed to fetch cart page");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read cart page");

    assert!(body.contains(name), "cart page should list {name}");
    assert!(
        first_line_id(&body).is_some(),
        "cart page should carry a line id for the added product"
    );
}

// ============================================================
// Updating and removing lines
// ============================================================

#[tokio::test]
#[ignore = "Requires running storefront server and backend"]
async fn test_update_and_remove_cart_lines() {
    let ctx = TestContext::from_env();
    let Some(product) = ctx.any_product().await else {
        return;
    };
    let product_id = product
        .get("id")
        .and_then(Value::as_str)
        .expect("catalog product has an id");

    let resp = ctx
        .http
        .post(ctx.storefront("/cart/add"))
        .form(&[("product_id", product_id), ("quantity", "2")])
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(cart_count(&ctx).await, "2");

    let resp = ctx
        .http
        .get(ctx.storefront("/cart"))
        .send()
        .await
        .expect("Failed to fetch cart page");
    let body = resp.text().await.expect("Failed to read cart page");
    let line_id = first_line_id(&body).expect("cart page carries a line id");

    // Raise the quantity on the existing line.
    let resp = ctx
        .http
        .post(ctx.storefront("/cart/update"))
        .form(&[("line_id", line_id.as_str()), ("quantity", "5")])
        .send()
        .await
        .expect("Failed to update cart line");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(cart_count(&ctx).await, "5");

    // Quantity zero removes the line.
    let resp = ctx
        .http
        .post(ctx.storefront("/cart/update"))
        .form(&[("line_id", line_id.as_str()), ("quantity", "0")])
        .send()
        .await
        .expect("Failed to update cart line");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(cart_count(&ctx).await, "0");

    // Add again and remove through the remove endpoint.
    ctx.http
        .post(ctx.storefront("/cart/add"))
        .form(&[("product_id", product_id), ("quantity", "1")])
        .send()
        .await
        .expect("Failed to add to cart");
    let body = ctx
        .http
        .get(ctx.storefront("/cart"))
        .send()
        .await
        .expect("Failed to fetch cart page")
        .text()
        .await
        .expect("Failed to read cart page");
    let line_id = first_line_id(&body).expect("cart page carries a line id");

    let resp = ctx
        .http
        .post(ctx.storefront("/cart/remove"))
        .form(&[("line_id", line_id.as_str())])
        .send()
        .await
        .expect("Failed to remove cart line");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(cart_count(&ctx).await, "0");
}
