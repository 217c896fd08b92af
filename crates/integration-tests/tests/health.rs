//! Liveness and readiness probes for both web services.
//!
//! Prerequisites:
//! - Storefront running (default: <http://localhost:3000>)
//! - Admin console running (default: <http://localhost:3001>)
//! - Commerce backend running for the readiness assertions
//!
//! Run with: `cargo test -p merlion-integration-tests --test health -- --ignored`

use merlion_integration_tests::TestContext;
use reqwest::StatusCode;

// ============================================================
// Storefront
// ============================================================

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_storefront_liveness() {
    let ctx = TestContext::from_env();

    let resp = ctx
        .http
        .get(ctx.storefront("/health"))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response body");
    assert_eq!(body, "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_storefront_readiness_reports_backend_state() {
    let ctx = TestContext::from_env();

    let resp = ctx
        .http
        .get(ctx.storefront("/health/ready"))
        .send()
        .await
        .expect("Failed to reach storefront");

    // Ready when the backend answers, 503 when it does not. Anything else
    // means the probe itself is broken.
    assert!(
        resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected readiness status: {}",
        resp.status()
    );
}

// ============================================================
// Admin console
// ============================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_liveness() {
    let ctx = TestContext::from_env();

    let resp = ctx
        .http
        .get(ctx.admin("/health"))
        .send()
        .await
        .expect("Failed to reach admin console");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response body");
    assert_eq!(body, "ok");
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_readiness_reports_backend_state() {
    let ctx = TestContext::from_env();

    let resp = ctx
        .http
        .get(ctx.admin("/health/ready"))
        .send()
        .await
        .expect("Failed to reach admin console");

    assert!(
        resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected readiness status: {}",
        resp.status()
    );
}

// ============================================================
// Health endpoints skip the auth gate
// ============================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_health_needs_no_session() {
    let ctx = TestContext::from_env();

    // A redirect-refusing client with no cookies: the gate would answer 303,
    // the health probe must not.
    let client = TestContext::manual_redirect_client();
    let resp = client
        .get(ctx.admin("/health"))
        .send()
        .await
        .expect("Failed to reach admin console");

    assert_eq!(resp.status(), StatusCode::OK);
}
