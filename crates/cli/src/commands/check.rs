//! Backend reachability and catalog sanity checks.
//!
//! Fetches the public catalog endpoints the storefront renders from and
//! reports row counts and latency. Exits non-zero when any probe fails,
//! so it slots into deploy pipelines and cron-driven monitoring.
//!
//! # Usage
//!
//! ```bash
//! mg-cli check
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Base URL of the commerce backend
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)

use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while probing the backend.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Environment variable holds an unusable value.
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// One or more probes failed.
    #[error("{failed} of {total} probes failed")]
    ProbesFailed { failed: usize, total: usize },
}

/// The public list endpoints every storefront page depends on.
const PROBES: &[(&str, &str)] = &[
    ("categories", "/categories"),
    ("products", "/products"),
    ("landmarks", "/landmarks"),
];

/// Probe the backend's public catalog surface.
///
/// # Errors
///
/// Returns an error when configuration is missing or any probe fails.
pub async fn run() -> Result<(), CheckError> {
    dotenvy::dotenv().ok();

    let api_url = std::env::var("BACKEND_API_URL")
        .map_err(|_| CheckError::MissingEnvVar("BACKEND_API_URL"))?;
    let api_url = api_url.trim_end_matches('/').to_owned();
    let timeout_secs = std::env::var("BACKEND_TIMEOUT_SECS")
        .unwrap_or_else(|_| "10".to_owned())
        .parse::<u64>()
        .map_err(|e| CheckError::InvalidEnvVar("BACKEND_TIMEOUT_SECS", e.to_string()))?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    tracing::info!("Checking backend at {api_url}");

    let mut failed = 0;
    for (label, path) in PROBES {
        match probe(&http, &api_url, path).await {
            Ok((0, elapsed)) => {
                let ms = elapsed.as_millis();
                tracing::warn!("  {label}: reachable but empty ({ms}ms)");
            }
            Ok((count, elapsed)) => {
                let ms = elapsed.as_millis();
                tracing::info!("  {label}: ok ({count} rows, {ms}ms)");
            }
            Err(e) => {
                failed += 1;
                tracing::error!("  {label}: failed ({e})");
            }
        }
    }

    if failed > 0 {
        return Err(CheckError::ProbesFailed {
            failed,
            total: PROBES.len(),
        });
    }

    tracing::info!("Backend looks healthy");
    Ok(())
}

/// Fetch one public list endpoint and count its rows.
async fn probe(
    http: &reqwest::Client,
    api_url: &str,
    path: &str,
) -> Result<(usize, Duration), reqwest::Error> {
    let started = Instant::now();
    let rows: Vec<Value> = http
        .get(format!("{api_url}/api{path}"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok((rows.len(), started.elapsed()))
}
