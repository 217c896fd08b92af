//! SEO route handlers: sitemap and robots directives.
//!
//! The sitemap covers the public catalog; session-bound pages (cart,
//! checkout, account) are excluded and disallowed for crawlers.

use std::fmt::Write as _;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::api::ProductQuery;
use crate::state::AppState;

/// Products listed in the sitemap; the catalog is small, this is a guard.
const SITEMAP_PRODUCT_LIMIT: u32 = 200;

// =============================================================================
// Handlers
// =============================================================================

/// GET /sitemap.xml - XML sitemap over the public catalog.
///
/// Catalog fetch failures degrade to a static-pages-only sitemap; crawlers
/// retry on their own schedule.
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> Response {
    let base = state.config().base_url.trim_end_matches('/').to_owned();

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    url_entry(&mut xml, &format!("{base}/"), "1.0", "daily");
    for page in ["/products", "/new-arrivals", "/deals", "/explore"] {
        url_entry(&mut xml, &format!("{base}{page}"), "0.8", "weekly");
    }

    let query = ProductQuery {
        limit: Some(SITEMAP_PRODUCT_LIMIT),
        ..ProductQuery::default()
    };
    let (products, categories, landmarks) = tokio::join!(
        state.api().products(&query),
        state.api().categories(),
        state.api().landmarks(),
    );

    match products {
        Ok(products) => {
            for product in &products {
                url_entry(
                    &mut xml,
                    &format!("{base}/products/{}", xml_escape(product.id.as_str())),
                    "0.7",
                    "weekly",
                );
            }
        }
        Err(e) => tracing::warn!("Sitemap product listing failed: {}", e),
    }

    match categories {
        Ok(categories) => {
            for category in &categories {
                url_entry(
                    &mut xml,
                    &format!("{base}/products?category={}", xml_escape(category.id.as_str())),
                    "0.6",
                    "weekly",
                );
            }
        }
        Err(e) => tracing::warn!("Sitemap category listing failed: {}", e),
    }

    match landmarks {
        Ok(landmarks) => {
            for landmark in &landmarks {
                url_entry(
                    &mut xml,
                    &format!("{base}/explore/{}", xml_escape(&landmark.slug)),
                    "0.7",
                    "weekly",
                );
            }
        }
        Err(e) => tracing::warn!("Sitemap landmark listing failed: {}", e),
    }

    xml.push_str("</urlset>\n");
    ([(CONTENT_TYPE, "application/xml")], xml).into_response()
}

/// GET /robots.txt - allow the catalog, keep crawlers out of session pages.
pub async fn robots(State(state): State<AppState>) -> Response {
    let base = state.config().base_url.trim_end_matches('/').to_owned();
    let body = format!(
        "User-agent: *\n\
         Allow: /\n\
         Disallow: /cart\n\
         Disallow: /checkout\n\
         Disallow: /account\n\
         Disallow: /wishlist\n\
         Disallow: /login\n\
         Disallow: /register\n\
         Disallow: /partials/\n\
         \n\
         Sitemap: {base}/sitemap.xml\n"
    );
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

fn url_entry(out: &mut String, loc: &str, priority: &str, changefreq: &str) {
    // String formatting cannot fail.
    let _ = writeln!(
        out,
        "  <url><loc>{loc}</loc><priority>{priority}</priority><changefreq>{changefreq}</changefreq></url>"
    );
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_entry_shape() {
        let mut out = String::new();
        url_entry(&mut out, "https://shop.example.com/", "1.0", "daily");
        assert_eq!(
            out,
            "  <url><loc>https://shop.example.com/</loc><priority>1.0</priority><changefreq>daily</changefreq></url>\n"
        );
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a&b<c>"), "a&amp;b&lt;c&gt;");
        assert_eq!(xml_escape("merlion-park"), "merlion-park");
    }
}
