//! CSV bulk import routes.
//!
//! Four data sets can be imported: general products, customer contacts,
//! Explore Singapore products, and Batik Label products. Each kind has a
//! downloadable starter CSV; uploads are forwarded to the backend as-is,
//! which validates rows and reports how many were imported.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Flash, set_flash, take_flash};
use crate::routes::orders::mutation_failure;
use crate::state::AppState;

/// One importable data set.
struct ImportKind {
    key: &'static str,
    title: &'static str,
    blurb: &'static str,
    file_name: &'static str,
    template: &'static str,
}

const PRODUCTS_TEMPLATE: &str = r#"name,description,price,sale_price,category_id,stock,images,sku
"Singapore Keychain","Beautiful keychain",12.50,9.90,cat-001,100,"https://example.com/image1.jpg,https://example.com/image2.jpg",SG-KEY-001
"Merlion Statue","Collectible statue",35.00,,cat-002,50,"https://example.com/image3.jpg",SG-STA-002
"#;

const CUSTOMERS_TEMPLATE: &str = r#"name,email,phone
"John Doe","john@example.com","+6512345678"
"Jane Smith","jane@example.com","+6587654321"
"#;

const EXPLORE_TEMPLATE: &str = r#"name,description,price,sale_price,landmark_id,stock,images,sku
"Merlion Keychain","Iconic souvenir",15.90,12.90,merlion-park,100,"https://example.com/image.jpg",ESP-001
"#;

const BATIK_TEMPLATE: &str = r#"name,description,price,sale_price,stock,images,sku
"Batik Sarong","Traditional batik",65.00,55.00,30,"https://example.com/batik.jpg",BTK-001
"#;

const IMPORT_KINDS: &[ImportKind] = &[
    ImportKind {
        key: "products",
        title: "General Products",
        blurb: "Import multiple products at once. Download the template to see the required format.",
        file_name: "products_template.csv",
        template: PRODUCTS_TEMPLATE,
    },
    ImportKind {
        key: "customers",
        title: "Customer Data",
        blurb: "Import customer emails and phone numbers. Existing emails are left untouched.",
        file_name: "customers_template.csv",
        template: CUSTOMERS_TEMPLATE,
    },
    ImportKind {
        key: "explore_singapore",
        title: "Explore Singapore Products",
        blurb: "Bulk import products for Explore Singapore landmarks. The landmark_id column must match an existing landmark.",
        file_name: "explore_singapore_template.csv",
        template: EXPLORE_TEMPLATE,
    },
    ImportKind {
        key: "batik",
        title: "Batik Label Products",
        blurb: "Bulk import products for the Batik Label collection.",
        file_name: "batik_template.csv",
        template: BATIK_TEMPLATE,
    },
];

fn find_kind(key: &str) -> Option<&'static ImportKind> {
    IMPORT_KINDS.iter().find(|kind| kind.key == key)
}

/// One import card on the page.
pub struct ImportCardView {
    pub key: &'static str,
    pub title: &'static str,
    pub blurb: &'static str,
    pub template_url: String,
}

/// Import page template.
#[derive(Template, WebTemplate)]
#[template(path = "imports/index.html")]
pub struct ImportsTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub kinds: Vec<ImportCardView>,
}

/// GET /imports - import cards for each data set.
#[instrument(skip(auth, session))]
pub async fn index(RequireAdminAuth(auth): RequireAdminAuth, session: Session) -> ImportsTemplate {
    ImportsTemplate {
        admin: auth.admin,
        active: "imports",
        flash: take_flash(&session).await,
        kinds: IMPORT_KINDS
            .iter()
            .map(|kind| ImportCardView {
                key: kind.key,
                title: kind.title,
                blurb: kind.blurb,
                template_url: format!("/imports/template/{}", kind.key),
            })
            .collect(),
    }
}

fn bad_upload(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed upload: {err}"))
}

/// POST /imports - forward an uploaded CSV to the backend.
#[instrument(skip(state, auth, session, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut import_type = String::new();
    let mut file_name = String::new();
    let mut bytes = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "import_type" => import_type = field.text().await.map_err(bad_upload)?,
            "file" => {
                file_name = field.file_name().map(ToOwned::to_owned).unwrap_or_default();
                bytes = field.bytes().await.map_err(bad_upload)?.to_vec();
            }
            _ => {}
        }
    }

    if find_kind(&import_type).is_none() {
        return Err(AppError::BadRequest(format!(
            "Unknown import type: {import_type}"
        )));
    }
    if bytes.is_empty() {
        set_flash(&session, Flash::error("Choose a CSV file to upload.")).await;
        return Ok(Redirect::to("/imports").into_response());
    }
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        set_flash(&session, Flash::error("Please upload a CSV file.")).await;
        return Ok(Redirect::to("/imports").into_response());
    }

    match state
        .api()
        .import_csv(&auth.token, &import_type, &file_name, bytes)
        .await
    {
        Ok(ack) => {
            info!(import_type = %import_type, "CSV import accepted");
            let message = if ack.message.is_empty() {
                "Import successful.".to_owned()
            } else {
                ack.message
            };
            set_flash(&session, Flash::success(message)).await;
        }
        Err(err) => {
            warn!(error = %err, import_type = %import_type, "CSV import failed");
            set_flash(&session, Flash::error(mutation_failure(&err))).await;
        }
    }

    Ok(Redirect::to("/imports").into_response())
}

/// GET /imports/template/{kind} - download a starter CSV.
#[instrument(skip(_auth))]
pub async fn template(
    _auth: RequireAdminAuth,
    Path(kind): Path<String>,
) -> Result<Response> {
    let spec = find_kind(&kind)
        .ok_or_else(|| AppError::NotFound(format!("No such import template: {kind}")))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", spec.file_name),
        ),
    ];
    Ok((headers, spec.template).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_template() {
        for kind in IMPORT_KINDS {
            assert!(!kind.template.is_empty());
            assert!(kind.file_name.ends_with(".csv"));
        }
        assert!(find_kind("products").is_some());
        assert!(find_kind("payroll").is_none());
    }

    #[test]
    fn test_template_headers_match_backend_columns() {
        let header_line = |csv: &'static str| csv.lines().next().unwrap().to_owned();

        assert_eq!(
            header_line(PRODUCTS_TEMPLATE),
            "name,description,price,sale_price,category_id,stock,images,sku"
        );
        assert_eq!(header_line(CUSTOMERS_TEMPLATE), "name,email,phone");
        assert_eq!(
            header_line(EXPLORE_TEMPLATE),
            "name,description,price,sale_price,landmark_id,stock,images,sku"
        );
        assert_eq!(
            header_line(BATIK_TEMPLATE),
            "name,description,price,sale_price,stock,images,sku"
        );
    }
}
