//! Generic CRUD pages over the entity scaffold.
//!
//! One listing/form pair serves products, categories, landmarks and
//! coupons; [`scaffold::find`] turns the URL slug into a schema and the
//! handlers work the schema. Create and update share a POST, told apart
//! by a hidden `id` field. Failed validation re-renders the page with
//! every message and the submitted values intact; a backend rejection
//! does the same with the backend's own message.
//!
//! Deleting takes two steps without any client scripting: the row's
//! Delete link reopens the page with `?confirm_delete={id}`, and only
//! the form rendered by that confirm strip posts the actual delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use merlion_core::CouponId;

use crate::api::{AdminApiClient, EntityPage};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{AdminAuthed, RequireAdminAuth};
use crate::models::{CurrentAdmin, Flash, set_flash, take_flash};
use crate::routes::orders::mutation_failure;
use crate::scaffold::{
    self, EntitySchema, FieldKind, FieldSpec, FormValues, OptionsSource, SelectOption,
    build_payload, row_id, row_to_form,
};
use crate::state::AppState;

// =============================================================================
// Query types
// =============================================================================

/// Listing page query: search plus which form state to open.
#[derive(Debug, Deserialize)]
pub struct EntityQuery {
    pub search: Option<String>,
    /// Any value opens the blank create form.
    pub new: Option<String>,
    /// Row id whose edit form to open.
    pub edit: Option<String>,
    /// Row id awaiting delete confirmation.
    pub confirm_delete: Option<String>,
}

// =============================================================================
// Views
// =============================================================================

/// One row of the entity table, with its action URLs precomputed.
#[derive(Clone)]
pub struct RowView {
    pub id: String,
    pub cells: Vec<String>,
    pub edit_url: String,
    pub confirm_url: String,
    pub delete_action: String,
    pub toggle_action: String,
}

/// An option in a rendered select field.
#[derive(Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A form field ready to render.
pub struct FieldView {
    pub name: String,
    pub label: String,
    /// Template branch: "text", "textarea", "decimal", "integer",
    /// "checkbox", "select", "image_list" or "tags".
    pub kind: &'static str,
    pub required: bool,
    pub value: String,
    pub checked: bool,
    pub options: Vec<OptionView>,
    pub placeholder: String,
}

/// The open create or edit form.
pub struct FormView {
    /// Hidden id for updates; empty for create.
    pub id: String,
    pub heading: String,
    pub fields: Vec<FieldView>,
    pub errors: Vec<String>,
}

/// Entity listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "entities/index.html")]
pub struct EntityListTemplate {
    pub admin: CurrentAdmin,
    pub active: &'static str,
    pub flash: Option<Flash>,
    pub title: &'static str,
    pub singular: &'static str,
    pub slug: &'static str,
    pub searchable: bool,
    pub toggleable: bool,
    /// Applied search term, kept in the search box.
    pub search: String,
    pub new_url: String,
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    pub total: i64,
    /// Row id awaiting delete confirmation, empty otherwise.
    pub confirm_delete: String,
    pub form: Option<FormView>,
}

// =============================================================================
// View builders
// =============================================================================

/// Listing URL carrying the current search and at most one state parameter.
fn list_url(slug: &str, search: &str, param: Option<(&str, &str)>) -> String {
    let mut url = format!("/entities/{slug}");
    let mut separator = '?';
    if !search.is_empty() {
        url.push(separator);
        url.push_str("search=");
        url.push_str(&urlencoding::encode(search));
        separator = '&';
    }
    if let Some((key, value)) = param {
        url.push(separator);
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

fn rows(schema: &EntitySchema, items: &[Value], search: &str) -> Vec<RowView> {
    items
        .iter()
        .map(|item| {
            let id = row_id(item).unwrap_or_default().to_owned();
            RowView {
                cells: schema.columns.iter().map(|c| c.render(item)).collect(),
                edit_url: list_url(schema.slug, search, Some(("edit", &id))),
                confirm_url: list_url(schema.slug, search, Some(("confirm_delete", &id))),
                delete_action: format!("/entities/{}/{}/delete", schema.slug, id),
                toggle_action: format!("/entities/{}/{}/toggle", schema.slug, id),
                id,
            }
        })
        .collect()
}

fn field_view(field: &FieldSpec, values: &FormValues, options: Vec<SelectOption>) -> FieldView {
    let value = values.get(&field.name).cloned().unwrap_or_default();
    let checked = field.kind == FieldKind::Checkbox && values.contains_key(&field.name);
    let options = options
        .into_iter()
        .map(|option| {
            let selected = option.value == value;
            OptionView {
                value: option.value,
                label: option.label,
                selected,
            }
        })
        .collect();

    FieldView {
        name: field.name.clone(),
        label: field.label.clone(),
        kind: field.kind.as_str(),
        required: field.required,
        value,
        checked,
        options,
        placeholder: field.placeholder.clone().unwrap_or_default(),
    }
}

/// Resolve a select field's options, fetching dynamic sources fresh.
async fn resolve_options(
    api: &AdminApiClient,
    token: &str,
    field: &FieldSpec,
) -> Result<Vec<SelectOption>> {
    let Some(source) = field.options_source else {
        return Ok(field.options.clone());
    };

    let source_schema = match source {
        OptionsSource::Categories => scaffold::categories_schema(),
        OptionsSource::Landmarks => scaffold::landmarks_schema(),
    };
    let page = api
        .list_entities(token, source_schema.list_path, source_schema.response_key)
        .await?;

    Ok(page
        .items
        .iter()
        .filter_map(|row| {
            let id = row_id(row)?;
            let name = row.get("name").and_then(Value::as_str).unwrap_or(id);
            Some(SelectOption::new(id, name))
        })
        .collect())
}

async fn form_view(
    api: &AdminApiClient,
    token: &str,
    schema: &EntitySchema,
    id: &str,
    values: &FormValues,
    errors: Vec<String>,
) -> Result<FormView> {
    let mut fields = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let options = resolve_options(api, token, field).await?;
        fields.push(field_view(field, values, options));
    }

    let heading = if id.is_empty() {
        format!("New {}", schema.singular)
    } else {
        format!("Edit {}", schema.singular)
    };

    Ok(FormView {
        id: id.to_owned(),
        heading,
        fields,
        errors,
    })
}

fn render_list(
    admin: CurrentAdmin,
    flash: Option<Flash>,
    schema: &EntitySchema,
    search: &str,
    page: &EntityPage,
    confirm_delete: String,
    form: Option<FormView>,
) -> EntityListTemplate {
    EntityListTemplate {
        admin,
        active: schema.slug,
        flash,
        title: schema.title,
        singular: schema.singular,
        slug: schema.slug,
        searchable: schema.searchable,
        toggleable: schema.toggleable,
        search: search.to_owned(),
        new_url: list_url(schema.slug, search, Some(("new", "1"))),
        headers: schema.columns.iter().map(|c| c.label.clone()).collect(),
        rows: rows(schema, &page.items, search),
        total: page
            .total
            .or_else(|| i64::try_from(page.items.len()).ok())
            .unwrap_or_default(),
        confirm_delete,
        form,
    }
}

// =============================================================================
// Handler helpers
// =============================================================================

fn find_schema(slug: &str) -> Result<EntitySchema> {
    scaffold::find(slug).ok_or_else(|| AppError::NotFound(format!("No such entity: {slug}")))
}

/// The search term actually applied, for schemas that support one.
fn applied_search<'a>(schema: &EntitySchema, raw: Option<&'a str>) -> Option<&'a str> {
    if !schema.searchable {
        return None;
    }
    raw.map(str::trim).filter(|s| !s.is_empty())
}

async fn fetch_page(
    api: &AdminApiClient,
    token: &str,
    schema: &EntitySchema,
    search: Option<&str>,
) -> Result<EntityPage> {
    let path = search.map_or_else(
        || schema.list_path.to_owned(),
        |term| format!("{}?search={}", schema.list_path, urlencoding::encode(term)),
    );
    Ok(api.list_entities(token, &path, schema.response_key).await?)
}

/// Re-render the listing with the form open, carrying the submitted values.
async fn reopen_form(
    state: &AppState,
    auth: AdminAuthed,
    session: &Session,
    schema: &EntitySchema,
    id: &str,
    values: &FormValues,
    errors: Vec<String>,
) -> Result<Response> {
    let page = fetch_page(state.api(), &auth.token, schema, None).await?;
    let form = form_view(state.api(), &auth.token, schema, id, values, errors).await?;

    Ok(render_list(
        auth.admin,
        take_flash(session).await,
        schema,
        "",
        &page,
        String::new(),
        Some(form),
    )
    .into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /entities/{slug} - listing plus whichever form state the query opens.
#[instrument(skip(state, auth, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Path(slug): Path<String>,
    Query(query): Query<EntityQuery>,
) -> Result<Response> {
    let schema = find_schema(&slug)?;
    let search = applied_search(&schema, query.search.as_deref());
    let page = fetch_page(state.api(), &auth.token, &schema, search).await?;

    let form = if query.new.is_some() {
        Some(form_view(state.api(), &auth.token, &schema, "", &FormValues::new(), vec![]).await?)
    } else if let Some(edit_id) = query.edit.as_deref() {
        // The edit form is sourced from the listing itself; the backend
        // has no single-row GET for these entities.
        let row = page
            .items
            .iter()
            .find(|item| row_id(item) == Some(edit_id))
            .ok_or_else(|| {
                AppError::NotFound(format!("No {} with id {edit_id}", schema.singular))
            })?;
        let values = row_to_form(&schema, row);
        Some(form_view(state.api(), &auth.token, &schema, edit_id, &values, vec![]).await?)
    } else {
        None
    };

    let flash = take_flash(&session).await;
    Ok(render_list(
        auth.admin,
        flash,
        &schema,
        search.unwrap_or_default(),
        &page,
        query.confirm_delete.unwrap_or_default(),
        form,
    )
    .into_response())
}

/// POST /entities/{slug} - create, or update when the form carries an id.
#[instrument(skip(state, auth, session, form))]
pub async fn save(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Path(slug): Path<String>,
    Form(form): Form<FormValues>,
) -> Result<Response> {
    let schema = find_schema(&slug)?;
    let id = form.get("id").cloned().unwrap_or_default();

    let payload = match build_payload(&schema, &form) {
        Ok(payload) => payload,
        Err(errors) => return reopen_form(&state, auth, &session, &schema, &id, &form, errors).await,
    };

    let outcome = if id.is_empty() {
        state
            .api()
            .create_entity(&auth.token, schema.endpoint, &payload)
            .await
    } else {
        state
            .api()
            .update_entity(&auth.token, schema.endpoint, &id, &payload)
            .await
    };

    match outcome {
        Ok(_) => {
            let verb = if id.is_empty() { "created" } else { "updated" };
            tracing::info!(entity = schema.slug, id = %id, "Entity {}", verb);
            set_flash(
                &session,
                Flash::success(format!("The {} was {verb}.", schema.singular)),
            )
            .await;
            Ok(Redirect::to(&format!("/entities/{slug}")).into_response())
        }
        Err(e) => {
            tracing::warn!(entity = schema.slug, "Save failed: {}", e);
            reopen_form(
                &state,
                auth,
                &session,
                &schema,
                &id,
                &form,
                vec![mutation_failure(&e)],
            )
            .await
        }
    }
}

/// POST /entities/{slug}/{id}/delete - delete after the confirm step.
#[instrument(skip(state, auth, session))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Response> {
    let schema = find_schema(&slug)?;

    match state
        .api()
        .delete_entity(&auth.token, schema.endpoint, &id)
        .await
    {
        Ok(_) => {
            tracing::info!(entity = schema.slug, id = %id, "Entity deleted");
            set_flash(
                &session,
                Flash::success(format!("The {} was deleted.", schema.singular)),
            )
            .await;
        }
        Err(e) => {
            // Rejections like "Cannot delete category with N products"
            // come back as the flash; the row stays put.
            tracing::warn!(entity = schema.slug, id = %id, "Delete failed: {}", e);
            set_flash(&session, Flash::error(mutation_failure(&e))).await;
        }
    }

    Ok(Redirect::to(&format!("/entities/{slug}")).into_response())
}

/// POST /entities/{slug}/{id}/toggle - flip a coupon active or inactive.
///
/// Coupons are the only toggleable entity; the backend has no generic
/// toggle surface.
#[instrument(skip(state, auth, session))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAdminAuth(auth): RequireAdminAuth,
    session: Session,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Response> {
    let schema = find_schema(&slug)?;
    if !schema.toggleable {
        return Err(AppError::BadRequest(format!(
            "{} cannot be toggled",
            schema.title
        )));
    }

    let coupon_id = CouponId::new(id);
    match state.api().toggle_coupon(&auth.token, &coupon_id).await {
        Ok(response) => {
            tracing::info!(coupon_id = %coupon_id, active = response.active, "Coupon toggled");
            set_flash(&session, Flash::success(response.message)).await;
        }
        Err(e) => {
            tracing::warn!(coupon_id = %coupon_id, "Toggle failed: {}", e);
            set_flash(&session, Flash::error(mutation_failure(&e))).await;
        }
    }

    Ok(Redirect::to(&format!("/entities/{slug}")).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_url_encodes_search() {
        assert_eq!(list_url("products", "", None), "/entities/products");
        assert_eq!(
            list_url("products", "", Some(("new", "1"))),
            "/entities/products?new=1"
        );
        assert_eq!(
            list_url("products", "batik & kaya", Some(("edit", "p-1"))),
            "/entities/products?search=batik%20%26%20kaya&edit=p-1"
        );
    }

    #[test]
    fn test_rows_carry_action_urls() {
        let schema = scaffold::coupons_schema();
        let items = vec![serde_json::json!({
            "id": "c-1",
            "code": "MERLION10",
            "discount_type": "percentage",
            "discount_value": 10,
            "active": true
        })];

        let rows = rows(&schema, &items, "");
        assert_eq!(rows[0].id, "c-1");
        assert_eq!(rows[0].cells[0], "MERLION10");
        assert_eq!(rows[0].edit_url, "/entities/coupons?edit=c-1");
        assert_eq!(rows[0].delete_action, "/entities/coupons/c-1/delete");
        assert_eq!(rows[0].toggle_action, "/entities/coupons/c-1/toggle");
    }

    #[test]
    fn test_field_view_preselects_stored_option() {
        let field = FieldSpec::select(
            "discount_type",
            "Discount type",
            vec![
                SelectOption::new("percentage", "Percentage off"),
                SelectOption::new("fixed", "Fixed amount off"),
            ],
        );
        let mut values = FormValues::new();
        values.insert("discount_type".to_owned(), "fixed".to_owned());

        let view = field_view(&field, &values, field.options.clone());
        assert!(view.options.iter().any(|o| o.value == "fixed" && o.selected));
        assert!(view.options.iter().all(|o| o.value == "fixed" || !o.selected));
    }

    #[test]
    fn test_field_view_checkbox_checked_by_presence() {
        let field = FieldSpec::checkbox("active", "Active");
        let mut values = FormValues::new();
        values.insert("active".to_owned(), "on".to_owned());

        assert!(field_view(&field, &values, vec![]).checked);
        assert!(!field_view(&field, &FormValues::new(), vec![]).checked);
    }

    #[test]
    fn test_search_applies_only_to_searchable_schemas() {
        let products = scaffold::products_schema();
        let coupons = scaffold::coupons_schema();

        assert_eq!(applied_search(&products, Some(" batik ")), Some("batik"));
        assert_eq!(applied_search(&products, Some("   ")), None);
        assert_eq!(applied_search(&coupons, Some("batik")), None);
    }

    #[test]
    fn test_find_schema_rejects_unknown_slugs() {
        assert!(find_schema("products").is_ok());
        assert!(find_schema("widgets").is_err());
    }
}
