//! Entity scaffold: declarative schemas driving the generic CRUD pages.
//!
//! One set of handlers and templates serves every catalog entity the
//! console manages. Each entity contributes an [`EntitySchema`] describing
//! its backend endpoints, list columns, and form fields; the scaffold does
//! the rest. Rows stay as raw `serde_json::Value` objects end to end, so a
//! backend field the console doesn't know about survives an edit untouched.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value};

// =============================================================================
// Field specs
// =============================================================================

/// How a form field is rendered and marshalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Multi-line text area.
    Textarea,
    /// Decimal amount (sent as a JSON float).
    Decimal,
    /// Whole number.
    Integer,
    /// Boolean checkbox.
    Checkbox,
    /// Single-select dropdown.
    Select,
    /// One image URL per line, sent as a JSON array.
    ImageList,
    /// Comma-separated tags, sent as a JSON array.
    Tags,
}

impl FieldKind {
    /// Template branch name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::ImageList => "image_list",
            Self::Tags => "tags",
        }
    }
}

/// An option in a select field.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    /// Create a new select option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Where a select field's options come from at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsSource {
    /// The category list, fetched fresh per render.
    Categories,
    /// The landmark list, fetched fresh per render.
    Landmarks,
}

/// One form field of an entity.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// JSON key on the backend document.
    pub name: String,
    /// Label shown next to the input.
    pub label: String,
    /// Rendering and marshalling behavior.
    pub kind: FieldKind,
    /// Whether submitting an empty value is a validation error.
    pub required: bool,
    /// Static options (select fields only).
    pub options: Vec<SelectOption>,
    /// Dynamic options resolved per render (select fields only).
    pub options_source: Option<OptionsSource>,
    /// Placeholder text.
    pub placeholder: Option<String>,
}

impl FieldSpec {
    fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            options: vec![],
            options_source: None,
            placeholder: None,
        }
    }

    /// A single-line text field.
    #[must_use]
    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    /// A multi-line text field.
    #[must_use]
    pub fn textarea(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Textarea)
    }

    /// A decimal amount field.
    #[must_use]
    pub fn decimal(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Decimal)
    }

    /// A whole-number field.
    #[must_use]
    pub fn integer(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Integer)
    }

    /// A checkbox field.
    #[must_use]
    pub fn checkbox(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Checkbox)
    }

    /// A select field with a fixed option set.
    #[must_use]
    pub fn select(name: &str, label: &str, options: Vec<SelectOption>) -> Self {
        let mut field = Self::new(name, label, FieldKind::Select);
        field.options = options;
        field
    }

    /// A select field whose options are fetched per render.
    #[must_use]
    pub fn select_from(name: &str, label: &str, source: OptionsSource) -> Self {
        let mut field = Self::new(name, label, FieldKind::Select);
        field.options_source = Some(source);
        field
    }

    /// An image-URL list field (one per line).
    #[must_use]
    pub fn image_list(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::ImageList)
    }

    /// A comma-separated tag field.
    #[must_use]
    pub fn tags(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Tags)
    }

    /// Mark this field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the placeholder text.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }
}

// =============================================================================
// List columns
// =============================================================================

/// How a list cell is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Raw string (numbers and booleans stringified).
    Text,
    /// SGD amount: `S$12.50`.
    Money,
    /// Whole number.
    Number,
    /// Boolean shown as `Yes` / `-`.
    Flag,
}

/// One column of an entity's list table.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// JSON key on the backend document.
    pub key: String,
    /// Column header label.
    pub label: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    fn new(key: &str, label: &str, kind: ColumnKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
        }
    }

    /// A text column.
    #[must_use]
    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, ColumnKind::Text)
    }

    /// An SGD amount column.
    #[must_use]
    pub fn money(key: &str, label: &str) -> Self {
        Self::new(key, label, ColumnKind::Money)
    }

    /// A numeric column.
    #[must_use]
    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, ColumnKind::Number)
    }

    /// A yes/no column.
    #[must_use]
    pub fn flag(key: &str, label: &str) -> Self {
        Self::new(key, label, ColumnKind::Flag)
    }

    /// Format this column's cell for a row.
    #[must_use]
    pub fn render(&self, row: &Value) -> String {
        let value = row.get(&self.key).unwrap_or(&Value::Null);
        match self.kind {
            ColumnKind::Text => match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => String::new(),
            },
            ColumnKind::Money => value
                .as_f64()
                .map_or_else(|| "-".to_string(), |v| format!("S${v:.2}")),
            ColumnKind::Number => match value {
                Value::Number(n) => n.to_string(),
                _ => "-".to_string(),
            },
            ColumnKind::Flag => {
                if value.as_bool() == Some(true) {
                    "Yes".to_string()
                } else {
                    "-".to_string()
                }
            }
        }
    }
}

// =============================================================================
// Entity schema
// =============================================================================

/// Everything the scaffold needs to manage one entity.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    /// URL segment under `/entities/`.
    pub slug: &'static str,
    /// Page heading.
    pub title: &'static str,
    /// Lowercase singular, for form headings and flashes.
    pub singular: &'static str,
    /// Backend path for create/update/delete (under `/api`).
    pub endpoint: &'static str,
    /// Backend path for listing. Usually the same as `endpoint`; landmarks
    /// list through the public catalog endpoint instead.
    pub list_path: &'static str,
    /// Envelope key holding the row array, or `None` for a bare array.
    pub response_key: Option<&'static str>,
    /// Whether the backend list takes a `search` parameter.
    pub searchable: bool,
    /// Whether rows offer the coupon-style active toggle.
    pub toggleable: bool,
    pub columns: Vec<ColumnSpec>,
    pub fields: Vec<FieldSpec>,
}

impl EntitySchema {
    fn new(slug: &'static str, title: &'static str, singular: &'static str, endpoint: &'static str) -> Self {
        Self {
            slug,
            title,
            singular,
            endpoint,
            list_path: endpoint,
            response_key: None,
            searchable: false,
            toggleable: false,
            columns: vec![],
            fields: vec![],
        }
    }

    /// Set the envelope key the list response wraps its rows in.
    #[must_use]
    const fn response_key(mut self, key: &'static str) -> Self {
        self.response_key = Some(key);
        self
    }

    /// List through a different (public) endpoint returning a bare array.
    #[must_use]
    const fn public_list(mut self, path: &'static str) -> Self {
        self.list_path = path;
        self
    }

    /// Enable the search box on the list page.
    #[must_use]
    const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Enable the per-row active toggle.
    #[must_use]
    const fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self
    }

    /// Add a list column.
    #[must_use]
    fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a form field.
    #[must_use]
    fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

/// The backend id of a row, when it has one.
#[must_use]
pub fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

// =============================================================================
// Registry
// =============================================================================

/// Look up a schema by its URL slug.
#[must_use]
pub fn find(slug: &str) -> Option<EntitySchema> {
    match slug {
        "products" => Some(products_schema()),
        "categories" => Some(categories_schema()),
        "landmarks" => Some(landmarks_schema()),
        "coupons" => Some(coupons_schema()),
        _ => None,
    }
}

/// All managed entities, in sidebar order.
#[must_use]
pub fn all() -> Vec<EntitySchema> {
    vec![
        products_schema(),
        categories_schema(),
        landmarks_schema(),
        coupons_schema(),
    ]
}

/// Build the products schema.
#[must_use]
pub fn products_schema() -> EntitySchema {
    EntitySchema::new("products", "Products", "product", "/admin/products")
        .response_key("products")
        .searchable()
        .column(ColumnSpec::text("name", "Name"))
        .column(ColumnSpec::text("sku", "SKU"))
        .column(ColumnSpec::money("price", "Price"))
        .column(ColumnSpec::money("sale_price", "Sale price"))
        .column(ColumnSpec::number("stock", "Stock"))
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::textarea("description", "Description"))
        .field(FieldSpec::decimal("price", "Price (SGD)").required())
        .field(FieldSpec::decimal("sale_price", "Sale price (SGD)"))
        .field(
            FieldSpec::select_from("category_id", "Category", OptionsSource::Categories)
                .required(),
        )
        .field(FieldSpec::integer("stock", "Stock").required())
        .field(FieldSpec::text("sku", "SKU"))
        .field(FieldSpec::image_list("images", "Image URLs").placeholder("One URL per line"))
        .field(FieldSpec::tags("tags", "Tags").placeholder("heritage, peranakan"))
        .field(FieldSpec::text("location", "Location"))
        .field(FieldSpec::checkbox("is_batik_label", "Batik label"))
        .field(FieldSpec::checkbox("is_on_deal", "On deal"))
        .field(FieldSpec::decimal("deal_percentage", "Deal percentage"))
}

/// Build the categories schema.
#[must_use]
pub fn categories_schema() -> EntitySchema {
    EntitySchema::new("categories", "Categories", "category", "/admin/categories")
        .response_key("categories")
        .column(ColumnSpec::text("name", "Name"))
        .column(ColumnSpec::number("order", "Order"))
        .column(ColumnSpec::number("product_count", "Products"))
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::textarea("description", "Description"))
        .field(FieldSpec::text("image_url", "Image URL"))
        .field(FieldSpec::integer("order", "Sort order"))
}

/// Build the landmarks schema.
///
/// Listing goes through the public catalog endpoint; only mutations have
/// an admin surface.
#[must_use]
pub fn landmarks_schema() -> EntitySchema {
    EntitySchema::new("landmarks", "Landmarks", "landmark", "/admin/landmarks")
        .public_list("/landmarks")
        .column(ColumnSpec::text("name", "Name"))
        .column(ColumnSpec::text("description", "Description"))
        .field(FieldSpec::text("name", "Name").required())
        .field(FieldSpec::textarea("description", "Description"))
        .field(FieldSpec::text("image", "Image URL"))
}

/// Build the coupons schema.
#[must_use]
pub fn coupons_schema() -> EntitySchema {
    EntitySchema::new("coupons", "Coupons", "coupon", "/admin/coupons")
        .response_key("coupons")
        .toggleable()
        .column(ColumnSpec::text("code", "Code"))
        .column(ColumnSpec::text("discount_type", "Type"))
        .column(ColumnSpec::number("discount_value", "Value"))
        .column(ColumnSpec::money("min_purchase", "Min purchase"))
        .column(ColumnSpec::flag("active", "Active"))
        .column(ColumnSpec::text("expires_at", "Expires"))
        .field(FieldSpec::text("code", "Code").required().placeholder("MERLION10"))
        .field(FieldSpec::select(
            "discount_type",
            "Discount type",
            vec![
                SelectOption::new("percentage", "Percentage off"),
                SelectOption::new("fixed", "Fixed amount off"),
            ],
        ))
        .field(FieldSpec::decimal("discount_value", "Discount value").required())
        .field(FieldSpec::decimal("min_purchase", "Minimum purchase (SGD)"))
        .field(FieldSpec::textarea("description", "Description"))
        .field(
            FieldSpec::text("expires_at", "Expires at")
                .placeholder("2026-12-31T23:59:59+08:00"),
        )
        .field(FieldSpec::checkbox("active", "Active"))
}

// =============================================================================
// Form marshalling
// =============================================================================

/// Submitted form values, keyed by field name.
///
/// Unchecked checkboxes are simply absent, which is how HTML forms post.
pub type FormValues = HashMap<String, String>;

/// Convert submitted form values into the backend's JSON document.
///
/// Validation failures come back as operator-facing messages, and nothing
/// is sent to the backend while any remain.
///
/// # Errors
///
/// Returns every validation message at once so the operator can fix the
/// form in one pass.
pub fn build_payload(schema: &EntitySchema, form: &FormValues) -> Result<Value, Vec<String>> {
    let mut payload = Map::new();
    let mut errors = Vec::new();

    for field in &schema.fields {
        let raw = form
            .get(&field.name)
            .map(|s| s.trim())
            .unwrap_or_default();

        match field.kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::Select => {
                if raw.is_empty() && field.required {
                    errors.push(format!("{} is required", field.label));
                } else {
                    payload.insert(field.name.clone(), Value::String(raw.to_string()));
                }
            }
            FieldKind::Decimal => match parse_decimal(raw, field) {
                Ok(Some(number)) => {
                    payload.insert(field.name.clone(), Value::Number(number));
                }
                Ok(None) => {
                    // Empty optional amount clears the stored value
                    payload.insert(field.name.clone(), Value::Null);
                }
                Err(message) => errors.push(message),
            },
            FieldKind::Integer => {
                if raw.is_empty() {
                    if field.required {
                        errors.push(format!("{} is required", field.label));
                    } else {
                        payload.insert(field.name.clone(), Value::Null);
                    }
                } else if let Ok(n) = raw.parse::<i64>() {
                    payload.insert(field.name.clone(), Value::from(n));
                } else {
                    errors.push(format!("{} must be a whole number", field.label));
                }
            }
            FieldKind::Checkbox => {
                payload.insert(field.name.clone(), Value::Bool(form.contains_key(&field.name)));
            }
            FieldKind::ImageList => {
                let urls: Vec<Value> = raw
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| Value::String(line.to_string()))
                    .collect();
                payload.insert(field.name.clone(), Value::Array(urls));
            }
            FieldKind::Tags => {
                let tags: Vec<Value> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(|tag| Value::String(tag.to_string()))
                    .collect();
                payload.insert(field.name.clone(), Value::Array(tags));
            }
        }
    }

    if errors.is_empty() {
        Ok(Value::Object(payload))
    } else {
        Err(errors)
    }
}

fn parse_decimal(raw: &str, field: &FieldSpec) -> Result<Option<serde_json::Number>, String> {
    if raw.is_empty() {
        if field.required {
            return Err(format!("{} is required", field.label));
        }
        return Ok(None);
    }

    let amount: Decimal = raw
        .parse()
        .map_err(|_| format!("{} must be a number", field.label))?;

    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Some)
        .ok_or_else(|| format!("{} is out of range", field.label))
}

/// Turn a stored row back into form values for the edit form.
#[must_use]
pub fn row_to_form(schema: &EntitySchema, row: &Value) -> FormValues {
    let mut form = FormValues::new();

    for field in &schema.fields {
        let value = row.get(&field.name).unwrap_or(&Value::Null);
        let text = match field.kind {
            FieldKind::Text | FieldKind::Textarea | FieldKind::Select => match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => String::new(),
            },
            FieldKind::Decimal | FieldKind::Integer => match value {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                _ => String::new(),
            },
            FieldKind::Checkbox => {
                if value.as_bool() == Some(true) {
                    "on".to_string()
                } else {
                    String::new()
                }
            }
            FieldKind::ImageList => join_string_array(value, "\n"),
            FieldKind::Tags => join_string_array(value, ", "),
        };
        // Checkboxes signal by presence, like a real form post
        if field.kind != FieldKind::Checkbox || !text.is_empty() {
            form.insert(field.name.clone(), text);
        }
    }

    form
}

fn join_string_array(value: &Value, separator: &str) -> String {
    value.as_array().map_or_else(String::new, |items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_registry_knows_every_slug() {
        for schema in all() {
            assert!(find(schema.slug).is_some());
        }
        assert!(find("widgets").is_none());
    }

    #[test]
    fn test_landmarks_list_through_public_endpoint() {
        let schema = landmarks_schema();
        assert_eq!(schema.list_path, "/landmarks");
        assert_eq!(schema.endpoint, "/admin/landmarks");
        assert!(schema.response_key.is_none());
    }

    #[test]
    fn test_build_payload_products() {
        let schema = products_schema();
        let values = form(&[
            ("name", "Merlion keychain"),
            ("description", "A little lion of the sea"),
            ("price", "12.90"),
            ("sale_price", ""),
            ("category_id", "cat-1"),
            ("stock", "25"),
            ("sku", "MG-001"),
            ("images", "https://img.test/a.jpg\n\nhttps://img.test/b.jpg"),
            ("tags", "heritage, keychain,,"),
            ("location", ""),
            ("is_on_deal", "on"),
            ("deal_percentage", "10"),
        ]);

        let payload = build_payload(&schema, &values).unwrap();
        assert_eq!(payload["name"], "Merlion keychain");
        assert!((payload["price"].as_f64().unwrap() - 12.9).abs() < 1e-9);
        assert_eq!(payload["sale_price"], Value::Null);
        assert_eq!(payload["stock"], 25);
        assert_eq!(
            payload["images"],
            serde_json::json!(["https://img.test/a.jpg", "https://img.test/b.jpg"])
        );
        assert_eq!(payload["tags"], serde_json::json!(["heritage", "keychain"]));
        assert_eq!(payload["is_on_deal"], true);
        // Unchecked checkbox posts nothing and marshals to false
        assert_eq!(payload["is_batik_label"], false);
    }

    #[test]
    fn test_build_payload_collects_every_error() {
        let schema = products_schema();
        let values = form(&[("price", "twelve"), ("stock", "many")]);

        let errors = build_payload(&schema, &values).unwrap_err();
        assert!(errors.contains(&"Name is required".to_string()));
        assert!(errors.contains(&"Price (SGD) must be a number".to_string()));
        assert!(errors.contains(&"Stock must be a whole number".to_string()));
        assert!(errors.contains(&"Category is required".to_string()));
    }

    #[test]
    fn test_row_to_form_round_trips_arrays() {
        let schema = products_schema();
        let row = serde_json::json!({
            "id": "p-1",
            "name": "Batik scarf",
            "price": 45.0,
            "sale_price": null,
            "category_id": "cat-2",
            "stock": 8,
            "images": ["https://img.test/scarf.jpg"],
            "tags": ["batik", "textile"],
            "is_batik_label": true
        });

        let values = row_to_form(&schema, &row);
        assert_eq!(values["name"], "Batik scarf");
        assert_eq!(values["images"], "https://img.test/scarf.jpg");
        assert_eq!(values["tags"], "batik, textile");
        assert_eq!(values["is_batik_label"], "on");
        assert_eq!(values.get("sale_price").map(String::as_str), Some(""));
        assert!(!values.contains_key("is_on_deal"));
    }

    #[test]
    fn test_column_render() {
        let row = serde_json::json!({
            "name": "Kaya jam",
            "price": 8.5,
            "stock": 40,
            "active": true,
            "min_purchase": null
        });

        assert_eq!(ColumnSpec::text("name", "Name").render(&row), "Kaya jam");
        assert_eq!(ColumnSpec::money("price", "Price").render(&row), "S$8.50");
        assert_eq!(ColumnSpec::number("stock", "Stock").render(&row), "40");
        assert_eq!(ColumnSpec::flag("active", "Active").render(&row), "Yes");
        assert_eq!(ColumnSpec::money("min_purchase", "Min").render(&row), "-");
        assert_eq!(ColumnSpec::text("missing", "Missing").render(&row), "");
    }

    #[test]
    fn test_row_id() {
        assert_eq!(row_id(&serde_json::json!({"id": "c-9"})), Some("c-9"));
        assert_eq!(row_id(&serde_json::json!({"name": "x"})), None);
    }
}
