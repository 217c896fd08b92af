//! Authentication route handlers.
//!
//! Sign-in and registration are both two-step: the backend issues a one-time
//! code on the first POST and the session token on verification. While email
//! delivery is stubbed out backend-side, the code comes back in the response
//! body and is shown on the verify page as a hint.
//!
//! Verification is also the point where a guest cart merges into the
//! account cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use merlion_core::Email;

use crate::api::{ApiError, AuthResponse};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{Authed, OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Flash, session_keys, set_flash};
use crate::services::cart::merge_guest_cart;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// One-time code verification form data.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub email: String,
    pub otp: String,
    #[serde(default)]
    pub next: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    /// Where to send the visitor after signing in.
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
    pub success: Option<String>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<&'static str>,
}

/// One-time code entry page template, shared by login and registration.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify.html")]
pub struct VerifyTemplate {
    pub email: String,
    /// Where the code form posts: `/login/verify` or `/register/verify`.
    pub action: &'static str,
    /// The code itself, when the backend echoed it in the response.
    pub otp_hint: Option<String>,
    pub next: String,
    pub error: Option<String>,
}

// =============================================================================
// Redirect helpers
// =============================================================================

/// Post-login destination, restricted to local paths.
///
/// Anything that is not a same-origin absolute path falls back to the
/// default so the login form cannot be used as an open redirect.
fn safe_next(next: Option<&str>, default: &str) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_owned(),
        _ => default.to_owned(),
    }
}

fn login_url(error: &str, next: &str) -> String {
    if next.is_empty() {
        format!("/login?error={error}")
    } else {
        format!("/login?error={error}&next={}", urlencoding::encode(next))
    }
}

fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Incorrect email or password.",
        "unavailable" => "Sign-in is temporarily unavailable. Please try again.",
        _ => "Could not sign you in.",
    }
}

fn register_error_message(code: &str) -> &'static str {
    match code {
        "password_mismatch" => "Passwords do not match.",
        "password_too_short" => "Password must be at least 8 characters.",
        "invalid_email" => "Enter a valid email address.",
        "email_taken" => "An account with this email already exists.",
        _ => "Could not create the account.",
    }
}

/// Whether a backend failure is an outage rather than a rejection.
fn is_unavailable(e: &ApiError) -> bool {
    match e {
        ApiError::Http(_) | ApiError::Parse(_) => true,
        ApiError::Status { status, .. } => status.is_server_error(),
        ApiError::NotFound(_) | ApiError::Unauthorized(_) => false,
    }
}

/// Message shown inline when a verification attempt fails.
fn verify_error_message(e: &ApiError) -> String {
    if is_unavailable(e) {
        return "Verification is temporarily unavailable. Please try again.".to_owned();
    }
    e.user_detail()
        .map_or_else(|| "Invalid or expired code.".to_owned(), ToOwned::to_owned)
}

// =============================================================================
// Login Routes
// =============================================================================

/// GET /login - display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(login_error_message),
        success: query.success,
        next: safe_next(query.next.as_deref(), ""),
    }
}

/// POST /login - request a one-time code for an existing account.
#[instrument(skip(state, form))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let next = safe_next(form.next.as_deref(), "");

    match state.api().login(form.email.trim(), &form.password).await {
        Ok(otp) => VerifyTemplate {
            email: form.email.trim().to_owned(),
            action: "/login/verify",
            otp_hint: otp.otp,
            next,
            error: None,
        }
        .into_response(),
        Err(e) if is_unavailable(&e) => {
            tracing::error!("Login request failed: {}", e);
            Redirect::to(&login_url("unavailable", &next)).into_response()
        }
        Err(e) => {
            tracing::warn!("Login rejected: {}", e);
            Redirect::to(&login_url("credentials", &next)).into_response()
        }
    }
}

/// POST /login/verify - exchange the one-time code for a session.
#[instrument(skip(state, session, form))]
pub async fn verify_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VerifyForm>,
) -> Response {
    let next = safe_next(form.next.as_deref(), "");

    match state
        .api()
        .verify_login(form.email.trim(), form.otp.trim())
        .await
    {
        Ok(auth) => establish_session(&state, &session, auth, &next).await,
        Err(e) => {
            tracing::warn!("Login verification failed: {}", e);
            VerifyTemplate {
                email: form.email.trim().to_owned(),
                action: "/login/verify",
                otp_hint: None,
                next,
                error: Some(verify_error_message(&e)),
            }
            .into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// GET /register - display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        error: query.error.as_deref().map(register_error_message),
    }
}

/// POST /register - create an account and request its first one-time code.
#[instrument(skip(state, form))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/register?error=password_mismatch").into_response();
    }
    if form.password.len() < 8 {
        return Redirect::to("/register?error=password_too_short").into_response();
    }
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/register?error=invalid_email").into_response();
    };

    match state
        .api()
        .register(form.name.trim(), email.as_str(), &form.password)
        .await
    {
        Ok(otp) => VerifyTemplate {
            email: email.into_inner(),
            action: "/register/verify",
            otp_hint: otp.otp,
            next: String::new(),
            error: None,
        }
        .into_response(),
        Err(e) => {
            tracing::warn!("Registration failed: {}", e);
            let detail = e.user_detail().unwrap_or_default();
            if detail.contains("already") || detail.contains("exists") {
                Redirect::to("/register?error=email_taken").into_response()
            } else {
                Redirect::to("/register?error=failed").into_response()
            }
        }
    }
}

/// POST /register/verify - confirm the code and sign the new account in.
#[instrument(skip(state, session, form))]
pub async fn verify_registration(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VerifyForm>,
) -> Response {
    match state
        .api()
        .verify_registration(form.email.trim(), form.otp.trim())
        .await
    {
        Ok(auth) => establish_session(&state, &session, auth, "").await,
        Err(e) => {
            tracing::warn!("Registration verification failed: {}", e);
            VerifyTemplate {
                email: form.email.trim().to_owned(),
                action: "/register/verify",
                otp_hint: None,
                next: String::new(),
                error: Some(verify_error_message(&e)),
            }
            .into_response()
        }
    }
}

// =============================================================================
// Session establishment
// =============================================================================

/// Store the authenticated user in the session, merge any guest cart into
/// the account cart and pick the landing page.
async fn establish_session(
    state: &AppState,
    session: &Session,
    auth: AuthResponse,
    next: &str,
) -> Response {
    let user = CurrentUser {
        id: auth.user.id,
        email: auth.user.email,
        name: auth.user.name,
    };

    if let Err(e) = set_current_user(session, &user, &auth.session_token).await {
        tracing::error!("Failed to store session: {}", e);
        return Redirect::to("/login?error=unavailable").into_response();
    }
    set_sentry_user(&user.id, Some(&user.email));

    let merge = merge_guest_cart(state.api(), &auth.session_token, session).await;
    if merge.failed > 0 {
        tracing::warn!(
            moved = merge.moved,
            failed = merge.failed,
            "Some guest cart items could not be moved to the account cart"
        );
    }

    set_flash(
        session,
        Flash::success(format!("Welcome, {}!", user.name)),
    )
    .await;

    // A freshly merged cart is worth showing; otherwise honor the
    // requested destination.
    let destination = if next.is_empty() {
        if merge.merged_anything() { "/cart" } else { "/" }
    } else {
        next
    };
    Redirect::to(destination).into_response()
}

// =============================================================================
// Logout Routes
// =============================================================================

/// POST /logout - invalidate the backend token and reset the session.
#[instrument(skip(state, session, auth))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> Response {
    if let Some(Authed { token, .. }) = &auth
        && let Err(e) = state.api().logout(token).await
    {
        // Local sign-out proceeds regardless; the token expires server-side.
        tracing::warn!("Backend logout failed: {}", e);
    }

    // Keep the currency preference through the session reset.
    let currency: Option<String> = session.get(session_keys::CURRENCY).await.ok().flatten();

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    if let Some(code) = currency
        && let Err(e) = session.insert(session_keys::CURRENCY, &code).await
    {
        tracing::warn!("Failed to restore currency preference: {}", e);
    }

    clear_sentry_user();
    set_flash(&session, Flash::success("You have been signed out.")).await;
    Redirect::to("/").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/checkout"), "/"), "/checkout");
        assert_eq!(safe_next(Some("/products?page=2"), "/"), "/products?page=2");
    }

    #[test]
    fn test_safe_next_rejects_external_targets() {
        assert_eq!(safe_next(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_next(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_next(Some("evil"), "/"), "/");
        assert_eq!(safe_next(None, "/"), "/");
    }

    #[test]
    fn test_login_url_preserves_next() {
        assert_eq!(login_url("credentials", ""), "/login?error=credentials");
        assert_eq!(
            login_url("credentials", "/checkout"),
            "/login?error=credentials&next=%2Fcheckout"
        );
    }

    #[test]
    fn test_error_messages_cover_known_codes() {
        assert!(login_error_message("credentials").contains("Incorrect"));
        assert!(register_error_message("email_taken").contains("already exists"));
        assert!(register_error_message("anything_else").contains("Could not"));
    }

    #[test]
    fn test_verify_error_message_prefers_backend_detail() {
        let rejected = ApiError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            detail: "Invalid OTP".to_owned(),
        };
        assert_eq!(verify_error_message(&rejected), "Invalid OTP");

        let parse = ApiError::Parse(serde_json::from_str::<i32>("x").unwrap_err());
        assert!(verify_error_message(&parse).contains("temporarily unavailable"));
    }

    #[test]
    fn test_backend_outage_is_not_a_rejection() {
        let outage = ApiError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            detail: "upstream timeout".to_owned(),
        };
        assert!(is_unavailable(&outage));
        assert!(verify_error_message(&outage).contains("temporarily unavailable"));

        let rejection = ApiError::Unauthorized("Incorrect password".to_owned());
        assert!(!is_unavailable(&rejection));
    }
}
