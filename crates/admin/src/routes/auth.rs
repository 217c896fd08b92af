//! Operator sign-in and sign-out.
//!
//! Admin login is single-step: the backend checks the password and the
//! admin flag together and hands back the session token. Failures are
//! re-rendered inline with the backend's own message, so a rejected
//! password reads differently from a non-admin account.

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

use crate::api::ApiError;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Flash, set_flash, take_flash};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for notices arriving via redirect.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    /// Submitted email, kept through a failed attempt.
    pub email: String,
    pub flash: Option<Flash>,
}

/// Message for an error code carried in the login URL.
///
/// Only `expired` is ever generated (by the stale-token redirect in
/// [`crate::error`]); unknown codes render nothing.
fn login_error_message(code: &str) -> Option<&'static str> {
    match code {
        "expired" => Some("Your session has expired. Please sign in again."),
        _ => None,
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

/// Message shown inline when a sign-in attempt fails.
///
/// Backend rejections carry their own text ("Invalid credentials",
/// "Admin access required"); outages get a retry message instead.
fn sign_in_failure(e: &ApiError) -> String {
    if is_unavailable(e) {
        return "Sign-in is temporarily unavailable. Please try again.".to_owned();
    }
    e.user_detail()
        .map_or_else(|| "Could not sign you in.".to_owned(), ToOwned::to_owned)
}

/// GET /login - display the login page.
///
/// An operator who is already signed in goes straight to the dashboard.
pub async fn login_page(
    OptionalAdminAuth(auth): OptionalAdminAuth,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Response {
    if auth.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        error: query
            .error
            .as_deref()
            .and_then(login_error_message)
            .map(str::to_owned),
        email: String::new(),
        flash: take_flash(&session).await,
    }
    .into_response()
}

/// POST /login - sign in against the backend.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim();

    let failed = |message: String| {
        LoginTemplate {
            error: Some(message),
            email: email.to_owned(),
            flash: None,
        }
        .into_response()
    };

    let auth = match state.api().admin_login(email, &form.password).await {
        Ok(auth) => auth,
        Err(e) if is_unavailable(&e) => {
            tracing::error!("Admin login failed: {}", e);
            return failed(sign_in_failure(&e));
        }
        Err(e) => {
            tracing::warn!("Admin login rejected: {}", e);
            return failed(sign_in_failure(&e));
        }
    };

    // The backend already rejects non-admin accounts with a 403; this
    // guards against a misconfigured backend handing out plain tokens.
    if !auth.user.is_admin {
        tracing::warn!(email = %auth.user.email, "Login succeeded without admin flag");
        return failed("This account does not have admin access.".to_owned());
    }

    let admin = CurrentAdmin {
        id: auth.user.id,
        email: auth.user.email,
        name: auth.user.name,
    };

    if let Err(e) = set_current_admin(&session, &admin, &auth.session_token).await {
        tracing::error!("Failed to store admin session: {}", e);
        return failed("Could not establish the session. Please try again.".to_owned());
    }
    set_sentry_user(&admin.id, Some(&admin.email));

    tracing::info!(admin_id = %admin.id, "Admin signed in");
    set_flash(
        &session,
        Flash::success(format!("Signed in as {}.", admin.name)),
    )
    .await;
    Redirect::to("/").into_response()
}

/// POST /logout - end the admin session.
///
/// Sign-out is local; the backend token expires server-side.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!("Failed to clear admin session: {}", e);
    }
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();
    set_flash(&session, Flash::success("You have been signed out.")).await;
    Redirect::to("/login").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_code_has_a_message() {
        assert!(login_error_message("expired").is_some());
        assert!(login_error_message("anything_else").is_none());
    }

    #[test]
    fn test_backend_rejection_surfaces_its_detail() {
        let rejected = ApiError::Unauthorized("Invalid credentials".to_owned());
        assert_eq!(sign_in_failure(&rejected), "Invalid credentials");

        let forbidden = ApiError::Status {
            status: reqwest::StatusCode::FORBIDDEN,
            detail: "Admin access required".to_owned(),
        };
        assert_eq!(sign_in_failure(&forbidden), "Admin access required");
    }

    #[test]
    fn test_backend_outage_reads_as_unavailable() {
        let outage = ApiError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            detail: "upstream timeout".to_owned(),
        };
        assert!(is_unavailable(&outage));
        assert!(sign_in_failure(&outage).contains("temporarily unavailable"));
    }
}
