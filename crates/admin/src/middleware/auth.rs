//! Authentication extractors for operator sessions.
//!
//! Admin login stores two session values: the [`CurrentAdmin`] identity and
//! the backend session token. The extractor here reads both; handlers never
//! touch the session keys directly.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// A signed-in operator: who they are, plus the token that proves it to
/// the backend.
#[derive(Debug, Clone)]
pub struct AdminAuthed {
    pub admin: CurrentAdmin,
    pub token: String,
}

/// Extractor that requires a signed-in operator.
///
/// Unauthenticated requests get redirected to the login page. The backend
/// re-checks the admin flag on every call, so a forged session identity
/// buys nothing without a matching token.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdminAuth(auth): RequireAdminAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub AdminAuthed);

/// Error returned when admin authentication is required but missing.
pub enum AdminAuthRejection {
    /// Redirect to the login page.
    RedirectToLogin,
    /// Session infrastructure missing from the request.
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Session is put in extensions by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        let token: String = session
            .get(session_keys::BACKEND_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        Ok(Self(AdminAuthed { admin, token }))
    }
}

/// Extractor that optionally gets the signed-in operator.
///
/// Used on the login page itself, which redirects away when someone is
/// already signed in.
pub struct OptionalAdminAuth(pub Option<AdminAuthed>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(None));
        };

        let admin: Option<CurrentAdmin> = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten();
        let token: Option<String> = session
            .get(session_keys::BACKEND_TOKEN)
            .await
            .ok()
            .flatten();

        Ok(Self(match (admin, token) {
            (Some(admin), Some(token)) => Some(AdminAuthed { admin, token }),
            _ => None,
        }))
    }
}

/// Store the signed-in operator in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
    token: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await?;
    session.insert(session_keys::BACKEND_TOKEN, token).await
}

/// Drop the signed-in operator from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session
        .remove::<String>(session_keys::BACKEND_TOKEN)
        .await?;
    Ok(())
}
