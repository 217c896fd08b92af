//! Authentication extractors for backend-account sessions.
//!
//! Sign-in stores two session values: the [`CurrentUser`] profile and the
//! backend session token. The extractors here read both; handlers never
//! touch the session keys directly.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// A signed-in visitor: who they are, plus the token that proves it to
/// the backend.
#[derive(Debug, Clone)]
pub struct Authed {
    pub user: CurrentUser,
    pub token: String,
}

/// Extractor that requires a signed-in visitor.
///
/// Full-page requests get redirected to the login page; HTMX fragment
/// requests get a bare 401 so the page they sit in stays intact.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```
pub struct RequireAuth(pub Authed);

/// Error returned when authentication is required but missing.
pub enum AuthRejection {
    /// Redirect to login page (for full-page requests).
    RedirectToLogin,
    /// Unauthorized response (for HTMX fragment requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_fragment = parts.headers.contains_key("hx-request");
        let reject = || {
            if is_fragment {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        };

        // Session is put in extensions by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(reject)?;

        let token: String = session
            .get(session_keys::BACKEND_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or_else(reject)?;

        Ok(Self(Authed { user, token }))
    }
}

/// Extractor that optionally gets the signed-in visitor.
///
/// Unlike `RequireAuth`, this does not reject the request when nobody is
/// signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn home(OptionalAuth(auth): OptionalAuth) -> impl IntoResponse {
///     match auth {
///         Some(a) => format!("Hello, {}!", a.user.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<Authed>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(None));
        };

        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let token: Option<String> = session
            .get(session_keys::BACKEND_TOKEN)
            .await
            .ok()
            .flatten();

        Ok(Self(match (user, token) {
            (Some(user), Some(token)) => Some(Authed { user, token }),
            _ => None,
        }))
    }
}

/// Store the signed-in visitor in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
    token: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await?;
    session.insert(session_keys::BACKEND_TOKEN, token).await
}

/// Drop the signed-in visitor from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session
        .remove::<String>(session_keys::BACKEND_TOKEN)
        .await?;
    Ok(())
}
