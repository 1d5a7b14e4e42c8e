//! Authentication extractor
//!
//! Resolves the caller's [`UserContext`] from a session token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::session::{SESSION_COOKIE, Session, verify_session_token};
use crate::AppState;
use crate::error::AppError;
use crate::service::UserContext;

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned())
        })
}

/// Extractor for current authenticated user
///
/// Accepts `Authorization: Bearer <token>` or the `session` cookie.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(ctx): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", ctx.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(CurrentUser(UserContext::new(session.user_id.clone())));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = verify_session_token(&token, &state.config.auth.session_secret)?;
        let ctx = UserContext::new(session.user_id.clone());
        parts.extensions.insert(session);

        Ok(CurrentUser(ctx))
    }
}
