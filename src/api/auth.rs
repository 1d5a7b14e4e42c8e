//! Login, logout and current-user endpoints

use axum::{extract::State, response::Json};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::AppState;
use crate::auth::{CurrentUser, SESSION_COOKIE, Session, create_session_token};
use crate::data::User;
use crate::error::AppError;

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/login
/// Find or create the user for an e-mail and start a session
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let user = state.accounts().login(&req.email).await?;

    let session = Session::for_user(&user, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax);

    tracing::info!(user_id = %user.id, "User logged in");
    Ok((jar.add(cookie), Json(LoginResponse { token, user })))
}

/// POST /api/auth/logout
/// Sessions are stateless; this only clears the cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(MessageResponse::new("Logged out successfully")))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.accounts().get_user(&ctx).await?))
}
