//! Session management
//!
//! Uses HMAC-signed tokens sent as a Bearer header or a cookie.
//! No server-side session storage needed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::data::User;
use crate::error::AppError;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// User session data
///
/// Encoded into the signed token. Contains minimal user info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// User ID
    pub user_id: String,
    /// E-mail used to log in
    pub email: String,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `user` lasting `max_age_secs`
    pub fn for_user(user: &User, max_age_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(max_age_secs),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// # Arguments
/// * `session` - Session data to encode
/// * `secret` - HMAC secret key
///
/// # Returns
/// Signed token string
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize session to JSON
    let payload = serde_json::to_string(session).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// # Errors
/// `Unauthorized` if the token is malformed, tampered with or expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;
    if signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::Unauthorized)?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let session: Session =
        serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)?;

    // 4. Check if session is expired
    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn user() -> User {
        User {
            id: "01HZXJ4P9W3V5Q1ZK6N8T2R7YB".to_string(),
            email: "reader@example.com".to_string(),
            name: "reader@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_verifies_with_same_secret() {
        let session = Session::for_user(&user(), 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let decoded = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(decoded.user_id, session.user_id);
        assert_eq!(decoded.email, "reader@example.com");
    }

    #[test]
    fn token_rejected_with_other_secret_or_tampering() {
        let session = Session::for_user(&user(), 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        assert!(matches!(
            verify_session_token(&token, &"z".repeat(32)),
            Err(AppError::Unauthorized)
        ));

        let (_, signature) = token.split_once('.').unwrap();
        let mut forged = session.clone();
        forged.user_id = "someone-else".to_string();
        let forged_payload = create_session_token(&forged, SECRET).unwrap();
        let (forged_b64, _) = forged_payload.split_once('.').unwrap();
        assert!(verify_session_token(&format!("{forged_b64}.{signature}"), SECRET).is_err());

        assert!(verify_session_token("not-a-token", SECRET).is_err());
    }

    #[test]
    fn expired_session_is_rejected() {
        let session = Session::for_user(&user(), -1);
        let token = create_session_token(&session, SECRET).unwrap();

        assert!(matches!(
            verify_session_token(&token, SECRET),
            Err(AppError::Unauthorized)
        ));
    }
}
