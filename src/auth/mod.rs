//! Password-less authentication
//!
//! Handles:
//! - Signed session tokens
//! - Current-user extraction for handlers

mod middleware;
pub mod session;

pub use middleware::CurrentUser;
pub use session::{SESSION_COOKIE, Session, create_session_token, verify_session_token};
