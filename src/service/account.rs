//! Account service
//!
//! Password-less accounts: logging in with an e-mail address creates the
//! user on first use.

use std::sync::Arc;

use chrono::Utc;

use super::UserContext;
use crate::data::{Database, EntityId, User};
use crate::error::AppError;
use crate::metrics::LOGINS_TOTAL;

/// Account service
#[derive(Clone)]
pub struct AccountService {
    db: Arc<Database>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Find the user for `email`, creating it if this is the first login
    ///
    /// # Errors
    /// `Validation` if the e-mail is blank
    pub async fn login(&self, email: &str) -> Result<User, AppError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Validation("email is required".to_string()));
        }

        if let Some(user) = self.db.get_user_by_email(email).await? {
            LOGINS_TOTAL.with_label_values(&["existing"]).inc();
            return Ok(user);
        }

        let candidate = User {
            id: EntityId::new().0,
            email: email.to_string(),
            name: email.to_string(),
            created_at: Utc::now(),
        };

        // A concurrent first login may win the insert; reuse its row.
        if self.db.insert_user_if_absent(&candidate).await? {
            LOGINS_TOTAL.with_label_values(&["created"]).inc();
            tracing::info!(user_id = %candidate.id, "User account created");
            return Ok(candidate);
        }

        LOGINS_TOTAL.with_label_values(&["existing"]).inc();
        self.db
            .get_user_by_email(email)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Get the caller's account
    pub async fn get_user(&self, ctx: &UserContext) -> Result<User, AppError> {
        self.db
            .get_user(&ctx.user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}
