//! Token cache connection
//!
//! The cache is not used for any caching logic yet; the server only
//! verifies at startup that the configured endpoint answers `PING`.

use std::time::Duration;

use crate::error::AppError;

const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness-checked handle to a Redis-compatible token cache
#[derive(Debug, Clone)]
pub struct TokenCache {
    client: redis::Client,
    addr: String,
}

impl TokenCache {
    /// Connect to `redis://[user:password@]host[:port][/db]` and check it
    /// answers `PING`
    ///
    /// Credentials and the database index in the URL are applied on connect.
    ///
    /// # Errors
    /// `Config` for a malformed URL, `CacheUnavailable` when the endpoint
    /// cannot be reached, rejects the credentials or does not answer `PONG`.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::Config(format!("invalid cache.url: {e}")))?;
        let addr = client.get_connection_info().addr.to_string();
        let cache = Self { client, addr };
        cache.ping().await?;

        tracing::info!(addr = %cache.addr, "Token cache reachable");
        Ok(cache)
    }

    /// Address (`host:port`) of the cache endpoint
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Open a connection and send `PING`
    pub async fn ping(&self) -> Result<(), AppError> {
        let exchange = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            redis::cmd("PING").query_async::<_, String>(&mut conn).await
        };

        let reply = tokio::time::timeout(PING_TIMEOUT, exchange)
            .await
            .map_err(|_| AppError::CacheUnavailable(format!("{}: ping timed out", self.addr)))?
            .map_err(|e| AppError::CacheUnavailable(format!("{}: {e}", self.addr)))?;

        if reply == "PONG" {
            Ok(())
        } else {
            Err(AppError::CacheUnavailable(format!(
                "{}: unexpected reply {reply:?}",
                self.addr
            )))
        }
    }
}
