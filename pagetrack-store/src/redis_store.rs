//! Redis-backed store.
//!
//! The connection is opened once with [`RedisStore::connect`] and shared by
//! cloning the handle. `ConnectionManager` reconnects on its own after a
//! dropped connection; while it is down every call fails with
//! [`TrackerError::StoreUnavailable`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{RedisError, Value};
use tracing::{debug, instrument};

use pagetrack_core::error::{Result, TrackerError};
use pagetrack_core::traits::Store;

/// [`Store`] over a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to `url` (e.g. `redis://127.0.0.1:6379/0`).
    #[instrument(skip_all)]
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| TrackerError::ConfigError(format!("invalid Redis URL: {}", e)))?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;

        debug!("Connected to Redis");
        Ok(Self { conn })
    }

    /// Round-trips a `PING`.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(unavailable)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn increment(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        redis::cmd("INCR")
            .arg(key)
            .query_async::<_, u64>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.conn.clone();
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Value>(&mut conn)
            .await
            .map_err(unavailable)?;

        match value {
            Value::Nil => Ok(None),
            Value::Data(bytes) => Ok(Some(Bytes::from(bytes))),
            other => Err(TrackerError::DecodeFailed {
                key: key.to_string(),
                reason: format!("unexpected reply {:?}", other),
            }),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        let seconds = ttl_seconds(ttl)?;
        let mut conn = self.conn.clone();
        redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(value.as_ref())
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }
}

/// `SETEX` takes whole seconds; partial seconds round up.
fn ttl_seconds(ttl: Duration) -> Result<u64> {
    if ttl.is_zero() {
        return Err(TrackerError::ValidationError(
            "TTL must be greater than zero".into(),
        ));
    }
    let whole = ttl.as_secs();
    Ok(if ttl.subsec_nanos() > 0 { whole + 1 } else { whole })
}

fn unavailable(e: RedisError) -> TrackerError {
    TrackerError::StoreUnavailable(e.to_string())
}
