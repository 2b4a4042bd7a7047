//! Connection pool registry.
//!
//! Pools are keyed by connection identity (host, port, user, database) and
//! created lazily on first use: building a pool opens no connection, the
//! first statement does. Every caller targeting the same logical database
//! shares one bounded connection budget. Entries live until `close_all`.

use crate::config::{POOL_CLOSE_TIMEOUT_SECS, PoolSettings};
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionDescriptor, PoolKey};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{ConnectOptions, Connection, MySqlPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Outcome of the last diagnostic connect, shared by every waiter.
#[derive(Debug)]
struct CheckOutcome {
    at: Instant,
    result: DbResult<()>,
}

/// Handle to a live MySQL pool. Cloning shares the same pool.
#[derive(Debug, Clone)]
pub struct DbPool {
    id: u64,
    pool: MySqlPool,
    /// At most one diagnostic connect per pool is in flight
    last_check: Arc<Mutex<Option<CheckOutcome>>>,
}

impl DbPool {
    /// Registry-assigned identifier, unique per created pool.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True if both handles refer to the same underlying pool.
    pub fn same_pool(&self, other: &DbPool) -> bool {
        self.id == other.id
    }

    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Explain why acquiring a connection timed out.
    ///
    /// One direct connection attempt finds the real cause; if it succeeds
    /// the pool is saturated. Attempts are serialized per pool and an outcome
    /// is reused for `connect_timeout`, so queued callers share one extra
    /// connection instead of opening one each.
    pub async fn diagnose_timeout(&self, connect_timeout: Duration) -> DbError {
        let mut last = self.last_check.lock().await;
        let recent = last
            .as_ref()
            .filter(|outcome| outcome.at.elapsed() < connect_timeout)
            .map(|outcome| outcome.result.clone());

        let result = match recent {
            Some(result) => result,
            None => {
                let result = self.connect_once(connect_timeout).await;
                *last = Some(CheckOutcome {
                    at: Instant::now(),
                    result: result.clone(),
                });
                result
            }
        };

        match result {
            Ok(()) => DbError::pool_timeout(connect_timeout.as_secs()),
            Err(cause) => cause,
        }
    }

    /// Open one connection outside the pool and drop it again.
    pub async fn connect_once(&self, connect_timeout: Duration) -> DbResult<()> {
        let options = self.pool.connect_options();
        match tokio::time::timeout(connect_timeout, options.connect()).await {
            Ok(Ok(conn)) => {
                if let Err(e) = conn.close().await {
                    debug!(error = %e, "Diagnostic connection did not close cleanly");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(DbError::from(e)),
            Err(_) => Err(DbError::driver(
                Some("ETIMEDOUT".to_string()),
                format!("connect ETIMEDOUT after {}s", connect_timeout.as_secs()),
            )),
        }
    }
}

#[derive(Debug)]
struct PoolEntry {
    pool: DbPool,
    /// Milliseconds since the Unix epoch
    last_used: AtomicI64,
}

impl PoolEntry {
    fn touch(&self) {
        self.last_used
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

/// Process-wide map from pool identity to a live pool.
#[derive(Debug)]
pub struct PoolRegistry {
    pools: RwLock<HashMap<PoolKey, PoolEntry>>,
    settings: PoolSettings,
    next_id: AtomicU64,
}

impl PoolRegistry {
    /// Create a registry using the fixed pool limits.
    pub fn new() -> Self {
        Self::with_settings(PoolSettings::default())
    }

    pub fn with_settings(settings: PoolSettings) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            settings,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn settings(&self) -> PoolSettings {
        self.settings
    }

    /// Get the pool for a descriptor, creating it on first use.
    ///
    /// An existing entry only has its last-used time refreshed; its health is
    /// left to the driver. Creation happens under the write lock with a
    /// re-check, so concurrent first requests for one identity share a single
    /// winner.
    pub async fn get_pool(&self, descriptor: &ConnectionDescriptor) -> DbPool {
        let key = descriptor.pool_key();

        {
            let pools = self.pools.read().await;
            if let Some(entry) = pools.get(&key) {
                entry.touch();
                debug!(pool_key = %key, pool_id = entry.pool.id, "Reusing connection pool");
                return entry.pool.clone();
            }
        }

        let mut pools = self.pools.write().await;
        let entry = pools.entry(key).or_insert_with_key(|key| {
            let pool = DbPool {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                pool: self.build_pool(descriptor),
                last_check: Arc::new(Mutex::new(None)),
            };
            info!(
                pool_key = %key,
                pool_id = pool.id,
                max_connections = self.settings.max_connections,
                "Created connection pool"
            );
            PoolEntry {
                pool,
                last_used: AtomicI64::new(0),
            }
        });
        entry.touch();
        entry.pool.clone()
    }

    /// When the pool for this identity was last handed out.
    pub async fn last_used(&self, key: &PoolKey) -> Option<DateTime<Utc>> {
        let pools = self.pools.read().await;
        pools
            .get(key)
            .and_then(|e| DateTime::from_timestamp_millis(e.last_used.load(Ordering::Relaxed)))
    }

    /// Number of registered pools.
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Close every pool and clear the registry.
    ///
    /// Each pool gets its own bounded close; one pool failing to shut down in
    /// time does not hold up the others.
    pub async fn close_all(&self) {
        let drained: Vec<(PoolKey, PoolEntry)> = {
            let mut pools = self.pools.write().await;
            pools.drain().collect()
        };

        let grace = Duration::from_secs(POOL_CLOSE_TIMEOUT_SECS);
        let closes = drained.into_iter().map(|(key, entry)| async move {
            match tokio::time::timeout(grace, entry.pool.close()).await {
                Ok(()) => info!(pool_key = %key, "Closed connection pool"),
                Err(_) => warn!(
                    pool_key = %key,
                    timeout_secs = grace.as_secs(),
                    "Connection pool did not close in time, abandoning it"
                ),
            }
        });
        join_all(closes).await;

        info!("All connection pools closed");
    }

    fn build_pool(&self, descriptor: &ConnectionDescriptor) -> MySqlPool {
        let mut options = MySqlConnectOptions::new()
            .host(&descriptor.host)
            .port(descriptor.port)
            .username(&descriptor.user)
            .charset("utf8mb4");
        if !descriptor.password.is_empty() {
            options = options.password(&descriptor.password);
        }
        if let Some(database) = descriptor.database() {
            options = options.database(database);
        }

        MySqlPoolOptions::new()
            .min_connections(0)
            .max_connections(self.settings.max_connections)
            .acquire_timeout(self.settings.connect_timeout)
            .connect_lazy_with(options)
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
