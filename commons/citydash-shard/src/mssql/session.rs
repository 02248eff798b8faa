use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mobc::Pool;
use tiberius::{QueryItem, ToSql};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::connector::{ConnectionHandle, ShardConnector, ShardSession};
use crate::error::ShardError;
use crate::mssql::manager::{TdsClient, TdsManager};
use crate::mssql::{ResultSetCollector, classify, convert_row};
use crate::query::QuerySpec;
use crate::registry::ShardDescriptor;
use crate::row::RecordSets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_open: u64,
    pub max_idle: u64,
    pub get_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: 10,
            max_idle: 2,
            get_timeout: Duration::from_secs(10),
        }
    }
}

/// Connects shards over TDS, one connection pool per session.
#[derive(Debug, Clone, Default)]
pub struct MssqlConnector {
    pool_config: PoolConfig,
}

impl MssqlConnector {
    pub fn new(pool_config: PoolConfig) -> Self {
        Self { pool_config }
    }
}

#[async_trait]
impl ShardConnector for MssqlConnector {
    async fn connect(
        &self,
        shard: &ShardDescriptor,
    ) -> Result<ConnectionHandle, ShardError> {
        let pool = Pool::builder()
            .max_open(self.pool_config.max_open)
            .max_idle(self.pool_config.max_idle)
            .get_timeout(Some(self.pool_config.get_timeout))
            .build(TdsManager::new(shard));
        // a first checkout proves the shard answers before the session is shared
        pool.get().await.map_err(|e| match ShardError::from(e) {
            e @ ShardError::ShardUnreachable { .. } => e,
            other => ShardError::unreachable(&shard.code, other),
        })?;
        Ok(Arc::new(MssqlSession {
            code: shard.code.clone(),
            pool: RwLock::new(Some(pool)),
            connected: AtomicBool::new(true),
        }))
    }
}

pub struct MssqlSession {
    code: String,
    pool: RwLock<Option<Pool<TdsManager>>>,
    connected: AtomicBool,
}

impl MssqlSession {
    async fn run(
        client: &mut TdsClient,
        query: &QuerySpec,
    ) -> Result<RecordSets, tiberius::error::Error> {
        let (sql, values) = query.batch();
        let params: Vec<&dyn ToSql> = values.iter().map(|v| *v as &dyn ToSql).collect();
        let mut stream = client.query(sql, &params).await?;
        let mut sets = ResultSetCollector::new();
        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(_) => sets.metadata(),
                QueryItem::Row(row) => sets.row(convert_row(row)),
            }
        }
        Ok(sets.finish())
    }

    fn fail(&self, error: ShardError) -> ShardError {
        if error.is_unreachable() {
            warn!(shard = %self.code, error = %error, "session lost its connection");
            self.connected.store(false, Ordering::Release);
        }
        error
    }
}

#[async_trait]
impl ShardSession for MssqlSession {
    fn shard(&self) -> &str {
        &self.code
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn execute(&self, query: &QuerySpec) -> Result<RecordSets, ShardError> {
        let pool = self
            .pool
            .read()
            .await
            .clone()
            .ok_or_else(|| ShardError::unreachable(&self.code, "session closed"))?;
        let mut conn = pool
            .get()
            .await
            .map_err(|e| self.fail(ShardError::from(e)))?;
        Self::run(&mut conn, query)
            .await
            .map_err(|e| self.fail(classify(&self.code, e)))
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::Release);
        if self.pool.write().await.take().is_some() {
            debug!(shard = %self.code, "closed connection pool");
        }
    }
}
