use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::connector::{ConnectionHandle, ShardConnector};
use crate::error::ShardError;
use crate::registry::ShardRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolState {
    pub shard: String,
    pub open: bool,
    pub connected: bool,
}

/// Keeps one long-lived session per shard.
///
/// Sessions are created on first use and reused while they report
/// themselves connected. A session found disconnected is evicted and
/// replaced on the next [`PoolManager::acquire`]. [`PoolManager::release`]
/// never closes anything: a handle is only closed after it has been
/// removed from the map, so no caller is ever handed a closed session.
pub struct PoolManager {
    registry: Arc<ShardRegistry>,
    connector: Arc<dyn ShardConnector>,
    handles: RwLock<HashMap<String, ConnectionHandle>>,
    // one creation lock per shard; the registry is immutable so this map is too
    creation: HashMap<String, Mutex<()>>,
}

impl PoolManager {
    pub fn new(
        registry: Arc<ShardRegistry>,
        connector: Arc<dyn ShardConnector>,
    ) -> Self {
        let creation = registry
            .codes()
            .map(|code| (code.to_string(), Mutex::new(())))
            .collect();
        Self {
            registry,
            connector,
            handles: RwLock::new(HashMap::new()),
            creation,
        }
    }

    pub fn registry(&self) -> &ShardRegistry {
        &self.registry
    }

    pub async fn acquire(
        &self,
        code: &str,
    ) -> Result<ConnectionHandle, ShardError> {
        let shard = self.registry.describe(code)?;
        let code = shard.code.as_str();

        if let Some(handle) = self.healthy(code).await {
            return Ok(handle);
        }

        let lock = self
            .creation
            .get(code)
            .ok_or_else(|| ShardError::UnknownShard(code.to_string()))?;
        let _guard = lock.lock().await;

        // another request may have finished creating it while we waited
        if let Some(handle) = self.healthy(code).await {
            return Ok(handle);
        }

        let stale = self.handles.write().await.remove(code);
        if let Some(stale) = stale {
            warn!(shard = %code, "evicting disconnected session");
            stale.close().await;
        }

        match self.connector.connect(shard).await {
            Ok(handle) => {
                info!(shard = %code, database = %shard.database, "connected to shard");
                self.handles
                    .write()
                    .await
                    .insert(code.to_string(), handle.clone());
                Ok(handle)
            }
            Err(e) => {
                warn!(shard = %code, error = %e, "failed to connect to shard");
                self.handles.write().await.remove(code);
                Err(match e {
                    e @ ShardError::ShardUnreachable { .. } => e,
                    other => ShardError::unreachable(code, other),
                })
            }
        }
    }

    async fn healthy(&self, code: &str) -> Option<ConnectionHandle> {
        let handles = self.handles.read().await;
        handles.get(code).filter(|h| h.is_connected()).cloned()
    }

    /// Ends the caller's borrow. The session stays pooled for reuse.
    pub fn release(&self, handle: ConnectionHandle) {
        debug!(shard = %handle.shard(), "released session");
        drop(handle);
    }

    /// Removes and closes the session for `code`. Returns whether one existed.
    pub async fn evict(&self, code: &str) -> bool {
        let removed = self
            .handles
            .write()
            .await
            .remove(&code.to_ascii_uppercase());
        match removed {
            Some(handle) => {
                info!(shard = %handle.shard(), "evicted session");
                handle.close().await;
                true
            }
            None => false,
        }
    }

    /// Closes every pooled session.
    pub async fn shutdown(&self) {
        let drained: Vec<ConnectionHandle> =
            self.handles.write().await.drain().map(|(_, h)| h).collect();
        for handle in drained {
            handle.close().await;
        }
        info!("closed all shard sessions");
    }

    pub async fn states(&self) -> Vec<PoolState> {
        let handles = self.handles.read().await;
        self.registry
            .codes()
            .map(|code| {
                let handle = handles.get(code);
                PoolState {
                    shard: code.to_string(),
                    open: handle.is_some(),
                    connected: handle.is_some_and(|h| h.is_connected()),
                }
            })
            .collect()
    }
}
