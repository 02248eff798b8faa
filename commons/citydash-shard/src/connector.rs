use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ShardError;
use crate::query::QuerySpec;
use crate::registry::ShardDescriptor;
use crate::row::RecordSets;

/// An open session with one shard.
#[async_trait]
pub trait ShardSession: Send + Sync {
    fn shard(&self) -> &str;

    /// Whether the transport last reported itself connected. No I/O.
    fn is_connected(&self) -> bool;

    /// Runs `query` and returns every result set it produced.
    ///
    /// Transport failures must come back as
    /// [`ShardError::ShardUnreachable`] and leave the session reporting
    /// itself disconnected; SQL errors as
    /// [`ShardError::QueryExecutionFailed`].
    async fn execute(&self, query: &QuerySpec) -> Result<RecordSets, ShardError>;

    async fn close(&self) {}
}

/// Opens sessions for shard descriptors.
#[async_trait]
pub trait ShardConnector: Send + Sync {
    async fn connect(
        &self,
        shard: &ShardDescriptor,
    ) -> Result<ConnectionHandle, ShardError>;
}

pub type ConnectionHandle = Arc<dyn ShardSession>;
