use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum ShardError {
    #[error("Unknown shard '{0}'")]
    UnknownShard(String),
    #[error("Shard {shard} unreachable: {source}")]
    ShardUnreachable {
        shard: String,
        #[source]
        source: BoxError,
    },
    #[error("Query on shard {shard} failed: {message}")]
    QueryExecutionFailed { shard: String, message: String },
    #[error("Shard {shard} timed out after {after:?}")]
    Timeout { shard: String, after: Duration },
    #[error("Malformed result: {0}")]
    MalformedResult(String),
    #[error("Pool error: {0}")]
    PoolError(String),
}

impl ShardError {
    pub fn unreachable(
        shard: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        ShardError::ShardUnreachable {
            shard: shard.into(),
            source: source.into(),
        }
    }

    pub fn query_failed(
        shard: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        ShardError::QueryExecutionFailed {
            shard: shard.into(),
            message: message.to_string(),
        }
    }

    /// The shard this error is attributed to, when there is one.
    pub fn shard(&self) -> Option<&str> {
        match self {
            ShardError::UnknownShard(code) => Some(code),
            ShardError::ShardUnreachable { shard, .. }
            | ShardError::QueryExecutionFailed { shard, .. }
            | ShardError::Timeout { shard, .. } => Some(shard),
            ShardError::MalformedResult(_) | ShardError::PoolError(_) => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, ShardError::ShardUnreachable { .. })
    }
}

impl From<mobc::Error<ShardError>> for ShardError {
    fn from(value: mobc::Error<ShardError>) -> Self {
        match value {
            mobc::Error::Inner(e) => e,
            mobc::Error::Timeout => {
                ShardError::PoolError("timed out waiting for a connection".into())
            }
            mobc::Error::BadConn => {
                ShardError::PoolError("bad connection".into())
            }
            mobc::Error::PoolClosed => {
                ShardError::PoolError("pool closed".into())
            }
        }
    }
}

/// Raised by result shaping when a recordset lacks the rows it must carry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("no '{0}' row in result")]
    MissingKind(String),
    #[error("expected at least {expected} result sets, got {actual}")]
    MissingResultSet { expected: usize, actual: usize },
}

impl From<ShapeError> for ShardError {
    fn from(value: ShapeError) -> Self {
        ShardError::MalformedResult(value.to_string())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid shard declaration '{0}'. Expected 'CODE' or 'CODE:Name'.")]
    InvalidShardDecl(String),
    #[error("Shard '{0}' declared more than once")]
    DuplicateShard(String),
}
