//! Shard registry, per-shard session pool and fan-out execution over the
//! city databases.

pub mod connector;
pub mod error;
pub mod executor;
pub mod mssql;
pub mod pool;
pub mod query;
pub mod registry;
pub mod row;
pub mod scope;
pub mod shaping;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use connector::{ConnectionHandle, ShardConnector, ShardSession};
pub use error::{ConfigError, ShapeError, ShardError};
pub use executor::{
    DEFAULT_SHARD_TIMEOUT, DetailSearchResult, MergedResult, ShardExecutor,
    ShardResult, ShardWarning, Tagged,
};
pub use pool::{PoolManager, PoolState};
pub use query::{ParamValue, ProcedureCall, QuerySpec, TextQuery};
pub use registry::{ShardDecl, ShardDescriptor, ShardRegistry, TlsOptions, parse_shard_decls};
pub use row::{RecordSet, RecordSets, Row, SqlValue};
pub use scope::{ALL_SHARDS, Scope};
