use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ShardError;
use crate::pool::PoolManager;
use crate::query::QuerySpec;
use crate::row::{RecordSets, Row};
use crate::scope::Scope;

pub const DEFAULT_SHARD_TIMEOUT: Duration = Duration::from_secs(15);

/// A value annotated with the shard it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tagged<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(rename = "CiudadDB")]
    pub shard: String,
}

impl<T> Tagged<T> {
    pub fn new(shard: impl Into<String>, item: T) -> Self {
        Self {
            item,
            shard: shard.into(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tagged<U> {
        Tagged {
            item: f(self.item),
            shard: self.shard,
        }
    }
}

/// Outcome of one shard's part of a fan-out.
#[derive(Debug)]
pub struct ShardResult<T> {
    pub shard: String,
    pub rows: Vec<T>,
    pub error: Option<ShardError>,
}

impl<T> ShardResult<T> {
    fn from_outcome(shard: &str, outcome: Result<Vec<T>, ShardError>) -> Self {
        match outcome {
            Ok(rows) => Self {
                shard: shard.to_string(),
                rows,
                error: None,
            },
            Err(e) => Self {
                shard: shard.to_string(),
                rows: Vec::new(),
                error: Some(e),
            },
        }
    }
}

/// A shard whose failure was absorbed by an all-shards fan-out.
#[derive(Debug)]
pub struct ShardWarning {
    pub shard: String,
    pub error: ShardError,
}

/// Rows from every shard in scope, concatenated in registry order.
#[derive(Debug)]
pub struct MergedResult<T> {
    pub rows: Vec<Tagged<T>>,
    pub warnings: Vec<ShardWarning>,
}

impl<T> MergedResult<T> {
    fn merge(results: Vec<ShardResult<T>>) -> Self {
        let mut rows = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            match result.error {
                Some(error) => {
                    warn!(shard = %result.shard, error = %error, "shard skipped in fan-out");
                    warnings.push(ShardWarning {
                        shard: result.shard,
                        error,
                    });
                }
                None => {
                    let shard = result.shard;
                    rows.extend(
                        result.rows.into_iter().map(|r| Tagged::new(shard.clone(), r)),
                    );
                }
            }
        }
        Self { rows, warnings }
    }

    pub fn failed_shards(&self) -> impl Iterator<Item = &str> + '_ {
        self.warnings.iter().map(|w| w.shard.as_str())
    }

    pub fn into_rows(self) -> Vec<Tagged<T>> {
        self.rows
    }
}

#[derive(Debug, PartialEq)]
pub enum DetailSearchResult<T> {
    Found(Tagged<T>),
    NotFound,
}

impl<T> DetailSearchResult<T> {
    pub fn found(self) -> Option<Tagged<T>> {
        match self {
            DetailSearchResult::Found(t) => Some(t),
            DetailSearchResult::NotFound => None,
        }
    }
}

/// Runs one query across the shards of a scope.
///
/// Under [`Scope::All`] a failing shard is logged and skipped; under a
/// single-shard scope its error is returned. Every per-shard call
/// (acquire + execute) is bounded by the executor timeout.
#[derive(Clone)]
pub struct ShardExecutor {
    pools: Arc<PoolManager>,
    timeout: Duration,
}

impl ShardExecutor {
    pub fn new(pools: Arc<PoolManager>, timeout: Duration) -> Self {
        Self { pools, timeout }
    }

    pub fn pools(&self) -> &Arc<PoolManager> {
        &self.pools
    }

    /// Concurrent fan-out returning the first result set of every shard.
    pub async fn run_all<B>(
        &self,
        scope: &Scope,
        build: B,
    ) -> Result<MergedResult<Row>, ShardError>
    where
        B: Fn(&str) -> QuerySpec,
    {
        self.run_all_with(scope, build, |_, sets| {
            Ok(sets.into_iter().next().unwrap_or_default())
        })
        .await
    }

    /// Concurrent fan-out; `shape` turns each shard's result sets into rows.
    /// Output follows registry order regardless of completion order.
    pub async fn run_all_with<T, B, S>(
        &self,
        scope: &Scope,
        build: B,
        shape: S,
    ) -> Result<MergedResult<T>, ShardError>
    where
        B: Fn(&str) -> QuerySpec,
        S: Fn(&str, RecordSets) -> Result<Vec<T>, ShardError>,
    {
        match scope {
            Scope::Shard(code) => {
                let code = self.pools.registry().describe(code)?.code.clone();
                let sets = self.execute_on(&code, &build).await?;
                let rows = shape(&code, sets)?;
                Ok(MergedResult::merge(vec![ShardResult::from_outcome(
                    &code,
                    Ok(rows),
                )]))
            }
            Scope::All => {
                let codes: Vec<String> =
                    self.pools.registry().codes().map(str::to_string).collect();
                let tasks = codes.iter().map(|code| {
                    let build = &build;
                    let shape = &shape;
                    async move {
                        let outcome = match self.execute_on(code, build).await {
                            Ok(sets) => shape(code, sets),
                            Err(e) => Err(e),
                        };
                        ShardResult::from_outcome(code, outcome)
                    }
                });
                Ok(MergedResult::merge(join_all(tasks).await))
            }
        }
    }

    /// Sequential search in registry order; stops at the first shard where
    /// `probe` yields an entity. Later shards are not queried.
    ///
    /// Under [`Scope::All`] shard errors and malformed results count as "not
    /// here". Under a single-shard scope only a malformed result maps to
    /// not-found; other errors are returned.
    pub async fn find_first<T, B, P>(
        &self,
        scope: &Scope,
        build: B,
        probe: P,
    ) -> Result<DetailSearchResult<T>, ShardError>
    where
        B: Fn(&str) -> QuerySpec,
        P: Fn(&str, RecordSets) -> Result<Option<T>, ShardError>,
    {
        match scope {
            Scope::Shard(code) => {
                let code = self.pools.registry().describe(code)?.code.clone();
                let sets = self.execute_on(&code, &build).await?;
                match probe(&code, sets) {
                    Ok(Some(found)) => {
                        Ok(DetailSearchResult::Found(Tagged::new(code, found)))
                    }
                    Ok(None) => Ok(DetailSearchResult::NotFound),
                    Err(ShardError::MalformedResult(reason)) => {
                        debug!(shard = %code, %reason, "malformed detail result");
                        Ok(DetailSearchResult::NotFound)
                    }
                    Err(e) => Err(e),
                }
            }
            Scope::All => {
                let codes: Vec<String> =
                    self.pools.registry().codes().map(str::to_string).collect();
                for code in codes {
                    let found = match self.execute_on(&code, &build).await {
                        Ok(sets) => probe(&code, sets),
                        Err(e) => Err(e),
                    };
                    match found {
                        Ok(Some(found)) => {
                            debug!(shard = %code, "detail found");
                            return Ok(DetailSearchResult::Found(Tagged::new(
                                code, found,
                            )));
                        }
                        Ok(None) => {}
                        Err(ShardError::MalformedResult(reason)) => {
                            debug!(shard = %code, %reason, "malformed detail result");
                        }
                        Err(e) => {
                            warn!(shard = %code, error = %e, "shard skipped in detail search");
                        }
                    }
                }
                Ok(DetailSearchResult::NotFound)
            }
        }
    }

    async fn execute_on<B>(
        &self,
        code: &str,
        build: &B,
    ) -> Result<RecordSets, ShardError>
    where
        B: Fn(&str) -> QuerySpec,
    {
        let query = build(code);
        let work = async {
            let handle = self.pools.acquire(code).await?;
            debug!(shard = %code, query = %query, "dispatching query");
            let result = handle.execute(&query).await;
            self.pools.release(handle);
            result
        };
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(ShardError::Timeout {
                shard: code.to_string(),
                after: self.timeout,
            }),
        }
    }
}
