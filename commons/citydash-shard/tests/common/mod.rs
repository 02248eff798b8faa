#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use citydash_shard::mock::{MockConnector, MockShard};
use citydash_shard::{PoolManager, ShardDecl, ShardExecutor, ShardRegistry};

/// Registry with one shard per code, all pointing at a dummy server.
pub fn registry(codes: &[&str]) -> Arc<ShardRegistry> {
    let decls: Vec<ShardDecl> = codes.iter().map(|c| ShardDecl::new(c, c)).collect();
    Arc::new(ShardRegistry::from_lookup(&decls, |key| match key {
        "DB_SERVER" => Some("127.0.0.1".into()),
        "DB_USER" => Some("sa".into()),
        "DB_PASSWORD" => Some("secret".into()),
        k if k.starts_with("DB_NAME_") => Some(format!("Db_{}", &k["DB_NAME_".len()..])),
        _ => None,
    }))
}

pub fn pools(shards: &[MockShard]) -> Arc<PoolManager> {
    let codes: Vec<&str> = shards.iter().map(|s| s.code()).collect();
    let connector = shards
        .iter()
        .cloned()
        .fold(MockConnector::new(), |c, s| c.with(s));
    Arc::new(PoolManager::new(registry(&codes), Arc::new(connector)))
}

pub fn executor(shards: &[MockShard], timeout: Duration) -> ShardExecutor {
    ShardExecutor::new(pools(shards), timeout)
}
