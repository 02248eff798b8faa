//! In-memory shards for tests. Each [`MockShard`] counts the connects and
//! queries it receives and can be told to fail or stall.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;

use crate::connector::{ConnectionHandle, ShardConnector, ShardSession};
use crate::error::ShardError;
use crate::query::QuerySpec;
use crate::registry::ShardDescriptor;
use crate::row::{RecordSets, Row};

type Responder =
    Arc<dyn Fn(&QuerySpec) -> Result<RecordSets, ShardError> + Send + Sync>;

fn empty_result(_: &QuerySpec) -> Result<RecordSets, ShardError> {
    Ok(vec![vec![]])
}

struct ShardState {
    code: String,
    responder: Mutex<Responder>,
    fail_connect: AtomicBool,
    delay: Mutex<Duration>,
    connects: AtomicUsize,
    queries: AtomicUsize,
    closes: AtomicUsize,
    sessions: Mutex<Vec<Weak<MockSession>>>,
}

#[derive(Clone)]
pub struct MockShard {
    state: Arc<ShardState>,
}

impl MockShard {
    /// A shard answering every query with one empty result set.
    pub fn new(code: &str) -> Self {
        let responder: Responder = Arc::new(empty_result);
        Self {
            state: Arc::new(ShardState {
                code: code.to_ascii_uppercase(),
                responder: Mutex::new(responder),
                fail_connect: AtomicBool::new(false),
                delay: Mutex::new(Duration::ZERO),
                connects: AtomicUsize::new(0),
                queries: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                sessions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn code(&self) -> &str {
        &self.state.code
    }

    /// Answers every query with `rows` as the only result set.
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.with_sets(vec![rows])
    }

    pub fn with_sets(self, sets: RecordSets) -> Self {
        self.respond(move |_| Ok(sets.clone()))
    }

    /// Answers with whatever `f` returns for the query.
    pub fn respond<F>(self, f: F) -> Self
    where
        F: Fn(&QuerySpec) -> Result<RecordSets, ShardError> + Send + Sync + 'static,
    {
        if let Ok(mut responder) = self.state.responder.lock() {
            *responder = Arc::new(f);
        }
        self
    }

    /// Every query fails on the server side.
    pub fn failing_queries(self, message: &str) -> Self {
        let code = self.state.code.clone();
        let message = message.to_string();
        self.respond(move |_| Err(ShardError::query_failed(&code, &message)))
    }

    pub fn refusing_connections(self) -> Self {
        self.set_fail_connect(true);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Sleep applied to every query before answering.
    pub fn set_delay(&self, delay: Duration) {
        if let Ok(mut d) = self.state.delay.lock() {
            *d = delay;
        }
    }

    /// Drops the transport of every open session.
    pub fn disconnect(&self) {
        if let Ok(sessions) = self.state.sessions.lock() {
            for session in sessions.iter().filter_map(Weak::upgrade) {
                session.connected.store(false, Ordering::SeqCst);
            }
        }
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.state.queries.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    fn delay(&self) -> Duration {
        self.state.delay.lock().map(|d| *d).unwrap_or_default()
    }

    fn responder(&self) -> Option<Responder> {
        self.state.responder.lock().ok().map(|r| r.clone())
    }
}

/// Hands out [`MockSession`]s for the shards it was given.
#[derive(Clone, Default)]
pub struct MockConnector {
    shards: HashMap<String, MockShard>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, shard: MockShard) -> Self {
        self.shards.insert(shard.code().to_string(), shard);
        self
    }

    pub fn shard(&self, code: &str) -> Option<&MockShard> {
        self.shards.get(&code.to_ascii_uppercase())
    }
}

#[async_trait]
impl ShardConnector for MockConnector {
    async fn connect(
        &self,
        shard: &ShardDescriptor,
    ) -> Result<ConnectionHandle, ShardError> {
        let mock = self
            .shard(&shard.code)
            .ok_or_else(|| ShardError::unreachable(&shard.code, "no such mock shard"))?;
        mock.state.connects.fetch_add(1, Ordering::SeqCst);
        // let concurrent acquirers pile up on the creation lock
        tokio::task::yield_now().await;
        if mock.state.fail_connect.load(Ordering::SeqCst) {
            return Err(ShardError::unreachable(&shard.code, "connection refused"));
        }
        let session = Arc::new(MockSession {
            shard: mock.clone(),
            connected: AtomicBool::new(true),
        });
        if let Ok(mut sessions) = mock.state.sessions.lock() {
            sessions.push(Arc::downgrade(&session));
        }
        Ok(session)
    }
}

pub struct MockSession {
    shard: MockShard,
    connected: AtomicBool,
}

#[async_trait]
impl ShardSession for MockSession {
    fn shard(&self) -> &str {
        self.shard.code()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn execute(&self, query: &QuerySpec) -> Result<RecordSets, ShardError> {
        self.shard.state.queries.fetch_add(1, Ordering::SeqCst);
        let delay = self.shard.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if !self.is_connected() {
            return Err(ShardError::unreachable(self.shard.code(), "connection reset"));
        }
        let responder = self
            .shard
            .responder()
            .ok_or_else(|| ShardError::PoolError("mock responder poisoned".into()))?;
        responder(query)
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.shard.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}
