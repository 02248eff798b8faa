use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use crate::error::ShardError;
use crate::mssql::classify;
use crate::registry::ShardDescriptor;

pub type TdsClient = Client<Compat<TcpStream>>;

/// mobc manager opening TDS connections to one shard.
pub struct TdsManager {
    code: String,
    config: Config,
}

impl TdsManager {
    pub fn new(shard: &ShardDescriptor) -> Self {
        let mut config = Config::new();
        config.host(&shard.host);
        config.port(shard.port);
        config.database(&shard.database);
        config.application_name("citydash");
        config.authentication(AuthMethod::sql_server(&shard.user, &shard.password));
        config.encryption(if shard.tls.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::NotSupported
        });
        if shard.tls.trust_server_certificate {
            config.trust_cert();
        }
        Self {
            code: shard.code.clone(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl mobc::Manager for TdsManager {
    type Connection = TdsClient;

    type Error = ShardError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let tcp = TcpStream::connect(self.config.get_addr())
            .await
            .map_err(|e| ShardError::unreachable(&self.code, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| ShardError::unreachable(&self.code, e))?;
        let client = Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| ShardError::unreachable(&self.code, e))?;
        debug!(shard = %self.code, "opened TDS connection");
        Ok(client)
    }

    async fn check(
        &self,
        mut conn: Self::Connection,
    ) -> Result<Self::Connection, Self::Error> {
        conn.simple_query("SELECT 1")
            .await
            .map_err(|e| classify(&self.code, e))?
            .into_row()
            .await
            .map_err(|e| classify(&self.code, e))?;
        Ok(conn)
    }
}
