use std::time::Duration;
use std::{env, error::Error, fmt::Display, str::FromStr};

use citydash_shard::mssql::PoolConfig;
use citydash_shard::{ConfigError, ShardDecl, parse_shard_decls};
use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "HTTP_PORT", default = "3001")]
    pub http_port: u16,
    #[envconfig(from = "SHARD_TIMEOUT_MS", default = "15000")]
    pub shard_timeout_ms: u64,
    /// `CODE:Display Name` list; order is the order shards are queried in.
    #[envconfig(
        from = "DB_SHARDS",
        default = "QUI:Quito,GYE:Guayaquil,CUE:Cuenca,MAN:Manta"
    )]
    pub shards: String,
    #[envconfig(from = "POOL_MAX_OPEN", default = "10")]
    pub pool_max_open: u64,
    #[envconfig(from = "POOL_MAX_IDLE", default = "2")]
    pub pool_max_idle: u64,
    #[envconfig(from = "POOL_GET_TIMEOUT_MS", default = "10000")]
    pub pool_get_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ParseEnvError {
    pub name: String,
    pub value: String,
}

impl Display for ParseEnvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ParseError {{ name: '{}', value: '{}' }}",
            self.name, self.value
        )
    }
}

impl Error for ParseEnvError {}

fn read_env<T>(name: &str) -> Result<Option<T>, ParseEnvError>
where
    T: FromStr,
{
    match env::var(name) {
        Ok(val) => match val.trim().parse::<T>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(ParseEnvError {
                name: name.to_string(),
                value: val,
            }),
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(os)) => Err(ParseEnvError {
            name: name.to_string(),
            value: format!("non-unicode: {:?}", os),
        }),
    }
}

impl Config {
    /// Like [`Envconfig::init_from_env`], with `PORT` accepted when
    /// `HTTP_PORT` is not set.
    pub fn load_from_env() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut config = Config::init_from_env()?;
        if env::var_os("HTTP_PORT").is_none() {
            if let Some(port) = read_env::<u16>("PORT")? {
                config.http_port = port;
            }
        }
        Ok(config)
    }

    pub fn shard_timeout(&self) -> Duration {
        Duration::from_millis(self.shard_timeout_ms)
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_open: self.pool_max_open,
            max_idle: self.pool_max_idle,
            get_timeout: Duration::from_millis(self.pool_get_timeout_ms),
        }
    }

    pub fn shard_decls(&self) -> Result<Vec<ShardDecl>, ConfigError> {
        parse_shard_decls(&self.shards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(config.http_port, 3001);
        assert_eq!(config.shard_timeout(), Duration::from_secs(15));
        assert_eq!(config.pool_config(), PoolConfig::default());
        let codes: Vec<String> = config
            .shard_decls()
            .unwrap()
            .into_iter()
            .map(|d| d.code)
            .collect();
        assert_eq!(codes, vec!["QUI", "GYE", "CUE", "MAN"]);
    }

    #[test]
    fn overrides() {
        let vars = HashMap::from([
            ("HTTP_PORT".to_string(), "8080".to_string()),
            ("SHARD_TIMEOUT_MS".to_string(), "500".to_string()),
            ("DB_SHARDS".to_string(), "UIO:Quito".to_string()),
        ]);
        let config = Config::init_from_hashmap(&vars).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.shard_timeout(), Duration::from_millis(500));
        assert_eq!(config.shard_decls().unwrap()[0].display_name, "Quito");
    }
}
