use std::fmt;

use tracing::{info, warn};

use crate::error::{ConfigError, ShardError};

pub const DEFAULT_TDS_PORT: u16 = 1433;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsOptions {
    pub encrypt: bool,
    pub trust_server_certificate: bool,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            encrypt: true,
            trust_server_certificate: true,
        }
    }
}

/// Connection parameters of one city database.
#[derive(Clone, PartialEq, Eq)]
pub struct ShardDescriptor {
    pub code: String,
    pub display_name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub tls: TlsOptions,
}

impl fmt::Debug for ShardDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardDescriptor")
            .field("code", &self.code)
            .field("display_name", &self.display_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("tls", &self.tls)
            .finish()
    }
}

/// A shard named in configuration before its connection parameters are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardDecl {
    pub code: String,
    pub display_name: String,
}

impl ShardDecl {
    pub fn new(code: &str, display_name: &str) -> Self {
        Self {
            code: code.trim().to_ascii_uppercase(),
            display_name: display_name.trim().to_string(),
        }
    }
}

/// Parses `"QUI:Quito,GYE:Guayaquil"`. A bare code uses itself as display name.
pub fn parse_shard_decls(input: &str) -> Result<Vec<ShardDecl>, ConfigError> {
    let mut decls: Vec<ShardDecl> = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (code, name) = match part.split_once(':') {
            Some((code, name)) => (code.trim(), name.trim()),
            None => (part, part),
        };
        if code.is_empty()
            || name.is_empty()
            || !code.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::InvalidShardDecl(part.to_string()));
        }
        let decl = ShardDecl::new(code, name);
        if decls.iter().any(|d| d.code == decl.code) {
            return Err(ConfigError::DuplicateShard(decl.code));
        }
        decls.push(decl);
    }
    Ok(decls)
}

/// Immutable set of configured shards, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ShardRegistry {
    shards: Vec<ShardDescriptor>,
}

impl ShardRegistry {
    pub fn new(shards: Vec<ShardDescriptor>) -> Self {
        let mut kept: Vec<ShardDescriptor> = Vec::with_capacity(shards.len());
        for mut shard in shards {
            shard.code = shard.code.to_ascii_uppercase();
            if kept.iter().any(|s| s.code == shard.code) {
                warn!(shard = %shard.code, "ignoring duplicate shard descriptor");
                continue;
            }
            kept.push(shard);
        }
        Self { shards: kept }
    }

    /// Resolves connection parameters for every declared shard through `lookup`.
    ///
    /// Per-shard keys (`DB_<CODE>_SERVER`, ...) win over the shared ones
    /// (`DB_SERVER`, ...). The database name is read from `DB_<CODE>_NAME`
    /// or `DB_NAME_<DISPLAY NAME>`. A shard missing any required parameter
    /// is left out of the registry.
    pub fn from_lookup<F>(decls: &[ShardDecl], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let shared_tls = TlsOptions {
            encrypt: get("DB_ENCRYPT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            trust_server_certificate: get("DB_TRUST_SERVER_CERTIFICATE")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        };

        let mut shards = Vec::with_capacity(decls.len());
        for decl in decls {
            let code = &decl.code;
            let scoped = |field: &str, shared: &str| {
                get(&format!("DB_{code}_{field}")).or_else(|| get(shared))
            };
            let database = get(&format!("DB_{code}_NAME")).or_else(|| {
                get(&format!("DB_NAME_{}", env_suffix(&decl.display_name)))
            });

            let required = [
                ("host", scoped("SERVER", "DB_SERVER")),
                ("user", scoped("USER", "DB_USER")),
                ("password", scoped("PASSWORD", "DB_PASSWORD")),
                ("database", database),
            ];
            if let Some((missing, _)) =
                required.iter().find(|(_, value)| value.is_none())
            {
                warn!(
                    shard = %code,
                    missing = *missing,
                    "excluding shard with incomplete connection parameters"
                );
                continue;
            }
            let [host, user, password, database] =
                required.map(|(_, value)| value.unwrap_or_default());

            let port = match scoped("PORT", "DB_PORT") {
                None => DEFAULT_TDS_PORT,
                Some(raw) => match raw.trim().parse::<u16>() {
                    Ok(port) => port,
                    Err(_) => {
                        warn!(shard = %code, port = %raw, "excluding shard with invalid port");
                        continue;
                    }
                },
            };

            shards.push(ShardDescriptor {
                code: code.clone(),
                display_name: decl.display_name.clone(),
                host,
                port,
                user,
                password,
                database,
                tls: shared_tls,
            });
        }
        let registry = Self::new(shards);
        info!(shards = ?registry.codes().collect::<Vec<_>>(), "shard registry loaded");
        registry
    }

    pub fn from_env(decls: &[ShardDecl]) -> Self {
        Self::from_lookup(decls, |key| std::env::var(key).ok())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.shards.iter().map(|s| s.code.as_str())
    }

    pub fn describe(&self, code: &str) -> Result<&ShardDescriptor, ShardError> {
        self.shards
            .iter()
            .find(|s| s.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| ShardError::UnknownShard(code.to_string()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShardDescriptor> {
        self.shards.iter()
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_suffix(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn cities() -> Vec<ShardDecl> {
        parse_shard_decls("QUI:Quito,GYE:Guayaquil,CUE:Cuenca").unwrap()
    }

    #[test]
    fn parses_declarations_in_order() {
        let decls = parse_shard_decls(" qui:Quito, GYE , MAN:Manta ").unwrap();
        assert_eq!(
            decls,
            vec![
                ShardDecl::new("QUI", "Quito"),
                ShardDecl::new("GYE", "GYE"),
                ShardDecl::new("MAN", "Manta"),
            ]
        );
    }

    #[test]
    fn rejects_bad_or_duplicate_declarations() {
        assert_eq!(
            parse_shard_decls("QUI:Quito,qui:Again"),
            Err(ConfigError::DuplicateShard("QUI".into()))
        );
        assert!(matches!(
            parse_shard_decls(":Nowhere"),
            Err(ConfigError::InvalidShardDecl(_))
        ));
    }

    #[test]
    fn shared_parameters_with_per_city_database() {
        let registry = ShardRegistry::from_lookup(
            &cities(),
            lookup(&[
                ("DB_SERVER", "sql.local"),
                ("DB_USER", "sa"),
                ("DB_PASSWORD", "secret"),
                ("DB_NAME_QUITO", "erp_quito"),
                ("DB_NAME_GUAYAQUIL", "erp_gye"),
                ("DB_CUE_NAME", "erp_cuenca"),
                ("DB_CUE_SERVER", "cuenca.local"),
                ("DB_CUE_PORT", "14330"),
                ("DB_ENCRYPT", "false"),
            ]),
        );
        assert_eq!(registry.codes().collect::<Vec<_>>(), ["QUI", "GYE", "CUE"]);

        let qui = registry.describe("qui").unwrap();
        assert_eq!(qui.host, "sql.local");
        assert_eq!(qui.database, "erp_quito");
        assert_eq!(qui.port, DEFAULT_TDS_PORT);
        assert!(!qui.tls.encrypt);
        assert!(qui.tls.trust_server_certificate);

        let cue = registry.describe("CUE").unwrap();
        assert_eq!(cue.host, "cuenca.local");
        assert_eq!(cue.port, 14330);
        assert_eq!(cue.database, "erp_cuenca");
    }

    #[test]
    fn incomplete_shard_is_absent() {
        let registry = ShardRegistry::from_lookup(
            &cities(),
            lookup(&[
                ("DB_SERVER", "sql.local"),
                ("DB_USER", "sa"),
                ("DB_PASSWORD", "secret"),
                ("DB_NAME_QUITO", "erp_quito"),
                ("DB_NAME_GUAYAQUIL", "  "),
                ("DB_NAME_CUENCA", "erp_cuenca"),
                ("DB_CUE_PORT", "not-a-port"),
            ]),
        );
        assert_eq!(registry.codes().collect::<Vec<_>>(), ["QUI"]);
        assert!(matches!(
            registry.describe("GYE"),
            Err(ShardError::UnknownShard(code)) if code == "GYE"
        ));
    }

    #[test]
    fn debug_hides_password() {
        let registry = ShardRegistry::from_lookup(
            &cities()[..1],
            lookup(&[
                ("DB_SERVER", "sql.local"),
                ("DB_USER", "sa"),
                ("DB_PASSWORD", "hunter2"),
                ("DB_NAME_QUITO", "erp_quito"),
            ]),
        );
        let printed = format!("{:?}", registry.describe("QUI").unwrap());
        assert!(!printed.contains("hunter2"));
    }
}
