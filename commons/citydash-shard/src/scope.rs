use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const ALL_SHARDS: &str = "ALL";

/// The set of shards an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Shard(String),
}

impl Scope {
    /// A missing or blank value means every shard.
    pub fn parse(value: Option<&str>) -> Scope {
        match value {
            Some(v) => v.parse().unwrap_or(Scope::All),
            None => Scope::All,
        }
    }

    pub fn shard(code: impl Into<String>) -> Scope {
        Scope::Shard(code.into().trim().to_ascii_uppercase())
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Scope::Shard(_))
    }

    /// The named shard, or `None` for all shards.
    pub fn shard_code(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Shard(code) => Some(code),
        }
    }
}

impl FromStr for Scope {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL_SHARDS) {
            Ok(Scope::All)
        } else {
            Ok(Scope::shard(s))
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str(ALL_SHARDS),
            Scope::Shard(code) => f.write_str(code),
        }
    }
}
