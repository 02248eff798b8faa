use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "citydash".to_string(),
            log_level: "info".to_string(),
            json_format: false,
        }
    }
}

impl TracingConfig {
    /// Reads `LOG_LEVEL` and `LOG_FORMAT` (`json` or `text`).
    /// `RUST_LOG`, when set, still wins over `LOG_LEVEL` at setup.
    pub fn from_env(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            log_level: lookup("LOG_LEVEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            json_format: lookup("LOG_FORMAT")
                .map(|v| v.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_format),
        }
    }
}

pub fn setup_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let fmt_layer = if config.json_format {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TracingError::Filter(e.to_string()))?;

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::Setup(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_format,
        "tracing initialized"
    );
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing setup error: {0}")]
    Setup(String),
    #[error("Invalid log filter: {0}")]
    Filter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_level_and_format() {
        let config = TracingConfig::from_lookup("gw", |key| match key {
            "LOG_LEVEL" => Some("debug".into()),
            "LOG_FORMAT" => Some("JSON".into()),
            _ => None,
        });
        assert_eq!(config.service_name, "gw");
        assert_eq!(config.log_level, "debug");
        assert!(config.json_format);

        let config = TracingConfig::from_lookup("gw", |_| None);
        assert_eq!(config.log_level, "info");
        assert!(!config.json_format);
    }

    #[test]
    fn second_setup_is_rejected() {
        let config = TracingConfig::from_lookup("citydash-test", |_| None);
        assert!(setup_tracing(config.clone()).is_ok());
        assert!(matches!(setup_tracing(config), Err(TracingError::Setup(_))));
    }
}
