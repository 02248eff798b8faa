use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthCheck {
    fn with_status(status: HealthStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(HealthStatus::Healthy, None)
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Unhealthy, Some(message.into()))
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Unknown, Some(message.into()))
    }
}

/// Named checks and the status they add up to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: BTreeMap<String, HealthCheck>,
}

impl HealthReport {
    /// Unhealthy if any check is; unknown when there is nothing to check.
    pub fn from_checks(checks: impl IntoIterator<Item = (String, HealthCheck)>) -> Self {
        let checks: BTreeMap<_, _> = checks.into_iter().collect();
        let status = if checks.is_empty() {
            HealthStatus::Unknown
        } else if checks.values().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        };
        Self { status, checks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_status() {
        assert_eq!(HealthReport::from_checks([]).status, HealthStatus::Unknown);

        let report = HealthReport::from_checks([
            ("QUI".to_string(), HealthCheck::healthy()),
            ("GYE".to_string(), HealthCheck::unknown("no session yet")),
        ]);
        assert_eq!(report.status, HealthStatus::Healthy);

        let report = HealthReport::from_checks([
            ("QUI".to_string(), HealthCheck::healthy()),
            ("GYE".to_string(), HealthCheck::unhealthy("disconnected")),
        ]);
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }
}
