use serde::{Deserialize, Serialize};
use tracing::warn;

/// hard ceiling on schedule fan-out
pub const MAX_INSTALLMENT_COUNT: u32 = 120;

/// alert feed page bounds
pub const MIN_ALERT_LIMIT: usize = 1;
pub const MAX_ALERT_LIMIT: usize = 200;
pub const DEFAULT_ALERT_LIMIT: usize = 50;

pub const DEFAULT_IDEMPOTENCY_TTL_SECS: i64 = 3600;
pub const DEFAULT_ALERT_LEAD_DAYS: u32 = 7;
pub const DEFAULT_ALERT_POLL_INTERVAL_SECS: u32 = 60;

/// due-alert feed settings, echoed back to clients with every feed response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSettings {
    pub lead_days: u32,
    pub poll_interval_seconds: u32,
    pub include_overdue: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            lead_days: DEFAULT_ALERT_LEAD_DAYS,
            poll_interval_seconds: DEFAULT_ALERT_POLL_INTERVAL_SECS,
            include_overdue: true,
        }
    }
}

/// engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub idempotency_ttl_secs: i64,
    pub alerts: AlertSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_secs: DEFAULT_IDEMPOTENCY_TTL_SECS,
            alerts: AlertSettings::default(),
        }
    }
}

impl EngineConfig {
    /// read configuration from the environment, falling back to defaults
    ///
    /// Recognized variables: IDEMPOTENCY_TTL_SECONDS, ALERT_LEAD_DAYS,
    /// ALERT_POLL_INTERVAL_SECONDS, ALERT_INCLUDE_OVERDUE. Malformed values
    /// are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ttl) = read_env_parsed::<i64>("IDEMPOTENCY_TTL_SECONDS") {
            if ttl > 0 {
                config.idempotency_ttl_secs = ttl;
            } else {
                warn!(ttl, "ignoring non-positive IDEMPOTENCY_TTL_SECONDS");
            }
        }
        if let Some(days) = read_env_parsed::<u32>("ALERT_LEAD_DAYS") {
            config.alerts.lead_days = days;
        }
        if let Some(secs) = read_env_parsed::<u32>("ALERT_POLL_INTERVAL_SECONDS") {
            config.alerts.poll_interval_seconds = secs;
        }
        if let Some(flag) = read_env_parsed::<bool>("ALERT_INCLUDE_OVERDUE") {
            config.alerts.include_overdue = flag;
        }

        config
    }
}

fn read_env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}
