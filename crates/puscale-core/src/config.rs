//! Request payload, daemon config file, and environment overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::types::*;

/// Environment variable overriding the scale-down cooldown, in minutes.
pub const COOLDOWN_ENV: &str = "RESIZE_INTERVAL_MINUTES";

/// Default trailing window over which utilization is averaged.
pub const DEFAULT_UTILIZATION_WINDOW: Duration = Duration::from_secs(5 * 60);

/// JSON body of a scaling request.
///
/// Fields are optional at the serde level so that a missing field is
/// reported as [`ConfigError::MissingField`] rather than a decode error.
/// A zero is treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleRequest {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub pu_step: Option<u32>,
    #[serde(default)]
    pub pu_min: Option<u32>,
    #[serde(default)]
    pub pu_max: Option<u32>,
    #[serde(default)]
    pub scale_up_threshold: Option<f64>,
    #[serde(default)]
    pub scale_down_threshold: Option<f64>,
}

impl ScaleRequest {
    /// Validate the request and split it into the target and its policy.
    pub fn into_policy(self, cooldown: Duration) -> ConfigResult<(ResourceId, ScalingPolicy)> {
        let project = required_str(self.project, "project")?;
        let instance = required_str(self.instance, "instance")?;
        let step = required_units(self.pu_step, "puStep")?;
        let min = required_units(self.pu_min, "puMin")?;
        let max = required_units(self.pu_max, "puMax")?;

        let policy = ScalingPolicy::new(
            step,
            min,
            max,
            threshold_or(self.scale_up_threshold, DEFAULT_SCALE_UP_THRESHOLD),
            threshold_or(self.scale_down_threshold, DEFAULT_SCALE_DOWN_THRESHOLD),
            cooldown,
        )?;

        Ok((ResourceId::new(project, instance), policy))
    }
}

fn required_str(value: Option<String>, field: &'static str) -> ConfigResult<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ConfigError::MissingField(field)),
    }
}

fn required_units(value: Option<u32>, field: &'static str) -> ConfigResult<u32> {
    match value {
        Some(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::MissingField(field)),
    }
}

fn threshold_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 => v,
        _ => default,
    }
}

/// Resolve the cooldown from a raw `RESIZE_INTERVAL_MINUTES` value.
///
/// An unparsable value is logged and replaced by `fallback`.
pub fn cooldown_from_minutes(raw: Option<&str>, fallback: Duration) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return fallback;
    };
    match raw.parse::<u64>() {
        Ok(mins) => Duration::from_secs(mins.saturating_mul(60)),
        Err(e) => {
            warn!(
                var = COOLDOWN_ENV,
                value = %raw,
                error = %e,
                fallback_secs = fallback.as_secs(),
                "invalid cooldown override, using fallback"
            );
            fallback
        }
    }
}

/// Read the cooldown override from the process environment.
pub fn cooldown_from_env(fallback: Duration) -> Duration {
    let raw = std::env::var(COOLDOWN_ENV).ok();
    cooldown_from_minutes(raw.as_deref(), fallback)
}

/// Parse a duration string like "30s", "5m" or a bare number of seconds.
pub fn parse_duration(s: &str) -> ConfigResult<Duration> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());
    if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .map(|m| Duration::from_secs(m.saturating_mul(60)))
            .map_err(|_| invalid())
    } else {
        s.parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    }
}

/// Daemon configuration file (puscaled.toml). Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scaling: ScalingDefaults,
    #[serde(default)]
    pub resources: Vec<SeedResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Deadline applied to each collaborator call.
    pub request_timeout: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            request_timeout: "30s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalingDefaults {
    pub utilization_window: Option<String>,
    pub cooldown_minutes: Option<u64>,
}

/// A resource preloaded into the in-memory fleet in standalone mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResource {
    pub project: String,
    pub instance: String,
    pub units: u32,
    pub utilization: Option<f64>,
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        content.parse()
    }

    pub fn request_timeout(&self) -> ConfigResult<Duration> {
        parse_duration(&self.server.request_timeout)
    }

    pub fn utilization_window(&self) -> ConfigResult<Duration> {
        match &self.scaling.utilization_window {
            Some(w) => parse_duration(w),
            None => Ok(DEFAULT_UTILIZATION_WINDOW),
        }
    }

    /// Cooldown from the file, then overridden by `RESIZE_INTERVAL_MINUTES`.
    pub fn cooldown(&self) -> Duration {
        let file_value = self
            .scaling
            .cooldown_minutes
            .map(|m| Duration::from_secs(m.saturating_mul(60)))
            .unwrap_or(DEFAULT_COOLDOWN);
        cooldown_from_env(file_value)
    }
}

impl std::str::FromStr for DaemonConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> ScaleRequest {
        serde_json::from_str(
            r#"{
                "project": "acme",
                "instance": "orders",
                "puStep": 100,
                "puMin": 100,
                "puMax": 1000,
                "scaleUpThreshold": 65.0,
                "scaleDownThreshold": 20.0
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parse_camel_case_request() {
        let (id, policy) = full_request().into_policy(DEFAULT_COOLDOWN).unwrap();
        assert_eq!(id, ResourceId::new("acme", "orders"));
        assert_eq!(policy.step, 100);
        assert_eq!(policy.min_units, 100);
        assert_eq!(policy.max_units, 1000);
        assert_eq!(policy.scale_up_threshold, 65.0);
        assert_eq!(policy.scale_down_threshold, 20.0);
        assert_eq!(policy.cooldown, DEFAULT_COOLDOWN);
    }

    #[test]
    fn thresholds_default_when_absent_or_zero() {
        let mut req = full_request();
        req.scale_up_threshold = None;
        req.scale_down_threshold = Some(0.0);
        let (_, policy) = req.into_policy(DEFAULT_COOLDOWN).unwrap();
        assert_eq!(policy.scale_up_threshold, DEFAULT_SCALE_UP_THRESHOLD);
        assert_eq!(policy.scale_down_threshold, DEFAULT_SCALE_DOWN_THRESHOLD);
    }

    #[test]
    fn missing_fields_rejected() {
        let mut req = full_request();
        req.instance = Some(String::new());
        assert_eq!(
            req.into_policy(DEFAULT_COOLDOWN).unwrap_err(),
            ConfigError::MissingField("instance")
        );

        let mut req = full_request();
        req.pu_max = Some(0);
        assert_eq!(
            req.into_policy(DEFAULT_COOLDOWN).unwrap_err(),
            ConfigError::MissingField("puMax")
        );

        let req: ScaleRequest = serde_json::from_str(r#"{"project": "acme"}"#).unwrap();
        assert_eq!(
            req.into_policy(DEFAULT_COOLDOWN).unwrap_err(),
            ConfigError::MissingField("instance")
        );
    }

    #[test]
    fn cooldown_override_values() {
        let fallback = Duration::from_secs(600);
        assert_eq!(cooldown_from_minutes(None, fallback), fallback);
        assert_eq!(cooldown_from_minutes(Some(""), fallback), fallback);
        assert_eq!(
            cooldown_from_minutes(Some("45"), fallback),
            Duration::from_secs(45 * 60)
        );
        assert_eq!(cooldown_from_minutes(Some("0"), fallback), Duration::ZERO);
        assert_eq!(cooldown_from_minutes(Some("soon"), fallback), fallback);
        assert_eq!(cooldown_from_minutes(Some("-5"), fallback), fallback);
    }

    #[test]
    fn parse_duration_values() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("12").unwrap(), Duration::from_secs(12));
        assert!(matches!(
            parse_duration("soon"),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn parse_daemon_config() {
        let config: DaemonConfig = r#"
[server]
port = 9090
request_timeout = "10s"

[scaling]
utilization_window = "10m"
cooldown_minutes = 15

[[resources]]
project = "acme"
instance = "orders"
units = 500
utilization = 80.0
"#
        .parse()
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(config.utilization_window().unwrap(), Duration::from_secs(600));
        assert_eq!(config.scaling.cooldown_minutes, Some(15));
        assert_eq!(config.resources.len(), 1);
        assert_eq!(config.resources[0].units, 500);
    }

    #[test]
    fn empty_daemon_config_uses_defaults() {
        let config: DaemonConfig = "".parse().unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.utilization_window().unwrap(), DEFAULT_UTILIZATION_WINDOW);
        assert!(config.resources.is_empty());
    }

    #[test]
    fn partial_server_section_keeps_defaults() {
        let config: DaemonConfig = "[server]\nport = 9000".parse().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout, "30s");
    }

    #[test]
    fn malformed_daemon_config_rejected() {
        let err = "[server]\nport = \"eighty\"".parse::<DaemonConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
