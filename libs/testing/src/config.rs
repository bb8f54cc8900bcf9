//! Run configuration.
//!
//! Values come from three layers, later ones winning:
//! 1. built-in defaults
//! 2. a TOML file named by `ROAST_CONFIG`
//! 3. `ROAST_<FIELD>` environment variables

use std::path::Path;
use std::time::Duration;

use roast_compute::BehaviorSettings;
use roast_id::{FlavorId, ImageId};
use roast_net::IpVersion;
use roast_poll::PollConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_ENV: &str = "ROAST_CONFIG";

/// Prefix of per-field environment overrides.
pub const ENV_PREFIX: &str = "ROAST_";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Settings for a run against a live deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoastConfig {
    /// Compute API base URL.
    pub compute_url: String,

    /// Token sent as `X-Auth-Token`.
    pub auth_token: Option<String>,

    /// Event store base URL; event scenarios need it.
    pub events_url: Option<String>,

    /// Image for servers created by scenarios.
    pub image_ref: Option<ImageId>,

    /// Flavor for servers created by scenarios.
    pub flavor_ref: Option<FlavorId>,

    /// Network whose address scenarios ping.
    pub network_name: String,

    /// IP version of the pinged address.
    pub ip_version: IpVersion,

    /// Prefix for generated server names.
    pub name_prefix: String,

    pub server_status_timeout_secs: u64,
    pub server_status_interval_secs: u64,
    pub ping_timeout_secs: u64,
    pub ping_interval_secs: u64,

    /// Port checked by the remote access check.
    pub ssh_port: u16,

    /// Allowed drift between the server's and the launch record's
    /// `launched_at`.
    pub launched_at_tolerance_secs: u64,

    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl Default for RoastConfig {
    fn default() -> Self {
        Self {
            compute_url: "http://127.0.0.1:8774/v2.1".to_string(),
            auth_token: None,
            events_url: None,
            image_ref: None,
            flavor_ref: None,
            network_name: "public".to_string(),
            ip_version: IpVersion::V4,
            name_prefix: "roast".to_string(),
            server_status_timeout_secs: roast_poll::DEFAULT_STATUS_TIMEOUT.as_secs(),
            server_status_interval_secs: roast_poll::DEFAULT_STATUS_INTERVAL.as_secs(),
            ping_timeout_secs: roast_poll::DEFAULT_PING_TIMEOUT.as_secs(),
            ping_interval_secs: roast_poll::DEFAULT_PING_INTERVAL.as_secs(),
            ssh_port: roast_net::DEFAULT_SSH_PORT,
            launched_at_tolerance_secs: 120,
            request_timeout_secs: 30,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl RoastConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load a TOML file; fields it omits keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Override fields from `ROAST_<FIELD>` variables found through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |field: &str| {
            let key = format!("{ENV_PREFIX}{}", field.to_ascii_uppercase());
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, v)) = var("compute_url") {
            self.compute_url = v;
        }
        if let Some((_, v)) = var("auth_token") {
            self.auth_token = non_empty(v);
        }
        if let Some((_, v)) = var("events_url") {
            self.events_url = non_empty(v);
        }
        if let Some((k, v)) = var("image_ref") {
            self.image_ref = Some(parse_value(&k, &v)?);
        }
        if let Some((k, v)) = var("flavor_ref") {
            self.flavor_ref = Some(parse_value(&k, &v)?);
        }
        if let Some((_, v)) = var("network_name") {
            self.network_name = v;
        }
        if let Some((k, v)) = var("ip_version") {
            let version: u8 = parse_value(&k, &v)?;
            self.ip_version = IpVersion::try_from(version).map_err(|_| {
                ConfigError::InvalidValue {
                    key: k.clone(),
                    value: v.clone(),
                }
            })?;
        }
        if let Some((_, v)) = var("name_prefix") {
            self.name_prefix = v;
        }
        if let Some((k, v)) = var("server_status_timeout_secs") {
            self.server_status_timeout_secs = parse_value(&k, &v)?;
        }
        if let Some((k, v)) = var("server_status_interval_secs") {
            self.server_status_interval_secs = parse_value(&k, &v)?;
        }
        if let Some((k, v)) = var("ping_timeout_secs") {
            self.ping_timeout_secs = parse_value(&k, &v)?;
        }
        if let Some((k, v)) = var("ping_interval_secs") {
            self.ping_interval_secs = parse_value(&k, &v)?;
        }
        if let Some((k, v)) = var("ssh_port") {
            self.ssh_port = parse_value(&k, &v)?;
        }
        if let Some((k, v)) = var("launched_at_tolerance_secs") {
            self.launched_at_tolerance_secs = parse_value(&k, &v)?;
        }
        if let Some((k, v)) = var("request_timeout_secs") {
            self.request_timeout_secs = parse_value(&k, &v)?;
        }
        Ok(())
    }

    /// Timing of server status waits.
    pub fn status_poll(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_secs(self.server_status_timeout_secs),
            Duration::from_secs(self.server_status_interval_secs),
        )
    }

    /// Timing of reachability waits.
    pub fn ping_poll(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_secs(self.ping_timeout_secs),
            Duration::from_secs(self.ping_interval_secs),
        )
    }

    pub fn launched_at_tolerance(&self) -> Duration {
        Duration::from_secs(self.launched_at_tolerance_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings for [`roast_compute::ServerBehaviors`]. Requires the image
    /// and flavor to be configured.
    pub fn behavior_settings(&self) -> Result<BehaviorSettings, ConfigError> {
        Ok(BehaviorSettings {
            status_poll: self.status_poll(),
            image_ref: self
                .image_ref
                .clone()
                .ok_or(ConfigError::Missing("image_ref"))?,
            flavor_ref: self
                .flavor_ref
                .clone()
                .ok_or(ConfigError::Missing("flavor_ref"))?,
            name_prefix: self.name_prefix.clone(),
            network_name: self.network_name.clone(),
            ip_version: self.ip_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RoastConfig::default();
        assert_eq!(config.status_poll().timeout, Duration::from_secs(600));
        assert_eq!(config.ping_poll(), PollConfig::reachability());
        assert_eq!(config.network_name, "public");
        assert_eq!(config.ip_version, IpVersion::V4);
        assert_eq!(config.launched_at_tolerance(), Duration::from_secs(120));
    }

    #[test]
    fn test_toml_keeps_defaults_for_missing_fields() {
        let config = RoastConfig::from_toml(
            r#"
            compute_url = "https://compute.example.test/v2.1"
            image_ref = "img-1"
            flavor_ref = "2"
            ip_version = 6
            server_status_timeout_secs = 900
            "#,
        )
        .unwrap();

        assert_eq!(config.compute_url, "https://compute.example.test/v2.1");
        assert_eq!(config.ip_version, IpVersion::V6);
        assert_eq!(config.server_status_timeout_secs, 900);
        assert_eq!(config.ping_timeout_secs, 60);
        assert_eq!(config.behavior_settings().unwrap().flavor_ref.as_str(), "2");
    }

    #[test]
    fn test_toml_rejects_unknown_fields() {
        assert!(RoastConfig::from_toml("pign_timeout_secs = 3").is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = RoastConfig::from_toml("ping_timeout_secs = 30").unwrap();
        config
            .apply_env(env(&[
                ("ROAST_PING_TIMEOUT_SECS", "45"),
                ("ROAST_AUTH_TOKEN", "tok"),
                ("ROAST_EVENTS_URL", ""),
            ]))
            .unwrap();

        assert_eq!(config.ping_timeout_secs, 45);
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.events_url, None);
    }

    #[test]
    fn test_env_invalid_number() {
        let mut config = RoastConfig::default();
        let err = config
            .apply_env(env(&[("ROAST_SSH_PORT", "seventy")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ROAST_SSH_PORT"));
    }

    #[test]
    fn test_env_invalid_ip_version() {
        let mut config = RoastConfig::default();
        let err = config
            .apply_env(env(&[("ROAST_IP_VERSION", "5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_behavior_settings_require_image() {
        let err = RoastConfig::default().behavior_settings().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("image_ref")));
    }
}
