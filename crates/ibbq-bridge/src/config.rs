//! Bridge configuration, sourced from the environment once at startup.

use std::time::Duration;

use thiserror::Error;

use ibbq_types::TempUnit;

/// Device address environment variable.
pub const ENV_DEVICE_ADDRESS: &str = "IBBQ_DEVICE_ADDRESS";
/// Temperature unit environment variable (`c` or `f`).
pub const ENV_TEMP_UNITS: &str = "IBBQ_TEMP_UNITS";
/// MQTT broker host environment variable.
pub const ENV_MQTT_HOST: &str = "IBBQ_MQTT_HOST";
/// MQTT broker port environment variable.
pub const ENV_MQTT_PORT: &str = "IBBQ_MQTT_PORT";
/// MQTT username environment variable.
pub const ENV_MQTT_USERNAME: &str = "IBBQ_MQTT_USERNAME";
/// MQTT password environment variable.
pub const ENV_MQTT_PASSWORD: &str = "IBBQ_MQTT_PASSWORD";
/// Upload period environment variable, in seconds.
pub const ENV_UPLOAD_PERIOD: &str = "IBBQ_UPLOAD_PERIOD";

/// Default MQTT broker port.
const DEFAULT_MQTT_PORT: u16 = 1883;

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// BLE address of the thermometer.
    pub device_address: String,
    /// Display unit for published temperatures.
    pub units: TempUnit,
    /// Period between reading uploads.
    pub upload_period: Duration,
    /// MQTT broker settings.
    pub mqtt: MqttConfig,
}

/// MQTT broker settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Broker username; also the root of the feed path.
    pub username: String,
    /// Broker password.
    pub password: String,
}

impl MqttConfig {
    /// The per-deployment topic root all bridge topics live under.
    pub fn feed_path(&self) -> String {
        format!("{}/feeds/ibbq", self.username)
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Malformed values fail immediately; *missing* required values are
    /// caught by [`validate`](Self::validate) so CLI overrides get a chance
    /// to fill them in first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let units = match lookup(ENV_TEMP_UNITS) {
            Some(raw) => raw.parse().map_err(|e: ibbq_types::UnknownUnit| {
                ConfigError::Invalid {
                    var: ENV_TEMP_UNITS,
                    message: e.to_string(),
                }
            })?,
            None => TempUnit::default(),
        };

        let upload_period = match lookup(ENV_UPLOAD_PERIOD) {
            Some(raw) => {
                let seconds = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    var: ENV_UPLOAD_PERIOD,
                    message: format!("'{}' is not a whole number of seconds", raw),
                })?;
                if seconds == 0 {
                    return Err(ConfigError::Invalid {
                        var: ENV_UPLOAD_PERIOD,
                        message: "upload period must be at least 1 second".to_string(),
                    });
                }
                Duration::from_secs(seconds)
            }
            None => Duration::ZERO,
        };

        let port = match lookup(ENV_MQTT_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: ENV_MQTT_PORT,
                message: format!("'{}' is not a valid port", raw),
            })?,
            None => DEFAULT_MQTT_PORT,
        };

        Ok(Self {
            device_address: lookup(ENV_DEVICE_ADDRESS).unwrap_or_default(),
            units,
            upload_period,
            mqtt: MqttConfig {
                host: lookup(ENV_MQTT_HOST).unwrap_or_default(),
                port,
                username: lookup(ENV_MQTT_USERNAME).unwrap_or_default(),
                password: lookup(ENV_MQTT_PASSWORD).unwrap_or_default(),
            },
        })
    }

    /// Check that every required value is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_address.is_empty() {
            return Err(ConfigError::Missing(ENV_DEVICE_ADDRESS));
        }
        if self.mqtt.host.is_empty() {
            return Err(ConfigError::Missing(ENV_MQTT_HOST));
        }
        if self.upload_period.is_zero() {
            return Err(ConfigError::Missing(ENV_UPLOAD_PERIOD));
        }
        Ok(())
    }
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable was not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable was set to something unusable.
    #[error("invalid value for {var}: {message}")]
    Invalid {
        /// The offending variable.
        var: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_DEVICE_ADDRESS, "AA:BB:CC:DD:EE:FF"),
            (ENV_TEMP_UNITS, "c"),
            (ENV_MQTT_HOST, "broker.local"),
            (ENV_MQTT_PORT, "8883"),
            (ENV_MQTT_USERNAME, "pitmaster"),
            (ENV_MQTT_PASSWORD, "secret"),
            (ENV_UPLOAD_PERIOD, "30"),
        ]
    }

    #[test]
    fn test_full_configuration_parses() {
        let config = Config::from_lookup(lookup_from(&full_env())).unwrap();
        config.validate().unwrap();

        assert_eq!(config.device_address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(config.units, TempUnit::Celsius);
        assert_eq!(config.upload_period, Duration::from_secs(30));
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_DEVICE_ADDRESS, "AA:BB:CC:DD:EE:FF"),
            (ENV_MQTT_HOST, "broker.local"),
            (ENV_UPLOAD_PERIOD, "60"),
        ]))
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.units, TempUnit::Fahrenheit);
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.username, "");
    }

    #[test]
    fn test_missing_address_fails_validation() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_MQTT_HOST, "broker.local"),
            (ENV_UPLOAD_PERIOD, "60"),
        ]))
        .unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing(ENV_DEVICE_ADDRESS))
        );
    }

    #[test]
    fn test_missing_period_fails_validation() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_DEVICE_ADDRESS, "AA:BB:CC:DD:EE:FF"),
            (ENV_MQTT_HOST, "broker.local"),
        ]))
        .unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing(ENV_UPLOAD_PERIOD))
        );
    }

    #[test]
    fn test_zero_period_is_rejected_at_parse_time() {
        let mut env = full_env();
        env.retain(|(k, _)| *k != ENV_UPLOAD_PERIOD);
        env.push((ENV_UPLOAD_PERIOD, "0"));
        assert!(Config::from_lookup(lookup_from(&env)).is_err());
    }

    #[test]
    fn test_bad_unit_is_rejected() {
        let mut env = full_env();
        env.retain(|(k, _)| *k != ENV_TEMP_UNITS);
        env.push((ENV_TEMP_UNITS, "kelvin"));
        let err = Config::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: ENV_TEMP_UNITS,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut env = full_env();
        env.retain(|(k, _)| *k != ENV_MQTT_PORT);
        env.push((ENV_MQTT_PORT, "70000"));
        assert!(Config::from_lookup(lookup_from(&env)).is_err());
    }

    #[test]
    fn test_feed_path_roots_at_the_username() {
        let config = Config::from_lookup(lookup_from(&full_env())).unwrap();
        assert_eq!(config.mqtt.feed_path(), "pitmaster/feeds/ibbq");
    }
}
