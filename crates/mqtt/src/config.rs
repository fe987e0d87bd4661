use std::time::Duration;

/// Default broker port (plain TCP).
const DEFAULT_PORT: u16 = 1883;

/// Topic the sensor gateway publishes telemetry on.
pub const DEFAULT_TOPIC: &str = "water_quality/telemetry";

const DEFAULT_CLIENT_ID: &str = "hydrowatch-backend";

const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub keep_alive: Duration,
}

impl MqttConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `MQTT_HOST` is not set, in which case no listener
    /// is started.
    ///
    /// | Variable               | Required | Default                   |
    /// |------------------------|----------|---------------------------|
    /// | `MQTT_HOST`            | yes      |                           |
    /// | `MQTT_PORT`            | no       | `1883`                    |
    /// | `MQTT_TOPIC`           | no       | `water_quality/telemetry` |
    /// | `MQTT_CLIENT_ID`       | no       | `hydrowatch-backend`      |
    /// | `MQTT_KEEP_ALIVE_SECS` | no       | `60`                      |
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("MQTT_HOST").ok().filter(|h| !h.trim().is_empty())?;
        Some(Self {
            host,
            port: std::env::var("MQTT_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            topic: std::env::var("MQTT_TOPIC").unwrap_or_else(|_| DEFAULT_TOPIC.to_string()),
            client_id: std::env::var("MQTT_CLIENT_ID")
                .unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string()),
            keep_alive: Duration::from_secs(
                std::env::var("MQTT_KEEP_ALIVE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_KEEP_ALIVE_SECS),
            ),
        })
    }

    /// Settings for `host` with every other field at its default.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            topic: DEFAULT_TOPIC.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
        }
    }
}
