//! MQTT telemetry ingestion for Hydrowatch.
//!
//! Subscribes to the sensor gateway topic and hands each decoded JSON
//! object to the shared [`ReadingPipeline`](hydrowatch_pipeline::ReadingPipeline)
//! with source tag `"MQTT"`.

pub mod config;
pub mod error;
pub mod listener;
pub mod payload;
pub mod reconnect;

pub use config::MqttConfig;
pub use error::MqttError;
pub use listener::{IngestQueue, MqttListener};
pub use reconnect::ReconnectConfig;
