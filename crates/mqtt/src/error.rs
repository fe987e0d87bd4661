/// Errors from the MQTT listener.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The message payload is not valid JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload is valid JSON but not an object.
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The client request queue rejected a subscribe.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// The ingest worker has stopped accepting readings.
    #[error("Ingest queue closed")]
    QueueClosed,
}
