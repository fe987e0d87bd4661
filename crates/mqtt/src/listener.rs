//! Broker subscription feeding telemetry into the reading pipeline.
//!
//! [`MqttListener::run`] owns the `rumqttc` event loop. Publishes are
//! decoded and queued through an [`IngestQueue`] to a single worker task that calls
//! [`ReadingPipeline::process`] in arrival order, so a slow reading never
//! stalls keep-alives. Broker errors are retried with exponential backoff
//! until the [`CancellationToken`] fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hydrowatch_pipeline::ReadingPipeline;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::payload::decode_payload;
use crate::reconnect::{Backoff, ReconnectConfig};

/// Source tag attached to readings received over MQTT.
pub const SOURCE: &str = "MQTT";

/// Outstanding requests buffered in the `rumqttc` client.
const CLIENT_CAPACITY: usize = 10;

/// Decoded readings waiting for the pipeline.
const QUEUE_CAPACITY: usize = 64;

pub struct MqttListener {
    config: MqttConfig,
    pipeline: Arc<ReadingPipeline>,
    connected: Arc<AtomicBool>,
    reconnect: ReconnectConfig,
}

impl MqttListener {
    pub fn new(config: MqttConfig, pipeline: Arc<ReadingPipeline>) -> Self {
        Self {
            config,
            pipeline,
            connected: Arc::new(AtomicBool::new(false)),
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Shared flag that is `true` while the broker session is up.
    pub fn connected_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }

    /// Run until `cancel` fires, then drain queued readings and return.
    pub async fn run(self, cancel: CancellationToken) {
        let queue = IngestQueue::spawn(Arc::clone(&self.pipeline));

        self.poll_broker(&queue, &cancel).await;
        self.connected.store(false, Ordering::SeqCst);

        queue.close().await;
        tracing::info!("MQTT listener stopped");
    }

    async fn poll_broker(&self, queue: &IngestQueue, cancel: &CancellationToken) {
        let mut options = MqttOptions::new(&self.config.client_id, &self.config.host, self.config.port);
        options.set_keep_alive(self.config.keep_alive);
        let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);
        let mut backoff = Backoff::new(self.reconnect.clone());

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            topic = %self.config.topic,
            "Connecting to MQTT broker"
        );

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = eventloop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    backoff.reset();
                    self.connected.store(true, Ordering::SeqCst);
                    match client
                        .try_subscribe(self.config.topic.as_str(), QoS::AtLeastOnce)
                        .map_err(MqttError::from)
                    {
                        Ok(()) => tracing::info!(topic = %self.config.topic, "Subscribed to telemetry"),
                        Err(e) => tracing::error!(error = %e, "Failed to subscribe to telemetry"),
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match queue.push(&publish.payload).await {
                        Ok(()) => {}
                        Err(MqttError::QueueClosed) => {
                            tracing::error!("MQTT ingest worker stopped, leaving broker loop");
                            break;
                        }
                        Err(e) => tracing::warn!(
                            topic = %publish.topic,
                            error = %e,
                            "Discarding undecodable telemetry message"
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    self.connected.store(false, Ordering::SeqCst);
                    let wait = backoff.next_wait();
                    tracing::warn!(
                        error = %e,
                        attempt = backoff.attempt(),
                        delay_ms = wait.as_millis() as u64,
                        "MQTT connection error, retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }

        if let Err(e) = client.try_disconnect() {
            tracing::debug!(error = %e, "MQTT disconnect not sent");
        }
    }
}

/// Ordered hand-off from the broker event loop to the pipeline.
///
/// Messages are decoded on [`push`](Self::push) and processed by a single
/// worker task in the order they were pushed.
pub struct IngestQueue {
    tx: mpsc::Sender<Map<String, Value>>,
    worker: JoinHandle<()>,
}

impl IngestQueue {
    pub fn spawn(pipeline: Arc<ReadingPipeline>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let worker = tokio::spawn(process_queue(pipeline, rx));
        Self { tx, worker }
    }

    /// Decode one raw message and queue it for the pipeline.
    ///
    /// Waits while the queue is full. Undecodable messages are returned as
    /// errors and never reach the pipeline.
    pub async fn push(&self, bytes: &[u8]) -> Result<(), MqttError> {
        let payload = decode_payload(bytes)?;
        self.tx
            .send(payload)
            .await
            .map_err(|_| MqttError::QueueClosed)
    }

    /// Stop accepting messages and wait until every queued reading has been
    /// processed.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "MQTT ingest worker panicked");
        }
    }
}

async fn process_queue(pipeline: Arc<ReadingPipeline>, mut rx: mpsc::Receiver<Map<String, Value>>) {
    while let Some(payload) = rx.recv().await {
        // Rejections are logged by the pipeline.
        let _ = pipeline.process(&payload, SOURCE).await;
    }
}
