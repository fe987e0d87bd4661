//! `GET /api/v1/ws` against a bound server with a real WebSocket client.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use futures::StreamExt;
use hydrowatch_events::BroadcastHub;
use hydrowatch_pipeline::{CapabilityError, Notifier, PipelineConfig, ReadingPipeline};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Default)]
struct CountingNotifier(AtomicUsize);

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify(
        &self,
        _subject: &str,
        _body: &str,
        _recipient: &str,
    ) -> Result<(), CapabilityError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serve `app` on an ephemeral port and return its address.
async fn serve(app: axum::Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Next text frame as JSON, skipping control frames.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("no frame received")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn observer_gets_snapshot_then_alert_then_prediction() {
    let config = PipelineConfig {
        contamination_threshold: 1,
        ..Default::default()
    };
    let notifier = Arc::new(CountingNotifier::default());
    let pipeline = ReadingPipeline::new(&config, Arc::new(BroadcastHub::default()))
        .unwrap()
        .with_notifier(notifier.clone(), "ops@example.com");
    let app = common::build_test_app(Arc::new(pipeline));
    let addr = serve(app.clone()).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/api/v1/ws")).await.unwrap();

    let snapshot = next_json(&mut client).await;
    assert_eq!(snapshot["event"], "connection_status");
    assert_eq!(snapshot["data"]["consecutive_count"], 0);
    assert_eq!(snapshot["data"]["alert_armed"], false);

    let response = common::post_json(app, "/api/v1/predict", json!({"pH": 9.0})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let returned = common::body_json(response).await["data"].clone();

    let alert = next_json(&mut client).await;
    assert_eq!(alert["event"], "alert_fired");
    assert_eq!(alert["data"]["consecutive_count"], 1);

    let prediction = next_json(&mut client).await;
    assert_eq!(prediction["event"], "prediction_update");
    assert_eq!(prediction["data"], returned);
    assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn late_observer_snapshot_reflects_current_streak() {
    let pipeline = common::bare_pipeline();
    let app = common::build_test_app(Arc::clone(&pipeline));
    for _ in 0..2 {
        common::post_json(app.clone(), "/api/v1/predict", json!({"pH": 7.0})).await;
    }
    let addr = serve(app).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/api/v1/ws")).await.unwrap();

    let snapshot = next_json(&mut client).await;
    assert_eq!(snapshot["event"], "connection_status");
    assert_eq!(snapshot["data"]["consecutive_count"], 2);
}
