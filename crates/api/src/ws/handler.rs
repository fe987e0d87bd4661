use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use hydrowatch_events::{BroadcastHub, Delivery, HubEvent, Observer};
use serde_json::json;

use crate::state::AppState;
use crate::ws::heartbeat::{heartbeat_interval, ping_frame};

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered as a hub observer and
/// served by a sender task plus the receive loop on the current task.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = Arc::clone(state.hub());
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Manage a single WebSocket connection after upgrade.
///
///   1. Registers an observer with the hub.
///   2. Spawns a sender task that pushes the registration snapshot, then
///      every hub event, plus periodic pings.
///   3. Processes inbound messages on the current task.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let observer = hub.register();
    let observer_id = observer.id();
    tracing::info!(observer_id, "WebSocket connected");

    let (sink, mut stream) = socket.split();
    let send_task = tokio::spawn(forward_events(observer, sink));

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(observer_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(observer_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Aborting drops the observer, which removes it from the hub.
    send_task.abort();
    tracing::info!(observer_id, "WebSocket disconnected");
}

async fn forward_events(mut observer: Observer, mut sink: SplitSink<WebSocket, Message>) {
    let observer_id = observer.id();

    if let Some(frame) = event_frame(&observer.snapshot_event()) {
        if sink.send(frame).await.is_err() {
            return;
        }
    }

    let mut heartbeat = heartbeat_interval();
    loop {
        let frame = tokio::select! {
            delivery = observer.recv() => match delivery {
                Some(Delivery::Event(event)) => event_frame(&event),
                Some(Delivery::Lagged(skipped)) => {
                    tracing::warn!(observer_id, skipped, "WebSocket client lagging, events dropped");
                    Some(lagged_frame(skipped))
                }
                None => break,
            },
            _ = heartbeat.tick() => Some(ping_frame()),
        };

        let Some(frame) = frame else {
            continue;
        };
        if sink.send(frame).await.is_err() {
            tracing::debug!(observer_id, "WebSocket sink closed");
            break;
        }
    }
}

/// Serialize a hub event as a JSON text frame.
pub(crate) fn event_frame(event: &HubEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize hub event");
            None
        }
    }
}

/// Tells a client how many events it missed.
pub(crate) fn lagged_frame(skipped: u64) -> Message {
    let text = json!({"event": "lagged", "data": {"skipped": skipped}}).to_string();
    Message::Text(text.into())
}
