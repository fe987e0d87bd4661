//! WebSocket observer stream.
//!
//! Each connection registers with the
//! [`BroadcastHub`](hydrowatch_events::BroadcastHub) and receives pipeline
//! events as JSON text frames, with periodic heartbeat pings.

mod handler;
mod heartbeat;

pub use handler::ws_handler;
