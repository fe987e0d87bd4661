//! Hydrowatch observer hub and alert delivery.
//!
//! - [`BroadcastHub`]: in-process publish/subscribe hub for pipeline
//!   results, backed by `tokio::sync::broadcast`.
//! - [`HubEvent`]: the event envelope pushed to observers.
//! - [`delivery`]: external delivery channels (SMTP email).

pub mod bus;
pub mod delivery;

pub use bus::{AlertFired, BroadcastHub, Delivery, HubEvent, Observer};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
