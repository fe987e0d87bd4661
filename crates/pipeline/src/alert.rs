//! Contamination alert composition and dispatch.
//!
//! [`AlertDispatcher`] sends at most one notification per call and never
//! retries. Once-per-streak delivery is enforced by the contamination
//! tracker, which only asks for a dispatch while the alert is unconfirmed.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hydrowatch_core::parameter::Parameter;
use hydrowatch_core::reading::Reading;
use hydrowatch_core::thresholds::{out_of_range, ThresholdVerdicts};
use hydrowatch_events::EmailDelivery;

use crate::capability::{with_timeout, Notifier};
use crate::error::CapabilityError;

const CAPABILITY: &str = "notifier";

const RECOMMENDED_ACTIONS: [&str; 5] = [
    "Immediately stop water consumption from this source",
    "Conduct detailed water quality testing",
    "Identify and address the contamination source",
    "Notify local water authorities",
    "Consider alternative water sources",
];

/// Subject and plain-text body of an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    pub fn compose(reading: &Reading, verdicts: &ThresholdVerdicts, consecutive_count: u32) -> Self {
        let subject = format!(
            "URGENT: Water Contamination Alert ({consecutive_count} consecutive unsafe readings)"
        );

        let offending = out_of_range(verdicts);
        let offending = if offending.is_empty() {
            "none (classifier verdict only)".to_string()
        } else {
            offending
                .iter()
                .map(|p| p.key())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut body = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(
            body,
            "Water has been classified as CONTAMINATED for {consecutive_count} consecutive readings.\n"
        );
        let _ = writeln!(body, "Reading time: {}", reading.timestamp);
        let _ = writeln!(body, "Source:       {}", reading.source);
        let _ = writeln!(body, "Out of range: {offending}\n");
        let _ = writeln!(
            body,
            "{:<14} {:>10}  {:<22} {}",
            "Parameter", "Value", "Safe range", "Status"
        );
        for param in Parameter::ALL {
            let value = format!("{:.2}", reading.value(param));
            let (range, status) = match verdicts.get(&param) {
                Some(v) => (
                    format!("{:.2} - {:.2} {}", v.safe_min, v.safe_max, param.unit()),
                    if v.is_safe { "ok" } else { "UNSAFE" },
                ),
                None => ("n/a".to_string(), "-"),
            };
            let _ = writeln!(
                body,
                "{:<14} {:>10}  {:<22} {}",
                param.key(),
                value,
                range.trim_end(),
                status
            );
        }
        let _ = writeln!(body, "\nRecommended actions:");
        for action in RECOMMENDED_ACTIONS {
            let _ = writeln!(body, "- {action}");
        }

        Self { subject, body }
    }
}

/// Notifier plus the address alerts go to.
#[derive(Clone)]
struct AlertChannel {
    notifier: Arc<dyn Notifier>,
    recipient: String,
}

/// Sends contamination alerts through the optional [`Notifier`].
#[derive(Clone)]
pub struct AlertDispatcher {
    channel: Option<AlertChannel>,
    timeout: Duration,
}

impl AlertDispatcher {
    /// A dispatcher with no notifier; every dispatch reports failure.
    pub fn unconfigured(timeout: Duration) -> Self {
        Self {
            channel: None,
            timeout,
        }
    }

    pub fn new(notifier: Arc<dyn Notifier>, recipient: impl Into<String>, timeout: Duration) -> Self {
        Self {
            channel: Some(AlertChannel {
                notifier,
                recipient: recipient.into(),
            }),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.channel.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one alert for the given reading. Returns whether it was delivered.
    pub async fn dispatch(
        &self,
        reading: &Reading,
        verdicts: &ThresholdVerdicts,
        consecutive_count: u32,
    ) -> bool {
        let Some(channel) = &self.channel else {
            tracing::warn!(
                consecutive_count,
                "Contamination alert due but no notifier is configured"
            );
            return false;
        };

        let message = AlertMessage::compose(reading, verdicts, consecutive_count);
        let send = channel
            .notifier
            .notify(&message.subject, &message.body, &channel.recipient);

        match with_timeout(CAPABILITY, self.timeout, send).await {
            Ok(()) => {
                tracing::info!(
                    recipient = %channel.recipient,
                    consecutive_count,
                    "Contamination alert dispatched"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    recipient = %channel.recipient,
                    consecutive_count,
                    "Contamination alert dispatch failed"
                );
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for EmailDelivery {
    async fn notify(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), CapabilityError> {
        self.send(recipient, subject, body)
            .await
            .map_err(|e| CapabilityError::failed("email", e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
