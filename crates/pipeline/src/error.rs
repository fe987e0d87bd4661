use std::time::Duration;

/// Failure talking to an external capability (classifier, notifier, store).
///
/// Never escapes the pipeline: each caller logs it and degrades.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("{capability} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        capability: &'static str,
        timeout: Duration,
    },

    #[error("{capability} failed: {message}")]
    Failed {
        capability: &'static str,
        message: String,
    },

    #[error("{capability} returned a malformed response: {message}")]
    Malformed {
        capability: &'static str,
        message: String,
    },
}

impl CapabilityError {
    pub fn failed(capability: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Failed {
            capability,
            message: err.to_string(),
        }
    }

    pub fn malformed(capability: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Malformed {
            capability,
            message: err.to_string(),
        }
    }
}
