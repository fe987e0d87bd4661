//! The per-reading composite handed to persistence and observers.

use serde::{Deserialize, Serialize};

use crate::classification::ClassificationResult;
use crate::contamination::ContaminationState;
use crate::reading::Reading;
use crate::thresholds::ThresholdVerdicts;

/// Everything the pipeline learned about one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResult {
    pub reading: Reading,
    pub classification: ClassificationResult,
    pub thresholds: ThresholdVerdicts,
    /// Streak length after this reading was applied.
    pub consecutive_count: u32,
    /// Whether the alert for the current streak has been sent.
    pub alert_sent: bool,
}

impl EnrichedResult {
    pub fn contamination(&self) -> ContaminationState {
        ContaminationState {
            consecutive_count: self.consecutive_count,
            alert_armed: self.alert_sent,
        }
    }
}
