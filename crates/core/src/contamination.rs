//! Consecutive-contamination state machine.
//!
//! [`ContaminationTracker`] counts consecutive unsafe classifications and
//! decides when a contamination alert is due. It performs no I/O: when
//! [`observe`](ContaminationTracker::observe) reports
//! [`Transition::DispatchDue`], the caller sends the alert and then calls
//! [`confirm_dispatch`](ContaminationTracker::confirm_dispatch) on success.
//! A failed dispatch leaves the tracker armed-pending, so the next unsafe
//! reading reports `DispatchDue` again.
//!
//! | phase          | count          | armed |
//! |----------------|----------------|-------|
//! | `Nominal`      | 0              | no    |
//! | `Accumulating` | 1..threshold   | no    |
//! | `ArmedPending` | >= threshold   | no    |
//! | `Alerted`      | >= threshold   | yes   |
//!
//! Any safe reading returns the tracker to `Nominal`.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::classification::Label;
use crate::error::CoreError;

/// Consecutive unsafe readings needed before an alert is sent.
pub const DEFAULT_CONTAMINATION_THRESHOLD: u32 = 5;

/// Counter and armed flag shared with observers and the status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContaminationState {
    pub consecutive_count: u32,
    pub alert_armed: bool,
}

/// Where the tracker sits relative to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Nominal,
    Accumulating,
    ArmedPending,
    Alerted,
}

/// What a single observation did to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A safe reading cleared the streak.
    Reset { previous_count: u32 },
    /// An unsafe reading extended a streak still below the threshold.
    Accumulating,
    /// The streak is at or above the threshold and no alert has been
    /// confirmed yet. The caller must attempt a dispatch.
    DispatchDue,
    /// The streak continues past an alert that was already sent.
    AlreadyAlerted,
}

/// Owner of the [`ContaminationState`] and the only code that mutates it.
#[derive(Debug, Clone)]
pub struct ContaminationTracker {
    threshold: NonZeroU32,
    state: ContaminationState,
}

impl ContaminationTracker {
    /// Create a tracker in the nominal phase.
    ///
    /// Returns [`CoreError::Validation`] when `threshold` is zero.
    pub fn new(threshold: u32) -> Result<Self, CoreError> {
        let threshold = NonZeroU32::new(threshold).ok_or_else(|| {
            CoreError::Validation("contamination threshold must be at least 1".into())
        })?;
        Ok(Self {
            threshold,
            state: ContaminationState::default(),
        })
    }

    pub fn threshold(&self) -> u32 {
        self.threshold.get()
    }

    pub fn state(&self) -> ContaminationState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        let ContaminationState {
            consecutive_count,
            alert_armed,
        } = self.state;
        if consecutive_count == 0 {
            Phase::Nominal
        } else if consecutive_count < self.threshold() {
            Phase::Accumulating
        } else if alert_armed {
            Phase::Alerted
        } else {
            Phase::ArmedPending
        }
    }

    /// Apply one classification label.
    pub fn observe(&mut self, label: Label) -> Transition {
        match label {
            Label::Safe => {
                let previous_count = self.state.consecutive_count;
                self.reset();
                Transition::Reset { previous_count }
            }
            Label::Unsafe => {
                self.state.consecutive_count = self.state.consecutive_count.saturating_add(1);
                match self.phase() {
                    Phase::Accumulating => Transition::Accumulating,
                    Phase::ArmedPending => Transition::DispatchDue,
                    Phase::Alerted => Transition::AlreadyAlerted,
                    // The count was just incremented and is at least 1.
                    Phase::Nominal => Transition::Accumulating,
                }
            }
        }
    }

    /// Record that the alert for the current streak was delivered.
    ///
    /// Only has an effect in [`Phase::ArmedPending`]; returns whether the
    /// tracker moved to [`Phase::Alerted`].
    pub fn confirm_dispatch(&mut self) -> bool {
        if self.phase() == Phase::ArmedPending {
            self.state.alert_armed = true;
            true
        } else {
            false
        }
    }

    /// Check that the armed flag is consistent with the counter.
    pub fn verify(&self) -> Result<(), CoreError> {
        let ContaminationState {
            consecutive_count,
            alert_armed,
        } = self.state;
        if alert_armed && consecutive_count < self.threshold() {
            return Err(CoreError::InvariantViolation(format!(
                "alert armed with consecutive_count {consecutive_count} below threshold {}",
                self.threshold()
            )));
        }
        Ok(())
    }

    /// Return to [`Phase::Nominal`].
    pub fn reset(&mut self) {
        self.state = ContaminationState::default();
    }
}

impl Default for ContaminationTracker {
    fn default() -> Self {
        Self {
            threshold: NonZeroU32::new(DEFAULT_CONTAMINATION_THRESHOLD)
                .unwrap_or(NonZeroU32::MIN),
            state: ContaminationState::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
