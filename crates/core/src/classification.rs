//! Safe/unsafe classification results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Binary water-quality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Unsafe,
    Safe,
}

impl Label {
    /// Map the model's class index (`0` unsafe, `1` safe).
    pub fn from_class(class: i64) -> Result<Self, CoreError> {
        match class {
            0 => Ok(Label::Unsafe),
            1 => Ok(Label::Safe),
            other => Err(CoreError::Validation(format!(
                "class label must be 0 or 1, got {other}"
            ))),
        }
    }

    pub fn class(self) -> i16 {
        match self {
            Label::Unsafe => 0,
            Label::Safe => 1,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Unsafe => f.write_str("Unsafe"),
            Label::Safe => f.write_str("Safe"),
        }
    }
}

/// Label plus confidence percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: Label,
    pub confidence: f64,
}

impl ClassificationResult {
    /// Returned whenever the classifier is unavailable or fails: unknown
    /// water is never reported as safe.
    pub const FAIL_SAFE: ClassificationResult = ClassificationResult {
        label: Label::Unsafe,
        confidence: 0.0,
    };

    /// Build a result from the model's class probabilities.
    ///
    /// Confidence is the largest probability as a percentage, clamped to
    /// `[0, 100]` and rounded to two decimals.
    pub fn from_probabilities(label: Label, probabilities: &[f64]) -> Result<Self, CoreError> {
        if probabilities.is_empty() {
            return Err(CoreError::Validation(
                "class probabilities must not be empty".into(),
            ));
        }
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(CoreError::Validation(
                "class probabilities must be finite".into(),
            ));
        }

        let max = probabilities.iter().copied().fold(f64::MIN, f64::max);
        let percent = (max * 100.0).clamp(0.0, 100.0);
        Ok(Self {
            label,
            confidence: (percent * 100.0).round() / 100.0,
        })
    }
}
