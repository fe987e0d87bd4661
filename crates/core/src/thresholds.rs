//! Safe-range evaluation for reading parameters.
//!
//! Pure logic, no I/O. The caller owns the [`SafeRangeTable`] and passes it
//! in on every evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::parameter::Parameter;
use crate::reading::Reading;

/// Closed interval `[min, max]` of acceptable values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeRange {
    pub min: f64,
    pub max: f64,
}

impl SafeRange {
    pub fn new(min: f64, max: f64) -> Result<Self, CoreError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CoreError::Validation(format!(
                "safe range requires finite min <= max, got {min}:{max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Parse `"min:max"`, the form used in configuration.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let (min, max) = raw.split_once(':').ok_or_else(|| {
            CoreError::Validation(format!("safe range must be 'min:max', got '{raw}'"))
        })?;
        let parse = |s: &str| {
            s.trim().parse::<f64>().map_err(|_| {
                CoreError::Validation(format!("safe range bound '{s}' is not a number"))
            })
        };
        Self::new(parse(min)?, parse(max)?)
    }

    /// Inclusive on both ends.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Per-parameter safe ranges. Parameters without an entry are not evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeRangeTable {
    ranges: BTreeMap<Parameter, SafeRange>,
}

impl SafeRangeTable {
    pub fn empty() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    pub fn get(&self, param: Parameter) -> Option<SafeRange> {
        self.ranges.get(&param).copied()
    }

    pub fn set(&mut self, param: Parameter, range: SafeRange) {
        self.ranges.insert(param, range);
    }

    pub fn remove(&mut self, param: Parameter) {
        self.ranges.remove(&param);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, SafeRange)> + '_ {
        self.ranges.iter().map(|(&p, &r)| (p, r))
    }
}

impl Default for SafeRangeTable {
    /// Tamil Nadu drinking-water ranges.
    fn default() -> Self {
        let ranges = [
            (Parameter::Ph, SafeRange { min: 6.5, max: 8.5 }),
            (Parameter::Sulphate, SafeRange { min: 100.0, max: 400.0 }),
            (Parameter::Hardness, SafeRange { min: 80.0, max: 250.0 }),
            (Parameter::Conductivity, SafeRange { min: 200.0, max: 800.0 }),
            (Parameter::Tds, SafeRange { min: 200.0, max: 1000.0 }),
            (Parameter::Turbidity, SafeRange { min: 1.5, max: 5.0 }),
        ];
        Self {
            ranges: ranges.into_iter().collect(),
        }
    }
}

/// Outcome of checking one parameter against its safe range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdVerdict {
    pub value: f64,
    pub safe_min: f64,
    pub safe_max: f64,
    pub is_safe: bool,
}

/// Verdicts keyed by parameter; serializes as `{"pH": {...}, ...}`.
pub type ThresholdVerdicts = BTreeMap<Parameter, ThresholdVerdict>;

/// Check every parameter that has a configured range.
pub fn evaluate(reading: &Reading, table: &SafeRangeTable) -> ThresholdVerdicts {
    table
        .iter()
        .map(|(param, range)| {
            let value = reading.value(param);
            let verdict = ThresholdVerdict {
                value,
                safe_min: range.min,
                safe_max: range.max,
                is_safe: range.contains(value),
            };
            (param, verdict)
        })
        .collect()
}

/// Parameters whose verdict is unsafe, in feature order.
pub fn out_of_range(verdicts: &ThresholdVerdicts) -> Vec<Parameter> {
    verdicts
        .iter()
        .filter(|(_, v)| !v.is_safe)
        .map(|(&p, _)| p)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Local;
    use serde_json::{json, Value};

    use super::*;
    use crate::reading::ReadingDefaults;

    fn reading(payload: Value) -> Reading {
        let Value::Object(map) = payload else {
            panic!("payload must be an object");
        };
        Reading::from_payload(&map, "TEST", &ReadingDefaults::default(), Local::now()).unwrap()
    }

    #[test]
    fn nominal_reading_is_safe_everywhere() {
        let verdicts = evaluate(&reading(json!({})), &SafeRangeTable::default());
        assert_eq!(verdicts.len(), 6);
        assert!(verdicts.values().all(|v| v.is_safe));
    }

    #[test]
    fn bounds_are_inclusive() {
        let table = SafeRangeTable::default();
        let low = evaluate(&reading(json!({"pH": 6.5, "Turbidity": 5.0})), &table);
        assert!(low[&Parameter::Ph].is_safe);
        assert!(low[&Parameter::Turbidity].is_safe);

        let high = evaluate(&reading(json!({"pH": 8.5, "Turbidity": 1.5})), &table);
        assert!(high[&Parameter::Ph].is_safe);
        assert!(high[&Parameter::Turbidity].is_safe);
    }

    #[test]
    fn value_outside_range_is_unsafe() {
        let verdicts = evaluate(
            &reading(json!({"pH": 9.0, "TDS": 150})),
            &SafeRangeTable::default(),
        );
        let ph = verdicts[&Parameter::Ph];
        assert!(!ph.is_safe);
        assert_eq!(ph.value, 9.0);
        assert_eq!(ph.safe_min, 6.5);
        assert_eq!(ph.safe_max, 8.5);
        assert_eq!(out_of_range(&verdicts), vec![Parameter::Ph, Parameter::Tds]);
    }

    #[test]
    fn parameters_without_range_are_skipped() {
        let mut table = SafeRangeTable::default();
        table.remove(Parameter::Hardness);
        let verdicts = evaluate(&reading(json!({"Hardness": 9999})), &table);
        assert_eq!(verdicts.len(), 5);
        assert!(!verdicts.contains_key(&Parameter::Hardness));
    }

    #[test]
    fn verdicts_serialize_keyed_by_payload_name() {
        let verdicts = evaluate(&reading(json!({})), &SafeRangeTable::default());
        let json = serde_json::to_value(&verdicts).unwrap();
        assert_eq!(json["pH"]["is_safe"], true);
        assert_eq!(json["TDS"]["safe_max"], 1000.0);
    }

    #[test]
    fn parse_accepts_min_max() {
        let range = SafeRange::parse("6.5:8.5").unwrap();
        assert_eq!(range, SafeRange { min: 6.5, max: 8.5 });
    }

    #[test]
    fn parse_rejects_inverted_or_malformed() {
        assert!(SafeRange::parse("8.5:6.5").is_err());
        assert!(SafeRange::parse("6.5").is_err());
        assert!(SafeRange::parse("low:high").is_err());
    }
}
