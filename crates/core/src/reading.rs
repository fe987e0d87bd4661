//! Telemetry readings and their construction from decoded payloads.
//!
//! A [`Reading`] is built exactly once, at the ingestion boundary, by
//! [`Reading::from_payload`]. Missing parameters are filled from a
//! [`ReadingDefaults`] table at that point and nowhere else.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::parameter::Parameter;

/// Payload key carrying an optional caller-supplied timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

// ---------------------------------------------------------------------------
// ReadingDefaults
// ---------------------------------------------------------------------------

/// Values substituted for parameters a payload omits.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingDefaults {
    values: BTreeMap<Parameter, f64>,
}

impl ReadingDefaults {
    pub fn get(&self, param: Parameter) -> f64 {
        self.values
            .get(&param)
            .copied()
            .unwrap_or_else(|| param.nominal_default())
    }

    /// Override the default for one parameter.
    pub fn set(&mut self, param: Parameter, value: f64) {
        self.values.insert(param, value);
    }
}

impl Default for ReadingDefaults {
    fn default() -> Self {
        Self {
            values: Parameter::ALL
                .iter()
                .map(|&p| (p, p.nominal_default()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One timestamped water-quality sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "Sulphate")]
    pub sulphate: f64,
    #[serde(rename = "Hardness")]
    pub hardness: f64,
    #[serde(rename = "Conductivity")]
    pub conductivity: f64,
    #[serde(rename = "TDS")]
    pub tds: f64,
    #[serde(rename = "Turbidity")]
    pub turbidity: f64,
    /// ISO-8601 timestamp, caller-supplied or assigned at ingestion.
    pub timestamp: String,
    /// Free-form origin tag such as `"MQTT"` or `"API"`.
    pub source: String,
}

impl Reading {
    /// Build a reading from an already-decoded JSON object.
    ///
    /// Each parameter may be a JSON number or a numeric string. Anything
    /// else, including non-finite values, is rejected with
    /// [`CoreError::Validation`]. Unknown keys are ignored. When the payload
    /// has no `timestamp`, `received_at` is used.
    pub fn from_payload(
        payload: &Map<String, Value>,
        source: impl Into<String>,
        defaults: &ReadingDefaults,
        received_at: DateTime<Local>,
    ) -> Result<Self, CoreError> {
        let mut values = [0.0; 6];
        for (slot, param) in values.iter_mut().zip(Parameter::ALL) {
            *slot = match payload.get(param.key()) {
                Some(raw) => parse_value(param, raw)?,
                None => defaults.get(param),
            };
        }

        let timestamp = match payload.get(TIMESTAMP_KEY) {
            Some(Value::String(ts)) => ts.clone(),
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "{TIMESTAMP_KEY} must be a string, got {other}"
                )))
            }
            None => received_at.to_rfc3339_opts(SecondsFormat::Micros, false),
        };

        let [ph, sulphate, hardness, conductivity, tds, turbidity] = values;
        Ok(Self {
            ph,
            sulphate,
            hardness,
            conductivity,
            tds,
            turbidity,
            timestamp,
            source: source.into(),
        })
    }

    pub fn value(&self, param: Parameter) -> f64 {
        match param {
            Parameter::Ph => self.ph,
            Parameter::Sulphate => self.sulphate,
            Parameter::Hardness => self.hardness,
            Parameter::Conductivity => self.conductivity,
            Parameter::Tds => self.tds,
            Parameter::Turbidity => self.turbidity,
        }
    }

    /// Feature vector in [`Parameter::ALL`] order.
    pub fn features(&self) -> [f64; 6] {
        Parameter::ALL.map(|p| self.value(p))
    }
}

/// Parameters the payload does not carry and which will be defaulted.
pub fn missing_parameters(payload: &Map<String, Value>) -> Vec<Parameter> {
    Parameter::ALL
        .into_iter()
        .filter(|p| !payload.contains_key(p.key()))
        .collect()
}

fn parse_value(param: Parameter, raw: &Value) -> Result<f64, CoreError> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(CoreError::Validation(format!(
            "{param} must be a finite number, got {raw}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn build(payload: Value) -> Result<Reading, CoreError> {
        Reading::from_payload(
            &object(payload),
            "TEST",
            &ReadingDefaults::default(),
            Local::now(),
        )
    }

    #[test]
    fn empty_payload_uses_nominal_defaults() {
        let reading = build(json!({})).unwrap();
        assert_eq!(reading.features(), [7.0, 250.0, 165.0, 500.0, 600.0, 3.0]);
        assert_eq!(reading.source, "TEST");
        assert!(!reading.timestamp.is_empty());
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let reading = build(json!({"pH": " 6.8 ", "TDS": "410"})).unwrap();
        assert_eq!(reading.ph, 6.8);
        assert_eq!(reading.tds, 410.0);
    }

    #[test]
    fn supplied_timestamp_is_kept() {
        let reading = build(json!({"timestamp": "2025-01-01T00:00:00"})).unwrap();
        assert_eq!(reading.timestamp, "2025-01-01T00:00:00");
    }

    #[test]
    fn non_numeric_parameter_is_rejected() {
        assert_matches!(
            build(json!({"pH": "acidic"})),
            Err(CoreError::Validation(msg)) if msg.contains("pH")
        );
        assert_matches!(build(json!({"Hardness": true})), Err(CoreError::Validation(_)));
        assert_matches!(build(json!({"TDS": null})), Err(CoreError::Validation(_)));
        assert_matches!(build(json!({"Turbidity": "NaN"})), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_string_timestamp_is_rejected() {
        assert_matches!(
            build(json!({"timestamp": 1_700_000_000})),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let reading = build(json!({"pH": 7.4, "battery": "low"})).unwrap();
        assert_eq!(reading.ph, 7.4);
    }

    #[test]
    fn overridden_default_is_used() {
        let mut defaults = ReadingDefaults::default();
        defaults.set(Parameter::Turbidity, 1.0);
        let reading =
            Reading::from_payload(&Map::new(), "TEST", &defaults, Local::now()).unwrap();
        assert_eq!(reading.turbidity, 1.0);
    }

    #[test]
    fn missing_parameters_lists_absent_keys() {
        let payload = object(json!({"pH": 7.0, "TDS": 300, "Sulphate": 120}));
        assert_eq!(
            missing_parameters(&payload),
            vec![Parameter::Hardness, Parameter::Conductivity, Parameter::Turbidity]
        );
    }
}
