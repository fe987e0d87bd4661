//! The six water-quality parameters carried by every reading.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A measured water-quality parameter.
///
/// Variant order is the feature order expected by the classifier, and the
/// serialized names match the keys used in telemetry payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "Sulphate")]
    Sulphate,
    #[serde(rename = "Hardness")]
    Hardness,
    #[serde(rename = "Conductivity")]
    Conductivity,
    #[serde(rename = "TDS")]
    Tds,
    #[serde(rename = "Turbidity")]
    Turbidity,
}

impl Parameter {
    /// All parameters in classifier feature order.
    pub const ALL: [Parameter; 6] = [
        Parameter::Ph,
        Parameter::Sulphate,
        Parameter::Hardness,
        Parameter::Conductivity,
        Parameter::Tds,
        Parameter::Turbidity,
    ];

    /// Key used for this parameter in telemetry payloads.
    pub fn key(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Sulphate => "Sulphate",
            Parameter::Hardness => "Hardness",
            Parameter::Conductivity => "Conductivity",
            Parameter::Tds => "TDS",
            Parameter::Turbidity => "Turbidity",
        }
    }

    /// Upper-case suffix used in configuration variable names
    /// (`SAFE_RANGE_PH`, `DEFAULT_TDS`, ...).
    pub fn env_suffix(self) -> &'static str {
        match self {
            Parameter::Ph => "PH",
            Parameter::Sulphate => "SULPHATE",
            Parameter::Hardness => "HARDNESS",
            Parameter::Conductivity => "CONDUCTIVITY",
            Parameter::Tds => "TDS",
            Parameter::Turbidity => "TURBIDITY",
        }
    }

    /// Measurement unit, empty for dimensionless pH.
    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Ph => "",
            Parameter::Sulphate | Parameter::Hardness | Parameter::Tds => "mg/L",
            Parameter::Conductivity => "µS/cm",
            Parameter::Turbidity => "NTU",
        }
    }

    /// Value assumed when a payload omits this parameter.
    pub fn nominal_default(self) -> f64 {
        match self {
            Parameter::Ph => 7.0,
            Parameter::Sulphate => 250.0,
            Parameter::Hardness => 165.0,
            Parameter::Conductivity => 500.0,
            Parameter::Tds => 600.0,
            Parameter::Turbidity => 3.0,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
