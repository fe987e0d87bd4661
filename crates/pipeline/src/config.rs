use std::time::Duration;

use hydrowatch_core::contamination::DEFAULT_CONTAMINATION_THRESHOLD;
use hydrowatch_core::error::CoreError;
use hydrowatch_core::parameter::Parameter;
use hydrowatch_core::reading::ReadingDefaults;
use hydrowatch_core::thresholds::{SafeRange, SafeRangeTable};
use hydrowatch_events::bus::DEFAULT_CAPACITY;

/// Static pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Consecutive unsafe readings before an alert is sent.
    pub contamination_threshold: u32,
    pub safe_ranges: SafeRangeTable,
    /// Values used for parameters a payload omits.
    pub defaults: ReadingDefaults,
    pub classifier_timeout: Duration,
    pub notify_timeout: Duration,
    pub persist_timeout: Duration,
    /// Where contamination alerts are sent. Without it no alert can go out.
    pub alert_recipient: Option<String>,
    /// Per-observer event buffer.
    pub hub_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            contamination_threshold: DEFAULT_CONTAMINATION_THRESHOLD,
            safe_ranges: SafeRangeTable::default(),
            defaults: ReadingDefaults::default(),
            classifier_timeout: Duration::from_millis(2000),
            notify_timeout: Duration::from_secs(30),
            persist_timeout: Duration::from_secs(5),
            alert_recipient: None,
            hub_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                  |
    /// |---------------------------|--------------------------|
    /// | `CONTAMINATION_THRESHOLD` | `5`                      |
    /// | `SAFE_RANGE_<PARAM>`      | built-in range (`min:max`) |
    /// | `DEFAULT_<PARAM>`         | nominal value            |
    /// | `CLASSIFIER_TIMEOUT_MS`   | `2000`                   |
    /// | `NOTIFY_TIMEOUT_SECS`     | `30`                     |
    /// | `PERSIST_TIMEOUT_SECS`    | `5`                      |
    /// | `ALERT_RECIPIENT`         | unset                    |
    /// | `HUB_CAPACITY`            | `256`                    |
    ///
    /// `<PARAM>` is one of `PH`, `SULPHATE`, `HARDNESS`, `CONDUCTIVITY`,
    /// `TDS`, `TURBIDITY`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("CONTAMINATION_THRESHOLD") {
            let threshold: u32 = parse_number("CONTAMINATION_THRESHOLD", &raw)?;
            if threshold == 0 {
                return Err(CoreError::Validation(
                    "CONTAMINATION_THRESHOLD must be at least 1".into(),
                ));
            }
            config.contamination_threshold = threshold;
        }

        for param in Parameter::ALL {
            let range_key = format!("SAFE_RANGE_{}", param.env_suffix());
            if let Some(raw) = lookup(&range_key) {
                let range = SafeRange::parse(&raw)
                    .map_err(|e| CoreError::Validation(format!("{range_key}: {e}")))?;
                config.safe_ranges.set(param, range);
            }

            let default_key = format!("DEFAULT_{}", param.env_suffix());
            if let Some(raw) = lookup(&default_key) {
                let value: f64 = parse_number(&default_key, &raw)?;
                if !value.is_finite() {
                    return Err(CoreError::Validation(format!(
                        "{default_key} must be finite, got {raw}"
                    )));
                }
                config.defaults.set(param, value);
            }
        }

        if let Some(raw) = lookup("CLASSIFIER_TIMEOUT_MS") {
            config.classifier_timeout =
                Duration::from_millis(parse_number("CLASSIFIER_TIMEOUT_MS", &raw)?);
        }
        if let Some(raw) = lookup("NOTIFY_TIMEOUT_SECS") {
            config.notify_timeout = Duration::from_secs(parse_number("NOTIFY_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("PERSIST_TIMEOUT_SECS") {
            config.persist_timeout =
                Duration::from_secs(parse_number("PERSIST_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("HUB_CAPACITY") {
            config.hub_capacity = parse_number("HUB_CAPACITY", &raw)?;
        }

        config.alert_recipient = lookup("ALERT_RECIPIENT")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("{key} must be a number, got '{raw}'")))
}
