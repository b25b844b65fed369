use serde::{Deserialize, Serialize};

use crate::error::{Result, TypewriterError};

pub const DEFAULT_LOOP_WAIT_MS: u64 = 1000;

/// Loosely-typed configuration as it arrives from a JSON file or the CLI.
///
/// Numbers are milliseconds and may be fractional; they are rounded up when
/// the config is validated. Keys are camelCase; snake_case is accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConfig {
    pub interval: Option<f64>,
    pub flexibility: Option<f64>,
    #[serde(alias = "backtrack_probability")]
    pub backtrack_probability: Option<f64>,
    #[serde(alias = "smart_backtracking")]
    pub smart_backtracking: Option<bool>,
    #[serde(alias = "backtrack_delay")]
    pub backtrack_delay: Option<f64>,
    pub infinite: Option<bool>,
    #[serde(alias = "loop_wait_time")]
    pub loop_wait_time: Option<f64>,
    #[serde(alias = "pause_between_words")]
    pub pause_between_words: Option<f64>,
}

impl RawConfig {
    /// Fill every field that is unset here from `other`.
    pub fn or(self, other: RawConfig) -> RawConfig {
        RawConfig {
            interval: self.interval.or(other.interval),
            flexibility: self.flexibility.or(other.flexibility),
            backtrack_probability: self.backtrack_probability.or(other.backtrack_probability),
            smart_backtracking: self.smart_backtracking.or(other.smart_backtracking),
            backtrack_delay: self.backtrack_delay.or(other.backtrack_delay),
            infinite: self.infinite.or(other.infinite),
            loop_wait_time: self.loop_wait_time.or(other.loop_wait_time),
            pause_between_words: self.pause_between_words.or(other.pause_between_words),
        }
    }
}

/// Validated, immutable timing and backtracking settings of one typewriter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypewriterConfig {
    pub interval_ms: u64,
    pub flexibility_ms: u64,
    pub backtrack_probability: f64,
    pub smart_backtracking: bool,
    pub backtrack_delay_ms: u64,
    pub infinite: bool,
    pub loop_wait_ms: u64,
    pub pause_between_words_ms: u64,
}

impl TypewriterConfig {
    /// A config typing every `interval_ms` with all optional behavior off.
    pub fn with_interval(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            flexibility_ms: 0,
            backtrack_probability: 0.0,
            smart_backtracking: false,
            backtrack_delay_ms: 0,
            infinite: false,
            loop_wait_ms: DEFAULT_LOOP_WAIT_MS,
            pause_between_words_ms: 0,
        }
    }

    pub fn from_raw(raw: &RawConfig) -> Result<Self> {
        let interval = raw
            .interval
            .ok_or_else(|| invalid("interval is required".to_string()))?;

        let cfg = Self {
            interval_ms: millis(interval, "interval")?,
            flexibility_ms: millis(raw.flexibility.unwrap_or(0.0), "flexibility")?,
            backtrack_probability: raw.backtrack_probability.unwrap_or(0.0),
            smart_backtracking: raw.smart_backtracking.unwrap_or(false),
            backtrack_delay_ms: millis(raw.backtrack_delay.unwrap_or(0.0), "backtrackDelay")?,
            infinite: raw.infinite.unwrap_or(false),
            loop_wait_ms: millis(
                raw.loop_wait_time.unwrap_or(DEFAULT_LOOP_WAIT_MS as f64),
                "loopWaitTime",
            )?,
            pause_between_words_ms: millis(
                raw.pause_between_words.unwrap_or(0.0),
                "pauseBetweenWords",
            )?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Re-check invariants that the public fields could have broken.
    pub fn validate(&self) -> Result<()> {
        let p = self.backtrack_probability;
        if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
            return Err(invalid(format!(
                "backtrackProbability must be between 0.0 and 1.0, got {p}"
            )));
        }
        Ok(())
    }
}

impl TryFrom<RawConfig> for TypewriterConfig {
    type Error = TypewriterError;

    fn try_from(raw: RawConfig) -> Result<Self> {
        Self::from_raw(&raw)
    }
}

fn invalid(msg: String) -> TypewriterError {
    TypewriterError::InvalidConfig(msg)
}

fn millis(value: f64, name: &str) -> Result<u64> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!("{name} must be a number >= 0, got {value}")));
    }
    Ok(value.ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(interval: f64) -> RawConfig {
        RawConfig {
            interval: Some(interval),
            ..Default::default()
        }
    }

    #[test]
    fn missing_interval_is_rejected() {
        let err = TypewriterConfig::from_raw(&RawConfig::default()).unwrap_err();
        assert!(matches!(err, TypewriterError::InvalidConfig(_)));
    }

    #[test]
    fn zero_interval_is_accepted() {
        let cfg = TypewriterConfig::from_raw(&raw(0.0)).unwrap();
        assert_eq!(cfg.interval_ms, 0);
    }

    #[test]
    fn negative_and_nan_intervals_are_rejected() {
        assert!(TypewriterConfig::from_raw(&raw(-1.0)).is_err());
        assert!(TypewriterConfig::from_raw(&raw(f64::NAN)).is_err());
        assert!(TypewriterConfig::from_raw(&raw(f64::INFINITY)).is_err());
    }

    #[test]
    fn fractional_values_round_up() {
        let cfg = TypewriterConfig::from_raw(&RawConfig {
            interval: Some(69.2),
            flexibility: Some(0.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.interval_ms, 70);
        assert_eq!(cfg.flexibility_ms, 1);
    }

    #[test]
    fn defaults_apply() {
        let cfg = TypewriterConfig::from_raw(&raw(70.0)).unwrap();
        assert_eq!(cfg, TypewriterConfig::with_interval(70));
        assert_eq!(cfg.loop_wait_ms, 1000);
    }

    #[test]
    fn probability_bounds() {
        for (p, ok) in [(-1.0, false), (0.0, true), (0.4, true), (1.0, true), (1.001, false)] {
            let res = TypewriterConfig::from_raw(&RawConfig {
                backtrack_probability: Some(p),
                ..raw(10.0)
            });
            assert_eq!(res.is_ok(), ok, "probability {p}");
        }
    }

    #[test]
    fn negative_optional_field_is_rejected() {
        let res = TypewriterConfig::from_raw(&RawConfig {
            pause_between_words: Some(-5.0),
            ..raw(10.0)
        });
        assert!(res.is_err());
    }

    #[test]
    fn parses_camel_and_snake_case_json() {
        let camel: RawConfig =
            serde_json::from_str(r#"{"interval": 70, "backtrackProbability": 0.1}"#).unwrap();
        let snake: RawConfig =
            serde_json::from_str(r#"{"interval": 70, "backtrack_probability": 0.1}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.backtrack_probability, Some(0.1));
    }

    #[test]
    fn or_prefers_self() {
        let merged = RawConfig {
            interval: Some(5.0),
            ..Default::default()
        }
        .or(RawConfig {
            interval: Some(9.0),
            infinite: Some(true),
            ..Default::default()
        });
        assert_eq!(merged.interval, Some(5.0));
        assert_eq!(merged.infinite, Some(true));
    }
}
