//! Cycle definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::foundation::{duration, CycleId, ValidationError};

/// The three cycle flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CycleType {
    /// Sweeps an entire collection under a fixed throttle.
    ThrottledWholeCollection,
    /// Sweeps a sliding time window; throttle has a floor.
    FixedWindow,
    /// Sweeps a sliding time window; throttle has a floor and a ceiling.
    ScalingWindow,
}

impl CycleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleType::ThrottledWholeCollection => "ThrottledWholeCollection",
            CycleType::FixedWindow => "FixedWindow",
            CycleType::ScalingWindow => "ScalingWindow",
        }
    }
}

impl fmt::Display for CycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of a cycle.
///
/// Unknown fields are ignored when reading definitions or checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub cycle_type: CycleType,

    pub origin: String,

    pub collection: String,

    #[serde(default, with = "duration::option_text", skip_serializing_if = "Option::is_none")]
    pub cool_down: Option<Duration>,

    #[serde(default, with = "duration::option_text", skip_serializing_if = "Option::is_none")]
    pub throttle: Option<Duration>,

    #[serde(default, with = "duration::option_text", skip_serializing_if = "Option::is_none")]
    pub time_window: Option<Duration>,

    #[serde(default, with = "duration::option_text", skip_serializing_if = "Option::is_none")]
    pub minimum_throttle: Option<Duration>,

    #[serde(default, with = "duration::option_text", skip_serializing_if = "Option::is_none")]
    pub maximum_throttle: Option<Duration>,
}

/// Validated, flavour-specific pacing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleSettings {
    ThrottledWholeCollection {
        throttle: Duration,
    },
    FixedWindow {
        time_window: Duration,
        minimum_throttle: Duration,
    },
    ScalingWindow {
        time_window: Duration,
        minimum_throttle: Duration,
        maximum_throttle: Duration,
    },
}

impl CycleConfig {
    /// Identity of the cycle described by this config.
    pub fn id(&self) -> CycleId {
        CycleId::derive(
            &self.name,
            self.cycle_type.as_str(),
            &self.collection,
            &self.origin,
        )
    }

    /// Pause between passes; zero when not configured.
    pub fn cool_down(&self) -> Duration {
        self.cool_down.unwrap_or(Duration::ZERO)
    }

    /// Validates the definition and extracts its pacing parameters.
    pub fn settings(&self) -> Result<CycleSettings, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if self.collection.trim().is_empty() {
            return Err(ValidationError::empty_field("collection"));
        }
        if self.origin.trim().is_empty() {
            return Err(ValidationError::empty_field("origin"));
        }

        let context = self.cycle_type.as_str();
        let require = |value: Option<Duration>, field: &str| {
            value
                .filter(|d| !d.is_zero())
                .ok_or_else(|| ValidationError::missing_field(field, context))
        };

        match self.cycle_type {
            CycleType::ThrottledWholeCollection => Ok(CycleSettings::ThrottledWholeCollection {
                throttle: require(self.throttle, "throttle")?,
            }),
            CycleType::FixedWindow => Ok(CycleSettings::FixedWindow {
                time_window: require(self.time_window, "timeWindow")?,
                minimum_throttle: require(self.minimum_throttle, "minimumThrottle")?,
            }),
            CycleType::ScalingWindow => {
                let time_window = require(self.time_window, "timeWindow")?;
                let minimum_throttle = require(self.minimum_throttle, "minimumThrottle")?;
                let maximum_throttle = require(self.maximum_throttle, "maximumThrottle")?;
                if maximum_throttle < minimum_throttle {
                    return Err(ValidationError::out_of_range(
                        "maximumThrottle",
                        "must not be below minimumThrottle",
                    ));
                }
                Ok(CycleSettings::ScalingWindow {
                    time_window,
                    minimum_throttle,
                    maximum_throttle,
                })
            }
        }
    }

    /// Validates the definition.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.settings().map(|_| ())
    }
}
