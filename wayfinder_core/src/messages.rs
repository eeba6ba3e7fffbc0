// wayfinder_core/src/messages.rs

use crate::types::{LngLatAlt, TimestampMs};
use serde::{Deserialize, Serialize};

// =========================================================================
// == Sensor Inputs ==
// =========================================================================

/// A raw position from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub location: LngLatAlt,
    /// One standard deviation, in meters.
    pub accuracy: f64,
    /// Ground speed in m/s, when the provider reports one.
    #[serde(default)]
    pub speed: Option<f64>,
    pub timestamp_ms: TimestampMs,
}

/// A raw compass reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingFix {
    pub heading: f64,
    pub accuracy: f64,
    pub timestamp_ms: TimestampMs,
}

/// Everything the engine reacts to, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorInput {
    Location(LocationFix),
    Heading(HeadingFix),
    /// The audio sink finished everything it was given.
    AudioQueueEmpty,
    /// Stop and discard all pending speech.
    Cancel,
}

// =========================================================================
// == Audio Outputs ==
// =========================================================================

/// Short non-speech sounds that prefix a callout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Earcon {
    SensePoi,
    SenseSafety,
    SenseMobility,
    InformationAlert,
    Intersection,
    LocationSense,
}

/// How the sink should position a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioType {
    /// Flat stereo.
    #[default]
    Standard,
    /// Spatialized at `location`.
    Localized,
    /// Spatialized along `heading` relative to the listener.
    Compass,
}

/// One entry of a callout handed to the audio sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedString {
    pub text: String,
    pub location: Option<LngLatAlt>,
    pub earcon: Option<Earcon>,
    pub audio_type: AudioType,
    pub heading: Option<f64>,
}

impl PositionedString {
    pub fn standard(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location: None,
            earcon: None,
            audio_type: AudioType::Standard,
            heading: None,
        }
    }

    pub fn localized(text: impl Into<String>, location: LngLatAlt) -> Self {
        Self {
            location: Some(location),
            audio_type: AudioType::Localized,
            ..Self::standard(text)
        }
    }

    pub fn compass(text: impl Into<String>, location: LngLatAlt, heading: f64) -> Self {
        Self {
            location: Some(location),
            heading: Some(heading),
            audio_type: AudioType::Compass,
            ..Self::standard(text)
        }
    }

    pub fn with_earcon(mut self, earcon: Earcon) -> Self {
        self.earcon = Some(earcon);
        self
    }
}
