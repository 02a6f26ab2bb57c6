//! Persisted playback shapes.

use serde::{Deserialize, Deserializer, Serialize};

/// Volume used when nothing else is known.
pub const DEFAULT_VOLUME: f64 = 0.7;

/// A playable track.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

impl Track {
    pub fn new(url: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
            artist: Some(artist.into()),
        }
    }

    /// Title to display; `"Unknown Track"` when missing or empty.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => "Unknown Track",
        }
    }

    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("")
    }
}

/// Long-lived playback state, rewritten on every transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub track: Track,
    /// Seconds, one decimal
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_time: f64,
    #[serde(default)]
    pub is_playing: bool,
    /// `[0, 1]`, two decimals
    #[serde(default = "default_volume", deserialize_with = "lenient_volume")]
    pub volume: f64,
}

/// Short-lived snapshot written right before a full-page navigation.
///
/// Uses compact field names since it is written on every navigation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionSnapshot {
    #[serde(rename = "t")]
    pub track: Track,
    #[serde(rename = "ct", default, deserialize_with = "lenient_f64")]
    pub current_time: f64,
    #[serde(rename = "d", default, deserialize_with = "lenient_f64")]
    pub duration: f64,
    #[serde(rename = "p", default)]
    pub is_playing: bool,
    #[serde(rename = "v", default = "default_volume", deserialize_with = "lenient_volume")]
    pub volume: f64,
    #[serde(rename = "vis", default)]
    pub visible: bool,
    /// Whether the media element itself was playing
    #[serde(rename = "wp", default)]
    pub was_playing: bool,
}

impl TransitionSnapshot {
    /// Whether the restored player should ask for a resume gesture.
    #[inline]
    pub fn should_offer_resume(&self) -> bool {
        self.was_playing || self.is_playing
    }
}

/// Round to one decimal; non-finite values become `0`.
pub fn round_tenths(value: f64) -> f64 {
    if value.is_finite() {
        (value * 10.0).round() / 10.0
    } else {
        0.0
    }
}

/// Round to two decimals; non-finite values become `0`.
pub fn round_hundredths(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}

fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

// `null` (a serialized NaN) reads as zero rather than failing the whole entry.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).unwrap_or(0.0))
}

fn lenient_volume<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).unwrap_or(DEFAULT_VOLUME))
}
