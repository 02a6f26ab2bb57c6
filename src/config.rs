//! Effects configuration loaded from JSON or TOML.

use crate::animator::AnimatorOptions;
use crate::audio::AudioOptions;

/// Error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "toml")]
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Site-wide settings for the background animation and the audio player.
///
/// Every field is optional; missing ones take their defaults.
///
/// ```toml
/// [animator]
/// pattern = "waves"
/// fps = 12.0
/// static_mode = true
///
/// [audio]
/// default_volume = 0.5
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub animator: AnimatorOptions,
    pub audio: AudioOptions,
}

impl EffectsConfig {
    /// Parse a TOML configuration string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()
    }

    /// Parse a JSON configuration string (e.g. a `data-` attribute).
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()
    }

    /// Reject values the animator or player cannot work with.
    pub fn validate(self) -> Result<Self, ConfigError> {
        let a = &self.animator;
        non_negative("animator.fps", a.fps)?;
        non_negative("animator.fps_transition_ms", a.fps_transition_ms)?;
        non_negative("animator.static_change_interval_ms", a.static_change_interval_ms)?;
        non_negative("animator.reveal_duration_ms", a.reveal_duration_ms)?;
        non_negative("animator.resize_debounce_ms", a.resize_debounce_ms)?;
        non_negative("animator.resize_throttle_ms", a.resize_throttle_ms)?;
        non_negative("audio.progress_throttle_ms", self.audio.progress_throttle_ms)?;

        let volume = self.audio.default_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(ConfigError::Invalid {
                field: "audio.default_volume",
                reason: format!("{volume} is outside 0..=1"),
            });
        }
        Ok(self)
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is not a non-negative number"),
        })
    }
}
