//! Engine & Timeline Configuration
//!
//! Plain settings structs with sensible defaults. Every field can be omitted
//! when the settings are read from JSON.
//!
//! ```rust,ignore
//! use lime::settings::EngineSettings;
//!
//! let settings = EngineSettings::from_json_str(r#"{ "max_delta": 0.05 }"#)?;
//! assert_eq!(settings.scrub.optimal_rollback_frames, 150);
//! ```

use serde::Deserialize;

use crate::errors::Result;

/// Global update configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Largest delta (seconds) a single `update` step may consume.
    /// Bigger deltas are split into several steps of at most this size.
    pub max_delta: f32,
    /// Editor timeline scrubbing configuration.
    pub scrub: ScrubSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_delta: 0.1,
            scrub: ScrubSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Parses settings from a JSON document, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Timeline scrubbing configuration used by [`crate::editor::FrameSetter`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScrubSettings {
    /// Rollback window (frames) used when seeking backwards through a cached
    /// timeline. Caches further than twice this distance behind the target are
    /// rebuilt instead of replayed.
    pub optimal_rollback_frames: i32,
    /// Largest per-step delta (in frames) used while fast-forwarding.
    pub fast_forward_step_frames: i32,
    /// Whether animation running-state snapshots are kept between seeks.
    pub cache_animation_states: bool,
}

impl Default for ScrubSettings {
    fn default() -> Self {
        Self {
            optimal_rollback_frames: 150,
            fast_forward_step_frames: 10,
            cache_animation_states: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            EngineSettings::from_json_str(r#"{ "scrub": { "cache_animation_states": true } }"#)
                .unwrap();
        assert!((settings.max_delta - 0.1).abs() < f32::EPSILON);
        assert!(settings.scrub.cache_animation_states);
        assert_eq!(settings.scrub.optimal_rollback_frames, 150);
        assert_eq!(settings.scrub.fast_forward_step_frames, 10);
    }
}
