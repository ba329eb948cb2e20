//! Host-supplied configuration for the sound system.
//!
//! Parsed from camelCase JSON (or a JS object on the WASM side). Every field
//! has a default, so `{}` is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::{GestureKind, PlatformInfo};

/// Whether the silent-clip unlock workaround runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnlockPolicy {
    /// Decide from the platform identification strings.
    #[default]
    Auto,
    Always,
    Never,
}

impl UnlockPolicy {
    /// Resolve the policy against the reported platform.
    pub fn resolve(self, info: &PlatformInfo) -> bool {
        match self {
            UnlockPolicy::Auto => info.requires_gesture_unlock(),
            UnlockPolicy::Always => true,
            UnlockPolicy::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SfxConfig {
    /// Initial value of the mute flag.
    pub start_muted: bool,
    pub unlock_policy: UnlockPolicy,
    /// Clip construction failures tolerated before the unlock gate gives up.
    pub max_unlock_attempts: u32,
    /// Sample rate of the one-frame warm-up buffer.
    pub warm_up_sample_rate: f32,
    /// Gesture events that trigger the one-shot unlock.
    pub gesture_events: Vec<GestureKind>,
}

impl Default for SfxConfig {
    fn default() -> Self {
        SfxConfig {
            start_muted: false,
            unlock_policy: UnlockPolicy::Auto,
            max_unlock_attempts: 3,
            warm_up_sample_rate: 22050.0,
            gesture_events: GestureKind::ALL.to_vec(),
        }
    }
}

impl SfxConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SfxConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_unlock_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "maxUnlockAttempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.warm_up_sample_rate.is_finite() && self.warm_up_sample_rate > 0.0) {
            return Err(ConfigError::Invalid {
                field: "warmUpSampleRate",
                reason: format!("must be a positive rate, got {}", self.warm_up_sample_rate),
            });
        }
        if self.gesture_events.is_empty() {
            return Err(ConfigError::Invalid {
                field: "gestureEvents",
                reason: "at least one gesture event is required".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SfxConfig::from_json("{}").expect("parse failed");
        assert_eq!(config, SfxConfig::default());
        assert_eq!(config.gesture_events.len(), 3);
    }

    #[test]
    fn camel_case_fields() {
        let config = SfxConfig::from_json(
            r#"{"startMuted": true, "unlockPolicy": "never", "maxUnlockAttempts": 5,
                "gestureEvents": ["click"]}"#,
        )
        .expect("parse failed");
        assert!(config.start_muted);
        assert_eq!(config.unlock_policy, UnlockPolicy::Never);
        assert_eq!(config.max_unlock_attempts, 5);
        assert_eq!(config.gesture_events, vec![GestureKind::Click]);
        assert_eq!(config.warm_up_sample_rate, 22050.0);
    }

    #[test]
    fn rejects_zero_attempts() {
        let err = SfxConfig::from_json(r#"{"maxUnlockAttempts": 0}"#).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { field: "maxUnlockAttempts", .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_bad_sample_rate_and_empty_gestures() {
        assert!(SfxConfig::from_json(r#"{"warmUpSampleRate": 0}"#).is_err());
        assert!(SfxConfig::from_json(r#"{"gestureEvents": []}"#).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SfxConfig::from_json("{startMuted").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn policy_resolution() {
        let desktop = PlatformInfo::default();
        let iphone = PlatformInfo {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)".to_string(),
            ..PlatformInfo::default()
        };
        assert!(!UnlockPolicy::Auto.resolve(&desktop));
        assert!(UnlockPolicy::Auto.resolve(&iphone));
        assert!(UnlockPolicy::Always.resolve(&desktop));
        assert!(!UnlockPolicy::Never.resolve(&iphone));
    }
}
