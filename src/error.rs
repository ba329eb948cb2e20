use thiserror::Error;

/// Failures reported by an audio platform.
///
/// None of these ever reach the caller of a playback operation as a panic;
/// they are logged and surfaced inside the returned outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    /// The runtime offers no audio processing API at all.
    #[error("audio API unavailable")]
    ApiUnavailable,
    #[error("failed to create audio context: {0}")]
    ContextCreation(String),
    #[error("audio context resume rejected: {0}")]
    Resume(String),
    #[error("audio warm-up failed: {0}")]
    WarmUp(String),
    /// The silent unlock clip could not be built or its playback was rejected.
    #[error("unlock playback failed: {0}")]
    Playback(String),
    #[error("failed to schedule tone: {0}")]
    Schedule(String),
    #[error("gesture listener error: {0}")]
    Listener(String),
    #[error("unsupported sample rate {0} Hz")]
    SampleRate(u32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
