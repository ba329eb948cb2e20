//! Platform seam: the capabilities the sound system needs from its host.
//!
//! A browser provides these through Web Audio and the DOM (see the `web`
//! module); the `offline` module provides them without any host at all.
//! Everything here is single-threaded: handles are `Rc`-style references and
//! futures are `!Send`, driven by the host's event loop.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::AudioError;
use crate::preset::VoicePlan;

/// A fire-and-forget platform operation that completes later.
pub type PlatformFuture<T> = LocalBoxFuture<'static, T>;

// ── Platform identification ─────────────────────────────────

/// Device identification strings reported by the runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub user_agent: String,
    pub platform: String,
    pub max_touch_points: u32,
}

impl PlatformInfo {
    /// True on iPhone/iPad/iPod, including iPadOS which reports itself as a
    /// touch-capable `MacIntel`. These block audio until a user gesture.
    pub fn requires_gesture_unlock(&self) -> bool {
        const IOS_MARKERS: [&str; 3] = ["iPad", "iPhone", "iPod"];
        IOS_MARKERS.iter().any(|m| self.user_agent.contains(m))
            || (self.platform == "MacIntel" && self.max_touch_points > 1)
    }
}

// ── Context state ───────────────────────────────────────────

/// Lifecycle state of an audio processing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Running,
    Suspended,
    /// Safari-only: playback interrupted by the OS (calls, other apps).
    Interrupted,
    Closed,
}

impl ContextState {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "running" => Some(ContextState::Running),
            "suspended" => Some(ContextState::Suspended),
            "interrupted" => Some(ContextState::Interrupted),
            "closed" => Some(ContextState::Closed),
            _ => None,
        }
    }

    /// Whether a resume request should be issued before playback.
    pub fn needs_resume(self) -> bool {
        matches!(self, ContextState::Suspended | ContextState::Interrupted)
    }
}

// ── Gestures ────────────────────────────────────────────────

/// User gestures that count as an audio-unlocking interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Click,
    TouchStart,
    TouchEnd,
}

impl GestureKind {
    pub const ALL: [GestureKind; 3] =
        [GestureKind::Click, GestureKind::TouchStart, GestureKind::TouchEnd];

    /// DOM event type name.
    pub fn event_name(self) -> &'static str {
        match self {
            GestureKind::Click => "click",
            GestureKind::TouchStart => "touchstart",
            GestureKind::TouchEnd => "touchend",
        }
    }
}

/// Callback invoked by the platform for each qualifying gesture.
pub type GestureHandler = Rc<dyn Fn(GestureKind)>;

/// A set of registered gesture listeners.
pub trait GestureSubscription {
    /// Unregister every listener in the set.
    fn remove(self: Box<Self>);
}

// ── Fixed payloads ──────────────────────────────────────────

/// The near-silent buffer emitted to prime the output pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmUpBuffer {
    pub channels: u32,
    pub frames: u32,
    pub sample_rate: f32,
}

impl WarmUpBuffer {
    pub fn new(sample_rate: f32) -> Self {
        WarmUpBuffer { channels: 1, frames: 1, sample_rate }
    }
}

impl Default for WarmUpBuffer {
    fn default() -> Self {
        WarmUpBuffer::new(22050.0)
    }
}

/// Minimal silent MP3 frame, accepted by Safari.
pub const SILENT_MP3_DATA_URI: &str = "data:audio/mpeg;base64,//uQZAAAAAAAAAAAAAAAAAAAAAExBTUUzLjk4LjIAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Media clip played once to satisfy gesture-gated audio permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilentClip {
    pub src: &'static str,
    pub preload: &'static str,
    pub muted: bool,
    /// Play inline instead of taking over the screen (`playsinline`).
    pub inline: bool,
}

impl Default for SilentClip {
    fn default() -> Self {
        SilentClip {
            src: SILENT_MP3_DATA_URI,
            preload: "auto",
            muted: true,
            inline: true,
        }
    }
}

// ── Traits ──────────────────────────────────────────────────

/// Handle to a live audio processing context.
///
/// Clones refer to the same underlying context.
pub trait AudioContext: Clone + 'static {
    fn state(&self) -> ContextState;

    /// Context clock in seconds; the anchor for scheduled automation.
    fn current_time(&self) -> f64;

    /// Ask the platform to leave the suspended/interrupted state.
    fn resume(&self) -> PlatformFuture<Result<(), AudioError>>;

    /// Emit `buffer` through the output once. The source disconnects itself
    /// when it ends.
    fn play_buffer(&self, buffer: &WarmUpBuffer) -> Result<(), AudioError>;

    /// Build oscillator → gain → output and apply `plan`. The oscillator
    /// disconnects itself after `plan.stop`.
    fn schedule_voice(&self, plan: &VoicePlan) -> Result<(), AudioError>;
}

/// Everything the sound system needs from its runtime.
pub trait AudioPlatform: 'static {
    type Context: AudioContext;

    fn info(&self) -> PlatformInfo;

    /// Construct a new context. `Ok(None)` means the runtime has no audio API.
    fn create_context(&self) -> Result<Option<Self::Context>, AudioError>;

    /// Start playing `clip`.
    ///
    /// An immediate `Err` means the clip could not be built. The returned
    /// future resolves once playback started (and the clip was paused again)
    /// or was rejected.
    fn play_silent_clip(
        &self,
        clip: &SilentClip,
    ) -> Result<PlatformFuture<Result<(), AudioError>>, AudioError>;

    /// Register passive listeners for `kinds` at the application root.
    fn listen_for_gestures(
        &self,
        kinds: &[GestureKind],
        handler: GestureHandler,
    ) -> Result<Box<dyn GestureSubscription>, AudioError>;

    /// Run `task` on the host event loop without waiting for it.
    fn spawn_local(&self, task: PlatformFuture<()>);
}
