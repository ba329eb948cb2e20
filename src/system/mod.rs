//! The sound system: mute flag, unlock gate, shared context and preset playback.
//!
//! One `SoundSystem` per application, owned by the host (usually behind an
//! `Rc`). All methods take `&self`; state lives in `Cell`/`RefCell` since the
//! host event loop serializes every call.

mod context;
#[cfg(test)]
mod mock;
mod unlock;

use std::cell::{Cell, RefCell};

use log::{debug, warn};

use crate::config::SfxConfig;
use crate::error::AudioError;
use crate::platform::{AudioContext, AudioPlatform, GestureSubscription, PlatformInfo, WarmUpBuffer};
use crate::preset::Preset;

pub use context::warm_up;
pub use unlock::UnlockOutcome;
use unlock::UnlockState;

/// What a `play_sound` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    Muted,
    /// No audio API, or the context could not be created.
    NoContext,
    UnknownPreset,
    Scheduled { preset: Preset, start: f64, stop: f64 },
    Failed(AudioError),
}

impl PlayOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, PlayOutcome::Scheduled { .. })
    }
}

pub struct SoundSystem<P: AudioPlatform> {
    platform: P,
    config: SfxConfig,
    platform_info: PlatformInfo,
    /// Resolved once from the unlock policy and platform info.
    gesture_unlock: bool,
    warm_up_buffer: WarmUpBuffer,
    muted: Cell<bool>,
    unlock_state: Cell<UnlockState>,
    context: RefCell<Option<P::Context>>,
    listeners: RefCell<Option<Box<dyn GestureSubscription>>>,
    gesture_fired: Cell<bool>,
}

impl<P: AudioPlatform> SoundSystem<P> {
    pub fn new(platform: P) -> Self {
        SoundSystem::with_config(platform, SfxConfig::default())
    }

    /// Build a system with a host config. Invalid configs are the caller's
    /// responsibility; see `SfxConfig::validate`.
    pub fn with_config(platform: P, config: SfxConfig) -> Self {
        let platform_info = platform.info();
        let gesture_unlock = config.unlock_policy.resolve(&platform_info);
        debug!(
            "sound system ready (gesture unlock: {gesture_unlock}, platform: {:?})",
            platform_info.platform
        );
        SoundSystem {
            warm_up_buffer: WarmUpBuffer::new(config.warm_up_sample_rate),
            muted: Cell::new(config.start_muted),
            unlock_state: Cell::new(UnlockState::Locked { failed_attempts: 0 }),
            context: RefCell::new(None),
            listeners: RefCell::new(None),
            gesture_fired: Cell::new(false),
            platform,
            config,
            platform_info,
            gesture_unlock,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &SfxConfig {
        &self.config
    }

    pub fn platform_info(&self) -> &PlatformInfo {
        &self.platform_info
    }

    /// Whether this platform needs the gesture unlock workaround.
    pub fn requires_gesture_unlock(&self) -> bool {
        self.gesture_unlock
    }

    // ── Mute ────────────────────────────────────────────────

    /// Gate all playback. Takes effect on the next `play_sound` call.
    pub fn set_muted(&self, muted: bool) {
        debug!("global mute set to {muted}");
        self.muted.set(muted);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.get()
    }

    // ── Playback ────────────────────────────────────────────

    /// Play the preset called `name`. Never fails loudly: the outcome says
    /// what happened and may be ignored.
    pub fn play_sound(&self, name: &str) -> PlayOutcome {
        if self.is_muted() {
            return PlayOutcome::Muted;
        }
        let Some(ctx) = self.context() else {
            return PlayOutcome::NoContext;
        };
        match Preset::from_name(name) {
            Some(preset) => self.schedule(&ctx, preset),
            None => {
                debug!("ignoring unknown sound preset {name:?}");
                PlayOutcome::UnknownPreset
            }
        }
    }

    /// Typed variant of `play_sound`.
    pub fn play(&self, preset: Preset) -> PlayOutcome {
        if self.is_muted() {
            return PlayOutcome::Muted;
        }
        match self.context() {
            Some(ctx) => self.schedule(&ctx, preset),
            None => PlayOutcome::NoContext,
        }
    }

    fn schedule(&self, ctx: &P::Context, preset: Preset) -> PlayOutcome {
        let plan = preset.recipe().schedule(ctx.current_time());
        let (start, stop) = (plan.start, plan.stop);
        match ctx.schedule_voice(&plan) {
            Ok(()) => PlayOutcome::Scheduled { preset, start, stop },
            Err(e) => {
                warn!("failed to play '{preset}': {e}");
                PlayOutcome::Failed(e)
            }
        }
    }
}
