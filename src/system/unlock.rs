//! Gesture-gated audio unlock.
//!
//! Some mobile browsers refuse audio until the page plays media from inside
//! a user gesture. The workaround plays a muted silent clip once, from the
//! first click or touch.

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, warn};

use crate::error::AudioError;
use crate::platform::{AudioPlatform, GestureKind, SilentClip};

use super::SoundSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UnlockState {
    Locked { failed_attempts: u32 },
    /// Playback of the silent clip has started but not settled.
    InFlight,
    Unlocked,
    /// Too many failed attempts; no more tries.
    Abandoned,
}

/// Result of an `unlock` call.
#[derive(Debug, Clone, PartialEq)]
pub enum UnlockOutcome {
    /// This platform does not gate audio behind gestures.
    NotRequired,
    AlreadyUnlocked,
    /// Another unlock attempt is still awaiting playback.
    InProgress,
    Unlocked,
    /// Playback was refused. The attempt still counts and is not repeated.
    Rejected(AudioError),
    /// The clip could not be built; a later call will retry.
    Failed(AudioError),
    /// Retries exhausted.
    GaveUp,
}

/// Puts the gate back to `Locked` if an in-flight `unlock` is dropped
/// before playback settles.
struct InFlightGuard<'a> {
    state: &'a Cell<UnlockState>,
    failed_attempts: u32,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        debug!("audio unlock cancelled before playback settled");
        self.state.set(UnlockState::Locked {
            failed_attempts: self.failed_attempts,
        });
    }
}

impl<P: AudioPlatform> SoundSystem<P> {
    /// Play the silent unlock clip, at most once per system.
    ///
    /// Safe to call unconditionally: it returns immediately off-platform or
    /// once the unlock has been attempted.
    pub async fn unlock(&self) -> UnlockOutcome {
        if !self.gesture_unlock {
            return UnlockOutcome::NotRequired;
        }
        let failed_attempts = match self.unlock_state.get() {
            UnlockState::Locked { failed_attempts } => failed_attempts,
            UnlockState::InFlight => return UnlockOutcome::InProgress,
            UnlockState::Unlocked => return UnlockOutcome::AlreadyUnlocked,
            UnlockState::Abandoned => return UnlockOutcome::GaveUp,
        };

        let playback = match self.platform.play_silent_clip(&SilentClip::default()) {
            Ok(playback) => playback,
            Err(e) => {
                let failed_attempts = failed_attempts + 1;
                if failed_attempts >= self.config.max_unlock_attempts {
                    warn!("giving up on audio unlock after {failed_attempts} attempts: {e}");
                    self.unlock_state.set(UnlockState::Abandoned);
                } else {
                    debug!("audio unlock attempt {failed_attempts} failed: {e}");
                    self.unlock_state.set(UnlockState::Locked { failed_attempts });
                }
                return UnlockOutcome::Failed(e);
            }
        };

        self.unlock_state.set(UnlockState::InFlight);
        let pending = InFlightGuard {
            state: &self.unlock_state,
            failed_attempts,
        };
        let outcome = match playback.await {
            Ok(()) => {
                debug!("audio unlocked");
                UnlockOutcome::Unlocked
            }
            Err(e) => {
                debug!("silent clip rejected: {e}");
                UnlockOutcome::Rejected(e)
            }
        };
        std::mem::forget(pending);
        self.unlock_state.set(UnlockState::Unlocked);
        outcome
    }

    /// Whether the unlock has been attempted through to playback.
    pub fn is_unlocked(&self) -> bool {
        self.unlock_state.get() == UnlockState::Unlocked
    }

    /// Register the one-shot gesture listeners. The first qualifying gesture
    /// runs `unlock` then `init`, and removes every listener.
    ///
    /// Calling again while listeners are registered, or after they fired,
    /// does nothing.
    pub fn attach_unlock_listeners(self: &Rc<Self>) -> Result<(), AudioError> {
        if self.gesture_fired.get() || self.listeners.borrow().is_some() {
            return Ok(());
        }

        let system = Rc::downgrade(self);
        let subscription = self.platform.listen_for_gestures(
            &self.config.gesture_events,
            Rc::new(move |kind: GestureKind| {
                if let Some(system) = system.upgrade() {
                    system.on_unlock_gesture(kind);
                }
            }),
        )?;
        *self.listeners.borrow_mut() = Some(subscription);
        debug!("audio unlock listeners attached");
        Ok(())
    }

    /// Remove the gesture listeners if they are still registered.
    pub fn detach_unlock_listeners(&self) {
        let subscription = self.listeners.borrow_mut().take();
        if let Some(subscription) = subscription {
            subscription.remove();
            debug!("audio unlock listeners removed");
        }
    }

    fn on_unlock_gesture(self: Rc<Self>, kind: GestureKind) {
        if self.gesture_fired.replace(true) {
            return;
        }
        debug!("first {} gesture, unlocking audio", kind.event_name());

        let system = Rc::clone(&self);
        self.platform.spawn_local(Box::pin(async move {
            system.unlock().await;
            system.init();
            system.detach_unlock_listeners();
        }));
    }
}
