//! Shared audio context: lazy creation, resume and warm-up.

use log::{debug, error, info};

use crate::error::AudioError;
use crate::platform::{AudioContext, AudioPlatform, WarmUpBuffer};

use super::SoundSystem;

impl<P: AudioPlatform> SoundSystem<P> {
    /// Create the shared context if needed and prime it.
    ///
    /// A suspended or interrupted context gets a resume request; the warm-up
    /// runs once the resume succeeds. A running context is warmed up right
    /// away. Returns `None` when the platform has no audio API.
    pub fn init(&self) -> Option<P::Context> {
        let ctx = self.existing_or_new_context()?;

        if ctx.state().needs_resume() {
            let resume = ctx.resume();
            let resumed = ctx.clone();
            let buffer = self.warm_up_buffer;
            self.platform.spawn_local(Box::pin(async move {
                match resume.await {
                    Ok(()) => {
                        info!("audio context resumed");
                        let _ = warm_up(&resumed, &buffer);
                    }
                    Err(e) => error!("audio resume failed: {e}"),
                }
            }));
        } else {
            let _ = warm_up(&ctx, &self.warm_up_buffer);
        }

        Some(ctx)
    }

    /// The shared context, created on first use.
    ///
    /// An existing suspended context gets a fire-and-forget resume and is
    /// returned as-is; it may still be suspended when the caller uses it.
    pub fn context(&self) -> Option<P::Context> {
        let existing = self.context.borrow().clone();
        let Some(ctx) = existing else {
            return self.init();
        };

        if ctx.state().needs_resume() {
            let resume = ctx.resume();
            self.platform.spawn_local(Box::pin(async move {
                if let Err(e) = resume.await {
                    debug!("background resume failed: {e}");
                }
            }));
        }
        Some(ctx)
    }

    /// Whether the shared context has been created.
    pub fn has_context(&self) -> bool {
        self.context.borrow().is_some()
    }

    fn existing_or_new_context(&self) -> Option<P::Context> {
        if let Some(ctx) = self.context.borrow().as_ref() {
            return Some(ctx.clone());
        }

        match self.platform.create_context() {
            Ok(Some(ctx)) => {
                debug!("audio context created ({:?})", ctx.state());
                *self.context.borrow_mut() = Some(ctx.clone());
                Some(ctx)
            }
            Ok(None) => {
                debug!("no audio API available");
                None
            }
            Err(e) => {
                error!("{e}");
                None
            }
        }
    }
}

/// Emit a one-frame silent buffer through `ctx` to prime the output
/// pipeline. Failures are logged and returned, never raised.
pub fn warm_up<C: AudioContext>(ctx: &C, buffer: &WarmUpBuffer) -> Result<(), AudioError> {
    ctx.play_buffer(buffer).inspect_err(|e| error!("{e}"))
}
