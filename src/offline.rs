//! Headless platform: renders scheduled presets into memory.
//!
//! Useful for servers, CI and previews where no browser exists. The context
//! clock only moves when the host calls `OfflineContext::advance`, and
//! spawned tasks only run in `OfflinePlatform::run_until_stalled`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future;
use futures::task::LocalSpawnExt;
use log::{debug, warn};

use crate::dsp::mixer::Mixer;
use crate::dsp::voice::Voice;
use crate::error::AudioError;
use crate::platform::{
    AudioContext, AudioPlatform, ContextState, GestureHandler, GestureKind, GestureSubscription,
    PlatformFuture, PlatformInfo, SilentClip, WarmUpBuffer,
};
use crate::preset::VoicePlan;

/// Longest window a single `advance` call renders.
pub const MAX_ADVANCE_SECONDS: f64 = 60.0;

/// How the simulated runtime presents itself.
#[derive(Debug, Clone)]
pub struct OfflineOptions {
    pub info: PlatformInfo,
    pub sample_rate: u32,
    /// When false, `create_context` reports a missing audio API.
    pub audio_api: bool,
    /// State of newly created contexts; browsers often start suspended.
    pub initial_state: ContextState,
}

impl Default for OfflineOptions {
    fn default() -> Self {
        OfflineOptions {
            info: PlatformInfo::default(),
            sample_rate: 44100,
            audio_api: true,
            initial_state: ContextState::Running,
        }
    }
}

// ── Platform ────────────────────────────────────────────────

struct Shared {
    options: OfflineOptions,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    contexts: RefCell<Vec<OfflineContext>>,
    listeners: RefCell<Vec<(u64, GestureKind, GestureHandler)>>,
    next_listener: Cell<u64>,
    clip_plays: Cell<usize>,
}

#[derive(Clone)]
pub struct OfflinePlatform {
    shared: Rc<Shared>,
}

impl OfflinePlatform {
    pub fn new(options: OfflineOptions) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        OfflinePlatform {
            shared: Rc::new(Shared {
                options,
                pool: RefCell::new(pool),
                spawner,
                contexts: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                clip_plays: Cell::new(0),
            }),
        }
    }

    /// Run spawned tasks (resumes, unlock flows) until none can progress.
    pub fn run_until_stalled(&self) {
        self.shared.pool.borrow_mut().run_until_stalled();
    }

    /// Deliver a simulated user gesture to every listener for `kind`.
    pub fn dispatch_gesture(&self, kind: GestureKind) {
        let handlers: Vec<GestureHandler> = self
            .shared
            .listeners
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler(kind);
        }
    }

    /// Every context created so far, oldest first.
    pub fn contexts(&self) -> Vec<OfflineContext> {
        self.shared.contexts.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.borrow().len()
    }

    /// Number of silent unlock clips played.
    pub fn clip_plays(&self) -> usize {
        self.shared.clip_plays.get()
    }
}

struct OfflineSubscription {
    shared: Rc<Shared>,
    ids: Vec<u64>,
}

impl GestureSubscription for OfflineSubscription {
    fn remove(self: Box<Self>) {
        self.shared
            .listeners
            .borrow_mut()
            .retain(|(id, _, _)| !self.ids.contains(id));
    }
}

impl AudioPlatform for OfflinePlatform {
    type Context = OfflineContext;

    fn info(&self) -> PlatformInfo {
        self.shared.options.info.clone()
    }

    fn create_context(&self) -> Result<Option<OfflineContext>, AudioError> {
        let options = &self.shared.options;
        if !options.audio_api {
            return Ok(None);
        }
        if options.sample_rate == 0 {
            return Err(AudioError::ContextCreation("sample rate must be positive".to_string()));
        }
        let ctx = OfflineContext::new(options.sample_rate, options.initial_state);
        self.shared.contexts.borrow_mut().push(ctx.clone());
        Ok(Some(ctx))
    }

    fn play_silent_clip(
        &self,
        clip: &SilentClip,
    ) -> Result<PlatformFuture<Result<(), AudioError>>, AudioError> {
        debug!("offline: playing silent clip (muted: {})", clip.muted);
        self.shared.clip_plays.set(self.shared.clip_plays.get() + 1);
        Ok(Box::pin(future::ready(Ok(()))))
    }

    fn listen_for_gestures(
        &self,
        kinds: &[GestureKind],
        handler: GestureHandler,
    ) -> Result<Box<dyn GestureSubscription>, AudioError> {
        let mut listeners = self.shared.listeners.borrow_mut();
        let ids = kinds
            .iter()
            .map(|&kind| {
                let id = self.shared.next_listener.get();
                self.shared.next_listener.set(id + 1);
                listeners.push((id, kind, Rc::clone(&handler)));
                id
            })
            .collect();
        Ok(Box::new(OfflineSubscription {
            shared: Rc::clone(&self.shared),
            ids,
        }))
    }

    fn spawn_local(&self, task: PlatformFuture<()>) {
        if let Err(e) = self.shared.spawner.spawn_local(task) {
            warn!("offline executor rejected task: {e}");
        }
    }
}

// ── Context ─────────────────────────────────────────────────

/// A rendered voice waiting to be mixed.
struct PendingVoice {
    plan: VoicePlan,
    start: usize,
    samples: Vec<f64>,
}

impl PendingVoice {
    fn end(&self) -> usize {
        self.start.saturating_add(self.samples.len())
    }
}

struct Timeline {
    sample_rate: u32,
    state: ContextState,
    /// Context clock in samples.
    frame: usize,
    voices: Vec<PendingVoice>,
    /// Voices scheduled over the context's lifetime.
    scheduled_total: usize,
    warm_ups: usize,
}

/// In-memory audio context. Clones share the same timeline.
#[derive(Clone)]
pub struct OfflineContext {
    timeline: Rc<RefCell<Timeline>>,
}

impl OfflineContext {
    fn new(sample_rate: u32, state: ContextState) -> Self {
        OfflineContext {
            timeline: Rc::new(RefCell::new(Timeline {
                sample_rate,
                state,
                frame: 0,
                voices: Vec::new(),
                scheduled_total: 0,
                warm_ups: 0,
            })),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.timeline.borrow().sample_rate
    }

    /// Simulate the platform suspending output.
    pub fn suspend(&self) {
        self.set_state(ContextState::Suspended);
    }

    /// Simulate an OS interruption (incoming call, other app taking audio).
    pub fn interrupt(&self) {
        self.set_state(ContextState::Interrupted);
    }

    pub fn close(&self) {
        self.set_state(ContextState::Closed);
    }

    fn set_state(&self, state: ContextState) {
        let mut timeline = self.timeline.borrow_mut();
        if timeline.state != ContextState::Closed {
            timeline.state = state;
        }
    }

    /// Render the next `seconds` of output and move the clock forward.
    ///
    /// Returns no samples while the context is not running: the clock is
    /// frozen, like a suspended browser context. Non-finite or non-positive
    /// durations render nothing; longer ones are capped at
    /// `MAX_ADVANCE_SECONDS`.
    pub fn advance(&self, seconds: f64) -> Vec<f32> {
        let mut timeline = self.timeline.borrow_mut();
        if timeline.state != ContextState::Running || !seconds.is_finite() || seconds <= 0.0 {
            return Vec::new();
        }

        let seconds = seconds.min(MAX_ADVANCE_SECONDS);
        let len = (seconds * timeline.sample_rate as f64).round() as usize;
        let from = timeline.frame;
        let to = from.saturating_add(len);
        let len = to - from;

        let mut mixer = Mixer::new();
        mixer.clear(len);
        for voice in timeline.voices.iter().filter(|v| v.start < to && v.end() > from) {
            let skip = from.saturating_sub(voice.start);
            let offset = voice.start.saturating_sub(from);
            mixer.add_slice(offset, &voice.samples[skip..]);
        }

        timeline.frame = to;
        // Finished voices are released, like self-disconnecting nodes.
        timeline.voices.retain(|v| v.end() > to);
        mixer.output()
    }

    /// Plans of the voices that have not finished playing.
    pub fn scheduled_voices(&self) -> Vec<VoicePlan> {
        self.timeline.borrow().voices.iter().map(|v| v.plan.clone()).collect()
    }

    /// Number of voices scheduled since the context was created.
    pub fn scheduled_total(&self) -> usize {
        self.timeline.borrow().scheduled_total
    }

    /// Voices that still have samples left to play.
    pub fn active_voices(&self) -> usize {
        self.timeline.borrow().voices.len()
    }

    pub fn warm_ups(&self) -> usize {
        self.timeline.borrow().warm_ups
    }
}

impl AudioContext for OfflineContext {
    fn state(&self) -> ContextState {
        self.timeline.borrow().state
    }

    fn current_time(&self) -> f64 {
        let timeline = self.timeline.borrow();
        timeline.frame as f64 / timeline.sample_rate as f64
    }

    fn resume(&self) -> PlatformFuture<Result<(), AudioError>> {
        let timeline = Rc::clone(&self.timeline);
        Box::pin(async move {
            let mut timeline = timeline.borrow_mut();
            if timeline.state == ContextState::Closed {
                return Err(AudioError::Resume("context is closed".to_string()));
            }
            timeline.state = ContextState::Running;
            Ok(())
        })
    }

    fn play_buffer(&self, buffer: &WarmUpBuffer) -> Result<(), AudioError> {
        let mut timeline = self.timeline.borrow_mut();
        if timeline.state == ContextState::Closed {
            return Err(AudioError::WarmUp("context is closed".to_string()));
        }
        if buffer.frames == 0 || buffer.sample_rate <= 0.0 {
            return Err(AudioError::WarmUp(format!("invalid buffer {buffer:?}")));
        }
        // The buffer is silent; only the emission counts.
        timeline.warm_ups += 1;
        Ok(())
    }

    fn schedule_voice(&self, plan: &VoicePlan) -> Result<(), AudioError> {
        let mut timeline = self.timeline.borrow_mut();
        if timeline.state == ContextState::Closed {
            return Err(AudioError::Schedule("context is closed".to_string()));
        }
        let voice = Voice::new(plan.clone(), timeline.sample_rate as f64);
        let start = voice.start_sample();
        timeline.voices.push(PendingVoice {
            plan: plan.clone(),
            start,
            samples: voice.render(),
        });
        timeline.scheduled_total += 1;
        Ok(())
    }
}
