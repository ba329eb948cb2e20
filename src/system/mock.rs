//! Scriptable platform for sound system tests: counts side effects and
//! injects failures.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::task::Poll;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::poll_fn;
use futures::task::LocalSpawnExt;

use crate::error::AudioError;
use crate::platform::{
    AudioContext, AudioPlatform, ContextState, GestureHandler, GestureKind, GestureSubscription,
    PlatformFuture, PlatformInfo, SilentClip, WarmUpBuffer,
};
use crate::preset::VoicePlan;

/// Suspend once, like a platform promise settling on a later tick.
fn next_tick() -> impl Future<Output = ()> {
    let mut yielded = false;
    poll_fn(move |cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
}

struct Shared {
    info: PlatformInfo,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,

    audio_api: Cell<bool>,
    fail_context: Cell<bool>,
    initial_state: Cell<ContextState>,
    contexts_created: Cell<usize>,

    state: Cell<ContextState>,
    time: Cell<f64>,
    resume_calls: Cell<usize>,
    fail_resume: Cell<bool>,
    warm_ups: Cell<usize>,
    last_warm_up: Cell<Option<WarmUpBuffer>>,
    fail_warm_up: Cell<bool>,
    voices: RefCell<Vec<VoicePlan>>,
    fail_schedule: Cell<bool>,

    clip_attempts: Cell<usize>,
    last_clip: RefCell<Option<SilentClip>>,
    fail_clip: Cell<bool>,
    reject_clip: Cell<bool>,

    listeners: RefCell<Vec<(u64, GestureKind, GestureHandler)>>,
    next_listener: Cell<u64>,
    fail_listeners: Cell<bool>,
}

#[derive(Clone)]
pub(crate) struct MockPlatform {
    shared: Rc<Shared>,
}

impl MockPlatform {
    fn with_info(info: PlatformInfo) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        MockPlatform {
            shared: Rc::new(Shared {
                info,
                pool: RefCell::new(pool),
                spawner,
                audio_api: Cell::new(true),
                fail_context: Cell::new(false),
                initial_state: Cell::new(ContextState::Running),
                contexts_created: Cell::new(0),
                state: Cell::new(ContextState::Running),
                time: Cell::new(0.0),
                resume_calls: Cell::new(0),
                fail_resume: Cell::new(false),
                warm_ups: Cell::new(0),
                last_warm_up: Cell::new(None),
                fail_warm_up: Cell::new(false),
                voices: RefCell::new(Vec::new()),
                fail_schedule: Cell::new(false),
                clip_attempts: Cell::new(0),
                last_clip: RefCell::new(None),
                fail_clip: Cell::new(false),
                reject_clip: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                fail_listeners: Cell::new(false),
            }),
        }
    }

    pub fn desktop() -> Self {
        MockPlatform::with_info(PlatformInfo {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0".to_string(),
            platform: "Linux x86_64".to_string(),
            max_touch_points: 0,
        })
    }

    pub fn iphone() -> Self {
        MockPlatform::with_info(PlatformInfo {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) Mobile/15E148"
                .to_string(),
            platform: "iPhone".to_string(),
            max_touch_points: 5,
        })
    }

    // Knobs

    pub fn set_audio_api(&self, available: bool) {
        self.shared.audio_api.set(available);
    }

    pub fn fail_context_creation(&self, fail: bool) {
        self.shared.fail_context.set(fail);
    }

    pub fn set_initial_state(&self, state: ContextState) {
        self.shared.initial_state.set(state);
    }

    pub fn set_state(&self, state: ContextState) {
        self.shared.state.set(state);
    }

    pub fn set_time(&self, seconds: f64) {
        self.shared.time.set(seconds);
    }

    pub fn fail_resume(&self, fail: bool) {
        self.shared.fail_resume.set(fail);
    }

    pub fn fail_warm_up(&self, fail: bool) {
        self.shared.fail_warm_up.set(fail);
    }

    pub fn fail_schedule(&self, fail: bool) {
        self.shared.fail_schedule.set(fail);
    }

    pub fn fail_clip_construction(&self, fail: bool) {
        self.shared.fail_clip.set(fail);
    }

    pub fn reject_clip(&self, reject: bool) {
        self.shared.reject_clip.set(reject);
    }

    pub fn fail_listeners(&self, fail: bool) {
        self.shared.fail_listeners.set(fail);
    }

    // Observations

    pub fn state(&self) -> ContextState {
        self.shared.state.get()
    }

    pub fn contexts_created(&self) -> usize {
        self.shared.contexts_created.get()
    }

    pub fn resume_calls(&self) -> usize {
        self.shared.resume_calls.get()
    }

    pub fn warm_ups(&self) -> usize {
        self.shared.warm_ups.get()
    }

    pub fn last_warm_up(&self) -> Option<WarmUpBuffer> {
        self.shared.last_warm_up.get()
    }

    pub fn voices(&self) -> Vec<VoicePlan> {
        self.shared.voices.borrow().clone()
    }

    pub fn clip_attempts(&self) -> usize {
        self.shared.clip_attempts.get()
    }

    pub fn last_clip(&self) -> Option<SilentClip> {
        self.shared.last_clip.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.borrow().len()
    }

    // Driving

    pub fn run_until_stalled(&self) {
        self.shared.pool.borrow_mut().run_until_stalled();
    }

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
}

#[derive(Clone)]
pub(crate) struct MockContext {
    shared: Rc<Shared>,
}

impl AudioContext for MockContext {
    fn state(&self) -> ContextState {
        self.shared.state.get()
    }

    fn current_time(&self) -> f64 {
        self.shared.time.get()
    }

    fn resume(&self) -> PlatformFuture<Result<(), AudioError>> {
        let shared = Rc::clone(&self.shared);
        shared.resume_calls.set(shared.resume_calls.get() + 1);
        let fail = shared.fail_resume.get();
        Box::pin(async move {
            next_tick().await;
            if fail {
                return Err(AudioError::Resume("NotAllowedError".to_string()));
            }
            shared.state.set(ContextState::Running);
            Ok(())
        })
    }

    fn play_buffer(&self, buffer: &WarmUpBuffer) -> Result<(), AudioError> {
        if self.shared.fail_warm_up.get() {
            return Err(AudioError::WarmUp("InvalidStateError".to_string()));
        }
        self.shared.warm_ups.set(self.shared.warm_ups.get() + 1);
        self.shared.last_warm_up.set(Some(*buffer));
        Ok(())
    }

    fn schedule_voice(&self, plan: &VoicePlan) -> Result<(), AudioError> {
        if self.shared.fail_schedule.get() {
            return Err(AudioError::Schedule("node creation failed".to_string()));
        }
        self.shared.voices.borrow_mut().push(plan.clone());
        Ok(())
    }
}

struct MockSubscription {
    shared: Rc<Shared>,
    ids: Vec<u64>,
}

impl GestureSubscription for MockSubscription {
    fn remove(self: Box<Self>) {
        self.shared
            .listeners
            .borrow_mut()
            .retain(|(id, _, _)| !self.ids.contains(id));
    }
}

impl AudioPlatform for MockPlatform {
    type Context = MockContext;

    fn info(&self) -> PlatformInfo {
        self.shared.info.clone()
    }

    fn create_context(&self) -> Result<Option<MockContext>, AudioError> {
        if !self.shared.audio_api.get() {
            return Ok(None);
        }
        if self.shared.fail_context.get() {
            return Err(AudioError::ContextCreation("too many contexts".to_string()));
        }
        self.shared.contexts_created.set(self.shared.contexts_created.get() + 1);
        self.shared.state.set(self.shared.initial_state.get());
        Ok(Some(MockContext {
            shared: Rc::clone(&self.shared),
        }))
    }

    fn play_silent_clip(
        &self,
        clip: &SilentClip,
    ) -> Result<PlatformFuture<Result<(), AudioError>>, AudioError> {
        self.shared.clip_attempts.set(self.shared.clip_attempts.get() + 1);
        *self.shared.last_clip.borrow_mut() = Some(clip.clone());
        if self.shared.fail_clip.get() {
            return Err(AudioError::Playback("Audio constructor threw".to_string()));
        }
        let reject = self.shared.reject_clip.get();
        Ok(Box::pin(async move {
            next_tick().await;
            if reject {
                Err(AudioError::Playback("NotAllowedError".to_string()))
            } else {
                Ok(())
            }
        }))
    }

    fn listen_for_gestures(
        &self,
        kinds: &[GestureKind],
        handler: GestureHandler,
    ) -> Result<Box<dyn GestureSubscription>, AudioError> {
        if self.shared.fail_listeners.get() {
            return Err(AudioError::Listener("no window".to_string()));
        }
        let mut listeners = self.shared.listeners.borrow_mut();
        let mut ids = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let id = self.shared.next_listener.get();
            self.shared.next_listener.set(id + 1);
            listeners.push((id, kind, Rc::clone(&handler)));
            ids.push(id);
        }
        Ok(Box::new(MockSubscription {
            shared: Rc::clone(&self.shared),
            ids,
        }))
    }

    fn spawn_local(&self, task: PlatformFuture<()>) {
        self.shared.spawner.spawn_local(task).expect("mock executor shut down");
    }
}
