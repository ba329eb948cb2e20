//! Browser backend: Web Audio, `HTMLAudioElement` and DOM listeners via
//! web-sys, plus the `SoundEffects` class exported to JavaScript.

use std::rc::Rc;

use js_sys::{Array, Function, Promise, Reflect};
use log::error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AddEventListenerOptions, AudioNode, AudioParam, AudioScheduledSourceNode, HtmlAudioElement,
    OscillatorType, Window,
};

use crate::config::SfxConfig;
use crate::dsp::oscillator::Waveform;
use crate::error::AudioError;
use crate::platform::{
    AudioContext, AudioPlatform, ContextState, GestureHandler, GestureKind, GestureSubscription,
    PlatformFuture, PlatformInfo, SilentClip, WarmUpBuffer,
};
use crate::preset::{ParamEvent, RampKind, VoicePlan};
use crate::system::SoundSystem;

/// Best-effort text for a thrown JS value.
fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{value:?}"))
}

// ── Platform ────────────────────────────────────────────────

#[derive(Clone)]
pub struct WebPlatform {
    window: Window,
}

impl WebPlatform {
    /// Bind to the global `window`. Fails outside a browser main thread.
    pub fn new() -> Result<Self, AudioError> {
        let window = web_sys::window().ok_or(AudioError::ApiUnavailable)?;
        Ok(WebPlatform { window })
    }
}

impl AudioPlatform for WebPlatform {
    type Context = WebContext;

    fn info(&self) -> PlatformInfo {
        let navigator = self.window.navigator();
        let max_touch_points = Reflect::get(&navigator, &JsValue::from_str("maxTouchPoints"))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        PlatformInfo {
            user_agent: navigator.user_agent().unwrap_or_default(),
            platform: navigator.platform().unwrap_or_default(),
            max_touch_points: max_touch_points.max(0.0) as u32,
        }
    }

    fn create_context(&self) -> Result<Option<WebContext>, AudioError> {
        // Older Safari only ships the prefixed constructor.
        let constructor = ["AudioContext", "webkitAudioContext"].iter().find_map(|name| {
            Reflect::get(&self.window, &JsValue::from_str(name))
                .ok()
                .and_then(|value| value.dyn_into::<Function>().ok())
        });
        let Some(constructor) = constructor else {
            return Ok(None);
        };
        let ctx = Reflect::construct(&constructor, &Array::new())
            .map_err(|e| AudioError::ContextCreation(js_message(&e)))?;
        Ok(Some(WebContext { ctx: ctx.unchecked_into() }))
    }

    fn play_silent_clip(
        &self,
        clip: &SilentClip,
    ) -> Result<PlatformFuture<Result<(), AudioError>>, AudioError> {
        let playback_error = |e: JsValue| AudioError::Playback(js_message(&e));

        let audio = HtmlAudioElement::new_with_src(clip.src).map_err(playback_error)?;
        audio.set_preload(clip.preload);
        audio.set_muted(clip.muted);
        if clip.inline {
            audio.set_attribute("playsinline", "true").map_err(playback_error)?;
        }
        let playing = audio.play().map_err(playback_error)?;

        Ok(Box::pin(async move {
            let result = JsFuture::from(playing).await;
            let _ = audio.pause();
            result.map(|_| ()).map_err(playback_error)
        }))
    }

    fn listen_for_gestures(
        &self,
        kinds: &[GestureKind],
        handler: GestureHandler,
    ) -> Result<Box<dyn GestureSubscription>, AudioError> {
        let options = AddEventListenerOptions::new();
        options.set_passive(true);

        let mut subscription = WebGestureSubscription {
            window: self.window.clone(),
            listeners: Vec::with_capacity(kinds.len()),
        };
        for &kind in kinds {
            let handler = Rc::clone(&handler);
            let closure = Closure::<dyn Fn()>::new(move || handler(kind));
            let added = self
                .window
                .add_event_listener_with_callback_and_add_event_listener_options(
                    kind.event_name(),
                    closure.as_ref().unchecked_ref(),
                    &options,
                );
            if let Err(e) = added {
                Box::new(subscription).remove();
                return Err(AudioError::Listener(js_message(&e)));
            }
            subscription.listeners.push((kind, closure));
        }
        Ok(Box::new(subscription))
    }

    fn spawn_local(&self, task: PlatformFuture<()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

struct WebGestureSubscription {
    window: Window,
    listeners: Vec<(GestureKind, Closure<dyn Fn()>)>,
}

impl GestureSubscription for WebGestureSubscription {
    fn remove(self: Box<Self>) {
        for (kind, closure) in &self.listeners {
            let _ = self.window.remove_event_listener_with_callback(
                kind.event_name(),
                closure.as_ref().unchecked_ref(),
            );
        }
    }
}

// ── Context ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct WebContext {
    ctx: web_sys::AudioContext,
}

impl WebContext {
    pub fn raw(&self) -> &web_sys::AudioContext {
        &self.ctx
    }

    fn build_voice(&self, plan: &VoicePlan) -> Result<(), JsValue> {
        let osc = self.ctx.create_oscillator()?;
        let gain = self.ctx.create_gain()?;
        osc.set_type(oscillator_type(plan.waveform));
        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&self.ctx.destination())?;

        apply_events(&osc.frequency(), &plan.frequency)?;
        apply_events(&gain.gain(), &plan.gain)?;

        let source: &AudioScheduledSourceNode = &osc;
        source.start_with_when(plan.start)?;
        source.stop_with_when(plan.stop)?;
        disconnect_on_end(source, vec![osc.clone().into(), gain.into()]);
        Ok(())
    }

    fn emit_buffer(&self, buffer: &WarmUpBuffer) -> Result<(), JsValue> {
        let data = self.ctx.create_buffer(buffer.channels, buffer.frames, buffer.sample_rate)?;
        let node = self.ctx.create_buffer_source()?;
        node.set_buffer(Some(&data));
        node.connect_with_audio_node(&self.ctx.destination())?;
        let source: &AudioScheduledSourceNode = &node;
        source.start_with_when(0.0)?;
        disconnect_on_end(source, vec![node.clone().into()]);
        Ok(())
    }
}

impl AudioContext for WebContext {
    fn state(&self) -> ContextState {
        // Read as a string: Safari's "interrupted" is not in the typed enum.
        Reflect::get(&self.ctx, &JsValue::from_str("state"))
            .ok()
            .and_then(|v| v.as_string())
            .and_then(|s| ContextState::from_name(&s))
            .unwrap_or(ContextState::Running)
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn resume(&self) -> PlatformFuture<Result<(), AudioError>> {
        let resume = self.ctx.resume();
        Box::pin(async move {
            let promise: Promise = resume.map_err(|e| AudioError::Resume(js_message(&e)))?;
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| AudioError::Resume(js_message(&e)))
        })
    }

    fn play_buffer(&self, buffer: &WarmUpBuffer) -> Result<(), AudioError> {
        self.emit_buffer(buffer)
            .map_err(|e| AudioError::WarmUp(js_message(&e)))
    }

    fn schedule_voice(&self, plan: &VoicePlan) -> Result<(), AudioError> {
        self.build_voice(plan)
            .map_err(|e| AudioError::Schedule(js_message(&e)))
    }
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Triangle => OscillatorType::Triangle,
    }
}

/// The `AudioParam` automation calls a `VoicePlan` needs.
trait Automatable {
    fn set_at(&self, value: f32, time: f64) -> Result<(), JsValue>;
    fn linear_to(&self, value: f32, time: f64) -> Result<(), JsValue>;
    fn exponential_to(&self, value: f32, time: f64) -> Result<(), JsValue>;
}

impl Automatable for AudioParam {
    fn set_at(&self, value: f32, time: f64) -> Result<(), JsValue> {
        self.set_value_at_time(value, time).map(|_| ())
    }

    fn linear_to(&self, value: f32, time: f64) -> Result<(), JsValue> {
        self.linear_ramp_to_value_at_time(value, time).map(|_| ())
    }

    fn exponential_to(&self, value: f32, time: f64) -> Result<(), JsValue> {
        self.exponential_ramp_to_value_at_time(value, time).map(|_| ())
    }
}

fn apply_events<A: Automatable>(param: &A, events: &[ParamEvent]) -> Result<(), JsValue> {
    for event in events {
        let value = event.value as f32;
        match event.kind {
            RampKind::Set => param.set_at(value, event.time)?,
            RampKind::Linear => param.linear_to(value, event.time)?,
            RampKind::Exponential => param.exponential_to(value, event.time)?,
        }
    }
    Ok(())
}

/// Detach `nodes` from the graph once `source` has finished playing.
fn disconnect_on_end(source: &AudioScheduledSourceNode, nodes: Vec<AudioNode>) {
    let on_ended = Closure::once_into_js(move || {
        for node in &nodes {
            let _ = node.disconnect();
        }
    });
    source.set_onended(Some(on_ended.unchecked_ref()));
}

// ── JS API ──────────────────────────────────────────────────

/// WASM-exposed sound effects controller. Create one per page.
#[wasm_bindgen]
pub struct SoundEffects {
    system: Rc<SoundSystem<WebPlatform>>,
}

#[wasm_bindgen]
impl SoundEffects {
    /// `config` is an optional `SfxConfig`-shaped object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SoundEffects, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            SfxConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<SfxConfig>(config)
                .map_err(|e| JsValue::from_str(&format!("{e}")))?
        };
        config.validate().map_err(|e| JsValue::from_str(&format!("{e}")))?;
        let platform = WebPlatform::new().map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(SoundEffects {
            system: Rc::new(SoundSystem::with_config(platform, config)),
        })
    }

    #[wasm_bindgen(js_name = setGlobalMute)]
    pub fn set_global_mute(&self, muted: bool) {
        self.system.set_muted(muted);
    }

    #[wasm_bindgen(getter)]
    pub fn muted(&self) -> bool {
        self.system.is_muted()
    }

    /// Resolves once the unlock attempt settles. Never rejects.
    #[wasm_bindgen(js_name = unlockIOSAudio)]
    pub fn unlock_ios_audio(&self) -> Promise {
        let system = Rc::clone(&self.system);
        wasm_bindgen_futures::future_to_promise(async move {
            system.unlock().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = attachAudioUnlockListeners)]
    pub fn attach_audio_unlock_listeners(&self) {
        if let Err(e) = self.system.attach_unlock_listeners() {
            error!("{e}");
        }
    }

    #[wasm_bindgen(js_name = initAudio)]
    pub fn init_audio(&self) -> Option<web_sys::AudioContext> {
        self.system.init().map(|ctx| ctx.raw().clone())
    }

    #[wasm_bindgen(js_name = playSound)]
    pub fn play_sound(&self, name: &str) {
        let _ = self.system.play_sound(name);
    }
}
