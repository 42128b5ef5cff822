//! Per-bubble animation state machine.
//!
//! Transitions are fixed:
//! - appear → floating when the appear duration elapses
//! - click → click-return → floating
//! - disappear → removed (the state is deleted and the id reported back)
//! - floating never completes on its own
//!
//! States are replaced wholesale on transition, never merged. All queries
//! take an explicit timestamp in milliseconds; the clock only advances through
//! `update_frame`.

use crate::bubble::{id_noise_seed, BubbleId};
use crate::config::{AnimationConfig, AnimationPreset};
use crate::constants::*;
use crate::curves::Easing;
use crate::noise::{NoiseCacheStats, NoiseField};
use fnv::FnvHashMap;
use glam::Vec2;
use smallvec::SmallVec;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    Appear,
    Disappear,
    Click,
    ClickReturn,
    Floating,
}

impl AnimationKind {
    /// Multiplier applied to the organic positional jitter.
    #[inline]
    pub fn noise_intensity(self) -> f32 {
        match self {
            AnimationKind::Appear => INTENSITY_APPEAR,
            AnimationKind::Floating => INTENSITY_FLOATING,
            AnimationKind::Click => INTENSITY_CLICK,
            AnimationKind::ClickReturn => INTENSITY_CLICK_RETURN,
            AnimationKind::Disappear => INTENSITY_DISAPPEAR,
        }
    }

    /// Only appear and floating get the noise-driven scale/opacity wobble.
    #[inline]
    fn has_organic_variation(self) -> bool {
        matches!(self, AnimationKind::Appear | AnimationKind::Floating)
    }
}

/// Live animation of one bubble.
///
/// `duration_ms` is `None` for floating, which lasts until replaced.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub kind: AnimationKind,
    pub start_time: f64,
    pub duration_ms: Option<f64>,
    pub initial_scale: f32,
    pub target_scale: f32,
    pub initial_opacity: f32,
    pub target_opacity: f32,
    pub easing: Easing,
    pub noise_seed: f32,
    pub rotation_speed: Option<f32>,
}

impl AnimationState {
    fn from_preset(kind: AnimationKind, preset: &AnimationPreset, start_time: f64, seed: f32) -> Self {
        Self {
            kind,
            start_time,
            duration_ms: Some(preset.duration_ms),
            initial_scale: preset.initial_scale,
            target_scale: preset.target_scale,
            initial_opacity: preset.initial_opacity,
            target_opacity: preset.target_opacity,
            easing: preset.easing,
            noise_seed: seed,
            rotation_speed: preset.rotation_speed,
        }
    }

    fn floating(start_time: f64, seed: f32) -> Self {
        Self {
            kind: AnimationKind::Floating,
            start_time,
            duration_ms: None,
            initial_scale: 1.0,
            target_scale: 1.0,
            initial_opacity: 1.0,
            target_opacity: 1.0,
            easing: Easing::NaturalFloat,
            noise_seed: seed,
            rotation_speed: None,
        }
    }

    /// Progress in [0, 1]; floating is always complete.
    #[inline]
    pub fn progress(&self, time: f64) -> f32 {
        match self.duration_ms {
            Some(d) if d > 0.0 => ((time - self.start_time) / d).clamp(0.0, 1.0) as f32,
            _ => 1.0,
        }
    }

    #[inline]
    pub fn is_complete(&self, time: f64) -> bool {
        match self.duration_ms {
            Some(d) => time - self.start_time >= d,
            None => false,
        }
    }
}

/// Frame-rate diagnostics and the advisory quality flag.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationPerformanceStats {
    pub frame_count: u64,
    pub dropped_frames: u64,
    pub average_frame_interval_ms: f64,
    pub fps: f64,
    pub active_animations: usize,
    pub window_dropped_ratio: f32,
    pub reduce_quality: bool,
    pub noise_cache: NoiseCacheStats,
}

#[derive(Debug, Default)]
struct FrameClock {
    last_time: Option<f64>,
    frame_count: u64,
    dropped_frames: u64,
    intervals: VecDeque<f64>,
    interval_sum: f64,
    window_dropped: VecDeque<bool>,
    window_dropped_count: usize,
}

impl FrameClock {
    fn tick(&mut self, time: f64) {
        self.frame_count += 1;
        let Some(last) = self.last_time.replace(time) else {
            return;
        };
        let interval = (time - last).max(0.0);
        let dropped = interval > TARGET_FRAME_INTERVAL_MS * DROPPED_FRAME_FACTOR;
        if dropped {
            self.dropped_frames += 1;
        }
        self.intervals.push_back(interval);
        self.interval_sum += interval;
        self.window_dropped.push_back(dropped);
        if dropped {
            self.window_dropped_count += 1;
        }
        if self.intervals.len() > FRAME_WINDOW {
            if let Some(old) = self.intervals.pop_front() {
                self.interval_sum -= old;
            }
            if let Some(true) = self.window_dropped.pop_front() {
                self.window_dropped_count -= 1;
            }
        }
    }

    fn average_interval(&self) -> f64 {
        if self.intervals.is_empty() {
            0.0
        } else {
            self.interval_sum / self.intervals.len() as f64
        }
    }

    fn window_dropped_ratio(&self) -> f32 {
        if self.window_dropped.is_empty() {
            0.0
        } else {
            self.window_dropped_count as f32 / self.window_dropped.len() as f32
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

pub struct AnimationManager {
    config: AnimationConfig,
    states: FnvHashMap<BubbleId, AnimationState>,
    noise: NoiseField,
    current_time: f64,
    clock: FrameClock,
    degraded: bool,
}

impl AnimationManager {
    pub fn new(config: AnimationConfig) -> Self {
        let noise = NoiseField::with_cache_capacity(config.noise_seed, config.noise_cache_cap);
        Self {
            config,
            states: FnvHashMap::default(),
            noise,
            current_time: 0.0,
            clock: FrameClock::default(),
            degraded: false,
        }
    }

    #[inline]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    #[inline]
    pub fn state(&self, id: BubbleId) -> Option<&AnimationState> {
        self.states.get(&id)
    }

    #[inline]
    pub fn kind(&self, id: BubbleId) -> Option<AnimationKind> {
        self.states.get(&id).map(|s| s.kind)
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.states.len()
    }

    /// Enter `kind` for `id` at `time`, replacing whatever state it had.
    pub fn start_animation(&mut self, id: BubbleId, kind: AnimationKind, time: f64) {
        let seed = id_noise_seed(id);
        let state = match kind {
            AnimationKind::Appear => {
                AnimationState::from_preset(kind, &self.config.appear, time, seed)
            }
            AnimationKind::Disappear => {
                AnimationState::from_preset(kind, &self.config.disappear, time, seed)
            }
            AnimationKind::Click => AnimationState::from_preset(kind, &self.config.click, time, seed),
            AnimationKind::ClickReturn => {
                AnimationState::from_preset(kind, &self.config.click_return, time, seed)
            }
            AnimationKind::Floating => AnimationState::floating(time, seed),
        };
        _ = self.states.insert(id, state);
    }

    pub fn start_appear(&mut self, id: BubbleId, time: f64) {
        self.start_animation(id, AnimationKind::Appear, time);
    }

    pub fn start_disappear(&mut self, id: BubbleId, time: f64) {
        self.start_animation(id, AnimationKind::Disappear, time);
    }

    /// Start the click pulse. Ignored while disappearing so a dying bubble
    /// cannot be resurrected by a late click. Returns whether it started.
    pub fn start_click(&mut self, id: BubbleId, time: f64) -> bool {
        match self.kind(id) {
            Some(AnimationKind::Disappear) => false,
            _ => {
                self.start_animation(id, AnimationKind::Click, time);
                true
            }
        }
    }

    /// Drop the state for `id` immediately.
    pub fn stop_animation(&mut self, id: BubbleId) -> bool {
        self.states.remove(&id).is_some()
    }

    /// Drop every state and the noise memo cache.
    pub fn clear_all_animations(&mut self) {
        let n = self.states.len();
        self.states.clear();
        self.noise.clear_cache();
        if n > 0 {
            log::debug!("[anim] cleared {} animation states", n);
        }
    }

    /// Whether the current state dictates opacity (anything but floating).
    pub fn is_overriding_opacity(&self, id: BubbleId) -> bool {
        matches!(
            self.kind(id),
            Some(AnimationKind::Appear)
                | Some(AnimationKind::Disappear)
                | Some(AnimationKind::Click)
                | Some(AnimationKind::ClickReturn)
        )
    }

    pub fn get_current_scale(&mut self, id: BubbleId, time: f64) -> f32 {
        let Some(state) = self.states.get(&id) else {
            return 1.0;
        };
        let eased = state.easing.apply(state.progress(time));
        let base = state.initial_scale + (state.target_scale - state.initial_scale) * eased;
        if !state.kind.has_organic_variation() {
            return base.max(0.0);
        }
        let seed = state.noise_seed;
        let n = self.noise.noise2d((time * NOISE_TIME_SCALE) as f32, seed);
        (base * (1.0 + n * SCALE_NOISE_VARIATION)).max(0.0)
    }

    pub fn get_current_opacity(&mut self, id: BubbleId, time: f64) -> f32 {
        let Some(state) = self.states.get(&id) else {
            return 1.0;
        };
        let eased = state.easing.apply(state.progress(time));
        let base = state.initial_opacity + (state.target_opacity - state.initial_opacity) * eased;
        if !state.kind.has_organic_variation() {
            return base.clamp(0.0, 1.0);
        }
        let seed = state.noise_seed + 101.0;
        let n = self.noise.noise2d((time * NOISE_TIME_SCALE) as f32, seed);
        (base * (1.0 + n * OPACITY_NOISE_VARIATION)).clamp(0.0, 1.0)
    }

    /// Degrees; only the disappear state spins.
    pub fn get_current_rotation(&self, id: BubbleId, time: f64) -> f32 {
        match self.states.get(&id) {
            Some(s) if s.kind == AnimationKind::Disappear => {
                let elapsed_sec = ((time - s.start_time).max(0.0) / 1000.0) as f32;
                elapsed_sec * s.rotation_speed.unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    /// Organic positional jitter in pixels, at most 6 px in x and 4 px in y
    /// before the state intensity is applied.
    pub fn get_noise_offset(&mut self, id: BubbleId, time: f64) -> Vec2 {
        let (intensity, seed) = match self.states.get(&id) {
            Some(s) => (s.kind.noise_intensity(), s.noise_seed),
            None => (INTENSITY_FLOATING, id_noise_seed(id)),
        };
        if intensity == 0.0 {
            return Vec2::ZERO;
        }
        let t = (time * NOISE_TIME_SCALE) as f32;
        let nx = self
            .noise
            .fractal(t, seed, NOISE_OCTAVES, NOISE_PERSISTENCE, NOISE_LACUNARITY);
        let ny = self.noise.fractal(
            t + 31.7,
            seed + 57.3,
            NOISE_OCTAVES,
            NOISE_PERSISTENCE,
            NOISE_LACUNARITY,
        );
        // slower phased term so neighbouring bubbles do not pulse in lockstep
        let phase = (time * 0.001) as f32 + seed;
        let x = (0.75 * nx + 0.25 * (phase * 0.9).sin()).clamp(-1.0, 1.0);
        let y = (0.75 * ny + 0.25 * (phase * 0.7).cos()).clamp(-1.0, 1.0);
        Vec2::new(x * NOISE_OFFSET_MAX_X, y * NOISE_OFFSET_MAX_Y) * intensity
    }

    /// Advance the clock to `time` and apply every due transition in one pass.
    ///
    /// Returns the ids whose disappear animation completed; their state is
    /// already gone and the caller should remove the bubbles.
    pub fn update_frame(&mut self, time: f64) -> SmallVec<[BubbleId; 8]> {
        self.current_time = time;
        self.clock.tick(time);
        self.update_quality_flag();

        let mut due: SmallVec<[(BubbleId, AnimationKind, f64); 16]> = SmallVec::new();
        for (id, s) in &self.states {
            if s.is_complete(time) {
                let end = s.start_time + s.duration_ms.unwrap_or(0.0);
                due.push((*id, s.kind, end));
            }
        }

        let mut finished = SmallVec::new();
        for (id, kind, end) in due {
            match kind {
                AnimationKind::Appear | AnimationKind::ClickReturn => {
                    self.start_animation(id, AnimationKind::Floating, end);
                }
                AnimationKind::Click => {
                    self.start_animation(id, AnimationKind::ClickReturn, end);
                    // a long frame may have skipped the whole return leg
                    if self.states.get(&id).is_some_and(|s| s.is_complete(time)) {
                        let return_end = end + self.config.click_return.duration_ms;
                        self.start_animation(id, AnimationKind::Floating, return_end);
                    }
                }
                AnimationKind::Disappear => {
                    _ = self.states.remove(&id);
                    finished.push(id);
                }
                AnimationKind::Floating => {}
            }
        }
        finished
    }

    pub fn performance_stats(&self) -> AnimationPerformanceStats {
        let avg = self.clock.average_interval();
        AnimationPerformanceStats {
            frame_count: self.clock.frame_count,
            dropped_frames: self.clock.dropped_frames,
            average_frame_interval_ms: avg,
            fps: if avg > 0.0 { 1000.0 / avg } else { 0.0 },
            active_animations: self.states.len(),
            window_dropped_ratio: self.clock.window_dropped_ratio(),
            reduce_quality: self.degraded,
            noise_cache: self.noise.cache_stats(),
        }
    }

    /// Advisory: true while too many recent frames were dropped.
    #[inline]
    pub fn should_reduce_quality(&self) -> bool {
        self.degraded
    }

    pub fn reset_performance_stats(&mut self) {
        self.clock.reset();
        self.degraded = false;
    }

    fn update_quality_flag(&mut self) {
        if self.clock.window_dropped.len() < FRAME_WINDOW {
            return;
        }
        let ratio = self.clock.window_dropped_ratio();
        let degraded = ratio > QUALITY_DOWNGRADE_RATIO;
        if degraded && !self.degraded {
            log::warn!(
                "[anim] {:.0}% of recent frames dropped; reduced effects advised",
                ratio * 100.0
            );
        } else if !degraded && self.degraded {
            log::info!("[anim] frame rate recovered");
        }
        self.degraded = degraded;
    }
}
