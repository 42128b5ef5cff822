//! Bubble field orchestrator.
//!
//! Owns the live bubbles and drives one frame at a time:
//! 1. advance the animation clock and collect finished disappear animations
//! 2. integrate physics for every live bubble (dt clamped to 1/60 s)
//! 3. remove finished / out-of-canvas bubbles, returning them to the pool
//! 4. replenish the population from the catalogue
//!
//! Typical usage:
//! - Construct with `BubbleSimulator::new(config, catalogue)`
//! - Call `update_frame()` (or `update_frame_at(now_ms)`) once per host tick
//! - Forward pointer hits through `find_bubble_at_position` and
//!   `trigger_click_animation`

use crate::animation::{AnimationManager, AnimationPerformanceStats};
use crate::bubble::*;
use crate::catalogue::{Catalogue, CatalogueItem, EntityType};
use crate::config::SimulatorConfig;
use crate::constants::*;
use crate::curves::Trajectory;
use crate::error::{BubbleError, Result};
use crate::pool::{ObjectPool, PoolStats};
use crate::tracker::{ContentTracker, TrackerStats};
use glam::Vec2;
use instant::Instant;
use rand::prelude::*;
use std::f32::consts::TAU;

/// Diagnostics snapshot for the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulatorStats {
    pub active_bubbles: usize,
    pub max_bubbles: usize,
    pub generated: u64,
    pub removed: u64,
    pub generation_failures: u64,
    pub generation_halted: bool,
    /// Live bubbles per type, in `EntityType::ALL` order.
    pub by_type: [usize; 5],
    pub pool: PoolStats,
    pub tracker: TrackerStats,
}

pub struct BubbleSimulator {
    config: SimulatorConfig,
    catalogue: Catalogue,
    tracker: ContentTracker,
    animations: AnimationManager,
    bubbles: Vec<BubbleEntity>,
    pool: ObjectPool<BubbleEntity>,
    scratch_ids: ObjectPool<Vec<BubbleId>>,
    rng: StdRng,
    next_id: BubbleId,
    /// Set by the first clock-driven frame.
    epoch: Option<Instant>,
    last_frame_time: Option<f64>,
    generation_halted: bool,
    generated: u64,
    removed: u64,
    generation_failures: u64,
}

impl BubbleSimulator {
    pub fn new(config: SimulatorConfig, catalogue: Catalogue) -> Self {
        let mut tracker = ContentTracker::new(config.tracker.clone());
        tracker.initialize_content_pool(&catalogue.songs, &catalogue.persons, &catalogue.tags);
        let animations = AnimationManager::new(config.animation.clone());
        let pool = ObjectPool::new(config.pool_max_idle, BubbleEntity::default, BubbleEntity::reset)
            .with_prewarm(config.max_bubbles);
        let scratch_ids = ObjectPool::with_default(4, |v: &mut Vec<BubbleId>| v.clear());
        // Derive the spawn RNG from the base seed so it stays independent of the tracker's
        let rng = StdRng::seed_from_u64(config.seed ^ 0x9E37_79B9_7F4A_7C15);
        log::info!(
            "[sim] field {}x{} capacity={} dedup={} catalogue={} items",
            config.canvas_width,
            config.canvas_height,
            config.max_bubbles,
            config.dedup,
            catalogue.len()
        );
        Self {
            config,
            catalogue,
            tracker,
            animations,
            bubbles: Vec::new(),
            pool,
            scratch_ids,
            rng,
            next_id: 1,
            epoch: None,
            last_frame_time: None,
            generation_halted: false,
            generated: 0,
            removed: 0,
            generation_failures: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    #[inline]
    pub fn bubbles(&self) -> &[BubbleEntity] {
        &self.bubbles
    }

    pub fn bubble(&self, id: BubbleId) -> Option<&BubbleEntity> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    #[inline]
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    #[inline]
    pub fn tracker(&self) -> &ContentTracker {
        &self.tracker
    }

    #[inline]
    pub fn animations(&self) -> &AnimationManager {
        &self.animations
    }

    /// Host timestamp of the most recent frame (0 before the first one).
    #[inline]
    pub fn now(&self) -> f64 {
        self.last_frame_time.unwrap_or(0.0)
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) {
        self.config.canvas_width = width.max(0.0);
        self.config.canvas_height = height.max(0.0);
    }

    /// Build a new, not yet added, bubble.
    ///
    /// In dedup mode the content comes from the tracker's weighted selection;
    /// otherwise a type is drawn uniformly and a random instance of it picked,
    /// falling back to the other types when the drawn one has none.
    pub fn generate_bubble(&mut self) -> Result<BubbleEntity> {
        let now = self.now();
        let item = if self.config.dedup {
            self.next_tracked_content(now)?
        } else {
            self.random_content()?
        };

        let mut bubble = self.pool.acquire();
        bubble.id = self.next_id;
        self.next_id += 1;
        bubble.assign_content(&item);
        bubble.size =
            size_for_related_count(item.related_count, self.config.min_size, self.config.max_size);

        let r = bubble.radius();
        bubble.position = Vec2::new(
            spawn_coordinate(&mut self.rng, r, self.config.canvas_width),
            spawn_coordinate(&mut self.rng, r, self.config.canvas_height),
        );

        let angle = self.rng.gen::<f32>() * TAU;
        let dir = Vec2::new(angle.cos(), angle.sin() - SPAWN_UPWARD_BIAS).normalize_or_zero();
        bubble.velocity = dir * self.config.max_speed * SPAWN_SPEED_FRACTION;

        let (lo, hi) = (
            self.config.min_lifespan_ms,
            self.config.max_lifespan_ms.max(self.config.min_lifespan_ms),
        );
        bubble.lifespan = if hi > lo {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        };
        bubble.time_offset = id_time_offset(bubble.id);
        bubble.base_opacity = BASE_OPACITY;
        bubble.opacity = 0.0;
        bubble.scale = 0.0;
        Ok(bubble)
    }

    /// Put `bubble` on screen. Returns `false` (and recycles the entity) when
    /// the field is full or the tracker refuses the content binding.
    pub fn add_bubble(&mut self, bubble: BubbleEntity) -> bool {
        let now = self.now();
        if self.bubbles.len() >= self.config.max_bubbles {
            self.pool.release(bubble);
            return false;
        }
        if self.config.dedup
            && !self.tracker.track_displayed_item(
                &bubble.content_id,
                bubble.id,
                bubble.entity_type,
                now,
            )
        {
            log::debug!("[sim] content {} refused for bubble {}", bubble.content_id, bubble.id);
            self.pool.release(bubble);
            return false;
        }
        self.animations.start_appear(bubble.id, now);
        log::debug!(
            "[sim] spawn bubble {} {} '{}' size={:.0}",
            bubble.id,
            bubble.entity_type.as_str(),
            bubble.name,
            bubble.size
        );
        self.generated += 1;
        self.bubbles.push(bubble);
        true
    }

    /// `generate_bubble` + `add_bubble`, reporting a refused binding as an error.
    pub fn spawn_bubble(&mut self) -> Result<BubbleId> {
        let bubble = self.generate_bubble()?;
        let id = bubble.id;
        let content_id = bubble.content_id.clone();
        if self.add_bubble(bubble) {
            Ok(id)
        } else {
            Err(BubbleError::DisplayCapacity(content_id))
        }
    }

    /// Remove a bubble immediately, skipping its disappear animation.
    pub fn remove_bubble(&mut self, id: BubbleId) -> bool {
        let now = self.now();
        self.remove_bubble_at(id, now)
    }

    /// Topmost (last drawn) bubble under the point, if any.
    pub fn find_bubble_at_position(&self, x: f32, y: f32) -> Option<&BubbleEntity> {
        let p = Vec2::new(x, y);
        self.bubbles
            .iter()
            .rev()
            .find(|b| !b.marked_for_deletion && b.contains(p))
    }

    pub fn trigger_click_animation(&mut self, id: BubbleId) -> bool {
        if self.bubble(id).is_none() {
            return false;
        }
        let now = self.now();
        self.animations.start_click(id, now)
    }

    /// Advance one frame using the monotonic clock.
    pub fn update_frame(&mut self) -> &[BubbleEntity] {
        let epoch = *self.epoch.get_or_insert_with(Instant::now);
        let now = epoch.elapsed().as_secs_f64() * 1000.0;
        self.update_frame_at(now)
    }

    /// Advance one frame to host time `now` (milliseconds).
    pub fn update_frame_at(&mut self, now: f64) -> &[BubbleEntity] {
        let dt = match self.last_frame_time {
            Some(last) => (((now - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT_SEC),
            None => 0.0,
        };
        self.last_frame_time = Some(now);

        let mut doomed = self.scratch_ids.acquire();
        doomed.extend(self.animations.update_frame(now));
        self.disappear_evicted(now);

        let (width, height) = (self.config.canvas_width, self.config.canvas_height);
        let disappear_fraction = self.config.disappear_at_fraction;
        for bubble in self.bubbles.iter_mut() {
            if bubble.marked_for_deletion {
                continue;
            }
            if bubble.is_outside(width, height)
                || (bubble.disappearing && self.animations.state(bubble.id).is_none())
            {
                bubble.marked_for_deletion = true;
                doomed.push(bubble.id);
                continue;
            }

            bubble.age += dt as f64 * 1000.0;
            if dt > 0.0 {
                integrate_bubble(bubble, dt, now, &mut self.animations, &self.config);
            }
            if !bubble.disappearing && bubble.age > bubble.lifespan * disappear_fraction {
                bubble.disappearing = true;
                self.animations.start_disappear(bubble.id, now);
            }
            apply_visual_state(bubble, now, &mut self.animations);
        }

        for id in doomed.drain(..) {
            _ = self.remove_bubble_at(id, now);
        }
        self.scratch_ids.release(doomed);

        self.replenish();
        self.disappear_evicted(now);
        &self.bubbles
    }

    /// Hard reset onto a new catalogue: bubbles, animations, caches and pools
    /// are cleared and the tracker rebuilt.
    pub fn update_music_database(&mut self, catalogue: Catalogue) {
        for bubble in self.bubbles.drain(..) {
            self.pool.release(bubble);
        }
        self.animations.clear_all_animations();
        self.pool.clear();
        self.scratch_ids.clear();
        self.catalogue = catalogue;
        self.tracker.initialize_content_pool(
            &self.catalogue.songs,
            &self.catalogue.persons,
            &self.catalogue.tags,
        );
        self.generation_halted = false;
        log::info!(
            "[sim] music database replaced: {} items",
            self.catalogue.len()
        );
    }

    pub fn get_stats(&self) -> SimulatorStats {
        let mut by_type = [0usize; 5];
        for b in &self.bubbles {
            if let Some(i) = EntityType::ALL.iter().position(|t| *t == b.entity_type) {
                by_type[i] += 1;
            }
        }
        SimulatorStats {
            active_bubbles: self.bubbles.len(),
            max_bubbles: self.config.max_bubbles,
            generated: self.generated,
            removed: self.removed,
            generation_failures: self.generation_failures,
            generation_halted: self.generation_halted,
            by_type,
            pool: self.pool.stats(),
            tracker: self.tracker.statistics(),
        }
    }

    pub fn get_animation_performance_stats(&self) -> AnimationPerformanceStats {
        self.animations.performance_stats()
    }

    /// Packed render snapshot, back to front.
    pub fn write_instances(&self, out: &mut Vec<BubbleInstance>) {
        out.clear();
        out.extend(self.bubbles.iter().map(BubbleEntity::instance));
    }

    fn next_tracked_content(&mut self, now: f64) -> Result<CatalogueItem> {
        if self.catalogue.is_empty() {
            return Err(BubbleError::CatalogueEmpty);
        }
        let content = self
            .tracker
            .select_next_content(now)
            .ok_or(BubbleError::ContentExhausted)?;
        let mut item = self.catalogue.find(&content.id).unwrap_or_else(|| CatalogueItem {
            id: content.id.clone(),
            name: content.name.clone(),
            entity_type: content.entity_type,
            related_count: content.related_count,
            roles: Default::default(),
        });
        // people show under any of their credited roles
        if item.roles.len() > 1 {
            if let Some(role) = item.roles.choose(&mut self.rng) {
                item.entity_type = *role;
            }
        }
        Ok(item)
    }

    fn random_content(&mut self) -> Result<CatalogueItem> {
        let first = EntityType::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(EntityType::Song);
        let fallbacks = EntityType::ALL.into_iter().filter(|t| *t != first);
        for entity_type in std::iter::once(first).chain(fallbacks) {
            if let Some(item) = self.catalogue.random_instance(entity_type, &mut self.rng) {
                return Ok(item);
            }
        }
        Err(BubbleError::CatalogueEmpty)
    }

    fn replenish(&mut self) {
        while !self.generation_halted && self.bubbles.len() < self.config.max_bubbles {
            match self.spawn_bubble() {
                Ok(_) => {}
                Err(BubbleError::CatalogueEmpty) => {
                    self.generation_failures += 1;
                    self.generation_halted = true;
                    log::warn!("[sim] catalogue empty; bubble generation halted until reload");
                    break;
                }
                Err(e) => {
                    // try again next frame
                    self.generation_failures += 1;
                    log::debug!("[sim] replenish stopped: {}", e);
                    break;
                }
            }
        }
    }

    fn disappear_evicted(&mut self, now: f64) {
        for id in self.tracker.drain_evicted() {
            if let Some(b) = self.bubbles.iter_mut().find(|b| b.id == id) {
                if !b.disappearing {
                    b.disappearing = true;
                    self.animations.start_disappear(id, now);
                }
            }
        }
    }

    fn remove_bubble_at(&mut self, id: BubbleId, now: f64) -> bool {
        let Some(idx) = self.bubbles.iter().position(|b| b.id == id) else {
            return false;
        };
        // keep draw order stable for hit testing
        let bubble = self.bubbles.remove(idx);
        if self.config.dedup {
            _ = self.tracker.untrack_displayed_item(id, now);
        }
        _ = self.animations.stop_animation(id);
        log::debug!("[sim] remove bubble {} '{}'", id, bubble.name);
        self.pool.release(bubble);
        self.removed += 1;
        true
    }
}

#[inline]
fn spawn_coordinate<R: Rng + ?Sized>(rng: &mut R, radius: f32, extent: f32) -> f32 {
    if extent > 2.0 * radius {
        rng.gen_range(radius..=extent - radius)
    } else {
        extent * 0.5
    }
}

/// One physics step for a single bubble. `dt` in seconds, `now` in ms.
fn integrate_bubble(
    bubble: &mut BubbleEntity,
    dt: f32,
    now: f64,
    animations: &mut AnimationManager,
    config: &SimulatorConfig,
) {
    let size_ratio = (bubble.size / config.max_size.max(1.0)).clamp(0.0, 1.0);

    bubble.position += bubble.velocity * dt;

    // smaller bubbles rise faster
    let density = DENSITY_BASE + DENSITY_SPAN * size_ratio;
    let buoyancy = BUOYANCY_ACCEL * (config.min_size / bubble.size.max(1.0)) * density;
    bubble.velocity.y -= buoyancy * dt;

    let drag = (DRAG_BASE - DRAG_SIZE_PENALTY * size_ratio).powf(dt * 60.0);
    bubble.velocity *= drag;

    let t = (now / 1000.0) as f32 + bubble.time_offset;
    let motion_scale = 1.25 - 0.5 * size_ratio;
    let drift = Trajectory::Wander.sample(t / WANDER_PERIOD_SEC) * WANDER_STRENGTH
        + Trajectory::Buoyancy.sample(t / SWAY_PERIOD_SEC) * SWAY_STRENGTH
        + Trajectory::Wind.sample(t / WIND_PERIOD_SEC) * WIND_STRENGTH;
    bubble.velocity += drift * motion_scale * dt;

    let jitter = animations.get_noise_offset(bubble.id, now);
    bubble.position += jitter * JITTER_POSITION_SCALE * (0.5 + 0.5 * size_ratio);

    let terminal = config.max_speed * (TERMINAL_SPEED_BASE + TERMINAL_SPEED_SPAN * size_ratio);
    bubble.velocity = bubble.velocity.clamp_length_max(terminal);

    resolve_boundary_collision(bubble, config.canvas_width, config.canvas_height);
}

/// Pull scale/rotation/opacity from the animation state and blend opacity
/// with the age-decaying breathing baseline when no animation overrides it.
fn apply_visual_state(bubble: &mut BubbleEntity, now: f64, animations: &mut AnimationManager) {
    bubble.scale = animations.get_current_scale(bubble.id, now);
    bubble.rotation = animations.get_current_rotation(bubble.id, now);
    bubble.animated_opacity = animations.get_current_opacity(bubble.id, now);

    if animations.is_overriding_opacity(bubble.id) {
        bubble.opacity = bubble.animated_opacity;
        return;
    }
    let life = if bubble.lifespan > 0.0 {
        (bubble.age / bubble.lifespan).clamp(0.0, 1.0) as f32
    } else {
        0.0
    };
    let baseline = bubble.base_opacity * (1.0 - OPACITY_AGE_FADE * life) * bubble.animated_opacity;
    let t = (now / 1000.0) as f32 + bubble.time_offset;
    let breathing = BREATHING_AMPLITUDE * (t * BREATHING_RATE).sin();
    bubble.opacity = (baseline + breathing).clamp(MIN_OPACITY, MAX_OPACITY);
}
