//! User-facing configuration. Every struct has a `Default` matching the
//! production tuning so hosts usually only override canvas size and seed.

use crate::curves::Easing;
use crate::noise::DEFAULT_NOISE_CACHE_CAP;

/// Relative weights of the content selection score terms.
///
/// - `recency`: time since last display normalized by the cooldown window
/// - `popularity`: log-scaled related count
/// - `type_balance`: penalty for kinds already common on screen
/// - `freshness`: bonus for items not yet shown this rotation cycle
/// - `jitter`: uniform noise so equal scores do not always resolve the same way
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionWeights {
    pub recency: f32,
    pub popularity: f32,
    pub type_balance: f32,
    pub freshness: f32,
    pub jitter: f32,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            recency: 0.30,
            popularity: 0.20,
            type_balance: 0.20,
            freshness: 0.25,
            jitter: 0.05,
        }
    }
}

/// Content tracker parameters.
///
/// `rotation_threshold` is the share of the catalogue that must have been
/// shown in the current cycle before a displayed item may be forcibly rotated
/// out. 0.8 matches production behavior; it is an untested heuristic and a
/// candidate for product review.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    pub max_displayed: usize,
    pub cooldown_ms: f64,
    pub history_len: usize,
    pub rotation_threshold: f32,
    pub weights: SelectionWeights,
    pub seed: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_displayed: 30,
            cooldown_ms: 30_000.0,
            history_len: 200,
            rotation_threshold: 0.8,
            weights: SelectionWeights::default(),
            seed: 7,
        }
    }
}

/// Fixed parameters of one animation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationPreset {
    pub duration_ms: f64,
    pub initial_scale: f32,
    pub target_scale: f32,
    pub initial_opacity: f32,
    pub target_opacity: f32,
    pub easing: Easing,
    pub rotation_speed: Option<f32>, // degrees per second
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationConfig {
    pub appear: AnimationPreset,
    pub disappear: AnimationPreset,
    pub click: AnimationPreset,
    pub click_return: AnimationPreset,
    pub noise_seed: u64,
    pub noise_cache_cap: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            appear: AnimationPreset {
                duration_ms: 800.0,
                initial_scale: 0.0,
                target_scale: 1.0,
                initial_opacity: 0.0,
                target_opacity: 1.0,
                easing: Easing::ElasticOut,
                rotation_speed: None,
            },
            disappear: AnimationPreset {
                duration_ms: 600.0,
                initial_scale: 1.0,
                target_scale: 0.0,
                initial_opacity: 1.0,
                target_opacity: 0.0,
                easing: Easing::EaseInOutCubic,
                rotation_speed: Some(180.0),
            },
            click: AnimationPreset {
                duration_ms: 150.0,
                initial_scale: 1.0,
                target_scale: 1.25,
                initial_opacity: 1.0,
                target_opacity: 1.0,
                easing: Easing::EaseInOutCubic,
                rotation_speed: None,
            },
            click_return: AnimationPreset {
                duration_ms: 350.0,
                initial_scale: 1.25,
                target_scale: 1.0,
                initial_opacity: 1.0,
                target_opacity: 1.0,
                easing: Easing::ElasticOut,
                rotation_speed: None,
            },
            noise_seed: 1337,
            noise_cache_cap: DEFAULT_NOISE_CACHE_CAP,
        }
    }
}

/// Simulator parameters.
///
/// Sizes are pixels, speeds pixels per second, times milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatorConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub max_bubbles: usize,
    pub min_size: f32,
    pub max_size: f32,
    pub max_speed: f32,
    pub min_lifespan_ms: f64,
    pub max_lifespan_ms: f64,
    pub disappear_at_fraction: f64,
    /// Route content choice through the tracker so no item shows twice.
    pub dedup: bool,
    pub seed: u64,
    pub pool_max_idle: usize,
    pub tracker: TrackerConfig,
    pub animation: AnimationConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1280.0,
            canvas_height: 720.0,
            max_bubbles: 15,
            min_size: 40.0,
            max_size: 120.0,
            max_speed: 60.0,
            min_lifespan_ms: 12_000.0,
            max_lifespan_ms: 25_000.0,
            disappear_at_fraction: 0.7,
            dedup: true,
            seed: 42,
            pool_max_idle: 32,
            tracker: TrackerConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}
