// Simulation, animation and scheduling tuning constants. User-facing knobs
// live in config.rs.

// Frame timing
pub const MAX_FRAME_DT_SEC: f32 = 1.0 / 60.0; // physics step clamp for slow frames
pub const TARGET_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;
pub const DROPPED_FRAME_FACTOR: f64 = 1.5; // interval above target*factor counts as dropped
pub const FRAME_WINDOW: usize = 60; // rolling window for interval averaging
pub const QUALITY_DOWNGRADE_RATIO: f32 = 0.1; // dropped/total over window

// Sizing
pub const RELATED_COUNT_FOR_MAX_SIZE: f32 = 20.0; // related count mapped onto max size

// Spawning
pub const SPAWN_SPEED_FRACTION: f32 = 0.3; // initial speed as share of max speed
pub const SPAWN_UPWARD_BIAS: f32 = 0.2; // extra upward component (share of spawn speed)

// Forces (pixels, seconds)
pub const BUOYANCY_ACCEL: f32 = 6.0; // upward accel for a min-size bubble
pub const DENSITY_BASE: f32 = 0.6;
pub const DENSITY_SPAN: f32 = 0.4;
pub const DRAG_BASE: f32 = 0.992; // per-60Hz-frame velocity retention
pub const DRAG_SIZE_PENALTY: f32 = 0.006; // larger bubbles drag marginally more
pub const WANDER_STRENGTH: f32 = 9.0;
pub const SWAY_STRENGTH: f32 = 6.0;
pub const WIND_STRENGTH: f32 = 7.5;
pub const WANDER_PERIOD_SEC: f32 = 11.0;
pub const SWAY_PERIOD_SEC: f32 = 7.0;
pub const WIND_PERIOD_SEC: f32 = 23.0;
pub const JITTER_POSITION_SCALE: f32 = 0.08; // noise offset px applied to position per frame
pub const TERMINAL_SPEED_BASE: f32 = 0.5; // share of max speed for a zero-size bubble
pub const TERMINAL_SPEED_SPAN: f32 = 0.5;
pub const BOUNDARY_DAMPING: f32 = 0.7; // energy kept on wall bounce
pub const MIN_REBOUND_SPEED: f32 = 1.0; // px/s so a resting bubble still leaves the wall

// Opacity breathing
pub const OPACITY_AGE_FADE: f32 = 0.3; // baseline loss over a full lifespan
pub const BREATHING_AMPLITUDE: f32 = 0.08;
pub const BREATHING_RATE: f32 = 1.6; // radians per second
pub const MIN_OPACITY: f32 = 0.3;
pub const MAX_OPACITY: f32 = 1.0;

// Animation noise
pub const SCALE_NOISE_VARIATION: f32 = 0.05; // ±5%
pub const OPACITY_NOISE_VARIATION: f32 = 0.10; // ±10%
pub const NOISE_TIME_SCALE: f64 = 0.0004; // ms -> noise space
pub const NOISE_OFFSET_MAX_X: f32 = 6.0; // px
pub const NOISE_OFFSET_MAX_Y: f32 = 4.0; // px
pub const NOISE_OCTAVES: u32 = 3;
pub const NOISE_PERSISTENCE: f32 = 0.5;
pub const NOISE_LACUNARITY: f32 = 2.0;
pub const NOISE_QUANTIZE: f32 = 1000.0; // cache key resolution

// Noise intensity per state
pub const INTENSITY_APPEAR: f32 = 0.3;
pub const INTENSITY_FLOATING: f32 = 1.0;
pub const INTENSITY_CLICK: f32 = 1.6;
pub const INTENSITY_CLICK_RETURN: f32 = 1.2;
pub const INTENSITY_DISAPPEAR: f32 = 0.0;

// Content weighting
pub const DISPLAY_COUNT_PENALTY: f32 = 0.25; // recency divided by 1 + penalty*count
pub const RECENCY_HORIZON_COOLDOWNS: f32 = 20.0; // time past cooldown at which recency saturates
pub const SEEN_THIS_CYCLE_FRESHNESS: f32 = 0.2;
pub const MIN_CANDIDATE_WEIGHT: f32 = 1e-3;

// Default palette per entity type
pub const SONG_COLOR: [f32; 3] = [0.55, 0.72, 0.98]; // sky blue
pub const LYRICIST_COLOR: [f32; 3] = [0.98, 0.66, 0.74]; // rose
pub const COMPOSER_COLOR: [f32; 3] = [0.72, 0.62, 0.98]; // lavender
pub const ARRANGER_COLOR: [f32; 3] = [0.62, 0.92, 0.78]; // mint
pub const TAG_COLOR: [f32; 3] = [0.99, 0.84, 0.52]; // amber
pub const BASE_OPACITY: f32 = 0.9;
