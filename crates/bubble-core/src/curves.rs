//! Curve library: cubic-Bezier timing curves, named easing presets and the
//! periodic trajectory generators that give bubbles their drifting motion.

use crate::error::UnknownName;
use glam::Vec2;
use std::f32::consts::{PI, TAU};
use std::str::FromStr;

/// CSS-style timing curve through (0,0), (x1,y1), (x2,y2), (1,1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    fn axis(p1: f32, p2: f32, t: f32) -> f32 {
        // B(t) with P0 = 0, P3 = 1
        let mt = 1.0 - t;
        3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
    }

    #[inline]
    fn axis_derivative(p1: f32, p2: f32, t: f32) -> f32 {
        let mt = 1.0 - t;
        3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    }

    /// Point on the curve at parameter `t` (not progress).
    pub fn point(&self, t: f32) -> Vec2 {
        Vec2::new(
            Self::axis(self.x1, self.x2, t),
            Self::axis(self.y1, self.y2, t),
        )
    }

    /// Eased value for progress `x` in [0, 1]: solve B_x(t) = x, return B_y(t).
    pub fn solve(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        if x == 0.0 || x == 1.0 {
            return x;
        }
        // Newton first, bisection if the slope flattens out
        let mut t = x;
        for _ in 0..8 {
            let err = Self::axis(self.x1, self.x2, t) - x;
            if err.abs() < 1e-6 {
                return Self::axis(self.y1, self.y2, t);
            }
            let d = Self::axis_derivative(self.x1, self.x2, t);
            if d.abs() < 1e-6 {
                break;
            }
            t -= err / d;
        }
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        t = x;
        for _ in 0..32 {
            let v = Self::axis(self.x1, self.x2, t);
            if (v - x).abs() < 1e-6 {
                break;
            }
            if v < x {
                lo = t;
            } else {
                hi = t;
            }
            t = 0.5 * (lo + hi);
        }
        Self::axis(self.y1, self.y2, t)
    }
}

/// Slow in, slower out; used for the idle float.
pub const NATURAL_FLOAT_CURVE: CubicBezier = CubicBezier::new(0.45, 0.05, 0.35, 1.0);

/// Named easing presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseInOutCubic,
    ElasticOut,
    EaseOutBack,
    NaturalFloat,
}

impl Easing {
    /// Apply easing to a normalized time parameter t ∈ [0, 1].
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::ElasticOut => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = TAU / 3.0;
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Easing::EaseOutBack => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
            }
            Easing::NaturalFloat => NATURAL_FLOAT_CURVE.solve(t),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInOutCubic => "ease-in-out-cubic",
            Easing::ElasticOut => "elastic-out",
            Easing::EaseOutBack => "ease-out-back",
            Easing::NaturalFloat => "natural-float",
        }
    }
}

impl FromStr for Easing {
    type Err = UnknownName;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "linear" => Ok(Easing::Linear),
            "ease-in-out-cubic" | "ease-in-out" => Ok(Easing::EaseInOutCubic),
            "elastic-out" | "elastic" => Ok(Easing::ElasticOut),
            "ease-out-back" | "back" => Ok(Easing::EaseOutBack),
            "natural-float" | "float" => Ok(Easing::NaturalFloat),
            _ => Err(UnknownName::new("easing", s)),
        }
    }
}

/// Periodic motion generators. Input is normalized time (one period = 1.0,
/// wraps); output is an (x, y) offset with components in [-1, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trajectory {
    /// Lissajous-like meander with an incommensurate second harmonic.
    Wander,
    /// Side-to-side sway with a gentle lift on each half period.
    Buoyancy,
    /// Mostly horizontal gusting drift.
    Wind,
}

impl Trajectory {
    pub const ALL: [Trajectory; 3] = [Trajectory::Wander, Trajectory::Buoyancy, Trajectory::Wind];

    pub fn sample(&self, t: f32) -> Vec2 {
        let t = t.rem_euclid(1.0);
        let phase = t * TAU;
        match self {
            Trajectory::Wander => Vec2::new(
                0.7 * phase.sin() + 0.3 * (phase * 3.0 + 0.5).sin(),
                0.6 * (phase * 2.0).cos() + 0.4 * (phase * 5.0 + 1.3).sin(),
            ),
            Trajectory::Buoyancy => {
                let lift = -(t * PI * 2.0).sin().abs();
                Vec2::new(phase.sin(), lift)
            }
            Trajectory::Wind => {
                let gust = 0.5 + 0.5 * NATURAL_FLOAT_CURVE.solve(0.5 + 0.5 * phase.sin());
                Vec2::new(
                    (gust * (phase + 0.3).cos()).clamp(-1.0, 1.0),
                    0.25 * (phase * 4.0).sin(),
                )
            }
        }
    }
}
