//! Seeded 2D gradient noise with a bounded memo cache.
//!
//! Classic Perlin construction: a shuffled permutation table doubled to 512
//! entries, eight unit-ish gradient directions, quintic fade. Results are
//! memoized by quantized coordinate; once the cache reaches its cap the oldest
//! entry is evicted first.

use crate::constants::NOISE_QUANTIZE;
use fnv::FnvHashMap;
use rand::prelude::*;
use std::collections::VecDeque;

pub const DEFAULT_NOISE_CACHE_CAP: usize = 2048;

const GRADIENTS: [[f32; 2]; 8] = [
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2],
    [-std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2],
    [std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2],
    [-std::f32::consts::FRAC_1_SQRT_2, -std::f32::consts::FRAC_1_SQRT_2],
];

/// Cache counters exposed through animation diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoiseCacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl NoiseCacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

pub struct NoiseField {
    perm: [u8; 512],
    cache: FnvHashMap<(i64, i64), f32>,
    order: VecDeque<(i64, i64)>,
    cache_cap: usize,
    hits: u64,
    misses: u64,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        Self::with_cache_capacity(seed, DEFAULT_NOISE_CACHE_CAP)
    }

    pub fn with_cache_capacity(seed: u64, cache_cap: usize) -> Self {
        let mut table: Vec<u8> = (0..=255u8).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        table.shuffle(&mut rng);
        let mut perm = [0u8; 512];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = table[i & 255];
        }
        Self {
            perm,
            cache: FnvHashMap::default(),
            order: VecDeque::with_capacity(cache_cap.min(4096)),
            cache_cap,
            hits: 0,
            misses: 0,
        }
    }

    /// Single-octave noise in roughly [-1, 1], memoized.
    pub fn noise2d(&mut self, x: f32, y: f32) -> f32 {
        let key = (
            (x * NOISE_QUANTIZE).round() as i64,
            (y * NOISE_QUANTIZE).round() as i64,
        );
        if let Some(v) = self.cache.get(&key) {
            self.hits += 1;
            return *v;
        }
        self.misses += 1;
        let v = self.sample(x, y);
        if self.cache_cap > 0 {
            while self.cache.len() >= self.cache_cap {
                match self.order.pop_front() {
                    Some(oldest) => {
                        _ = self.cache.remove(&oldest);
                    }
                    None => break,
                }
            }
            _ = self.cache.insert(key, v);
            self.order.push_back(key);
        }
        v
    }

    /// Sum `octaves` layers, each at `lacunarity`× the frequency and
    /// `persistence`× the amplitude of the previous, normalized back to [-1, 1].
    pub fn fractal(
        &mut self,
        x: f32,
        y: f32,
        octaves: u32,
        persistence: f32,
        lacunarity: f32,
    ) -> f32 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut norm = 0.0;
        for _ in 0..octaves.max(1) {
            sum += self.noise2d(x * frequency, y * frequency) * amplitude;
            norm += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }
        (sum / norm).clamp(-1.0, 1.0)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.order.clear();
    }

    pub fn cache_stats(&self) -> NoiseCacheStats {
        NoiseCacheStats {
            entries: self.cache.len(),
            capacity: self.cache_cap,
            hits: self.hits,
            misses: self.misses,
        }
    }

    fn sample(&self, x: f32, y: f32) -> f32 {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let dx = x - xf;
        let dy = y - yf;

        let aa = self.perm[self.perm[xi] as usize + yi];
        let ab = self.perm[self.perm[xi] as usize + yi + 1];
        let ba = self.perm[self.perm[xi + 1] as usize + yi];
        let bb = self.perm[self.perm[xi + 1] as usize + yi + 1];

        let u = fade(dx);
        let v = fade(dy);
        let x1 = lerp(grad(aa, dx, dy), grad(ba, dx - 1.0, dy), u);
        let x2 = lerp(grad(ab, dx, dy - 1.0), grad(bb, dx - 1.0, dy - 1.0), u);
        // 2D Perlin peaks near ±0.707 with these gradients
        (lerp(x1, x2, v) * std::f32::consts::SQRT_2).clamp(-1.0, 1.0)
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    let g = GRADIENTS[(hash & 7) as usize];
    g[0] * x + g[1] * y
}
