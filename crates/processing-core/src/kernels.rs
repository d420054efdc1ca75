//! Circular 1D interpolation kernels.
//!
//! Both kernels sample a periodic signal (a "ring" of `N` samples, where
//! index `N` wraps to `0`) at a fractional position. Rows of an
//! equirectangular frame are periodic in longitude, which is why the
//! projection transforms sample through these rather than clamping at edges.
//!
//! Integer positions take an exact fast path and return the stored sample
//! untouched, so degenerate rows never pick up blending artifacts.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sphereframe_common::SphereError;
use sphereframe_frame_model::SampleRange;

/// Available interpolation kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// 6-tap windowed sinc, normalized by the summed weights.
    #[default]
    Lanczos3,
    /// 4-tap Catmull-Rom cubic (a = -0.5).
    Cubic,
}

impl Kernel {
    /// Number of samples contributing to one interpolated value.
    pub fn taps(self) -> usize {
        match self {
            Self::Lanczos3 => 6,
            Self::Cubic => 4,
        }
    }

    /// Sample `ring` at fractional position `x`, wrapping around its ends.
    pub fn interpolate(self, ring: &[i32], x: f64, range: SampleRange) -> i32 {
        match self {
            Self::Lanczos3 => interpolate_lanczos3(ring, x, range),
            Self::Cubic => interpolate_cubic(ring, x, range),
        }
    }

    /// Resample the ring `src` onto `dst.len()` evenly spaced positions.
    ///
    /// Sample centers are aligned: `dst[u]` sits at
    /// `(u + 0.5) * src.len() / dst.len() - 0.5` in source coordinates.
    pub fn resample_ring(self, src: &[i32], dst: &mut [i32], range: SampleRange) {
        if dst.is_empty() {
            return;
        }
        if src.len() == dst.len() {
            dst.copy_from_slice(src);
            return;
        }
        let scale = src.len() as f64 / dst.len() as f64;
        for (u, out) in dst.iter_mut().enumerate() {
            let x = (u as f64 + 0.5) * scale - 0.5;
            *out = self.interpolate(src, x, range);
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lanczos3 => f.write_str("lanczos3"),
            Self::Cubic => f.write_str("cubic"),
        }
    }
}

impl FromStr for Kernel {
    type Err = SphereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            "cubic" | "bicubic" | "catmull-rom" => Ok(Self::Cubic),
            other => Err(SphereError::configuration(format!(
                "unknown interpolation kernel '{other}' (expected lanczos3 or cubic)"
            ))),
        }
    }
}

/// Index `i` wrapped into `0..n`, handling negatives.
#[inline]
pub fn wrap_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    (((i % n) + n) % n) as usize
}

/// Lanczos-3 weights for taps at offsets `-2..=3` from `floor(x)`, where
/// `f = x - floor(x)` lies in `(0, 1)`.
pub fn lanczos3_weights(f: f64) -> [f64; 6] {
    let mut w = [0.0; 6];
    for (k, weight) in w.iter_mut().enumerate() {
        let t = (k as f64 - 2.0) - f;
        *weight = lanczos3(t);
    }
    w
}

fn lanczos3(t: f64) -> f64 {
    if t.abs() < 1e-12 {
        return 1.0;
    }
    if t.abs() >= 3.0 {
        return 0.0;
    }
    let pt = PI * t;
    3.0 * pt.sin() * (pt / 3.0).sin() / (pt * pt)
}

/// Catmull-Rom weights for taps at offsets `-1..=2` from `floor(x)`.
pub fn cubic_weights(f: f64) -> [f64; 4] {
    let f2 = f * f;
    let f3 = f2 * f;
    [
        -0.5 * f3 + f2 - 0.5 * f,
        1.5 * f3 - 2.5 * f2 + 1.0,
        -1.5 * f3 + 2.0 * f2 + 0.5 * f,
        0.5 * f3 - 0.5 * f2,
    ]
}

/// Circular Lanczos-3 interpolation of `ring` at `x`.
///
/// An empty ring yields the range's zero point.
pub fn interpolate_lanczos3(ring: &[i32], x: f64, range: SampleRange) -> i32 {
    let n = ring.len();
    if n == 0 {
        return range.clamp(0);
    }
    let i = x.floor();
    let f = x - i;
    let i = i as i64;
    if f == 0.0 {
        return ring[wrap_index(i, n)];
    }

    let weights = lanczos3_weights(f);
    let mut acc = 0.0;
    let mut norm = 0.0;
    for (k, &w) in weights.iter().enumerate() {
        let idx = wrap_index(i + k as i64 - 2, n);
        acc += w * f64::from(ring[idx]);
        norm += w;
    }
    if norm.abs() < 1e-12 {
        return ring[wrap_index(i, n)];
    }
    range.clamp_f64(acc / norm)
}

/// Circular cubic interpolation of `ring` at `x`.
pub fn interpolate_cubic(ring: &[i32], x: f64, range: SampleRange) -> i32 {
    let n = ring.len();
    if n == 0 {
        return range.clamp(0);
    }
    let i = x.floor();
    let f = x - i;
    let i = i as i64;
    if f == 0.0 {
        return ring[wrap_index(i, n)];
    }

    let weights = cubic_weights(f);
    let acc: f64 = weights
        .iter()
        .enumerate()
        .map(|(k, &w)| w * f64::from(ring[wrap_index(i + k as i64 - 1, n)]))
        .sum();
    range.clamp_f64(acc)
}
