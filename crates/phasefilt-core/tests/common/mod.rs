#![allow(dead_code)]

use ndarray::Array2;
use num_complex::Complex32;

/// Small deterministic generator so tests don't need a rand dependency.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1))
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f32) / (1u64 << 24) as f32
    }

    /// Uniform in [-amplitude, amplitude).
    pub fn next_signed(&mut self, amplitude: f32) -> f32 {
        (self.next_f32() * 2.0 - 1.0) * amplitude
    }
}

/// Clean fringe phase in radians at (row, col).
pub fn fringe_phase(row: usize, col: usize) -> f32 {
    0.35 * row as f32 + 0.2 * col as f32
}

/// Unit-magnitude fringe pattern.
pub fn fringe(h: usize, w: usize) -> Array2<Complex32> {
    Array2::from_shape_fn((h, w), |(r, c)| Complex32::from_polar(1.0, fringe_phase(r, c)))
}

/// Unit-magnitude fringe pattern with uniform phase noise of the given amplitude.
pub fn noisy_fringe(h: usize, w: usize, noise: f32, seed: u64) -> Array2<Complex32> {
    let mut rng = Lcg::new(seed);
    Array2::from_shape_fn((h, w), |(r, c)| {
        Complex32::from_polar(1.0, fringe_phase(r, c) + rng.next_signed(noise))
    })
}

pub fn constant_coherence(h: usize, w: usize, value: f32) -> Array2<f32> {
    Array2::from_elem((h, w), value)
}

/// Coherence varying across the raster, values in [0, 1].
pub fn varying_coherence(h: usize, w: usize, seed: u64) -> Array2<f32> {
    let mut rng = Lcg::new(seed);
    Array2::from_shape_fn((h, w), |(r, c)| {
        let base = (r + c) as f32 / (h + w) as f32;
        (0.7 * base + 0.3 * rng.next_f32()).clamp(0.0, 1.0)
    })
}

/// Absolute wrapped phase difference in [0, pi].
pub fn phase_distance(a: Complex32, b: Complex32) -> f32 {
    (a * b.conj()).arg().abs()
}
