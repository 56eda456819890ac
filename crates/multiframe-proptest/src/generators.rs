//! Deterministic test signals.
//!
//! All generators are seeded, so a failing property reproduces from the
//! seed that proptest reports.

use ndarray::{Array, Array2, Array4, Array6, Dimension, ShapeBuilder, s};
use num_complex::Complex32;

/// Linear congruential generator (Knuth's MMIX constants).
#[derive(Debug, Clone)]
pub struct Lcg(u64);

impl Lcg {
    /// Seeds the generator. Equal seeds give equal sequences.
    pub fn new(seed: u64) -> Self {
        Self(seed ^ 0x9e37_79b9_7f4a_7c15)
    }

    /// Next value, uniform in `[-1, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // Top 24 bits are exactly representable.
        let unit = (self.0 >> 40) as f32 / (1u64 << 24) as f32;
        unit * 2.0 - 1.0
    }

    /// A complex value with both parts in `[-1, 1)`.
    pub fn next_complex(&mut self) -> Complex32 {
        let re = self.next_f32();
        Complex32::new(re, self.next_f32())
    }
}

/// Complex values with real and imaginary parts uniform in
/// `[-scale, scale)`.
pub fn complex_array<Sh, D>(shape: Sh, seed: u64, scale: f32) -> Array<Complex32, D>
where
    Sh: ShapeBuilder<Dim = D>,
    D: Dimension,
{
    let mut lcg = Lcg::new(seed);
    Array::from_shape_simple_fn(shape, || lcg.next_complex() * scale)
}

/// A `[B, C, T, F]` spectrogram of unit-scale noise.
pub fn spectrogram(shape: (usize, usize, usize, usize), seed: u64) -> Array4<Complex32> {
    complex_array(shape, seed, 1.0)
}

/// Per-bin Hermitian positive definite matrices `A A^H + I`, shaped
/// `[B, C, T, F, n, n]`.
///
/// The entries of `A` are bounded by one half, which keeps the condition
/// number of every matrix below `1 + n^2 / 2`.
pub fn hermitian_covariance(
    shape: (usize, usize, usize, usize),
    n: usize,
    seed: u64,
) -> Array6<Complex32> {
    let (b, c, t, f) = shape;
    let mut lcg = Lcg::new(seed);
    let mut out = Array6::<Complex32>::zeros((b, c, t, f, n, n));
    for bi in 0..b {
        for ci in 0..c {
            for ti in 0..t {
                for fi in 0..f {
                    let a = Array2::from_shape_simple_fn((n, n), || lcg.next_complex() * 0.5);
                    let ah = a.t().mapv(|z| z.conj());
                    let m = a.dot(&ah) + Array2::from_diag_elem(n, Complex32::new(1.0, 0.0));
                    out.slice_mut(s![bi, ci, ti, fi, .., ..]).assign(&m);
                }
            }
        }
    }
    out
}
