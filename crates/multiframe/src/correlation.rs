//! Per-bin frame correlation estimates.

use ndarray::{Array3, Array6, ArrayBase, Data, Ix4};
use num_complex::Complex32;

use crate::error::Result;
use crate::layout::{num_bins, reshape};
use crate::unfold::FrameWindower;

/// Estimates the `n x n` frame correlation matrix of every bin.
///
/// The spectrogram is windowed causally over the last `n` frames (no
/// look-ahead) and each window `x` gives `R[m][k] = x[k] * conj(x[m])`.
/// This is a single-observation, rank-one estimate; averaging over time is
/// left to the caller.
///
/// Returns `[B, C, T, F, n, n]`.
pub fn psd<S>(spec: &ArrayBase<S, Ix4>, n: usize) -> Result<Array6<Complex32>>
where
    S: Data<Elem = Complex32>,
{
    let frames = FrameWindower::new(n, 0)?.unfold(spec);
    let (b, c, t, f, _) = frames.dim();
    let bins = num_bins(frames.shape(), 4);
    let frames = reshape("psd frames", frames, (bins, n))?;

    let mut rxx = Array3::<Complex32>::zeros((bins, n, n));
    for (mut r, x) in rxx.outer_iter_mut().zip(frames.outer_iter()) {
        for m in 0..n {
            let xm = x[m].conj();
            for k in 0..n {
                r[[m, k]] = x[k] * xm;
            }
        }
    }
    reshape("psd", rxx, (b, c, t, f, n, n))
}
