//! Frame windowing of spectrogram history.
//!
//! Turns a `[B, C, T, F]` spectrogram into a `[B, C, T, F, N]` frame stack
//! where the window at output time `t` holds source frames
//! `t - (N - 1 - lookahead) ..= t + lookahead`, zero padded at both ends of
//! the sequence.
//!
//! Windows are materialized copies rather than strided views, so overlapping
//! windows never alias each other and the source is never mutated.

use ndarray::{Array, Array5, ArrayBase, Axis, Data, Dimension, Ix4, Ix5, Slice};

use crate::TIME_AXIS;
use crate::config::validate_frames;
use crate::error::{Error, Result};
use crate::split::SplitComplex;

/// Returns overlapping windows of `x` along `axis`.
///
/// The output replaces `axis` with the window index and appends the window
/// contents as a new last axis, so window `i` is `x[i * step .. i * step +
/// window_length]` along `axis`. There are
/// `(len - window_length) / step + 1` windows.
pub fn window<A, S, D>(
    x: &ArrayBase<S, D>,
    axis: Axis,
    window_length: usize,
    step: usize,
) -> Result<Array<A, D::Larger>>
where
    A: Clone + Default,
    S: Data<Elem = A>,
    D: Dimension,
{
    check_axis(axis, x.ndim())?;
    if window_length == 0 || step == 0 {
        return Err(Error::ZeroWindow {
            window_length,
            step,
        });
    }
    let len = x.len_of(axis);
    if window_length > len {
        return Err(Error::WindowTooLong { window_length, len });
    }
    let count = (len - window_length) / step + 1;
    Ok(collect_windows(x, axis, window_length, step, count))
}

/// Zero pads `x` with `before` leading and `after` trailing entries along
/// `axis`.
pub fn pad_axis<A, S, D>(
    x: &ArrayBase<S, D>,
    axis: Axis,
    before: usize,
    after: usize,
) -> Result<Array<A, D>>
where
    A: Clone + Default,
    S: Data<Elem = A>,
    D: Dimension,
{
    check_axis(axis, x.ndim())?;
    Ok(pad_unchecked(x, axis, before, after))
}

/// Pads and unfolds a spectrogram along its time axis.
///
/// Shorthand for [`FrameWindower::new`] followed by
/// [`FrameWindower::unfold`].
pub fn spec_unfold<A, S>(
    spec: &ArrayBase<S, Ix4>,
    frame_size: usize,
    lookahead: usize,
) -> Result<Array5<A>>
where
    A: Clone + Default,
    S: Data<Elem = A>,
{
    Ok(FrameWindower::new(frame_size, lookahead)?.unfold(spec))
}

/// Causal multi-frame windowing with optional look-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindower {
    frame_size: usize,
    lookahead: usize,
}

impl FrameWindower {
    /// Creates a windower producing `frame_size` taps, `lookahead` of which
    /// lie in the future.
    pub fn new(frame_size: usize, lookahead: usize) -> Result<Self> {
        validate_frames(frame_size, lookahead)?;
        Ok(Self {
            frame_size,
            lookahead,
        })
    }

    /// Number of frames per window.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of future frames per window.
    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Unfolds a `[B, C, T, F]` spectrogram into `[B, C, T, F, N]` windows.
    ///
    /// With a single tap the spectrogram is returned with a unit frame axis.
    pub fn unfold<A, S>(&self, spec: &ArrayBase<S, Ix4>) -> Array5<A>
    where
        A: Clone + Default,
        S: Data<Elem = A>,
    {
        if self.frame_size <= 1 {
            return spec.to_owned().insert_axis(Axis(4));
        }
        let before = self.frame_size - 1 - self.lookahead;
        let padded = pad_unchecked(spec, TIME_AXIS, before, self.lookahead);
        let num_frames = spec.len_of(TIME_AXIS);
        collect_windows(&padded, TIME_AXIS, self.frame_size, 1, num_frames)
    }

    /// Unfolds both planes of a split spectrogram.
    pub fn unfold_split(&self, spec: &SplitComplex<Ix4>) -> SplitComplex<Ix5> {
        SplitComplex {
            re: self.unfold(&spec.re),
            im: self.unfold(&spec.im),
        }
    }
}

fn check_axis(axis: Axis, ndim: usize) -> Result<()> {
    if axis.index() < ndim {
        Ok(())
    } else {
        Err(Error::AxisOutOfBounds {
            axis: axis.index(),
            ndim,
        })
    }
}

fn pad_unchecked<A, S, D>(
    x: &ArrayBase<S, D>,
    axis: Axis,
    before: usize,
    after: usize,
) -> Array<A, D>
where
    A: Clone + Default,
    S: Data<Elem = A>,
    D: Dimension,
{
    let len = x.len_of(axis);
    let mut dim = x.raw_dim();
    dim[axis.index()] = before + len + after;
    let mut out = Array::from_elem(dim, A::default());
    out.slice_axis_mut(axis, Slice::from(before..before + len))
        .assign(x);
    out
}

fn collect_windows<A, S, D>(
    x: &ArrayBase<S, D>,
    axis: Axis,
    window_length: usize,
    step: usize,
    count: usize,
) -> Array<A, D::Larger>
where
    A: Clone + Default,
    S: Data<Elem = A>,
    D: Dimension,
{
    let last = Axis(x.ndim());
    let mut dim = x.view().insert_axis(last).raw_dim();
    dim[axis.index()] = count;
    dim[last.index()] = window_length;
    let mut out = Array::from_elem(dim, A::default());
    for i in 0..count {
        let start = i * step;
        // [.., L, .., 1] -> [.., 1, .., L]
        let mut src = x
            .slice_axis(axis, Slice::from(start..start + window_length))
            .insert_axis(last);
        src.swap_axes(axis.index(), last.index());
        out.slice_axis_mut(axis, Slice::from(i..i + 1)).assign(&src);
    }
    out
}
