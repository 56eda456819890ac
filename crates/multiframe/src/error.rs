//! Error type shared by every fallible operation in the crate.

use std::result;

/// Errors raised by filter construction and application.
///
/// Configuration problems are reported when a filter or windower is built;
/// shape problems are reported by the call that received the mismatched
/// arrays. Numeric degeneracy is never an error, it is counted in a
/// [`FilterReport`](crate::FilterReport) instead.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum Error {
    /// A multi-frame filter needs at least one tap.
    #[display("frame_size must be at least 1")]
    ZeroFrameSize,
    /// The look-ahead does not fit inside the frame window.
    #[display("lookahead {lookahead} must be smaller than frame_size {frame_size}")]
    InvalidLookahead { lookahead: usize, frame_size: usize },
    /// The complex ratio mask only works on the current frame.
    #[display(
        "complex ratio mask requires frame_size 1 and lookahead 0, got frame_size {frame_size} and lookahead {lookahead}"
    )]
    RatioMaskFrames { frame_size: usize, lookahead: usize },
    /// More bins were requested for filtering than the spectrogram has.
    #[display("num_freqs {num_freqs} exceeds the number of frequency bins {num_bins}")]
    TooManyFreqs { num_freqs: usize, num_bins: usize },
    /// The axis does not exist on the array.
    #[display("axis {axis} is out of bounds for an array with {ndim} dimensions")]
    AxisOutOfBounds { axis: usize, ndim: usize },
    /// Window length or step is zero.
    #[display("window length {window_length} and step {step} must both be non-zero")]
    ZeroWindow { window_length: usize, step: usize },
    /// The window is longer than the axis it slides over.
    #[display("window length {window_length} exceeds axis length {len}")]
    WindowTooLong { window_length: usize, len: usize },
    /// An input array does not have the shape the operation requires.
    #[display("{what}: expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// A packed predictor output cannot be split into the requested groups.
    #[display("{what}: packed axis length {len} is not a multiple of {group}")]
    PackedLength {
        what: &'static str,
        len: usize,
        group: usize,
    },
    /// The inputs do not belong to the filter variant they were passed to.
    #[display("{filter} does not accept {inputs} inputs")]
    UnsupportedInputs {
        filter: &'static str,
        inputs: &'static str,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = result::Result<T, Error>;

/// Checks that `actual` equals `expected`, naming the offending input.
pub(crate) fn check_shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}
