//! Strategies for filter configurations and input shapes.

use proptest::prelude::*;
use test_strategy::Arbitrary;

/// A random but valid filter setup: spectrogram shape, frame window and
/// filtered band, plus a seed for the signal generators.
///
/// ```
/// use multiframe_proptest::proptest::prelude::*;
/// use multiframe_proptest::proptest::strategy::ValueTree;
/// use multiframe_proptest::proptest::test_runner::TestRunner;
/// use multiframe_proptest::strategies::FilterSetup;
///
/// let mut runner = TestRunner::deterministic();
/// let setup = any::<FilterSetup>().new_tree(&mut runner).unwrap().current();
/// assert!(setup.lookahead < setup.frame_size);
/// assert!(setup.num_freqs <= setup.num_bins);
/// ```
#[derive(Debug, Clone, Arbitrary)]
pub struct FilterSetup {
    #[strategy(1usize..=2)]
    pub batch: usize,
    #[strategy(1usize..=2)]
    pub channels: usize,
    #[strategy(0usize..=12)]
    pub frames: usize,
    #[strategy(1usize..=9)]
    pub num_bins: usize,
    #[strategy(0usize..=#num_bins)]
    pub num_freqs: usize,
    #[strategy(1usize..=5)]
    pub frame_size: usize,
    #[strategy(0usize..#frame_size)]
    pub lookahead: usize,
    #[strategy(any::<u64>())]
    pub seed: u64,
}

impl FilterSetup {
    /// `[B, C, T, F]` of the full spectrogram.
    pub fn spec_shape(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.channels, self.frames, self.num_bins)
    }

    /// `[B, C, T, F']` of the filtered band.
    pub fn band_shape(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.channels, self.frames, self.num_freqs)
    }

    /// `[B, C, T, F', N]` of per-bin tap vectors.
    pub fn taps_shape(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.batch,
            self.channels,
            self.frames,
            self.num_freqs,
            self.frame_size,
        )
    }
}

/// Finite sample values in `[-limit, limit]`.
pub fn bounded_f32(limit: f32) -> impl Strategy<Value = f32> {
    -limit..=limit
}

/// Arbitrary `f32` values including NaN, infinities and subnormals.
pub fn any_f32() -> impl Strategy<Value = f32> {
    prop_oneof![
        8 => bounded_f32(1e3),
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
        1 => Just(f32::NEG_INFINITY),
        1 => Just(f32::MIN_POSITIVE / 2.0),
    ]
}
