//! Multi-frame spectral filtering for speech enhancement.
//!
//! Combines several time frames per frequency bin of a complex spectrogram
//! with coefficients or statistics predicted by an external model. Five
//! filters are provided behind one [`FilterBank`]:
//!
//! - deep filtering with complex taps ([`FilterKind::DeepFilter`]) and the
//!   same filter on split real/imaginary planes
//!   ([`FilterKind::DeepFilterSplit`]),
//! - the single-frame complex ratio mask ([`FilterKind::RatioMask`]),
//! - the multi-frame Wiener filter ([`FilterKind::Wiener`]),
//! - the multi-frame MVDR beamformer ([`FilterKind::Mvdr`]).
//!
//! The building blocks are public too: causal frame windowing
//! ([`FrameWindower`], [`window`]), rank-one correlation estimates
//! ([`psd`]), regularized batched solves ([`solve`], [`invert`]) and
//! adapters for interleaved predictor outputs ([`packing`]).
//!
//! Spectrograms are `[batch, channel, time, frequency]` arrays of
//! [`Complex32`]. The STFT itself and the predictor are not part of this
//! crate.
//!
//! # Quick Start
//!
//! ```
//! use multiframe::{Complex32, FilterBank, FilterConfig, FilterInputs, FilterKind, Spectrogram};
//! use multiframe::ndarray::Array4;
//!
//! let config = FilterConfig {
//!     num_bins: 481,
//!     num_freqs: 96,
//!     frame_size: 1,
//!     lookahead: 0,
//!     ..Default::default()
//! };
//! let mask = FilterBank::new(FilterKind::RatioMask, config)?;
//!
//! // For every block of frames coming out of the STFT:
//! let spec = Spectrogram::zeros((1, 1, 100, 481));
//! let gains = Array4::from_elem((1, 1, 100, 96), Complex32::new(0.5, 0.0));
//! let enhanced = mask.apply(&spec, FilterInputs::Mask(gains.view()))?;
//! assert_eq!(enhanced.spectrogram.dim(), spec.dim());
//! # Ok::<(), multiframe::Error>(())
//! ```

pub mod config;
pub mod correlation;
pub mod error;
pub mod filter_bank;
pub(crate) mod layout;
pub mod packing;
pub mod report;
pub mod solver;
pub mod split;
pub mod unfold;

use ndarray::{Array4, Axis};

// Public re-exports.
pub use config::{FilterConfig, FilterKind, Regularization};
pub use correlation::psd;
pub use error::{Error, Result};
pub use filter_bank::{FilterBank, FilterInputs, Filtered};
pub use report::FilterReport;
pub use solver::{Solution, invert, regularize, regularize_batch, solve};
pub use split::SplitComplex;
pub use unfold::{FrameWindower, pad_axis, spec_unfold, window};

pub use ndarray;
pub use num_complex::Complex32;

/// A complex spectrogram indexed `[batch, channel, time, frequency]`.
pub type Spectrogram = Array4<Complex32>;

/// Time axis of a spectrogram.
pub const TIME_AXIS: Axis = Axis(2);
/// Frequency axis of a spectrogram.
pub const FREQ_AXIS: Axis = Axis(3);
