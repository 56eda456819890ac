//! Filter configuration.
//!
//! Every value here is fixed when a [`FilterBank`](crate::FilterBank) or
//! [`FrameWindower`](crate::FrameWindower) is built. In particular the
//! look-ahead adds directly to end-to-end latency and determines padding and
//! output alignment, so it is never varied per call.

use crate::error::{Error, Result};

/// Frequency bins of a 960-point real FFT (20 ms at 48 kHz).
pub const DEFAULT_NUM_BINS: usize = 481;
/// Lower band filtered by the deep filter in DeepFilterNet models.
pub const DEFAULT_NUM_FREQS: usize = 96;
/// Number of multi-frame taps.
pub const DEFAULT_FRAME_SIZE: usize = 5;
/// Future frames included in each window.
pub const DEFAULT_LOOKAHEAD: usize = 2;
/// Default denominator floor of the MVDR normalization.
pub const DEFAULT_MVDR_EPS: f32 = 1e-8;

/// Shared configuration of a multi-frame filter.
///
/// # Example
///
/// ```
/// use multiframe::FilterConfig;
///
/// let config = FilterConfig {
///     num_freqs: 64,
///     frame_size: 3,
///     lookahead: 1,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Total number of frequency bins of the spectrograms this filter
    /// receives (default: 481).
    pub num_bins: usize,
    /// Number of low frequency bins that are filtered; the bins above are
    /// passed through unchanged. Must not exceed `num_bins` (default: 96).
    pub num_freqs: usize,
    /// Number of time frames combined per bin, `N` (default: 5).
    pub frame_size: usize,
    /// Number of future frames in each window. Must be smaller than
    /// `frame_size` (default: 2).
    pub lookahead: usize,
    /// Diagonal loading used when solving against a covariance matrix.
    pub regularization: Regularization,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            num_bins: DEFAULT_NUM_BINS,
            num_freqs: DEFAULT_NUM_FREQS,
            frame_size: DEFAULT_FRAME_SIZE,
            lookahead: DEFAULT_LOOKAHEAD,
            regularization: Regularization::default(),
        }
    }
}

impl FilterConfig {
    /// Checks the invariants shared by all filter variants.
    pub fn validate(&self) -> Result<()> {
        validate_frames(self.frame_size, self.lookahead)?;
        if self.num_freqs > self.num_bins {
            return Err(Error::TooManyFreqs {
                num_freqs: self.num_freqs,
                num_bins: self.num_bins,
            });
        }
        Ok(())
    }
}

/// Checks `frame_size >= 1` and `lookahead < frame_size`.
pub(crate) fn validate_frames(frame_size: usize, lookahead: usize) -> Result<()> {
    if frame_size == 0 {
        return Err(Error::ZeroFrameSize);
    }
    if lookahead >= frame_size {
        return Err(Error::InvalidLookahead {
            lookahead,
            frame_size,
        });
    }
    Ok(())
}

/// Tikhonov regularization of a correlation matrix.
///
/// The diagonal is raised by `real(trace) * diag_eps + eps`, so the loading
/// follows the energy of the matrix and stays strictly positive for an
/// all-zero matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regularization {
    /// Diagonal loading relative to the trace (default: 1e-8).
    pub diag_eps: f32,
    /// Absolute diagonal floor (default: 1e-7).
    pub eps: f32,
}

impl Default for Regularization {
    fn default() -> Self {
        Self {
            diag_eps: 1e-8,
            eps: 1e-7,
        }
    }
}

/// The filter algorithm, chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    /// Deep filtering with complex taps predicted per bin.
    DeepFilter {
        /// Conjugate the taps before applying them.
        conj: bool,
    },
    /// Deep filtering computed on separate real and imaginary planes.
    DeepFilterSplit {
        /// Conjugate the taps before applying them.
        conj: bool,
    },
    /// Single-frame complex ratio mask.
    RatioMask,
    /// Multi-frame Wiener filter.
    Wiener,
    /// Multi-frame minimum variance distortionless response beamformer.
    Mvdr {
        /// Floor added to the normalization denominator (default: 1e-8).
        eps: f32,
    },
}

impl FilterKind {
    /// MVDR beamformer with the default denominator floor.
    pub const fn mvdr() -> Self {
        Self::Mvdr {
            eps: DEFAULT_MVDR_EPS,
        }
    }

    /// Short name used in logs and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DeepFilter { .. } => "deep filter",
            Self::DeepFilterSplit { .. } => "split deep filter",
            Self::RatioMask => "complex ratio mask",
            Self::Wiener => "multi-frame Wiener filter",
            Self::Mvdr { .. } => "multi-frame MVDR beamformer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deepfilternet() {
        let config = FilterConfig::default();
        assert_eq!(config.num_bins, 481);
        assert_eq!(config.num_freqs, 96);
        assert_eq!(config.frame_size, 5);
        assert_eq!(config.lookahead, 2);
        assert!(config.validate().is_ok());

        let reg = Regularization::default();
        assert_eq!(reg.diag_eps, 1e-8);
        assert_eq!(reg.eps, 1e-7);

        assert_eq!(FilterKind::mvdr(), FilterKind::Mvdr { eps: 1e-8 });
    }

    #[test]
    fn rejects_lookahead_outside_window() {
        let config = FilterConfig {
            frame_size: 3,
            lookahead: 3,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(Error::InvalidLookahead {
                lookahead: 3,
                frame_size: 3
            })
        );
    }

    #[test]
    fn rejects_zero_frame_size() {
        let config = FilterConfig {
            frame_size: 0,
            lookahead: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::ZeroFrameSize));
    }

    #[test]
    fn rejects_too_many_freqs() {
        let config = FilterConfig {
            num_bins: 10,
            num_freqs: 11,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(Error::TooManyFreqs {
                num_freqs: 11,
                num_bins: 10
            })
        );
    }

    #[test]
    fn filtering_every_bin_is_allowed() {
        let config = FilterConfig {
            num_bins: 10,
            num_freqs: 10,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
