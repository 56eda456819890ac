//! The five multi-frame filters behind one `apply` operation.
//!
//! A [`FilterBank`] is built once from a [`FilterKind`] and a
//! [`FilterConfig`] and then applied to `[B, C, T, F]` spectrograms together
//! with the per-call inputs the chosen filter consumes:
//!
//! | Filter | Inputs |
//! |--------|--------|
//! | [`DeepFilter`], [`DeepFilterSplit`] | [`FilterInputs::Coefficients`] `[B, C, T, F', N]` |
//! | [`RatioMask`] | [`FilterInputs::Mask`] `[B, C, T, F']` |
//! | [`WienerFilter`], [`MvdrBeamformer`] | [`FilterInputs::InverseCovariance`], [`FilterInputs::Covariance`] |
//!
//! `F'` is `num_freqs`. Only those low bins are filtered; every bin from
//! `num_freqs` up is passed through untouched.
//!
//! # Example
//!
//! ```
//! use multiframe::{FilterBank, FilterConfig, FilterInputs, FilterKind, Spectrogram};
//! use multiframe::ndarray::Array5;
//! use multiframe::Complex32;
//!
//! let config = FilterConfig {
//!     num_bins: 8,
//!     num_freqs: 4,
//!     frame_size: 3,
//!     lookahead: 1,
//!     ..Default::default()
//! };
//! let bank = FilterBank::new(FilterKind::DeepFilter { conj: false }, config)?;
//!
//! let spec = Spectrogram::from_elem((1, 1, 10, 8), Complex32::new(1.0, -1.0));
//! let coefs = Array5::from_elem((1, 1, 10, 4, 3), Complex32::new(0.25, 0.0));
//! let filtered = bank.apply(&spec, FilterInputs::Coefficients(coefs.view()))?;
//!
//! assert_eq!(filtered.spectrogram.dim(), spec.dim());
//! assert!(filtered.report.is_clean());
//! # Ok::<(), multiframe::Error>(())
//! ```

mod deep_filter;
mod deep_filter_split;
mod mvdr;
mod ratio_mask;
mod wiener;

pub use deep_filter::DeepFilter;
pub use deep_filter_split::DeepFilterSplit;
pub use mvdr::MvdrBeamformer;
pub use ratio_mask::RatioMask;
pub use wiener::WienerFilter;

use ndarray::{
    Array4, Array5, ArrayBase, ArrayView4, ArrayView5, ArrayView6, Axis, Data, DataMut, Ix4, Ix5,
    Ix6, Slice, Zip,
};
use num_complex::Complex32;

use crate::{FREQ_AXIS, Spectrogram};
use crate::config::{FilterConfig, FilterKind};
use crate::error::{Error, Result, check_shape};
use crate::report::FilterReport;
use crate::solver::{mat_vec, solve};
use crate::unfold::FrameWindower;

/// Per-call inputs of a filter, borrowed from the predictor output.
///
/// Use the [`packing`](crate::packing) adapters to bring interleaved
/// predictor tensors into these layouts.
#[derive(Debug, Clone, Copy)]
pub enum FilterInputs<'a> {
    /// Deep filter taps `[B, C, T, F', N]`.
    Coefficients(ArrayView5<'a, Complex32>),
    /// Complex ratio mask `[B, C, T, F']`.
    Mask(ArrayView4<'a, Complex32>),
    /// Speech inter-frame correlation `[B, C, T, F', N]` and a predicted
    /// inverse covariance `[B, C, T, F', N, N]`.
    InverseCovariance {
        ifc: ArrayView5<'a, Complex32>,
        inverse: ArrayView6<'a, Complex32>,
    },
    /// Speech inter-frame correlation `[B, C, T, F', N]` and a covariance
    /// `[B, C, T, F', N, N]` to solve against after regularization.
    Covariance {
        ifc: ArrayView5<'a, Complex32>,
        covariance: ArrayView6<'a, Complex32>,
    },
}

impl FilterInputs<'_> {
    /// Short name used in error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Coefficients(_) => "coefficient",
            Self::Mask(_) => "mask",
            Self::InverseCovariance { .. } => "inverse covariance",
            Self::Covariance { .. } => "covariance",
        }
    }
}

/// Output of [`FilterBank::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered {
    /// The filtered spectrogram, shaped like the input.
    pub spectrogram: Spectrogram,
    /// Diagnostics of the call.
    pub report: FilterReport,
}

/// A multi-frame filter, fixed at construction.
#[derive(Debug, Clone)]
pub enum FilterBank {
    /// See [`DeepFilter`].
    DeepFilter(DeepFilter),
    /// See [`DeepFilterSplit`].
    DeepFilterSplit(DeepFilterSplit),
    /// See [`RatioMask`].
    RatioMask(RatioMask),
    /// See [`WienerFilter`].
    Wiener(WienerFilter),
    /// See [`MvdrBeamformer`].
    Mvdr(MvdrBeamformer),
}

impl FilterBank {
    /// Builds and validates a filter.
    pub fn new(kind: FilterKind, config: FilterConfig) -> Result<Self> {
        let bank = match kind {
            FilterKind::DeepFilter { conj } => Self::DeepFilter(DeepFilter::new(config, conj)?),
            FilterKind::DeepFilterSplit { conj } => {
                Self::DeepFilterSplit(DeepFilterSplit::new(config, conj)?)
            }
            FilterKind::RatioMask => Self::RatioMask(RatioMask::new(config)?),
            FilterKind::Wiener => Self::Wiener(WienerFilter::new(config)?),
            FilterKind::Mvdr { eps } => Self::Mvdr(MvdrBeamformer::new(config, eps)?),
        };
        tracing::debug!(
            filter = kind.name(),
            num_bins = config.num_bins,
            num_freqs = config.num_freqs,
            frame_size = config.frame_size,
            lookahead = config.lookahead,
            "created filter"
        );
        Ok(bank)
    }

    /// The filter algorithm and its flags.
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::DeepFilter(filter) => FilterKind::DeepFilter { conj: filter.conj() },
            Self::DeepFilterSplit(filter) => FilterKind::DeepFilterSplit { conj: filter.conj() },
            Self::RatioMask(_) => FilterKind::RatioMask,
            Self::Wiener(_) => FilterKind::Wiener,
            Self::Mvdr(filter) => FilterKind::Mvdr { eps: filter.eps() },
        }
    }

    /// The configuration the filter was built with.
    pub fn config(&self) -> &FilterConfig {
        match self {
            Self::DeepFilter(filter) => filter.config(),
            Self::DeepFilterSplit(filter) => filter.config(),
            Self::RatioMask(filter) => filter.config(),
            Self::Wiener(filter) => filter.config(),
            Self::Mvdr(filter) => filter.config(),
        }
    }

    /// Frames of algorithmic delay added by the look-ahead.
    pub fn latency_frames(&self) -> usize {
        self.config().lookahead
    }

    /// Filters a copy of `spec`, leaving the caller's array untouched.
    pub fn apply<S>(&self, spec: &ArrayBase<S, Ix4>, inputs: FilterInputs<'_>) -> Result<Filtered>
    where
        S: Data<Elem = Complex32>,
    {
        let mut spectrogram = spec.to_owned();
        let report = self.apply_in_place(&mut spectrogram, inputs)?;
        Ok(Filtered {
            spectrogram,
            report,
        })
    }

    /// Filters the low band of `spec` in place.
    ///
    /// The windows are copied out of `spec` before any bin is written, so
    /// the result equals [`apply`](Self::apply). On error `spec` is left
    /// unchanged.
    pub fn apply_in_place<S>(
        &self,
        spec: &mut ArrayBase<S, Ix4>,
        inputs: FilterInputs<'_>,
    ) -> Result<FilterReport>
    where
        S: DataMut<Elem = Complex32>,
    {
        let config = self.config();
        let filter = self.kind().name();
        let (b, c, t, _) = spec.dim();
        check_shape("spectrogram", &[b, c, t, config.num_bins], spec.shape())?;
        tracing::trace!(
            filter,
            batch = b,
            channels = c,
            frames = t,
            inputs = inputs.name(),
            "apply"
        );

        let mut report = FilterReport::default();
        let band = Slice::from(..config.num_freqs);
        let low = spec.slice_axis(FREQ_AXIS, band);
        let filtered = match self {
            Self::DeepFilter(f) => f.filter(low, inputs)?,
            Self::DeepFilterSplit(f) => f.filter(low, inputs)?,
            Self::RatioMask(f) => f.filter(low, inputs)?,
            Self::Wiener(f) => f.filter(low, inputs, &mut report)?,
            Self::Mvdr(f) => f.filter(low, inputs, &mut report)?,
        };
        report.count_non_finite(&filtered);
        spec.slice_axis_mut(FREQ_AXIS, band).assign(&filtered);
        report.warn_if_degenerate(filter);
        Ok(report)
    }

    /// Applies the split deep filter to interleaved `f32` data in place.
    ///
    /// `spec` is `[B, C, T, F, 2]` and `coefs` is `[B, C, N, T, F', 2]`, the
    /// layouts used by runtimes without a complex type. Every other filter
    /// rejects this call with [`Error::UnsupportedInputs`].
    pub fn apply_interleaved<S, T>(
        &self,
        spec: &mut ArrayBase<S, Ix5>,
        coefs: &ArrayBase<T, Ix6>,
    ) -> Result<FilterReport>
    where
        S: DataMut<Elem = f32>,
        T: Data<Elem = f32>,
    {
        match self {
            Self::DeepFilterSplit(filter) => filter.apply_interleaved(spec, coefs),
            other => Err(Error::UnsupportedInputs {
                filter: other.kind().name(),
                inputs: "interleaved",
            }),
        }
    }
}

/// Configuration and windowing shared by every variant.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MultiFrame {
    config: FilterConfig,
    windower: FrameWindower,
}

impl MultiFrame {
    fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            windower: FrameWindower::new(config.frame_size, config.lookahead)?,
        })
    }

    /// `[B, C, T, F', N]` for a low band of shape `[B, C, T, F']`.
    fn vector_shape(&self, low: &ArrayView4<'_, Complex32>) -> [usize; 5] {
        let (b, c, t, f) = low.dim();
        [b, c, t, f, self.config.frame_size]
    }

    fn matrix_shape(&self, low: &ArrayView4<'_, Complex32>) -> [usize; 6] {
        let [b, c, t, f, n] = self.vector_shape(low);
        [b, c, t, f, n, n]
    }

    /// Windows the low band and combines each window with its taps.
    fn filter_frames<S>(
        &self,
        low: ArrayView4<'_, Complex32>,
        taps: &ArrayBase<S, Ix5>,
    ) -> Array4<Complex32>
    where
        S: Data<Elem = Complex32>,
    {
        apply_taps(&self.windower.unfold(&low), taps)
    }

    /// Computes `inverse * ifc`, or solves the regularized covariance
    /// against `ifc`. Returns `ifc` alongside the product.
    fn covariance_weights<'a>(
        &self,
        filter: &'static str,
        low: &ArrayView4<'_, Complex32>,
        inputs: FilterInputs<'a>,
        report: &mut FilterReport,
    ) -> Result<(ArrayView5<'a, Complex32>, Array5<Complex32>)> {
        match inputs {
            FilterInputs::InverseCovariance { ifc, inverse } => {
                check_shape("ifc", &self.vector_shape(low), ifc.shape())?;
                check_shape("inverse covariance", &self.matrix_shape(low), inverse.shape())?;
                Ok((ifc, mat_vec(&inverse, &ifc)?))
            }
            FilterInputs::Covariance { ifc, covariance } => {
                check_shape("ifc", &self.vector_shape(low), ifc.shape())?;
                check_shape("covariance", &self.matrix_shape(low), covariance.shape())?;
                let solution = solve(&covariance, &ifc, self.config.regularization)?;
                report.ill_conditioned += solution.ill_conditioned;
                report.singular += solution.singular;
                Ok((ifc, solution.value))
            }
            other => Err(Error::UnsupportedInputs {
                filter,
                inputs: other.name(),
            }),
        }
    }
}

/// `out[.., f] = sum_n frames[.., f, n] * taps[.., f, n]`.
///
/// Shapes must already agree.
fn apply_taps<S, T>(frames: &ArrayBase<S, Ix5>, taps: &ArrayBase<T, Ix5>) -> Array4<Complex32>
where
    S: Data<Elem = Complex32>,
    T: Data<Elem = Complex32>,
{
    Zip::from(frames.lanes(Axis(4)))
        .and(taps.lanes(Axis(4)))
        .map_collect(|x, w| x.iter().zip(w.iter()).map(|(x, w)| x * w).sum::<Complex32>())
}
