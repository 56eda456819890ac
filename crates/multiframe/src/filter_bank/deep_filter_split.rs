//! Deep filtering on separate real and imaginary planes.

use ndarray::{Array4, ArrayBase, ArrayView4, Axis, Data, DataMut, Ix4, Ix5, Ix6, Zip, s};
use num_complex::Complex32;

use super::{FilterInputs, MultiFrame};
use crate::config::{FilterConfig, FilterKind};
use crate::error::{Error, Result, check_shape};
use crate::report::FilterReport;
use crate::split::SplitComplex;

/// The deep filter computed without a complex type:
///
/// ```text
/// y.re = sum_n x.re[n] * w.re[n] - x.im[n] * w.im[n]
/// y.im = sum_n x.re[n] * w.im[n] + x.im[n] * w.re[n]
/// ```
///
/// Produces the same values as [`DeepFilter`](super::DeepFilter) for the
/// same `conj` flag. [`apply_interleaved`](Self::apply_interleaved) works on
/// `[..., 2]` `f32` arrays directly.
#[derive(Debug, Clone)]
pub struct DeepFilterSplit {
    core: MultiFrame,
    conj: bool,
}

impl DeepFilterSplit {
    /// Creates a split deep filter.
    pub fn new(config: FilterConfig, conj: bool) -> Result<Self> {
        Ok(Self {
            core: MultiFrame::new(config)?,
            conj,
        })
    }

    /// The configuration the filter was built with.
    pub fn config(&self) -> &FilterConfig {
        &self.core.config
    }

    /// Whether the imaginary tap plane is negated before use.
    pub fn conj(&self) -> bool {
        self.conj
    }

    /// Filters an interleaved `[B, C, T, F, 2]` spectrogram in place with
    /// interleaved `[B, C, N, T, F', 2]` taps.
    pub fn apply_interleaved<S, T>(
        &self,
        spec: &mut ArrayBase<S, Ix5>,
        coefs: &ArrayBase<T, Ix6>,
    ) -> Result<FilterReport>
    where
        S: DataMut<Elem = f32>,
        T: Data<Elem = f32>,
    {
        let config = &self.core.config;
        let (b, c, t, _, _) = spec.dim();
        let nf = config.num_freqs;
        check_shape("interleaved spectrogram", &[b, c, t, config.num_bins, 2], spec.shape())?;
        check_shape(
            "interleaved coefficients",
            &[b, c, config.frame_size, t, nf, 2],
            coefs.shape(),
        )?;
        tracing::trace!(batch = b, channels = c, frames = t, "apply interleaved");

        let low: SplitComplex<Ix4> =
            SplitComplex::from_interleaved(&spec.slice(s![.., .., .., ..nf, ..]))?;
        // [B, C, N, T, F'] -> [B, C, T, F', N]
        let taps: SplitComplex<Ix5> =
            SplitComplex::from_interleaved(coefs)?.permuted_axes([0, 1, 3, 4, 2]);
        let out = self.filter_planes(&low, taps);

        let mut report = FilterReport::default();
        report.count_non_finite(&out.to_complex());
        spec.slice_mut(s![.., .., .., ..nf, 0]).assign(&out.re);
        spec.slice_mut(s![.., .., .., ..nf, 1]).assign(&out.im);
        report.warn_if_degenerate(self.name());
        Ok(report)
    }

    pub(super) fn filter(
        &self,
        low: ArrayView4<'_, Complex32>,
        inputs: FilterInputs<'_>,
    ) -> Result<Array4<Complex32>> {
        let FilterInputs::Coefficients(coefs) = inputs else {
            return Err(Error::UnsupportedInputs {
                filter: self.name(),
                inputs: inputs.name(),
            });
        };
        check_shape("coefficients", &self.core.vector_shape(&low), coefs.shape())?;
        let out = self.filter_planes(
            &SplitComplex::from_complex(&low),
            SplitComplex::from_complex(&coefs),
        );
        Ok(out.to_complex())
    }

    fn filter_planes(&self, low: &SplitComplex<Ix4>, taps: SplitComplex<Ix5>) -> SplitComplex<Ix4> {
        let taps = if self.conj { taps.conj() } else { taps };
        let frames = self.core.windower.unfold_split(low);
        split_taps(&frames, &taps)
    }

    fn name(&self) -> &'static str {
        FilterKind::DeepFilterSplit { conj: self.conj }.name()
    }
}

fn split_taps(frames: &SplitComplex<Ix5>, taps: &SplitComplex<Ix5>) -> SplitComplex<Ix4> {
    let (b, c, t, f, _) = frames.re.dim();
    let mut out = SplitComplex {
        re: Array4::zeros((b, c, t, f)),
        im: Array4::zeros((b, c, t, f)),
    };
    Zip::from(&mut out.re)
        .and(&mut out.im)
        .and(frames.re.lanes(Axis(4)))
        .and(frames.im.lanes(Axis(4)))
        .and(taps.re.lanes(Axis(4)))
        .and(taps.im.lanes(Axis(4)))
        .for_each(|re, im, xr, xi, wr, wi| {
            let mut acc_re = 0.0;
            let mut acc_im = 0.0;
            for n in 0..xr.len() {
                acc_re += xr[n] * wr[n] - xi[n] * wi[n];
                acc_im += xr[n] * wi[n] + xi[n] * wr[n];
            }
            *re = acc_re;
            *im = acc_im;
        });
    out
}
