//! Multi-frame Wiener filter.

use ndarray::{Array4, ArrayView4};
use num_complex::Complex32;

use super::{FilterInputs, MultiFrame};
use crate::config::{FilterConfig, FilterKind};
use crate::error::Result;
use crate::report::FilterReport;

/// Linear MMSE combination of the frame window.
///
/// The weights are `w = inv(Rxx) * ifc`, from either a predicted inverse
/// noisy covariance or a regularized solve against `Rxx`, and the output is
/// `sum_n x[n] * w[n]`.
#[derive(Debug, Clone)]
pub struct WienerFilter {
    core: MultiFrame,
}

impl WienerFilter {
    /// Creates a multi-frame Wiener filter.
    pub fn new(config: FilterConfig) -> Result<Self> {
        Ok(Self {
            core: MultiFrame::new(config)?,
        })
    }

    /// The configuration the filter was built with.
    pub fn config(&self) -> &FilterConfig {
        &self.core.config
    }

    pub(super) fn filter(
        &self,
        low: ArrayView4<'_, Complex32>,
        inputs: FilterInputs<'_>,
        report: &mut FilterReport,
    ) -> Result<Array4<Complex32>> {
        let (_, weights) = self
            .core
            .covariance_weights(FilterKind::Wiener.name(), &low, inputs, report)?;
        Ok(self.core.filter_frames(low, &weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filter_bank::FilterBank;
    use crate::filter_bank::tests::{config, spectrogram};
    use crate::solver::invert;
    use ndarray::{Array2, Array5, Array6, s};

    fn identity(b: usize, t: usize, f: usize, n: usize) -> Array6<Complex32> {
        let mut out = Array6::<Complex32>::zeros((b, 1, t, f, n, n));
        for i in 0..n {
            out.slice_mut(s![.., .., .., .., i, i])
                .fill(Complex32::new(1.0, 0.0));
        }
        out
    }

    fn ifc(t: usize, f: usize, n: usize) -> Array5<Complex32> {
        Array5::from_shape_fn((1, 1, t, f, n), |(_, _, t, f, n)| {
            Complex32::new(0.2 * (n as f32 + 1.0), 0.1 * (t + f) as f32)
        })
    }

    fn hermitian(t: usize, f: usize, n: usize) -> Array6<Complex32> {
        // A A^H + I, positive definite in every bin.
        let mut out = Array6::<Complex32>::zeros((1, 1, t, f, n, n));
        for ti in 0..t {
            for fi in 0..f {
                let a = Array2::from_shape_fn((n, n), |(i, j)| {
                    let re = (i + 2 * j + ti) as f32 * 0.3;
                    Complex32::new(re, (fi + i) as f32 * 0.2 - 0.1 * j as f32)
                });
                let ah = a.t().mapv(|z| z.conj());
                let m = a.dot(&ah) + Array2::from_diag_elem(n, Complex32::new(1.0, 0.0));
                out.slice_mut(s![0, 0, ti, fi, .., ..]).assign(&m);
            }
        }
        out
    }

    #[test]
    fn identity_inverse_uses_ifc_as_taps() {
        let cfg = config(6, 4, 3, 1);
        let spec = spectrogram(1, 1, 5, 6);
        let ifc = ifc(5, 4, 3);
        let wiener = FilterBank::new(FilterKind::Wiener, cfg).unwrap();
        let deep = FilterBank::new(FilterKind::DeepFilter { conj: false }, cfg).unwrap();

        let inverse = identity(1, 5, 4, 3);
        let out = wiener
            .apply(
                &spec,
                FilterInputs::InverseCovariance {
                    ifc: ifc.view(),
                    inverse: inverse.view(),
                },
            )
            .unwrap();
        let expected = deep.apply(&spec, FilterInputs::Coefficients(ifc.view())).unwrap();
        assert_eq!(out.spectrogram, expected.spectrogram);
        assert_eq!(out.spectrogram.slice(s![.., .., .., 4..]), spec.slice(s![.., .., .., 4..]));
    }

    #[test]
    fn covariance_solve_matches_explicit_inverse() {
        let cfg = config(5, 3, 3, 0);
        let bank = FilterBank::new(FilterKind::Wiener, cfg).unwrap();
        let spec = spectrogram(1, 1, 4, 5);
        let ifc = ifc(4, 3, 3);
        let rxx = hermitian(4, 3, 3);
        let inverse = invert(&rxx, cfg.regularization).unwrap().value;

        let solved = bank
            .apply(
                &spec,
                FilterInputs::Covariance {
                    ifc: ifc.view(),
                    covariance: rxx.view(),
                },
            )
            .unwrap();
        let inverted = bank
            .apply(
                &spec,
                FilterInputs::InverseCovariance {
                    ifc: ifc.view(),
                    inverse: inverse.view(),
                },
            )
            .unwrap();
        assert!(solved.report.is_clean());
        for (a, b) in solved.spectrogram.iter().zip(inverted.spectrogram.iter()) {
            assert!((a - b).norm() < 1e-4, "{a} != {b}");
        }
    }

    #[test]
    fn singular_covariance_is_reported() {
        let mut cfg = config(3, 2, 2, 0);
        cfg.regularization.diag_eps = 0.0;
        cfg.regularization.eps = 0.0;
        let bank = FilterBank::new(FilterKind::Wiener, cfg).unwrap();
        let spec = spectrogram(1, 1, 2, 3);
        let ifc = ifc(2, 2, 2);
        let covariance = Array6::<Complex32>::zeros((1, 1, 2, 2, 2, 2));
        let out = bank
            .apply(
                &spec,
                FilterInputs::Covariance {
                    ifc: ifc.view(),
                    covariance: covariance.view(),
                },
            )
            .unwrap();
        assert_eq!(out.report.singular, 4);
        assert_eq!(out.report.non_finite_outputs, 4);
        assert_eq!(out.spectrogram.slice(s![.., .., .., 2..]), spec.slice(s![.., .., .., 2..]));
    }

    #[test]
    fn statistics_shapes_are_checked() {
        let bank = FilterBank::new(FilterKind::Wiener, config(4, 2, 2, 0)).unwrap();
        let spec = spectrogram(1, 1, 3, 4);
        let ifc = ifc(3, 2, 2);
        let inverse = identity(1, 3, 2, 3);
        assert_eq!(
            bank.apply(
                &spec,
                FilterInputs::InverseCovariance {
                    ifc: ifc.view(),
                    inverse: inverse.view(),
                },
            )
            .unwrap_err(),
            Error::ShapeMismatch {
                what: "inverse covariance",
                expected: vec![1, 1, 3, 2, 2, 2],
                actual: vec![1, 1, 3, 2, 3, 3],
            }
        );
    }
}
