//! Deep filtering with complex taps.

use ndarray::{Array4, ArrayView4};
use num_complex::Complex32;

use super::{FilterInputs, MultiFrame};
use crate::config::{FilterConfig, FilterKind};
use crate::error::{Error, Result, check_shape};

/// Combines the `N` frames around every bin with predicted complex taps:
/// `y[t, f] = sum_n x[t - N + 1 + lookahead + n, f] * w[t, f, n]`.
///
/// The taps carry no imposed structure. With `conj` set they are conjugated
/// first, matching predictors that emit `conj(w)`.
#[derive(Debug, Clone)]
pub struct DeepFilter {
    core: MultiFrame,
    conj: bool,
}

impl DeepFilter {
    /// Creates a deep filter.
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

    /// Whether taps are conjugated before use.
    pub fn conj(&self) -> bool {
        self.conj
    }

    pub(super) fn filter(
        &self,
        low: ArrayView4<'_, Complex32>,
        inputs: FilterInputs<'_>,
    ) -> Result<Array4<Complex32>> {
        let FilterInputs::Coefficients(coefs) = inputs else {
            return Err(Error::UnsupportedInputs {
                filter: FilterKind::DeepFilter { conj: self.conj }.name(),
                inputs: inputs.name(),
            });
        };
        check_shape("coefficients", &self.core.vector_shape(&low), coefs.shape())?;
        if self.conj {
            Ok(self.core.filter_frames(low, &coefs.mapv(|w| w.conj())))
        } else {
            Ok(self.core.filter_frames(low, &coefs))
        }
    }
}
