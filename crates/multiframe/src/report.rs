//! Per-call filter diagnostics.

use ndarray::{ArrayBase, Data, Dimension};
use num_complex::Complex32;

/// Numeric diagnostics of one filter application.
///
/// Degenerate inputs never fail a call; they are counted here so callers can
/// decide whether to keep the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// Number of `[B, C, T, F]` bins that were filtered, i.e. all bins below
    /// `num_freqs`.
    pub filtered_bins: usize,
    /// Filtered bins whose output is NaN or infinite.
    pub non_finite_outputs: usize,
    /// MVDR weights whose normalization denominator was not above `eps`.
    pub degenerate_weights: usize,
    /// Bins whose covariance solve was ill-conditioned.
    pub ill_conditioned: usize,
    /// Bins whose covariance solve hit an exactly singular system.
    pub singular: usize,
}

impl FilterReport {
    /// Whether the call produced finite outputs from well-posed inputs.
    pub fn is_clean(&self) -> bool {
        self.non_finite_outputs == 0
            && self.degenerate_weights == 0
            && self.ill_conditioned == 0
            && self.singular == 0
    }

    pub(crate) fn count_non_finite<S, D>(&mut self, filtered: &ArrayBase<S, D>)
    where
        S: Data<Elem = Complex32>,
        D: Dimension,
    {
        self.filtered_bins = filtered.len();
        self.non_finite_outputs = filtered.iter().filter(|z| !z.is_finite()).count();
    }

    pub(crate) fn warn_if_degenerate(&self, filter: &'static str) {
        if !self.is_clean() {
            tracing::warn!(
                filter,
                filtered_bins = self.filtered_bins,
                non_finite_outputs = self.non_finite_outputs,
                degenerate_weights = self.degenerate_weights,
                ill_conditioned = self.ill_conditioned,
                singular = self.singular,
                "degenerate filter output"
            );
        }
    }
}
