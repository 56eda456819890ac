//! Multi-frame minimum variance distortionless response beamformer.

use ndarray::{Array4, ArrayView4, Axis, Zip};
use num_complex::Complex32;

use super::{FilterInputs, MultiFrame};
use crate::config::{FilterConfig, FilterKind};
use crate::error::Result;
use crate::report::FilterReport;

/// MVDR weights over the frame window:
///
/// ```text
/// num = inv(Rnn) * ifc
/// w   = num / (real(ifc^H * num) + eps)
/// ```
///
/// The normalization keeps `w^H * ifc` close to one, so the speech component
/// described by `ifc` passes undistorted while the noise power is minimized.
#[derive(Debug, Clone)]
pub struct MvdrBeamformer {
    core: MultiFrame,
    eps: f32,
}

impl MvdrBeamformer {
    /// Creates an MVDR beamformer with denominator floor `eps`.
    pub fn new(config: FilterConfig, eps: f32) -> Result<Self> {
        Ok(Self {
            core: MultiFrame::new(config)?,
            eps,
        })
    }

    /// The configuration the filter was built with.
    pub fn config(&self) -> &FilterConfig {
        &self.core.config
    }

    /// Floor added to the normalization denominator.
    pub fn eps(&self) -> f32 {
        self.eps
    }

    pub(super) fn filter(
        &self,
        low: ArrayView4<'_, Complex32>,
        inputs: FilterInputs<'_>,
        report: &mut FilterReport,
    ) -> Result<Array4<Complex32>> {
        let filter = FilterKind::Mvdr { eps: self.eps }.name();
        let (ifc, mut weights) = self.core.covariance_weights(filter, &low, inputs, report)?;

        let eps = self.eps;
        let mut degenerate = 0;
        Zip::from(weights.lanes_mut(Axis(4)))
            .and(ifc.lanes(Axis(4)))
            .for_each(|mut w, ifc| {
                let quad: f32 = ifc.iter().zip(w.iter()).map(|(d, n)| (d.conj() * n).re).sum();
                let denominator = quad + eps;
                if denominator.is_nan() || denominator.abs() <= eps {
                    degenerate += 1;
                }
                w.mapv_inplace(|z| z / denominator);
            });
        report.degenerate_weights += degenerate;

        Ok(self.core.filter_frames(low, &weights))
    }
}
