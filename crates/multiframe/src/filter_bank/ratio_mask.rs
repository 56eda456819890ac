//! Single-frame complex ratio mask.

use ndarray::{Array4, ArrayView4, Zip};
use num_complex::Complex32;

use super::{FilterInputs, MultiFrame};
use crate::config::{FilterConfig, FilterKind};
use crate::error::{Error, Result, check_shape};

/// Multiplies every low bin by a predicted complex mask value.
///
/// This is the one-tap special case of the deep filter and requires
/// `frame_size == 1` and `lookahead == 0`. No windowing takes place.
#[derive(Debug, Clone)]
pub struct RatioMask {
    core: MultiFrame,
}

impl RatioMask {
    /// Creates a ratio mask.
    pub fn new(config: FilterConfig) -> Result<Self> {
        let core = MultiFrame::new(config)?;
        if config.frame_size != 1 || config.lookahead != 0 {
            return Err(Error::RatioMaskFrames {
                frame_size: config.frame_size,
                lookahead: config.lookahead,
            });
        }
        Ok(Self { core })
    }

    /// The configuration the filter was built with.
    pub fn config(&self) -> &FilterConfig {
        &self.core.config
    }

    pub(super) fn filter(
        &self,
        low: ArrayView4<'_, Complex32>,
        inputs: FilterInputs<'_>,
    ) -> Result<Array4<Complex32>> {
        let FilterInputs::Mask(mask) = inputs else {
            return Err(Error::UnsupportedInputs {
                filter: FilterKind::RatioMask.name(),
                inputs: inputs.name(),
            });
        };
        check_shape("mask", low.shape(), mask.shape())?;
        Ok(Zip::from(&low).and(&mask).map_collect(|&x, &m| x * m))
    }
}
