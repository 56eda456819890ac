//! Reshaping helpers for batched per-bin computation.
//!
//! Every per-bin operation flattens the leading `[B, C, T, F]` axes into a
//! single bin axis, works on `[bins, ...]`, and restores the shape at the
//! end.

use ndarray::{Array, ArrayBase, CowArray, Data, Dimension, IntoDimension};

use crate::error::{Error, Result};

/// Reshapes an owned array in row-major order.
pub(crate) fn reshape<A, D, E>(
    what: &'static str,
    array: Array<A, D>,
    shape: E,
) -> Result<Array<A, E::Dim>>
where
    A: Clone,
    D: Dimension,
    E: IntoDimension,
{
    let dim = shape.into_dimension();
    let actual = array.shape().to_vec();
    let expected = dim.slice().to_vec();
    let array = if array.is_standard_layout() {
        array
    } else {
        array.as_standard_layout().into_owned()
    };
    array
        .into_shape_with_order(dim)
        .map_err(|_| Error::ShapeMismatch {
            what,
            expected,
            actual,
        })
}

/// Views an array of any layout under a new row-major shape, copying only
/// when the layout requires it.
pub(crate) fn flatten<'a, A, S, D, E>(
    what: &'static str,
    array: &'a ArrayBase<S, D>,
    shape: E,
) -> Result<CowArray<'a, A, E::Dim>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
    E: IntoDimension,
{
    let dim = shape.into_dimension();
    let expected = dim.slice().to_vec();
    array.to_shape(dim).map_err(|_| Error::ShapeMismatch {
        what,
        expected,
        actual: array.shape().to_vec(),
    })
}

/// Number of bins covered by the leading axes of `shape`.
pub(crate) fn num_bins(shape: &[usize], leading: usize) -> usize {
    shape[..leading].iter().product()
}
