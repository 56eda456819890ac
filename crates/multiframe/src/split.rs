//! Explicit real/imaginary plane representation.
//!
//! Mirrors the `re`/`im` array pairs used for spectra elsewhere in this
//! workspace, for targets that lack a native complex type. Conversions to
//! and from [`Complex32`] arrays and the interleaved `[..., 2]` layout live
//! here so that the rest of the crate only sees one representation at a
//! time.

use ndarray::{Array, ArrayBase, Axis, Data, Dimension, IntoDimension, RemoveAxis, Zip};
use num_complex::Complex32;

use crate::error::{Result, check_shape};

/// Separate real and imaginary planes of the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitComplex<D: Dimension> {
    /// Real parts.
    pub re: Array<f32, D>,
    /// Imaginary parts.
    pub im: Array<f32, D>,
}

impl<D: Dimension> SplitComplex<D> {
    /// Splits a complex array into planes.
    pub fn from_complex<S>(x: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = Complex32>,
    {
        Self {
            re: x.mapv(|z| z.re),
            im: x.mapv(|z| z.im),
        }
    }

    /// Splits an interleaved `[..., 2]` array into planes.
    pub fn from_interleaved<S, E>(x: &ArrayBase<S, E>) -> Result<Self>
    where
        S: Data<Elem = f32>,
        E: RemoveAxis<Smaller = D>,
    {
        let last = Axis(x.ndim() - 1);
        let mut expected = x.shape().to_vec();
        if let Some(pair) = expected.last_mut() {
            *pair = 2;
        }
        check_shape("interleaved planes", &expected, x.shape())?;
        Ok(Self {
            re: x.index_axis(last, 0).to_owned(),
            im: x.index_axis(last, 1).to_owned(),
        })
    }

    /// Joins the planes into a complex array.
    pub fn to_complex(&self) -> Array<Complex32, D> {
        Zip::from(&self.re)
            .and(&self.im)
            .map_collect(|&re, &im| Complex32::new(re, im))
    }

    /// Shape shared by both planes.
    pub fn shape(&self) -> &[usize] {
        self.re.shape()
    }

    /// Reorders the axes of both planes.
    pub fn permuted_axes<T>(self, axes: T) -> Self
    where
        T: IntoDimension<Dim = D> + Clone,
    {
        Self {
            re: self.re.permuted_axes(axes.clone()),
            im: self.im.permuted_axes(axes),
        }
    }

    /// Negates the imaginary plane.
    pub fn conj(mut self) -> Self {
        self.im.mapv_inplace(|v| -v);
        self
    }
}
