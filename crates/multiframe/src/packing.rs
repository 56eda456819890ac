//! Conversions between predictor output layouts and the canonical
//! complex representation.
//!
//! Predictors emit flat `f32` tensors with real and imaginary parts
//! interleaved in the innermost axis and taps packed into channel or feature
//! axes. These adapters unpack them into `Complex32` arrays shaped the way
//! the filters consume them:
//!
//! | Input | Packed | Canonical |
//! |-------|--------|-----------|
//! | deep filter taps | `[B, C*N, T, F, 2]` | `[B, C, T, F, N]` |
//! | split deep filter taps | `[B, C*N, T, F, 2]` | `[B, C, N, T, F, 2]` |
//! | `ifc` vector | `[B, C, T, F, N*2]` | `[B, C, T, F, N]` |
//! | covariance / inverse | `[B, C, T, F, N*N*2]` | `[B, C, T, F, N, N]` |

use ndarray::{Array, Array5, Array6, ArrayBase, Axis, Data, Dimension, Ix5, RemoveAxis, Slice, Zip};
use num_complex::Complex32;

use crate::error::{Error, Result, check_shape};
use crate::layout::{flatten, reshape};

/// Reads an interleaved `[..., 2]` array as complex values.
///
/// Contiguous inputs are reinterpreted directly; other layouts are gathered
/// element by element.
pub fn complex_from_interleaved<S, E>(x: &ArrayBase<S, E>) -> Result<Array<Complex32, E::Smaller>>
where
    S: Data<Elem = f32>,
    E: RemoveAxis,
{
    let last = Axis(x.ndim() - 1);
    let mut expected = x.shape().to_vec();
    if let Some(pair) = expected.last_mut() {
        *pair = 2;
    }
    check_shape("interleaved complex", &expected, x.shape())?;

    let re = x.index_axis(last, 0);
    if let Some(values) = x
        .as_slice()
        .and_then(|flat| bytemuck::try_cast_slice::<f32, Complex32>(flat).ok())
    {
        if let Ok(out) = Array::from_shape_vec(re.raw_dim(), values.to_vec()) {
            return Ok(out);
        }
    }
    Ok(Zip::from(&re)
        .and(&x.index_axis(last, 1))
        .map_collect(|&re, &im| Complex32::new(re, im)))
}

/// Writes complex values as an interleaved `[..., 2]` array.
pub fn interleaved_from_complex<S, D>(x: &ArrayBase<S, D>) -> Array<f32, D::Larger>
where
    S: Data<Elem = Complex32>,
    D: Dimension,
{
    let last = Axis(x.ndim());
    let mut dim = x.view().insert_axis(last).raw_dim();
    dim[last.index()] = 2;

    if let Some(flat) = x.as_slice() {
        let values: &[f32] = bytemuck::cast_slice(flat);
        if let Ok(out) = Array::from_shape_vec(dim.clone(), values.to_vec()) {
            return out;
        }
    }
    let mut out = Array::zeros(dim);
    out.slice_axis_mut(last, Slice::from(0..1))
        .assign(&x.mapv(|z| z.re).insert_axis(last));
    out.slice_axis_mut(last, Slice::from(1..2))
        .assign(&x.mapv(|z| z.im).insert_axis(last));
    out
}

/// Unpacks deep filter taps from `[B, C*N, T, F, 2]` to `[B, C, T, F, N]`.
///
/// The packed channel axis holds `C` groups of `N` taps each.
pub fn unpack_coefs<S>(packed: &ArrayBase<S, Ix5>, frame_size: usize) -> Result<Array5<Complex32>>
where
    S: Data<Elem = f32>,
{
    let channels = coef_channels(packed, frame_size)?;
    let (b, _, t, f, _) = packed.dim();
    let complex = complex_from_interleaved(packed)?;
    let grouped = reshape(
        "deep filter coefficients",
        complex,
        (b, channels, frame_size, t, f),
    )?;
    Ok(grouped
        .permuted_axes([0, 1, 3, 4, 2])
        .as_standard_layout()
        .into_owned())
}

/// Regroups deep filter taps from `[B, C*N, T, F, 2]` to
/// `[B, C, N, T, F, 2]`, the layout of
/// [`FilterBank::apply_interleaved`](crate::FilterBank::apply_interleaved).
///
/// Same grouping as [`unpack_coefs`], but the values stay interleaved `f32`.
pub fn unpack_split_coefs<S>(packed: &ArrayBase<S, Ix5>, frame_size: usize) -> Result<Array6<f32>>
where
    S: Data<Elem = f32>,
{
    let channels = coef_channels(packed, frame_size)?;
    let (b, packed_channels, t, f, _) = packed.dim();
    check_shape(
        "deep filter coefficients",
        &[b, packed_channels, t, f, 2],
        packed.shape(),
    )?;
    let grouped = flatten(
        "deep filter coefficients",
        packed,
        (b, channels, frame_size, t, f, 2),
    )?;
    Ok(grouped.into_owned())
}

/// Number of channels `C` in a packed `C*N` coefficient axis.
fn coef_channels<S>(packed: &ArrayBase<S, Ix5>, frame_size: usize) -> Result<usize>
where
    S: Data<Elem = f32>,
{
    if frame_size == 0 {
        return Err(Error::ZeroFrameSize);
    }
    let packed_channels = packed.len_of(Axis(1));
    if packed_channels % frame_size != 0 {
        return Err(Error::PackedLength {
            what: "deep filter coefficients",
            len: packed_channels,
            group: frame_size,
        });
    }
    Ok(packed_channels / frame_size)
}

/// Unpacks a per-bin vector from `[B, C, T, F, N*2]` to `[B, C, T, F, N]`.
pub fn unpack_vector<S>(packed: &ArrayBase<S, Ix5>, frame_size: usize) -> Result<Array5<Complex32>>
where
    S: Data<Elem = f32>,
{
    let (b, c, t, f, _) = packed.dim();
    check_shape(
        "packed vector",
        &[b, c, t, f, frame_size * 2],
        packed.shape(),
    )?;
    let pairs = flatten("packed vector", packed, (b, c, t, f, frame_size, 2))?;
    complex_from_interleaved(&pairs)
}

/// Unpacks a per-bin matrix from `[B, C, T, F, N*N*2]` to
/// `[B, C, T, F, N, N]`, rows first.
pub fn unpack_matrix<S>(packed: &ArrayBase<S, Ix5>, frame_size: usize) -> Result<Array6<Complex32>>
where
    S: Data<Elem = f32>,
{
    let (b, c, t, f, _) = packed.dim();
    let entries = frame_size * frame_size;
    check_shape("packed matrix", &[b, c, t, f, entries * 2], packed.shape())?;
    let pairs = flatten("packed matrix", packed, (b, c, t, f, entries, 2))?;
    let flat = complex_from_interleaved(&pairs)?;
    reshape("packed matrix", flat, (b, c, t, f, frame_size, frame_size))
}
