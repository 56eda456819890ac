//! Regularized batched solves of small complex systems.
//!
//! Every `[B, C, T, F]` bin carries its own `N x N` system, with `N`
//! usually between 2 and 6. Each bin is factored independently with LU
//! decomposition and partial pivoting, reusing one scratch buffer for the
//! whole batch.

use ndarray::{
    Array1, Array2, Array3, Array5, Array6, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1,
    Data, Ix2, Ix5, Ix6,
};
use num_complex::Complex32;

use crate::config::Regularization;
use crate::error::{Result, check_shape};
use crate::layout::{flatten, num_bins, reshape};

/// Smallest accepted ratio between the smallest and largest LU pivot
/// magnitude before a bin is reported as ill-conditioned.
pub const ILL_CONDITIONED_PIVOT_RATIO: f32 = 1e-6;

/// Output of a batched solve together with its conditioning diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<A> {
    /// The solved values.
    pub value: A,
    /// Bins whose pivot ratio fell below [`ILL_CONDITIONED_PIVOT_RATIO`].
    /// Their values are computed but may be inaccurate.
    pub ill_conditioned: usize,
    /// Bins with a zero or non-finite pivot. Their values are NaN.
    pub singular: usize,
}

/// Adds `real(trace) * diag_eps + eps` to the diagonal of a square matrix.
pub fn regularize<S>(matrix: &ArrayBase<S, Ix2>, reg: Regularization) -> Result<Array2<Complex32>>
where
    S: Data<Elem = Complex32>,
{
    let n = matrix.nrows();
    check_shape("regularized matrix", &[n, n], matrix.shape())?;
    let shift = diagonal_shift(matrix.view(), reg);
    let mut out = matrix.to_owned();
    out.diag_mut().mapv_inplace(|z| z + shift);
    Ok(out)
}

/// Regularizes every `[.., N, N]` matrix of a batch.
pub fn regularize_batch<S>(
    matrices: &ArrayBase<S, Ix6>,
    reg: Regularization,
) -> Result<Array6<Complex32>>
where
    S: Data<Elem = Complex32>,
{
    let n = square_size("regularized matrices", matrices)?;
    let bins = num_bins(matrices.shape(), 4);
    let mut flat = reshape("regularized matrices", matrices.to_owned(), (bins, n, n))?;
    for mut matrix in flat.outer_iter_mut() {
        let shift = diagonal_shift(matrix.view(), reg);
        matrix.diag_mut().mapv_inplace(|z| z + shift);
    }
    let (b, c, t, f, _, _) = matrices.dim();
    reshape("regularized matrices", flat, (b, c, t, f, n, n))
}

/// Solves `regularize(A) x = y` for every bin.
///
/// `matrices` is `[B, C, T, F, N, N]` and `targets` is `[B, C, T, F, N]`.
pub fn solve<S, T>(
    matrices: &ArrayBase<S, Ix6>,
    targets: &ArrayBase<T, Ix5>,
    reg: Regularization,
) -> Result<Solution<Array5<Complex32>>>
where
    S: Data<Elem = Complex32>,
    T: Data<Elem = Complex32>,
{
    let n = square_size("solve matrices", matrices)?;
    let (b, c, t, f, _, _) = matrices.dim();
    check_shape("solve targets", &[b, c, t, f, n], targets.shape())?;

    let bins = num_bins(matrices.shape(), 4);
    let flat_matrices = flatten("solve matrices", matrices, (bins, n, n))?;
    let flat_targets = flatten("solve targets", targets, (bins, n))?;
    let mut out = Array2::<Complex32>::zeros((bins, n));

    let mut lu = LuScratch::new(n);
    let mut ill_conditioned = 0;
    let mut singular = 0;
    for ((matrix, target), mut x) in flat_matrices
        .outer_iter()
        .zip(flat_targets.outer_iter())
        .zip(out.outer_iter_mut())
    {
        match lu.factor(matrix, reg) {
            Conditioning::Singular => {
                singular += 1;
                x.fill(Complex32::new(f32::NAN, f32::NAN));
                continue;
            }
            Conditioning::IllConditioned => ill_conditioned += 1,
            Conditioning::WellConditioned => {}
        }
        lu.solve_into(target, x);
    }
    tracing::trace!(bins, n, ill_conditioned, singular, "batched solve");

    Ok(Solution {
        value: reshape("solution", out, (b, c, t, f, n))?,
        ill_conditioned,
        singular,
    })
}

/// Inverts `regularize(A)` for every bin of a `[B, C, T, F, N, N]` batch.
pub fn invert<S>(
    matrices: &ArrayBase<S, Ix6>,
    reg: Regularization,
) -> Result<Solution<Array6<Complex32>>>
where
    S: Data<Elem = Complex32>,
{
    let n = square_size("inverted matrices", matrices)?;
    let (b, c, t, f, _, _) = matrices.dim();
    let bins = num_bins(matrices.shape(), 4);
    let flat = flatten("inverted matrices", matrices, (bins, n, n))?;
    let mut out = Array3::<Complex32>::zeros((bins, n, n));

    let mut lu = LuScratch::new(n);
    let mut unit = Array1::<Complex32>::zeros(n);
    let mut ill_conditioned = 0;
    let mut singular = 0;
    for (matrix, mut inverse) in flat.outer_iter().zip(out.outer_iter_mut()) {
        match lu.factor(matrix, reg) {
            Conditioning::Singular => {
                singular += 1;
                inverse.fill(Complex32::new(f32::NAN, f32::NAN));
                continue;
            }
            Conditioning::IllConditioned => ill_conditioned += 1,
            Conditioning::WellConditioned => {}
        }
        for col in 0..n {
            unit.fill(Complex32::new(0.0, 0.0));
            unit[col] = Complex32::new(1.0, 0.0);
            lu.solve_into(unit.view(), inverse.column_mut(col));
        }
    }
    tracing::trace!(bins, n, ill_conditioned, singular, "batched inverse");

    Ok(Solution {
        value: reshape("inverse", out, (b, c, t, f, n, n))?,
        ill_conditioned,
        singular,
    })
}

/// Per-bin matrix-vector product `y[n] = sum_m A[n, m] x[m]`.
pub(crate) fn mat_vec<S, T>(
    matrices: &ArrayBase<S, Ix6>,
    vectors: &ArrayBase<T, Ix5>,
) -> Result<Array5<Complex32>>
where
    S: Data<Elem = Complex32>,
    T: Data<Elem = Complex32>,
{
    let n = square_size("matrices", matrices)?;
    let (b, c, t, f, _, _) = matrices.dim();
    check_shape("vectors", &[b, c, t, f, n], vectors.shape())?;
    let bins = num_bins(matrices.shape(), 4);
    let flat_matrices = flatten("matrices", matrices, (bins, n, n))?;
    let flat_vectors = flatten("vectors", vectors, (bins, n))?;
    let mut out = Array2::<Complex32>::zeros((bins, n));
    for ((mut y, x), a) in out
        .outer_iter_mut()
        .zip(flat_vectors.outer_iter())
        .zip(flat_matrices.outer_iter())
    {
        for (y, row) in y.iter_mut().zip(a.outer_iter()) {
            *y = row.iter().zip(x.iter()).map(|(a, x)| a * x).sum();
        }
    }
    reshape("matrix-vector product", out, (b, c, t, f, n))
}

fn diagonal_shift(matrix: ArrayView2<'_, Complex32>, reg: Regularization) -> Complex32 {
    let trace: f32 = matrix.diag().iter().map(|z| z.re).sum();
    Complex32::new(trace * reg.diag_eps + reg.eps, 0.0)
}

fn square_size<S>(what: &'static str, matrices: &ArrayBase<S, Ix6>) -> Result<usize>
where
    S: Data<Elem = Complex32>,
{
    let shape = matrices.shape();
    let n = shape[4];
    check_shape(what, &[shape[0], shape[1], shape[2], shape[3], n, n], shape)?;
    Ok(n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conditioning {
    WellConditioned,
    IllConditioned,
    Singular,
}

/// In-place LU factorization `P A = L U` of one regularized `N x N` system.
///
/// `L` (unit diagonal, not stored) and `U` share the row-major buffer.
#[derive(Debug)]
struct LuScratch {
    n: usize,
    lu: Vec<Complex32>,
    perm: Vec<usize>,
}

impl LuScratch {
    fn new(n: usize) -> Self {
        Self {
            n,
            lu: vec![Complex32::new(0.0, 0.0); n * n],
            perm: (0..n).collect(),
        }
    }

    fn factor(&mut self, matrix: ArrayView2<'_, Complex32>, reg: Regularization) -> Conditioning {
        let n = self.n;
        let shift = diagonal_shift(matrix, reg);
        for ((i, j), &value) in matrix.indexed_iter() {
            self.lu[i * n + j] = if i == j { value + shift } else { value };
        }
        for (i, p) in self.perm.iter_mut().enumerate() {
            *p = i;
        }

        let a = &mut self.lu;
        let mut min_pivot = f32::INFINITY;
        let mut max_pivot = 0.0f32;
        for k in 0..n {
            let mut pivot_row = k;
            let mut best = a[k * n + k].norm();
            for i in k + 1..n {
                let magnitude = a[i * n + k].norm();
                if magnitude > best {
                    best = magnitude;
                    pivot_row = i;
                }
            }
            if !best.is_finite() || best == 0.0 {
                return Conditioning::Singular;
            }
            if pivot_row != k {
                for j in 0..n {
                    a.swap(k * n + j, pivot_row * n + j);
                }
                self.perm.swap(k, pivot_row);
            }
            min_pivot = min_pivot.min(best);
            max_pivot = max_pivot.max(best);

            let pivot = a[k * n + k];
            for i in k + 1..n {
                let factor = a[i * n + k] / pivot;
                a[i * n + k] = factor;
                for j in k + 1..n {
                    let upper = a[k * n + j];
                    a[i * n + j] -= factor * upper;
                }
            }
        }
        if n > 0 && min_pivot < max_pivot * ILL_CONDITIONED_PIVOT_RATIO {
            Conditioning::IllConditioned
        } else {
            Conditioning::WellConditioned
        }
    }

    /// Solves with the last factorization. `x` must not alias `rhs`.
    fn solve_into(&self, rhs: ArrayView1<'_, Complex32>, mut x: ArrayViewMut1<'_, Complex32>) {
        let n = self.n;
        let a = &self.lu;
        // L y = P b
        for i in 0..n {
            let mut acc = rhs[self.perm[i]];
            for j in 0..i {
                acc -= a[i * n + j] * x[j];
            }
            x[i] = acc;
        }
        // U x = y
        for i in (0..n).rev() {
            let mut acc = x[i];
            for j in i + 1..n {
                acc -= a[i * n + j] * x[j];
            }
            x[i] = acc / a[i * n + i];
        }
    }
}
