//! Element-wise comparison of filter outputs with a summary report.

use std::fmt;

use num_complex::Complex32;

/// Outcome of comparing two equally shaped outputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonResult {
    /// Number of compared elements (the longer of both inputs).
    pub total: usize,
    /// Elements that differ by more than the tolerance, including elements
    /// present in only one input.
    pub mismatches: usize,
    /// Largest absolute difference seen, infinite if a NaN met a number.
    pub max_abs_diff: f32,
    /// Index of the first mismatch.
    pub first_mismatch: Option<usize>,
}

impl ComparisonResult {
    fn new() -> Self {
        Self {
            total: 0,
            mismatches: 0,
            max_abs_diff: 0.0,
            first_mismatch: None,
        }
    }

    fn record(&mut self, index: usize, diff: Option<f32>, tolerance: f32) {
        self.total += 1;
        let diff = diff.unwrap_or(0.0);
        let diff = if diff.is_nan() { f32::INFINITY } else { diff };
        self.max_abs_diff = self.max_abs_diff.max(diff);
        if diff > tolerance {
            self.mismatches += 1;
            self.first_mismatch.get_or_insert(index);
        }
    }

    fn record_missing(&mut self, index: usize) {
        self.total += 1;
        self.mismatches += 1;
        self.max_abs_diff = f32::INFINITY;
        self.first_mismatch.get_or_insert(index);
    }

    /// Whether every element matched.
    pub fn is_match(&self) -> bool {
        self.mismatches == 0
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} mismatches, max_abs_diff={:.3e}",
            self.mismatches, self.total, self.max_abs_diff
        )?;
        if let Some(index) = self.first_mismatch {
            write!(f, ", first at {index}")?;
        }
        Ok(())
    }
}

/// Absolute difference, `None` when both values are the same non-finite
/// value (two NaNs, or equal infinities).
fn abs_diff(a: f32, b: f32) -> Option<f32> {
    if (a.is_nan() && b.is_nan()) || (a.is_infinite() && a == b) {
        None
    } else {
        Some((a - b).abs())
    }
}

/// Compares two `f32` sequences.
pub fn compare_f32(a: &[f32], b: &[f32], tolerance: f32) -> ComparisonResult {
    let mut result = ComparisonResult::new();
    for index in 0..a.len().max(b.len()) {
        match (a.get(index), b.get(index)) {
            (Some(&x), Some(&y)) => result.record(index, abs_diff(x, y), tolerance),
            _ => result.record_missing(index),
        }
    }
    result
}

/// Compares two complex sequences by the magnitude of their difference.
///
/// Works with any iterator over elements, such as `array.iter()` of an
/// `ndarray` array in logical order.
pub fn compare_complex<'a, A, B>(a: A, b: B, tolerance: f32) -> ComparisonResult
where
    A: IntoIterator<Item = &'a Complex32>,
    B: IntoIterator<Item = &'a Complex32>,
{
    let mut result = ComparisonResult::new();
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    let mut index = 0;
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) => {
                let diff = match (abs_diff(x.re, y.re), abs_diff(x.im, y.im)) {
                    (None, None) => None,
                    (re, im) => Some(re.unwrap_or(0.0).hypot(im.unwrap_or(0.0))),
                };
                result.record(index, diff, tolerance);
            }
            (None, None) => break,
            _ => result.record_missing(index),
        }
        index += 1;
    }
    result
}
