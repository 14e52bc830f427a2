//! Dense vector kernels used by the iterative solver.
//!
//! All functions expect slices of equal length; mismatches are caught by
//! `debug_assert!` only, as these run in the inner solver loop.

/// Inner product `x · y`.
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Euclidean norm.
#[inline]
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// Largest absolute entry.
#[inline]
pub fn norm_inf(x: &[f64]) -> f64 {
    x.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}

/// `y += alpha * x`
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// `out = b - a`
#[inline]
pub fn residual(b: &[f64], a: &[f64], out: &mut [f64]) {
    debug_assert_eq!(b.len(), a.len());
    debug_assert_eq!(b.len(), out.len());
    for ((o, bi), ai) in out.iter_mut().zip(b).zip(a) {
        *o = bi - ai;
    }
}
