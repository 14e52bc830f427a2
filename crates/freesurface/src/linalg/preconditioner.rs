//! Preconditioners for the Krylov solver.
//!
//! A preconditioner approximates `A⁻¹`; the solver only needs `z = M⁻¹ r`.

use thiserror::Error;

use super::csr::CsrMatrix;

/// Failures while building a preconditioner.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionerError {
    #[error("matrix is {rows}x{cols}, expected square")]
    NotSquare { rows: usize, cols: usize },

    #[error("row {row} has no stored diagonal entry")]
    MissingDiagonal { row: usize },

    #[error("zero pivot {pivot:e} in row {row} (matrix is singular or needs pivoting)")]
    ZeroPivot { row: usize, pivot: f64 },
}

/// `z = M⁻¹ r`
pub trait Preconditioner: Send + Sync {
    fn apply(&self, r: &[f64], z: &mut [f64]);

    fn name(&self) -> &'static str;
}

/// `M = I`
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }
}

/// Incomplete LU factorisation with zero fill-in.
///
/// `L` (unit lower, diagonal implied) and `U` share the sparsity pattern of
/// `A` and are stored in one value array. A pivot that vanishes relative to
/// its row is reported as an error rather than patched.
#[derive(Debug, Clone)]
pub struct Ilu0Preconditioner {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    lu: Vec<f64>,
    diag_ptr: Vec<usize>,
}

impl Ilu0Preconditioner {
    pub fn new(matrix: &CsrMatrix) -> Result<Self, PreconditionerError> {
        if !matrix.is_square() {
            return Err(PreconditionerError::NotSquare {
                rows: matrix.n_rows(),
                cols: matrix.n_cols(),
            });
        }

        let n = matrix.n_rows();
        let row_ptr = matrix.row_ptr().to_vec();
        let col_idx = matrix.col_idx().to_vec();
        let mut lu = matrix.values().to_vec();

        let diag_ptr = (0..n)
            .map(|i| matrix.find_index(i, i).ok_or(PreconditionerError::MissingDiagonal { row: i }))
            .collect::<Result<Vec<_>, _>>()?;

        let row_scale: Vec<f64> = (0..n)
            .map(|i| matrix.row(i).fold(0.0f64, |acc, (_, v)| acc.max(v.abs())))
            .collect();

        for i in 0..n {
            let (start, end) = (row_ptr[i], row_ptr[i + 1]);

            for k_idx in start..end {
                let k = col_idx[k_idx];
                if k >= i {
                    break;
                }
                let factor = lu[k_idx] / lu[diag_ptr[k]];
                lu[k_idx] = factor;

                // Update the rest of row i where row k has a matching column
                for j_idx in (k_idx + 1)..end {
                    let j = col_idx[j_idx];
                    let row_k = &col_idx[diag_ptr[k]..row_ptr[k + 1]];
                    if let Ok(m) = row_k.binary_search(&j) {
                        lu[j_idx] -= factor * lu[diag_ptr[k] + m];
                    }
                }
            }

            let pivot = lu[diag_ptr[i]];
            if !pivot.is_finite() || pivot.abs() <= f64::EPSILON * row_scale[i] {
                return Err(PreconditionerError::ZeroPivot { row: i, pivot });
            }
        }

        Ok(Self {
            n,
            row_ptr,
            col_idx,
            lu,
            diag_ptr,
        })
    }

    /// Solve `L y = r` in place (unit diagonal).
    fn forward_solve(&self, z: &mut [f64]) {
        for i in 0..self.n {
            let mut sum = z[i];
            for idx in self.row_ptr[i]..self.diag_ptr[i] {
                sum -= self.lu[idx] * z[self.col_idx[idx]];
            }
            z[i] = sum;
        }
    }

    /// Solve `U z = y` in place.
    fn backward_solve(&self, z: &mut [f64]) {
        for i in (0..self.n).rev() {
            let mut sum = z[i];
            for idx in (self.diag_ptr[i] + 1)..self.row_ptr[i + 1] {
                sum -= self.lu[idx] * z[self.col_idx[idx]];
            }
            z[i] = sum / self.lu[self.diag_ptr[i]];
        }
    }
}

impl Preconditioner for Ilu0Preconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
        self.forward_solve(z);
        self.backward_solve(z);
    }

    fn name(&self) -> &'static str {
        "ILU(0)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::csr::CsrBuilder;

    fn tridiagonal(n: usize) -> CsrMatrix {
        let mut b = CsrBuilder::new_square(n);
        for i in 0..n {
            b.push(i, i, 4.0);
            if i > 0 {
                b.push(i, i - 1, -1.0);
            }
            if i + 1 < n {
                b.push(i, i + 1, -1.0);
            }
        }
        b.build()
    }

    #[test]
    fn test_ilu0_is_exact_for_tridiagonal() {
        // No fill-in for a tridiagonal matrix, so ILU(0) is the full LU.
        let a = tridiagonal(6);
        let ilu = Ilu0Preconditioner::new(&a).unwrap();

        let x = [1.0, -2.0, 0.5, 3.0, 0.0, 1.5];
        let mut b = vec![0.0; 6];
        a.mul_vec(&x, &mut b);

        let mut z = vec![0.0; 6];
        ilu.apply(&b, &mut z);
        for i in 0..6 {
            assert!((z[i] - x[i]).abs() < 1e-12, "entry {i}: {} vs {}", z[i], x[i]);
        }
    }

    #[test]
    fn test_singular_matrix_reports_zero_pivot() {
        let mut b = CsrBuilder::new_square(2);
        b.push(0, 0, 1.0);
        b.push(0, 1, -1.0);
        b.push(1, 0, -1.0);
        b.push(1, 1, 1.0);
        let err = Ilu0Preconditioner::new(&b.build()).unwrap_err();
        assert!(matches!(err, PreconditionerError::ZeroPivot { row: 1, .. }), "{err:?}");
    }

    #[test]
    fn test_missing_diagonal_and_shape() {
        let mut b = CsrBuilder::new_square(2);
        b.push(0, 0, 1.0);
        b.push(1, 0, 1.0);
        assert_eq!(
            Ilu0Preconditioner::new(&b.build()).unwrap_err(),
            PreconditionerError::MissingDiagonal { row: 1 }
        );

        let rect = CsrBuilder::new(2, 3).build();
        assert!(matches!(
            Ilu0Preconditioner::new(&rect),
            Err(PreconditionerError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_identity_copies() {
        let mut z = vec![0.0; 3];
        IdentityPreconditioner.apply(&[1.0, 2.0, 3.0], &mut z);
        assert_eq!(z, vec![1.0, 2.0, 3.0]);
        assert_eq!(IdentityPreconditioner.name(), "Identity");
    }
}
