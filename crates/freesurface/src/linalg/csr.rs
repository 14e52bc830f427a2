//! Compressed sparse row matrices.
//!
//! Matrices are assembled from a triplet list with [`CsrBuilder`] and are
//! immutable in structure afterwards. Column indices inside each row are
//! sorted, so entry lookup is a binary search.

use rayon::prelude::*;

/// Rows above which `mul_vec` splits work across the rayon pool.
const PARALLEL_ROWS: usize = 4096;

// =============================================================================
// Builder
// =============================================================================

/// Triplet accumulator. Duplicate `(row, col)` entries are summed.
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    n_rows: usize,
    n_cols: usize,
    triplets: Vec<(usize, usize, f64)>,
}

impl CsrBuilder {
    /// Builder for an `n x n` matrix.
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            triplets: Vec::new(),
        }
    }

    /// Reserve room for `nnz` more entries.
    pub fn with_capacity(mut self, nnz: usize) -> Self {
        self.triplets.reserve(nnz);
        self
    }

    /// Add `value` at `(row, col)`.
    #[inline]
    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.n_rows, "row {row} out of range");
        debug_assert!(col < self.n_cols, "col {col} out of range");
        self.triplets.push((row, col, value));
    }

    pub fn build(mut self) -> CsrMatrix {
        self.triplets.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut row_ptr = vec![0usize; self.n_rows + 1];
        let mut col_idx = Vec::with_capacity(self.triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(self.triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in self.triplets {
            if last == Some((r, c)) {
                if let Some(acc) = values.last_mut() {
                    *acc += v;
                }
                continue;
            }
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            last = Some((r, c));
        }
        for r in 0..self.n_rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        CsrMatrix {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }
}

// =============================================================================
// Matrix
// =============================================================================

/// Sparse matrix in CSR layout.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    pub fn identity(n: usize) -> Self {
        let mut b = CsrBuilder::new_square(n).with_capacity(n);
        for i in 0..n {
            b.push(i, i, 1.0);
        }
        b.build()
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.n_rows == self.n_cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Storage position of `(row, col)`, if present.
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let (start, end) = (self.row_ptr[row], self.row_ptr[row + 1]);
        self.col_idx[start..end]
            .binary_search(&col)
            .ok()
            .map(|k| start + k)
    }

    /// Entry at `(row, col)`; zero when not stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.find_index(row, col).map_or(0.0, |k| self.values[k])
    }

    /// Stored `(col, value)` pairs of one row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (start, end) = (self.row_ptr[row], self.row_ptr[row + 1]);
        self.col_idx[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// Main diagonal (zero where absent).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.n_rows.min(self.n_cols)).map(|i| self.get(i, i)).collect()
    }

    /// Multiply every stored value by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        let (start, end) = (self.row_ptr[row], self.row_ptr[row + 1]);
        self.col_idx[start..end]
            .iter()
            .zip(&self.values[start..end])
            .map(|(&c, &v)| v * x[c])
            .sum()
    }

    /// `y = A x`
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols, "mul_vec: x has wrong length");
        assert_eq!(y.len(), self.n_rows, "mul_vec: y has wrong length");

        if self.n_rows >= PARALLEL_ROWS {
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = self.row_dot(i, x));
        } else {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = self.row_dot(i, x);
            }
        }
    }

    /// True if `A == Aᵀ` up to `tol`.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        self.is_square()
            && (0..self.n_rows).all(|i| self.row(i).all(|(j, v)| (v - self.get(j, i)).abs() <= tol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laplacian_1d(n: usize) -> CsrMatrix {
        let mut b = CsrBuilder::new_square(n);
        for i in 0..n {
            b.push(i, i, 2.0);
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
    fn test_builder_sorts_and_sums_duplicates() {
        let mut b = CsrBuilder::new_square(2);
        b.push(1, 1, 1.0);
        b.push(0, 1, -1.0);
        b.push(0, 0, 2.0);
        b.push(1, 1, 2.5);
        let a = b.build();

        assert_eq!(a.nnz(), 3);
        assert_eq!(a.row_ptr(), &[0, 2, 3]);
        assert_eq!(a.col_idx(), &[0, 1, 1]);
        assert_eq!(a.get(1, 1), 3.5);
        assert_eq!(a.get(1, 0), 0.0);
    }

    #[test]
    fn test_mul_vec() {
        let a = laplacian_1d(4);
        let mut y = vec![0.0; 4];
        a.mul_vec(&[1.0, 2.0, 3.0, 4.0], &mut y);
        assert_eq!(y, vec![0.0, 0.0, 0.0, 5.0]);
    }

    #[test]
    fn test_parallel_mul_vec_matches_serial() {
        let n = PARALLEL_ROWS + 17;
        let a = laplacian_1d(n);
        let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin()).collect();
        let mut y = vec![0.0; n];
        a.mul_vec(&x, &mut y);
        for i in [0, 1, n / 2, n - 1] {
            assert_eq!(y[i], a.row_dot(i, &x), "row {i}");
        }
    }

    #[test]
    fn test_diagonal_scale_and_symmetry() {
        let mut a = laplacian_1d(3);
        a.scale(0.5);
        assert_eq!(a.diagonal(), vec![1.0, 1.0, 1.0]);
        assert!(a.is_symmetric(0.0));
        assert_eq!(a.row(1).collect::<Vec<_>>(), vec![(0, -0.5), (1, 1.0), (2, -0.5)]);

        let mut b = CsrBuilder::new_square(2);
        b.push(0, 1, 1.0);
        assert!(!b.build().is_symmetric(1e-12));
    }

    #[test]
    fn test_identity() {
        let i = CsrMatrix::identity(3);
        let mut y = vec![0.0; 3];
        i.mul_vec(&[7.0, 8.0, 9.0], &mut y);
        assert_eq!(y, vec![7.0, 8.0, 9.0]);
    }
}
