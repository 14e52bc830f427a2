//! Staggered (MAC) face fields and cell-centered scalar fields.
//!
//! Layout for a grid of `rows x cols` cells:
//! - `x`: horizontal velocity on vertical faces, shape `(rows, cols + 1)`.
//!   Face `(i, j)` separates cells `(i, j-1)` and `(i, j)`.
//! - `y`: vertical velocity on horizontal faces, shape `(rows + 1, cols)`.
//!   Face `(i, j)` separates cells `(i-1, j)` and `(i, j)`.
//!
//! Both arrays are flat and row-major. Their lengths are fixed when the field
//! is created; only slices are handed out so the shape cannot drift.

use std::ops::{Add, Mul};

use crate::error::{SimError, SimResult};

/// A pair of face arrays on a staggered grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Staggered<T> {
    rows: usize,
    cols: usize,
    x: Vec<T>,
    y: Vec<T>,
}

/// Velocity on faces.
pub type StaggeredField = Staggered<f64>;

/// Boolean selection of faces.
pub type StaggeredMask = Staggered<bool>;

impl<T: Clone> Staggered<T> {
    /// Field with every face set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            x: vec![value.clone(); rows * (cols + 1)],
            y: vec![value; (rows + 1) * cols],
        }
    }

    /// Build from raw component arrays, checking both lengths.
    pub fn from_parts(rows: usize, cols: usize, x: Vec<T>, y: Vec<T>) -> SimResult<Self> {
        if x.len() != rows * (cols + 1) {
            return Err(SimError::ShapeMismatch {
                what: "staggered x component",
                expected: (rows, cols + 1),
                found: (x.len() / (cols + 1).max(1), x.len() % (cols + 1).max(1)),
            });
        }
        if y.len() != (rows + 1) * cols {
            return Err(SimError::ShapeMismatch {
                what: "staggered y component",
                expected: (rows + 1, cols),
                found: (y.len() / cols.max(1), y.len() % cols.max(1)),
            });
        }
        Ok(Self { rows, cols, x, y })
    }

    /// Elementwise map into a new staggered array of the same shape.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Staggered<U> {
        Staggered {
            rows: self.rows,
            cols: self.cols,
            x: self.x.iter().map(&mut f).collect(),
            y: self.y.iter().map(&mut f).collect(),
        }
    }
}

impl<T> Staggered<T> {
    /// Number of cell rows of the underlying grid.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cell columns of the underlying grid.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape of the `x` component: `(rows, cols + 1)`.
    #[inline]
    pub fn x_shape(&self) -> (usize, usize) {
        (self.rows, self.cols + 1)
    }

    /// Shape of the `y` component: `(rows + 1, cols)`.
    #[inline]
    pub fn y_shape(&self) -> (usize, usize) {
        (self.rows + 1, self.cols)
    }

    /// Flat index of x-face `(i, j)`, `j in 0..=cols`.
    #[inline]
    pub fn x_index(&self, i: usize, j: usize) -> usize {
        i * (self.cols + 1) + j
    }

    /// Flat index of y-face `(i, j)`, `i in 0..=rows`.
    #[inline]
    pub fn y_index(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    #[inline]
    pub fn x(&self) -> &[T] {
        &self.x
    }

    #[inline]
    pub fn y(&self) -> &[T] {
        &self.y
    }

    #[inline]
    pub fn x_mut(&mut self) -> &mut [T] {
        &mut self.x
    }

    #[inline]
    pub fn y_mut(&mut self) -> &mut [T] {
        &mut self.y
    }

    /// Split into both components mutably (for parallel writers).
    pub fn components_mut(&mut self) -> (&mut [T], &mut [T]) {
        (&mut self.x, &mut self.y)
    }

    /// True if `other` is defined on the same grid.
    #[inline]
    pub fn same_shape<U>(&self, other: &Staggered<U>) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    fn assert_same_shape<U>(&self, other: &Staggered<U>) {
        assert!(
            self.same_shape(other),
            "staggered shape mismatch: {}x{} vs {}x{}",
            self.rows,
            self.cols,
            other.rows,
            other.cols
        );
    }

    /// Combine two arrays face by face.
    pub fn zip_with<U, V>(&self, other: &Staggered<U>, mut f: impl FnMut(&T, &U) -> V) -> Staggered<V> {
        self.assert_same_shape(other);
        Staggered {
            rows: self.rows,
            cols: self.cols,
            x: self.x.iter().zip(&other.x).map(|(a, b)| f(a, b)).collect(),
            y: self.y.iter().zip(&other.y).map(|(a, b)| f(a, b)).collect(),
        }
    }
}

impl Staggered<f64> {
    /// All-zero velocity field.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Uniform field: `value_x` on every x-face, `value_y` on every y-face.
    pub fn uniform(rows: usize, cols: usize, value_x: f64, value_y: f64) -> Self {
        Self {
            rows,
            cols,
            x: vec![value_x; rows * (cols + 1)],
            y: vec![value_y; (rows + 1) * cols],
        }
    }

    #[inline]
    pub fn x_at(&self, i: usize, j: usize) -> f64 {
        self.x[self.x_index(i, j)]
    }

    #[inline]
    pub fn y_at(&self, i: usize, j: usize) -> f64 {
        self.y[self.y_index(i, j)]
    }

    #[inline]
    pub fn set_x(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.x_index(i, j);
        self.x[idx] = value;
    }

    #[inline]
    pub fn set_y(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.y_index(i, j);
        self.y[idx] = value;
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    /// Elementwise product.
    pub fn mul(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a * b)
    }

    /// Scalar product.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Keep values on selected faces, zero elsewhere (`u * mask`).
    pub fn masked(&self, mask: &StaggeredMask) -> Self {
        self.zip_with(mask, |&v, &keep| if keep { v } else { 0.0 })
    }

    /// Largest absolute face value over both components.
    pub fn max_abs(&self) -> f64 {
        self.x
            .iter()
            .chain(&self.y)
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    pub fn is_finite(&self) -> bool {
        self.x.iter().chain(&self.y).all(|v| v.is_finite())
    }
}

impl Staggered<bool> {
    /// 1.0 on selected faces, 0.0 elsewhere.
    pub fn to_field(&self) -> StaggeredField {
        self.map(|&b| if b { 1.0 } else { 0.0 })
    }

    /// Number of selected faces in both components.
    pub fn count(&self) -> usize {
        self.x.iter().chain(&self.y).filter(|&&b| b).count()
    }
}

impl Add for &StaggeredField {
    type Output = StaggeredField;

    fn add(self, rhs: Self) -> StaggeredField {
        StaggeredField::add(self, rhs)
    }
}

impl Mul for &StaggeredField {
    type Output = StaggeredField;

    fn mul(self, rhs: Self) -> StaggeredField {
        StaggeredField::mul(self, rhs)
    }
}

impl Mul<f64> for &StaggeredField {
    type Output = StaggeredField;

    fn mul(self, rhs: f64) -> StaggeredField {
        self.scale(rhs)
    }
}

impl Mul<&StaggeredMask> for &StaggeredField {
    type Output = StaggeredField;

    fn mul(self, rhs: &StaggeredMask) -> StaggeredField {
        self.masked(rhs)
    }
}

/// Scalar field at cell centers (pressure, divergence).
#[derive(Clone, Debug, PartialEq)]
pub struct CellField {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Pressure lives at cell centers.
pub type PressureField = CellField;

impl CellField {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> SimResult<Self> {
        if data.len() != rows * cols {
            return Err(SimError::ShapeMismatch {
                what: "cell field",
                expected: (rows, cols),
                found: (data.len() / cols.max(1), data.len() % cols.max(1)),
            });
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.index(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.index(i, j);
        self.data[idx] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }
}
