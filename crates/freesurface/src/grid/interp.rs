//! Bilinear interpolation on regular sub-grids.
//!
//! Each staggered component lives on its own regular grid (cell centers,
//! x-faces, y-faces). Queries outside a grid extrapolate linearly from the
//! nearest boundary cell instead of failing: departure points beyond the
//! free surface are routine.

use glam::DVec2;

use crate::field::StaggeredField;

/// Placement of a regular sub-grid in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridAxes {
    /// World position of sample `(0, 0)`.
    pub origin: DVec2,
    /// Distance between neighbouring samples.
    pub spacing: f64,
    pub rows: usize,
    pub cols: usize,
}

impl GridAxes {
    /// Cell centers: sample `(i, j)` at `(j·h, i·h)`.
    pub fn cell_centers(rows: usize, cols: usize, cell_size: f64) -> Self {
        Self {
            origin: DVec2::ZERO,
            spacing: cell_size,
            rows,
            cols,
        }
    }

    /// X-faces: sample `(i, j)` at `((j - ½)·h, i·h)`, shape `(rows, cols + 1)`.
    pub fn x_faces(rows: usize, cols: usize, cell_size: f64) -> Self {
        Self {
            origin: DVec2::new(-0.5 * cell_size, 0.0),
            spacing: cell_size,
            rows,
            cols: cols + 1,
        }
    }

    /// Y-faces: sample `(i, j)` at `(j·h, (i - ½)·h)`, shape `(rows + 1, cols)`.
    pub fn y_faces(rows: usize, cols: usize, cell_size: f64) -> Self {
        Self {
            origin: DVec2::new(0.0, -0.5 * cell_size),
            spacing: cell_size,
            rows: rows + 1,
            cols,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World position of sample `(i, j)`.
    #[inline]
    pub fn position(&self, i: usize, j: usize) -> DVec2 {
        self.origin + DVec2::new(j as f64, i as f64) * self.spacing
    }
}

/// Split a continuous grid coordinate into a base index and a fraction.
/// The base is clamped so `base + 1` is valid; the fraction is not clamped,
/// which turns the lerp into a linear extrapolation outside the grid.
#[inline]
fn axis_weight(coord: f64, len: usize) -> (usize, usize, f64) {
    if len < 2 {
        return (0, 0, 0.0);
    }
    let base = (coord.floor() as i64).clamp(0, len as i64 - 2) as usize;
    (base, base + 1, coord - base as f64)
}

/// Bilinear interpolator over a flat row-major array.
#[derive(Clone, Copy, Debug)]
pub struct GridInterpolator<'a> {
    values: &'a [f64],
    axes: GridAxes,
}

impl<'a> GridInterpolator<'a> {
    pub fn new(values: &'a [f64], axes: GridAxes) -> Self {
        assert_eq!(
            values.len(),
            axes.len(),
            "interpolator expects {}x{} samples",
            axes.rows,
            axes.cols
        );
        Self { values, axes }
    }

    /// Value at an arbitrary world position.
    pub fn sample(&self, pos: DVec2) -> f64 {
        let local = (pos - self.axes.origin) / self.axes.spacing;
        let (j0, j1, tx) = axis_weight(local.x, self.axes.cols);
        let (i0, i1, ty) = axis_weight(local.y, self.axes.rows);

        let cols = self.axes.cols;
        let v00 = self.values[i0 * cols + j0];
        let v01 = self.values[i0 * cols + j1];
        let v10 = self.values[i1 * cols + j0];
        let v11 = self.values[i1 * cols + j1];

        let top = v00 + (v01 - v00) * tx;
        let bottom = v10 + (v11 - v10) * tx;
        top + (bottom - top) * ty
    }
}

/// Samples the full velocity vector of a staggered field.
#[derive(Clone, Copy, Debug)]
pub struct VelocitySampler<'a> {
    pub x: GridInterpolator<'a>,
    pub y: GridInterpolator<'a>,
}

impl<'a> VelocitySampler<'a> {
    pub fn new(velocity: &'a StaggeredField, cell_size: f64) -> Self {
        let (rows, cols) = (velocity.rows(), velocity.cols());
        Self {
            x: GridInterpolator::new(velocity.x(), GridAxes::x_faces(rows, cols, cell_size)),
            y: GridInterpolator::new(velocity.y(), GridAxes::y_faces(rows, cols, cell_size)),
        }
    }

    #[inline]
    pub fn sample(&self, pos: DVec2) -> DVec2 {
        DVec2::new(self.x.sample(pos), self.y.sample(pos))
    }
}
