//! Material mask of the simulation domain.
//!
//! The domain is an `n x m` grid of cells, each exactly one of solid, water
//! or air. The classification is fixed for the lifetime of a simulation; the
//! face masks and neighbour counts derived from it are computed once here.

pub mod cell_types;
mod faces;
pub mod interp;

pub use cell_types::{CellType, DomainLayout};
pub use faces::FaceMasks;
pub use interp::{GridAxes, GridInterpolator, VelocitySampler};

use glam::DVec2;

use crate::error::DomainError;

/// Smallest grid that can hold an interior cell.
const MIN_SIZE: usize = 3;

/// Fixed material mask plus everything derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    rows: usize,
    cols: usize,
    cell_size: f64,
    cell_type: Vec<CellType>,
    faces: FaceMasks,
    /// Water neighbours per cell (4-connectivity).
    water_neighbors: Vec<u8>,
    /// Water or air neighbours per cell.
    water_or_air_neighbors: Vec<u8>,
    /// Water cells in row-major order.
    water_cells: Vec<(usize, usize)>,
}

impl Domain {
    /// Build a domain from a layout. For [`DomainLayout::Custom`] the grid
    /// size comes from the layout and `rows`/`cols` must agree with it.
    pub fn new(rows: usize, cols: usize, cell_size: f64, layout: &DomainLayout) -> Result<Self, DomainError> {
        match layout {
            DomainLayout::Wedge => {
                check_size(rows, cols)?;
                Self::from_cell_types(rows, cols, cell_size, cell_types::wedge_cells(rows, cols))
            }
            DomainLayout::Custom { rows: lines } => {
                let (n, m, cells) = cell_types::parse_layout(lines)?;
                if n != rows {
                    return Err(DomainError::WrongLength {
                        what: "layout rows",
                        expected: rows,
                        found: n,
                    });
                }
                if m != cols {
                    return Err(DomainError::WrongLength {
                        what: "layout columns",
                        expected: cols,
                        found: m,
                    });
                }
                Self::from_cell_types(n, m, cell_size, cells)
            }
        }
    }

    /// Build from a custom character layout, taking the grid size from it.
    pub fn from_layout<S: AsRef<str>>(lines: &[S], cell_size: f64) -> Result<Self, DomainError> {
        let (n, m, cells) = cell_types::parse_layout(lines)?;
        Self::from_cell_types(n, m, cell_size, cells)
    }

    /// Build from three 0/1 grids that must partition the cells.
    pub fn from_masks(
        rows: usize,
        cols: usize,
        cell_size: f64,
        solid: &[u8],
        water: &[u8],
        air: &[u8],
    ) -> Result<Self, DomainError> {
        check_size(rows, cols)?;
        for (what, mask) in [("solid mask", solid), ("water mask", water), ("air mask", air)] {
            if mask.len() != rows * cols {
                return Err(DomainError::WrongLength {
                    what,
                    expected: rows * cols,
                    found: mask.len(),
                });
            }
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for k in 0..rows * cols {
            let cell = match (solid[k], water[k], air[k]) {
                (1, 0, 0) => CellType::Solid,
                (0, 1, 0) => CellType::Water,
                (0, 0, 1) => CellType::Air,
                (s, w, a) => {
                    return Err(DomainError::NotAPartition {
                        row: k / cols,
                        col: k % cols,
                        solid: s,
                        water: w,
                        air: a,
                    })
                }
            };
            cells.push(cell);
        }
        Self::from_cell_types(rows, cols, cell_size, cells)
    }

    /// Build from explicit cell types (row-major) and validate.
    pub fn from_cell_types(
        rows: usize,
        cols: usize,
        cell_size: f64,
        cell_type: Vec<CellType>,
    ) -> Result<Self, DomainError> {
        check_size(rows, cols)?;
        if cell_type.len() != rows * cols {
            return Err(DomainError::WrongLength {
                what: "cell types",
                expected: rows * cols,
                found: cell_type.len(),
            });
        }

        let at = |i: usize, j: usize| cell_type[i * cols + j];
        let mut water_neighbors = vec![0u8; rows * cols];
        let mut water_or_air_neighbors = vec![0u8; rows * cols];
        let mut water_cells = Vec::new();

        for i in 0..rows {
            for j in 0..cols {
                let k = i * cols + j;
                for (ni, nj) in neighbors(i, j, rows, cols) {
                    match at(ni, nj) {
                        CellType::Water => {
                            water_neighbors[k] += 1;
                            water_or_air_neighbors[k] += 1;
                        }
                        CellType::Air => water_or_air_neighbors[k] += 1,
                        CellType::Solid => {}
                    }
                }

                if at(i, j) != CellType::Water {
                    continue;
                }
                if i == 0 || j == 0 || i + 1 == rows || j + 1 == cols {
                    return Err(DomainError::WaterOnBorder { row: i, col: j });
                }
                if water_or_air_neighbors[k] == 0 {
                    return Err(DomainError::IsolatedWater { row: i, col: j });
                }
                water_cells.push((i, j));
            }
        }

        if water_cells.is_empty() {
            return Err(DomainError::NoWater);
        }
        if let Some((row, col)) = first_sealed_water(rows, cols, &cell_type) {
            return Err(DomainError::SealedWater { row, col });
        }

        let faces = FaceMasks::derive(rows, cols, &cell_type);

        Ok(Self {
            rows,
            cols,
            cell_size,
            cell_type,
            faces,
            water_neighbors,
            water_or_air_neighbors,
            water_cells,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn cell_index(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    #[inline]
    pub fn cell_type(&self, i: usize, j: usize) -> CellType {
        self.cell_type[self.cell_index(i, j)]
    }

    pub fn cell_types(&self) -> &[CellType] {
        &self.cell_type
    }

    #[inline]
    pub fn is_water(&self, i: usize, j: usize) -> bool {
        self.cell_type(i, j) == CellType::Water
    }

    #[inline]
    pub fn is_solid(&self, i: usize, j: usize) -> bool {
        self.cell_type(i, j) == CellType::Solid
    }

    #[inline]
    pub fn is_air(&self, i: usize, j: usize) -> bool {
        self.cell_type(i, j) == CellType::Air
    }

    /// 0/1 grid of solid cells.
    pub fn solid_mask(&self) -> Vec<u8> {
        self.mask_of(CellType::Solid)
    }

    /// 0/1 grid of water cells.
    pub fn water_mask(&self) -> Vec<u8> {
        self.mask_of(CellType::Water)
    }

    /// 0/1 grid of air cells.
    pub fn air_mask(&self) -> Vec<u8> {
        self.mask_of(CellType::Air)
    }

    fn mask_of(&self, kind: CellType) -> Vec<u8> {
        self.cell_type.iter().map(|&c| u8::from(c == kind)).collect()
    }

    #[inline]
    pub fn faces(&self) -> &FaceMasks {
        &self.faces
    }

    #[inline]
    pub fn water_neighbors(&self, i: usize, j: usize) -> u8 {
        self.water_neighbors[self.cell_index(i, j)]
    }

    #[inline]
    pub fn water_or_air_neighbors(&self, i: usize, j: usize) -> u8 {
        self.water_or_air_neighbors[self.cell_index(i, j)]
    }

    /// Water cells in row-major order. This is also the unknown ordering of
    /// the pressure system and the initial particle ordering.
    #[inline]
    pub fn water_cells(&self) -> &[(usize, usize)] {
        &self.water_cells
    }

    #[inline]
    pub fn water_count(&self) -> usize {
        self.water_cells.len()
    }

    /// World position of the center of cell `(i, j)`.
    #[inline]
    pub fn cell_center(&self, i: usize, j: usize) -> DVec2 {
        DVec2::new(j as f64, i as f64) * self.cell_size
    }

    /// Cell containing a world position, if inside the grid.
    pub fn cell_at(&self, pos: DVec2) -> Option<(usize, usize)> {
        let local = pos / self.cell_size + DVec2::splat(0.5);
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let (i, j) = (local.y as usize, local.x as usize);
        (i < self.rows && j < self.cols).then_some((i, j))
    }

    pub fn cell_axes(&self) -> GridAxes {
        GridAxes::cell_centers(self.rows, self.cols, self.cell_size)
    }

    pub fn x_face_axes(&self) -> GridAxes {
        GridAxes::x_faces(self.rows, self.cols, self.cell_size)
    }

    pub fn y_face_axes(&self) -> GridAxes {
        GridAxes::y_faces(self.rows, self.cols, self.cell_size)
    }

    /// One line per row using the layout characters.
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in self.cell_type.chunks(self.cols) {
            out.extend(row.iter().map(|c| c.as_char()));
            out.push('\n');
        }
        out
    }
}

fn check_size(rows: usize, cols: usize) -> Result<(), DomainError> {
    if rows < MIN_SIZE || cols < MIN_SIZE {
        return Err(DomainError::TooSmall { rows, cols });
    }
    Ok(())
}

/// In-grid 4-neighbours of `(i, j)`.
fn neighbors(i: usize, j: usize, rows: usize, cols: usize) -> impl Iterator<Item = (usize, usize)> {
    [
        (i > 0).then(|| (i - 1, j)),
        (i + 1 < rows).then(|| (i + 1, j)),
        (j > 0).then(|| (i, j - 1)),
        (j + 1 < cols).then(|| (i, j + 1)),
    ]
    .into_iter()
    .flatten()
}

/// First water cell (row-major) that cannot reach air through water.
fn first_sealed_water(rows: usize, cols: usize, cells: &[CellType]) -> Option<(usize, usize)> {
    let at = |i: usize, j: usize| cells[i * cols + j];
    let mut reached = vec![false; rows * cols];
    let mut stack = Vec::new();

    for i in 0..rows {
        for j in 0..cols {
            if at(i, j) == CellType::Water && neighbors(i, j, rows, cols).any(|(ni, nj)| at(ni, nj) == CellType::Air) {
                reached[i * cols + j] = true;
                stack.push((i, j));
            }
        }
    }

    while let Some((i, j)) = stack.pop() {
        for (ni, nj) in neighbors(i, j, rows, cols) {
            let k = ni * cols + nj;
            if at(ni, nj) == CellType::Water && !reached[k] {
                reached[k] = true;
                stack.push((ni, nj));
            }
        }
    }

    (0..rows * cols)
        .find(|&k| cells[k] == CellType::Water && !reached[k])
        .map(|k| (k / cols, k % cols))
}
