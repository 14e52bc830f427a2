//! Face classification derived from the cell types.
//!
//! A face on the outer edge of the grid has a cell on one side only; the
//! missing side is treated as neither water, air nor solid.

use super::CellType;
use crate::field::StaggeredMask;

/// Boundary masks for both staggered directions.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceMasks {
    /// Faces with water on at least one side.
    pub water_boundary: StaggeredMask,
    /// Faces with water on both sides.
    pub water_water: StaggeredMask,
    /// Faces between a water cell and a solid cell.
    pub water_solid: StaggeredMask,
    /// `water_boundary` minus `water_solid`: faces whose velocity is free.
    pub water_water_or_air: StaggeredMask,
}

impl FaceMasks {
    pub(crate) fn derive(rows: usize, cols: usize, cells: &[CellType]) -> Self {
        let cell = |i: usize, j: usize| cells[i * cols + j];

        let mut water_boundary = StaggeredMask::filled(rows, cols, false);
        let mut water_water = StaggeredMask::filled(rows, cols, false);
        let mut water_solid = StaggeredMask::filled(rows, cols, false);

        // X faces: (i, j) sits between cell (i, j-1) and cell (i, j)
        for i in 0..rows {
            for j in 0..=cols {
                let left = (j > 0).then(|| cell(i, j - 1));
                let right = (j < cols).then(|| cell(i, j));
                let idx = water_boundary.x_index(i, j);
                let (wb, ww, ws) = classify(left, right);
                water_boundary.x_mut()[idx] = wb;
                water_water.x_mut()[idx] = ww;
                water_solid.x_mut()[idx] = ws;
            }
        }

        // Y faces: (i, j) sits between cell (i-1, j) and cell (i, j)
        for i in 0..=rows {
            for j in 0..cols {
                let up = (i > 0).then(|| cell(i - 1, j));
                let down = (i < rows).then(|| cell(i, j));
                let idx = water_boundary.y_index(i, j);
                let (wb, ww, ws) = classify(up, down);
                water_boundary.y_mut()[idx] = wb;
                water_water.y_mut()[idx] = ww;
                water_solid.y_mut()[idx] = ws;
            }
        }

        let water_water_or_air = water_boundary.zip_with(&water_solid, |&wb, &ws| wb && !ws);

        Self {
            water_boundary,
            water_water,
            water_solid,
            water_water_or_air,
        }
    }
}

/// Returns (water_boundary, water_water, water_solid) for one face.
#[inline]
fn classify(a: Option<CellType>, b: Option<CellType>) -> (bool, bool, bool) {
    let water = |c: Option<CellType>| c == Some(CellType::Water);
    let solid = |c: Option<CellType>| c == Some(CellType::Solid);

    let boundary = water(a) || water(b);
    let both = water(a) && water(b);
    let against_solid = (water(a) && solid(b)) || (solid(a) && water(b));
    (boundary, both, against_solid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cell_types::parse_layout;

    fn masks(layout: &[&str]) -> FaceMasks {
        let (n, m, cells) = parse_layout(layout).unwrap();
        FaceMasks::derive(n, m, &cells)
    }

    #[test]
    fn test_single_water_cell_under_air() {
        let f = masks(&["#.#", "#~#", "###"]);
        let u = &f.water_boundary;

        // Left and right faces of the water cell touch solid.
        assert!(f.water_solid.x()[u.x_index(1, 1)]);
        assert!(f.water_solid.x()[u.x_index(1, 2)]);
        // Top face touches air: free.
        assert!(f.water_water_or_air.y()[u.y_index(1, 1)]);
        assert!(!f.water_solid.y()[u.y_index(1, 1)]);
        // Bottom face touches solid.
        assert!(f.water_solid.y()[u.y_index(2, 1)]);
        // No water-water faces at all.
        assert_eq!(f.water_water.count(), 0);
        assert_eq!(f.water_boundary.count(), 4);
        assert_eq!(f.water_water_or_air.count(), 1);
    }

    #[test]
    fn test_water_water_faces() {
        let f = masks(&["#..#", "#~~#", "####"]);
        let idx = f.water_water.x_index(1, 2);
        assert!(f.water_water.x()[idx]);
        assert!(f.water_water_or_air.x()[idx]);
        assert_eq!(f.water_water.count(), 1);
    }

    #[test]
    fn test_free_faces_are_boundary_minus_solid() {
        let f = masks(&["#......#", "#~~~~~~#", "##~~~~##", "########"]);
        let expected = f.water_boundary.zip_with(&f.water_solid, |&a, &b| a && !b);
        assert_eq!(f.water_water_or_air, expected);
        // Water-water faces are always free.
        let ww_not_free = f
            .water_water
            .zip_with(&f.water_water_or_air, |&ww, &free| ww && !free)
            .count();
        assert_eq!(ww_not_free, 0);
    }
}
