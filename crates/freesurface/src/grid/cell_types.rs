//! Cell type definitions and domain layouts.
//!
//! Every cell is exactly one of solid, water or air. Layouts are pure
//! functions of their inputs so the same configuration always yields the
//! same classification.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Material of a grid cell. Fixed for the lifetime of a run.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum CellType {
    /// Obstacle; its faces carry the solid velocity.
    Solid,
    /// Holds a pressure unknown.
    Water,
    /// Free space above the surface, at zero pressure.
    Air,
}

impl CellType {
    /// Layout character: `#` solid, `~` water, `.` air.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '#' => Some(Self::Solid),
            '~' => Some(Self::Water),
            '.' => Some(Self::Air),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Solid => '#',
            Self::Water => '~',
            Self::Air => '.',
        }
    }
}

/// How the material mask is laid out.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainLayout {
    /// Container (side walls + floor) with a V-shaped wedge obstacle rising
    /// from the lower half, air along the top row, water everywhere else.
    #[default]
    Wedge,
    /// Explicit rows of `#`, `~`, `.` characters, top row first.
    Custom { rows: Vec<String> },
}

impl DomainLayout {
    /// Custom layout from string rows.
    pub fn custom<S: AsRef<str>>(rows: &[S]) -> Self {
        Self::Custom {
            rows: rows.iter().map(|r| r.as_ref().to_string()).collect(),
        }
    }

    /// Grid size of a custom layout (`None` for the wedge, which takes its
    /// size from the configuration).
    pub fn custom_shape(&self) -> Option<(usize, usize)> {
        match self {
            Self::Wedge => None,
            Self::Custom { rows } => Some((rows.len(), rows.first().map_or(0, |r| r.chars().count()))),
        }
    }
}

/// Wedge layout for a `rows x cols` grid.
///
/// Solid: column 0, column `cols-1`, row `rows-1`, and the wedge. With
/// `half = (cols-2)/2` and `offset = rows/2`, the cell `c` columns in from a
/// side wall is solid from row `offset + c` downwards on both sides. An odd
/// interior width leaves the middle column open.
pub fn wedge_cells(rows: usize, cols: usize) -> Vec<CellType> {
    let half = cols.saturating_sub(2) / 2;
    let offset = rows / 2;
    let mut cells = Vec::with_capacity(rows * cols);

    for i in 0..rows {
        for j in 0..cols {
            let wall = j == 0 || j + 1 == cols || i + 1 == rows;
            let wedge = if (1..=half).contains(&j) {
                i >= offset + (j - 1)
            } else if j + 2 <= cols && (cols - 2 - j) < half {
                i >= offset + (cols - 2 - j)
            } else {
                false
            };

            let cell = if wall || wedge {
                CellType::Solid
            } else if i == 0 {
                CellType::Air
            } else {
                CellType::Water
            };
            cells.push(cell);
        }
    }
    cells
}

/// Parse a custom character layout into `(rows, cols, cells)`.
pub fn parse_layout<S: AsRef<str>>(rows: &[S]) -> Result<(usize, usize, Vec<CellType>), DomainError> {
    let n = rows.len();
    let m = rows.first().map_or(0, |r| r.as_ref().chars().count());
    let mut cells = Vec::with_capacity(n * m);

    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        let width = row.chars().count();
        if width != m {
            return Err(DomainError::RaggedLayout {
                row: i,
                expected: m,
                found: width,
            });
        }
        for (j, ch) in row.chars().enumerate() {
            let cell = CellType::from_char(ch).ok_or(DomainError::UnknownCell { ch, row: i, col: j })?;
            cells.push(cell);
        }
    }
    Ok((n, m, cells))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(rows: usize, cols: usize, cells: &[CellType]) -> Vec<String> {
        (0..rows)
            .map(|i| cells[i * cols..(i + 1) * cols].iter().map(|c| c.as_char()).collect())
            .collect()
    }

    #[test]
    fn test_small_wedge_is_single_column() {
        let cells = wedge_cells(5, 5);
        assert_eq!(
            render(5, 5, &cells),
            vec!["#...#", "#~~~#", "##~##", "##~##", "#####"]
        );
    }

    #[test]
    fn test_even_wedge_shape() {
        let cells = wedge_cells(8, 8);
        assert_eq!(
            render(8, 8, &cells),
            vec![
                "#......#",
                "#~~~~~~#",
                "#~~~~~~#",
                "#~~~~~~#",
                "##~~~~##",
                "###~~###",
                "########",
                "########",
            ]
        );
    }

    #[test]
    fn test_default_wedge_matches_reference_rows() {
        let (n, m) = (30, 30);
        let cells = wedge_cells(n, m);
        // Above the wedge every interior cell is water.
        for i in 1..15 {
            for j in 1..m - 1 {
                assert_eq!(cells[i * m + j], CellType::Water, "cell ({i}, {j})");
            }
        }
        // Row 15 carries one solid cell next to each wall.
        assert_eq!(cells[15 * m + 1], CellType::Solid);
        assert_eq!(cells[15 * m + 2], CellType::Water);
        assert_eq!(cells[15 * m + 28], CellType::Solid);
        assert_eq!(cells[15 * m + 27], CellType::Water);
        // Row 27 leaves a two-cell gap at the bottom of the V.
        let open: Vec<usize> = (0..m).filter(|&j| cells[27 * m + j] == CellType::Water).collect();
        assert_eq!(open, vec![14, 15]);
        // The wedge closes on row 28; the floor is solid too.
        assert!((0..m).all(|j| cells[28 * m + j] == CellType::Solid));
        assert!((0..m).all(|j| cells[29 * m + j] == CellType::Solid));
    }

    #[test]
    fn test_parse_layout() {
        let (n, m, cells) = parse_layout(&["#.#", "#~#", "###"]).unwrap();
        assert_eq!((n, m), (3, 3));
        assert_eq!(cells[4], CellType::Water);
        assert_eq!(cells[1], CellType::Air);
    }

    #[test]
    fn test_parse_layout_errors() {
        assert_eq!(
            parse_layout(&["#.#", "#~"]).unwrap_err(),
            DomainError::RaggedLayout { row: 1, expected: 3, found: 2 }
        );
        assert_eq!(
            parse_layout(&["#x#"]).unwrap_err(),
            DomainError::UnknownCell { ch: 'x', row: 0, col: 1 }
        );
    }

    #[test]
    fn test_layout_serde_tagging() {
        let json = serde_json::to_string(&DomainLayout::Wedge).unwrap();
        assert_eq!(json, r#"{"kind":"wedge"}"#);
        let custom: DomainLayout =
            serde_json::from_value(serde_json::json!({ "kind": "custom", "rows": ["#.#", "#~#", "###"] })).unwrap();
        assert_eq!(custom.custom_shape(), Some((3, 3)));
    }
}
