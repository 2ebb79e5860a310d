//! Canvas positions and grid snapping

use serde::{Deserialize, Serialize};

/// Top-left corner of a panel on the canvas, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

impl Position {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }

    /// Clamp to the visible canvas and round to whole pixels
    pub fn normalized(self) -> Self {
        Self {
            top: self.top.max(0.0).round(),
            left: self.left.max(0.0).round(),
        }
    }
}

/// Cell coordinates inside a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
}

/// Geometry of a snap grid placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub rows: u32,
    pub columns: u32,
    pub cell_size: f64,
    pub origin: Position,
}

impl GridGeometry {
    pub fn new(rows: u32, columns: u32, cell_size: u32, origin: Position) -> Self {
        Self {
            rows,
            columns,
            cell_size: f64::from(cell_size),
            origin,
        }
    }

    pub fn width(&self) -> f64 {
        f64::from(self.columns) * self.cell_size
    }

    pub fn height(&self) -> f64 {
        f64::from(self.rows) * self.cell_size
    }

    /// Move `position` to the nearest cell corner, keeping it inside the grid
    pub fn snap(&self, position: Position) -> Position {
        let row = Self::nearest_index(position.top - self.origin.top, self.cell_size, self.rows);
        let column =
            Self::nearest_index(position.left - self.origin.left, self.cell_size, self.columns);

        Position {
            top: self.origin.top + f64::from(row) * self.cell_size,
            left: self.origin.left + f64::from(column) * self.cell_size,
        }
    }

    /// The cell containing `position`, if it lies on the grid
    pub fn cell_at(&self, position: Position) -> Option<Cell> {
        let dy = position.top - self.origin.top;
        let dx = position.left - self.origin.left;

        if dy < 0.0 || dx < 0.0 || dy >= self.height() || dx >= self.width() {
            return None;
        }

        Some(Cell {
            row: (dy / self.cell_size).floor() as u32,
            column: (dx / self.cell_size).floor() as u32,
        })
    }

    fn nearest_index(offset: f64, cell_size: f64, count: u32) -> u32 {
        let index = (offset / cell_size).round();
        index.clamp(0.0, f64::from(count.saturating_sub(1))) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridGeometry {
        GridGeometry::new(4, 5, 50, Position::new(100.0, 200.0))
    }

    #[test]
    fn test_normalized_clamps_and_rounds() {
        assert_eq!(
            Position::new(-12.0, 33.6).normalized(),
            Position::new(0.0, 34.0)
        );
        assert_eq!(
            Position::new(10.4, 0.5).normalized(),
            Position::new(10.0, 1.0)
        );
    }

    #[test]
    fn test_snap_to_nearest_corner() {
        let grid = grid();

        assert_eq!(
            grid.snap(Position::new(124.0, 226.0)),
            Position::new(100.0, 250.0)
        );
        assert_eq!(
            grid.snap(Position::new(180.0, 310.0)),
            Position::new(200.0, 300.0)
        );
    }

    #[test]
    fn test_snap_stays_inside_grid() {
        let grid = grid();

        assert_eq!(grid.snap(Position::new(0.0, 0.0)), Position::new(100.0, 200.0));
        // Last cell corner is (origin + (rows - 1) * size, origin + (columns - 1) * size).
        assert_eq!(
            grid.snap(Position::new(5000.0, 5000.0)),
            Position::new(250.0, 400.0)
        );
    }

    #[test]
    fn test_snapped_positions_are_cell_aligned() {
        let grid = grid();

        for (top, left) in [(101.0, 201.0), (149.9, 351.2), (333.0, 222.0)] {
            let snapped = grid.snap(Position::new(top, left));
            assert_eq!((snapped.top - grid.origin.top) % grid.cell_size, 0.0);
            assert_eq!((snapped.left - grid.origin.left) % grid.cell_size, 0.0);
            assert!(grid.cell_at(snapped).is_some());
        }
    }

    #[test]
    fn test_cell_at() {
        let grid = grid();

        assert_eq!(
            grid.cell_at(Position::new(100.0, 200.0)),
            Some(Cell { row: 0, column: 0 })
        );
        assert_eq!(
            grid.cell_at(Position::new(299.0, 449.0)),
            Some(Cell { row: 3, column: 4 })
        );
        assert_eq!(grid.cell_at(Position::new(300.0, 200.0)), None);
        assert_eq!(grid.cell_at(Position::new(99.0, 200.0)), None);
    }
}
