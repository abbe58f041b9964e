//! Bit-encoded wall grid backing collision queries.

use mazecrawl_core::{CellCoord, Direction, WallMask};

/// Grid of wall masks, built once at level load and immutable during play.
#[derive(Clone, Debug)]
pub struct Maze {
    columns: u32,
    rows: u32,
    cells: Vec<WallMask>,
}

impl Maze {
    /// Builds a maze from row-major raw mask bytes.
    ///
    /// Layouts shorter than `columns * rows` are padded with solid cells so
    /// malformed data can never open a path off the grid; surplus bytes are
    /// ignored.
    #[must_use]
    pub fn from_raw(columns: u32, rows: u32, walls: &[u8]) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut cells = vec![WallMask::SOLID; capacity];
        for (slot, raw) in cells.iter_mut().zip(walls.iter()) {
            *slot = WallMask::from_raw(*raw);
        }
        Self {
            columns,
            rows,
            cells,
        }
    }

    /// Maze of the given dimensions with no walls at all, used before a
    /// level layout is configured.
    #[must_use]
    pub fn open(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![WallMask::default(); capacity],
        }
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether `cell` lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Wall mask stored at `cell`; solid outside the grid.
    #[must_use]
    pub fn mask(&self, cell: CellCoord) -> WallMask {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(WallMask::SOLID)
    }

    /// Reports whether a wall blocks travel from `cell` toward
    /// `direction`.
    ///
    /// Out-of-bounds coordinates count as fully walled so movement
    /// queries stay total.
    #[must_use]
    pub fn has_wall(&self, cell: CellCoord, direction: Direction) -> bool {
        self.mask(cell).blocks(direction)
    }

    /// Interior walls not mirrored by the neighbouring cell.
    ///
    /// Level data must author both sides of every interior wall; this
    /// audit lets authoring tools verify that contract. Each mismatch is
    /// reported once, from the cell closer to the origin.
    #[must_use]
    pub fn wall_mismatches(&self) -> Vec<(CellCoord, Direction)> {
        let mut mismatches = Vec::new();
        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = CellCoord::new(column, row);
                for direction in [Direction::East, Direction::South] {
                    let Some(neighbor) = cell.neighbor(direction) else {
                        continue;
                    };
                    if !self.contains(neighbor) {
                        continue;
                    }
                    if self.has_wall(cell, direction)
                        != self.has_wall(neighbor, direction.opposite())
                    {
                        mismatches.push((cell, direction));
                    }
                }
            }
        }
        mismatches
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_land_in_row_major_order() {
        let maze = Maze::from_raw(2, 2, &[0b0100_0000, 0, 0, 0b0000_0001]);
        assert!(maze.has_wall(CellCoord::new(0, 0), Direction::North));
        assert!(!maze.has_wall(CellCoord::new(1, 0), Direction::North));
        assert!(maze.has_wall(CellCoord::new(1, 1), Direction::West));
    }

    #[test]
    fn out_of_bounds_cells_are_fully_walled() {
        let maze = Maze::open(3, 3);
        let outside = CellCoord::new(3, 0);
        for direction in Direction::ALL {
            assert!(maze.has_wall(outside, direction));
        }
        assert!(!maze.contains(outside));
    }

    #[test]
    fn short_layouts_pad_with_solid_cells() {
        let maze = Maze::from_raw(2, 2, &[0]);
        assert!(!maze.has_wall(CellCoord::new(0, 0), Direction::East));
        for direction in Direction::ALL {
            assert!(maze.has_wall(CellCoord::new(1, 1), direction));
        }
    }

    #[test]
    fn mismatch_audit_reports_one_sided_walls() {
        // Cell (0,0) walls its east side; cell (1,0) does not wall west.
        let maze = Maze::from_raw(2, 1, &[0b0001_0000, 0]);
        assert_eq!(
            maze.wall_mismatches(),
            vec![(CellCoord::new(0, 0), Direction::East)]
        );
    }

    #[test]
    fn mirrored_walls_pass_the_audit() {
        let maze = Maze::from_raw(2, 1, &[0b0001_0000, 0b0000_0001]);
        assert!(maze.wall_mismatches().is_empty());
    }
}
