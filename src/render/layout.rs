//! Grid layout: maps image indices to grid cells

use crate::domain::model::{GridCellSpec, GridSize, ThumbnailSize};
use crate::error::{MontageError, MontageResult};

/// A cell of the montage grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
    /// Image placed in this cell when it is not the positional one
    pub index: Option<usize>,
}

impl GridCell {
    /// Single 1x1 cell
    pub fn at(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            row_span: 1,
            col_span: 1,
            index: None,
        }
    }
}

/// Pixel rectangle of a cell on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Grid layout.
///
/// Without explicit cells, image `i` goes to row `i / cols`, column `i % cols`.
/// With explicit cells, a cell whose `index` matches wins, then the cell at
/// list position `i` if it has no explicit index.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    rows: u32,
    cols: u32,
    cells: Vec<GridCell>,
}

impl GridLayout {
    /// Empty layout using the default row-major mapping
    pub fn new(grid: GridSize) -> Self {
        Self {
            rows: grid.rows,
            cols: grid.columns,
            cells: Vec::new(),
        }
    }

    /// Build a custom layout from configured cells
    pub fn from_specs(grid: GridSize, specs: &[GridCellSpec]) -> MontageResult<Self> {
        let mut layout = Self::new(grid);
        for spec in specs {
            layout.add_cell(spec.row, spec.col, spec.row_span, spec.col_span, spec.index)?;
        }
        Ok(layout)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Whether explicit cells were added
    pub fn is_custom(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Explicit cells in insertion order
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Add an explicit cell, rejecting anything that leaves the grid
    pub fn add_cell(
        &mut self,
        row: i64,
        col: i64,
        row_span: i64,
        col_span: i64,
        index: Option<usize>,
    ) -> MontageResult<()> {
        let rows = i64::from(self.rows);
        let cols = i64::from(self.cols);
        let inside = (0..rows).contains(&row)
            && (0..cols).contains(&col)
            && row_span >= 1
            && col_span >= 1
            && row + row_span <= rows
            && col + col_span <= cols;

        if !inside {
            return Err(MontageError::OutOfBounds {
                row,
                col,
                row_span,
                col_span,
                rows: self.rows,
                cols: self.cols,
            });
        }

        self.cells.push(GridCell {
            row: row as u32,
            col: col as u32,
            row_span: row_span as u32,
            col_span: col_span as u32,
            index,
        });
        Ok(())
    }

    /// Cell for image `index`, if the layout places it
    pub fn cell_for(&self, index: usize) -> Option<GridCell> {
        if !self.is_custom() {
            let cols = self.cols.max(1) as usize;
            let row = index / cols;
            if row >= self.rows as usize {
                return None;
            }
            return Some(GridCell::at(row as u32, (index % cols) as u32));
        }

        if let Some(cell) = self.cells.iter().find(|cell| cell.index == Some(index)) {
            return Some(*cell);
        }

        self.cells
            .get(index)
            .filter(|cell| cell.index.is_none())
            .copied()
    }

    /// Canvas rectangle of `cell`, with the grid starting at `top`
    pub fn rect(&self, cell: &GridCell, thumb: ThumbnailSize, padding: u32, margin: u32, top: u32) -> CellRect {
        CellRect {
            x: margin + cell.col * (thumb.width + padding),
            y: top + margin + cell.row * (thumb.height + padding),
            width: cell.col_span * thumb.width + (cell.col_span - 1) * padding,
            height: cell.row_span * thumb.height + (cell.row_span - 1) * padding,
        }
    }
}
