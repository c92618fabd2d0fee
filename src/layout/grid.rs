use crate::foundation::core::{CanvasSpec, CellRect, PhotoCount};
use crate::foundation::error::PhotowallResult;

/// Rows and columns chosen for a photo count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct GridShape {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns in every row except possibly the last.
    pub cols: u32,
}

impl GridShape {
    /// Near-square grid for `count` cells.
    ///
    /// Minimizes `|rows - cols|`, then the number of unused slots; remaining ties go to more
    /// columns on landscape (and square) canvases and to more rows on portrait ones.
    pub fn for_count(count: PhotoCount, canvas: CanvasSpec) -> Self {
        let n = count.get();
        let mut best: Option<(u32, u32)> = None;
        for r in 1..=n {
            let c = n.div_ceil(r);
            // Drop rows that would stay empty.
            let rows = n.div_ceil(c);
            best = Some(match best {
                None => (rows, c),
                Some(prev) if better(canvas, (rows, c), prev, n) => (rows, c),
                Some(prev) => prev,
            });
        }
        let (rows, cols) = best.unwrap_or((1, 1));
        Self { rows, cols }
    }

    /// Cells in the last row; the remaining slots of a partial grid are dropped.
    pub fn last_row_len(self, count: PhotoCount) -> u32 {
        count.get() - (self.rows - 1) * self.cols
    }

    /// Total slots (`rows * cols`).
    pub fn capacity(self) -> u64 {
        u64::from(self.rows) * u64::from(self.cols)
    }
}

fn better(canvas: CanvasSpec, cand: (u32, u32), prev: (u32, u32), n: u32) -> bool {
    let key = |(r, c): (u32, u32)| {
        let diff = r.abs_diff(c);
        let waste = GridShape { rows: r, cols: c }.capacity() - u64::from(n);
        let orientation = if canvas.is_landscape() {
            // More columns first.
            u32::from(c < r)
        } else {
            u32::from(r < c)
        };
        (diff, waste, orientation)
    };
    key(cand) < key(prev)
}

/// Partition `canvas` into `count` cells in row-major order.
///
/// Every row has the same height (the last row takes the remainder). Cells of a row share the
/// width evenly (the last cell takes the remainder), so a short last row is widened rather than
/// padded. The cells tile the canvas exactly.
pub fn plan_grid(canvas: CanvasSpec, count: PhotoCount) -> PhotowallResult<Vec<CellRect>> {
    let shape = GridShape::for_count(count, canvas);
    let mut cells = Vec::with_capacity(count.as_usize());

    let row_h = canvas.height() / shape.rows;
    let last_row_len = shape.last_row_len(count);
    for row in 0..shape.rows {
        let y = row * row_h;
        let height = if row + 1 == shape.rows {
            canvas.height() - y
        } else {
            row_h
        };

        let in_row = if row + 1 == shape.rows {
            last_row_len
        } else {
            shape.cols
        };
        let cell_w = canvas.width() / in_row;
        for col in 0..in_row {
            let x = col * cell_w;
            let width = if col + 1 == in_row {
                canvas.width() - x
            } else {
                cell_w
            };
            cells.push(CellRect {
                x,
                y,
                width,
                height,
            });
        }
    }

    tracing::debug!(
        rows = shape.rows,
        cols = shape.cols,
        cells = cells.len(),
        "planned collage grid"
    );
    Ok(cells)
}

#[cfg(test)]
#[path = "../../tests/unit/layout/grid.rs"]
mod tests;
