//! Static collision grid rasterized from arena obstacles.

use horde_survival_core::{OccupancyView, WorldRect};

/// Dense boolean occupancy grid built once per arena load.
///
/// Every obstacle rectangle blocks each tile its footprint touches, so the
/// grid never reports a partially covered tile as free. Rectangles that are
/// degenerate or reach outside the arena are ignored or clamped instead of
/// failing the build.
#[derive(Clone, Debug, Default)]
pub struct StaticCollisionGrid {
    columns: u32,
    rows: u32,
    tile_size: f32,
    cells: Vec<bool>,
}

impl StaticCollisionGrid {
    /// Rasterizes the obstacles into a grid of `columns` by `rows` tiles.
    #[must_use]
    pub fn build(obstacles: &[WorldRect], columns: u32, rows: u32, tile_size: f32) -> Self {
        let width = usize::try_from(columns).unwrap_or(0);
        let height = usize::try_from(rows).unwrap_or(0);
        let cell_count = width.checked_mul(height).unwrap_or(0);

        let mut grid = Self {
            columns,
            rows,
            tile_size,
            cells: vec![false; cell_count],
        };

        if cell_count == 0 || !tile_size.is_finite() || tile_size <= 0.0 {
            return grid;
        }

        for obstacle in obstacles {
            grid.mark(obstacle);
        }
        grid
    }

    /// Rasterizes the obstacles into a grid covering a map measured in pixels.
    ///
    /// The grid spans `ceil(width / tile_size)` by `ceil(height / tile_size)`
    /// tiles, so a partial trailing tile is still represented.
    #[must_use]
    pub fn for_map(obstacles: &[WorldRect], width: f32, height: f32, tile_size: f32) -> Self {
        let columns = tiles_spanning(width, tile_size);
        let rows = tiles_spanning(height, tile_size);
        Self::build(obstacles, columns, rows, tile_size)
    }

    /// Reports whether the tile is blocked. Tiles outside the grid are blocked.
    #[must_use]
    pub fn is_blocked(&self, column: i64, row: i64) -> bool {
        if column < 0 || row < 0 || column >= i64::from(self.columns) || row >= i64::from(self.rows)
        {
            return true;
        }

        let Some(index) = usize::try_from(row)
            .ok()
            .zip(usize::try_from(column).ok())
            .and_then(|(row, column)| {
                let width = usize::try_from(self.columns).ok()?;
                row.checked_mul(width)?.checked_add(column)
            })
        else {
            return true;
        };

        self.cells.get(index).copied().unwrap_or(true)
    }

    /// Read-only view consumed by systems.
    #[must_use]
    pub fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.cells, self.columns, self.rows, self.tile_size)
    }

    /// Provides the dimensions of the grid in tiles.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Number of blocked tiles.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|blocked| **blocked).count()
    }

    fn mark(&mut self, obstacle: &WorldRect) {
        if !obstacle.is_well_formed() {
            return;
        }

        let Some((first_column, end_column)) = tile_span(
            obstacle.left(),
            obstacle.right(),
            self.tile_size,
            self.columns,
        ) else {
            return;
        };
        let Some((first_row, end_row)) =
            tile_span(obstacle.top(), obstacle.bottom(), self.tile_size, self.rows)
        else {
            return;
        };

        let Ok(width) = usize::try_from(self.columns) else {
            return;
        };

        for row in first_row..end_row {
            for column in first_column..end_column {
                let index = row * width + column;
                if let Some(cell) = self.cells.get_mut(index) {
                    *cell = true;
                }
            }
        }
    }
}

/// Half-open range of tiles touched by the interval `[start, end)`, clamped to `limit`.
fn tile_span(start: f32, end: f32, tile_size: f32, limit: u32) -> Option<(usize, usize)> {
    let first = (start / tile_size).floor().max(0.0);
    let last = (end / tile_size).ceil().min(limit as f32);
    if first >= last {
        return None;
    }
    Some((first as usize, last as usize))
}

fn tiles_spanning(length: f32, tile_size: f32) -> u32 {
    if !length.is_finite() || !tile_size.is_finite() || length <= 0.0 || tile_size <= 0.0 {
        return 0;
    }
    let tiles = (length / tile_size).ceil();
    if tiles >= u32::MAX as f32 {
        u32::MAX
    } else {
        tiles as u32
    }
}
