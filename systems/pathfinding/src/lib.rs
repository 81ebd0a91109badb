#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid path planner that answers "which way is the next step?" queries.
//!
//! Both searches run over the static occupancy grid with 4-connected moves and
//! uniform step cost. Only the first step of the discovered route is returned;
//! the full path is never materialized for callers.

use std::{cmp::Reverse, collections::BinaryHeap, collections::VecDeque};

use horde_survival_core::{AgentVariant, CellCoord, OccupancyView, Vec2};

const NO_PARENT: usize = usize::MAX;

/// Search algorithm used to answer a direction query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    /// Breadth-first search with a FIFO frontier.
    BreadthFirst,
    /// A* with a Manhattan heuristic.
    AStar,
}

impl SearchStrategy {
    /// Strategy assigned to the provided agent variant. Bosses plan with A*.
    #[must_use]
    pub const fn for_variant(variant: AgentVariant) -> Self {
        if variant.is_boss() {
            Self::AStar
        } else {
            Self::BreadthFirst
        }
    }
}

/// Reusable path planner owning the scratch buffers of both searches.
#[derive(Debug, Default)]
pub struct PathPlanner {
    visited: Vec<bool>,
    parents: Vec<usize>,
    g_scores: Vec<u32>,
    frontier: VecDeque<usize>,
    open: BinaryHeap<Reverse<(u32, u32, usize)>>,
    last_expanded: usize,
}

impl PathPlanner {
    /// Creates a planner with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the next-step direction using the requested strategy.
    pub fn direction(
        &mut self,
        strategy: SearchStrategy,
        start: Vec2,
        target: Vec2,
        grid: OccupancyView<'_>,
    ) -> Vec2 {
        match strategy {
            SearchStrategy::BreadthFirst => self.bfs_direction(start, target, grid),
            SearchStrategy::AStar => self.astar_direction(start, target, grid),
        }
    }

    /// Next-step direction from a breadth-first search.
    ///
    /// Returns the zero vector when either position lies outside the grid,
    /// when both share a tile, or when the target tile is unreachable.
    pub fn bfs_direction(&mut self, start: Vec2, target: Vec2, grid: OccupancyView<'_>) -> Vec2 {
        self.last_expanded = 0;
        let Some((start_index, target_index)) = endpoints(start, target, grid) else {
            return Vec2::ZERO;
        };

        self.prepare(grid.cell_count());
        self.visited[start_index] = true;
        self.frontier.push_back(start_index);

        let mut reached = false;
        while let Some(current) = self.frontier.pop_front() {
            self.last_expanded += 1;
            if current == target_index {
                reached = true;
                break;
            }

            let Some(cell) = grid.cell_from_index(current) else {
                continue;
            };
            for neighbor in neighbors(cell, grid) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.visited[neighbor_index] || grid.is_blocked(neighbor) {
                    continue;
                }
                self.visited[neighbor_index] = true;
                self.parents[neighbor_index] = current;
                self.frontier.push_back(neighbor_index);
            }
        }

        if !reached {
            return Vec2::ZERO;
        }
        self.step_direction(start, start_index, target_index, grid)
    }

    /// Next-step direction from an A* search keyed by `g + h`.
    ///
    /// Shares the early exits of [`PathPlanner::bfs_direction`]. Heap ties
    /// break on the lower heuristic, then on the lower cell index.
    pub fn astar_direction(&mut self, start: Vec2, target: Vec2, grid: OccupancyView<'_>) -> Vec2 {
        self.last_expanded = 0;
        let Some((start_index, target_index)) = endpoints(start, target, grid) else {
            return Vec2::ZERO;
        };
        let Some(target_cell) = grid.cell_from_index(target_index) else {
            return Vec2::ZERO;
        };

        self.prepare(grid.cell_count());
        let start_h = grid
            .cell_from_index(start_index)
            .map_or(0, |cell| cell.manhattan_distance(target_cell));
        self.g_scores[start_index] = 0;
        self.open.push(Reverse((start_h, start_h, start_index)));

        let mut reached = false;
        while let Some(Reverse((_, _, current))) = self.open.pop() {
            if self.visited[current] {
                continue;
            }
            self.visited[current] = true;
            self.last_expanded += 1;
            if current == target_index {
                reached = true;
                break;
            }

            let Some(cell) = grid.cell_from_index(current) else {
                continue;
            };
            let tentative = self.g_scores[current].saturating_add(1);
            for neighbor in neighbors(cell, grid) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.visited[neighbor_index] || grid.is_blocked(neighbor) {
                    continue;
                }
                if tentative >= self.g_scores[neighbor_index] {
                    continue;
                }
                self.g_scores[neighbor_index] = tentative;
                self.parents[neighbor_index] = current;
                let h = neighbor.manhattan_distance(target_cell);
                self.open
                    .push(Reverse((tentative.saturating_add(h), h, neighbor_index)));
            }
        }

        if !reached {
            return Vec2::ZERO;
        }
        self.step_direction(start, start_index, target_index, grid)
    }

    /// Number of nodes the most recent search expanded.
    #[must_use]
    pub fn last_expanded(&self) -> usize {
        self.last_expanded
    }

    fn prepare(&mut self, cell_count: usize) {
        self.visited.clear();
        self.visited.resize(cell_count, false);
        self.parents.clear();
        self.parents.resize(cell_count, NO_PARENT);
        self.g_scores.clear();
        self.g_scores.resize(cell_count, u32::MAX);
        self.frontier.clear();
        self.open.clear();
    }

    fn step_direction(
        &self,
        start: Vec2,
        start_index: usize,
        target_index: usize,
        grid: OccupancyView<'_>,
    ) -> Vec2 {
        let Some(next_index) = self.first_step(start_index, target_index) else {
            return Vec2::ZERO;
        };
        let Some(next_cell) = grid.cell_from_index(next_index) else {
            return Vec2::ZERO;
        };
        (grid.cell_center(next_cell) - start).normalize_or_zero()
    }

    /// Walks the parent chain back from the target to the tile adjacent to the start.
    fn first_step(&self, start_index: usize, target_index: usize) -> Option<usize> {
        let mut current = target_index;
        for _ in 0..self.parents.len() {
            let parent = *self.parents.get(current)?;
            if parent == NO_PARENT {
                return None;
            }
            if parent == start_index {
                return Some(current);
            }
            current = parent;
        }
        None
    }
}

fn endpoints(start: Vec2, target: Vec2, grid: OccupancyView<'_>) -> Option<(usize, usize)> {
    let start_cell = grid.cell_at(start)?;
    let target_cell = grid.cell_at(target)?;
    if start_cell == target_cell {
        return None;
    }
    Some((grid.index(start_cell)?, grid.index(target_cell)?))
}

/// In-bounds 4-connected neighbours in north, east, south, west order.
fn neighbors(cell: CellCoord, grid: OccupancyView<'_>) -> impl Iterator<Item = CellCoord> {
    let (width, height) = grid.dimensions();
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.column(), row));
        count += 1;
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < width {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_add(1) {
        if row < height {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(column, cell.row()));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
