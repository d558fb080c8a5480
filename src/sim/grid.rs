//! Uniform spatial grid over the scoring bumpers
//!
//! Bumpers are static for a level, so the grid is rebuilt only at game start
//! and on level advance. A query returns the bumpers bucketed in the 3×3 cells
//! around the ball, in a fixed order so collision handling stays deterministic.

use std::collections::HashMap;

use glam::{IVec2, Vec2};

use super::state::ScoreBumper;
use crate::consts::GRID_CELL_SIZE;

#[derive(Debug, Clone)]
pub struct BumperGrid {
    cell_size: f32,
    /// Cell -> indices into the bumper list
    cells: HashMap<IVec2, Vec<usize>>,
}

impl Default for BumperGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl BumperGrid {
    pub fn new() -> Self {
        Self::with_cell_size(GRID_CELL_SIZE)
    }

    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Convert a world position to its cell coordinate
    #[inline]
    pub fn cell_of(&self, position: Vec2) -> IVec2 {
        (position / self.cell_size).floor().as_ivec2()
    }

    /// Re-bucket every bumper
    pub fn rebuild(&mut self, bumpers: &[ScoreBumper]) {
        self.cells.clear();
        for (idx, bumper) in bumpers.iter().enumerate() {
            let cell = self.cell_of(bumper.position);
            self.cells.entry(cell).or_default().push(idx);
        }
        log::debug!("Bumper grid rebuilt: {} bumpers in {} cells", bumpers.len(), self.cells.len());
    }

    /// Bumper indices in the 3×3 neighborhood of `position`
    pub fn nearby(&self, position: Vec2) -> Vec<usize> {
        let center = self.cell_of(position);
        let mut found = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(indices) = self.cells.get(&(center + IVec2::new(dx, dy))) {
                    found.extend_from_slice(indices);
                }
            }
        }
        found
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of bucketed bumpers
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }
}
