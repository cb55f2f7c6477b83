use glam::Vec2;

use std::collections::{HashMap, HashSet};

use crate::types::Aabb;

/// Uniform-grid broad phase. Rebuilt from scratch every tick.
///
/// Entries are opaque `usize` ids (arena slot indices in the world). A body is
/// appended to every cell its bounds touch, so a pair may share several cells;
/// [`SpatialHash::candidate_pairs`] reports each unordered pair once.
#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

/// Occupancy counters for the current grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
    pub cells: usize,
    /// Sum of per-cell pair counts (n*(n-1)/2), counts duplicates across cells.
    pub candidate_pairs: usize,
    pub unique_pairs: usize,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self { cell_size: cell_size.max(1e-5), cells: HashMap::new() }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_of(&self, p: Vec2) -> (i32, i32) {
        ((p.x / self.cell_size).floor() as i32, (p.y / self.cell_size).floor() as i32)
    }

    /// Append `id` to every cell overlapped by `aabb`.
    pub fn insert(&mut self, id: usize, aabb: Aabb) {
        let (ix0, iy0) = self.cell_of(aabb.min);
        let (ix1, iy1) = self.cell_of(aabb.max);
        for iy in iy0..=iy1 {
            for ix in ix0..=ix1 {
                self.cells.entry((ix, iy)).or_default().push(id);
            }
        }
    }

    /// Ids stored in one cell.
    pub fn cell(&self, cell: (i32, i32)) -> &[usize] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Unique unordered pairs sharing at least one cell, as `(low, high)`,
    /// sorted so callers see the same order regardless of map iteration.
    pub fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();
        let mut out = Vec::new();
        for indices in self.cells.values() {
            if indices.len() < 2 {
                continue;
            }
            for i0 in 0..indices.len() {
                for i1 in (i0 + 1)..indices.len() {
                    let a = indices[i0];
                    let b = indices[i1];
                    if a == b {
                        continue;
                    }
                    let key = if a < b { (a, b) } else { (b, a) };
                    if seen_pairs.insert(key) {
                        out.push(key);
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Sum of per-cell pair counts, duplicates across cells included.
    pub fn raw_pair_count(&self) -> usize {
        self.cells
            .values()
            .map(|v| v.len())
            .filter(|&n| n >= 2)
            .map(|n| n * (n - 1) / 2)
            .sum()
    }

    pub fn stats(&self) -> GridStats {
        GridStats {
            cells: self.len(),
            candidate_pairs: self.raw_pair_count(),
            unique_pairs: self.candidate_pairs().len(),
        }
    }
}
