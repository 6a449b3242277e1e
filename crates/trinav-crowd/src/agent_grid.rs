//! Uniform grid for agent-agent collision
//!
//! Agents are bucketed into large fixed cells every frame and only agents
//! sharing a cell are collided. The grid origin is jittered each frame by a
//! Halton(2, 3) offset of up to half a cell, so pairs straddling a cell
//! border one frame share a cell in a later one.
//!
//! The buckets are stored compressed: one flat entry array ordered by cell
//! plus per-cell start offsets, rebuilt by a counting sort.

use glam::Vec2;
use trinav_common::halton;

use crate::config::CrowdConfig;

/// Collision grid over agent ordinals
#[derive(Debug, Clone)]
pub struct AgentGrid {
    cell_size: f32,
    world_min: f32,
    width: usize,
    max_per_cell: usize,
    /// Agent ordinals grouped by cell
    entries: Vec<u32>,
    /// Start of each cell in `entries`, plus a final end offset
    starts: Vec<u32>,
    counts: Vec<u32>,
    /// Fill position of each cell during a rebuild
    cursor: Vec<u32>,
    /// Cell of each agent ordinal from the last rebuild
    agent_cells: Vec<Option<usize>>,
    occupied: Vec<usize>,
    offset: Vec2,
    frame: u32,
}

impl AgentGrid {
    /// Creates an empty grid covering the configured world square
    pub fn new(config: &CrowdConfig) -> Self {
        let width = (2.0 * config.world_half_extent / config.grid_cell_size).ceil() as usize;
        let cells = width * width;
        Self {
            cell_size: config.grid_cell_size,
            world_min: -config.world_half_extent,
            width,
            max_per_cell: config.max_agents_per_cell,
            entries: Vec::new(),
            starts: vec![0; cells + 1],
            counts: vec![0; cells],
            cursor: vec![0; cells],
            agent_cells: Vec::new(),
            occupied: Vec::new(),
            offset: Vec2::ZERO,
            frame: 0,
        }
    }

    /// Cells per row and column
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.counts.len()
    }

    /// Origin jitter used by the last rebuild
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Number of rebuilds so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Cell containing `p` under the current offset, `None` outside the world
    pub fn cell_index(&self, p: Vec2) -> Option<usize> {
        let local = (p + self.offset - Vec2::splat(self.world_min)) / self.cell_size;
        let (gx, gy) = (local.x.floor(), local.y.floor());
        if gx < 0.0 || gy < 0.0 {
            return None;
        }
        let (gx, gy) = (gx as usize, gy as usize);
        (gx < self.width && gy < self.width).then_some(gy * self.width + gx)
    }

    /// Rebuilds the buckets from agent positions; the n-th position becomes
    /// agent ordinal `n`.
    ///
    /// Agents outside the world or beyond a full cell are left out.
    pub fn clear_and_reindex<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        let half_cell = self.cell_size * 0.5;
        self.offset = Vec2::new(
            halton(self.frame, 2) * self.cell_size - half_cell,
            halton(self.frame, 3) * self.cell_size - half_cell,
        );

        for &cell in &self.occupied {
            self.counts[cell] = 0;
        }
        self.occupied.clear();
        self.agent_cells.clear();

        for p in positions {
            let cell = self.cell_index(p).filter(|&c| (self.counts[c] as usize) < self.max_per_cell);
            if let Some(c) = cell {
                if self.counts[c] == 0 {
                    self.occupied.push(c);
                }
                self.counts[c] += 1;
            }
            self.agent_cells.push(cell);
        }

        let mut start = 0u32;
        for (cell, &count) in self.counts.iter().enumerate() {
            self.starts[cell] = start;
            start += count;
        }
        let cells = self.counts.len();
        self.starts[cells] = start;

        self.entries.clear();
        self.entries.resize(start as usize, 0);
        for &c in &self.occupied {
            self.cursor[c] = self.starts[c];
        }
        for (ordinal, cell) in self.agent_cells.iter().enumerate() {
            if let Some(c) = *cell {
                self.entries[self.cursor[c] as usize] = ordinal as u32;
                self.cursor[c] += 1;
            }
        }

        self.frame = self.frame.wrapping_add(1);
    }

    /// Agent ordinals in `cell`
    pub fn cell(&self, cell: usize) -> &[u32] {
        match (self.starts.get(cell), self.starts.get(cell + 1)) {
            (Some(&start), Some(&end)) => &self.entries[start as usize..end as usize],
            _ => &[],
        }
    }

    /// Cell an agent ordinal was bucketed into by the last rebuild
    pub fn agent_cell(&self, ordinal: usize) -> Option<usize> {
        self.agent_cells.get(ordinal).copied().flatten()
    }

    /// Non-empty cells of the last rebuild
    pub fn occupied_cells(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.occupied.iter().map(|&cell| self.cell(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let grid = AgentGrid::new(&CrowdConfig::default());
        assert_eq!(grid.width(), 79);
        assert_eq!(grid.cell_count(), 79 * 79);
        assert_eq!(grid.frame(), 0);
    }

    #[test]
    fn test_halton_offsets_per_frame() {
        let mut grid = AgentGrid::new(&CrowdConfig::default());
        grid.clear_and_reindex(std::iter::empty());
        assert_eq!(grid.offset(), Vec2::new(-128.0, -128.0));
        grid.clear_and_reindex(std::iter::empty());
        assert!(grid.offset().x.abs() < 1e-4);
        assert!((grid.offset().y - (256.0 / 3.0 - 128.0)).abs() < 1e-3);
        assert_eq!(grid.frame(), 2);
    }

    #[test]
    fn test_neighbors_share_a_cell() {
        let mut grid = AgentGrid::new(&CrowdConfig::default());
        // Frame 0 shifts by -128, so cell borders sit at multiples of 256 - 10000 + 128
        grid.clear_and_reindex([Vec2::new(10.0, 10.0), Vec2::new(12.0, 10.0), Vec2::new(900.0, 10.0)]);
        assert_eq!(grid.agent_cell(0), grid.agent_cell(1));
        assert_ne!(grid.agent_cell(0), grid.agent_cell(2));

        let cell = grid.agent_cell(0).unwrap();
        assert_eq!(grid.cell(cell), &[0, 1]);
        assert_eq!(grid.occupied_cells().count(), 2);
    }

    #[test]
    fn test_out_of_world_and_full_cells_are_skipped() {
        let config = CrowdConfig {
            max_agents_per_cell: 2,
            ..CrowdConfig::default()
        };
        let mut grid = AgentGrid::new(&config);
        grid.clear_and_reindex([
            Vec2::new(50_000.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(3.0, 1.0),
        ]);
        assert_eq!(grid.agent_cell(0), None);
        assert_eq!(grid.agent_cell(3), None);
        let cell = grid.agent_cell(1).unwrap();
        assert_eq!(grid.cell(cell), &[1, 2]);

        // A rebuild forgets the previous frame
        grid.clear_and_reindex([Vec2::new(1.0, 1.0)]);
        assert_eq!(grid.occupied_cells().map(<[u32]>::len).sum::<usize>(), 1);
    }

    #[test]
    fn test_rebuilds_reuse_fill_positions() {
        let mut grid = AgentGrid::new(&CrowdConfig::default());
        let crowd = [Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0), Vec2::new(3.0, 1.0)];
        grid.clear_and_reindex(crowd);
        let cursor_ptr = grid.cursor.as_ptr();

        // Stale fill positions from the bigger frame must not leak into this one
        grid.clear_and_reindex([Vec2::new(900.0, 10.0), Vec2::new(2.0, 1.0)]);
        assert_eq!(grid.cursor.as_ptr(), cursor_ptr);
        assert_eq!(grid.cursor.len(), grid.cell_count());
        let far = grid.agent_cell(0).unwrap();
        let near = grid.agent_cell(1).unwrap();
        assert_ne!(far, near);
        assert_eq!(grid.cell(far), &[0]);
        assert_eq!(grid.cell(near), &[1]);
        assert_eq!(grid.occupied_cells().map(<[u32]>::len).sum::<usize>(), 2);
    }
}
