//! Uniform grid spatial index
//!
//! Maps grid cells over a bounding rectangle to candidate item ids. Storage
//! is compressed-row: `cell_offsets` has one entry per cell plus a sentinel,
//! and a cell's items are `cell_items[cell_offsets[c]..cell_offsets[c + 1]]`.
//! The index is built once from the navmesh and is read-only afterwards.

use glam::Vec2;

/// Default cell size for navmesh indices (in world units)
pub const DEFAULT_INDEX_CELL_SIZE: f32 = 128.0;

/// Default margin added around the navmesh bbox before gridding
pub const DEFAULT_INDEX_INFLATION: f32 = 50.0;

/// Grid parameters for the navmesh spatial indices
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SpatialIndexConfig {
    /// Edge length of a grid cell
    pub cell_size: f32,
    /// Margin added on every side of the mesh bounding box
    pub inflation: f32,
}

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_INDEX_CELL_SIZE,
            inflation: DEFAULT_INDEX_INFLATION,
        }
    }
}

impl SpatialIndexConfig {
    /// Validates the configuration parameters
    pub fn validate(&self) -> trinav_common::Result<()> {
        use trinav_common::Error;

        if !(self.cell_size > 0.0) {
            return Err(Error::Config("Index cell size must be positive".to_string()));
        }
        if self.inflation < 0.0 {
            return Err(Error::Config("Index inflation must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Uniform grid mapping cells to item ids
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    cell_offsets: Vec<u32>,
    cell_items: Vec<u32>,
    grid_width: usize,
    grid_height: usize,
    cell_size: f32,
    min: Vec2,
    max: Vec2,
}

impl SpatialIndex {
    /// Builds an index over `[min, max]`.
    ///
    /// `bounds` gives each item's bounding rectangle; `overlaps` is the exact
    /// item/cell test run for every cell inside those bounds. Returning `None`
    /// from `bounds` skips the item.
    pub fn build<B, O>(
        min: Vec2,
        max: Vec2,
        cell_size: f32,
        items: impl IntoIterator<Item = u32>,
        bounds: B,
        overlaps: O,
    ) -> Self
    where
        B: Fn(u32) -> Option<(Vec2, Vec2)>,
        O: Fn(u32, Vec2, Vec2) -> bool,
    {
        let extent = (max - min).max(Vec2::ZERO);
        let grid_width = ((extent.x / cell_size).ceil() as usize).max(1);
        let grid_height = ((extent.y / cell_size).ceil() as usize).max(1);
        let total_cells = grid_width * grid_height;

        let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); total_cells];

        for item in items {
            let Some((imin, imax)) = bounds(item) else {
                continue;
            };
            let sx = (((imin.x - min.x) / cell_size).floor().max(0.0) as usize).min(grid_width - 1);
            let ex = (((imax.x - min.x) / cell_size).floor().max(0.0) as usize).min(grid_width - 1);
            let sy = (((imin.y - min.y) / cell_size).floor().max(0.0) as usize).min(grid_height - 1);
            let ey = (((imax.y - min.y) / cell_size).floor().max(0.0) as usize).min(grid_height - 1);

            for cy in sy..=ey {
                for cx in sx..=ex {
                    let cell_min = min + Vec2::new(cx as f32, cy as f32) * cell_size;
                    let cell_max = cell_min + Vec2::splat(cell_size);
                    if overlaps(item, cell_min, cell_max) {
                        buckets[cy * grid_width + cx].push(item);
                    }
                }
            }
        }

        let mut cell_offsets = Vec::with_capacity(total_cells + 1);
        let mut cell_items = Vec::with_capacity(buckets.iter().map(Vec::len).sum());
        for bucket in &buckets {
            cell_offsets.push(cell_items.len() as u32);
            cell_items.extend_from_slice(bucket);
        }
        cell_offsets.push(cell_items.len() as u32);

        log::debug!(
            "Spatial index built: {}x{} cells, {} items",
            grid_width,
            grid_height,
            cell_items.len()
        );

        Self {
            cell_offsets,
            cell_items,
            grid_width,
            grid_height,
            cell_size,
            min,
            max,
        }
    }

    fn cell_range(&self, cell: usize) -> &[u32] {
        if cell + 1 >= self.cell_offsets.len() {
            return &[];
        }
        let start = self.cell_offsets[cell] as usize;
        let end = self.cell_offsets[cell + 1] as usize;
        &self.cell_items[start..end]
    }

    /// Returns the items of the single cell containing `p` (empty outside the grid)
    pub fn query(&self, p: Vec2) -> &[u32] {
        if self.cell_size <= 0.0 {
            return &[];
        }
        let fx = ((p.x - self.min.x) / self.cell_size).floor();
        let fy = ((p.y - self.min.y) / self.cell_size).floor();
        if fx < 0.0 || fy < 0.0 {
            return &[];
        }
        let (cx, cy) = (fx as usize, fy as usize);
        if cx >= self.grid_width || cy >= self.grid_height {
            return &[];
        }
        self.cell_range(cy * self.grid_width + cx)
    }

    /// Returns the deduplicated items of every cell overlapping the rectangle
    pub fn query_area(&self, amin: Vec2, amax: Vec2) -> Vec<u32> {
        let mut result = Vec::new();
        if self.cell_size <= 0.0 || self.cell_offsets.is_empty() {
            return result;
        }
        let to_cell = |v: f32, origin: f32, count: usize| -> usize {
            let c = ((v - origin) / self.cell_size).floor();
            if c < 0.0 {
                0
            } else {
                (c as usize).min(count - 1)
            }
        };
        if amax.x < self.min.x || amax.y < self.min.y || amin.x > self.max.x || amin.y > self.max.y {
            return result;
        }
        let sx = to_cell(amin.x, self.min.x, self.grid_width);
        let ex = to_cell(amax.x, self.min.x, self.grid_width);
        let sy = to_cell(amin.y, self.min.y, self.grid_height);
        let ey = to_cell(amax.y, self.min.y, self.grid_height);

        for cy in sy..=ey {
            for cx in sx..=ex {
                for &item in self.cell_range(cy * self.grid_width + cx) {
                    if !result.contains(&item) {
                        result.push(item);
                    }
                }
            }
        }
        result
    }

    /// Lower corner of the indexed region
    pub fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper corner of the indexed region
    pub fn max(&self) -> Vec2 {
        self.max
    }

    /// Edge length of a grid cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions in cells
    pub fn grid_size(&self) -> (usize, usize) {
        (self.grid_width, self.grid_height)
    }

    /// Total number of (cell, item) entries
    pub fn item_count(&self) -> usize {
        self.cell_items.len()
    }
}
