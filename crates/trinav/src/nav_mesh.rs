//! Navigation mesh store
//!
//! The navmesh is a set of flat, index-addressed arrays produced by an
//! offline map pipeline and read-only at runtime:
//!
//! - `vertices`: 2D points shared by every other table.
//! - `triangles`: three vertex ids each, sorted by parent polygon.
//!   `neighbors[t][e]` is the triangle across edge
//!   `triangles[t][e] -> triangles[t][(e + 1) % 3]`, or `-1` on the boundary.
//! - Polygons are convex merges of walkable triangles (or, past the walkable
//!   cutoff, the outlines of impassable "blobs"). `polygons` holds N+1
//!   offsets into `poly_verts`; `poly_neighbors` is parallel to `poly_verts`
//!   and gives the polygon across edge `poly_verts[i] -> poly_verts[i + 1]`
//!   (wrapping), or `-1`. `poly_tris` holds N+1 offsets into the triangle
//!   list.
//! - Triangles below `walkable_triangle_count` and polygons below
//!   `walkable_polygon_count` are traversable; everything above is blob.
//! - Buildings are the detailed outlines that were simplified into blobs.

use glam::Vec2;
use trinav_common::debug::{DebugSink, DebugVisualize, NavMeshColors};
use trinav_common::{Error, Result, point_in_triangle, polygon_rect_overlap, triangle_rect_overlap};

use crate::spatial_index::{SpatialIndex, SpatialIndexConfig};

/// Triangle id
pub type TriId = u32;
/// Polygon id
pub type PolyId = u32;
/// Vertex id
pub type VertId = u32;

/// Raw neighbor value marking a boundary edge
pub const NO_NEIGHBOR: i32 = -1;

/// Flat navmesh arrays as delivered by the map pipeline
#[derive(Debug, Clone, Default)]
pub struct NavMeshData {
    pub vertices: Vec<Vec2>,
    pub triangles: Vec<[u32; 3]>,
    pub neighbors: Vec<[i32; 3]>,
    /// N+1 offsets into `poly_verts`
    pub polygons: Vec<u32>,
    pub poly_verts: Vec<u32>,
    /// N+1 offsets into `triangles`
    pub poly_tris: Vec<u32>,
    pub poly_neighbors: Vec<i32>,
    /// Per-polygon centroids; derived from the vertices when empty
    pub poly_centroids: Vec<Vec2>,
    /// N+1 offsets into `building_verts` (may be empty)
    pub buildings: Vec<u32>,
    pub building_verts: Vec<u32>,
    /// Offsets into the building list, one range per blob (may be empty)
    pub blob_buildings: Vec<u32>,
    pub walkable_triangle_count: u32,
    pub walkable_polygon_count: u32,
    /// Real bounding box; derived from the vertices when `None`
    pub bbox: Option<(Vec2, Vec2)>,
}

/// Read-only navigation mesh with derived tables and spatial indices
#[derive(Debug, Clone)]
pub struct NavMesh {
    vertices: Vec<Vec2>,
    triangles: Vec<[u32; 3]>,
    neighbors: Vec<[i32; 3]>,
    triangle_centroids: Vec<Vec2>,
    polygons: Vec<u32>,
    poly_verts: Vec<u32>,
    poly_tris: Vec<u32>,
    poly_neighbors: Vec<i32>,
    poly_centroids: Vec<Vec2>,
    buildings: Vec<u32>,
    building_verts: Vec<u32>,
    blob_buildings: Vec<u32>,
    triangle_to_polygon: Vec<i32>,
    building_to_blob: Vec<i32>,
    walkable_triangle_count: u32,
    walkable_polygon_count: u32,
    bbox_min: Vec2,
    bbox_max: Vec2,
    triangle_index: SpatialIndex,
    polygon_index: SpatialIndex,
    building_index: SpatialIndex,
    blob_index: SpatialIndex,
}

fn check_offsets(name: &str, offsets: &[u32], data_len: usize) -> Result<()> {
    if offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(Error::InvalidMesh(format!("{name} offsets are not monotonic")));
    }
    if let Some(&last) = offsets.last() {
        if last as usize > data_len {
            return Err(Error::InvalidMesh(format!(
                "{name} sentinel {last} exceeds data length {data_len}"
            )));
        }
    }
    Ok(())
}

impl NavMesh {
    /// Validates the flat arrays and derives centroids, lookup maps and the
    /// four spatial indices.
    pub fn new(data: NavMeshData, index_config: SpatialIndexConfig) -> Result<Self> {
        index_config.validate()?;

        let NavMeshData {
            vertices,
            triangles,
            neighbors,
            polygons,
            poly_verts,
            poly_tris,
            poly_neighbors,
            poly_centroids,
            buildings,
            building_verts,
            blob_buildings,
            walkable_triangle_count,
            walkable_polygon_count,
            bbox,
        } = data;

        let vert_count = vertices.len();
        let tri_count = triangles.len();

        if tri_count == 0 {
            return Err(Error::InvalidMesh("navmesh has no triangles".to_string()));
        }
        if let Some(bad) = triangles.iter().flatten().find(|&&v| v as usize >= vert_count) {
            return Err(Error::InvalidMesh(format!("triangle references missing vertex {bad}")));
        }
        if neighbors.len() != tri_count {
            return Err(Error::InvalidMesh(format!(
                "expected {tri_count} neighbor triples, got {}",
                neighbors.len()
            )));
        }
        if neighbors
            .iter()
            .flatten()
            .any(|&n| n < NO_NEIGHBOR || n >= tri_count as i32)
        {
            return Err(Error::InvalidMesh("triangle neighbor out of range".to_string()));
        }
        for (t, links) in neighbors.iter().enumerate() {
            for &n in links.iter().filter(|&&n| n != NO_NEIGHBOR) {
                if !neighbors[n as usize].contains(&(t as i32)) {
                    return Err(Error::InvalidMesh(format!(
                        "triangle {t} links to {n}, which does not link back"
                    )));
                }
            }
        }
        if walkable_triangle_count as usize > tri_count {
            return Err(Error::InvalidMesh(
                "walkable triangle count exceeds triangle count".to_string(),
            ));
        }

        if polygons.is_empty() {
            return Err(Error::InvalidMesh("polygon offsets need a sentinel".to_string()));
        }
        let poly_count = polygons.len() - 1;
        check_offsets("polygon", &polygons, poly_verts.len())?;
        if let Some(bad) = poly_verts.iter().find(|&&v| v as usize >= vert_count) {
            return Err(Error::InvalidMesh(format!("polygon references missing vertex {bad}")));
        }
        if poly_neighbors.len() != poly_verts.len() {
            return Err(Error::InvalidMesh(
                "poly_neighbors must be parallel to poly_verts".to_string(),
            ));
        }
        if poly_neighbors
            .iter()
            .any(|&n| n < NO_NEIGHBOR || n >= poly_count as i32)
        {
            return Err(Error::InvalidMesh("polygon neighbor out of range".to_string()));
        }
        if poly_tris.len() != poly_count + 1 {
            return Err(Error::InvalidMesh(format!(
                "expected {} poly_tris offsets, got {}",
                poly_count + 1,
                poly_tris.len()
            )));
        }
        check_offsets("poly_tris", &poly_tris, tri_count)?;
        if walkable_polygon_count as usize > poly_count {
            return Err(Error::InvalidMesh(
                "walkable polygon count exceeds polygon count".to_string(),
            ));
        }
        if !poly_centroids.is_empty() && poly_centroids.len() != poly_count {
            return Err(Error::InvalidMesh(format!(
                "expected {poly_count} polygon centroids, got {}",
                poly_centroids.len()
            )));
        }
        if !buildings.is_empty() {
            check_offsets("building", &buildings, building_verts.len())?;
        }
        if let Some(bad) = building_verts.iter().find(|&&v| v as usize >= vert_count) {
            return Err(Error::InvalidMesh(format!("building references missing vertex {bad}")));
        }
        let building_count = buildings.len().saturating_sub(1);
        if !blob_buildings.is_empty() {
            check_offsets("blob_buildings", &blob_buildings, building_count)?;
        }

        let triangle_centroids: Vec<Vec2> = triangles
            .iter()
            .map(|t| (vertices[t[0] as usize] + vertices[t[1] as usize] + vertices[t[2] as usize]) / 3.0)
            .collect();

        let mut triangle_to_polygon = vec![NO_NEIGHBOR; tri_count];
        for poly in 0..poly_count {
            for tri in poly_tris[poly]..poly_tris[poly + 1] {
                triangle_to_polygon[tri as usize] = poly as i32;
            }
        }
        if let Some(orphan) =
            (0..walkable_triangle_count as usize).find(|&t| triangle_to_polygon[t] == NO_NEIGHBOR)
        {
            return Err(Error::InvalidMesh(format!(
                "walkable triangle {orphan} belongs to no polygon"
            )));
        }

        let mut building_to_blob = vec![NO_NEIGHBOR; building_count];
        for blob in 0..blob_buildings.len().saturating_sub(1) {
            for building in blob_buildings[blob]..blob_buildings[blob + 1] {
                building_to_blob[building as usize] = (walkable_polygon_count as usize + blob) as i32;
            }
        }

        let poly_centroids = if poly_centroids.is_empty() {
            (0..poly_count)
                .map(|p| {
                    let verts = &poly_verts[polygons[p] as usize..polygons[p + 1] as usize];
                    if verts.is_empty() {
                        return Vec2::ZERO;
                    }
                    verts.iter().map(|&v| vertices[v as usize]).sum::<Vec2>() / verts.len() as f32
                })
                .collect()
        } else {
            poly_centroids
        };

        let (bbox_min, bbox_max) = bbox.unwrap_or_else(|| {
            vertices.iter().fold(
                (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
                |(lo, hi), v| (lo.min(*v), hi.max(*v)),
            )
        });

        let mut mesh = Self {
            vertices,
            triangles,
            neighbors,
            triangle_centroids,
            polygons,
            poly_verts,
            poly_tris,
            poly_neighbors,
            poly_centroids,
            buildings,
            building_verts,
            blob_buildings,
            triangle_to_polygon,
            building_to_blob,
            walkable_triangle_count,
            walkable_polygon_count,
            bbox_min,
            bbox_max,
            triangle_index: SpatialIndex::default(),
            polygon_index: SpatialIndex::default(),
            building_index: SpatialIndex::default(),
            blob_index: SpatialIndex::default(),
        };
        let indices = mesh.build_indices(index_config);
        [
            mesh.triangle_index,
            mesh.polygon_index,
            mesh.blob_index,
            mesh.building_index,
        ] = indices;

        log::debug!(
            "NavMesh ready: {} vertices, {} triangles ({} walkable), {} polygons ({} walkable), {} buildings",
            mesh.vertices.len(),
            tri_count,
            walkable_triangle_count,
            poly_count,
            walkable_polygon_count,
            building_count
        );

        Ok(mesh)
    }

    /// Builds the triangle, polygon, blob and building indices, in that order
    fn build_indices(&self, config: SpatialIndexConfig) -> [SpatialIndex; 4] {
        let min = self.bbox_min - Vec2::splat(config.inflation);
        let max = self.bbox_max + Vec2::splat(config.inflation);
        let cs = config.cell_size;

        let bounds_of = |points: &[Vec2]| -> Option<(Vec2, Vec2)> {
            if points.is_empty() {
                return None;
            }
            Some(points.iter().fold(
                (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
                |(lo, hi), p| (lo.min(*p), hi.max(*p)),
            ))
        };

        let tri_points = |t: u32| self.triangle_points(t);
        let triangle_index = SpatialIndex::build(
            min,
            max,
            cs,
            0..self.walkable_triangle_count,
            |t| bounds_of(&tri_points(t)),
            |t, cmin, cmax| {
                let [a, b, c] = tri_points(t);
                triangle_rect_overlap(a, b, c, cmin, cmax)
            },
        );

        let poly_points = |p: u32| -> Vec<Vec2> {
            self.poly_verts(p)
                .iter()
                .map(|&v| self.vertices[v as usize])
                .collect()
        };
        let poly_count = self.polygon_count();
        let polygon_index = SpatialIndex::build(
            min,
            max,
            cs,
            0..poly_count,
            |p| bounds_of(&poly_points(p)),
            |p, cmin, cmax| polygon_rect_overlap(&poly_points(p), cmin, cmax),
        );
        let blob_index = SpatialIndex::build(
            min,
            max,
            cs,
            self.walkable_polygon_count..poly_count,
            |p| bounds_of(&poly_points(p)),
            |p, cmin, cmax| polygon_rect_overlap(&poly_points(p), cmin, cmax),
        );

        let building_points = |b: u32| -> Vec<Vec2> {
            self.building_verts(b)
                .iter()
                .map(|&v| self.vertices[v as usize])
                .collect()
        };
        let building_index = SpatialIndex::build(
            min,
            max,
            cs,
            0..self.building_count(),
            |b| bounds_of(&building_points(b)),
            |b, cmin, cmax| polygon_rect_overlap(&building_points(b), cmin, cmax),
        );

        [triangle_index, polygon_index, blob_index, building_index]
    }

    /// Position of a vertex
    #[inline]
    pub fn vertex(&self, v: VertId) -> Vec2 {
        self.vertices[v as usize]
    }

    /// All vertices
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Total triangle count (walkable and blob)
    pub fn triangle_count(&self) -> u32 {
        self.triangles.len() as u32
    }

    /// Number of traversable triangles; ids at or above are blob triangles
    pub fn walkable_triangle_count(&self) -> u32 {
        self.walkable_triangle_count
    }

    /// Total polygon count (walkable and blob)
    pub fn polygon_count(&self) -> u32 {
        (self.polygons.len() - 1) as u32
    }

    /// Number of traversable polygons; ids at or above are blobs
    pub fn walkable_polygon_count(&self) -> u32 {
        self.walkable_polygon_count
    }

    /// Number of buildings
    pub fn building_count(&self) -> u32 {
        self.buildings.len().saturating_sub(1) as u32
    }

    /// Checks whether `t` is a valid walkable triangle id
    #[inline]
    pub fn is_walkable_triangle(&self, t: TriId) -> bool {
        t < self.walkable_triangle_count
    }

    /// Checks whether `p` is a valid walkable polygon id
    #[inline]
    pub fn is_walkable_polygon(&self, p: PolyId) -> bool {
        p < self.walkable_polygon_count
    }

    /// Vertex ids of a triangle
    #[inline]
    pub fn triangle(&self, t: TriId) -> [VertId; 3] {
        self.triangles[t as usize]
    }

    /// Vertex positions of a triangle
    #[inline]
    pub fn triangle_points(&self, t: TriId) -> [Vec2; 3] {
        let [a, b, c] = self.triangles[t as usize];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Raw neighbor triple of a triangle (`-1` on boundary edges)
    #[inline]
    pub fn triangle_neighbors(&self, t: TriId) -> [i32; 3] {
        self.neighbors[t as usize]
    }

    /// Triangle across edge `e` of `t`, if any
    #[inline]
    pub fn triangle_neighbor(&self, t: TriId, e: usize) -> Option<TriId> {
        let n = self.neighbors[t as usize][e];
        (n >= 0).then_some(n as TriId)
    }

    /// Centroid of a triangle
    #[inline]
    pub fn triangle_centroid(&self, t: TriId) -> Vec2 {
        self.triangle_centroids[t as usize]
    }

    /// Parent polygon of a triangle
    #[inline]
    pub fn triangle_to_polygon(&self, t: TriId) -> Option<PolyId> {
        let p = *self.triangle_to_polygon.get(t as usize)?;
        (p >= 0).then_some(p as PolyId)
    }

    /// Ordered vertex ids of a polygon
    #[inline]
    pub fn poly_verts(&self, p: PolyId) -> &[VertId] {
        let start = self.polygons[p as usize] as usize;
        let end = self.polygons[p as usize + 1] as usize;
        &self.poly_verts[start..end]
    }

    /// Raw per-edge neighbors of a polygon, parallel to [`Self::poly_verts`]
    #[inline]
    pub fn poly_neighbors(&self, p: PolyId) -> &[i32] {
        let start = self.polygons[p as usize] as usize;
        let end = self.polygons[p as usize + 1] as usize;
        &self.poly_neighbors[start..end]
    }

    /// Range of triangle ids belonging to a polygon
    #[inline]
    pub fn poly_tris(&self, p: PolyId) -> std::ops::Range<TriId> {
        self.poly_tris[p as usize]..self.poly_tris[p as usize + 1]
    }

    /// Centroid of a polygon
    #[inline]
    pub fn poly_centroid(&self, p: PolyId) -> Vec2 {
        self.poly_centroids[p as usize]
    }

    /// Vertex positions of a polygon
    pub fn poly_points(&self, p: PolyId) -> Vec<Vec2> {
        self.poly_verts(p).iter().map(|&v| self.vertex(v)).collect()
    }

    /// Index of the edge of `a` shared with polygon `b`
    pub fn shared_edge(&self, a: PolyId, b: PolyId) -> Option<usize> {
        self.poly_neighbors(a).iter().position(|&n| n == b as i32)
    }

    /// Checks whether a point lies in one of the polygon's triangles
    pub fn point_in_polygon(&self, point: Vec2, p: PolyId) -> bool {
        self.poly_tris(p).any(|t| self.point_in_triangle(point, t))
    }

    /// Checks whether a point lies in (or on) a triangle
    #[inline]
    pub fn point_in_triangle(&self, point: Vec2, t: TriId) -> bool {
        let [a, b, c] = self.triangle_points(t);
        point_in_triangle(point, a, b, c)
    }

    /// Vertex ids of a building outline
    pub fn building_verts(&self, b: u32) -> &[VertId] {
        let start = self.buildings[b as usize] as usize;
        let end = self.buildings[b as usize + 1] as usize;
        &self.building_verts[start..end]
    }

    /// Blob polygon a building was merged into
    pub fn building_to_blob(&self, b: u32) -> Option<PolyId> {
        let blob = *self.building_to_blob.get(b as usize)?;
        (blob >= 0).then_some(blob as PolyId)
    }

    /// Buildings merged into a blob polygon
    pub fn blob_buildings(&self, blob: PolyId) -> std::ops::Range<u32> {
        let ordinal = blob.checked_sub(self.walkable_polygon_count).map(|o| o as usize);
        match ordinal {
            Some(o) if o + 1 < self.blob_buildings.len() => {
                self.blob_buildings[o]..self.blob_buildings[o + 1]
            }
            _ => 0..0,
        }
    }

    /// Real bounding box of the mesh
    pub fn bbox(&self) -> (Vec2, Vec2) {
        (self.bbox_min, self.bbox_max)
    }

    /// Spatial index over walkable triangles
    pub fn triangle_index(&self) -> &SpatialIndex {
        &self.triangle_index
    }

    /// Spatial index over all polygons
    pub fn polygon_index(&self) -> &SpatialIndex {
        &self.polygon_index
    }

    /// Spatial index over building outlines
    pub fn building_index(&self) -> &SpatialIndex {
        &self.building_index
    }

    /// Spatial index over blob polygons
    pub fn blob_index(&self) -> &SpatialIndex {
        &self.blob_index
    }
}

impl DebugVisualize for NavMesh {
    fn debug_draw(&self, sink: &mut dyn DebugSink) {
        for p in 0..self.polygon_count() {
            let color = if self.is_walkable_polygon(p) {
                NavMeshColors::WALKABLE
            } else {
                NavMeshColors::BLOB
            };
            let points = self.poly_points(p);
            for i in 0..points.len() {
                sink.add_line(points[i], points[(i + 1) % points.len()], color);
            }
        }
    }
}
