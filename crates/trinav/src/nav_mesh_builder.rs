//! Assembles [`NavMeshData`] from triangles grouped into polygons
//!
//! The map pipeline normally ships the finished flat arrays. This builder
//! derives them from a plain triangle soup plus a polygon grouping, which is
//! what hosts without a prebuilt asset (and the tests) have at hand. It
//! computes triangle adjacency, polygon boundary loops, polygon adjacency and
//! the `poly_tris` ranges, and orders walkable polygons before blobs.

use std::collections::HashMap;

use glam::Vec2;
use trinav_common::{Error, Result, cross_2d};

use crate::nav_mesh::{NO_NEIGHBOR, NavMesh, NavMeshData, PolyId};
use crate::spatial_index::SpatialIndexConfig;

#[derive(Debug, Clone)]
struct PolyInput {
    triangles: Vec<[u32; 3]>,
    buildings: Vec<Vec<u32>>,
}

/// Builder for navigation meshes
#[derive(Debug, Clone, Default)]
pub struct NavMeshBuilder {
    vertices: Vec<Vec2>,
    walkable: Vec<PolyInput>,
    blobs: Vec<PolyInput>,
}

impl NavMeshBuilder {
    /// Creates a builder over a shared vertex table
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self {
            vertices,
            walkable: Vec::new(),
            blobs: Vec::new(),
        }
    }

    /// Adds a walkable convex polygon made of the given triangles
    pub fn add_polygon(&mut self, triangles: &[[u32; 3]]) -> PolyId {
        self.walkable.push(PolyInput {
            triangles: triangles.to_vec(),
            buildings: Vec::new(),
        });
        (self.walkable.len() - 1) as PolyId
    }

    /// Adds an impassable blob with the building outlines it was made from.
    ///
    /// Returns the blob ordinal; its polygon id is the final walkable polygon
    /// count plus this ordinal.
    pub fn add_blob(&mut self, triangles: &[[u32; 3]], buildings: &[Vec<u32>]) -> usize {
        self.blobs.push(PolyInput {
            triangles: triangles.to_vec(),
            buildings: buildings.to_vec(),
        });
        self.blobs.len() - 1
    }

    /// Produces the flat arrays
    pub fn build_data(&self) -> Result<NavMeshData> {
        let vert_count = self.vertices.len() as u32;
        let mut data = NavMeshData {
            vertices: self.vertices.clone(),
            walkable_polygon_count: self.walkable.len() as u32,
            ..Default::default()
        };

        let inputs = self.walkable.iter().chain(self.blobs.iter());

        // Triangles sorted by polygon, wound counter-clockwise
        data.poly_tris.push(0);
        let mut tri_poly = Vec::new();
        for (poly, input) in inputs.clone().enumerate() {
            if input.triangles.is_empty() {
                return Err(Error::InvalidMesh(format!("polygon {poly} has no triangles")));
            }
            for tri in &input.triangles {
                if tri.iter().any(|&v| v >= vert_count) {
                    return Err(Error::InvalidMesh(format!(
                        "polygon {poly} references a missing vertex"
                    )));
                }
                let [a, b, c] = tri.map(|v| self.vertices[v as usize]);
                let wound = if cross_2d(b - a, c - a) < 0.0 {
                    [tri[0], tri[2], tri[1]]
                } else {
                    *tri
                };
                data.triangles.push(wound);
                tri_poly.push(poly as u32);
            }
            data.poly_tris.push(data.triangles.len() as u32);
            if poly + 1 == self.walkable.len() {
                data.walkable_triangle_count = data.triangles.len() as u32;
            }
        }

        // Triangle adjacency through shared undirected edges
        let mut edge_owners: HashMap<(u32, u32), Vec<(usize, usize)>> = HashMap::new();
        for (t, tri) in data.triangles.iter().enumerate() {
            for e in 0..3 {
                let (a, b) = (tri[e], tri[(e + 1) % 3]);
                edge_owners.entry((a.min(b), a.max(b))).or_default().push((t, e));
            }
        }
        data.neighbors = vec![[NO_NEIGHBOR; 3]; data.triangles.len()];
        for owners in edge_owners.values() {
            if owners.len() > 2 {
                return Err(Error::InvalidMesh(
                    "edge shared by more than two triangles".to_string(),
                ));
            }
            if let &[(t0, e0), (t1, e1)] = owners.as_slice() {
                data.neighbors[t0][e0] = t1 as i32;
                data.neighbors[t1][e1] = t0 as i32;
            }
        }

        // Polygon boundary loops and per-edge polygon neighbors
        data.polygons.push(0);
        for (poly, _) in inputs.clone().enumerate() {
            let range = data.poly_tris[poly] as usize..data.poly_tris[poly + 1] as usize;
            let mut next_of: HashMap<u32, (u32, i32)> = HashMap::new();
            for t in range.clone() {
                let tri = data.triangles[t];
                for e in 0..3 {
                    let across = data.neighbors[t][e];
                    let interior = across >= 0 && range.contains(&(across as usize));
                    if !interior {
                        let neighbor_poly = if across >= 0 {
                            tri_poly[across as usize] as i32
                        } else {
                            NO_NEIGHBOR
                        };
                        next_of.insert(tri[e], (tri[(e + 1) % 3], neighbor_poly));
                    }
                }
            }

            let Some(&start) = next_of.keys().min() else {
                return Err(Error::InvalidMesh(format!("polygon {poly} has no boundary")));
            };
            let mut current = start;
            loop {
                let Some(&(next, neighbor)) = next_of.get(&current) else {
                    return Err(Error::InvalidMesh(format!(
                        "polygon {poly} boundary is not a closed loop"
                    )));
                };
                data.poly_verts.push(current);
                data.poly_neighbors.push(neighbor);
                current = next;
                if current == start {
                    break;
                }
                if data.poly_verts.len() - data.polygons[poly] as usize > next_of.len() {
                    return Err(Error::InvalidMesh(format!(
                        "polygon {poly} boundary is not a simple loop"
                    )));
                }
            }
            data.polygons.push(data.poly_verts.len() as u32);
        }

        // Buildings attached to blobs
        if self.blobs.iter().any(|b| !b.buildings.is_empty()) {
            data.buildings.push(0);
            data.blob_buildings.push(0);
            for blob in &self.blobs {
                for outline in &blob.buildings {
                    data.building_verts.extend_from_slice(outline);
                    data.buildings.push(data.building_verts.len() as u32);
                }
                data.blob_buildings.push((data.buildings.len() - 1) as u32);
            }
        }

        Ok(data)
    }

    /// Produces a ready navigation mesh
    pub fn build(&self, index_config: SpatialIndexConfig) -> Result<NavMesh> {
        NavMesh::new(self.build_data()?, index_config)
    }
}
