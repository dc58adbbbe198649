//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Immutable scene description consumed by the ray tracing engine.
use cgmath::Vector3;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::volume::Volume;

/// A triangle, expressed as three vertex indices and a surface index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub surface: u32,
    pub v0: u32,
    pub v1: u32,
    pub v2: u32,
}

/// Acoustic properties of a surface.
///
/// `specular` is the fraction of energy reflected on every bounce; `diffuse`
/// is the fraction scattered toward the receiver at each intersection. All
/// lanes must lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub specular: Volume,
    pub diffuse: Volume,
}

/// The axis-aligned bounds of a vertex set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Bounds {
    fn from_vertices(vertices: &[Vector3<f32>]) -> Self {
        let mut min = vertices[0];
        let mut max = vertices[0];
        for v in vertices[1..].iter() {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }
        Bounds { min, max }
    }

    pub fn contains(&self, point: Vector3<f32>) -> bool {
        self.min.x <= point.x && point.x <= self.max.x && self.min.y <= point.y &&
            point.y <= self.max.y && self.min.z <= point.z && point.z <= self.max.z
    }
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("the scene contains no triangles, vertices, or surfaces")]
    Empty,

    #[error("triangle {triangle} references an out-of-range vertex or surface")]
    InvalidIndex { triangle: usize },

    #[error("surface {surface} has a coefficient outside the range [0, 1]")]
    InvalidSurface { surface: usize },
}

/// Immutable triangle, vertex, and surface arrays with precomputed bounds.
///
/// A `GeometryStore` is an initialize-once, use-many value: it is built from
/// external mesh and material data, validated at construction, and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct GeometryStore {
    triangles: Vec<Triangle>,
    vertices: Vec<Vector3<f32>>,
    surfaces: Vec<Surface>,
    bounds: Bounds,
}

impl GeometryStore {
    pub fn new(
        triangles: Vec<Triangle>,
        vertices: Vec<Vector3<f32>>,
        surfaces: Vec<Surface>,
    ) -> Result<Self, GeometryError> {
        if triangles.is_empty() || vertices.is_empty() || surfaces.is_empty() {
            return Err(GeometryError::Empty);
        }

        for (i, s) in surfaces.iter().enumerate() {
            let in_range = s.specular
                .get_ref()
                .iter()
                .chain(s.diffuse.get_ref().iter())
                .all(|x| 0.0 <= *x && *x <= 1.0);
            if !in_range {
                return Err(GeometryError::InvalidSurface { surface: i });
            }
        }

        for (i, t) in triangles.iter().enumerate() {
            if t.surface as usize >= surfaces.len() || t.v0 as usize >= vertices.len() ||
                t.v1 as usize >= vertices.len() ||
                t.v2 as usize >= vertices.len()
            {
                return Err(GeometryError::InvalidIndex { triangle: i });
            }
        }

        let bounds = Bounds::from_vertices(&vertices);

        Ok(Self {
            triangles,
            vertices,
            surfaces,
            bounds,
        })
    }

    /// Assemble a store from per-mesh data and a material library.
    ///
    /// A mesh whose name matches a named material uses that material's
    /// surface for every face; all other meshes use the library's default
    /// surface (index 0).
    pub fn from_meshes(
        meshes: &[Mesh],
        materials: &MaterialLibrary,
    ) -> Result<Self, GeometryError> {
        let mut triangles = Vec::new();
        let mut vertices = Vec::new();

        for mesh in meshes.iter() {
            let surface = materials.index_of(&mesh.name);
            let base = vertices.len() as u32;

            for face in mesh.faces.iter() {
                triangles.push(Triangle {
                    surface,
                    v0: base + face[0],
                    v1: base + face[1],
                    v2: base + face[2],
                });
            }
            vertices.extend_from_slice(&mesh.vertices);
        }

        Self::new(triangles, vertices, materials.surfaces().to_vec())
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn vertices(&self) -> &[Vector3<f32>] {
        &self.vertices
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Whether `point` lies within the (loose) axis-aligned scene bounds.
    pub fn contains(&self, point: Vector3<f32>) -> bool {
        self.bounds.contains(point)
    }
}

/// One mesh of an imported model: a name, a vertex list, and triangulated
/// faces indexing into it.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vector3<f32>>,
    pub faces: Vec<[u32; 3]>,
}

/// A set of named surface materials plus the fallback surface.
///
/// The fallback always occupies index 0 and is used for every mesh whose name
/// does not match any named material.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    surfaces: Vec<Surface>,
    indices: BTreeMap<String, u32>,
}

impl MaterialLibrary {
    pub fn new(fallback: Surface) -> Self {
        Self {
            surfaces: vec![fallback],
            indices: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, surface: Surface) {
        self.surfaces.push(surface);
        self.indices.insert(
            name.to_owned(),
            (self.surfaces.len() - 1) as u32,
        );
    }

    /// The surface index for a mesh name, or 0 if no material matches.
    pub fn index_of(&self, name: &str) -> u32 {
        self.indices.get(name).cloned().unwrap_or(0)
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_surface() -> Surface {
        Surface {
            specular: Volume::splat(0.5),
            diffuse: Volume::splat(0.5),
        }
    }

    fn quad() -> (Vec<Triangle>, Vec<Vector3<f32>>) {
        let vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let triangles = vec![
            Triangle {
                surface: 0,
                v0: 0,
                v1: 1,
                v2: 2,
            },
            Triangle {
                surface: 0,
                v0: 0,
                v1: 2,
                v2: 3,
            },
        ];
        (triangles, vertices)
    }

    #[test]
    fn rejects_empty_scene() {
        match GeometryStore::new(Vec::new(), Vec::new(), vec![unit_surface()]) {
            Err(GeometryError::Empty) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let (mut triangles, vertices) = quad();
        triangles[1].v2 = 100;
        match GeometryStore::new(triangles, vertices, vec![unit_surface()]) {
            Err(GeometryError::InvalidIndex { triangle: 1 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_coefficients() {
        let (triangles, vertices) = quad();
        let surface = Surface {
            specular: Volume::splat(1.5),
            diffuse: Volume::splat(0.5),
        };
        match GeometryStore::new(triangles, vertices, vec![surface]) {
            Err(GeometryError::InvalidSurface { surface: 0 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn computes_bounds() {
        let (triangles, vertices) = quad();
        let store = GeometryStore::new(triangles, vertices, vec![unit_surface()]).unwrap();
        assert_eq!(store.bounds().min, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(store.bounds().max, Vector3::new(1.0, 1.0, 0.0));
        assert!(store.contains(Vector3::new(0.5, 0.5, 0.0)));
        assert!(!store.contains(Vector3::new(0.5, 0.5, 1.0)));
    }

    #[test]
    fn material_fallback() {
        let mut materials = MaterialLibrary::new(unit_surface());
        materials.insert(
            "brick",
            Surface {
                specular: Volume::splat(0.9),
                diffuse: Volume::splat(0.1),
            },
        );
        assert_eq!(materials.index_of("brick"), 1);
        assert_eq!(materials.index_of("unknown"), 0);

        let (_, vertices) = quad();
        let mesh = Mesh {
            name: "brick".to_owned(),
            vertices,
            faces: vec![[0, 1, 2], [0, 2, 3]],
        };
        let store = GeometryStore::from_meshes(&[mesh], &materials).unwrap();
        assert_eq!(store.triangles().len(), 2);
        assert!(store.triangles().iter().all(|t| t.surface == 1));
    }
}
