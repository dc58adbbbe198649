//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Shared fixtures for the end-to-end tests.
use rayverb::cgmath::Vector3;
use rayverb::common::{GeometryStore, Surface, Triangle, Volume};
use rayverb::engine::Impulse;

pub const MIC: [f32; 3] = [0.0, 2.0, 0.0];
pub const SOURCE: [f32; 3] = [0.0, 2.0, 2.0];

/// A closed box room spanning x in [-25, 25], y in [0, 27], z in [-27, 27],
/// with a uniform material on every wall.
pub fn box_scene() -> GeometryStore {
    let vertices = vec![
        Vector3::new(-25.0, 0.0, -27.0),
        Vector3::new(25.0, 0.0, -27.0),
        Vector3::new(25.0, 0.0, 27.0),
        Vector3::new(-25.0, 0.0, 27.0),
        Vector3::new(-25.0, 27.0, -27.0),
        Vector3::new(25.0, 27.0, -27.0),
        Vector3::new(25.0, 27.0, 27.0),
        Vector3::new(-25.0, 27.0, 27.0),
    ];

    let faces: [[u32; 3]; 12] = [
        [0, 1, 2],
        [0, 2, 3],
        [4, 6, 5],
        [4, 7, 6],
        [0, 4, 5],
        [0, 5, 1],
        [3, 2, 6],
        [3, 6, 7],
        [0, 3, 7],
        [0, 7, 4],
        [1, 5, 6],
        [1, 6, 2],
    ];
    let triangles = faces
        .iter()
        .map(|f| {
            Triangle {
                surface: 0,
                v0: f[0],
                v1: f[1],
                v2: f[2],
            }
        })
        .collect();

    let surfaces = vec![
        Surface {
            specular: Volume::splat(0.95),
            diffuse: Volume::splat(0.95),
        },
    ];

    GeometryStore::new(triangles, vertices, surfaces).unwrap()
}

/// One ray along each cardinal axis.
pub fn cardinal_directions() -> Vec<Vector3<f32>> {
    vec![
        Vector3::new(0.0, 0.0, -1.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, -1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
    ]
}

pub fn mic() -> Vector3<f32> {
    Vector3::from(MIC)
}

pub fn source() -> Vector3<f32> {
    Vector3::from(SOURCE)
}

pub fn assert_vec3_approx_eq(got: Vector3<f32>, expected: Vector3<f32>) {
    let diff = got - expected;
    let err = diff.x.abs().max(diff.y.abs()).max(diff.z.abs());
    assert!(
        err < 1.0e-4,
        "expected {:?}, got {:?} (err {})",
        expected,
        got,
        err
    );
}

pub fn audible(impulses: &[Impulse]) -> Vec<&Impulse> {
    impulses.iter().filter(|i| !i.volume.is_zero()).collect()
}
