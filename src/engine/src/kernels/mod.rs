//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Device kernels and the geometric primitives they share.
//!
//! Each kernel executes one work item per ray or impulse on the device's
//! dispatch queue; work items never synchronize with each other. Ray misses
//! and shadow obstructions are expected control flow, not errors.
use cgmath::prelude::*;
use cgmath::Vector3;

use rayverb_common::{Surface, Triangle, Volume};

mod attenuate;
mod raytrace;

pub use self::attenuate::{attenuate, hrtf};
pub use self::raytrace::raytrace;

pub const SPEED_OF_SOUND: f32 = 340.0;
pub const SECONDS_PER_METER: f32 = 1.0 / SPEED_OF_SOUND;

pub(crate) const EPSILON: f32 = 0.0001;

/// Per-band air absorption per meter traveled.
const AIR_COEFFICIENT: [f32; 8] = [
    0.001 * -0.1,
    0.001 * -0.2,
    0.001 * -0.5,
    0.001 * -1.1,
    0.001 * -2.7,
    0.001 * -9.4,
    0.001 * -29.0,
    0.001 * -60.0,
];

/// A single recorded energy arrival.
///
/// `position` is the point the energy was scattered from (kept so that the
/// attenuation kernels can recover the arrival direction); `time` is seconds
/// from emission at the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    pub volume: Volume,
    pub position: Vector3<f32>,
    pub time: f32,
}

impl Impulse {
    pub fn zero() -> Self {
        Self {
            volume: Volume::zero(),
            position: Vector3::zero(),
            time: 0.0,
        }
    }
}

/// A virtual microphone with a first-order polar pattern.
///
/// `shape` blends between an omnidirectional response (0), a cardioid-like
/// response (0.5), and a figure-of-eight response (1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speaker {
    pub direction: Vector3<f32>,
    pub shape: f32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Ray {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TriangleVerts {
    pub v0: Vector3<f32>,
    pub v1: Vector3<f32>,
    pub v2: Vector3<f32>,
}

impl TriangleVerts {
    pub fn of(triangle: &Triangle, vertices: &[Vector3<f32>]) -> Self {
        Self {
            v0: vertices[triangle.v0 as usize],
            v1: vertices[triangle.v1 as usize],
            v2: vertices[triangle.v2 as usize],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Intersection {
    pub triangle: usize,
    pub distance: f32,
}

/// The distance to a triangle along a ray, by the Möller-Trumbore test.
///
/// Returns 0 on a miss or when the determinant is within ±ε (degenerate or
/// parallel geometry is silently skipped).
pub(crate) fn triangle_vert_intersection(t: &TriangleVerts, ray: &Ray) -> f32 {
    let e0 = t.v1 - t.v0;
    let e1 = t.v2 - t.v0;

    let pvec = ray.direction.cross(e1);
    let det = e0.dot(pvec);

    if -EPSILON < det && det < EPSILON {
        return 0.0;
    }

    let invdet = 1.0 / det;
    let tvec = ray.position - t.v0;
    let ucomp = invdet * tvec.dot(pvec);

    if ucomp < 0.0 || 1.0 < ucomp {
        return 0.0;
    }

    let qvec = tvec.cross(e0);
    let vcomp = invdet * ray.direction.dot(qvec);

    if vcomp < 0.0 || 1.0 < vcomp + ucomp {
        return 0.0;
    }

    invdet * e1.dot(qvec)
}

pub(crate) fn triangle_intersection(
    triangle: &Triangle,
    vertices: &[Vector3<f32>],
    ray: &Ray,
) -> f32 {
    triangle_vert_intersection(&TriangleVerts::of(triangle, vertices), ray)
}

pub(crate) fn triangle_verts_normal(t: &TriangleVerts) -> Vector3<f32> {
    let e0 = t.v1 - t.v0;
    let e1 = t.v2 - t.v0;
    e0.cross(e1).normalize()
}

pub(crate) fn triangle_normal(triangle: &Triangle, vertices: &[Vector3<f32>]) -> Vector3<f32> {
    triangle_verts_normal(&TriangleVerts::of(triangle, vertices))
}

pub(crate) fn reflect(normal: Vector3<f32>, direction: Vector3<f32>) -> Vector3<f32> {
    direction - normal * (2.0 * direction.dot(normal))
}

/// The nearest triangle pierced by `ray`, if any.
pub(crate) fn ray_triangle_intersection(
    ray: &Ray,
    triangles: &[Triangle],
    vertices: &[Vector3<f32>],
) -> Option<Intersection> {
    let mut ret: Option<Intersection> = None;
    for (i, triangle) in triangles.iter().enumerate() {
        let distance = triangle_intersection(triangle, vertices, ray);
        if distance > EPSILON && ret.map_or(true, |x| distance < x.distance) {
            ret = Some(Intersection {
                triangle: i,
                distance,
            });
        }
    }
    ret
}

/// Mirror a point across the plane of a triangle.
pub(crate) fn mirror_point(p: Vector3<f32>, t: &TriangleVerts) -> Vector3<f32> {
    let n = triangle_verts_normal(t);
    let dist = n.dot(p - t.v0);
    p - n * (dist * 2.0)
}

pub(crate) fn mirror_verts(verts: &TriangleVerts, t: &TriangleVerts) -> TriangleVerts {
    TriangleVerts {
        v0: mirror_point(verts.v0, t),
        v1: mirror_point(verts.v1, t),
        v2: mirror_point(verts.v2, t),
    }
}

pub(crate) fn air_attenuation_for_distance(distance: f32) -> Volume {
    let mut lanes = [0.0; 8];
    for (lane, coefficient) in lanes.iter_mut().zip(AIR_COEFFICIENT.iter()) {
        *lane = (distance * coefficient).exp();
    }
    Volume::new(lanes)
}

pub(crate) fn power_attenuation_for_distance(distance: f32) -> f32 {
    1.0 / (distance * distance)
}

/// Combined air absorption and inverse-square attenuation over a path of the
/// given length.
pub(crate) fn attenuation_for_distance(distance: f32) -> Volume {
    air_attenuation_for_distance(distance) * power_attenuation_for_distance(distance)
}

/// The scalar polar response of a speaker for a toward-source direction.
///
/// A degenerate direction (the direct path is recorded at the receiver
/// itself) passes the energy through unscaled.
pub(crate) fn speaker_attenuation(speaker: &Speaker, direction: Vector3<f32>) -> f32 {
    let mag = direction.magnitude();
    if mag <= EPSILON {
        return 1.0;
    }
    (1.0 - speaker.shape) +
        speaker.shape * (direction / mag).dot(speaker.direction.normalize())
}

pub(crate) fn lookup_surface<'a>(surfaces: &'a [Surface], triangle: &Triangle) -> &'a Surface {
    &surfaces[triangle.surface as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy_triangle() -> TriangleVerts {
        TriangleVerts {
            v0: Vector3::new(-1.0, -1.0, 0.0),
            v1: Vector3::new(3.0, -1.0, 0.0),
            v2: Vector3::new(-1.0, 3.0, 0.0),
        }
    }

    #[test]
    fn intersects_triangle_straight_on() {
        let ray = Ray {
            position: Vector3::new(0.0, 0.0, 5.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        assert_eq!(triangle_vert_intersection(&xy_triangle(), &ray), 5.0);
    }

    #[test]
    fn misses_triangle_outside_bounds() {
        let ray = Ray {
            position: Vector3::new(10.0, 10.0, 5.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        assert_eq!(triangle_vert_intersection(&xy_triangle(), &ray), 0.0);
    }

    #[test]
    fn skips_parallel_rays() {
        let ray = Ray {
            position: Vector3::new(0.0, 0.0, 5.0),
            direction: Vector3::new(1.0, 0.0, 0.0),
        };
        assert_eq!(triangle_vert_intersection(&xy_triangle(), &ray), 0.0);
    }

    #[test]
    fn reflects_across_normal() {
        let n = Vector3::new(0.0, 0.0, 1.0);
        let d = Vector3::new(1.0, 0.0, -1.0);
        assert_eq!(reflect(n, d), Vector3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn mirrors_points() {
        let mirrored = mirror_point(Vector3::new(0.5, 0.5, 3.0), &xy_triangle());
        assert_eq!(mirrored, Vector3::new(0.5, 0.5, -3.0));
    }

    #[test]
    fn attenuation_is_bounded_and_decreasing() {
        let mut previous = Volume::splat(f32::INFINITY);
        for i in 1..100 {
            let d = i as f32 * 0.5;
            let v = attenuation_for_distance(d);
            for (lane, prev) in v.get_ref().iter().zip(previous.get_ref().iter()) {
                assert!(*lane > 0.0, "lane not positive at distance {}", d);
                if d >= 1.0 {
                    assert!(*lane <= 1.0, "lane above unity at distance {}", d);
                }
                assert!(lane < prev, "lane not decreasing at distance {}", d);
            }
            previous = v;
        }
    }

    #[test]
    fn speaker_polar_patterns() {
        let speaker = |shape| {
            Speaker {
                direction: Vector3::new(0.0, 0.0, 1.0),
                shape,
            }
        };
        let front = Vector3::new(0.0, 0.0, 10.0);
        let back = Vector3::new(0.0, 0.0, -10.0);
        let side = Vector3::new(10.0, 0.0, 0.0);

        assert_eq!(speaker_attenuation(&speaker(0.0), front), 1.0);
        assert_eq!(speaker_attenuation(&speaker(0.0), back), 1.0);

        assert_eq!(speaker_attenuation(&speaker(0.5), front), 1.0);
        assert_eq!(speaker_attenuation(&speaker(0.5), back), 0.0);
        assert_eq!(speaker_attenuation(&speaker(0.5), side), 0.5);

        assert_eq!(speaker_attenuation(&speaker(1.0), front), 1.0);
        assert_eq!(speaker_attenuation(&speaker(1.0), back), -1.0);
        assert_eq!(speaker_attenuation(&speaker(1.0), side), 0.0);
    }
}
