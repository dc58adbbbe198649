//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! The ray tracing kernel.
use arrayvec::ArrayVec;
use cgmath::prelude::*;
use cgmath::Vector3;

use rayverb_common::dispatch::Queue;
use rayverb_common::{Surface, Triangle, Volume};

use super::{
    attenuation_for_distance, lookup_surface, mirror_point, mirror_verts, ray_triangle_intersection,
    reflect, triangle_normal, triangle_vert_intersection, Impulse, Ray, TriangleVerts, EPSILON,
    SECONDS_PER_METER,
};
use crate::NUM_IMAGE_SOURCE;

struct SendPtr<T>(*mut T);

unsafe impl<T> Sync for SendPtr<T> {}
unsafe impl<T> Send for SendPtr<T> {}

/// Launch the ray tracing kernel with one work item per direction.
///
/// Work item `i` traces `nreflections` bounces of the ray leaving `source`
/// along `directions[i]`, writing one diffuse impulse per bounce into
/// `diffuse_out[i * nreflections ..]` and up to `NUM_IMAGE_SOURCE`
/// image-source impulses (the direct path in the first slot) into
/// `image_out[i * NUM_IMAGE_SOURCE ..]`. `image_index_out` receives, for
/// every image impulse, the pierced triangle index plus one; the ordered
/// index list uniquely identifies a specular path.
pub fn raytrace<Q: Queue>(
    queue: &Q,
    directions: &[Vector3<f32>],
    mic_pos: Vector3<f32>,
    triangles: &[Triangle],
    vertices: &[Vector3<f32>],
    source: Vector3<f32>,
    surfaces: &[Surface],
    diffuse_out: &mut [Impulse],
    image_out: &mut [Impulse],
    image_index_out: &mut [u32],
    nreflections: usize,
) {
    assert_eq!(diffuse_out.len(), directions.len() * nreflections);
    assert_eq!(image_out.len(), directions.len() * NUM_IMAGE_SOURCE);
    assert_eq!(image_index_out.len(), directions.len() * NUM_IMAGE_SOURCE);

    let diffuse = SendPtr(diffuse_out.as_mut_ptr());
    let image = SendPtr(image_out.as_mut_ptr());
    let image_index = SendPtr(image_index_out.as_mut_ptr());

    // Every work item writes to its own disjoint stride of the output
    // buffers, indexed by the work item number.
    queue.apply(directions.len(), |i| {
        let diffuse = unsafe {
            ::std::slice::from_raw_parts_mut(diffuse.0.add(i * nreflections), nreflections)
        };
        let image = unsafe {
            ::std::slice::from_raw_parts_mut(image.0.add(i * NUM_IMAGE_SOURCE), NUM_IMAGE_SOURCE)
        };
        let image_index = unsafe {
            ::std::slice::from_raw_parts_mut(
                image_index.0.add(i * NUM_IMAGE_SOURCE),
                NUM_IMAGE_SOURCE,
            )
        };
        trace_ray(
            directions[i],
            mic_pos,
            triangles,
            vertices,
            source,
            surfaces,
            diffuse,
            image,
            image_index,
        );
    });
}

fn trace_ray(
    direction: Vector3<f32>,
    mic_pos: Vector3<f32>,
    triangles: &[Triangle],
    vertices: &[Vector3<f32>],
    source: Vector3<f32>,
    surfaces: &[Surface],
    diffuse: &mut [Impulse],
    image: &mut [Impulse],
    image_index: &mut [u32],
) {
    let mut ray = Ray {
        position: source,
        direction,
    };
    let mut distance = 0.0f32;
    let mut volume = Volume::one();

    // Image-source state: the microphone image mirrored through every
    // surface struck so far, and the mirrored planes themselves.
    let mut mic_reflection = mic_pos;
    let mut prev_primitives: ArrayVec<TriangleVerts, NUM_IMAGE_SOURCE> = ArrayVec::new();
    let mut prev_triangles: ArrayVec<u32, NUM_IMAGE_SOURCE> = ArrayVec::new();

    // The direct path occupies the first image-source slot of every ray and
    // is keyed by index 0; the tracer collapses the copies.
    let direct_distance = (mic_pos - source).magnitude();
    image[0] = Impulse {
        volume: attenuation_for_distance(direct_distance),
        position: mic_pos,
        time: direct_distance * SECONDS_PER_METER,
    };
    image_index[0] = 0;

    for index in 0..diffuse.len() {
        let closest = match ray_triangle_intersection(&ray, triangles, vertices) {
            Some(x) => x,
            None => break,
        };
        let triangle = &triangles[closest.triangle];

        if index < NUM_IMAGE_SOURCE - 1 {
            // Mirror the struck triangle through every previously stored
            // plane, newest first, then mirror the microphone image through
            // the result.
            let mut current = TriangleVerts::of(triangle, vertices);
            for prev in prev_primitives.iter().rev() {
                current = mirror_verts(&current, prev);
            }
            prev_primitives.push(current);
            prev_triangles.push(closest.triangle as u32);

            mic_reflection = mirror_point(mic_reflection, &current);

            let diff = mic_reflection - source;
            let dist = diff.magnitude();

            if dist > EPSILON &&
                valid_image_path(
                    source,
                    diff / dist,
                    mic_pos,
                    &prev_primitives,
                    &prev_triangles,
                    triangles,
                    vertices,
                )
            {
                image[index + 1] = Impulse {
                    volume: volume * attenuation_for_distance(dist),
                    position: source + mic_pos - mic_reflection,
                    time: dist * SECONDS_PER_METER,
                };
                image_index[index + 1] = closest.triangle as u32 + 1;
            }
        }

        let intersection = ray.position + ray.direction * closest.distance;
        let new_dist = distance + closest.distance;
        let surface = lookup_surface(surfaces, triangle);
        let normal = triangle_normal(triangle, vertices);

        // Scatter energy straight at the receiver unless the path is
        // shadowed by other geometry. A shadowed slot is still written; the
        // flattener skips zero-volume entries.
        let to_mic = mic_pos - intersection;
        let mag = to_mic.magnitude();
        diffuse[index] = if mag > EPSILON {
            let shadow_dir = to_mic / mag;
            let shadow = Ray {
                position: intersection,
                direction: shadow_dir,
            };
            let unobstructed = ray_triangle_intersection(&shadow, triangles, vertices)
                .map_or(true, |hit| hit.distance > mag);
            if unobstructed {
                let total = new_dist + mag;
                Impulse {
                    volume: volume * attenuation_for_distance(total) * surface.diffuse *
                        normal.dot(shadow_dir).abs(),
                    position: intersection,
                    time: total * SECONDS_PER_METER,
                }
            } else {
                Impulse {
                    volume: Volume::zero(),
                    position: intersection,
                    time: 0.0,
                }
            }
        } else {
            Impulse {
                volume: Volume::zero(),
                position: intersection,
                time: 0.0,
            }
        };

        ray = Ray {
            position: intersection,
            direction: reflect(normal, ray.direction),
        };
        distance = new_dist;
        // The sign flip models the 180 degree phase change of a specular
        // reflection.
        volume = -volume * surface.specular;
    }
}

/// Validate a specular path from the source to the mirrored microphone.
///
/// The straight ray must pierce every stored plane in order, each pierce
/// strictly beyond the previous one, with no other triangle obstructing the
/// segments between consecutive pierce points nor the final segment to the
/// receiver.
fn valid_image_path(
    source: Vector3<f32>,
    direction: Vector3<f32>,
    mic_pos: Vector3<f32>,
    planes: &[TriangleVerts],
    plane_triangles: &[u32],
    triangles: &[Triangle],
    vertices: &[Vector3<f32>],
) -> bool {
    let ray = Ray {
        position: source,
        direction,
    };

    let mut prev_t = 0.0f32;
    let mut prev_point = source;
    let mut prev_triangle = None;

    for (plane, &plane_triangle) in planes.iter().zip(plane_triangles.iter()) {
        let t = triangle_vert_intersection(plane, &ray);
        if t <= EPSILON || t <= prev_t {
            return false;
        }

        let point = source + direction * t;
        if segment_obstructed(
            prev_point,
            point,
            triangles,
            vertices,
            prev_triangle,
            Some(plane_triangle),
        )
        {
            return false;
        }

        prev_t = t;
        prev_point = point;
        prev_triangle = Some(plane_triangle);
    }

    !segment_obstructed(
        prev_point,
        mic_pos,
        triangles,
        vertices,
        prev_triangle,
        None,
    )
}

/// Whether any triangle other than the excluded endpoints blocks the open
/// segment between two points.
fn segment_obstructed(
    from: Vector3<f32>,
    to: Vector3<f32>,
    triangles: &[Triangle],
    vertices: &[Vector3<f32>],
    exclude_a: Option<u32>,
    exclude_b: Option<u32>,
) -> bool {
    let diff = to - from;
    let len = diff.magnitude();
    if len <= EPSILON {
        return false;
    }

    let ray = Ray {
        position: from,
        direction: diff / len,
    };

    for (i, triangle) in triangles.iter().enumerate() {
        let i = i as u32;
        if Some(i) == exclude_a || Some(i) == exclude_b {
            continue;
        }
        let t = super::triangle_intersection(triangle, vertices, &ray);
        if t > EPSILON && t < len - EPSILON {
            return true;
        }
    }

    false
}
