//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Drives the ray tracing kernel over fixed-size ray groups and collects the
//! raw results.
use cgmath::prelude::*;
use cgmath::Vector3;
use log::{debug, warn};
use std::cmp::min;
use std::collections::BTreeMap;

use rayverb_common::dispatch::{ConcurrentQueue, Queue};
use rayverb_common::{GeometryStore, Surface, Triangle};

use crate::device::{Buffer, Device, DeviceError};
use crate::kernels::{self, Impulse};
use crate::{NUM_IMAGE_SOURCE, RAY_GROUP_SIZE};

/// A raw impulse set produced by a trace, together with the receiver
/// position it was traced against.
#[derive(Debug, Clone)]
pub struct RaytracerResults {
    pub impulses: Vec<Impulse>,
    pub mic: Vector3<f32>,
}

/// The ray tracing driver.
///
/// A `Raytracer` is built once for a piece of geometry, which stays immutable
/// (and resident on the device) for the tracer's whole lifetime. Per-group
/// scratch buffers are allocated up front and reused by every batch.
pub struct Raytracer<Q: Queue = ConcurrentQueue> {
    device: Device<Q>,
    geometry: GeometryStore,
    nreflections: usize,

    triangles: Buffer<Triangle>,
    vertices: Buffer<Vector3<f32>>,
    surfaces: Buffer<Surface>,

    directions: Buffer<Vector3<f32>>,
    diffuse: Buffer<Impulse>,
    image: Buffer<Impulse>,
    image_index: Buffer<u32>,

    stored_diffuse: Vec<Impulse>,
    image_tally: BTreeMap<Vec<u32>, Impulse>,
    mic: Vector3<f32>,
}

impl Raytracer<ConcurrentQueue> {
    pub fn new(geometry: GeometryStore, nreflections: usize) -> Result<Self, DeviceError> {
        Self::with_queue(geometry, nreflections, ConcurrentQueue)
    }
}

impl<Q: Queue> Raytracer<Q> {
    pub fn with_queue(
        geometry: GeometryStore,
        nreflections: usize,
        queue: Q,
    ) -> Result<Self, DeviceError> {
        assert!(nreflections > 0);

        let device = Device::new(queue);

        let triangles = device.buffer_from(geometry.triangles())?;
        let vertices = device.buffer_from(geometry.vertices())?;
        let surfaces = device.buffer_from(geometry.surfaces())?;

        let directions = device.buffer(RAY_GROUP_SIZE, Vector3::zero())?;
        let diffuse = device.buffer(RAY_GROUP_SIZE * nreflections, Impulse::zero())?;
        let image = device.buffer(RAY_GROUP_SIZE * NUM_IMAGE_SOURCE, Impulse::zero())?;
        let image_index = device.buffer(RAY_GROUP_SIZE * NUM_IMAGE_SOURCE, 0u32)?;

        Ok(Self {
            device,
            geometry,
            nreflections,
            triangles,
            vertices,
            surfaces,
            directions,
            diffuse,
            image,
            image_index,
            stored_diffuse: Vec::new(),
            image_tally: BTreeMap::new(),
            mic: Vector3::zero(),
        })
    }

    pub fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    /// Trace every direction from `source` toward the scene, recording
    /// diffuse contributions and deduplicated image-source paths for the
    /// receiver at `mic_pos`.
    ///
    /// The directions are processed in groups of `RAY_GROUP_SIZE`; a partial
    /// final group is padded with zero directions, which trace nothing.
    /// Results of any previous trace are discarded.
    pub fn trace(
        &mut self,
        mic_pos: Vector3<f32>,
        source: Vector3<f32>,
        directions: &[Vector3<f32>],
    ) -> Result<(), DeviceError> {
        if !self.geometry.contains(mic_pos) {
            warn!(
                "receiver position {:?} may be outside the model bounds {:?}",
                mic_pos,
                self.geometry.bounds()
            );
        }
        if !self.geometry.contains(source) {
            warn!(
                "source position {:?} may be outside the model bounds {:?}",
                source,
                self.geometry.bounds()
            );
        }

        self.mic = mic_pos;
        self.stored_diffuse.clear();
        self.image_tally.clear();

        self.stored_diffuse
            .try_reserve_exact(directions.len() * self.nreflections)
            .map_err(|_| {
                DeviceError::Allocation {
                    bytes: directions.len() * self.nreflections * ::std::mem::size_of::<Impulse>(),
                }
            })?;

        let ngroups = (directions.len() + RAY_GROUP_SIZE - 1) / RAY_GROUP_SIZE;

        let mut diffuse_host = vec![Impulse::zero(); self.diffuse.len()];
        let mut image_host = vec![Impulse::zero(); self.image.len()];
        let mut index_host = vec![0u32; self.image_index.len()];

        for group in 0..ngroups {
            let start = group * RAY_GROUP_SIZE;
            let end = min(start + RAY_GROUP_SIZE, directions.len());
            let batch = &directions[start..end];

            self.directions.fill(Vector3::zero());
            self.directions.write(batch);
            self.diffuse.fill(Impulse::zero());
            self.image.fill(Impulse::zero());
            self.image_index.fill(0);

            kernels::raytrace(
                self.device.queue(),
                self.directions.as_slice(),
                mic_pos,
                self.triangles.as_slice(),
                self.vertices.as_slice(),
                source,
                self.surfaces.as_slice(),
                self.diffuse.as_mut_slice(),
                self.image.as_mut_slice(),
                self.image_index.as_mut_slice(),
                self.nreflections,
            );

            self.image.read(&mut image_host);
            self.image_index.read(&mut index_host);

            // Collapse specular paths discovered by more than one ray. The
            // ordered pierced-triangle list is the unique key; the first
            // impulse seen for a key wins.
            for ray in 0..RAY_GROUP_SIZE {
                let base = ray * NUM_IMAGE_SOURCE;
                for depth in 1..=NUM_IMAGE_SOURCE {
                    let key = &index_host[base..base + depth];
                    if depth == 1 || key[depth - 1] != 0 {
                        if !self.image_tally.contains_key(key) {
                            self.image_tally
                                .insert(key.to_vec(), image_host[base + depth - 1]);
                        }
                    }
                }
            }

            self.diffuse.read(&mut diffuse_host);
            self.stored_diffuse
                .extend_from_slice(&diffuse_host[..batch.len() * self.nreflections]);
        }

        debug!(
            "traced {} rays in {} groups, {} unique image-source paths",
            directions.len(),
            ngroups,
            self.image_tally.len()
        );

        Ok(())
    }

    /// The diffuse impulses of the last trace, one per ray and reflection.
    pub fn raw_diffuse(&self) -> RaytracerResults {
        RaytracerResults {
            impulses: self.stored_diffuse.clone(),
            mic: self.mic,
        }
    }

    /// The deduplicated image-source impulses of the last trace, padded with
    /// zero impulses to a multiple of the attenuators' batch size.
    pub fn raw_images(&self, remove_direct: bool) -> RaytracerResults {
        let mut impulses: Vec<Impulse> = self.image_tally
            .iter()
            .filter(|&(key, _)| !(remove_direct && key.len() == 1))
            .map(|(_, impulse)| *impulse)
            .collect();

        let multiple = RAY_GROUP_SIZE * NUM_IMAGE_SOURCE;
        let padded = (impulses.len() + multiple - 1) / multiple * multiple;
        impulses.resize(padded, Impulse::zero());

        RaytracerResults {
            impulses,
            mic: self.mic,
        }
    }

    /// Diffuse and image-source impulses concatenated.
    pub fn all_raw(&self, remove_direct: bool) -> RaytracerResults {
        let mut results = self.raw_diffuse();
        results.impulses.extend(self.raw_images(remove_direct).impulses);
        results
    }
}
