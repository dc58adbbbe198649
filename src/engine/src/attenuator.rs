//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Receiver models applied to raw impulse sets.
//!
//! Both attenuators stream their input through fixed-size device buffers.
//! The chunking is stride-agnostic: a chunk may straddle the seam between
//! the diffuse and image sections of `all_raw`, or cut a ray's stride in
//! half, because the kernels are stateless and purely per-impulse. A future
//! kernel that carries state across impulses must chunk on the section
//! boundaries instead.
use cgmath::Vector3;
use std::cmp::min;

use rayverb_common::dispatch::{ConcurrentQueue, Queue};
use rayverb_hrtf_data::{self, NUM_CHANNELS};

use crate::device::{Buffer, Device, DeviceError};
use crate::kernels::{self, Impulse, Speaker};
use crate::tracer::RaytracerResults;
use crate::{NUM_IMAGE_SOURCE, RAY_GROUP_SIZE};

/// The number of impulses streamed through the device per launch.
///
/// The value only sizes the scratch buffers; chunk boundaries carry no
/// meaning because attenuation is stateless per impulse (see the module
/// doc).
const CHUNK_SIZE: usize = RAY_GROUP_SIZE * NUM_IMAGE_SOURCE;

/// Applies a speaker polar pattern, producing one attenuated impulse stream
/// per speaker. The raw input is left untouched.
pub struct SpeakerAttenuator<Q: Queue = ConcurrentQueue> {
    device: Device<Q>,
    input: Buffer<Impulse>,
    output: Buffer<Impulse>,
}

impl SpeakerAttenuator<ConcurrentQueue> {
    pub fn new() -> Result<Self, DeviceError> {
        Self::with_queue(ConcurrentQueue)
    }
}

impl<Q: Queue> SpeakerAttenuator<Q> {
    pub fn with_queue(queue: Q) -> Result<Self, DeviceError> {
        let device = Device::new(queue);
        let input = device.buffer(CHUNK_SIZE, Impulse::zero())?;
        let output = device.buffer(CHUNK_SIZE, Impulse::zero())?;
        Ok(Self {
            device,
            input,
            output,
        })
    }

    pub fn attenuate(
        &mut self,
        results: &RaytracerResults,
        speakers: &[Speaker],
    ) -> Vec<Vec<Impulse>> {
        speakers
            .iter()
            .map(|speaker| self.attenuate_one(results, speaker))
            .collect()
    }

    fn attenuate_one(&mut self, results: &RaytracerResults, speaker: &Speaker) -> Vec<Impulse> {
        let mut ret = vec![Impulse::zero(); results.impulses.len()];

        let mut offset = 0;
        while offset < results.impulses.len() {
            let end = min(offset + CHUNK_SIZE, results.impulses.len());
            let chunk = &results.impulses[offset..end];

            self.input.write(chunk);
            kernels::attenuate(
                self.device.queue(),
                results.mic,
                &self.input.as_slice()[..chunk.len()],
                &mut self.output.as_mut_slice()[..chunk.len()],
                speaker,
            );
            self.output.read(&mut ret[offset..end]);

            offset = end;
        }

        ret
    }
}

/// Applies the compiled-in head-related transfer function, producing a left
/// and a right impulse stream.
pub struct HrtfAttenuator<Q: Queue = ConcurrentQueue> {
    device: Device<Q>,
    input: Buffer<Impulse>,
    output: Buffer<Impulse>,
}

impl HrtfAttenuator<ConcurrentQueue> {
    pub fn new() -> Result<Self, DeviceError> {
        Self::with_queue(ConcurrentQueue)
    }
}

impl<Q: Queue> HrtfAttenuator<Q> {
    pub fn with_queue(queue: Q) -> Result<Self, DeviceError> {
        let device = Device::new(queue);
        let input = device.buffer(CHUNK_SIZE, Impulse::zero())?;
        let output = device.buffer(CHUNK_SIZE, Impulse::zero())?;
        Ok(Self {
            device,
            input,
            output,
        })
    }

    /// Attenuate for both ears of a listener facing `facing`.
    ///
    /// Returns one impulse stream per channel, left first.
    pub fn attenuate(
        &mut self,
        results: &RaytracerResults,
        facing: Vector3<f32>,
        up: Vector3<f32>,
    ) -> Vec<Vec<Impulse>> {
        (0..NUM_CHANNELS)
            .map(|channel| self.attenuate_one(results, facing, up, channel))
            .collect()
    }

    fn attenuate_one(
        &mut self,
        results: &RaytracerResults,
        facing: Vector3<f32>,
        up: Vector3<f32>,
        channel: usize,
    ) -> Vec<Impulse> {
        let table = rayverb_hrtf_data::table();
        let mut ret = vec![Impulse::zero(); results.impulses.len()];

        let mut offset = 0;
        while offset < results.impulses.len() {
            let end = min(offset + CHUNK_SIZE, results.impulses.len());
            let chunk = &results.impulses[offset..end];

            self.input.write(chunk);
            kernels::hrtf(
                self.device.queue(),
                results.mic,
                &self.input.as_slice()[..chunk.len()],
                &mut self.output.as_mut_slice()[..chunk.len()],
                table,
                facing,
                up,
                channel,
            );
            self.output.read(&mut ret[offset..end]);

            offset = end;
        }

        ret
    }
}
