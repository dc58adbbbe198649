//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Rayverb engine
//! ==============
//!
//! The data-parallel core of the impulse response generator: a software SIMT
//! device, the ray tracing and attenuation kernels that run on it, the tracer
//! that drives them batch by batch, and the flattener that bins the resulting
//! impulses onto a sample grid.
extern crate arrayvec;
extern crate cgmath;
extern crate log;
extern crate rayverb_common;
extern crate rayverb_hrtf_data;
extern crate thiserror;

pub mod attenuator;
pub mod device;
pub mod flattener;
pub mod kernels;
pub mod tracer;

pub use crate::attenuator::{HrtfAttenuator, SpeakerAttenuator};
pub use crate::device::{Buffer, Device, DeviceError};
pub use crate::kernels::{Impulse, Speaker, SPEED_OF_SOUND};
pub use crate::tracer::{Raytracer, RaytracerResults};

/// The number of rays processed by one kernel launch.
pub const RAY_GROUP_SIZE: usize = 4096;

/// The maximum order of the image-source early reflection model.
pub const NUM_IMAGE_SOURCE: usize = 10;
