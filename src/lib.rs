//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Rayverb
//! =======
//!
//! An offline acoustic impulse response generator. Given a triangle mesh
//! with per-surface acoustic materials, a source point, and a receiver
//! point, it produces a multi-channel impulse response suitable for
//! convolution reverb: specular early reflections are reconstructed with the
//! image-source method while a stochastic ray trace gathers the diffuse
//! tail, all in eight parallel octave bands.
//!
//! The pipeline runs as a series of value hand-offs:
//!
//! ```text
//! GeometryStore -> Raytracer -> raw impulses -> attenuator -> flattener
//!     -> filter bank -> per-channel waveforms
//! ```
//!
//! `render_impulse_response` drives the whole chain from a parsed
//! [`RenderConfig`](config::RenderConfig).
pub extern crate cgmath;
pub extern crate rayverb_common as common;
pub extern crate rayverb_engine as engine;
pub extern crate rayverb_filters as filters;
pub extern crate rayverb_hrtf_data as hrtf_data;

pub mod config;
mod render;

pub use crate::render::{render_impulse_response, RenderError};
