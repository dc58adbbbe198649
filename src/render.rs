//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! The complete render pipeline: trace, attenuate, flatten, filter.
use cgmath::Vector3;
use thiserror::Error;

use rayverb_common::{GeometryError, GeometryStore};
use rayverb_engine::flattener::{fix_predelay, flatten_channels};
use rayverb_engine::{
    DeviceError, HrtfAttenuator, Raytracer, RaytracerResults, SpeakerAttenuator,
};
use rayverb_filters::process;

use crate::config::{AttenuationModel, OutputMode, RenderConfig};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Render the impulse response described by `config` for the given geometry
/// and ray directions.
///
/// Returns one waveform per output channel at the configured sample rate.
pub fn render_impulse_response(
    config: &RenderConfig,
    geometry: GeometryStore,
    directions: &[Vector3<f32>],
) -> Result<Vec<Vec<f32>>, RenderError> {
    let mut tracer = Raytracer::new(geometry, config.reflections)?;
    tracer.trace(config.mic(), config.source(), directions)?;

    let results: RaytracerResults = match config.output_mode {
        OutputMode::All => tracer.all_raw(config.remove_direct),
        OutputMode::ImageOnly => tracer.raw_images(config.remove_direct),
        OutputMode::DiffuseOnly => tracer.raw_diffuse(),
    };

    let mut attenuated = match config.attenuation_model {
        AttenuationModel::Speakers(ref speakers) => {
            let speakers: Vec<_> = speakers.iter().map(|s| s.to_speaker()).collect();
            SpeakerAttenuator::new()?.attenuate(&results, &speakers)
        }
        AttenuationModel::Hrtf(ref hrtf) => {
            HrtfAttenuator::new()?.attenuate(&results, hrtf.facing(), hrtf.up())
        }
    };

    if config.trim_predelay {
        fix_predelay(&mut attenuated);
    }

    let flattened = flatten_channels(&attenuated, config.sample_rate);

    Ok(process(
        config.filter_kind(),
        flattened,
        config.sample_rate,
        config.normalize,
        config.hipass,
        config.trim_tail,
        config.volume_scale,
    ))
}
