//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! JSON render configuration and material files.
use cgmath::prelude::*;
use cgmath::Vector3;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use rayverb_common::{MaterialLibrary, Surface, Volume};
use rayverb_engine::{Speaker, RAY_GROUP_SIZE};
use rayverb_filters::FilterKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for key {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// The top-level render configuration.
///
/// Unrecognized keys and mistyped values are rejected by the parser;
/// `parse_config` additionally checks the numeric constraints that JSON
/// cannot express.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    pub rays: usize,
    pub reflections: usize,
    pub sample_rate: f64,
    pub bit_depth: u32,
    pub source_position: [f32; 3],
    pub mic_position: [f32; 3],
    pub attenuation_model: AttenuationModel,

    #[serde(default = "default_filter")]
    pub filter: FilterConfig,
    #[serde(default)]
    pub hipass: bool,
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default = "default_volume_scale")]
    pub volume_scale: f32,
    #[serde(default)]
    pub trim_predelay: bool,
    #[serde(default)]
    pub remove_direct: bool,
    #[serde(default = "default_true")]
    pub trim_tail: bool,
    #[serde(default)]
    pub output_mode: OutputMode,
    #[serde(default)]
    pub verbose: bool,
}

fn default_filter() -> FilterConfig {
    FilterConfig::Onepass
}

fn default_true() -> bool {
    true
}

fn default_volume_scale() -> f32 {
    1.0
}

/// The receiver model. Exactly one of the two variants must be present in
/// the configuration object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttenuationModel {
    Speakers(Vec<SpeakerConfig>),
    Hrtf(HrtfConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeakerConfig {
    pub direction: [f32; 3],
    pub shape: f32,
}

impl SpeakerConfig {
    pub fn to_speaker(&self) -> Speaker {
        Speaker {
            direction: Vector3::from(self.direction),
            shape: self.shape,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HrtfConfig {
    pub facing: [f32; 3],
    pub up: [f32; 3],
}

impl HrtfConfig {
    pub fn facing(&self) -> Vector3<f32> {
        Vector3::from(self.facing)
    }

    pub fn up(&self) -> Vector3<f32> {
        Vector3::from(self.up)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterConfig {
    Sinc,
    Onepass,
    Twopass,
    LinkwitzRiley,
}

impl FilterConfig {
    pub fn kind(&self) -> FilterKind {
        match *self {
            FilterConfig::Sinc => FilterKind::WindowedSinc,
            FilterConfig::Onepass => FilterKind::BiquadOnepass,
            FilterConfig::Twopass => FilterKind::BiquadTwopass,
            FilterConfig::LinkwitzRiley => FilterKind::LinkwitzRiley,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    All,
    ImageOnly,
    DiffuseOnly,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::All
    }
}

impl RenderConfig {
    pub fn source(&self) -> Vector3<f32> {
        Vector3::from(self.source_position)
    }

    pub fn mic(&self) -> Vector3<f32> {
        Vector3::from(self.mic_position)
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.filter.kind()
    }
}

fn normalized(v: [f32; 3], key: &'static str) -> Result<[f32; 3], ConfigError> {
    let v = Vector3::from(v);
    let mag = v.magnitude();
    if mag <= 0.0 || !mag.is_finite() {
        return Err(ConfigError::InvalidValue {
            key,
            reason: "direction vectors must have a nonzero, finite length".to_owned(),
        });
    }
    Ok((v / mag).into())
}

/// Parse and validate a render configuration.
pub fn parse_config(json: &str) -> Result<RenderConfig, ConfigError> {
    let mut config: RenderConfig = serde_json::from_str(json)?;

    if config.rays == 0 || config.rays % RAY_GROUP_SIZE != 0 {
        return Err(ConfigError::InvalidValue {
            key: "rays",
            reason: format!("must be a positive multiple of {}", RAY_GROUP_SIZE),
        });
    }
    if config.reflections < 1 || config.reflections > 1024 {
        return Err(ConfigError::InvalidValue {
            key: "reflections",
            reason: "must lie between 1 and 1024".to_owned(),
        });
    }
    if !(config.sample_rate.is_finite() && config.sample_rate > 0.0) {
        return Err(ConfigError::InvalidValue {
            key: "sample_rate",
            reason: "must be positive".to_owned(),
        });
    }
    if config.bit_depth != 16 && config.bit_depth != 24 {
        return Err(ConfigError::InvalidValue {
            key: "bit_depth",
            reason: "supported bit depths are 16 and 24".to_owned(),
        });
    }

    match config.attenuation_model {
        AttenuationModel::Speakers(ref mut speakers) => {
            for speaker in speakers.iter_mut() {
                speaker.direction = normalized(speaker.direction, "attenuation_model.speakers")?;
                if !(0.0 <= speaker.shape && speaker.shape <= 1.0) {
                    return Err(ConfigError::InvalidValue {
                        key: "attenuation_model.speakers",
                        reason: "shape must lie in [0, 1]".to_owned(),
                    });
                }
            }
        }
        AttenuationModel::Hrtf(ref mut hrtf) => {
            hrtf.facing = normalized(hrtf.facing, "attenuation_model.hrtf.facing")?;
            hrtf.up = normalized(hrtf.up, "attenuation_model.hrtf.up")?;
        }
    }

    Ok(config)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialConfig {
    specular: [f32; 8],
    diffuse: [f32; 8],
}

/// The surface every unmatched mesh falls back to.
pub fn default_surface() -> Surface {
    Surface {
        specular: Volume::new([0.02, 0.02, 0.03, 0.03, 0.04, 0.05, 0.05, 0.05]),
        diffuse: Volume::new([0.50, 0.90, 0.95, 0.95, 0.95, 0.95, 0.95, 0.95]),
    }
}

/// Parse a material file: an object mapping material names to band-wise
/// specular and diffuse coefficients.
///
/// The returned library carries the default surface at index 0; coefficient
/// ranges are enforced later, at geometry construction.
pub fn parse_materials(json: &str) -> Result<MaterialLibrary, ConfigError> {
    let map: BTreeMap<String, MaterialConfig> = serde_json::from_str(json)?;

    let mut library = MaterialLibrary::new(default_surface());
    for (name, material) in map.iter() {
        library.insert(
            name,
            Surface {
                specular: Volume::new(material.specular),
                diffuse: Volume::new(material.diffuse),
            },
        );
    }
    Ok(library)
}
