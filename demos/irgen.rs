//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Renders the impulse response of a procedural box-shaped room and writes
//! it to a WAV file.
extern crate clap;
extern crate env_logger;
extern crate hound;
extern crate rand;
extern crate rayverb;

use std::error::Error;
use std::f32::consts::PI;
use std::fs;
use std::process;

use clap::{Arg, Command};
use rand::Rng;
use rayverb::cgmath::Vector3;
use rayverb::common::{GeometryStore, Mesh};
use rayverb::config::{parse_config, parse_materials, RenderConfig};
use rayverb::render_impulse_response;

const DEFAULT_CONFIG: &str = r#"{
    "rays": 16384,
    "reflections": 64,
    "sample_rate": 44100,
    "bit_depth": 16,
    "source_position": [2.0, 1.8, 3.5],
    "mic_position": [-2.0, 1.8, -3.0],
    "attenuation_model": {"hrtf": {"facing": [0, 0, 1], "up": [0, 1, 0]}},
    "verbose": true
}"#;

const MATERIALS: &str = r#"{
    "shell": {
        "specular": [0.95, 0.9, 0.9, 0.85, 0.85, 0.8, 0.75, 0.7],
        "diffuse": [0.3, 0.4, 0.5, 0.55, 0.6, 0.6, 0.6, 0.6]
    }
}"#;

/// An axis-aligned room spanning `min` to `max`, as a single mesh named
/// `shell`.
fn box_room(min: Vector3<f32>, max: Vector3<f32>) -> Mesh {
    let vertices = vec![
        Vector3::new(min.x, min.y, min.z),
        Vector3::new(max.x, min.y, min.z),
        Vector3::new(max.x, min.y, max.z),
        Vector3::new(min.x, min.y, max.z),
        Vector3::new(min.x, max.y, min.z),
        Vector3::new(max.x, max.y, min.z),
        Vector3::new(max.x, max.y, max.z),
        Vector3::new(min.x, max.y, max.z),
    ];
    let faces = vec![
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
    Mesh {
        name: "shell".to_owned(),
        vertices,
        faces,
    }
}

fn random_directions(count: usize) -> Vec<Vector3<f32>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let z = rng.gen_range(-1.0f32..1.0);
            let theta = rng.gen_range(-PI..PI);
            let zt = (1.0 - z * z).sqrt();
            Vector3::new(zt * theta.cos(), zt * theta.sin(), z)
        })
        .collect()
}

fn write_wav(
    path: &str,
    channels: &[Vec<f32>],
    sample_rate: f64,
    bit_depth: u32,
) -> Result<(), Box<dyn Error>> {
    let len = channels.iter().map(|c| c.len()).max().unwrap_or(0);

    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate: sample_rate as u32,
        bits_per_sample: bit_depth as u16,
        sample_format: hound::SampleFormat::Int,
    };
    let scale = ((1i32 << (bit_depth - 1)) - 1) as f32;

    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..len {
        for channel in channels.iter() {
            let x = channel.get(i).cloned().unwrap_or(0.0);
            writer.write_sample((x.max(-1.0).min(1.0) * scale) as i32)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

fn run(config: &RenderConfig, output: &str) -> Result<(), Box<dyn Error>> {
    if !output.ends_with(".wav") {
        return Err("only .wav output is supported".into());
    }

    let materials = parse_materials(MATERIALS)?;
    let room = box_room(Vector3::new(-6.0, 0.0, -5.0), Vector3::new(6.0, 3.0, 5.0));
    let geometry = GeometryStore::from_meshes(&[room], &materials)?;

    let directions = random_directions(config.rays);
    let channels = render_impulse_response(config, geometry, &directions)?;

    write_wav(output, &channels, config.sample_rate, config.bit_depth)
}

fn main() {
    let matches = Command::new("irgen")
        .about("generates a room impulse response using rayverb")
        .arg(
            Arg::new("OUTPUT")
                .help("Output file name")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Render configuration file"),
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| parse_config(&json).map_err(|e| e.to_string())),
        None => parse_config(DEFAULT_CONFIG).map_err(|e| e.to_string()),
    };
    let config = match config {
        Ok(config) => config,
        Err(message) => {
            eprintln!("encountered error reading config: {}", message);
            process::exit(1);
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(if config.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let output = matches.get_one::<String>("OUTPUT").unwrap();
    if let Err(error) = run(&config, output) {
        eprintln!("encountered error: {}", error);
        process::exit(1);
    }
}
