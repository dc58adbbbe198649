//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! The receiver attenuation kernels.
use cgmath::prelude::*;
use cgmath::Vector3;

use rayverb_common::dispatch::Queue;
use rayverb_hrtf_data::HrtfData;

use super::{speaker_attenuation, Impulse, Speaker, EPSILON, SECONDS_PER_METER};

/// The distance from the head center to either ear, in meters.
const EAR_WIDTH: f32 = 0.1;

/// Scale every impulse by the speaker's polar response for its arrival
/// direction. Time and position pass through.
pub fn attenuate<Q: Queue>(
    queue: &Q,
    mic_pos: Vector3<f32>,
    input: &[Impulse],
    output: &mut [Impulse],
    speaker: &Speaker,
) {
    assert_eq!(input.len(), output.len());

    queue.foreach(output, |j, out| {
        let impulse = &input[j];
        let direction = impulse.position - mic_pos;
        *out = Impulse {
            volume: impulse.volume * speaker_attenuation(speaker, direction),
            position: impulse.position,
            time: impulse.time,
        };
    });
}

/// Scale every impulse by the head-related transfer function of one ear and
/// shift its arrival time by the interaural time difference.
///
/// The listener's head frame is the orthonormal basis {right = up × facing,
/// up, forward = facing}. Azimuth 180° is straight ahead and 90° is the
/// right hemisphere; the elevation index is `90 − elevation`.
pub fn hrtf<Q: Queue>(
    queue: &Q,
    mic_pos: Vector3<f32>,
    input: &[Impulse],
    output: &mut [Impulse],
    table: &HrtfData,
    facing: Vector3<f32>,
    up: Vector3<f32>,
    channel: usize,
) {
    assert_eq!(input.len(), output.len());
    assert!(channel < 2);

    let forward = facing.normalize();
    let right = up.cross(forward).normalize();
    let up = forward.cross(right);

    let ear_sign = if channel == 0 { -1.0 } else { 1.0 };
    let ear = mic_pos + right * (ear_sign * EAR_WIDTH);

    queue.foreach(output, |j, out| {
        let impulse = &input[j];
        let toward_source = impulse.position - mic_pos;
        let mag = toward_source.magnitude();

        // The direct path is recorded at the receiver itself and carries no
        // usable direction; it passes through unmodified.
        if mag <= EPSILON {
            *out = *impulse;
            return;
        }

        let s = toward_source / mag;
        let lateral = s.dot(right);
        let vertical = s.dot(up);
        let frontal = s.dot(forward);

        let azimuth = lateral.atan2(-frontal).to_degrees();
        let elevation = vertical
            .atan2((lateral * lateral + frontal * frontal).sqrt())
            .to_degrees();

        let az = (azimuth.round() as i32).rem_euclid(360) as usize;
        let el = (90 - elevation.round() as i32).rem_euclid(180) as usize;

        let itd = ((impulse.position - ear).magnitude() - mag) * SECONDS_PER_METER;

        *out = Impulse {
            volume: impulse.volume * table.get(channel, az, el),
            position: impulse.position,
            time: impulse.time + itd,
        };
    });
}
