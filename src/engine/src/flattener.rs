//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Bins time-stamped impulses onto a sample grid, split by band.
use rayverb_common::NUM_BANDS;

use crate::kernels::Impulse;

/// Flatten one channel's impulses onto a sample grid.
///
/// The grid has one row per octave band and `round(max_time · sr) + 1`
/// columns. Impulses whose rounded sample positions collide are summed;
/// zero-volume impulses (obstructed diffuse slots and image padding) are
/// ignored. An input with no audible impulse yields empty rows.
pub fn flatten_impulses(impulses: &[Impulse], sample_rate: f64) -> Vec<Vec<f32>> {
    let mut max_time = None;
    for impulse in impulses.iter() {
        if impulse.volume.is_zero() {
            continue;
        }
        max_time = Some(match max_time {
            Some(t) if t >= impulse.time => t,
            _ => impulse.time,
        });
    }

    let max_time = match max_time {
        Some(t) => t,
        None => return vec![Vec::new(); NUM_BANDS],
    };
    let len = (max_time as f64 * sample_rate).round() as usize + 1;

    let mut flattened = vec![vec![0.0f32; len]; NUM_BANDS];
    for impulse in impulses.iter() {
        if impulse.volume.is_zero() {
            continue;
        }
        let sample = (impulse.time as f64 * sample_rate).round() as usize;
        for (band, lane) in flattened.iter_mut().zip(impulse.volume.get_ref().iter()) {
            band[sample] += lane;
        }
    }

    flattened
}

/// Flatten every channel of an attenuated impulse set.
pub fn flatten_channels(channels: &[Vec<Impulse>], sample_rate: f64) -> Vec<Vec<Vec<f32>>> {
    channels
        .iter()
        .map(|impulses| flatten_impulses(impulses, sample_rate))
        .collect()
}

/// Remove the predelay of an attenuated impulse set: the earliest audible
/// arrival across all channels is shifted to time zero.
pub fn fix_predelay(channels: &mut [Vec<Impulse>]) {
    let mut min_time = f32::INFINITY;
    for impulse in channels.iter().flat_map(|c| c.iter()) {
        if !impulse.volume.is_zero() && impulse.time < min_time {
            min_time = impulse.time;
        }
    }

    if !min_time.is_finite() {
        return;
    }

    for impulse in channels.iter_mut().flat_map(|c| c.iter_mut()) {
        impulse.time = (impulse.time - min_time).max(0.0);
    }
}
