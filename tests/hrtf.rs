//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
extern crate rayverb;

use rayverb::cgmath::Vector3;
use rayverb::common::Volume;
use rayverb::engine::{HrtfAttenuator, Impulse, RaytracerResults};
use rayverb::hrtf_data;

fn impulse_at(x: f32, y: f32, z: f32) -> Impulse {
    Impulse {
        volume: Volume::one(),
        position: Vector3::new(x, y, z),
        time: 1.0,
    }
}

/// Unit impulses arriving from the six cardinal directions.
fn test_impulses() -> RaytracerResults {
    let mut impulses = vec![
        impulse_at(-10.0, 0.0, 0.0),
        impulse_at(10.0, 0.0, 0.0),
        impulse_at(0.0, -10.0, 0.0),
        impulse_at(0.0, 10.0, 0.0),
        impulse_at(0.0, 0.0, -10.0),
        impulse_at(0.0, 0.0, 10.0),
    ];
    impulses.resize(64, impulse_at(0.0, 0.0, 0.0));

    RaytracerResults {
        impulses,
        mic: Vector3::new(0.0, 0.0, 0.0),
    }
}

fn run(facing: Vector3<f32>) -> Vec<Vec<Impulse>> {
    let results = test_impulses();
    let mut attenuator = HrtfAttenuator::new().unwrap();
    let channels = attenuator.attenuate(&results, facing, Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(channels.len(), 2);
    channels
}

#[test]
fn frontal_arrivals_index_azimuth_180() {
    let table = hrtf_data::table();

    // Whatever the listener faces, a source straight ahead lands on the
    // front cell of the table.
    let cases = [
        (Vector3::new(0.0, 0.0, 1.0), 5),
        (Vector3::new(1.0, 0.0, 0.0), 1),
        (Vector3::new(0.0, 0.0, -1.0), 4),
        (Vector3::new(-1.0, 0.0, 0.0), 0),
    ];
    for &(facing, index) in cases.iter() {
        let left = &run(facing)[0];
        assert_eq!(left[index].volume, table.get(0, 180, 90));
    }
}

#[test]
fn lateral_arrivals_index_the_side_cells() {
    let table = hrtf_data::table();
    let channels = run(Vector3::new(0.0, 0.0, 1.0));
    let left = &channels[0];

    // Facing +z: +x arrives from the right hemisphere (azimuth 90), -x from
    // the left (azimuth 270), -z from behind (azimuth 0).
    assert_eq!(left[1].volume, table.get(0, 90, 90));
    assert_eq!(left[0].volume, table.get(0, 270, 90));
    assert_eq!(left[4].volume, table.get(0, 0, 90));
}

#[test]
fn both_ears_use_their_own_half_of_the_table() {
    let table = hrtf_data::table();
    let channels = run(Vector3::new(0.0, 0.0, 1.0));

    assert_eq!(channels[0][1].volume, table.get(0, 90, 90));
    assert_eq!(channels[1][1].volume, table.get(1, 90, 90));

    // A source on the right is louder in the right ear.
    for (left, right) in channels[0][1]
        .volume
        .get_ref()
        .iter()
        .zip(channels[1][1].volume.get_ref().iter())
    {
        assert!(left < right);
    }
}

#[test]
fn interaural_time_difference_delays_the_far_ear() {
    let channels = run(Vector3::new(0.0, 0.0, 1.0));

    // Source at +x: the left ear is farther away and hears it later.
    assert!(channels[0][1].time > channels[1][1].time);
    // Source at -x: the other way around.
    assert!(channels[0][0].time < channels[1][0].time);
    // A frontal source is equidistant from both ears.
    assert_eq!(channels[0][5].time, channels[1][5].time);
}

#[test]
fn degenerate_direct_entries_pass_through() {
    let channels = run(Vector3::new(0.0, 0.0, 1.0));
    // The padding impulses sit exactly at the receiver.
    for channel in channels.iter() {
        for impulse in channel[6..].iter() {
            assert_eq!(impulse.volume, Volume::one());
            assert_eq!(impulse.time, 1.0);
        }
    }
}
