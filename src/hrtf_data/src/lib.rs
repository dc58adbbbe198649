//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Compiled-in head-related transfer function table.
//!
//! The table stores one eight-band gain per ear, azimuth degree, and
//! elevation degree. Entries are derived from a spherical-head shadowing
//! model: each band is attenuated in proportion to the angle between the
//! incoming direction and the ear axis, with the attenuation depth growing
//! toward the high bands.
//!
//! Index conventions (shared with the attenuation kernels):
//!
//!  - azimuth 180° is straight ahead, 90° is the right hemisphere, 0° is
//!    behind the listener;
//!  - the elevation index is `90 − elevation`, so 90 is the horizon, 0 the
//!    zenith.
extern crate rayverb_common;
#[macro_use]
extern crate lazy_static;

use rayverb_common::Volume;

pub const NUM_CHANNELS: usize = 2;
pub const AZIMUTH_RESOLUTION: usize = 360;
pub const ELEVATION_RESOLUTION: usize = 180;

/// Per-band shadowing depth of the head, from the lowest to the highest
/// octave band. A source diametrically opposed to an ear is attenuated by
/// this fraction in the corresponding band.
const HEAD_SHADOW: [f32; 8] = [0.05, 0.08, 0.12, 0.2, 0.35, 0.5, 0.65, 0.8];

/// A 2 × 360 × 180 table of eight-band gains, azimuth-major per channel.
pub struct HrtfData {
    data: Vec<Volume>,
}

impl HrtfData {
    fn generate() -> Self {
        let mut data =
            Vec::with_capacity(NUM_CHANNELS * AZIMUTH_RESOLUTION * ELEVATION_RESOLUTION);

        for channel in 0..NUM_CHANNELS {
            // Channel 0 is the left ear, on the negative side of the
            // listener's lateral axis.
            let ear_sign = if channel == 0 { -1.0f32 } else { 1.0f32 };

            for azimuth in 0..AZIMUTH_RESOLUTION {
                let theta = (azimuth as f32).to_radians();
                for elevation in 0..ELEVATION_RESOLUTION {
                    let phi = (90.0 - elevation as f32).to_radians();

                    // Incoming direction in the head frame (x = right,
                    // y = up, z = forward).
                    let lateral = phi.cos() * theta.sin();
                    let cos_angle = (ear_sign * lateral).max(-1.0).min(1.0);

                    let mut lanes = [0.0; 8];
                    for (lane, shadow) in lanes.iter_mut().zip(HEAD_SHADOW.iter()) {
                        *lane = 1.0 - shadow * (1.0 - cos_angle) * 0.5;
                    }
                    data.push(Volume::new(lanes));
                }
            }
        }

        Self { data }
    }

    /// Fetch the gain for an (ear, azimuth, elevation) cell.
    ///
    /// `azimuth` must be less than 360 and `elevation` less than 180.
    pub fn get(&self, channel: usize, azimuth: usize, elevation: usize) -> Volume {
        debug_assert!(azimuth < AZIMUTH_RESOLUTION);
        debug_assert!(elevation < ELEVATION_RESOLUTION);
        self.data[(channel * AZIMUTH_RESOLUTION + azimuth) * ELEVATION_RESOLUTION + elevation]
    }
}

lazy_static! {
    static ref HRTF_DATA: HrtfData = HrtfData::generate();
}

/// The compiled-in table. Generated on first use.
pub fn table() -> &'static HrtfData {
    &*HRTF_DATA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gains_lie_in_unit_range() {
        let table = table();
        for channel in 0..NUM_CHANNELS {
            for azimuth in (0..AZIMUTH_RESOLUTION).step_by(13) {
                for elevation in (0..ELEVATION_RESOLUTION).step_by(7) {
                    let v = table.get(channel, azimuth, elevation);
                    for x in v.get_ref().iter() {
                        assert!(0.0 < *x && *x <= 1.0);
                    }
                }
            }
        }
    }

    #[test]
    fn lateral_sources_favor_the_near_ear() {
        let table = table();
        // Azimuth 90 is the right hemisphere.
        let right_source_right_ear = table.get(1, 90, 90);
        let right_source_left_ear = table.get(0, 90, 90);
        for (near, far) in right_source_right_ear
            .get_ref()
            .iter()
            .zip(right_source_left_ear.get_ref().iter())
        {
            assert!(near > far);
        }

        // Frontal sources are heard nearly equally on both ears.
        let front_left = table.get(0, 180, 90);
        let front_right = table.get(1, 180, 90);
        for (l, r) in front_left
            .get_ref()
            .iter()
            .zip(front_right.get_ref().iter())
        {
            assert!((l - r).abs() < 1.0e-6);
        }
    }

    #[test]
    fn shadow_deepens_with_frequency() {
        let v = table().get(0, 90, 90);
        let lanes = v.get_ref();
        for pair in lanes.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }
}
