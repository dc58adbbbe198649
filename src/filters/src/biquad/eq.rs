//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Biquad filter designs for audio equalization.
//!
//! The derivations are based on the well-known document named
//! "[Cookbook formulae for audio EQ biquad filter coefficients]" by Robert
//! Bristow-Johnson.
//!
//! Frequency values are normalized and must be specified in the range `[0, 0.5]`.
//!
//! [Cookbook formulae for audio EQ biquad filter coefficients]: http://www.musicdsp.org/files/Audio-EQ-Cookbook.txt
use super::BiquadCoefs;
use std::f64::consts::PI;

/// Construct a `BiquadCoefs` for a low-pass filter with a given cutoff
/// frequency `f0` and Q value `q`.
pub fn low_pass_filter(f0: f64, q: f64) -> BiquadCoefs {
    debug_assert!(f0 >= 0.0 && f0 <= 0.5);
    debug_assert!(q > 0.0);
    let w0 = f0 * (PI * 2.0);
    let cos = w0.cos();
    let alpha = w0.sin() / (2.0 * q);
    let b0 = (1.0 - cos) * 0.5;
    let b1 = 1.0 - cos;
    let b2 = (1.0 - cos) * 0.5;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos;
    let a2 = 1.0 - alpha;
    BiquadCoefs {
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
        a1: a1 / a0,
        a2: a2 / a0,
    }
}

/// Construct a `BiquadCoefs` for a high-pass filter with a given cutoff
/// frequency `f0` and Q value `q`.
pub fn high_pass_filter(f0: f64, q: f64) -> BiquadCoefs {
    debug_assert!(f0 >= 0.0 && f0 <= 0.5);
    debug_assert!(q > 0.0);
    let w0 = f0 * (PI * 2.0);
    let cos = w0.cos();
    let alpha = w0.sin() / (2.0 * q);
    let b0 = (1.0 + cos) * 0.5;
    let b1 = -1.0 - cos;
    let b2 = (1.0 + cos) * 0.5;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos;
    let a2 = 1.0 - alpha;
    BiquadCoefs {
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
        a1: a1 / a0,
        a2: a2 / a0,
    }
}

/// Construct a `BiquadCoefs` for a band-pass filter covering the band from
/// `lo` to `hi` (both normalized).
///
/// The center frequency is the geometric mean of the band edges and the Q
/// value is derived from the bandwidth in octaves, so the filter skirts meet
/// their neighbours at the edges.
pub fn band_pass_filter(lo: f64, hi: f64) -> BiquadCoefs {
    debug_assert!(lo > 0.0 && lo < hi && hi <= 0.5);
    let center = (lo * hi).sqrt();
    let omega = 2.0 * PI * center;
    let cs = omega.cos();
    let sn = omega.sin();
    let bandwidth = (hi / lo).log2();
    let q = sn / (2.0f64.ln() * bandwidth * omega);
    let alpha = sn * (1.0 / (2.0 * q)).sinh();

    let b0 = alpha;
    let b1 = 0.0;
    let b2 = -alpha;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cs;
    let a2 = 1.0 - alpha;
    BiquadCoefs {
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
        a1: a1 / a0,
        a2: a2 / a0,
    }
}
