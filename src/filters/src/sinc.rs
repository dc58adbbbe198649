//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Windowed-sinc FIR kernel construction.
use crate::conv::FastConvolution;

/// The tap count of the generated FIR kernels. Must stay odd so the kernels
/// have a center tap.
pub const KERNEL_LENGTH: usize = 29;

fn sinc(x: f64) -> f64 {
    use std::f64::consts::PI;
    (x * PI).sin() / (x * PI)
}

fn sinc_kernel(cutoff: f64, length: usize) -> Vec<f64> {
    debug_assert!(length % 2 == 1, "sinc kernel length must be odd");
    let center = (length - 1) / 2;
    (0..length)
        .map(|i| if i == center {
            1.0
        } else {
            sinc(2.0 * cutoff * (i as f64 - center as f64))
        })
        .collect()
}

fn blackman(length: usize) -> Vec<f64> {
    use std::f64::consts::PI;
    let a0 = 7938.0 / 18608.0;
    let a1 = 9240.0 / 18608.0;
    let a2 = 1430.0 / 18608.0;

    (0..length)
        .map(|i| {
            let offset = i as f64 / (length - 1) as f64;
            a0 - a1 * (2.0 * PI * offset).cos() + a2 * (4.0 * PI * offset).cos()
        })
        .collect()
}

/// A low-pass kernel with the given cutoff, windowed by a Blackman window
/// and normalized to unit gain at DC.
pub fn lopass_kernel(sr: f64, cutoff: f64, length: usize) -> Vec<f32> {
    let window = blackman(length);
    let kernel = sinc_kernel(cutoff / sr, length);
    let mut ret: Vec<f64> = window
        .iter()
        .zip(kernel.iter())
        .map(|(w, k)| w * k)
        .collect();
    let sum: f64 = ret.iter().sum();
    for x in ret.iter_mut() {
        *x /= sum;
    }
    ret.iter().map(|&x| x as f32).collect()
}

/// A high-pass kernel: the spectral inversion of the matching low-pass.
pub fn hipass_kernel(sr: f64, cutoff: f64, length: usize) -> Vec<f32> {
    let mut kernel = lopass_kernel(sr, cutoff, length);
    for x in kernel.iter_mut() {
        *x = -*x;
    }
    kernel[(length - 1) / 2] += 1.0;
    kernel
}

/// A band-pass kernel of `KERNEL_LENGTH` taps: a low-pass at `hi` convolved
/// with a high-pass at `lo`.
pub fn bandpass_kernel(conv: &mut FastConvolution, sr: f64, lo: f64, hi: f64) -> Vec<f32> {
    let half = 1 + KERNEL_LENGTH / 2;
    let lop = lopass_kernel(sr, hi, half);
    let hip = hipass_kernel(sr, lo, half);
    conv.convolve(&lop, &hip)
}
