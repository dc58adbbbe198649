//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! FFT-accelerated linear convolution.
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Convolves signals through the frequency domain.
///
/// The transform plans are cached per FFT length for the lifetime of the
/// value and released with it.
pub struct FastConvolution {
    planner: FftPlanner<f32>,
}

impl FastConvolution {
    pub fn new() -> Self {
        Self { planner: FftPlanner::new() }
    }

    /// The full linear convolution of `a` and `b`, of length
    /// `a.len() + b.len() - 1`.
    pub fn convolve(&mut self, a: &[f32], b: &[f32]) -> Vec<f32> {
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }

        let len = a.len() + b.len() - 1;
        let fft = self.planner.plan_fft_forward(len);
        let ifft = self.planner.plan_fft_inverse(len);

        let mut fa: Vec<Complex<f32>> = a.iter()
            .map(|&x| Complex::new(x, 0.0))
            .chain((a.len()..len).map(|_| Complex::new(0.0, 0.0)))
            .collect();
        let mut fb: Vec<Complex<f32>> = b.iter()
            .map(|&x| Complex::new(x, 0.0))
            .chain((b.len()..len).map(|_| Complex::new(0.0, 0.0)))
            .collect();

        fft.process(&mut fa);
        fft.process(&mut fb);

        // A convolution in the time domain is the pointwise product in the
        // frequency domain.
        for (x, y) in fa.iter_mut().zip(fb.iter()) {
            *x = *x * *y;
        }

        ifft.process(&mut fa);

        let scale = 1.0 / len as f32;
        fa.iter().map(|c| c.re * scale).collect()
    }
}

impl Default for FastConvolution {
    fn default() -> Self {
        Self::new()
    }
}
