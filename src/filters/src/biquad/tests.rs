//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
use crate::biquad::{eq, BiquadCoefs, BiquadKernelState};
use crate::utils::assert_num_slice_approx_eq;

#[test]
fn identity() {
    let signal: Vec<_> = (1..256).map(|x| x as f32).collect();
    let coefs = BiquadCoefs::identity();
    let mut state = BiquadKernelState::new();

    let mut signal_new = signal.clone();
    state.apply_to_signal(&mut signal_new, &coefs);

    assert_num_slice_approx_eq(&signal_new, &signal, 1.0e-5);
}

#[test]
fn band_pass_rejects_dc() {
    let coefs = eq::band_pass_filter(1400.0 / 44100.0, 2800.0 / 44100.0);
    let mut state = BiquadKernelState::new();

    let mut signal = vec![1.0f32; 2048];
    state.apply_to_signal(&mut signal, &coefs);

    // The transient dies out and the constant input is blocked.
    for x in signal[1024..].iter() {
        assert!(x.abs() < 1.0e-3, "DC leaked through: {}", x);
    }
}

#[test]
fn low_and_high_pass_split_dc() {
    // At DC a Butterworth low-pass passes everything and its matching
    // high-pass nothing.
    let lp = eq::low_pass_filter(0.1, ::std::f64::consts::FRAC_1_SQRT_2);
    let hp = eq::high_pass_filter(0.1, ::std::f64::consts::FRAC_1_SQRT_2);

    let mut lp_state = BiquadKernelState::new();
    let mut hp_state = BiquadKernelState::new();

    let mut low = vec![1.0f32; 1024];
    let mut high = vec![1.0f32; 1024];
    lp_state.apply_to_signal(&mut low, &lp);
    hp_state.apply_to_signal(&mut high, &hp);

    assert!((low[1023] - 1.0).abs() < 1.0e-3);
    assert!(high[1023].abs() < 1.0e-3);
}

#[test]
fn reset_restores_initial_state() {
    let coefs = eq::low_pass_filter(0.05, 0.7);
    let mut state = BiquadKernelState::new();

    let mut first = vec![1.0f32; 64];
    state.apply_to_signal(&mut first, &coefs);

    state.reset();

    let mut second = vec![1.0f32; 64];
    state.apply_to_signal(&mut second, &coefs);

    assert_num_slice_approx_eq(&second, &first, 1.0e-6);
}
