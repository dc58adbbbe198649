//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! The filter bank and the post-processing stages that follow it.
use crate::bandmerger::Lr4BandMerger;
use crate::biquad::{eq, BiquadKernelState};
use crate::conv::FastConvolution;
use crate::sinc::{bandpass_kernel, hipass_kernel, KERNEL_LENGTH};

/// Frequency band edges of the eight-band decomposition, in hertz.
pub const BAND_EDGES: [f64; 9] = [
    20.0,
    175.0,
    350.0,
    700.0,
    1400.0,
    2800.0,
    5600.0,
    11200.0,
    20000.0,
];

/// The cutoff of the optional DC-blocking high-pass stage, in hertz.
const HIPASS_CUTOFF: f64 = 10.0;

/// The absolute level below which trailing samples are considered silence.
const TAIL_THRESHOLD: f32 = 1.0e-5;

/// The per-band filtering strategy of the filter bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// 29-tap Blackman-windowed sinc band-passes, applied by FFT
    /// convolution. Linear phase.
    WindowedSinc,
    /// A single causal pass of an RBJ band-pass biquad per band.
    BiquadOnepass,
    /// The one-pass biquad applied forward-reverse-forward-reverse. Zero
    /// phase and a steeper slope; offline only.
    BiquadTwopass,
    /// An LR-4 crossover merge of the bands; performs the mixdown itself.
    LinkwitzRiley,
}

/// Types with a recursively measurable peak amplitude.
///
/// Scalars and slices of implementors both qualify, which lets `normalize`
/// run over arbitrarily nested channel containers without dynamic dispatch.
pub trait Amplitude {
    fn max_amp(&self) -> f32;
    fn scale(&mut self, factor: f32);
}

impl Amplitude for f32 {
    fn max_amp(&self) -> f32 {
        self.abs()
    }

    fn scale(&mut self, factor: f32) {
        *self *= factor;
    }
}

impl<T: Amplitude> Amplitude for [T] {
    fn max_amp(&self) -> f32 {
        self.iter().fold(0.0, |acc, x| acc.max(x.max_amp()))
    }

    fn scale(&mut self, factor: f32) {
        for x in self.iter_mut() {
            x.scale(factor);
        }
    }
}

impl<T: Amplitude> Amplitude for Vec<T> {
    fn max_amp(&self) -> f32 {
        self[..].max_amp()
    }

    fn scale(&mut self, factor: f32) {
        self[..].scale(factor);
    }
}

/// Scale `data` so its peak amplitude is exactly one. Silence is left
/// untouched.
pub fn normalize<T: Amplitude + ?Sized>(data: &mut T) {
    let amp = data.max_amp();
    if amp > 0.0 {
        data.scale(1.0 / amp);
    }
}

/// Sum a channel's band signals into a single stream.
pub fn mixdown(bands: &[Vec<f32>]) -> Vec<f32> {
    let mut ret = match bands.first() {
        Some(front) => vec![0.0; front.len()],
        None => return Vec::new(),
    };
    for band in bands.iter() {
        for (y, x) in ret.iter_mut().zip(band.iter()) {
            *y += *x;
        }
    }
    ret
}

/// Truncate all channels to the last audible sample of the loudest-lasting
/// channel. Shorter channels are zero-padded so every channel keeps a
/// common length.
pub fn trim_tail(channels: &mut [Vec<f32>], min_vol: f32) {
    let len = channels
        .iter()
        .map(|channel| {
            channel
                .iter()
                .rposition(|x| x.abs() >= min_vol)
                .map_or(0, |i| i + 1)
        })
        .max()
        .unwrap_or(0);

    for channel in channels.iter_mut() {
        channel.resize(len, 0.0);
    }
}

fn bandpass_biquad(data: &mut [f32], lo: f64, hi: f64, sr: f64) {
    let coefs = eq::band_pass_filter(lo / sr, hi / sr);
    let mut state = BiquadKernelState::new();
    state.apply_to_signal(data, &coefs);
}

fn bandpass_biquad_twopass(data: &mut [f32], lo: f64, hi: f64, sr: f64) {
    bandpass_biquad(data, lo, hi, sr);
    data.reverse();
    bandpass_biquad(data, lo, hi, sr);
    data.reverse();
}

fn filter_channel(
    kind: FilterKind,
    conv: &mut FastConvolution,
    bands: &mut Vec<Vec<f32>>,
    sr: f64,
) -> Vec<f32> {
    if let FilterKind::LinkwitzRiley = kind {
        let crossovers: Vec<f64> = BAND_EDGES[1..8].iter().map(|f| f / sr).collect();
        let mut merger = Lr4BandMerger::new(&crossovers);

        let len = bands.first().map_or(0, |band| band.len());
        let mut out = vec![0.0; len];
        let band_slices: Vec<&[f32]> = bands.iter().map(|band| &band[..]).collect();
        merger.merge(&mut out, &band_slices);
        return out;
    }

    for (i, band) in bands.iter_mut().enumerate() {
        let (lo, hi) = (BAND_EDGES[i], BAND_EDGES[i + 1]);
        match kind {
            FilterKind::WindowedSinc => {
                let kernel = bandpass_kernel(conv, sr, lo, hi);
                *band = conv.convolve(&kernel, band);
            }
            FilterKind::BiquadOnepass => bandpass_biquad(band, lo, hi, sr),
            FilterKind::BiquadTwopass => bandpass_biquad_twopass(band, lo, hi, sr),
            FilterKind::LinkwitzRiley => unreachable!(),
        }
    }
    mixdown(bands)
}

/// Run the filter bank and the optional post-processing stages over
/// flattened per-channel band grids, yielding one waveform per channel.
pub fn process(
    kind: FilterKind,
    mut data: Vec<Vec<Vec<f32>>>,
    sample_rate: f64,
    do_normalize: bool,
    do_hipass: bool,
    do_trim_tail: bool,
    volume_scale: f32,
) -> Vec<Vec<f32>> {
    let mut conv = FastConvolution::new();

    let mut ret: Vec<Vec<f32>> = data.iter_mut()
        .map(|channel| filter_channel(kind, &mut conv, channel, sample_rate))
        .collect();

    if do_hipass {
        let kernel = hipass_kernel(sample_rate, HIPASS_CUTOFF, KERNEL_LENGTH);
        for channel in ret.iter_mut() {
            *channel = conv.convolve(&kernel, channel);
        }
    }

    if do_normalize {
        normalize(&mut ret);
    }

    if volume_scale != 1.0 {
        ret.scale(volume_scale);
    }

    if do_trim_tail {
        trim_tail(&mut ret, TAIL_THRESHOLD);
    }

    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_bands(len: usize) -> Vec<Vec<f32>> {
        (0..8)
            .map(|_| {
                let mut band = vec![0.0; len];
                band[0] = 1.0;
                band
            })
            .collect()
    }

    #[test]
    fn normalizes_nested_channels() {
        let mut channels = vec![vec![0.5f32, -4.0, 1.0], vec![2.0, 0.0, -1.0]];
        normalize(&mut channels);
        assert_eq!(channels[0][1], -1.0);
        assert_eq!(channels[1][0], 0.5);
        assert_eq!(channels.max_amp(), 1.0);
    }

    #[test]
    fn normalize_leaves_silence_alone() {
        let mut silence = vec![vec![0.0f32; 16]];
        normalize(&mut silence);
        assert!(silence[0].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn mixdown_sums_bands() {
        let bands = vec![vec![1.0f32, 0.0], vec![2.0, 1.0], vec![0.0, -1.0]];
        assert_eq!(mixdown(&bands), vec![3.0, 0.0]);
        assert!(mixdown(&[]).is_empty());
    }

    #[test]
    fn trims_to_the_longest_channel() {
        let mut channels = vec![
            vec![1.0f32, 0.5, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        ];
        trim_tail(&mut channels, 1.0e-5);
        assert_eq!(channels[0].len(), 4);
        assert_eq!(channels[1].len(), 4);
        assert_eq!(channels[1][3], 1.0);
    }

    #[test]
    fn trims_silence_to_nothing() {
        let mut channels = vec![vec![0.0f32; 32]];
        trim_tail(&mut channels, 1.0e-5);
        assert!(channels[0].is_empty());
    }

    #[test]
    fn all_filter_kinds_produce_finite_output() {
        for &kind in &[
            FilterKind::WindowedSinc,
            FilterKind::BiquadOnepass,
            FilterKind::BiquadTwopass,
            FilterKind::LinkwitzRiley,
        ] {
            let data = vec![impulse_bands(512)];
            let out = process(kind, data, 44100.0, true, false, false, 1.0);
            assert_eq!(out.len(), 1);
            assert!(!out[0].is_empty(), "{:?} produced no output", kind);
            assert!(
                out[0].iter().all(|x| x.is_finite()),
                "{:?} produced non-finite samples",
                kind
            );
            assert!((out[0].max_amp() - 1.0).abs() < 1.0e-6);
        }
    }

    #[test]
    fn empty_channels_stay_empty() {
        let data = vec![vec![Vec::new(); 8], vec![Vec::new(); 8]];
        let out = process(
            FilterKind::BiquadOnepass,
            data,
            44100.0,
            true,
            true,
            true,
            1.0,
        );
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|channel| channel.is_empty()));
    }

    #[test]
    fn volume_scale_is_applied_after_normalization() {
        let data = vec![impulse_bands(128)];
        let out = process(FilterKind::BiquadOnepass, data, 44100.0, true, false, false, 0.25);
        assert!((out[0].max_amp() - 0.25).abs() < 1.0e-6);
    }
}
