//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Rayverb filters
//! ===============
//!
//! The multiband filter bank and post-processing stages that turn flattened
//! per-band sample grids into playable waveforms.
extern crate rustfft;

pub mod bandmerger;
pub mod biquad;
pub mod conv;
pub mod postprocess;
pub mod sinc;
mod utils;

pub use crate::conv::FastConvolution;
pub use crate::postprocess::{process, FilterKind, BAND_EDGES};
