//
// Copyright 2017 yvt, all rights reserved.
//
// This source code is a part of Nightingales.
//
//! Merges multi-band audio samples into a single stream.
use crate::biquad::{eq, BiquadCoefs, BiquadKernelState};

/// The Butterworth low-pass/high-pass pair of one crossover point.
///
/// Either half applied twice gives the fourth-order Linkwitz-Riley response;
/// both halves applied in parallel and summed give a fourth-order all-pass.
struct Crossover {
    low: BiquadCoefs,
    high: BiquadCoefs,
}

impl Crossover {
    fn at(freq: f64) -> Self {
        use std::f64::consts::FRAC_1_SQRT_2;
        Self {
            low: eq::low_pass_filter(freq, FRAC_1_SQRT_2),
            high: eq::high_pass_filter(freq, FRAC_1_SQRT_2),
        }
    }
}

/// An LR-4 low-pass or high-pass: one Butterworth half of a crossover,
/// cascaded twice.
struct Lr4Section {
    crossover: usize,
    high: bool,
    states: [BiquadKernelState; 2],
}

impl Lr4Section {
    fn new(crossover: usize, high: bool) -> Self {
        Self {
            crossover,
            high,
            states: [BiquadKernelState::new(); 2],
        }
    }

    fn run(&mut self, x: f64, crossovers: &[Crossover]) -> f64 {
        let c = &crossovers[self.crossover];
        let coefs = if self.high { &c.high } else { &c.low };
        let tmp = self.states[0].apply_to_sample(x, coefs);
        self.states[1].apply_to_sample(tmp, coefs)
    }

    fn reset(&mut self) {
        for state in self.states.iter_mut() {
            state.reset();
        }
    }
}

/// A fourth-order all-pass at a crossover point: the parallel sum of the
/// LR-4 low-pass and high-pass.
struct AllPassSection {
    crossover: usize,
    low: [BiquadKernelState; 2],
    high: [BiquadKernelState; 2],
}

impl AllPassSection {
    fn new(crossover: usize) -> Self {
        Self {
            crossover,
            low: [BiquadKernelState::new(); 2],
            high: [BiquadKernelState::new(); 2],
        }
    }

    fn run(&mut self, x: f64, crossovers: &[Crossover]) -> f64 {
        let c = &crossovers[self.crossover];
        let low_tmp = self.low[0].apply_to_sample(x, &c.low);
        let low = self.low[1].apply_to_sample(low_tmp, &c.low);
        let high_tmp = self.high[0].apply_to_sample(x, &c.high);
        let high = self.high[1].apply_to_sample(high_tmp, &c.high);
        low + high
    }

    fn reset(&mut self) {
        for state in self.low.iter_mut().chain(self.high.iter_mut()) {
            state.reset();
        }
    }
}

/// One node of the binary merge tree over a contiguous band range.
///
/// A node sums its two children, phase-compensates the sum with an all-pass
/// for every crossover point *inside the sibling subtree* (the sibling's own
/// crossovers ring at those frequencies, so both inputs of the parent sum
/// must share their phase rotation), and finally applies the LR-4 half it
/// owes its parent's crossover. The root owes no parent and applies none.
struct MergeNode {
    input: NodeInput,
    compensation: Vec<AllPassSection>,
    filter: Option<Lr4Section>,
}

enum NodeInput {
    Band(usize),
    Sum(Box<MergeNode>, Box<MergeNode>),
}

impl MergeNode {
    /// Build the subtree covering bands `lo..hi`. Crossover `j` separates
    /// band `j` from band `j + 1`.
    fn build(lo: usize, hi: usize, filter: Option<Lr4Section>, sibling: Vec<usize>) -> Self {
        let compensation = sibling.into_iter().map(AllPassSection::new).collect();

        if hi - lo == 1 {
            return Self {
                input: NodeInput::Band(lo),
                compensation,
                filter,
            };
        }

        let mid = (lo + hi) / 2;
        let split = mid - 1;
        let left = Self::build(
            lo,
            mid,
            Some(Lr4Section::new(split, false)),
            (mid..hi - 1).collect(),
        );
        let right = Self::build(
            mid,
            hi,
            Some(Lr4Section::new(split, true)),
            (lo..mid - 1).collect(),
        );

        Self {
            input: NodeInput::Sum(Box::new(left), Box::new(right)),
            compensation,
            filter,
        }
    }

    fn run(&mut self, bands: &[&[f32]], sample: usize, crossovers: &[Crossover]) -> f64 {
        let mut x = match self.input {
            NodeInput::Band(band) => bands[band][sample] as f64,
            NodeInput::Sum(ref mut left, ref mut right) => {
                left.run(bands, sample, crossovers) + right.run(bands, sample, crossovers)
            }
        };
        for section in self.compensation.iter_mut() {
            x = section.run(x, crossovers);
        }
        match self.filter {
            Some(ref mut filter) => filter.run(x, crossovers),
            None => x,
        }
    }

    fn reset(&mut self) {
        if let NodeInput::Sum(ref mut left, ref mut right) = self.input {
            left.reset();
            right.reset();
        }
        for section in self.compensation.iter_mut() {
            section.reset();
        }
        if let Some(ref mut filter) = self.filter {
            filter.reset();
        }
    }
}

/// Merger based on fourth-order Linkwitz-Riley crossover filters (LR-4).
///
/// The eight bands are merged pairwise up a binary tree; each pair is split
/// by an LR-4 low-pass/high-pass at the crossover between it, and the deeper
/// merges are kept phase-coherent by all-pass compensation at the crossover
/// points of the opposite subtree. Since the network is built entirely from
/// crossover filters it has the unity gain property: supplied with the same
/// signal on every band it behaves as an all-pass filter.
pub struct Lr4BandMerger {
    crossovers: Vec<Crossover>,
    tree: MergeNode,
}

impl Lr4BandMerger {
    /// Construct an `Lr4BandMerger` with the given crossover frequencies
    /// (normalized).
    ///
    /// `crossover_freqs.len()` must be 7 and in an ascending order.
    pub fn new(crossover_freqs: &[f64]) -> Self {
        assert_eq!(crossover_freqs.len(), 7);

        let crossovers = crossover_freqs.iter().map(|&f| Crossover::at(f)).collect();
        let tree = MergeNode::build(0, crossover_freqs.len() + 1, None, Vec::new());

        Self { crossovers, tree }
    }

    /// Generate a single-channel stream from eight band streams.
    ///
    /// `bands.len()` must be 8 and every band as long as `output`.
    pub fn merge(&mut self, output: &mut [f32], bands: &[&[f32]]) {
        assert_eq!(bands.len(), 8);
        for band in bands.iter() {
            assert_eq!(band.len(), output.len());
        }

        for (sample, y) in output.iter_mut().enumerate() {
            *y = self.tree.run(bands, sample, &self.crossovers) as f32;
        }
    }

    /// Reset the internal state of the crossover network.
    pub fn reset(&mut self) {
        self.tree.reset();
    }
}
