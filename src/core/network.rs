//! Fixed-shape dense weights and the elementwise maps of the classifier.
//!
//! The network is deliberately tiny: seven segment lines in, a handful of
//! hidden units, ten classes out, no biases. Weights live in flat row-major
//! arrays; nothing here is keyed by name or looked up at runtime.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prng::Prng;
use crate::segments::{DIGIT_COUNT, SEGMENT_COUNT};

/// Type alias for connection weights.
pub type Weight = f32;

/// Half-width of the uniform weight init interval.
const INIT_HALF_RANGE: f32 = 0.5;

/// Row-major dense matrix keyed by (input unit, output unit).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Weight>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Weight) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Weight {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, w: Weight) {
        self.data[i * self.cols + j] = w;
    }
}

/// Immutable weights of both dense layers.
///
/// Published wholesale by the trainer at the end of every epoch; consumers
/// hold an `Arc` to a snapshot and never observe a partial update. Fixed
/// named fields per layer; no string-keyed lookup and no key-miss failure
/// mode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightSnapshot {
    /// Segment lines → hidden units (7 × H).
    pub hidden: Matrix,
    /// Hidden units → digit classes (H × 10).
    pub output: Matrix,
}

impl WeightSnapshot {
    /// Fresh uniform-random weights for a given hidden width.
    pub fn init(hidden_width: usize, seed: u64) -> Self {
        let mut prng = Prng::new(seed);
        let hidden = Matrix::from_fn(SEGMENT_COUNT, hidden_width, |_, _| {
            prng.symmetric_f32(INIT_HALF_RANGE)
        });
        let output = Matrix::from_fn(hidden_width, DIGIT_COUNT, |_, _| {
            prng.symmetric_f32(INIT_HALF_RANGE)
        });
        Self { hidden, output }
    }

    pub fn hidden_width(&self) -> usize {
        self.hidden.cols
    }
}

#[inline]
pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

#[inline]
pub fn relu_derivative(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Shift-by-max softmax; a probability distribution for any finite input.
pub fn softmax(xs: &[f32]) -> Vec<f32> {
    let Some(max) = xs.iter().copied().reduce(f32::max) else {
        return Vec::new();
    };
    let exps: Vec<f32> = xs.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Multiply `input` against every column of `weights` and sum along the
/// input axis: one output per weight column.
pub fn mat_vec(input: &[f32], weights: &Matrix) -> Vec<f32> {
    debug_assert_eq!(input.len(), weights.rows);
    let mut sums = vec![0.0; weights.cols];
    for (i, &x) in input.iter().enumerate() {
        for (j, sum) in sums.iter_mut().enumerate() {
            *sum += x * weights.get(i, j);
        }
    }
    sums
}

/// Plain forward pass: class distribution for an input vector. The display
/// path uses [`crate::trace::ActivationTrace`] instead, which keeps the
/// intermediates this discards.
pub fn forward(snapshot: &WeightSnapshot, input: &[f32]) -> Vec<f32> {
    let hidden: Vec<f32> = mat_vec(input, &snapshot.hidden)
        .into_iter()
        .map(relu)
        .collect();
    softmax(&mat_vec(&hidden, &snapshot.output))
}
