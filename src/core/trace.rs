//! Layer-by-layer activation capture for the display path.
//!
//! A plain forward pass discards the per-(input, output) products as soon as
//! they are summed. The physical wiring gives each of those products its own
//! LED, so the display path replays the pass and keeps everything, in
//! computation order.

use crate::network::{relu, softmax, Matrix, WeightSnapshot};

/// Every intermediate of one inference, in the order it was computed:
/// input, hidden products, hidden sums, rectified hidden, output products,
/// output sums, class distribution. Recomputed on every render tick, never
/// persisted.
#[derive(Debug, Clone)]
pub struct ActivationTrace {
    /// Input bit levels, one per segment line.
    pub input: Vec<f32>,
    /// Per-(segment, hidden unit) products, before summation.
    pub hidden_products: Matrix,
    /// Hidden sums along the segment axis.
    pub hidden_sums: Vec<f32>,
    /// Rectified hidden outputs.
    pub hidden_act: Vec<f32>,
    /// Per-(hidden unit, class) products, before summation.
    pub output_products: Matrix,
    /// Output sums along the hidden axis.
    pub output_sums: Vec<f32>,
    /// Softmax class distribution.
    pub output: Vec<f32>,
}

impl ActivationTrace {
    /// Replay the forward pass for a segment bit pattern, keeping every
    /// per-wire contribution.
    pub fn capture(snapshot: &WeightSnapshot, input_bits: &[u8]) -> Self {
        let input: Vec<f32> = input_bits
            .iter()
            .map(|&bit| if bit != 0 { 1.0 } else { 0.0 })
            .collect();

        let (hidden_products, hidden_sums) = layer_products(&input, &snapshot.hidden);
        let hidden_act: Vec<f32> = hidden_sums.iter().map(|&sum| relu(sum)).collect();

        let (output_products, output_sums) = layer_products(&hidden_act, &snapshot.output);
        let output = softmax(&output_sums);

        Self {
            input,
            hidden_products,
            hidden_sums,
            hidden_act,
            output_products,
            output_sums,
            output,
        }
    }

    pub fn hidden_width(&self) -> usize {
        self.hidden_sums.len()
    }

    pub fn class_count(&self) -> usize {
        self.output.len()
    }
}

/// Broadcast-multiply `input` against every column of `weights`, keeping the
/// full product matrix, then sum along the input axis.
fn layer_products(input: &[f32], weights: &Matrix) -> (Matrix, Vec<f32>) {
    debug_assert_eq!(input.len(), weights.rows);
    let products = Matrix::from_fn(weights.rows, weights.cols, |i, j| input[i] * weights.get(i, j));
    let mut sums = vec![0.0; weights.cols];
    for i in 0..weights.rows {
        for (j, sum) in sums.iter_mut().enumerate() {
            *sum += products.get(i, j);
        }
    }
    (products, sums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::forward;
    use crate::segments;

    /// Hidden width 1, every hidden weight 1.0, output weight k for class k.
    fn tiny_snapshot() -> WeightSnapshot {
        WeightSnapshot {
            hidden: Matrix::from_fn(7, 1, |_, _| 1.0),
            output: Matrix::from_fn(1, 10, |_, k| k as f32),
        }
    }

    #[test]
    fn capture_keeps_every_intermediate_in_order() {
        let bits = segments::encode(1).unwrap(); // segments b and c lit
        let trace = ActivationTrace::capture(&tiny_snapshot(), &bits);

        assert_eq!(trace.input, vec![0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        // Products mirror the input because every hidden weight is 1.
        assert_eq!(trace.hidden_products.data, trace.input);
        assert_eq!(trace.hidden_sums, vec![2.0]);
        assert_eq!(trace.hidden_act, vec![2.0]);
        // Output products: 2·k for class k.
        let expected: Vec<f32> = (0..10).map(|k| 2.0 * k as f32).collect();
        assert_eq!(trace.output_products.data, expected);
        assert_eq!(trace.output_sums, expected);
        assert_eq!(trace.class_count(), 10);
        assert_eq!(trace.hidden_width(), 1);
    }

    #[test]
    fn rectifier_zeroes_negative_hidden_sums() {
        let snapshot = WeightSnapshot {
            hidden: Matrix::from_fn(7, 1, |_, _| -1.0),
            output: Matrix::from_fn(1, 10, |_, _| 1.0),
        };
        let bits = segments::encode(8).unwrap();
        let trace = ActivationTrace::capture(&snapshot, &bits);
        assert_eq!(trace.hidden_sums, vec![-7.0]);
        assert_eq!(trace.hidden_act, vec![0.0]);
        assert!(trace.output_products.data.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn trace_distribution_matches_the_plain_forward_pass() {
        let snapshot = WeightSnapshot::init(2, 11);
        let bits = segments::encode(4).unwrap();
        let trace = ActivationTrace::capture(&snapshot, &bits);
        let probs = forward(&snapshot, &trace.input);
        assert_eq!(trace.output, probs);
        let sum: f32 = trace.output.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
}
