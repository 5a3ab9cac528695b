//! Incremental background training and the shared snapshot holder.
//!
//! The trainer makes progress one epoch at a time: a full pass over the
//! ten-example dataset, one optimizer step per example, then a cooldown so
//! the render path is never starved. The phase enum makes the cycle explicit;
//! there is no terminal phase, training runs until the process halts.

use std::sync::{Arc, RwLock};

use crate::network::{mat_vec, relu, relu_derivative, softmax, Matrix, WeightSnapshot};
use crate::segments::{self, DIGIT_COUNT, SEGMENT_COUNT};

/// Floor under predicted probabilities inside the log loss.
const LOSS_FLOOR: f32 = 1e-12;

/// One (segment pattern, digit class) example.
#[derive(Debug, Clone)]
pub struct Example {
    pub input: [f32; SEGMENT_COUNT],
    pub target: usize,
}

/// The exhaustive dataset: one example per digit, the codec's own patterns.
pub fn training_set() -> Vec<Example> {
    segments::canonical_patterns()
        .map(|(digit, bits)| {
            let mut input = [0.0; SEGMENT_COUNT];
            for (line, &bit) in input.iter_mut().zip(bits) {
                *line = f32::from(bit);
            }
            Example {
                input,
                target: digit as usize,
            }
        })
        .collect()
}

/// Where the trainer is in its epoch/cooldown cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerPhase {
    Idle,
    EpochRunning,
    Cooldown,
}

/// SGD with momentum. Velocity buffers persist across epochs: a cooldown
/// resumes the optimizer trajectory, it does not restart it.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f32,
    pub momentum: f32,
    velocity_hidden: Matrix,
    velocity_output: Matrix,
}

impl Sgd {
    pub fn new(learning_rate: f32, momentum: f32, hidden_width: usize) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity_hidden: Matrix::zeros(SEGMENT_COUNT, hidden_width),
            velocity_output: Matrix::zeros(hidden_width, DIGIT_COUNT),
        }
    }

    /// One optimizer step over both layers.
    fn step(&mut self, weights: &mut WeightSnapshot, grad_hidden: &Matrix, grad_output: &Matrix) {
        apply_layer(
            &mut weights.hidden,
            &mut self.velocity_hidden,
            grad_hidden,
            self.learning_rate,
            self.momentum,
        );
        apply_layer(
            &mut weights.output,
            &mut self.velocity_output,
            grad_output,
            self.learning_rate,
            self.momentum,
        );
    }

    fn reset_velocity(&mut self) {
        self.velocity_hidden.data.fill(0.0);
        self.velocity_output.data.fill(0.0);
    }
}

fn apply_layer(weights: &mut Matrix, velocity: &mut Matrix, grad: &Matrix, lr: f32, momentum: f32) {
    debug_assert_eq!(weights.data.len(), grad.data.len());
    for ((w, v), &g) in weights
        .data
        .iter_mut()
        .zip(velocity.data.iter_mut())
        .zip(&grad.data)
    {
        *v = momentum * *v - lr * g;
        *w += *v;
    }
}

/// Runs the epoch/cooldown cycle over the fixed dataset and hands finished
/// snapshots to whoever schedules it.
#[derive(Debug)]
pub struct Trainer {
    weights: WeightSnapshot,
    opt: Sgd,
    dataset: Vec<Example>,
    phase: TrainerPhase,
    epochs_completed: u64,
}

impl Trainer {
    pub fn new(hidden_width: usize, seed: u64, learning_rate: f32, momentum: f32) -> Self {
        Self {
            weights: WeightSnapshot::init(hidden_width, seed),
            opt: Sgd::new(learning_rate, momentum, hidden_width),
            dataset: training_set(),
            phase: TrainerPhase::Idle,
            epochs_completed: 0,
        }
    }

    pub fn phase(&self) -> TrainerPhase {
        self.phase
    }

    pub fn epochs_completed(&self) -> u64 {
        self.epochs_completed
    }

    /// Copy of the current weights, for seeding the shared holder.
    pub fn snapshot(&self) -> WeightSnapshot {
        self.weights.clone()
    }

    /// Adopt previously persisted weights (process restart). Optimizer
    /// velocity is zeroed; momentum only survives within a running process.
    pub fn restore(&mut self, snapshot: WeightSnapshot) {
        self.opt.reset_velocity();
        self.weights = snapshot;
    }

    /// Idle or Cooldown → EpochRunning.
    pub fn begin_epoch(&mut self) {
        self.phase = TrainerPhase::EpochRunning;
    }

    /// Exactly one full pass over the dataset, one optimizer step per
    /// example. EpochRunning → Cooldown. Returns the snapshot to publish and
    /// the summed cross-entropy loss of the pass.
    pub fn run_epoch(&mut self) -> (WeightSnapshot, f32) {
        debug_assert_eq!(self.phase, TrainerPhase::EpochRunning);
        let Trainer {
            weights,
            opt,
            dataset,
            ..
        } = self;
        let mut loss = 0.0;
        for example in dataset.iter() {
            loss += train_step(weights, opt, example);
        }
        self.epochs_completed += 1;
        self.phase = TrainerPhase::Cooldown;
        (self.weights.clone(), loss)
    }
}

/// Forward, softmax cross-entropy, backward, one optimizer step.
fn train_step(weights: &mut WeightSnapshot, opt: &mut Sgd, example: &Example) -> f32 {
    let hidden_sums = mat_vec(&example.input, &weights.hidden);
    let hidden_act: Vec<f32> = hidden_sums.iter().map(|&s| relu(s)).collect();
    let output_sums = mat_vec(&hidden_act, &weights.output);
    let probs = softmax(&output_sums);
    let loss = -probs[example.target].max(LOSS_FLOOR).ln();

    // Gradient at the output sums: probs − one_hot(target).
    let mut grad_sums = probs;
    grad_sums[example.target] -= 1.0;

    let grad_output = Matrix::from_fn(weights.output.rows, weights.output.cols, |unit, class| {
        hidden_act[unit] * grad_sums[class]
    });

    let grad_act: Vec<f32> = (0..weights.output.rows)
        .map(|unit| {
            let back: f32 = (0..weights.output.cols)
                .map(|class| weights.output.get(unit, class) * grad_sums[class])
                .sum();
            back * relu_derivative(hidden_sums[unit])
        })
        .collect();

    let grad_hidden = Matrix::from_fn(weights.hidden.rows, weights.hidden.cols, |line, unit| {
        example.input[line] * grad_act[unit]
    });

    opt.step(weights, &grad_hidden, &grad_output);
    loss
}

/// Shared holder for the latest published weights.
///
/// The lock is held only for the `Arc` swap or clone, never while an epoch
/// computes, so readers either get the previous complete snapshot or the new
/// one; a torn read is structurally impossible.
#[derive(Debug)]
pub struct SnapshotCell {
    inner: RwLock<Arc<WeightSnapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: WeightSnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Atomically replace the published snapshot.
    pub fn publish(&self, snapshot: WeightSnapshot) {
        let next = Arc::new(snapshot);
        // A panicked holder can only have been mid-swap of a complete Arc,
        // so the poisoned value is still sound to take over.
        let mut slot = match self.inner.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = next;
    }

    /// Cheap read of the latest complete snapshot.
    pub fn load(&self) -> Arc<WeightSnapshot> {
        let slot = match self.inner.read() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn dataset_is_one_example_per_digit() {
        let set = training_set();
        assert_eq!(set.len(), DIGIT_COUNT);
        for (digit, example) in set.iter().enumerate() {
            assert_eq!(example.target, digit);
            let bits: Vec<u8> = example.input.iter().map(|&x| x as u8).collect();
            assert_eq!(segments::decode(&bits).unwrap(), digit as u8);
        }
    }

    #[test]
    fn phases_cycle_without_a_terminal_state() {
        let mut trainer = Trainer::new(2, 1, 0.1, 0.9);
        assert_eq!(trainer.phase(), TrainerPhase::Idle);
        trainer.begin_epoch();
        assert_eq!(trainer.phase(), TrainerPhase::EpochRunning);
        trainer.run_epoch();
        assert_eq!(trainer.phase(), TrainerPhase::Cooldown);
        trainer.begin_epoch();
        assert_eq!(trainer.phase(), TrainerPhase::EpochRunning);
        trainer.run_epoch();
        assert_eq!(trainer.epochs_completed(), 2);
    }

    #[test]
    fn an_epoch_changes_the_published_weights() {
        let mut trainer = Trainer::new(2, 5, 0.1, 0.9);
        let before = trainer.snapshot();
        trainer.begin_epoch();
        let (after, loss) = trainer.run_epoch();
        assert_ne!(before, after);
        assert!(loss.is_finite());
        assert!(loss > 0.0);
    }

    #[test]
    fn loss_decreases_over_many_epochs() {
        let mut trainer = Trainer::new(4, 42, 0.05, 0.8);
        let mut losses = Vec::new();
        for _ in 0..500 {
            trainer.begin_epoch();
            let (_, loss) = trainer.run_epoch();
            losses.push(loss);
        }
        let first = losses[0];
        let last = *losses.last().unwrap();
        assert!(
            last < first,
            "loss did not decrease: first {first}, last {last}"
        );
        assert!(last.is_finite());
    }

    #[test]
    fn momentum_carries_across_the_cooldown() {
        // Two trainers, same seed: one runs two epochs back to back, the
        // other mimics a restart by zeroing velocity between epochs. The
        // trajectories must differ, proving the cooldown resumes rather
        // than restarts.
        let mut resumed = Trainer::new(2, 3, 0.1, 0.9);
        resumed.begin_epoch();
        resumed.run_epoch();
        resumed.begin_epoch();
        let (resumed_snapshot, _) = resumed.run_epoch();

        let mut restarted = Trainer::new(2, 3, 0.1, 0.9);
        restarted.begin_epoch();
        restarted.run_epoch();
        let carried = restarted.snapshot();
        restarted.restore(carried); // zeroes velocity, keeps weights
        restarted.begin_epoch();
        let (restarted_snapshot, _) = restarted.run_epoch();

        assert_ne!(resumed_snapshot, restarted_snapshot);
    }

    #[test]
    fn restore_adopts_the_given_weights() {
        let mut trainer = Trainer::new(2, 8, 0.1, 0.9);
        let external = WeightSnapshot::init(2, 999);
        trainer.restore(external.clone());
        assert_eq!(trainer.snapshot(), external);
    }

    fn uniform_snapshot(value: f32) -> WeightSnapshot {
        WeightSnapshot {
            hidden: Matrix::from_fn(7, 2, |_, _| value),
            output: Matrix::from_fn(2, 10, |_, _| value),
        }
    }

    #[test]
    fn published_snapshots_are_never_torn() {
        let cell = Arc::new(SnapshotCell::new(uniform_snapshot(0.0)));
        let stop = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        let snapshot = cell.load();
                        let first = snapshot.hidden.data[0];
                        let uniform = snapshot
                            .hidden
                            .data
                            .iter()
                            .chain(&snapshot.output.data)
                            .all(|&w| w == first);
                        assert!(uniform, "observed a torn snapshot");
                    }
                })
            })
            .collect();

        for generation in 1..=2000 {
            cell.publish(uniform_snapshot(generation as f32));
        }
        stop.store(true, Ordering::Relaxed);
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cell.load().hidden.data[0], 2000.0);
    }
}
